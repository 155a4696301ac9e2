use crate::core::interfaces::StagingCompiler;
use crate::infrastructure::file_system;
use crate::utils::{DuplexError, Logger, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Stages the H5 temp tree as a verbatim mirror of the source tree.
///
/// Dot-prefixed files and directories are not staged.
pub struct MirrorStagingCompiler {
    source_dir: PathBuf,
    temp_dir: PathBuf,
}

impl MirrorStagingCompiler {
    pub fn new(source_dir: &Path, temp_dir: &Path) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            temp_dir: temp_dir.to_path_buf(),
        }
    }

    fn staged_path(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(&self.source_dir)
            .ok()
            .map(|relative| self.temp_dir.join(relative))
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

#[async_trait]
impl StagingCompiler for MirrorStagingCompiler {
    async fn build_temp(&self) -> Result<()> {
        if self.temp_dir.exists() {
            std::fs::remove_dir_all(&self.temp_dir)?;
        }
        file_system::ensure_dir(&self.temp_dir)?;

        let mut staged = 0usize;
        let walker = WalkDir::new(&self.source_dir)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

        for entry in walker {
            let entry = entry.map_err(|e| DuplexError::build(format!("Failed to stage sources: {}", e)))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(target) = self.staged_path(entry.path()) {
                file_system::copy_file(entry.path(), &target)?;
                staged += 1;
            }
        }

        Logger::debug(&format!("Staged {} files into {}", staged, self.temp_dir.display()));
        Ok(())
    }

    fn process_file(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Ok(());
        }
        if let Some(target) = self.staged_path(path) {
            file_system::copy_file(path, &target)?;
        }
        Ok(())
    }
}
