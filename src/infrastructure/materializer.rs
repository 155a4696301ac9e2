use crate::infrastructure::file_system;
use crate::utils::{Logger, ProcessType, Result};
use std::path::{Path, PathBuf};

/// Copies a discovered file from its source tree into the mirrored output tree
#[derive(Debug, Clone)]
pub struct OutputMaterializer {
    app_root: PathBuf,
}

impl OutputMaterializer {
    pub fn new(app_root: &Path) -> Self {
        Self {
            app_root: app_root.to_path_buf(),
        }
    }

    /// Destination of `file_path` once `source_root` is swapped for `output_root`
    pub fn destination(
        &self,
        file_path: &Path,
        source_root: &Path,
        output_root: &Path,
    ) -> Option<PathBuf> {
        file_path
            .strip_prefix(source_root)
            .ok()
            .map(|relative| output_root.join(relative))
    }

    /// Copy `file_path` to its mirrored location below `output_root`.
    ///
    /// Returns the written path, or `None` when the path is empty, relative, or
    /// outside `source_root`. Repeated calls overwrite with identical bytes.
    pub fn materialize(
        &self,
        file_path: &Path,
        source_root: &Path,
        output_root: &Path,
    ) -> Result<Option<PathBuf>> {
        if file_path.as_os_str().is_empty() || !file_path.is_absolute() {
            return Ok(None);
        }

        let Some(destination) = self.destination(file_path, source_root, output_root) else {
            Logger::debug(&format!(
                "Skipping {}: outside {}",
                file_path.display(),
                source_root.display()
            ));
            return Ok(None);
        };

        let relative = file_path.strip_prefix(&self.app_root).unwrap_or(file_path);
        Logger::process(ProcessType::Copy, "found", &relative.display().to_string());

        file_system::copy_file(file_path, &destination)?;
        Ok(Some(destination))
    }
}
