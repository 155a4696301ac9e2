use crate::core::interfaces::BundlerRunner;
use crate::core::models::H5BuildConfig;
use crate::infrastructure::file_system;
use crate::utils::{DuplexError, Logger, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// File the resolved H5 configuration is written to before the runner starts
pub const H5_CONFIG_FILE: &str = "h5.build.json";

/// Runs an external bundler command for the H5 script build.
///
/// The configuration is serialized to `<temp>/h5.build.json` and its path is
/// appended as the last argument of the command.
pub struct CommandBundlerRunner {
    command: Option<Vec<String>>,
    temp_dir: PathBuf,
}

impl CommandBundlerRunner {
    pub fn new(command: Option<Vec<String>>, temp_dir: &Path) -> Self {
        Self {
            command: command.filter(|c| !c.is_empty()),
            temp_dir: temp_dir.to_path_buf(),
        }
    }

    pub fn write_config(&self, config: &H5BuildConfig) -> Result<PathBuf> {
        let path = self.temp_dir.join(H5_CONFIG_FILE);
        let json = serde_json::to_string_pretty(config)?;
        file_system::write_file(&path, &json)?;
        Ok(path)
    }
}

#[async_trait]
impl BundlerRunner for CommandBundlerRunner {
    async fn run(&self, app_root: &Path, config: &H5BuildConfig) -> Result<()> {
        let Some((program, args)) = self.command.as_ref().and_then(|c| c.split_first()) else {
            Logger::warn("No h5.runner configured, skipping H5 script build");
            return Ok(());
        };

        let config_path = self.write_config(config)?;
        Logger::debug(&format!("Running {} {:?} {}", program, args, config_path.display()));

        let status = Command::new(program)
            .args(args)
            .arg(&config_path)
            .current_dir(app_root)
            .status()
            .await
            .map_err(|e| DuplexError::Bundler(format!("failed to start '{}': {}", program, e)))?;

        if !status.success() {
            return Err(DuplexError::Bundler(format!("'{}' exited with {}", program, status)));
        }
        Ok(())
    }
}
