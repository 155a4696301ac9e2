use crate::core::models::H5BuildConfig;
use crate::utils::Result;
use async_trait::async_trait;
use std::path::Path;

/// Stages the source tree into the temp tree the H5 target is built from
#[async_trait]
pub trait StagingCompiler: Send + Sync {
    /// Stage the whole source tree once
    async fn build_temp(&self) -> Result<()>;
    /// Re-stage one changed source file
    fn process_file(&self, path: &Path) -> Result<()>;
}

/// External bundler used by the H5 script build mode
#[async_trait]
pub trait BundlerRunner: Send + Sync {
    async fn run(&self, app_root: &Path, config: &H5BuildConfig) -> Result<()>;
}

/// Capability to rebuild the H5 script bundle, handed to extra-watch handlers
#[async_trait]
pub trait ScriptRebuilder: Send + Sync {
    async fn rebuild_h5_script(&self) -> Result<()>;
}

/// Custom reaction to a change under an extra watched path
#[async_trait]
pub trait WatchHandler: Send + Sync {
    async fn handle(&self, path: &Path) -> Result<()>;
}
