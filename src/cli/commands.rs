use crate::core::models::{BuildContext, BuildMode, BuildOptions};
use crate::core::services::LibraryBuildService;
use crate::utils::config_loader::ConfigLoader;
use crate::utils::watch::{build_watch_entries, WatchCoordinator};
use crate::utils::Logger;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "duplex")]
#[command(about = "Build a UI component library for mini-program and H5 targets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the component library into <outputRoot>/{weapp,h5}
    Build {
        /// Application root containing duplex.config.json
        #[arg(default_value = ".")]
        app_root: PathBuf,
        /// Keep running and sync outputs on file changes
        #[arg(short, long)]
        watch: bool,
        /// Library entry file relative to the source root (default: index)
        #[arg(long)]
        ui_index: Option<String>,
        /// H5 build type: lib or script
        #[arg(long, env = "DUPLEX_BUILD_TYPE")]
        build_type: Option<BuildMode>,
        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,
    },
}

pub struct CliHandler;

impl CliHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let cli = Cli::parse();

        match cli.command {
            Commands::Build {
                app_root,
                watch,
                ui_index,
                build_type,
                verbose,
            } => {
                Logger::init(verbose);
                let options = BuildOptions {
                    watch,
                    ui_index,
                    mode: build_type,
                };
                self.handle_build_command(app_root, options).await
            }
        }
    }

    async fn handle_build_command(&self, app_root: PathBuf, options: BuildOptions) -> anyhow::Result<()> {
        let app_root = app_root
            .canonicalize()
            .with_context(|| format!("app root {} is not accessible", app_root.display()))?;
        let config = ConfigLoader::load(&app_root)?;
        let ctx = BuildContext::new(&app_root, config, &options);
        Logger::debug(&format!(
            "Entry {}, H5 build type {:?}",
            ctx.entry_path.display(),
            ctx.mode
        ));

        let service = Arc::new(LibraryBuildService::with_defaults(ctx));
        let report = service.build().await;
        let failed = report.weapp.is_none() && report.h5.is_none();

        if options.watch {
            let entries = build_watch_entries(service.context(), service.script_rebuilder());
            WatchCoordinator::new(service, entries).watch().await?;
        } else if failed {
            anyhow::bail!("no target was built");
        }

        Ok(())
    }
}

impl Default for CliHandler {
    fn default() -> Self {
        Self::new()
    }
}
