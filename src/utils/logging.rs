use colored::Colorize;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Kind of action reported by a process log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessType {
    Copy,
    Create,
    Modify,
    Unlink,
    Generate,
    Remove,
}

impl ProcessType {
    fn label(&self) -> &'static str {
        match self {
            ProcessType::Copy => "copy",
            ProcessType::Create => "create",
            ProcessType::Modify => "modify",
            ProcessType::Unlink => "unlink",
            ProcessType::Generate => "generate",
            ProcessType::Remove => "remove",
        }
    }
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let padded = format!("{:<8}", self.label());
        let colored = match self {
            ProcessType::Copy | ProcessType::Generate => padded.magenta(),
            ProcessType::Create => padded.cyan(),
            ProcessType::Modify => padded.yellow(),
            ProcessType::Unlink | ProcessType::Remove => padded.red(),
        };
        write!(f, "{}", colored)
    }
}

pub struct Logger;

impl Logger {
    /// Install the global subscriber. `RUST_LOG` wins over the verbosity flag.
    pub fn init(verbose: bool) {
        let default_directive = if verbose { "duplex=debug" } else { "duplex=info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }

    /// One line per file touched by the pipeline: `copy     src/button/index.js`
    pub fn process(kind: ProcessType, tip: &str, path: &str) {
        info!("{} {} {}", kind, tip, path);
    }

    pub fn target_start(name: &str) {
        info!("");
        info!("{}", format!("Compiling {} component library", name).green());
    }

    pub fn watching() {
        info!("");
        info!("{}", "Watching for file changes...".dimmed());
    }

    pub fn walk_summary(target: &str, processed: usize, copied: usize, failed: usize) {
        if failed > 0 {
            warn!(
                "{}: {} files analyzed, {} copied, {} failed",
                target, processed, copied, failed
            );
        } else {
            info!("{}: {} files analyzed, {} copied", target, processed, copied);
        }
    }

    pub fn info(msg: &str) {
        info!("{}", msg);
    }

    pub fn debug(msg: &str) {
        debug!("{}", msg);
    }

    pub fn error(msg: &str) {
        error!("{}", msg.red());
    }

    pub fn warn(msg: &str) {
        warn!("{}", msg);
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        debug!("Starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!("Completed: {} in {:.2?}", self.name, self.elapsed());
    }
}
