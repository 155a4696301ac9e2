// Watch mode for the component library
// Keeps both targets in sync with the source tree after the initial build

use crate::core::interfaces::{ScriptRebuilder, WatchHandler};
use crate::core::models::{BuildContext, WatchEntry};
use crate::core::services::LibraryBuildService;
use crate::infrastructure::resolver::normalize_path;
use crate::utils::config_loader::ExtraWatchAction;
use crate::utils::{DuplexError, Logger, ProcessType, Result};
use async_trait::async_trait;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::mpsc;

/// Environment variable holding the changed path for command handlers
pub const CHANGED_FILE_ENV: &str = "DUPLEX_CHANGED_FILE";

/// A change reported for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEvent {
    Add,
    Change,
    Unlink,
}

/// Dispatches file system events to the build service one at a time
pub struct WatchCoordinator {
    service: Arc<LibraryBuildService>,
    extra: Vec<WatchEntry>,
}

impl WatchCoordinator {
    pub fn new(service: Arc<LibraryBuildService>, extra: Vec<WatchEntry>) -> Self {
        Self { service, extra }
    }

    /// The source directory followed by every extra watched path
    pub fn watch_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.service.context().source_dir.clone()];
        paths.extend(self.extra.iter().map(|e| e.watch_path.clone()));
        paths
    }

    /// Watch until Ctrl-C. Events already on disk are not replayed.
    pub async fn watch(&self) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(e) => Logger::warn(&format!("Watch error: {}", e)),
            },
            notify::Config::default(),
        )?;

        for path in self.watch_paths() {
            if path.exists() {
                watcher.watch(&path, RecursiveMode::Recursive)?;
                Logger::debug(&format!("Watching {}", path.display()));
            } else {
                Logger::warn(&format!("Watch path {} does not exist", path.display()));
            }
        }

        Logger::watching();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    Logger::info("Stopping watch mode");
                    break;
                }
                event = rx.recv() => {
                    let Some(event) = event else {
                        return Err(DuplexError::Watch("event channel closed".to_string()));
                    };
                    for (kind, path) in self.file_events(&event) {
                        self.handle_event(kind, &path).await;
                    }
                }
            }
        }

        Ok(())
    }

    /// Translate a raw notify event into per-file events, dropping ignored paths
    pub fn file_events(&self, event: &Event) -> Vec<(FileEvent, PathBuf)> {
        map_event(event)
            .into_iter()
            .filter(|(_, path)| !self.is_ignored(path))
            .collect()
    }

    /// Paths with a dot-prefixed component below a watched root are ignored
    pub fn is_ignored(&self, path: &Path) -> bool {
        let relative = self
            .watch_paths()
            .iter()
            .find_map(|root| path.strip_prefix(root).ok().map(Path::to_path_buf));

        match relative {
            Some(relative) => relative.components().any(|c| match c {
                Component::Normal(name) => name.to_string_lossy().starts_with('.'),
                _ => false,
            }),
            None => false,
        }
    }

    /// Route one event. Errors are logged so the session keeps running.
    pub async fn handle_event(&self, kind: FileEvent, path: &Path) {
        let ctx = self.service.context();

        let matching: Vec<&WatchEntry> = self.extra.iter().filter(|e| e.matches(path)).collect();
        if kind == FileEvent::Unlink && !matching.is_empty() {
            Logger::debug(&format!("Ignoring removal under extra watch path {}", path.display()));
            return;
        }

        // Every matching handler runs; any of them replaces the default sync
        let mut handled = false;
        for trigger in matching.iter().filter_map(|e| e.trigger.as_ref()) {
            Logger::process(ProcessType::Modify, "watch", &ctx.relative_to_app(path));
            if let Err(e) = trigger.handle(path).await {
                Logger::error(&format!("Watch handler failed for {}: {}", path.display(), e));
            }
            handled = true;
        }
        if handled {
            return;
        }

        let result = match kind {
            FileEvent::Add => {
                Logger::process(ProcessType::Create, "file", &ctx.relative_to_app(path));
                self.service.sync_file(path).await
            }
            FileEvent::Change => {
                Logger::process(ProcessType::Modify, "file", &ctx.relative_to_app(path));
                self.service.sync_file(path).await
            }
            FileEvent::Unlink => self.service.remove_file(path).map(|_| ()),
        };

        if let Err(e) = result {
            Logger::error(&format!("Failed to update {}: {}", path.display(), e));
        }
    }
}

fn map_event(event: &Event) -> Vec<(FileEvent, PathBuf)> {
    let files = |kind: FileEvent| -> Vec<(FileEvent, PathBuf)> {
        event
            .paths
            .iter()
            .filter(|p| p.is_file())
            .map(|p| (kind, p.clone()))
            .collect()
    };
    let all = |kind: FileEvent| -> Vec<(FileEvent, PathBuf)> {
        event.paths.iter().map(|p| (kind, p.clone())).collect()
    };

    match &event.kind {
        EventKind::Create(_) => files(FileEvent::Add),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => all(FileEvent::Unlink),
            RenameMode::To => files(FileEvent::Add),
            RenameMode::Both => {
                let mut events = Vec::new();
                if let Some(from) = event.paths.first() {
                    events.push((FileEvent::Unlink, from.clone()));
                }
                if let Some(to) = event.paths.get(1).filter(|p| p.is_file()) {
                    events.push((FileEvent::Add, to.clone()));
                }
                events
            }
            _ => event
                .paths
                .iter()
                .filter_map(|p| {
                    if p.is_file() {
                        Some((FileEvent::Add, p.clone()))
                    } else if !p.exists() {
                        Some((FileEvent::Unlink, p.clone()))
                    } else {
                        None
                    }
                })
                .collect(),
        },
        EventKind::Modify(_) => files(FileEvent::Change),
        EventKind::Remove(_) => all(FileEvent::Unlink),
        _ => Vec::new(),
    }
}

/// Rebuilds the H5 script bundle whenever its path changes
pub struct ScriptRebuildHandler {
    rebuilder: Arc<dyn ScriptRebuilder>,
}

#[async_trait]
impl WatchHandler for ScriptRebuildHandler {
    async fn handle(&self, _path: &Path) -> Result<()> {
        self.rebuilder.rebuild_h5_script().await
    }
}

/// Runs a configured command with the changed path in its environment
pub struct CommandHandler {
    command: Vec<String>,
    app_root: PathBuf,
}

impl CommandHandler {
    pub fn new(command: Vec<String>, app_root: &Path) -> Self {
        Self {
            command,
            app_root: app_root.to_path_buf(),
        }
    }
}

#[async_trait]
impl WatchHandler for CommandHandler {
    async fn handle(&self, path: &Path) -> Result<()> {
        let Some((program, args)) = self.command.split_first() else {
            return Ok(());
        };

        let status = Command::new(program)
            .args(args)
            .env(CHANGED_FILE_ENV, path)
            .current_dir(&self.app_root)
            .status()
            .await
            .map_err(|e| DuplexError::Watch(format!("failed to start '{}': {}", program, e)))?;

        if !status.success() {
            return Err(DuplexError::Watch(format!("'{}' exited with {}", program, status)));
        }
        Ok(())
    }
}

/// Build the extra watch entries from `ui.extraWatchFiles`
pub fn build_watch_entries(ctx: &BuildContext, rebuilder: Arc<dyn ScriptRebuilder>) -> Vec<WatchEntry> {
    ctx.project_config
        .extra_watch_files()
        .iter()
        .map(|file| {
            let trigger: Option<Arc<dyn WatchHandler>> = match &file.handler {
                Some(ExtraWatchAction::RebuildH5Script) => Some(Arc::new(ScriptRebuildHandler {
                    rebuilder: rebuilder.clone(),
                })),
                Some(ExtraWatchAction::Command(command)) if !command.is_empty() => {
                    Some(Arc::new(CommandHandler::new(command.clone(), &ctx.app_root)))
                }
                _ => None,
            };
            WatchEntry {
                watch_path: normalize_path(&ctx.app_root.join(&file.path)),
                trigger,
            }
        })
        .collect()
}
