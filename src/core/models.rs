use crate::core::interfaces::WatchHandler;
use crate::infrastructure::resolver::PathResolver;
use crate::utils::config_loader::ProjectConfig;
use crate::utils::{DuplexError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Name of the staging directory the H5 target compiles from
pub const TEMP_DIR_NAME: &str = ".temp";

/// Entry used when no `uiIndex` is given
pub const DEFAULT_INDEX: &str = "index";

/// Output target of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Weapp,
    H5,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::Weapp, Target::H5];

    /// Directory name under the output root, also used as the platform suffix
    /// when resolving `index.h5.js` style variants.
    pub fn output_name(&self) -> &'static str {
        match self {
            Target::Weapp => "weapp",
            Target::H5 => "h5",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Target::Weapp => "mini-program",
            Target::H5 => "H5",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.output_name())
    }
}

/// How the H5 target is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Copy the reachable component sources into the output tree
    #[default]
    Lib,
    /// Hand the staged tree to the external bundler
    Script,
}

impl FromStr for BuildMode {
    type Err = DuplexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lib" => Ok(BuildMode::Lib),
            "script" => Ok(BuildMode::Script),
            other => Err(DuplexError::config(format!(
                "unknown build type '{}', expected 'lib' or 'script'",
                other
            ))),
        }
    }
}

/// Semantic kind of a referenced file, decided by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Script,
    Stylesheet,
    Json,
    Media,
    Unknown,
}

/// Files referenced by one source file, grouped by kind.
///
/// Each list keeps first-encounter order and holds every path once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    pub scripts: Vec<PathBuf>,
    pub styles: Vec<PathBuf>,
    pub json: Vec<PathBuf>,
    pub media: Vec<PathBuf>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: AssetKind, path: PathBuf) {
        let list = match kind {
            AssetKind::Script | AssetKind::Unknown => &mut self.scripts,
            AssetKind::Stylesheet => &mut self.styles,
            AssetKind::Json => &mut self.json,
            AssetKind::Media => &mut self.media,
        };
        if !list.contains(&path) {
            list.push(path);
        }
    }

    /// Every referenced path: styles, then scripts, json and media
    pub fn all(&self) -> impl Iterator<Item = &PathBuf> {
        self.styles
            .iter()
            .chain(self.scripts.iter())
            .chain(self.json.iter())
            .chain(self.media.iter())
    }

    pub fn len(&self) -> usize {
        self.scripts.len() + self.styles.len() + self.json.len() + self.media.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A component re-exported from the library entry file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentReference {
    pub name: Option<String>,
    pub path: PathBuf,
}

/// Result of processing an entry file: regenerated code plus what it exposes
#[derive(Debug, Clone, Default)]
pub struct EntryReferences {
    pub code: String,
    pub style_files: Vec<PathBuf>,
    pub components: Vec<ComponentReference>,
}

impl EntryReferences {
    /// Component paths in declaration order without duplicates
    pub fn component_paths(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.components
            .iter()
            .filter(|c| seen.insert(c.path.clone()))
            .map(|c| c.path.clone())
            .collect()
    }
}

/// Counters for one dependency walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Script and stylesheet files analyzed
    pub processed: usize,
    /// Files written to the output tree
    pub copied: usize,
    /// Files whose analysis failed
    pub failed: Vec<PathBuf>,
}

impl WalkStats {
    /// Add the counters of another pass over the same target
    pub fn absorb(&mut self, other: WalkStats) {
        self.processed += other.processed;
        self.copied += other.copied;
        self.failed.extend(other.failed);
    }
}

/// Options given on the command line
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub watch: bool,
    pub ui_index: Option<String>,
    pub mode: Option<BuildMode>,
}

/// Paths and configuration shared by every stage of one build session
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub app_root: PathBuf,
    pub project_config: ProjectConfig,
    pub source_dir: PathBuf,
    /// `<app>/<outputRoot>`; each target writes below it
    pub output_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub entry_path: PathBuf,
    pub entry_file_name: String,
    pub ui_index: Option<String>,
    pub mode: BuildMode,
}

impl BuildContext {
    pub fn new(app_root: &Path, project_config: ProjectConfig, options: &BuildOptions) -> Self {
        let source_dir = app_root.join(&project_config.source_root);
        let output_dir = app_root.join(&project_config.output_root);
        let temp_dir = app_root.join(TEMP_DIR_NAME);

        let index = options.ui_index.as_deref().unwrap_or(DEFAULT_INDEX);
        let entry_path = PathResolver::new(None).resolve_script(&source_dir, index);
        let entry_file_name = entry_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| index.to_string());

        let mode = options
            .mode
            .or(project_config.h5.build_type)
            .unwrap_or_default();

        Self {
            app_root: app_root.to_path_buf(),
            source_dir,
            output_dir,
            temp_dir,
            entry_path,
            entry_file_name,
            ui_index: options.ui_index.clone(),
            mode,
            project_config,
        }
    }

    pub fn target_output_dir(&self, target: Target) -> PathBuf {
        self.output_dir.join(target.output_name())
    }

    /// Tree a target's sources are read from: the H5 target works on the staged copy
    pub fn target_source_dir(&self, target: Target) -> &Path {
        match target {
            Target::Weapp => &self.source_dir,
            Target::H5 => &self.temp_dir,
        }
    }

    /// Entry specifier relative to the source root: `uiIndex` or `index`
    pub fn index_specifier(&self) -> &str {
        self.ui_index.as_deref().unwrap_or(DEFAULT_INDEX)
    }

    /// Entry name without extension, as required from the dispatcher module
    pub fn index_name(&self) -> String {
        match &self.ui_index {
            Some(ui_index) => Path::new(ui_index)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "index".to_string()),
            None => "index".to_string(),
        }
    }

    /// Map a path under the source directory onto `root` by prefix substitution
    pub fn rebase_source_path(&self, path: &Path, root: &Path) -> Option<PathBuf> {
        path.strip_prefix(&self.source_dir)
            .ok()
            .map(|relative| root.join(relative))
    }

    pub fn relative_to_app(&self, path: &Path) -> String {
        path.strip_prefix(&self.app_root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Configuration handed to the external bundler in script mode
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct H5BuildConfig {
    pub entry: BTreeMap<String, Vec<PathBuf>>,
    pub env: serde_json::Map<String, serde_json::Value>,
    pub define_constants: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugins: Option<serde_json::Value>,
    pub design_width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_ratio: Option<serde_json::Map<String, serde_json::Value>>,
    pub source_root: String,
    pub output_root: String,
    pub is_watch: bool,
    /// Remaining keys of the project's `h5` block, passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl H5BuildConfig {
    pub fn from_context(ctx: &BuildContext) -> Self {
        let config = &ctx.project_config;
        let entry_stem = Path::new(&ctx.entry_file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index".to_string());

        let mut entry = BTreeMap::new();
        entry.insert(
            "app".to_string(),
            vec![ctx.temp_dir.join(format!("{}.js", entry_stem))],
        );
        if let Some(user_entry) = &config.h5.entry {
            for (name, paths) in user_entry {
                entry.insert(name.clone(), paths.iter().map(PathBuf::from).collect());
            }
        }

        Self {
            entry,
            env: config.env.clone(),
            define_constants: config.define_constants.clone(),
            plugins: config.plugins.clone(),
            design_width: config.design_width,
            device_ratio: config.device_ratio.clone(),
            source_root: config.source_root.clone(),
            output_root: format!("{}/{}", config.output_root, Target::H5.output_name()),
            is_watch: false,
            extra: config.h5.extra.clone(),
        }
    }
}

/// An extra path watched alongside the source directory
#[derive(Clone)]
pub struct WatchEntry {
    pub watch_path: PathBuf,
    pub trigger: Option<Arc<dyn WatchHandler>>,
}

impl WatchEntry {
    pub fn matches(&self, path: &Path) -> bool {
        path.starts_with(&self.watch_path)
    }
}

impl fmt::Debug for WatchEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchEntry")
            .field("watch_path", &self.watch_path)
            .field("trigger", &self.trigger.is_some())
            .finish()
    }
}
