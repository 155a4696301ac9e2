use crate::core::models::BuildMode;
use crate::utils::{DuplexError, Logger, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Project configuration file, looked up in the application root
pub const CONFIG_FILE: &str = "duplex.config.json";

/// Project configuration (duplex.config.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Source directory relative to the app root (default: "src")
    #[serde(default = "default_source_root")]
    pub source_root: String,

    /// Output directory relative to the app root (default: "dist")
    #[serde(default = "default_output_root")]
    pub output_root: String,

    #[serde(default)]
    pub env: serde_json::Map<String, serde_json::Value>,

    #[serde(default)]
    pub define_constants: serde_json::Map<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugins: Option<serde_json::Value>,

    /// Design draft width (default: 750)
    #[serde(default = "default_design_width")]
    pub design_width: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_ratio: Option<serde_json::Map<String, serde_json::Value>>,

    #[serde(default)]
    pub h5: H5Options,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui: Option<UiOptions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct H5Options {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<BTreeMap<String, Vec<String>>>,

    /// External bundler command: program followed by its arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_type: Option<BuildMode>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiOptions {
    #[serde(default)]
    pub extra_watch_files: Vec<ExtraWatchFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraWatchFile {
    /// Path relative to the app root
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<ExtraWatchAction>,
}

/// What to do when an extra watched path changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtraWatchAction {
    /// Rebuild the H5 script bundle
    RebuildH5Script,
    /// Run a command; the changed path is passed in `DUPLEX_CHANGED_FILE`
    Command(Vec<String>),
}

fn default_source_root() -> String {
    "src".to_string()
}

fn default_output_root() -> String {
    "dist".to_string()
}

fn default_design_width() -> u32 {
    750
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            output_root: default_output_root(),
            env: serde_json::Map::new(),
            define_constants: serde_json::Map::new(),
            plugins: None,
            design_width: default_design_width(),
            device_ratio: None,
            h5: H5Options::default(),
            ui: None,
        }
    }
}

impl ProjectConfig {
    pub fn extra_watch_files(&self) -> &[ExtraWatchFile] {
        self.ui
            .as_ref()
            .map(|ui| ui.extra_watch_files.as_slice())
            .unwrap_or(&[])
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load `duplex.config.json` from `app_root`, falling back to defaults
    pub fn load(app_root: &Path) -> Result<ProjectConfig> {
        let config_path = app_root.join(CONFIG_FILE);

        if !config_path.exists() {
            Logger::debug(&format!("No {} found, using defaults", CONFIG_FILE));
            return Ok(ProjectConfig::default());
        }

        Logger::debug(&format!("Loading config from {}", config_path.display()));
        let content = std::fs::read_to_string(&config_path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<ProjectConfig> {
        serde_json::from_str(content)
            .map_err(|e| DuplexError::config(format!("Failed to parse {}: {}", CONFIG_FILE, e)))
    }
}
