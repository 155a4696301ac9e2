use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DuplexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Build error: {0}")]
    Build(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Entry file not found: {}", .0.display())]
    MissingEntry(PathBuf),

    #[error("Bundler error: {0}")]
    Bundler(String),

    #[error("Watch error: {0}")]
    Watch(String),
}

impl DuplexError {
    /// Create a parse error for a file
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }
}

pub type Result<T> = std::result::Result<T, DuplexError>;

impl From<serde_json::Error> for DuplexError {
    fn from(err: serde_json::Error) -> Self {
        DuplexError::config(err.to_string())
    }
}

impl From<notify::Error> for DuplexError {
    fn from(err: notify::Error) -> Self {
        DuplexError::Watch(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_mentions_file() {
        let err = DuplexError::parse("/app/src/index.js", "Unexpected token");
        let message = err.to_string();
        assert!(message.contains("/app/src/index.js"));
        assert!(message.contains("Unexpected token"));
    }

    #[test]
    fn test_missing_entry_display() {
        let err = DuplexError::MissingEntry(PathBuf::from("/app/src/index"));
        assert_eq!(err.to_string(), "Entry file not found: /app/src/index");
    }

    #[test]
    fn test_json_error_becomes_config_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: DuplexError = json_err.into();
        assert!(matches!(err, DuplexError::Config(_)));
    }
}
