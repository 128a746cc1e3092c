//! Runtime configuration
//!
//! Which backend to use is an explicit value handed to [`Runtime`](crate::Runtime),
//! never process-wide state.

use crate::error::{Error, Result, RuntimeErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

/// Environment variable naming the preferred backend
pub const RUNTIME_ENV_VAR: &str = "JSRELAY_RUNTIME";

/// Configuration for building a [`Runtime`](crate::Runtime)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Backend name to select (case-insensitive, e.g. `"node.js (v8)"` or `"node"`);
    /// `None` picks the first available
    pub runtime: Option<String>,
    /// Directories searched before `PATH`
    pub search_paths: Vec<PathBuf>,
    /// Extra environment variables for backend processes
    pub env: BTreeMap<String, String>,
    /// Directory for program files of file-input backends
    pub temp_dir: Option<PathBuf>,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with the backend taken from `JSRELAY_RUNTIME` when set
    pub fn from_env() -> Self {
        let runtime = env::var(RUNTIME_ENV_VAR)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Self {
            runtime,
            ..Self::default()
        }
    }

    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            let message = format!("invalid runtime configuration: {}", e);
            Error::runtime(RuntimeErrorKind::Config, message)
        })
    }

    /// Select a backend by name
    pub fn with_runtime(mut self, name: impl Into<String>) -> Self {
        self.runtime = Some(name.into());
        self
    }

    /// Search `dir` for engines before `PATH`
    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    /// Pass an environment variable to backend processes
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Write program files into `dir`
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Whether `backend_name` satisfies the configured selection
    pub(crate) fn selects(&self, backend_name: &str) -> bool {
        match self.runtime {
            None => true,
            Some(ref wanted) => {
                let wanted = wanted.to_ascii_lowercase();
                let name = backend_name.to_ascii_lowercase();
                // "node" matches "Node.js (V8)"
                let first_word = name.split(|c: char| !c.is_ascii_alphanumeric()).next();
                name == wanted || first_word == Some(wanted.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_json() {
        let json = r#"{"runtime": "node", "env": {"NODE_OPTIONS": "--no-warnings"}}"#;
        let config = RuntimeConfig::from_json(json).unwrap();
        assert_eq!(config.runtime.as_deref(), Some("node"));
        assert_eq!(config.env["NODE_OPTIONS"], "--no-warnings");
        assert!(config.search_paths.is_empty());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = RuntimeConfig::from_json("{runtime:").unwrap_err();
        assert_eq!(err.kind(), Some(RuntimeErrorKind::Config));
        assert!(err.to_string().starts_with("ConfigError: invalid runtime configuration: "));
    }

    #[test]
    fn test_selection_by_name() {
        let config = RuntimeConfig::new().with_runtime("node");
        assert!(config.selects("Node.js (V8)"));
        assert!(!config.selects("QuickJS"));
        assert!(RuntimeConfig::new().with_runtime("quickjs").selects("QuickJS"));
        assert!(RuntimeConfig::new().selects("anything"));
    }

    #[test]
    fn test_builder() {
        let config = RuntimeConfig::new()
            .with_search_path("/opt/js/bin")
            .with_env("A", "1")
            .with_temp_dir("/tmp");
        assert_eq!(config.search_paths, vec![PathBuf::from("/opt/js/bin")]);
        assert_eq!(config.temp_dir, Some(PathBuf::from("/tmp")));
    }
}
