use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Optional installer configuration, read from `<root>/bmad-mode.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub templates: TemplatesConfig,
    pub hook: HookConfig,
}

/// Where template blobs come from
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Directory holding `agent-state-manager.sh` and `claude-md-rules.md`.
    /// When unset the templates built into the binary are used.
    pub dir: Option<PathBuf>,
}

/// Settings baked into the materialized hook script
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HookConfig {
    /// Binary the hook script invokes. Defaults to the running executable.
    pub bin: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load the config if present. A missing file yields defaults; a broken
    /// one is logged and also yields defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config: {:#}", e);
                Self::default()
            }
        }
    }

    /// Apply command-line overrides on top of the file values.
    pub fn with_templates_dir(mut self, dir: Option<PathBuf>) -> Self {
        if dir.is_some() {
            self.templates.dir = dir;
        }
        self
    }
}
