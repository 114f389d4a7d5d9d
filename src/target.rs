use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

/// Hook event the managed registration is attached to.
pub const HOOK_EVENT: &str = "UserPromptSubmit";

/// Substring identifying the managed registration's command.
pub const HOOK_MARKER: &str = "agent-state-manager";

/// File name of the materialized hook script.
pub const HOOK_SCRIPT_NAME: &str = "agent-state-manager.sh";

const CLAUDE_DIR: &str = ".claude";

/// Where an installation lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `~/.claude`
    Global,
    /// `./.claude` in the working directory
    Local,
}

impl Scope {
    pub fn from_flag(global: bool) -> Self {
        if global {
            Self::Global
        } else {
            Self::Local
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Local => "project",
        }
    }
}

/// A resolved installation root plus every path derived from it.
#[derive(Debug, Clone)]
pub struct InstallTarget {
    scope: Scope,
    /// `~` for global, the working directory for local
    base: PathBuf,
}

impl InstallTarget {
    /// Resolve the target for the current user and working directory.
    pub fn resolve(scope: Scope) -> Result<Self> {
        let base = match scope {
            Scope::Global => BaseDirs::new()
                .map(|dirs| dirs.home_dir().to_path_buf())
                .context("Cannot determine home directory. Is $HOME set?")?,
            Scope::Local => {
                std::env::current_dir().context("Failed to read current directory")?
            }
        };
        Ok(Self::with_base(scope, base))
    }

    /// Build a target rooted at an explicit base directory.
    pub fn with_base(scope: Scope, base: impl Into<PathBuf>) -> Self {
        Self {
            scope,
            base: base.into(),
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// The `.claude` directory.
    pub fn root(&self) -> PathBuf {
        self.base.join(CLAUDE_DIR)
    }

    pub fn settings_path(&self) -> PathBuf {
        let name = match self.scope {
            Scope::Global => "settings.json",
            Scope::Local => "settings.local.json",
        };
        self.root().join(name)
    }

    /// Global installs keep CLAUDE.md inside `~/.claude`, local ones at the
    /// project root.
    pub fn document_path(&self) -> PathBuf {
        match self.scope {
            Scope::Global => self.root().join("CLAUDE.md"),
            Scope::Local => self.base.join("CLAUDE.md"),
        }
    }

    pub fn hooks_dir(&self) -> PathBuf {
        self.root().join("hooks")
    }

    pub fn hook_script_path(&self) -> PathBuf {
        self.hooks_dir().join(HOOK_SCRIPT_NAME)
    }

    pub fn version_path(&self) -> PathBuf {
        self.root().join(".bmad-version.json")
    }

    pub fn context_path(&self) -> PathBuf {
        context_path_in(&self.root())
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("bmad-mode.toml")
    }

    /// Command registered with the host for this target.
    pub fn hook_command(&self) -> String {
        let dir = match self.scope {
            Scope::Global => "~/.claude",
            Scope::Local => CLAUDE_DIR,
        };
        format!("sh {dir}/hooks/{HOOK_SCRIPT_NAME}")
    }
}

/// Context file inside a `.claude` directory.
pub fn context_path_in(claude_dir: &Path) -> PathBuf {
    claude_dir.join(".agent-context.json")
}
