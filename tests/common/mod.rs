#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary project directory with its own fake `$HOME`.
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("project")).expect("failed to create project dir");
        std::fs::create_dir_all(dir.path().join("home")).expect("failed to create home dir");
        Self { dir }
    }

    /// Working directory for local installs.
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("project")
    }

    /// Value of `$HOME` for the commands under test.
    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    /// `.claude` directory of the local target.
    pub fn claude_dir(&self) -> PathBuf {
        self.path().join(".claude")
    }

    /// `.claude` directory of the global target.
    pub fn global_claude_dir(&self) -> PathBuf {
        self.home().join(".claude")
    }

    pub fn local_settings_path(&self) -> PathBuf {
        self.claude_dir().join("settings.local.json")
    }

    pub fn local_document_path(&self) -> PathBuf {
        self.path().join("CLAUDE.md")
    }

    /// Write a file relative to the project root, creating parent dirs as needed.
    pub fn write_file(&self, relative_path: &str, content: &str) {
        write(&self.path().join(relative_path), content);
    }

    pub fn read_json(&self, path: &Path) -> serde_json::Value {
        let content = std::fs::read_to_string(path).expect("failed to read json file");
        serde_json::from_str(&content).expect("invalid json")
    }

    /// A command for the binary, run inside the project with the fake home.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(Self::bin());
        cmd.current_dir(self.path())
            .env("HOME", self.home())
            .env_remove("BMAD_MODE_TEMPLATES")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Return the path to the binary (built via cargo).
    pub fn bin() -> PathBuf {
        PathBuf::from(env!("CARGO_BIN_EXE_bmad-mode-changer"))
    }
}

pub fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create parent dirs");
    }
    std::fs::write(path, content).expect("failed to write file");
}

/// Number of managed hook groups under `hooks.UserPromptSubmit`.
pub fn managed_hook_count(settings: &serde_json::Value) -> usize {
    settings["hooks"]["UserPromptSubmit"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter(|g| {
                    g["hooks"]
                        .as_array()
                        .into_iter()
                        .flatten()
                        .any(|h| {
                            h["command"]
                                .as_str()
                                .is_some_and(|c| c.contains("agent-state-manager"))
                        })
                })
                .count()
        })
        .unwrap_or(0)
}

pub const MANAGED_PHRASE: &str = "모드 변경(Shift+Tab) 후 에이전트 자동 복원";
