//! Small JSON records kept next to the installation.
//!
//! `.bmad-version.json` remembers which release installed the integration,
//! `.agent-context.json` remembers the last agent the user activated.

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::InstallError;

/// Prefix of the agent activation command, as typed by the user.
pub const AGENT_COMMAND_PREFIX: &str = "/BMad:agents:";

/// Which release installed the integration, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub version: String,
    pub installed_at: String,
}

impl VersionRecord {
    pub fn now(version: &str) -> Self {
        Self {
            version: version.to_string(),
            installed_at: timestamp(),
        }
    }
}

/// The agent most recently activated through `/BMad:agents:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentContext {
    pub active_agent: String,
    pub saved_at: String,
    pub command: String,
}

impl AgentContext {
    pub fn now(agent: &str) -> Self {
        Self {
            active_agent: agent.to_string(),
            saved_at: timestamp(),
            command: format!("{AGENT_COMMAND_PREFIX}{agent}"),
        }
    }
}

/// ISO-8601 UTC timestamp with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read and deserialize a JSON record.
pub fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T, InstallError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(InstallError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(InstallError::read(path, e)),
    };
    serde_json::from_str(&content).map_err(|source| InstallError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a record as pretty JSON, replacing the whole file.
pub fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<(), InstallError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| InstallError::write(parent, e))?;
    }
    let content = serde_json::to_string_pretty(record).map_err(|source| InstallError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, content).map_err(|e| InstallError::write(path, e))
}

/// Delete a record file. Returns `false` when there was nothing to delete.
pub fn remove_record(path: &Path) -> Result<bool, InstallError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(InstallError::write(path, e)),
    }
}

pub fn save_version(path: &Path, record: &VersionRecord) -> Result<(), InstallError> {
    write_record(path, record)
}

pub fn save_agent_context(path: &Path, context: &AgentContext) -> Result<(), InstallError> {
    write_record(path, context)
}

/// Installed version record, `None` if missing or unreadable.
pub fn load_version(path: &Path) -> Option<VersionRecord> {
    match read_record(path) {
        Ok(record) => Some(record),
        Err(InstallError::NotFound { .. }) => None,
        Err(e) => {
            tracing::debug!("{}", e);
            None
        }
    }
}
