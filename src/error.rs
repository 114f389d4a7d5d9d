use std::path::PathBuf;
use thiserror::Error;

/// Failures an install or uninstall step can run into.
///
/// `NotFound` and `Parse` are usually recovered from by the caller (create
/// path, or treat as empty). `Read`, `Write` and `TemplateMissing` fail the
/// step that hit them without stopping sibling steps.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("{} not found", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template not found: {name}")]
    TemplateMissing { name: String },
}

impl InstallError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
