use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("no such file: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("checkpoints list is empty")]
    NoCheckpoints,

    #[error("invalid checkpoint (missing release image): {0}")]
    InvalidCheckpoint(String),

    #[error("installer binary '{0}' not found in PATH")]
    InstallerNotFound(String),

    #[error("failed to probe '{program} version': {reason}")]
    ProbeExec { program: String, reason: String },

    #[error("malformed {kind} line: {line:?}")]
    MalformedOutput { kind: LineKind, line: String },

    #[error("failed to run installer: {0}")]
    Subprocess(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Version,
    Commit,
    Image,
}

impl std::fmt::Display for LineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Version => write!(f, "version"),
            Self::Commit => write!(f, "commit"),
            Self::Image => write!(f, "image"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
