//! Error types for the genesis bootstrap pipeline
//!
//! Every failure aborts the whole run. Collaborator errors are wrapped with
//! the step they came from and otherwise passed through untouched.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::GenesisHash;

/// Errors that abort a bootstrap run
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Build failed: {0}")]
    Build(#[source] CommandError),

    #[error("Node init command failed: {0}")]
    InitCommand(#[source] CommandError),

    #[error("Genesis validation command failed: {0}")]
    ValidationCommand(#[source] CommandError),

    #[error("Genesis fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Genesis from URL {url} is invalid. expected hash {expected}, actual hash {actual}")]
    GenesisIntegrityMismatch {
        url: String,
        expected: GenesisHash,
        actual: GenesisHash,
    },

    #[error("Invalid genesis at {}: {reason}", path.display())]
    InvalidGenesis { path: PathBuf, reason: String },

    #[error("Cannot resolve chain layout: {0}")]
    Layout(String),

    #[error("Bootstrap cancelled")]
    Cancelled,

    #[error("Bootstrap deadline exceeded")]
    DeadlineExceeded,
}

/// Coarse classification of a [`BootstrapError`]
///
/// Lets callers branch on the failure class without matching message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Filesystem,
    Command,
    Fetch,
    IntegrityMismatch,
    InvalidGenesis,
    Layout,
    Interrupted,
}

impl BootstrapError {
    /// Failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Filesystem { .. } => ErrorKind::Filesystem,
            Self::Build(e) | Self::InitCommand(e) | Self::ValidationCommand(e) => match e {
                CommandError::Interrupted { .. } => ErrorKind::Interrupted,
                _ => ErrorKind::Command,
            },
            Self::Fetch(FetchError::Interrupted { .. }) => ErrorKind::Interrupted,
            Self::Fetch(_) => ErrorKind::Fetch,
            Self::GenesisIntegrityMismatch { .. } => ErrorKind::IntegrityMismatch,
            Self::InvalidGenesis { .. } => ErrorKind::InvalidGenesis,
            Self::Layout(_) => ErrorKind::Layout,
            Self::Cancelled | Self::DeadlineExceeded => ErrorKind::Interrupted,
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Errors from external chain commands (build, init, validate-genesis)
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {}: {stderr}", describe_status(*status))]
    Failed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("{program} interrupted by cancellation")]
    Interrupted { program: String },
}

fn describe_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}

/// Errors from the genesis fetch collaborator
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{url} did not return a JSON genesis: {reason}")]
    NotJson { url: String, reason: String },

    #[error("cannot extract {}: {reason}", archive.display())]
    Extraction { archive: PathBuf, reason: String },

    #[error("no genesis.json inside {}", archive.display())]
    MissingGenesis { archive: PathBuf },

    #[error("fetching {url} interrupted by cancellation")]
    Interrupted { url: String },
}
