//! Genesis artifact, content hash and document parsing
//!
//! Everything here is pure: bytes in, values out. Reading the file is the
//! caller's business (see `ports::Filesystem`).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Content hash of a genesis file
///
/// Lowercase hex SHA-256 of the raw file bytes. Comparison is
/// case-insensitive because values are normalized on construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenesisHash(String);

impl GenesisHash {
    /// Wrap an existing hash string, normalizing case and surrounding whitespace
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_ascii_lowercase())
    }

    /// Parse an optional hash; empty input means "no expected hash"
    pub fn parse(value: &str) -> Option<Self> {
        let hash = Self::new(value);
        if hash.0.is_empty() {
            None
        } else {
            Some(hash)
        }
    }

    /// Hash raw genesis bytes
    pub fn digest(contents: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(contents)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GenesisHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The resolved genesis
///
/// Holds where the genesis lives and, for archive sources, where the
/// downloaded tarball was kept. The hash is derived from the file on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenesisArtifact {
    path: PathBuf,
    tarball_path: Option<PathBuf>,
}

impl GenesisArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tarball_path: None,
        }
    }

    /// Mark the artifact as extracted from the given archive
    pub fn with_tarball(mut self, tarball_path: impl Into<PathBuf>) -> Self {
        self.tarball_path = Some(tarball_path.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tarball_path(&self) -> Option<&Path> {
        self.tarball_path.as_deref()
    }
}

/// Parsed genesis document
///
/// Only the structure every genesis shares is checked: the top level must be
/// a JSON object. Chain-specific sections are left to `validate-genesis`.
#[derive(Clone, Debug)]
pub struct GenesisDocument {
    root: Map<String, Value>,
}

impl GenesisDocument {
    pub fn from_bytes(contents: &[u8]) -> Result<Self, String> {
        match serde_json::from_slice::<Value>(contents) {
            Ok(Value::Object(root)) => Ok(Self { root }),
            Ok(_) => Err("genesis root is not a JSON object".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// The `chain_id` recorded in the genesis, if any
    pub fn chain_id(&self) -> Option<&str> {
        self.root.get("chain_id").and_then(Value::as_str)
    }
}
