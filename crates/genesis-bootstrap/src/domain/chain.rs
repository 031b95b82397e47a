//! Chain handle and build references

use std::path::{Path, PathBuf};

use super::GenesisHash;

/// Where the initial genesis comes from
///
/// Decided once when the handle is built; the resolver matches on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenesisSource {
    /// Genesis generated by the chain binary's `init` command.
    Default,
    /// Genesis fetched from a URL (raw JSON or tarball).
    Remote(String),
}

impl GenesisSource {
    /// Build from an optional URL; empty or blank URLs mean `Default`
    pub fn from_url(url: Option<&str>) -> Self {
        match url.map(str::trim) {
            Some(url) if !url.is_empty() => Self::Remote(url.to_string()),
            _ => Self::Default,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Default => None,
            Self::Remote(url) => Some(url),
        }
    }
}

/// A chain being bootstrapped
///
/// Exclusively borrowed by the orchestrator for one run. The only fields a
/// run mutates are the expected genesis hash (adopted once, remote source
/// only) and the initialized flag.
#[derive(Clone, Debug)]
pub struct ChainHandle {
    chain_id: String,
    app_dir: PathBuf,
    home: Option<PathBuf>,
    source: GenesisSource,
    expected_hash: Option<GenesisHash>,
    initialized: bool,
}

impl ChainHandle {
    /// Create a handle for the chain whose source lives in `app_dir`
    pub fn new(chain_id: impl Into<String>, app_dir: impl Into<PathBuf>) -> Self {
        Self {
            chain_id: chain_id.into(),
            app_dir: app_dir.into(),
            home: None,
            source: GenesisSource::Default,
            expected_hash: None,
            initialized: false,
        }
    }

    pub fn with_genesis_url(mut self, url: &str) -> Self {
        self.source = GenesisSource::from_url(Some(url));
        self
    }

    pub fn with_expected_hash(mut self, hash: GenesisHash) -> Self {
        self.expected_hash = Some(hash);
        self
    }

    /// Pin the node home instead of letting the layout derive it
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    pub fn home_override(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    pub fn source(&self) -> &GenesisSource {
        &self.source
    }

    pub fn expected_hash(&self) -> Option<&GenesisHash> {
        self.expected_hash.as_ref()
    }

    /// True once a bootstrap run completed successfully
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Record the hash of the first fetched genesis.
    ///
    /// Never overwrites an existing expected hash.
    pub(crate) fn adopt_hash(&mut self, hash: GenesisHash) {
        if self.expected_hash.is_none() {
            self.expected_hash = Some(hash);
        }
    }

    pub(crate) fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
    }
}

/// Handle to the build-artifact cache, passed through to the builder
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildCache {
    dir: PathBuf,
}

impl BuildCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Reference to the binary produced by a build
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildArtifact {
    pub binary: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_url_is_default_source() {
        assert_eq!(GenesisSource::from_url(None), GenesisSource::Default);
        assert_eq!(GenesisSource::from_url(Some("")), GenesisSource::Default);
        assert_eq!(GenesisSource::from_url(Some("  ")), GenesisSource::Default);
    }

    #[test]
    fn test_url_is_remote_source() {
        let source = GenesisSource::from_url(Some(" https://x/genesis.json "));
        assert_eq!(source, GenesisSource::Remote("https://x/genesis.json".to_string()));
        assert_eq!(source.url(), Some("https://x/genesis.json"));
    }

    #[test]
    fn test_adopt_hash_never_overwrites() {
        let mut chain = ChainHandle::new("earth", "/src/earth")
            .with_expected_hash(GenesisHash::new("deadbeef"));

        chain.adopt_hash(GenesisHash::new("cafebabe"));

        assert_eq!(chain.expected_hash(), Some(&GenesisHash::new("deadbeef")));
    }

    #[test]
    fn test_adopt_hash_fills_empty() {
        let mut chain = ChainHandle::new("earth", "/src/earth");
        chain.adopt_hash(GenesisHash::new("abc123"));
        assert_eq!(chain.expected_hash(), Some(&GenesisHash::new("abc123")));
    }

    #[test]
    fn test_new_handle_is_not_initialized() {
        let chain = ChainHandle::new("earth", "/src/earth");
        assert!(!chain.is_initialized());
        assert_eq!(chain.source(), &GenesisSource::Default);
        assert!(chain.home_override().is_none());
    }
}
