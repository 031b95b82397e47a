//! Test utilities for the bootstrap pipeline.
//!
//! Mock collaborators that record every call into a shared [`Journal`], so
//! tests can assert on the exact order of side effects and events.
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```ignore
//! use genesis_bootstrap::test_utils::TestHarness;
//! use genesis_bootstrap::{BootstrapApi, BootstrapContext, BootstrapOrchestrator, BuildCache};
//!
//! let harness = TestHarness::in_memory();
//! let orchestrator = BootstrapOrchestrator::new(harness.collaborators(), "moniker");
//! let mut chain = harness.chain();
//!
//! orchestrator
//!     .init(&mut chain, &BuildCache::new("/cache"), &BootstrapContext::background())
//!     .await?;
//! assert_eq!(harness.commands.validate_calls(), 1);
//! ```

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::context::BootstrapContext;
use crate::domain::{BuildArtifact, BuildCache, ChainHandle, GenesisArtifact};
use crate::error::{BootstrapError, CommandError, FetchError};
use crate::events::{ProgressEvent, ProgressStatus};
use crate::ports::{
    ChainBuilder, ChainRuntime, EventSink, Filesystem, GenesisFetcher, InitMode, NodeCommands,
};
use crate::service::Collaborators;

/// Genesis written by the mock `init` and served by the mock fetcher
pub const SAMPLE_GENESIS: &str =
    r#"{"chain_id":"earth","genesis_time":"2024-01-01T00:00:00Z","app_state":{}}"#;

/// Ordered record of calls made to the mocks
#[derive(Clone, Debug, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Number of entries starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.0.lock().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

/// In-memory filesystem keyed by full path
#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    undeletable: Mutex<Vec<PathBuf>>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `remove_all(path)` fail with `PermissionDenied`
    pub fn fail_remove(&self, path: impl Into<PathBuf>) {
        self.undeletable.lock().push(path.into());
    }
}

#[async_trait]
impl Filesystem for MemoryFilesystem {
    async fn remove_all(&self, path: &Path) -> io::Result<()> {
        if self.undeletable.lock().iter().any(|p| p == path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                path.display().to_string(),
            ));
        }
        self.files.lock().retain(|file, _| !file.starts_with(path));
        Ok(())
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.files.lock().insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
}

fn failed(program: &str, stderr: &str) -> CommandError {
    CommandError::Failed {
        program: program.to_string(),
        status: Some(1),
        stderr: stderr.to_string(),
    }
}

/// Builder that records `build` and optionally fails
pub struct MockChainBuilder {
    journal: Journal,
    failure: Mutex<Option<String>>,
    hang: AtomicBool,
}

impl MockChainBuilder {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            failure: Mutex::new(None),
            hang: AtomicBool::new(false),
        }
    }

    pub fn fail_with(&self, stderr: &str) {
        *self.failure.lock() = Some(stderr.to_string());
    }

    /// Make `build` run until the context stops, like a killed compiler
    pub fn hang_until_cancelled(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChainBuilder for MockChainBuilder {
    async fn build(
        &self,
        ctx: &BootstrapContext,
        cache: &BuildCache,
    ) -> Result<BuildArtifact, CommandError> {
        self.journal.record("build");
        if self.hang.load(Ordering::SeqCst) {
            ctx.done().await;
            return Err(CommandError::Interrupted {
                program: "build".to_string(),
            });
        }
        let failure = self.failure.lock().clone();
        if let Some(stderr) = failure {
            return Err(failed("build", &stderr));
        }
        Ok(BuildArtifact {
            binary: cache.dir().join("bin/earthd"),
        })
    }
}

/// Chain binary commands writing their genesis into a [`Filesystem`]
pub struct MockNodeCommands {
    journal: Journal,
    fs: Arc<dyn Filesystem>,
    genesis_path: PathBuf,
    genesis: Mutex<Option<String>>,
    validation_failure: Mutex<Option<String>>,
    init_monikers: Mutex<Vec<String>>,
    validate_calls: AtomicUsize,
}

impl MockNodeCommands {
    pub fn new(journal: Journal, fs: Arc<dyn Filesystem>, genesis_path: PathBuf) -> Self {
        Self {
            journal,
            fs,
            genesis_path,
            genesis: Mutex::new(Some(SAMPLE_GENESIS.to_string())),
            validation_failure: Mutex::new(None),
            init_monikers: Mutex::new(Vec::new()),
            validate_calls: AtomicUsize::new(0),
        }
    }

    /// Contents `init` writes as the default genesis
    pub fn write_genesis(&self, contents: &str) {
        *self.genesis.lock() = Some(contents.to_string());
    }

    /// Make `init` succeed without writing a genesis
    pub fn skip_genesis_write(&self) {
        *self.genesis.lock() = None;
    }

    pub fn fail_validation(&self, stderr: &str) {
        *self.validation_failure.lock() = Some(stderr.to_string());
    }

    pub fn init_monikers(&self) -> Vec<String> {
        self.init_monikers.lock().clone()
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeCommands for MockNodeCommands {
    async fn init(&self, _ctx: &BootstrapContext, moniker: &str) -> Result<(), CommandError> {
        self.journal.record(format!("init:{moniker}"));
        self.init_monikers.lock().push(moniker.to_string());

        let genesis = self.genesis.lock().clone();
        if let Some(contents) = genesis {
            self.fs
                .write(&self.genesis_path, contents.as_bytes())
                .await
                .map_err(|source| CommandError::Spawn {
                    program: "init".to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    async fn validate_genesis(&self, _ctx: &BootstrapContext) -> Result<(), CommandError> {
        self.journal.record("validate-genesis");
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        match self.validation_failure.lock().clone() {
            Some(stderr) => Err(failed("validate-genesis", &stderr)),
            None => Ok(()),
        }
    }
}

/// Chain runtime with a fixed home directory
///
/// The handle's home override is ignored; every chain lives in `home`.
pub struct MockChainRuntime {
    journal: Journal,
    fs: Arc<dyn Filesystem>,
    home: PathBuf,
    commands: Arc<MockNodeCommands>,
    init_failure: Mutex<Option<String>>,
}

impl MockChainRuntime {
    pub fn new(journal: Journal, fs: Arc<dyn Filesystem>, home: PathBuf) -> Self {
        let commands = Arc::new(MockNodeCommands::new(
            journal.clone(),
            fs.clone(),
            genesis_path_in(&home),
        ));
        Self {
            journal,
            fs,
            home,
            commands,
            init_failure: Mutex::new(None),
        }
    }

    pub fn node_commands(&self) -> Arc<MockNodeCommands> {
        self.commands.clone()
    }

    pub fn fail_init(&self, stderr: &str) {
        *self.init_failure.lock() = Some(stderr.to_string());
    }
}

fn genesis_path_in(home: &Path) -> PathBuf {
    home.join("config").join("genesis.json")
}

#[async_trait]
impl ChainRuntime for MockChainRuntime {
    fn home(&self, _chain: &ChainHandle) -> Result<PathBuf, BootstrapError> {
        Ok(self.home.clone())
    }

    fn genesis_path(&self, _chain: &ChainHandle) -> Result<PathBuf, BootstrapError> {
        Ok(genesis_path_in(&self.home))
    }

    async fn init(
        &self,
        _ctx: &BootstrapContext,
        chain: &ChainHandle,
        mode: InitMode,
    ) -> Result<(), CommandError> {
        let mode = match mode {
            InitMode::KeepExisting => "keep-existing",
            InitMode::Overwrite => "overwrite",
        };
        self.journal.record(format!("runtime-init:{mode}"));

        let failure = self.init_failure.lock().clone();
        if let Some(stderr) = failure {
            return Err(failed("init", &stderr));
        }

        let config = format!("moniker = \"{}\"\n", chain.chain_id());
        self.fs
            .write(&self.home.join("config").join("config.toml"), config.as_bytes())
            .await
            .map_err(|source| CommandError::Spawn {
                program: "init".to_string(),
                source,
            })
    }

    async fn commands(
        &self,
        _ctx: &BootstrapContext,
        _chain: &ChainHandle,
    ) -> Result<Arc<dyn NodeCommands>, CommandError> {
        Ok(self.commands.clone())
    }
}

/// Fetcher serving a fixed genesis, optionally as if from a tarball
pub struct MockGenesisFetcher {
    journal: Journal,
    fs: Arc<dyn Filesystem>,
    contents: Mutex<String>,
    tarball: Mutex<Option<PathBuf>>,
    failure: Mutex<Option<u16>>,
    hang: AtomicBool,
    calls: AtomicUsize,
}

impl MockGenesisFetcher {
    pub fn new(journal: Journal, fs: Arc<dyn Filesystem>) -> Self {
        Self {
            journal,
            fs,
            contents: Mutex::new(SAMPLE_GENESIS.to_string()),
            tarball: Mutex::new(None),
            failure: Mutex::new(None),
            hang: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make `fetch` stall until the context stops, like an unanswered request
    pub fn hang_until_cancelled(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn serve(&self, contents: &str) {
        *self.contents.lock() = contents.to_string();
    }

    /// Report the served genesis as extracted from `tarball`
    pub fn serve_tarball(&self, tarball: impl Into<PathBuf>) {
        *self.tarball.lock() = Some(tarball.into());
    }

    /// Fail every fetch with the given HTTP status
    pub fn fail_with(&self, status: u16) {
        *self.failure.lock() = Some(status);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenesisFetcher for MockGenesisFetcher {
    async fn fetch(
        &self,
        ctx: &BootstrapContext,
        url: &str,
        dest: &Path,
    ) -> Result<GenesisArtifact, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.journal.record(format!("fetch:{url}"));

        if self.hang.load(Ordering::SeqCst) {
            ctx.done().await;
            return Err(FetchError::Interrupted {
                url: url.to_string(),
            });
        }

        let failure = *self.failure.lock();
        if let Some(status) = failure {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let contents = self.contents.lock().clone();
        self.fs
            .write(dest, contents.as_bytes())
            .await
            .map_err(|source| FetchError::Io {
                path: dest.to_path_buf(),
                source,
            })?;

        let artifact = GenesisArtifact::new(dest);
        let tarball = self.tarball.lock().clone();
        Ok(match tarball {
            Some(tarball) => artifact.with_tarball(tarball),
            None => artifact,
        })
    }
}

/// Event sink keeping events and mirroring them into the journal
pub struct JournalEventSink {
    journal: Journal,
    events: Mutex<Vec<ProgressEvent>>,
}

impl JournalEventSink {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }
}

impl EventSink for JournalEventSink {
    fn send(&self, event: ProgressEvent) {
        let status = match event.status() {
            ProgressStatus::Ongoing => "ongoing",
            ProgressStatus::Done => "done",
        };
        self.journal
            .record(format!("event:{status}:{}", event.message()));
        self.events.lock().push(event);
    }
}

/// All mocks wired together around one filesystem and home directory
pub struct TestHarness {
    pub journal: Journal,
    pub fs: Arc<dyn Filesystem>,
    pub builder: Arc<MockChainBuilder>,
    pub runtime: Arc<MockChainRuntime>,
    pub commands: Arc<MockNodeCommands>,
    pub fetcher: Arc<MockGenesisFetcher>,
    pub events: Arc<JournalEventSink>,
    home: PathBuf,
}

impl TestHarness {
    /// Harness backed by a [`MemoryFilesystem`] with home `/home/.earth`
    pub fn in_memory() -> Self {
        Self::with_filesystem(Arc::new(MemoryFilesystem::new()), "/home/.earth")
    }

    pub fn with_filesystem(fs: Arc<dyn Filesystem>, home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let journal = Journal::default();
        let runtime = Arc::new(MockChainRuntime::new(
            journal.clone(),
            fs.clone(),
            home.clone(),
        ));
        Self {
            builder: Arc::new(MockChainBuilder::new(journal.clone())),
            commands: runtime.node_commands(),
            runtime,
            fetcher: Arc::new(MockGenesisFetcher::new(journal.clone(), fs.clone())),
            events: Arc::new(JournalEventSink::new(journal.clone())),
            journal,
            fs,
            home,
        }
    }

    /// A default-genesis handle for chain `earth`
    pub fn chain(&self) -> ChainHandle {
        ChainHandle::new("earth", "/src/earth")
    }

    pub fn home(&self) -> PathBuf {
        self.home.clone()
    }

    pub fn genesis_path(&self) -> PathBuf {
        genesis_path_in(&self.home)
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            builder: self.builder.clone(),
            runtime: self.runtime.clone(),
            fetcher: self.fetcher.clone(),
            fs: self.fs.clone(),
            events: self.events.clone(),
        }
    }
}
