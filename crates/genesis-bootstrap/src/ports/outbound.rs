//! Outbound Ports (Driven Ports)
//!
//! Collaborators the bootstrap pipeline depends on but does not implement:
//! the chain build, the chain binary's commands, the genesis fetcher, the
//! progress observer and the filesystem.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::BootstrapContext;
use crate::domain::{BuildArtifact, BuildCache, ChainHandle, GenesisArtifact};
use crate::error::{BootstrapError, CommandError, FetchError};
use crate::events::ProgressEvent;

/// Produces a runnable chain binary
#[async_trait]
pub trait ChainBuilder: Send + Sync {
    async fn build(
        &self,
        ctx: &BootstrapContext,
        cache: &BuildCache,
    ) -> Result<BuildArtifact, CommandError>;
}

/// How local node initialization treats existing configuration
///
/// The bootstrap pipeline always uses `KeepExisting`, since it has just
/// wiped the home. `Overwrite` is for callers re-initializing a live home
/// through a [`ChainRuntime`] directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitMode {
    /// Keep whatever configuration already exists in the home.
    KeepExisting,
    /// Overwrite existing configuration (`--overwrite`).
    Overwrite,
}

/// The chain runtime: home layout plus the binary's commands
///
/// Home directory and genesis locations are owned by the chain runtime;
/// the pipeline only deletes, recreates (through these commands) and reads
/// them.
#[async_trait]
pub trait ChainRuntime: Send + Sync {
    /// Node home directory for the chain
    fn home(&self, chain: &ChainHandle) -> Result<PathBuf, BootstrapError>;

    /// Location of the genesis file inside the home
    fn genesis_path(&self, chain: &ChainHandle) -> Result<PathBuf, BootstrapError>;

    /// Initialize the node home (keys, config) for the chain
    async fn init(
        &self,
        ctx: &BootstrapContext,
        chain: &ChainHandle,
        mode: InitMode,
    ) -> Result<(), CommandError>;

    /// Command set of the chain binary
    async fn commands(
        &self,
        ctx: &BootstrapContext,
        chain: &ChainHandle,
    ) -> Result<Arc<dyn NodeCommands>, CommandError>;
}

/// Subcommands of a built chain binary
#[async_trait]
pub trait NodeCommands: Send + Sync {
    /// Run `init` with the given moniker; writes the default genesis
    async fn init(&self, ctx: &BootstrapContext, moniker: &str) -> Result<(), CommandError>;

    /// Run static genesis validation
    async fn validate_genesis(&self, ctx: &BootstrapContext) -> Result<(), CommandError>;
}

/// Fetches a genesis from a URL into `dest`
///
/// The source may be a raw JSON document or an archive; in the latter case
/// the returned artifact reports the tarball path.
#[async_trait]
pub trait GenesisFetcher: Send + Sync {
    async fn fetch(
        &self,
        ctx: &BootstrapContext,
        url: &str,
        dest: &Path,
    ) -> Result<GenesisArtifact, FetchError>;
}

/// Observer of progress events
///
/// Fire-and-forget: the sink must keep the order events are sent in and
/// gives no acknowledgment.
pub trait EventSink: Send + Sync {
    fn send(&self, event: ProgressEvent);
}

/// Filesystem operations used by the pipeline
///
/// The pipeline itself only removes and reads. `write` is how collaborators
/// sharing the filesystem (a fetcher, in-memory test doubles) place files
/// the pipeline later reads.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Recursively remove `path`; a missing path is not an error
    async fn remove_all(&self, path: &Path) -> io::Result<()>;

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write `contents`, creating parent directories as needed
    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}
