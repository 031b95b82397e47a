//! # Genesis Bootstrap
//!
//! Prepares the on-disk initial state a fresh node needs: chain binary,
//! genesis file and validator key.
//!
//! ## Architecture
//!
//! Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): pure types, no I/O
//!   - `ChainHandle`, `GenesisSource`: the chain being bootstrapped
//!   - `GenesisArtifact`, `GenesisHash`, `GenesisDocument`
//!   - `IntegrityGate`: adopt / match / reject decision on genesis hashes
//!
//! - **Ports Layer** (`ports/`): trait definitions
//!   - `BootstrapApi`: driving port
//!   - `ChainBuilder`, `ChainRuntime`, `NodeCommands`, `GenesisFetcher`,
//!     `EventSink`, `Filesystem`: driven ports
//!
//! - **Service Layer** (`service/`): orchestration
//!   - `BootstrapOrchestrator`: implements `BootstrapApi`
//!   - `GenesisResolver`: default vs remote genesis
//!   - `GenesisValidator`: static `validate-genesis`
//!
//! - **Adapters Layer** (`adapters/`): subprocess, HTTP, filesystem and
//!   event sink implementations of the driven ports
//!
//! ## Pipeline
//!
//! ```text
//! reset home → build → node init → resolve genesis ─┬─ Default: init <moniker>
//!                                                   └─ Remote:  fetch → IntegrityGate
//!                                  → validate-genesis → initialized
//! ```
//!
//! ## Invariants
//!
//! - A chain is marked initialized only after every step succeeded.
//! - A hash adopted from a fetched genesis is never replaced; later fetches
//!   must match it or the run fails with `GenesisIntegrityMismatch`.
//! - The default source never fetches; the remote source never runs the
//!   default-genesis `init`.
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use genesis_bootstrap::adapters::*;
//! use genesis_bootstrap::*;
//!
//! let (events, mut progress) = ChannelEventSink::channel();
//! let orchestrator = BootstrapOrchestrator::new(
//!     Collaborators {
//!         builder: Arc::new(PrebuiltBinary::new("earthd")),
//!         runtime: Arc::new(BinaryChainRuntime::new("earthd", StandardLayout::new("/var/chains"))),
//!         fetcher: Arc::new(HttpGenesisFetcher::new("/tmp/genesis", Duration::from_secs(60))),
//!         fs: Arc::new(TokioFilesystem::new()),
//!         events: Arc::new(events),
//!     },
//!     DEFAULT_MONIKER,
//! );
//!
//! let mut chain = ChainHandle::new("earth", "/src/earth")
//!     .with_genesis_url("https://example.com/genesis.json");
//! let genesis = orchestrator
//!     .init(&mut chain, &BuildCache::new("/var/cache"), &BootstrapContext::background())
//!     .await?;
//! ```

pub mod adapters;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod events;
pub mod ports;
pub mod service;

/// Mock collaborators for deterministic testing.
///
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-exports for convenience
pub use config::{BootstrapConfig, ConfigError, DEFAULT_MONIKER};
pub use context::{BootstrapContext, CancelHandle};
pub use domain::{
    BuildArtifact, BuildCache, ChainHandle, GenesisArtifact, GenesisDocument, GenesisHash,
    GenesisSource, IntegrityDecision, IntegrityGate,
};
pub use error::{BootstrapError, CommandError, ErrorKind, FetchError};
pub use events::{ProgressEvent, ProgressStatus};
pub use ports::{
    BootstrapApi, ChainBuilder, ChainRuntime, EventSink, Filesystem, GenesisFetcher, InitMode,
    NodeCommands,
};
pub use service::{
    BootstrapOrchestrator, Collaborators, GenesisResolver, GenesisValidator, Resolution,
    ResolutionStage,
};
