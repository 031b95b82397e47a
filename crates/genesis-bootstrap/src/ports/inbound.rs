//! Inbound Ports (Driving Ports)
//!
//! API that callers use to bootstrap a chain.

use async_trait::async_trait;

use crate::context::BootstrapContext;
use crate::domain::{BuildCache, ChainHandle, GenesisArtifact};
use crate::error::BootstrapError;

/// Primary bootstrap API (Driving Port)
#[async_trait]
pub trait BootstrapApi: Send + Sync {
    /// Wipe the chain home, build, initialize the node and resolve a
    /// validated genesis.
    ///
    /// On success the handle is marked initialized and, for a remote genesis
    /// fetched without an expected hash, carries the adopted hash. On failure
    /// the handle is left uninitialized and its expected hash untouched.
    async fn init(
        &self,
        chain: &mut ChainHandle,
        cache: &BuildCache,
        ctx: &BootstrapContext,
    ) -> Result<GenesisArtifact, BootstrapError>;
}
