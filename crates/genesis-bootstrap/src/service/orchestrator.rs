//! Bootstrap Orchestrator
//!
//! Top-level sequencer of a bootstrap run:
//!
//! 1. Reset the chain home (recursive delete, missing home is fine)
//! 2. Build the chain binary
//! 3. Initialize the node home without overwriting
//! 4. Resolve and validate the genesis
//! 5. Mark the chain initialized
//!
//! Every step is a hard sequence point. The first failure is returned and the
//! chain is left uninitialized. A collaborator interrupted by the context is
//! reported as `Cancelled` or `DeadlineExceeded`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::BootstrapConfig;
use crate::context::BootstrapContext;
use crate::domain::{BuildCache, ChainHandle, GenesisArtifact};
use crate::error::BootstrapError;
use crate::events::ProgressEvent;
use crate::ports::{BootstrapApi, ChainBuilder, ChainRuntime, EventSink, Filesystem, InitMode};
use crate::service::{Collaborators, GenesisResolver, Resolution};

pub struct BootstrapOrchestrator {
    builder: Arc<dyn ChainBuilder>,
    runtime: Arc<dyn ChainRuntime>,
    fs: Arc<dyn Filesystem>,
    events: Arc<dyn EventSink>,
    resolver: GenesisResolver,
}

impl BootstrapOrchestrator {
    /// Create an orchestrator using `moniker` for default geneses
    pub fn new(collaborators: Collaborators, moniker: impl Into<String>) -> Self {
        let resolver = GenesisResolver::new(&collaborators, moniker);
        Self {
            builder: collaborators.builder,
            runtime: collaborators.runtime,
            fs: collaborators.fs,
            events: collaborators.events,
            resolver,
        }
    }

    pub fn with_config(collaborators: Collaborators, config: &BootstrapConfig) -> Self {
        Self::new(collaborators, config.moniker.clone())
    }

    async fn run(
        &self,
        chain: &mut ChainHandle,
        cache: &BuildCache,
        ctx: &BootstrapContext,
    ) -> Result<GenesisArtifact, BootstrapError> {
        ctx.checkpoint()?;
        chain.set_initialized(false);

        let home = self.runtime.home(chain)?;
        info!(
            chain_id = chain.chain_id(),
            home = %home.display(),
            "Resetting chain home"
        );
        self.fs
            .remove_all(&home)
            .await
            .map_err(|e| BootstrapError::filesystem(&home, e))?;

        ctx.checkpoint()?;
        let binary = self
            .builder
            .build(ctx, cache)
            .await
            .map_err(BootstrapError::Build)?;
        debug!(
            chain_id = chain.chain_id(),
            binary = %binary.binary.display(),
            "Chain binary built"
        );

        ctx.checkpoint()?;
        self.events
            .send(ProgressEvent::ongoing("Initializing the blockchain"));
        self.runtime
            .init(ctx, chain, InitMode::KeepExisting)
            .await
            .map_err(BootstrapError::InitCommand)?;

        let Resolution {
            artifact,
            adopted_hash,
        } = self.resolver.resolve(chain, ctx).await?;

        if let Some(hash) = adopted_hash {
            chain.adopt_hash(hash);
        }

        self.events.send(ProgressEvent::done("Blockchain initialized"));
        chain.set_initialized(true);

        info!(
            chain_id = chain.chain_id(),
            genesis = %artifact.path().display(),
            "Chain bootstrapped"
        );
        Ok(artifact)
    }
}

#[async_trait]
impl BootstrapApi for BootstrapOrchestrator {
    async fn init(
        &self,
        chain: &mut ChainHandle,
        cache: &BuildCache,
        ctx: &BootstrapContext,
    ) -> Result<GenesisArtifact, BootstrapError> {
        self.run(chain, cache, ctx)
            .await
            .map_err(|e| ctx.attribute(e))
    }
}
