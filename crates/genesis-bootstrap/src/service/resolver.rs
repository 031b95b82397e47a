//! Genesis Resolver
//!
//! Produces a validated genesis using exactly one of two strategies:
//!
//! - **Default**: the chain binary's `init` writes its own default genesis.
//! - **Remote**: the genesis is fetched from a URL (JSON or tarball) and its
//!   content hash goes through the [`IntegrityGate`].
//!
//! ```text
//! Start → DeletingOldGenesis → FetchingRemote → HashChecking ─┐
//!                            └→ RunningLocalInit ─────────────┴→ Loaded → Validating → Valid
//! ```
//!
//! Any stage may fail; failure is final, nothing is retried here.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::context::BootstrapContext;
use crate::domain::{
    ChainHandle, GenesisArtifact, GenesisDocument, GenesisHash, GenesisSource, IntegrityDecision,
    IntegrityGate,
};
use crate::error::BootstrapError;
use crate::events::ProgressEvent;
use crate::ports::{ChainRuntime, EventSink, Filesystem, GenesisFetcher};
use crate::service::{Collaborators, GenesisValidator};

/// Stage of a single genesis resolution
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionStage {
    Start,
    DeletingOldGenesis,
    FetchingRemote,
    HashChecking,
    RunningLocalInit,
    Loaded,
    Validating,
    Valid,
}

/// Result of a successful resolution
///
/// `adopted_hash` is set only when a remote genesis was fetched for a chain
/// without an expected hash. Applying it to the handle is the caller's job.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub artifact: GenesisArtifact,
    pub adopted_hash: Option<GenesisHash>,
}

pub struct GenesisResolver {
    runtime: Arc<dyn ChainRuntime>,
    fetcher: Arc<dyn GenesisFetcher>,
    fs: Arc<dyn Filesystem>,
    events: Arc<dyn EventSink>,
    validator: GenesisValidator,
    moniker: String,
}

impl GenesisResolver {
    /// Create a resolver; `moniker` names the validator in a default genesis
    pub fn new(collaborators: &Collaborators, moniker: impl Into<String>) -> Self {
        Self {
            runtime: collaborators.runtime.clone(),
            fetcher: collaborators.fetcher.clone(),
            fs: collaborators.fs.clone(),
            events: collaborators.events.clone(),
            validator: GenesisValidator::new(collaborators.runtime.clone()),
            moniker: moniker.into(),
        }
    }

    /// Resolve and validate the chain's initial genesis
    pub async fn resolve(
        &self,
        chain: &ChainHandle,
        ctx: &BootstrapContext,
    ) -> Result<Resolution, BootstrapError> {
        let mut stage = ResolutionStage::Start;

        match self.run(chain, ctx, &mut stage).await {
            Ok(resolution) => Ok(resolution),
            Err(e) => {
                let e = ctx.attribute(e);
                warn!(
                    chain_id = chain.chain_id(),
                    stage = ?stage,
                    error = %e,
                    "Genesis resolution failed"
                );
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        chain: &ChainHandle,
        ctx: &BootstrapContext,
        stage: &mut ResolutionStage,
    ) -> Result<Resolution, BootstrapError> {
        ctx.checkpoint()?;
        self.events.send(ProgressEvent::ongoing("Computing the Genesis"));

        let genesis_path = self.runtime.genesis_path(chain)?;

        advance(stage, ResolutionStage::DeletingOldGenesis);
        self.fs
            .remove_all(&genesis_path)
            .await
            .map_err(|e| BootstrapError::filesystem(&genesis_path, e))?;

        let (artifact, adopted_hash) = match chain.source() {
            GenesisSource::Remote(url) => {
                self.fetch_remote(chain, url, &genesis_path, ctx, stage)
                    .await?
            }
            GenesisSource::Default => {
                let artifact = self
                    .generate_default(chain, &genesis_path, ctx, stage)
                    .await?;
                (artifact, None)
            }
        };
        advance(stage, ResolutionStage::Loaded);

        advance(stage, ResolutionStage::Validating);
        self.validator.validate(chain, ctx).await?;
        advance(stage, ResolutionStage::Valid);

        self.events.send(ProgressEvent::done("Genesis initialized"));
        Ok(Resolution {
            artifact,
            adopted_hash,
        })
    }

    async fn fetch_remote(
        &self,
        chain: &ChainHandle,
        url: &str,
        genesis_path: &Path,
        ctx: &BootstrapContext,
        stage: &mut ResolutionStage,
    ) -> Result<(GenesisArtifact, Option<GenesisHash>), BootstrapError> {
        ctx.checkpoint()?;
        advance(stage, ResolutionStage::FetchingRemote);
        self.events
            .send(ProgressEvent::ongoing("Fetching custom Genesis from URL"));

        let artifact = self.fetcher.fetch(ctx, url, genesis_path).await?;

        match artifact.tarball_path() {
            Some(tarball) => self.events.send(ProgressEvent::done(format!(
                "Extracted custom Genesis from tarball at {}",
                tarball.display()
            ))),
            None => self
                .events
                .send(ProgressEvent::done("Custom Genesis JSON from URL fetched")),
        }

        advance(stage, ResolutionStage::HashChecking);
        let contents = self.read_genesis(artifact.path()).await?;
        let observed = GenesisHash::digest(&contents);

        match IntegrityGate::check(chain.expected_hash(), &observed) {
            IntegrityDecision::Adopt(hash) => {
                info!(
                    chain_id = chain.chain_id(),
                    url,
                    hash = %hash,
                    "No expected genesis hash, adopting fetched hash"
                );
                Ok((artifact, Some(hash)))
            }
            IntegrityDecision::Matches => {
                debug!(chain_id = chain.chain_id(), hash = %observed, "Genesis hash matches");
                Ok((artifact, None))
            }
            IntegrityDecision::Reject { expected, actual } => {
                Err(BootstrapError::GenesisIntegrityMismatch {
                    url: url.to_string(),
                    expected,
                    actual,
                })
            }
        }
    }

    async fn generate_default(
        &self,
        chain: &ChainHandle,
        genesis_path: &Path,
        ctx: &BootstrapContext,
        stage: &mut ResolutionStage,
    ) -> Result<GenesisArtifact, BootstrapError> {
        ctx.checkpoint()?;
        advance(stage, ResolutionStage::RunningLocalInit);

        let commands = self
            .runtime
            .commands(ctx, chain)
            .await
            .map_err(BootstrapError::InitCommand)?;

        // TODO: per-chain monikers; one moniker from BootstrapConfig serves
        // every chain this resolver handles.
        commands
            .init(ctx, &self.moniker)
            .await
            .map_err(BootstrapError::InitCommand)?;

        let contents = self.read_genesis(genesis_path).await?;
        let document =
            GenesisDocument::from_bytes(&contents).map_err(|reason| BootstrapError::InvalidGenesis {
                path: genesis_path.to_path_buf(),
                reason,
            })?;

        debug!(
            chain_id = chain.chain_id(),
            genesis_chain_id = document.chain_id().unwrap_or_default(),
            path = %genesis_path.display(),
            "Default genesis generated"
        );
        Ok(GenesisArtifact::new(genesis_path))
    }

    async fn read_genesis(&self, path: &Path) -> Result<Vec<u8>, BootstrapError> {
        self.fs
            .read(path)
            .await
            .map_err(|e| BootstrapError::filesystem(path, e))
    }
}

fn advance(stage: &mut ResolutionStage, next: ResolutionStage) {
    debug!(from = ?*stage, to = ?next, "Genesis resolution stage");
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::events::ProgressStatus;
    use crate::test_utils::{TestHarness, SAMPLE_GENESIS};

    fn resolver(harness: &TestHarness) -> GenesisResolver {
        GenesisResolver::new(&harness.collaborators(), "moniker")
    }

    #[tokio::test]
    async fn test_default_genesis_runs_init_with_moniker() {
        let harness = TestHarness::in_memory();
        let chain = harness.chain();

        let resolution = resolver(&harness)
            .resolve(&chain, &BootstrapContext::background())
            .await
            .unwrap();

        assert_eq!(resolution.artifact.path(), harness.genesis_path());
        assert!(resolution.artifact.tarball_path().is_none());
        assert!(resolution.adopted_hash.is_none());
        assert_eq!(harness.commands.init_monikers(), vec!["moniker".to_string()]);
        assert_eq!(harness.commands.validate_calls(), 1);
        assert_eq!(harness.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_default_genesis_event_order() {
        let harness = TestHarness::in_memory();

        resolver(&harness)
            .resolve(&harness.chain(), &BootstrapContext::background())
            .await
            .unwrap();

        let events = harness.events.events();
        assert_eq!(
            events,
            vec![
                ProgressEvent::ongoing("Computing the Genesis"),
                ProgressEvent::done("Genesis initialized"),
            ]
        );
    }

    #[tokio::test]
    async fn test_remote_json_adopts_hash() {
        let harness = TestHarness::in_memory();
        let chain = harness.chain().with_genesis_url("https://x/genesis.json");

        let resolution = resolver(&harness)
            .resolve(&chain, &BootstrapContext::background())
            .await
            .unwrap();

        assert_eq!(
            resolution.adopted_hash,
            Some(GenesisHash::digest(SAMPLE_GENESIS.as_bytes()))
        );
        assert!(harness.commands.init_monikers().is_empty());
        assert_eq!(
            harness.events.events(),
            vec![
                ProgressEvent::ongoing("Computing the Genesis"),
                ProgressEvent::ongoing("Fetching custom Genesis from URL"),
                ProgressEvent::done("Custom Genesis JSON from URL fetched"),
                ProgressEvent::done("Genesis initialized"),
            ]
        );
    }

    #[tokio::test]
    async fn test_remote_tarball_reports_extraction() {
        let harness = TestHarness::in_memory();
        harness.fetcher.serve_tarball("/tmp/x/genesis.tar.gz");
        let chain = harness.chain().with_genesis_url("https://x/genesis.json.tar.gz");

        let resolution = resolver(&harness)
            .resolve(&chain, &BootstrapContext::background())
            .await
            .unwrap();

        assert_eq!(
            resolution.artifact.tarball_path(),
            Some(Path::new("/tmp/x/genesis.tar.gz"))
        );
        let events = harness.events.events();
        assert_eq!(
            events[2],
            ProgressEvent::done("Extracted custom Genesis from tarball at /tmp/x/genesis.tar.gz")
        );
    }

    #[tokio::test]
    async fn test_remote_matching_hash_adopts_nothing() {
        let harness = TestHarness::in_memory();
        let expected = GenesisHash::digest(SAMPLE_GENESIS.as_bytes());
        let chain = harness
            .chain()
            .with_genesis_url("https://x/genesis.json")
            .with_expected_hash(expected);

        let resolution = resolver(&harness)
            .resolve(&chain, &BootstrapContext::background())
            .await
            .unwrap();

        assert!(resolution.adopted_hash.is_none());
    }

    #[tokio::test]
    async fn test_remote_mismatch_fails_before_validation() {
        let harness = TestHarness::in_memory();
        let chain = harness
            .chain()
            .with_genesis_url("https://x/genesis.json")
            .with_expected_hash(GenesisHash::new("deadbeef"));

        let err = resolver(&harness)
            .resolve(&chain, &BootstrapContext::background())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IntegrityMismatch);
        assert!(err.to_string().contains("deadbeef"));
        assert_eq!(harness.commands.validate_calls(), 0);
        assert!(!harness
            .events
            .events()
            .iter()
            .any(|e| e.message() == "Genesis initialized"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fetch_error() {
        let harness = TestHarness::in_memory();
        harness.fetcher.fail_with(404);
        let chain = harness.chain().with_genesis_url("https://x/genesis.json");

        let err = resolver(&harness)
            .resolve(&chain, &BootstrapContext::background())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Fetch);
        let last = harness.events.events().pop().unwrap();
        assert_eq!(last.status(), ProgressStatus::Ongoing);
    }

    #[tokio::test]
    async fn test_stale_genesis_is_removed_before_init() {
        let harness = TestHarness::in_memory();
        harness
            .fs
            .write(&harness.genesis_path(), b"stale")
            .await
            .unwrap();
        harness.commands.skip_genesis_write();

        let err = resolver(&harness)
            .resolve(&harness.chain(), &BootstrapContext::background())
            .await
            .unwrap_err();

        // init wrote nothing and the stale file is gone, so loading fails
        assert_eq!(err.kind(), ErrorKind::Filesystem);
    }

    #[tokio::test]
    async fn test_default_genesis_must_be_json_object() {
        let harness = TestHarness::in_memory();
        harness.commands.write_genesis("[]");

        let err = resolver(&harness)
            .resolve(&harness.chain(), &BootstrapContext::background())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidGenesis);
        assert_eq!(harness.commands.validate_calls(), 0);
    }

    #[tokio::test]
    async fn test_custom_moniker_reaches_init() {
        let harness = TestHarness::in_memory();
        let resolver = GenesisResolver::new(&harness.collaborators(), "node-7");

        resolver
            .resolve(&harness.chain(), &BootstrapContext::background())
            .await
            .unwrap();

        assert_eq!(harness.commands.init_monikers(), vec!["node-7".to_string()]);
    }

    #[tokio::test]
    async fn test_cancel_during_fetch_is_cancelled() {
        let harness = TestHarness::in_memory();
        harness.fetcher.hang_until_cancelled();
        let chain = harness.chain().with_genesis_url("https://x/genesis.json");
        let (ctx, handle) = BootstrapContext::new();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            handle.cancel();
        });

        let err = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            resolver(&harness).resolve(&chain, &ctx),
        )
        .await
        .expect("fetch should stop once cancelled")
        .unwrap_err();

        assert!(matches!(err, BootstrapError::Cancelled));
        assert_eq!(err.kind(), ErrorKind::Interrupted);
        assert_eq!(harness.commands.validate_calls(), 0);
    }
}
