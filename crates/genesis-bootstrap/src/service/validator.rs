//! Genesis Validator
//!
//! Runs the chain binary's static `validate-genesis` check.
//!
//! Static validation is structural only: it does not start the chain, so
//! some invalid geneses (malformed genesis transactions, for one) still
//! pass. A passing result is necessary, not sufficient.

use std::sync::Arc;

use tracing::debug;

use crate::context::BootstrapContext;
use crate::domain::ChainHandle;
use crate::error::BootstrapError;
use crate::ports::ChainRuntime;

pub struct GenesisValidator {
    runtime: Arc<dyn ChainRuntime>,
}

impl GenesisValidator {
    pub fn new(runtime: Arc<dyn ChainRuntime>) -> Self {
        Self { runtime }
    }

    /// Validate the genesis currently stored in the chain home.
    ///
    /// The command's error is returned as-is, wrapped in
    /// [`BootstrapError::ValidationCommand`].
    pub async fn validate(
        &self,
        chain: &ChainHandle,
        ctx: &BootstrapContext,
    ) -> Result<(), BootstrapError> {
        ctx.checkpoint()?;

        let commands = self
            .runtime
            .commands(ctx, chain)
            .await
            .map_err(BootstrapError::ValidationCommand)?;

        commands
            .validate_genesis(ctx)
            .await
            .map_err(BootstrapError::ValidationCommand)?;

        debug!(chain_id = chain.chain_id(), "Static genesis validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::TestHarness;

    #[tokio::test]
    async fn test_validation_passes() {
        let harness = TestHarness::in_memory();
        let validator = GenesisValidator::new(harness.runtime.clone());

        validator
            .validate(&harness.chain(), &BootstrapContext::background())
            .await
            .unwrap();

        assert_eq!(harness.commands.validate_calls(), 1);
    }

    #[tokio::test]
    async fn test_validation_failure_is_returned_verbatim() {
        let harness = TestHarness::in_memory();
        harness.commands.fail_validation("invalid gentx");
        let validator = GenesisValidator::new(harness.runtime.clone());

        let err = validator
            .validate(&harness.chain(), &BootstrapContext::background())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Command);
        assert!(matches!(err, BootstrapError::ValidationCommand(_)));
        assert!(err.to_string().contains("invalid gentx"));
    }

    #[tokio::test]
    async fn test_cancelled_context_skips_command() {
        let harness = TestHarness::in_memory();
        let validator = GenesisValidator::new(harness.runtime.clone());
        let (ctx, cancel) = BootstrapContext::new();
        cancel.cancel();

        let err = validator.validate(&harness.chain(), &ctx).await.unwrap_err();

        assert!(matches!(err, BootstrapError::Cancelled));
        assert_eq!(harness.commands.validate_calls(), 0);
    }
}
