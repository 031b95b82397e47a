//! Service Layer
//!
//! Orchestrates the bootstrap run over the injected collaborators.

pub mod orchestrator;
pub mod resolver;
pub mod validator;

use std::sync::Arc;

use crate::ports::{ChainBuilder, ChainRuntime, EventSink, Filesystem, GenesisFetcher};

pub use orchestrator::BootstrapOrchestrator;
pub use resolver::{GenesisResolver, Resolution, ResolutionStage};
pub use validator::GenesisValidator;

/// External collaborators of a bootstrap run
#[derive(Clone)]
pub struct Collaborators {
    pub builder: Arc<dyn ChainBuilder>,
    pub runtime: Arc<dyn ChainRuntime>,
    pub fetcher: Arc<dyn GenesisFetcher>,
    pub fs: Arc<dyn Filesystem>,
    pub events: Arc<dyn EventSink>,
}
