//! Domain Layer
//!
//! Pure types and decisions. No I/O happens in this module.

pub mod chain;
pub mod genesis;
pub mod integrity;

pub use chain::{BuildArtifact, BuildCache, ChainHandle, GenesisSource};
pub use genesis::{GenesisArtifact, GenesisDocument, GenesisHash};
pub use integrity::{IntegrityDecision, IntegrityGate};
