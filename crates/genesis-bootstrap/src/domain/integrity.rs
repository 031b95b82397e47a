//! Genesis integrity gate
//!
//! Decides whether a fetched genesis may be used, given the hash the chain
//! already expects (if any).

use super::GenesisHash;

/// Outcome of an integrity check
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntegrityDecision {
    /// No hash was expected; the observed one becomes the expected hash.
    Adopt(GenesisHash),
    /// Observed hash equals the expected one.
    Matches,
    /// Observed hash differs from the expected one.
    Reject {
        expected: GenesisHash,
        actual: GenesisHash,
    },
}

/// Pure integrity check, no I/O
pub struct IntegrityGate;

impl IntegrityGate {
    pub fn check(expected: Option<&GenesisHash>, observed: &GenesisHash) -> IntegrityDecision {
        match expected {
            None => IntegrityDecision::Adopt(observed.clone()),
            Some(expected) if expected == observed => IntegrityDecision::Matches,
            Some(expected) => IntegrityDecision::Reject {
                expected: expected.clone(),
                actual: observed.clone(),
            },
        }
    }
}
