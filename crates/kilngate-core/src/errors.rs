//! Engine-level faults.
//!
//! Expected denials are `Decision` values (see [`crate::decision`]); the
//! variants here are integration faults that propagate to the caller
//! uninterpreted.

use thiserror::Error;

use crate::quota::QuotaError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A later-presented input does not match the hash recorded at proposal
    /// creation. Treated as a distinct, invalid execution attempt, never as
    /// a plain denial.
    #[error("input for proposal {proposal_id} does not match its recorded hash (expected {expected}, got {presented})")]
    InputTampered {
        proposal_id: String,
        expected: String,
        presented: String,
    },

    #[error(transparent)]
    Quota(#[from] QuotaError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    pub fn is_input_tampered(&self) -> bool {
        matches!(self, Self::InputTampered { .. })
    }
}
