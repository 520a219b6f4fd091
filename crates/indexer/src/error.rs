//! Error type for event projection.

use querynode_core::EventId;
use thiserror::Error;

/// Failure while projecting an event.
///
/// Only [`ProjectionError::Inconsistent`] describes the projection itself: the
/// chain guaranteed something the projected state does not contain. The other
/// variants come from the store or from encoding audit payloads. Any of them
/// aborts the enclosing block.
#[derive(Error, Debug)]
pub enum ProjectionError {
    /// Projected state diverged from what the chain guarantees.
    #[error("Inconsistent state in {event} (event {event_id}, block {block}): {message}")]
    Inconsistent {
        /// Event name, e.g. `forum.ThreadDeleted`.
        event: String,
        /// Id the event record would have had.
        event_id: EventId,
        /// Block number.
        block: u64,
        /// What was expected and not found.
        message: String,
    },

    /// Store failure.
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Audit payload could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProjectionError {
    /// True for chain/projector divergence.
    pub fn is_inconsistency(&self) -> bool {
        matches!(self, ProjectionError::Inconsistent { .. })
    }
}

/// Result type alias for ProjectionError.
pub type Result<T> = std::result::Result<T, ProjectionError>;
