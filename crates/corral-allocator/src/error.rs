//! Allocator error types.

use thiserror::Error;

/// Errors that can occur during candidate enumeration.
///
/// Store failures propagate to the caller unmodified; absence of
/// candidates or of demand is never an error (empty stream / `None`).
#[derive(Debug, Error)]
pub enum AllocatorError {
    #[error("state store error: {0}")]
    State(#[from] corral_state::StateError),
}

pub type AllocatorResult<T> = Result<T, AllocatorError>;
