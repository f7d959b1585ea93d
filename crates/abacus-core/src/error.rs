//! Error types for abacus.

use thiserror::Error;

/// Result type alias for abacus operations.
pub type Result<T> = std::result::Result<T, AbacusError>;

/// Errors that can occur in abacus operations.
///
/// There is no transient or retryable class: every failure here is fatal for
/// the run, because the collective phases require full-group participation
/// and cannot be resumed mid-phase.
#[derive(Error, Debug)]
pub enum AbacusError {
    /// Invalid input detected before any worker was spawned.
    #[error("usage error: {0}")]
    Usage(String),

    /// A buffer could not be sized or created.
    #[error("allocation failure: {0}")]
    Allocation(String),

    /// A collective phase saw a frame whose shape, type or length disagrees
    /// with its peers, or a peer disappeared mid-phase.
    #[error("collective protocol violation: {0}")]
    Collective(String),
}
