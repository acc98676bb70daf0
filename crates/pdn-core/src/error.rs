//! Error types for pdn-core

use thiserror::Error;

/// Result type alias using pdn-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pdn-core operations
///
/// No variant is fatal: every failure is local to one operation and the
/// caller may simply retry the user action.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed local input, blocked before any remote call
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The id did not resolve remotely at write time
    #[error("Not found: {0}")]
    NotFound(String),

    /// A remote create/replace/patch/delete was rejected or unreachable
    #[error("Remote write failed: {0}")]
    RemoteWrite(String),

    /// A live query failed to establish or dropped
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// The operation requires a signed-in user
    #[error("Not signed in")]
    SignedOut,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
