//! Error type returned across the bus driver facade.

/// Failure surfaced by any [`crate::BusDriver`] operation.
///
/// The facade never retries (see the crate-level docs); callers that want
/// retry behavior implement it above this boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BusError {
    /// The underlying transport reported an error (open/scan/connect/IO).
    #[error("bus transport error: {0}")]
    Transport(String),
    /// A `Handle` or `BusId` was used after it became stale or was never valid.
    #[error("invalid or stale bus handle")]
    Handle,
}
