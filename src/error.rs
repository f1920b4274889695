// Error taxonomy for the telemetry data-access layer
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Empty or missing required argument, raised before any transport call.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// The store reported the queried resource as absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Failure surfaced by the underlying store client, propagated unmodified.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
