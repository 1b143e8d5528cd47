//! Client error types.

use chamberlink_protocol::ProtocolError;
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("timed out waiting for telemetry")]
    TelemetryTimeout,
}
