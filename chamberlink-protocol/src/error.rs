//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding telemetry or encoding commands.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The inbound buffer is shorter than the profile's declared frame
    /// length. The frame is dropped; connection health is unaffected.
    #[error("frame too short: {len} bytes (need {expected})")]
    ShortFrame { len: usize, expected: usize },

    /// A numeric value does not fit the field width the wire format declares
    /// for it.
    #[error("{field} out of range: {value} (max {max})")]
    ValueOutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },
}

impl ProtocolError {
    /// Returns whether the error is recoverable per-frame (the connection
    /// stays up and later frames are still processed).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProtocolError::ShortFrame { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_frame_display() {
        let err = ProtocolError::ShortFrame {
            len: 4,
            expected: 9,
        };
        let msg = err.to_string();
        assert!(msg.contains('4'));
        assert!(msg.contains('9'));
    }

    #[test]
    fn test_out_of_range_display() {
        let err = ProtocolError::ValueOutOfRange {
            field: "temp_set_deg_c",
            value: 300,
            max: 255,
        };
        let msg = err.to_string();
        assert!(msg.contains("temp_set_deg_c"));
        assert!(msg.contains("300"));
        assert!(msg.contains("255"));
    }

    #[test]
    fn test_recoverable() {
        assert!(ProtocolError::ShortFrame {
            len: 0,
            expected: 9
        }
        .is_recoverable());
        assert!(!ProtocolError::ValueOutOfRange {
            field: "x",
            value: 1,
            max: 0
        }
        .is_recoverable());
    }
}
