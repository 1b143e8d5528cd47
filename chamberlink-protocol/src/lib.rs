//! # chamberlink-protocol
//!
//! Wire protocol for the chamber environmental controller.
//!
//! This crate provides:
//! - Telemetry frame decoding (fixed-layout binary frames, little-endian
//!   multi-byte fields, one flags bitfield byte)
//! - Control command encoding (one opcode byte plus a fixed-width payload)
//! - Wire profiles describing the byte offsets, bit positions, and scaling
//!   constants of each supported firmware revision
//!
//! Everything here is pure: no I/O, no state. The connection machinery lives
//! in `chamberlink-client`.

pub mod command;
pub mod error;
pub mod profile;
pub mod telemetry;

pub use command::Command;
pub use error::ProtocolError;
pub use profile::{FlagBits, WireProfile, REV_A, REV_B};
pub use telemetry::{StatusFlags, TelemetryFrame};

/// Conventional WebSocket endpoint path exposed by the controller firmware.
pub const ENDPOINT_PATH: &str = "/ws";
