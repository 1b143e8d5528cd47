//! # chamberlink-client
//!
//! Async client for the chamber environmental controller.
//!
//! This crate provides:
//! - A WebSocket transport carrying binary telemetry/command frames
//! - A supervised connection with keepalive, staleness detection, and
//!   automatic reconnection with fixed backoff
//! - A shared state record holding the last-known telemetry plus connection
//!   health, written only by the connection task and readable by anyone

pub mod client;
pub mod connection;
pub mod error;
pub mod state;
pub mod transport;

pub use client::ChamberClient;
pub use connection::ClientConfig;
pub use error::ClientError;
pub use state::{ChamberState, SharedState};
pub use transport::{Dialer, Transport, TransportError, WsDialer};
