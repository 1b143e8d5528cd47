//! High-level client API.

use crate::connection::{self, ClientConfig};
use crate::error::ClientError;
use crate::state::{ChamberState, SharedState};
use crate::transport::{Dialer, WsDialer};
use bytes::Bytes;
use chamberlink_protocol::Command;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Capacity of the outbound command channel.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Handle to a supervised controller connection.
///
/// Dropping the handle (or calling [`ChamberClient::close`]) stops the
/// supervisor; until then it reconnects indefinitely.
pub struct ChamberClient {
    state: SharedState,
    cmd_tx: mpsc::Sender<Bytes>,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ChamberClient {
    /// Connects to the controller over WebSocket and returns immediately;
    /// the connection is established (and re-established) in the background.
    pub fn connect(config: ClientConfig) -> Self {
        Self::connect_with_dialer(config, WsDialer)
    }

    /// Connects through a custom transport dialer.
    pub fn connect_with_dialer<D: Dialer>(config: ClientConfig, dialer: D) -> Self {
        let state = SharedState::new();
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(connection::run(
            dialer,
            config,
            state.clone(),
            cmd_rx,
            shutdown_rx,
        ));

        Self {
            state,
            cmd_tx,
            shutdown_tx,
            task: Mutex::new(Some(task)),
        }
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> ChamberState {
        self.state.snapshot()
    }

    /// Returns the shared state handle for observers.
    pub fn shared(&self) -> SharedState {
        self.state.clone()
    }

    /// Returns whether telemetry arrived within the last keepalive interval.
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Encodes and sends a command.
    ///
    /// Out-of-range values fail with [`ClientError::Protocol`] before
    /// anything is sent. A command issued while the client is closed or
    /// reconnecting is dropped as a no-op; racing a reconnect is expected
    /// and harmless.
    pub async fn send(&self, command: Command) -> Result<(), ClientError> {
        let frame = command.encode()?;
        if self.cmd_tx.send(frame).await.is_err() {
            tracing::debug!(?command, "client closed, dropping command");
        }
        Ok(())
    }

    /// Sets the chamber temperature set point in degrees Celsius.
    pub async fn set_temperature(&self, deg_c: u16) -> Result<(), ClientError> {
        self.send(Command::SetTemperature(deg_c)).await
    }

    /// Sets the heater run timer in minutes.
    pub async fn set_heater_time_left(&self, mins: u32) -> Result<(), ClientError> {
        self.send(Command::SetHeaterTimeLeft(mins)).await
    }

    /// Switches the chamber light.
    pub async fn set_light(&self, on: bool) -> Result<(), ClientError> {
        self.send(Command::SetLight(on)).await
    }

    /// Switches the heater fan.
    pub async fn set_heater_fan(&self, on: bool) -> Result<(), ClientError> {
        self.send(Command::SetHeaterFan(on)).await
    }

    /// Switches the door vent fan.
    pub async fn set_door_vent_fan(&self, on: bool) -> Result<(), ClientError> {
        self.send(Command::SetDoorVentFan(on)).await
    }

    /// Switches the auxiliary fan.
    pub async fn set_aux_fan(&self, on: bool) -> Result<(), ClientError> {
        self.send(Command::SetAuxFan(on)).await
    }

    /// Stops the supervisor, closes the transport, and resets the shared
    /// state to defaults. Idempotent: a second call is a no-op.
    pub async fn close(&self) {
        let _ = self.shutdown_tx.send(true);
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::debug!("supervisor task join error: {}", e);
            }
        }
    }
}
