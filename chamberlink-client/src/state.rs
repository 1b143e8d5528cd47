//! Shared application state: last-known telemetry plus connection health.
//!
//! The connection task is the only writer. Observers clone [`SharedState`]
//! and read snapshots at any time; a snapshot is taken under the lock, so a
//! half-applied frame is never observable.

use chamberlink_protocol::TelemetryFrame;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Notify;

/// Set point the state starts out with before the first frame arrives.
pub const DEFAULT_TEMP_SET_DEG_C: u8 = 32;

/// Last-known device status plus connection health.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChamberState {
    /// Most recently decoded telemetry frame.
    pub telemetry: TelemetryFrame,
    /// Unix timestamp in milliseconds of the last decoded frame, 0 when
    /// disconnected.
    pub last_message_at_ms: u64,
    /// Whether telemetry arrived within the last keepalive interval.
    pub connected: bool,
}

impl Default for ChamberState {
    fn default() -> Self {
        Self {
            telemetry: TelemetryFrame {
                temp_set_deg_c: DEFAULT_TEMP_SET_DEG_C,
                ..TelemetryFrame::default()
            },
            last_message_at_ms: 0,
            connected: false,
        }
    }
}

/// Handle to the shared state record. Cheap to clone.
#[derive(Clone, Default)]
pub struct SharedState {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: RwLock<ChamberState>,
    changed: Notify,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> ChamberState {
        *self.inner.state.read()
    }

    /// Returns whether the connection is currently considered alive.
    pub fn is_connected(&self) -> bool {
        self.inner.state.read().connected
    }

    /// Waits until the next telemetry frame is applied.
    pub async fn changed(&self) {
        self.inner.changed.notified().await;
    }

    /// Replaces the telemetry fields with a freshly decoded frame and
    /// refreshes connection health.
    pub(crate) fn apply_frame(&self, frame: TelemetryFrame) {
        {
            let mut state = self.inner.state.write();
            state.telemetry = frame;
            state.last_message_at_ms = unix_ms();
            state.connected = true;
        }
        self.inner.changed.notify_waiters();
    }

    /// Marks the transport as freshly opened.
    pub(crate) fn mark_open(&self) {
        let mut state = self.inner.state.write();
        state.last_message_at_ms = unix_ms();
        state.connected = true;
    }

    /// Updates only the freshness verdict from a keepalive tick.
    pub(crate) fn set_connected(&self, connected: bool) {
        self.inner.state.write().connected = connected;
    }

    /// Marks the connection as down: timestamp cleared, connected false.
    /// Telemetry fields keep their last-known values until reconnect or
    /// teardown.
    pub(crate) fn mark_down(&self) {
        let mut state = self.inner.state.write();
        state.last_message_at_ms = 0;
        state.connected = false;
    }

    /// Resets everything to defaults. Called once on final teardown.
    pub(crate) fn reset(&self) {
        *self.inner.state.write() = ChamberState::default();
        self.inner.changed.notify_waiters();
    }
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = ChamberState::default();
        assert_eq!(state.telemetry.temp_set_deg_c, DEFAULT_TEMP_SET_DEG_C);
        assert_eq!(state.telemetry.heater_time_left_mins, 0);
        assert!(!state.telemetry.flags.heater_on);
        assert_eq!(state.last_message_at_ms, 0);
        assert!(!state.connected);
    }

    #[test]
    fn test_apply_frame_refreshes_health() {
        let shared = SharedState::new();
        let frame = TelemetryFrame {
            temp_deg_c: 27.5,
            ..TelemetryFrame::default()
        };

        shared.apply_frame(frame);

        let snap = shared.snapshot();
        assert_eq!(snap.telemetry, frame);
        assert!(snap.connected);
        assert!(snap.last_message_at_ms > 0);
    }

    #[test]
    fn test_mark_down_keeps_telemetry() {
        let shared = SharedState::new();
        shared.apply_frame(TelemetryFrame {
            temp_deg_c: 27.5,
            ..TelemetryFrame::default()
        });

        shared.mark_down();

        let snap = shared.snapshot();
        assert!(!snap.connected);
        assert_eq!(snap.last_message_at_ms, 0);
        assert!((snap.telemetry.temp_deg_c - 27.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let shared = SharedState::new();
        shared.apply_frame(TelemetryFrame {
            temp_deg_c: 27.5,
            ..TelemetryFrame::default()
        });

        shared.reset();

        assert_eq!(shared.snapshot(), ChamberState::default());
    }
}
