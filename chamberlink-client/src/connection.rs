//! Connection supervision: keepalive, staleness detection, reconnection.
//!
//! One supervisor task owns the transport handle and the keepalive timer.
//! Teardown always happens before the next dial, so at most one live
//! transport and one timer exist at any instant, and the supervisor's retry
//! loop is the only place a reconnect is ever scheduled.

use crate::state::SharedState;
use crate::transport::{Dialer, Transport};
use bytes::Bytes;
use chamberlink_protocol::{TelemetryFrame, WireProfile, REV_A};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

/// Default keepalive tick interval.
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_millis(3500);

/// Default backoff between teardown and redial.
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_millis(100);

/// Default dial timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Controller endpoint, e.g. `ws://chamber.local/ws`.
    pub url: String,
    /// Wire profile of the controller firmware.
    pub profile: WireProfile,
    /// Keepalive tick interval; telemetry older than this marks the
    /// connection stale.
    pub keep_alive_interval: Duration,
    /// Telemetry older than this tears the connection down. Defaults to
    /// three keepalive intervals.
    pub dead_threshold: Duration,
    /// Fixed delay between teardown and the next dial.
    pub reconnect_backoff: Duration,
    /// How long a single dial attempt may take.
    pub connect_timeout: Duration,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            profile: REV_A,
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
            dead_threshold: DEFAULT_KEEP_ALIVE_INTERVAL * 3,
            reconnect_backoff: DEFAULT_RECONNECT_BACKOFF,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Builds a config for the conventional controller endpoint on the given
    /// host: `ws://<host>/ws`.
    pub fn for_host(host: &str) -> Self {
        Self::new(format!("ws://{}{}", host, chamberlink_protocol::ENDPOINT_PATH))
    }

    /// Sets the keepalive interval and rederives the dead threshold as three
    /// intervals.
    pub fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self.dead_threshold = interval * 3;
        self
    }

    pub fn with_dead_threshold(mut self, threshold: Duration) -> Self {
        self.dead_threshold = threshold;
        self
    }

    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_profile(mut self, profile: WireProfile) -> Self {
        self.profile = profile;
        self
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// No telemetry within the dead threshold; the keepalive tick tore the
    /// transport down.
    Dead,
    /// The controller closed the stream.
    PeerClosed,
    /// The transport faulted on read or write.
    Failed,
    /// The client was closed.
    Shutdown,
}

/// Supervisor loop: dial, run the session, back off, repeat. Runs until the
/// shutdown signal fires, then resets the shared state to defaults exactly
/// once.
pub(crate) async fn run<D: Dialer>(
    dialer: D,
    config: ClientConfig,
    state: SharedState,
    mut cmd_rx: mpsc::Receiver<Bytes>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        tracing::debug!(url = %config.url, "dialing controller");
        let conn = tokio::select! {
            res = time::timeout(config.connect_timeout, dialer.dial(&config.url)) => match res {
                Ok(Ok(conn)) => Some(conn),
                Ok(Err(e)) => {
                    tracing::warn!(url = %config.url, "dial failed: {}", e);
                    None
                }
                Err(_) => {
                    tracing::warn!(url = %config.url, "dial timed out after {:?}", config.connect_timeout);
                    None
                }
            },
            _ = shutdown.changed() => break,
        };

        match conn {
            Some(conn) => {
                tracing::info!(url = %config.url, "connected to controller");
                match run_session(conn, &config, &state, &mut cmd_rx, &mut shutdown).await {
                    SessionEnd::Shutdown => break,
                    end => tracing::debug!(?end, "session ended, scheduling reconnect"),
                }
            }
            None => state.mark_down(),
        }

        // Fixed backoff, no growth and no attempt cap: the client is meant
        // to chase the controller forever.
        tokio::select! {
            _ = time::sleep(config.reconnect_backoff) => {}
            _ = shutdown.changed() => break,
        }
    }

    state.reset();
    tracing::debug!("connection supervisor stopped");
}

/// One transport event, pulled out of the `select!` so a single transition
/// handler consumes events in arrival order with full access to the
/// transport handle.
enum SessionEvent {
    Inbound(Option<Result<Bytes, crate::transport::TransportError>>),
    Tick,
    Outbound(Option<Bytes>),
    Shutdown,
}

/// Drives one open transport until it dies, goes dead, or the client closes.
/// One frame is decoded at a time; no event is handled concurrently with
/// another.
async fn run_session<T: Transport>(
    mut conn: T,
    config: &ClientConfig,
    state: &SharedState,
    cmd_rx: &mut mpsc::Receiver<Bytes>,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd {
    state.mark_open();
    let mut last_message = Instant::now();

    let mut tick = time::interval_at(
        Instant::now() + config.keep_alive_interval,
        config.keep_alive_interval,
    );
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let event = tokio::select! {
            frame = conn.next_frame() => SessionEvent::Inbound(frame),
            _ = tick.tick() => SessionEvent::Tick,
            cmd = cmd_rx.recv() => SessionEvent::Outbound(cmd),
            _ = shutdown.changed() => SessionEvent::Shutdown,
        };

        match event {
            SessionEvent::Inbound(Some(Ok(bytes))) => {
                match TelemetryFrame::decode(&bytes, &config.profile) {
                    Ok(telemetry) => {
                        last_message = Instant::now();
                        state.apply_frame(telemetry);
                    }
                    // A single bad frame is not a dead connection: drop it
                    // and leave the health fields alone.
                    Err(e) => {
                        tracing::warn!(len = bytes.len(), "dropping malformed frame: {}", e)
                    }
                }
            }
            SessionEvent::Inbound(Some(Err(e))) => {
                tracing::warn!("transport error: {}", e);
                state.mark_down();
                conn.close().await;
                return SessionEnd::Failed;
            }
            SessionEvent::Inbound(None) => {
                tracing::info!("controller closed the connection");
                state.mark_down();
                return SessionEnd::PeerClosed;
            }

            SessionEvent::Tick => {
                let elapsed = last_message.elapsed();
                if elapsed >= config.dead_threshold {
                    tracing::warn!(
                        elapsed_ms = elapsed.as_millis() as u64,
                        "no telemetry within dead threshold, tearing down"
                    );
                    state.mark_down();
                    conn.close().await;
                    return SessionEnd::Dead;
                }
                // Freshly alive means a message within the last tick
                // interval; between one interval and the dead threshold the
                // connection rides out a grace period marked stale.
                let fresh = elapsed < config.keep_alive_interval;
                if !fresh {
                    tracing::debug!(
                        elapsed_ms = elapsed.as_millis() as u64,
                        "telemetry stale, riding out grace period"
                    );
                }
                state.set_connected(fresh);
            }

            SessionEvent::Outbound(Some(frame)) => {
                if let Err(e) = conn.send_frame(frame).await {
                    tracing::warn!("command send failed: {}", e);
                    state.mark_down();
                    conn.close().await;
                    return SessionEnd::Failed;
                }
            }
            // All command senders dropped: the client itself is gone.
            SessionEvent::Outbound(None) => {
                conn.close().await;
                return SessionEnd::Shutdown;
            }

            SessionEvent::Shutdown => {
                conn.close().await;
                return SessionEnd::Shutdown;
            }
        }
    }
}
