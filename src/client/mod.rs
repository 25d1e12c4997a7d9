//! Streaming client: the connection plus the training-flag state machine
//!
//! ```text
//!            connect() ok             start() ok
//!   Idle ──────────────────▶ Connected ─────────────▶ Training
//!    ▲                          ▲   ◀───────────────     │
//!    │ connect() failed         │        stop()          │ peer closed /
//!    │                          │                        │ send failed
//!    │                      Disconnected ◀───────────────┘
//!    │
//!    └── any state ── shutdown() ──▶ Shutdown (terminal)
//! ```
//!
//! The client is driven from a single host thread. Nothing here blocks except
//! the handshake, which is bounded by the configured connect timeout. Socket
//! errors are logged and reported through [`TickOutcome`]; they never escape.

use tracing::{debug, error, info, trace, warn};

use crate::codec::{self, RecordTerminator};
use crate::config::BridgeConfig;
use crate::connection::Connection;
use crate::types::{ClientState, ClientStats, Frame, TickOutcome};

#[cfg(test)]
mod tests;

/// Tracks consecutive send failures and decides when to stop training.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendFailurePolicy {
    limit: u32,
    consecutive: u32,
}

impl SendFailurePolicy {
    /// `limit` consecutive failures stop training; a limit of 0 is treated as 1.
    pub fn new(limit: u32) -> Self {
        Self { limit: limit.max(1), consecutive: 0 }
    }

    /// Record a failed send. Returns `true` when training should stop.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive = self.consecutive.saturating_add(1);
        self.consecutive >= self.limit
    }

    /// Clear the failure streak after a successful write or a fresh start.
    pub fn reset(&mut self) {
        self.consecutive = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// Owns the trainer connection and the training flag.
#[derive(Debug)]
pub struct StreamingClient {
    connection: Connection,
    training: bool,
    shut_down: bool,
    ever_connected: bool,
    terminator: RecordTerminator,
    send_failures: SendFailurePolicy,
    stats: ClientStats,
    record: String,
}

impl StreamingClient {
    /// Create an idle client. No connection is attempted.
    pub fn new(config: &BridgeConfig) -> Self {
        Self::with_connection(
            Connection::from_config(config),
            config.record_terminator,
            config.max_consecutive_send_failures,
        )
    }

    /// Create an idle client around an existing connection endpoint.
    pub fn with_connection(
        connection: Connection,
        terminator: RecordTerminator,
        max_consecutive_send_failures: u32,
    ) -> Self {
        Self {
            connection,
            training: false,
            shut_down: false,
            ever_connected: false,
            terminator,
            send_failures: SendFailurePolicy::new(max_consecutive_send_failures),
            stats: ClientStats::default(),
            record: String::with_capacity(256),
        }
    }

    /// Attempt a single blocking handshake with the trainer.
    ///
    /// Returns `true` immediately if a live socket is already held. Always
    /// `false` after [`shutdown`](Self::shutdown).
    pub fn connect(&mut self) -> bool {
        if self.shut_down {
            warn!("Ignoring connect request after shutdown");
            return false;
        }

        if self.connection.is_alive() {
            trace!("Already connected to {}", self.connection.endpoint());
            return true;
        }

        match self.connection.open() {
            Ok(()) => {
                self.ever_connected = true;
                self.stats.connections_opened += 1;
                info!("Socket connection to {} successful", self.connection.endpoint());
                true
            }
            Err(e) => {
                self.stats.connect_failures += 1;
                warn!("Socket could not connect to host: {}", e);
                false
            }
        }
    }

    /// Connect if needed and raise the training flag.
    ///
    /// On connect failure the client is stopped and `false` is returned.
    pub fn start(&mut self) -> bool {
        if self.shut_down {
            warn!("Ignoring start request after shutdown");
            return false;
        }

        if !self.connect() {
            warn!("Didn't start streaming, could not connect to {}", self.connection.endpoint());
            self.stop();
            return false;
        }

        info!("Starting telemetry stream to {}", self.connection.endpoint());
        self.send_failures.reset();
        self.training = true;
        true
    }

    /// Clear the training flag. The connection stays open.
    pub fn stop(&mut self) {
        if self.training {
            info!("Stopping telemetry stream");
        } else {
            debug!("Stop requested while not training");
        }
        self.training = false;
    }

    /// Stream one frame if training.
    ///
    /// A lost connection triggers exactly one reconnect attempt; if that fails
    /// training is stopped. A failed write drops the socket so the next tick
    /// reconnects, and stops training once the consecutive-failure limit is hit.
    pub fn tick(&mut self, frame: &Frame) -> TickOutcome {
        if !self.training {
            return TickOutcome::Skipped;
        }

        if !self.connection.is_alive() {
            debug!("Connection to {} lost, reconnecting", self.connection.endpoint());
            if !self.connect() {
                warn!("Socket could not connect to host during tick, stopping training");
                self.stop();
                return TickOutcome::ConnectFailed;
            }
        }

        self.record.clear();
        codec::encode_into(frame, self.terminator, &mut self.record);

        match self.connection.send(self.record.as_bytes()) {
            Ok(bytes) => {
                self.send_failures.reset();
                self.stats.frames_sent += 1;
                self.stats.bytes_sent += bytes as u64;
                trace!("Sent frame {} ({} bytes)", self.stats.frames_sent, bytes);
                TickOutcome::Sent { bytes }
            }
            Err(e) => {
                self.stats.send_failures += 1;
                let stop = self.send_failures.record_failure();
                warn!(
                    "Could not send frame ({}/{}): {}",
                    self.send_failures.consecutive_failures(),
                    self.send_failures.limit(),
                    e
                );

                if stop {
                    error!("Too many consecutive send failures, stopping training");
                    self.stop();
                }
                TickOutcome::SendFailed { stopped: stop }
            }
        }
    }

    /// Clear the training flag and close the connection for good.
    pub fn shutdown(&mut self) {
        self.training = false;
        self.connection.close();
        if !self.shut_down {
            info!(
                "Shutting down after {} frames ({} bytes)",
                self.stats.frames_sent, self.stats.bytes_sent
            );
        }
        self.shut_down = true;
    }

    /// Current training flag.
    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Whether a socket is currently held (not probed).
    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    pub fn state(&self) -> ClientState {
        if self.shut_down {
            ClientState::Shutdown
        } else if self.connection.is_open() {
            if self.training { ClientState::Training } else { ClientState::Connected }
        } else if self.ever_connected {
            ClientState::Disconnected
        } else {
            ClientState::Idle
        }
    }

    pub fn stats(&self) -> ClientStats {
        self.stats
    }

    pub fn endpoint(&self) -> &str {
        self.connection.endpoint()
    }
}

impl Drop for StreamingClient {
    fn drop(&mut self) {
        if !self.shut_down {
            debug!("Dropping streaming client without explicit shutdown");
            self.connection.close();
        }
    }
}
