//! Client lifecycle states and per-tick outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a [`StreamingClient`](crate::StreamingClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientState {
    /// Never connected and not training
    Idle,

    /// Socket open, training flag clear
    Connected,

    /// Socket open and frames are being streamed
    Training,

    /// Socket lost after having been connected
    Disconnected,

    /// Terminal: flag cleared and connection closed for good
    Shutdown,
}

impl ClientState {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientState::Idle => "idle",
            ClientState::Connected => "connected",
            ClientState::Training => "training",
            ClientState::Disconnected => "disconnected",
            ClientState::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened during one call to [`StreamingClient::tick`](crate::StreamingClient::tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// Training flag was clear; nothing was sampled or written
    Skipped,

    /// One record was written to the socket
    Sent { bytes: usize },

    /// The socket was down and the reconnect attempt failed; training was stopped
    ConnectFailed,

    /// The write failed; `stopped` reports whether the failure policy stopped training
    SendFailed { stopped: bool },
}

impl TickOutcome {
    /// Whether the tick should be surfaced to the operator as a failure.
    pub fn is_failure(self) -> bool {
        matches!(self, TickOutcome::ConnectFailed | TickOutcome::SendFailed { .. })
    }

    /// Whether a record reached the socket.
    pub fn wrote_frame(self) -> bool {
        matches!(self, TickOutcome::Sent { .. })
    }
}

/// Running counters kept by the streaming client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientStats {
    pub frames_sent: u64,
    pub bytes_sent: u64,
    pub connections_opened: u64,
    pub connect_failures: u64,
    pub send_failures: u64,
}
