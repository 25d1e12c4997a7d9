//! Core types shared by the sampler, the codec and the streaming client.
//!
//! - [`Frame`] is the per-tick telemetry snapshot that flows through the bridge
//! - [`ClientState`] names the streaming client's lifecycle states
//! - [`TickOutcome`] reports what a single tick did, without raising
//! - [`ClientStats`] accumulates send/connect counters
//!
//! ## Usage Example
//!
//! ```rust
//! use acrl_bridge::types::{Frame, TickOutcome};
//!
//! let frame = Frame { speed_kmh: 142.5, lap_time: 61_250, ..Frame::default() };
//! assert!(!frame.lap_invalid);
//! assert!(!TickOutcome::Skipped.is_failure());
//! ```

mod frame;
mod state;

pub use frame::Frame;
pub use state::{ClientState, ClientStats, TickOutcome};
