//! Streams live racing-simulator telemetry to an external reinforcement-learning process.
//!
//! The bridge samples a fixed set of vehicle, input and lap readings once per
//! host frame and writes them as one text record per frame over a single
//! persistent TCP connection. Nothing comes back over that connection; the
//! trainer only consumes records.
//!
//! # Components
//!
//! - [`Sampler`]: produces one [`Frame`] per tick from the host simulation
//! - [`StreamingClient`]: owns the connection and the training flag
//! - [`Bridge`]: host wiring with start/stop commands and a status view
//! - [`Driver`]: a tokio tick loop for running the bridge outside a host
//!
//! # Example
//!
//! ```rust,no_run
//! use acrl_bridge::{Bridge, BridgeConfig, StreamingClient, SyntheticHost};
//! use std::time::Duration;
//!
//! let config = BridgeConfig::default();
//! let client = StreamingClient::new(&config);
//! let mut bridge = Bridge::new(SyntheticHost::default(), client);
//!
//! if bridge.on_start_requested() {
//!     for _ in 0..600 {
//!         let outcome = bridge.update(Duration::from_millis(16));
//!         if outcome.is_failure() {
//!             eprintln!("{}", bridge.status().label());
//!         }
//!     }
//! }
//! bridge.shutdown();
//! ```

mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

pub mod bridge;
pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod driver;
pub mod sampler;

pub use error::*;
pub use types::*;

pub use bridge::{
    Bridge, BridgeStatus, ControlCommand, HostCommand, HostCommandSink, NoopCommandSink,
};
pub use client::{SendFailurePolicy, StreamingClient};
pub use codec::RecordTerminator;
pub use config::BridgeConfig;
pub use connection::Connection;
pub use driver::{Driver, DriverHandle};
pub use sampler::{FixedSampler, HostTelemetry, Sampler, SyntheticHost, TelemetrySampler};
