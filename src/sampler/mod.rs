//! Telemetry sampling from the host simulation
//!
//! A [`Sampler`] produces one [`Frame`] per call. Sampling is a pure read: it
//! must not block and has no error path. The host's reading API is split the
//! same way the simulator exposes it (car, input and lap info) behind
//! [`HostTelemetry`]; [`TelemetrySampler`] composes those readings into a frame.
//! [`SyntheticHost`] samples its own model directly, so all fields of one
//! frame describe the same instant.

mod synthetic;

pub use synthetic::{SyntheticHost, SyntheticSnapshot};

use crate::types::Frame;

/// Source of one telemetry frame per tick.
pub trait Sampler {
    /// Capture the current host state.
    fn sample(&self) -> Frame;
}

impl<S: Sampler + ?Sized> Sampler for Box<S> {
    fn sample(&self) -> Frame {
        (**self).sample()
    }
}

/// Per-reading queries against the host simulation.
///
/// Each query is assumed O(1) and non-blocking.
pub trait HostTelemetry {
    /// Normalized spline position of the car (0.0..=1.0)
    fn track_progress(&self) -> f32;

    /// Car speed in km/h
    fn speed_kmh(&self) -> f32;

    /// Car world position as `[x, y, z]`
    fn world_location(&self) -> [f32; 3];

    fn gas_input(&self) -> f32;

    fn brake_input(&self) -> f32;

    fn steer_input(&self) -> f32;

    /// Current lap time in milliseconds
    fn current_lap_time(&self) -> i64;

    fn lap_invalid(&self) -> bool;

    fn lap_count(&self) -> i64;
}

/// Builds frames by querying a [`HostTelemetry`] implementation.
#[derive(Debug, Clone)]
pub struct TelemetrySampler<H> {
    host: H,
}

impl<H: HostTelemetry> TelemetrySampler<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

impl<H: HostTelemetry> Sampler for TelemetrySampler<H> {
    fn sample(&self) -> Frame {
        Frame {
            track_progress: self.host.track_progress(),
            speed_kmh: self.host.speed_kmh(),
            world_location: self.host.world_location(),
            throttle: self.host.gas_input(),
            brake: self.host.brake_input(),
            steer: self.host.steer_input(),
            lap_time: self.host.current_lap_time(),
            lap_invalid: self.host.lap_invalid(),
            lap_count: self.host.lap_count(),
        }
    }
}

/// Sampler that always returns the same frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedSampler {
    frame: Frame,
}

impl FixedSampler {
    pub fn new(frame: Frame) -> Self {
        Self { frame }
    }
}

impl Sampler for FixedSampler {
    fn sample(&self) -> Frame {
        self.frame
    }
}
