//! Telemetry frame captured once per host tick

use serde::{Deserialize, Serialize};

/// One tick's snapshot of the vehicle, input and lap state.
///
/// A frame has no identity beyond its position in the outbound stream. It is
/// captured by a [`Sampler`](crate::Sampler), encoded once and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    /// Normalized position along the track spline (0.0 = start line, 1.0 = finish)
    pub track_progress: f32,

    /// Vehicle speed in km/h
    pub speed_kmh: f32,

    /// World position of the car as `[x, y, z]`
    pub world_location: [f32; 3],

    /// Gas pedal input as reported by the host
    pub throttle: f32,

    /// Brake pedal input as reported by the host
    pub brake: f32,

    /// Steering input as reported by the host
    pub steer: f32,

    /// Current lap time in milliseconds
    pub lap_time: i64,

    /// Whether the current lap has been invalidated
    pub lap_invalid: bool,

    /// Completed lap count
    pub lap_count: i64,
}
