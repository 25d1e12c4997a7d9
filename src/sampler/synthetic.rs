//! Synthetic host used when no simulator is attached

use std::f32::consts::TAU;
use std::time::{Duration, Instant};

use super::Sampler;
use crate::types::Frame;

/// Simulates a car lapping a flat circular track at constant speed.
///
/// State is a function of the time elapsed since construction, so sampling is
/// a pure read. [`SyntheticHost::snapshot_at`] and [`SyntheticHost::frame_at`]
/// expose the same model for a given elapsed time.
#[derive(Debug, Clone)]
pub struct SyntheticHost {
    track_length_m: f32,
    speed_kmh: f32,
    started: Instant,
}

/// State of the synthetic car at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticSnapshot {
    pub track_progress: f32,
    pub world_location: [f32; 3],
    pub lap_time_ms: i64,
    pub lap_count: i64,
}

impl Default for SyntheticHost {
    fn default() -> Self {
        Self::new(2_000.0, 120.0)
    }
}

impl SyntheticHost {
    /// Create a host with the given lap length and constant speed.
    ///
    /// Non-positive values are clamped to 1 m and 1 km/h.
    pub fn new(track_length_m: f32, speed_kmh: f32) -> Self {
        Self {
            track_length_m: track_length_m.max(1.0),
            speed_kmh: speed_kmh.max(1.0),
            started: Instant::now(),
        }
    }

    fn speed_mps(&self) -> f32 {
        self.speed_kmh / 3.6
    }

    /// Time needed to complete one lap.
    pub fn lap_duration(&self) -> Duration {
        Duration::from_secs_f32(self.track_length_m / self.speed_mps())
    }

    /// Model state after `elapsed` of driving.
    pub fn snapshot_at(&self, elapsed: Duration) -> SyntheticSnapshot {
        let distance = self.speed_mps() * elapsed.as_secs_f32();
        let laps = (distance / self.track_length_m).floor();
        let lap_distance = distance - laps * self.track_length_m;
        let progress = (lap_distance / self.track_length_m).clamp(0.0, 1.0);

        let radius = self.track_length_m / TAU;
        let angle = progress * TAU;

        SyntheticSnapshot {
            track_progress: progress,
            // y is up in the simulator's world frame
            world_location: [radius * angle.cos(), 0.0, radius * angle.sin()],
            lap_time_ms: (lap_distance / self.speed_mps() * 1000.0) as i64,
            lap_count: laps as i64,
        }
    }

    /// Frame the car reports after `elapsed` of driving.
    pub fn frame_at(&self, elapsed: Duration) -> Frame {
        let snapshot = self.snapshot_at(elapsed);
        Frame {
            track_progress: snapshot.track_progress,
            speed_kmh: self.speed_kmh,
            world_location: snapshot.world_location,
            throttle: 0.8,
            brake: 0.0,
            // Constant left-hand curvature of the circle
            steer: 0.1,
            lap_time: snapshot.lap_time_ms,
            lap_invalid: false,
            lap_count: snapshot.lap_count,
        }
    }
}

impl Sampler for SyntheticHost {
    /// Every field comes from a single reading of the clock.
    fn sample(&self) -> Frame {
        self.frame_at(self.started.elapsed())
    }
}
