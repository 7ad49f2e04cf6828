//! Velocity estimation
//!
//! Generators work in milliseconds. Velocities cross the public API in units
//! per second.

/// Window, in milliseconds, used when estimating velocity from samples
pub const VELOCITY_SAMPLE_MS: f64 = 5.0;

/// Convert a change in value over `frame_duration` milliseconds into units per second
///
/// A zero-length frame yields zero velocity.
#[inline]
pub fn velocity_per_second(delta: f64, frame_duration: f64) -> f64 {
    if frame_duration != 0.0 {
        delta * (1000.0 / frame_duration)
    } else {
        0.0
    }
}

/// Estimate the velocity of a position function at `t`
///
/// `current` is the already-computed value at `t`; the function is sampled
/// once more at `t - VELOCITY_SAMPLE_MS` (clamped to zero).
pub fn sample_velocity(resolve: impl Fn(f64) -> f64, t: f64, current: f64) -> f64 {
    let prev_t = (t - VELOCITY_SAMPLE_MS).max(0.0);
    velocity_per_second(current - resolve(prev_t), t - prev_t)
}
