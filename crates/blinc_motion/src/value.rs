//! Animatable values
//!
//! The engine is generic over the value being animated. Plain numbers take a
//! fast path through the physics generators; anything else only needs to be
//! able to blend between two instances.

/// A value the engine can move between keyframes
///
/// `mix` is the only required capability. Types that are plain numbers also
/// implement `to_scalar`/`from_scalar`, which lets spring and decay drive them
/// directly instead of through a `0..100` progress range.
pub trait Animatable: Clone + 'static {
    /// Blend `from` toward `to`. `progress` is not clamped and may overshoot.
    fn mix(from: &Self, to: &Self, progress: f64) -> Self;

    /// Numeric view of the value, if the type has one
    fn to_scalar(&self) -> Option<f64> {
        None
    }

    /// Rebuild a value from a number produced by a physics generator
    fn from_scalar(_value: f64) -> Option<Self> {
        None
    }
}

/// Linear interpolation between two numbers
#[inline]
pub fn mix(from: f64, to: f64, progress: f64) -> f64 {
    -progress * from + progress * to + from
}

/// Where `value` sits between `from` and `to`, as a fraction
///
/// A zero-width range reports full progress.
#[inline]
pub fn progress(from: f64, to: f64, value: f64) -> f64 {
    let range = to - from;
    if range == 0.0 {
        1.0
    } else {
        (value - from) / range
    }
}

impl Animatable for f64 {
    fn mix(from: &Self, to: &Self, progress: f64) -> Self {
        mix(*from, *to, progress)
    }

    fn to_scalar(&self) -> Option<f64> {
        Some(*self)
    }

    fn from_scalar(value: f64) -> Option<Self> {
        Some(value)
    }
}

impl Animatable for f32 {
    fn mix(from: &Self, to: &Self, progress: f64) -> Self {
        mix(*from as f64, *to as f64, progress) as f32
    }

    fn to_scalar(&self) -> Option<f64> {
        Some(*self as f64)
    }

    fn from_scalar(value: f64) -> Option<Self> {
        Some(value as f32)
    }
}

/// Component-wise blend for fixed-size vectors (points, colors, transforms)
impl<const N: usize> Animatable for [f64; N] {
    fn mix(from: &Self, to: &Self, progress: f64) -> Self {
        let mut out = [0.0; N];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = mix(from[i], to[i], progress);
        }
        out
    }
}
