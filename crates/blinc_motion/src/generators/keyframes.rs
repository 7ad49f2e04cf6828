//! Keyframe (tween) generator
//!
//! Interpolates through a sequence of values over a fixed duration. Each
//! transition between two neighbouring keyframes has its own easing and is
//! placed in time by an offset in `0.0..=1.0`.

use smallvec::SmallVec;

use crate::easing::Easing;
use crate::error::{ensure_duration, MotionError, Result};
use crate::generators::{Generator, GeneratorState};
use crate::value::{progress, Animatable};

/// Default tween duration in milliseconds
pub const DEFAULT_DURATION_MS: f64 = 300.0;

/// Easing for keyframe transitions
#[derive(Clone, Debug)]
pub enum EasingSpec {
    /// Same curve for every transition
    Single(Easing),
    /// One curve per transition (`keyframes - 1` entries)
    PerSegment(Vec<Easing>),
}

impl Default for EasingSpec {
    fn default() -> Self {
        EasingSpec::Single(Easing::KEYFRAME_DEFAULT)
    }
}

impl From<Easing> for EasingSpec {
    fn from(easing: Easing) -> Self {
        EasingSpec::Single(easing)
    }
}

impl From<Vec<Easing>> for EasingSpec {
    fn from(easings: Vec<Easing>) -> Self {
        EasingSpec::PerSegment(easings)
    }
}

/// Configuration for a keyframe generator
#[derive(Clone, Debug)]
pub struct KeyframesConfig {
    /// Total duration in milliseconds
    pub duration: f64,
    /// Easing per transition
    pub ease: EasingSpec,
    /// Offset of each keyframe as a fraction of `duration`; even spacing when `None`
    pub times: Option<Vec<f64>>,
}

impl Default for KeyframesConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_MS,
            ease: EasingSpec::default(),
            times: None,
        }
    }
}

impl KeyframesConfig {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            ..Default::default()
        }
    }

    /// Builder: set easing
    pub fn with_ease(mut self, ease: impl Into<EasingSpec>) -> Self {
        self.ease = ease.into();
        self
    }

    /// Builder: set keyframe offsets
    pub fn with_times(mut self, times: Vec<f64>) -> Self {
        self.times = Some(times);
        self
    }
}

/// Eased interpolation through keyframes
#[derive(Clone, Debug)]
pub struct Keyframes<T: Animatable> {
    values: SmallVec<[T; 2]>,
    /// Absolute time of each keyframe in milliseconds
    times: SmallVec<[f64; 2]>,
    /// Easing for each transition
    easings: SmallVec<[Easing; 1]>,
    duration: f64,
}

impl<T: Animatable> Keyframes<T> {
    /// Build a keyframe generator
    ///
    /// Fails on an empty sequence, on easing or offset lists that don't match
    /// the number of keyframes, and on invalid durations.
    pub fn new(values: impl IntoIterator<Item = T>, config: &KeyframesConfig) -> Result<Self> {
        let values: SmallVec<[T; 2]> = values.into_iter().collect();
        if values.is_empty() {
            return Err(MotionError::EmptyKeyframes);
        }
        let duration = ensure_duration(config.duration)?;
        let segments = values.len().saturating_sub(1);

        let easings: SmallVec<[Easing; 1]> = match &config.ease {
            EasingSpec::Single(easing) => std::iter::repeat(*easing).take(segments).collect(),
            EasingSpec::PerSegment(list) => {
                if list.len() != segments {
                    return Err(MotionError::EasingCountMismatch {
                        expected: segments,
                        found: list.len(),
                    });
                }
                list.iter().copied().collect()
            }
        };

        let times = match &config.times {
            Some(offsets) => {
                if offsets.len() != values.len() {
                    return Err(MotionError::TimesCountMismatch {
                        expected: values.len(),
                        found: offsets.len(),
                    });
                }
                let in_range = offsets.iter().all(|o| (0.0..=1.0).contains(o));
                let ordered = offsets.windows(2).all(|w| w[0] <= w[1]);
                if !in_range || !ordered {
                    return Err(MotionError::InvalidTimes);
                }
                offsets.iter().map(|o| o * duration).collect()
            }
            None => even_offsets(values.len())
                .map(|o| o * duration)
                .collect(),
        };

        Ok(Self {
            values,
            times,
            easings,
            duration,
        })
    }

    /// The keyframe values in their current order
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Interpolated value at `t`, clamped to the first and last keyframe
    fn interpolate(&self, t: f64) -> T {
        let last = self.values.len() - 1;
        // End first, so a zero-length tween lands on its final keyframe
        if t >= self.times[last] {
            return self.values[last].clone();
        }
        if t <= self.times[0] {
            return self.values[0].clone();
        }

        // Find the transition containing t
        let mut next = 1;
        while next < last && t >= self.times[next] {
            next += 1;
        }
        let prev = next - 1;

        let local = progress(self.times[prev], self.times[next], t).clamp(0.0, 1.0);
        let eased = self.easings[prev].apply(local);

        T::mix(&self.values[prev], &self.values[next], eased)
    }
}

impl<T: Animatable> Generator for Keyframes<T> {
    type Value = T;

    fn next(&self, t: f64) -> GeneratorState<T> {
        GeneratorState::new(self.interpolate(t), t >= self.duration)
    }

    /// Reverses the keyframe values; times and easings keep their slots
    fn flip_target(&mut self) {
        self.values.reverse();
    }

    fn declared_duration(&self) -> Option<f64> {
        Some(self.duration)
    }
}

/// Evenly spaced offsets for `count` keyframes
fn even_offsets(count: usize) -> impl Iterator<Item = f64> {
    (0..count).map(move |i| {
        if i == 0 {
            0.0
        } else {
            i as f64 / (count - 1) as f64
        }
    })
}
