//! Value generators
//!
//! A generator turns elapsed time into a value. Generators are owned by the
//! playback orchestrator and are pure from the outside: `next(t)` can be called
//! with any `t`, in any order, and returns the value and completion flag for
//! that instant. The only mutation is `flip_target`, used for mirrored repeats.

pub mod decay;
pub mod find_spring;
pub mod keyframes;
pub mod spring;

pub use decay::{Decay, DecayConfig, TargetModifier};
pub use find_spring::{find_spring, SpringSolution};
pub use keyframes::{EasingSpec, Keyframes, KeyframesConfig};
pub use spring::{Spring, SpringConfig};

use crate::value::Animatable;
use crate::velocity::sample_velocity;

/// Output of a generator at one instant
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeneratorState<T> {
    /// Value at the sampled time
    pub value: T,
    /// Whether the generator has finished at the sampled time
    pub done: bool,
}

impl<T> GeneratorState<T> {
    pub fn new(value: T, done: bool) -> Self {
        Self { value, done }
    }

    /// Transform the value, keeping the completion flag
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> GeneratorState<U> {
        GeneratorState {
            value: f(self.value),
            done: self.done,
        }
    }
}

/// Common contract of spring, decay and keyframe generators
pub trait Generator {
    type Value;

    /// Sample the generator at `t` milliseconds
    fn next(&self, t: f64) -> GeneratorState<Self::Value>;

    /// Reverse the direction of travel for the next run
    fn flip_target(&mut self);

    /// Time at which the generator is known to finish, if fixed up front
    fn declared_duration(&self) -> Option<f64> {
        None
    }
}

/// The kind of generator an animation was requested with
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GeneratorKind {
    Spring,
    Decay,
    /// Eased interpolation through keyframes (a tween when there are two)
    #[default]
    Keyframes,
}

impl GeneratorKind {
    /// The generator actually used for a keyframe sequence of `len` values
    ///
    /// Physics generators only move between two points, so longer sequences
    /// always fall back to keyframes.
    pub fn resolve(self, len: usize) -> GeneratorKind {
        if len > 2 {
            GeneratorKind::Keyframes
        } else {
            self
        }
    }
}

/// How raw numbers from spring and decay become values of `T`
#[derive(Clone, Debug)]
pub enum ValueSpace<T> {
    /// The numbers are the values, rebuilt with [`Animatable::from_scalar`]
    Scalar { fallback: T },
    /// The generator runs over `0..=100` and its output is mixed between the
    /// real endpoints
    Remapped { origin: T, target: T },
}

impl<T: Animatable> ValueSpace<T> {
    /// Pick the space for an animation between `origin` and `target`
    ///
    /// Returns the space and the numeric endpoints the generator should use.
    pub fn resolve(origin: &T, target: &T) -> (Self, f64, f64) {
        match (origin.to_scalar(), target.to_scalar()) {
            (Some(from), Some(to)) if T::from_scalar(from).is_some() => (
                ValueSpace::Scalar {
                    fallback: origin.clone(),
                },
                from,
                to,
            ),
            _ => (
                ValueSpace::Remapped {
                    origin: origin.clone(),
                    target: target.clone(),
                },
                0.0,
                100.0,
            ),
        }
    }

    /// Whether non-numeric endpoints forced a progress range
    pub fn needs_interpolation(&self) -> bool {
        matches!(self, ValueSpace::Remapped { .. })
    }

    pub fn project(&self, raw: f64) -> T {
        match self {
            ValueSpace::Scalar { fallback } => {
                T::from_scalar(raw).unwrap_or_else(|| fallback.clone())
            }
            ValueSpace::Remapped { origin, target } => T::mix(origin, target, raw / 100.0),
        }
    }
}

/// A generator of any kind, owned by one animation
///
/// Spring and decay only operate on numbers and carry the [`ValueSpace`] that
/// maps their output back into `T`.
#[derive(Clone, Debug)]
pub enum MotionGenerator<T: Animatable> {
    Spring(Spring, ValueSpace<T>),
    Decay(Decay, ValueSpace<T>),
    Keyframes(Keyframes<T>),
}

impl<T: Animatable> MotionGenerator<T> {
    pub fn kind(&self) -> GeneratorKind {
        match self {
            MotionGenerator::Spring(..) => GeneratorKind::Spring,
            MotionGenerator::Decay(..) => GeneratorKind::Decay,
            MotionGenerator::Keyframes(_) => GeneratorKind::Keyframes,
        }
    }

    /// Velocity at `t` in units per second
    ///
    /// Measured in the generator's own numbers: real units for scalar values,
    /// progress units for remapped ones. Keyframes of non-numeric values
    /// report zero.
    pub fn velocity(&self, t: f64) -> f64 {
        match self {
            MotionGenerator::Spring(g, _) => g.velocity(t),
            MotionGenerator::Decay(g, _) => {
                sample_velocity(|s| g.next(s).value, t, g.next(t).value)
            }
            MotionGenerator::Keyframes(g) => match g.next(t).value.to_scalar() {
                Some(current) => sample_velocity(
                    |s| g.next(s).value.to_scalar().unwrap_or(current),
                    t,
                    current,
                ),
                None => 0.0,
            },
        }
    }
}

impl<T: Animatable> Generator for MotionGenerator<T> {
    type Value = T;

    fn next(&self, t: f64) -> GeneratorState<T> {
        match self {
            MotionGenerator::Spring(g, space) => g.next(t).map(|raw| space.project(raw)),
            MotionGenerator::Decay(g, space) => g.next(t).map(|raw| space.project(raw)),
            MotionGenerator::Keyframes(g) => g.next(t),
        }
    }

    fn flip_target(&mut self) {
        match self {
            MotionGenerator::Spring(g, _) => g.flip_target(),
            MotionGenerator::Decay(g, _) => g.flip_target(),
            MotionGenerator::Keyframes(g) => g.flip_target(),
        }
    }

    fn declared_duration(&self) -> Option<f64> {
        match self {
            MotionGenerator::Spring(g, _) => g.declared_duration(),
            MotionGenerator::Decay(g, _) => g.declared_duration(),
            MotionGenerator::Keyframes(g) => g.declared_duration(),
        }
    }
}
