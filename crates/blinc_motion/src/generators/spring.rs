//! Spring generator
//!
//! Closed-form damped harmonic oscillator. Position is evaluated analytically
//! for any `t`, so sampling is exact regardless of frame rate.
//!
//! A spring is configured either with physical constants (`stiffness`,
//! `damping`, `mass`) or perceptually with `duration` and `bounce`. If any
//! physical constant is set the perceptual keys are ignored.
//!
//! Time inside the generator is in milliseconds, so angular frequencies are
//! per millisecond. Velocities in the configuration are in units per second.

use tracing::debug;

use crate::error::{ensure_duration, ensure_finite, ensure_positive, MotionError, Result};
use crate::generators::find_spring::{find_spring, SpringSolution};
use crate::generators::{Generator, GeneratorState};
use crate::velocity::sample_velocity;

/// Default physical constants
pub const DEFAULT_STIFFNESS: f64 = 100.0;
pub const DEFAULT_DAMPING: f64 = 10.0;
pub const DEFAULT_MASS: f64 = 1.0;

/// Overdamped hyperbolic arguments are capped here to stay finite
const MAX_HYPERBOLIC_ARGUMENT: f64 = 300.0;

/// Below this total displacement the tighter rest thresholds apply
const GRANULAR_SCALE: f64 = 5.0;

/// Spring configuration
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpringConfig {
    /// Spring stiffness (higher = faster)
    pub stiffness: Option<f64>,
    /// Damping coefficient (higher = less oscillation)
    pub damping: Option<f64>,
    /// Mass of the animated object
    pub mass: Option<f64>,
    /// Perceptual duration in milliseconds
    pub duration: Option<f64>,
    /// Perceptual bounciness, 0 (none) to 1 (very bouncy)
    pub bounce: Option<f64>,
    /// Initial velocity in units per second
    pub velocity: f64,
    /// Speed below which the spring may come to rest, units per second
    pub rest_speed: Option<f64>,
    /// Distance from target below which the spring may come to rest
    pub rest_delta: Option<f64>,
    /// Finish at exactly `duration` instead of on physical rest
    pub resolved_from_duration: bool,
}

impl SpringConfig {
    /// Create a spring config from physical constants
    pub fn new(stiffness: f64, damping: f64, mass: f64) -> Self {
        Self {
            stiffness: Some(stiffness),
            damping: Some(damping),
            mass: Some(mass),
            ..Default::default()
        }
    }

    /// Create a spring config from perceptual duration (ms) and bounce
    pub fn perceptual(duration: f64, bounce: f64) -> Self {
        Self {
            duration: Some(duration),
            bounce: Some(bounce),
            ..Default::default()
        }
    }

    /// Physical constants solved by [`find_spring`], finishing at its duration
    pub fn from_solution(solution: &SpringSolution) -> Self {
        Self {
            stiffness: Some(solution.stiffness),
            damping: Some(solution.damping),
            mass: Some(solution.mass),
            duration: Some(solution.duration),
            resolved_from_duration: true,
            ..Default::default()
        }
    }

    /// A gentle, slow spring
    pub fn gentle() -> Self {
        Self::new(120.0, 14.0, 1.0)
    }

    /// A wobbly, bouncy spring
    pub fn wobbly() -> Self {
        Self::new(180.0, 12.0, 1.0)
    }

    /// A stiff, quick spring
    pub fn stiff() -> Self {
        Self::new(210.0, 20.0, 1.0)
    }

    /// A slow, heavily damped spring
    pub fn slow() -> Self {
        Self::new(280.0, 60.0, 1.0)
    }

    /// A very slow, overdamped spring
    pub fn molasses() -> Self {
        Self::new(280.0, 120.0, 1.0)
    }

    /// Builder: set stiffness
    pub fn with_stiffness(mut self, stiffness: f64) -> Self {
        self.stiffness = Some(stiffness);
        self
    }

    /// Builder: set damping
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = Some(damping);
        self
    }

    /// Builder: set mass
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Builder: set perceptual duration (ms)
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Builder: set perceptual bounce
    pub fn with_bounce(mut self, bounce: f64) -> Self {
        self.bounce = Some(bounce);
        self
    }

    /// Builder: set initial velocity (units per second)
    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder: set rest speed threshold
    pub fn with_rest_speed(mut self, rest_speed: f64) -> Self {
        self.rest_speed = Some(rest_speed);
        self
    }

    /// Builder: set rest distance threshold
    pub fn with_rest_delta(mut self, rest_delta: f64) -> Self {
        self.rest_delta = Some(rest_delta);
        self
    }

    /// Whether any physical constant was given
    pub fn has_physics(&self) -> bool {
        self.stiffness.is_some() || self.damping.is_some() || self.mass.is_some()
    }

    /// Whether duration or bounce was given
    pub fn has_perceptual(&self) -> bool {
        self.duration.is_some() || self.bounce.is_some()
    }
}

/// Precomputed constants for one damping regime
#[derive(Clone, Copy, Debug, PartialEq)]
enum Regime {
    /// ζ < 1, oscillates inside an exponential envelope
    Underdamped { angular_freq: f64 },
    /// ζ = 1, fastest return without oscillation
    Critical,
    /// ζ > 1, slow return without oscillation
    Overdamped { damped_angular_freq: f64 },
}

impl Regime {
    fn new(damping_ratio: f64, undamped_angular_freq: f64) -> Self {
        if damping_ratio < 1.0 {
            Regime::Underdamped {
                angular_freq: undamped_angular_freq * (1.0 - damping_ratio * damping_ratio).sqrt(),
            }
        } else if damping_ratio == 1.0 {
            Regime::Critical
        } else {
            Regime::Overdamped {
                damped_angular_freq: undamped_angular_freq
                    * (damping_ratio * damping_ratio - 1.0).sqrt(),
            }
        }
    }
}

/// Closed-form spring between two numbers
#[derive(Clone, Debug, PartialEq)]
pub struct Spring {
    origin: f64,
    target: f64,
    /// Units per millisecond, positive when moving away from the target
    initial_velocity: f64,
    damping_ratio: f64,
    /// Per millisecond
    undamped_angular_freq: f64,
    rest_speed: f64,
    rest_delta: f64,
    /// Set when the spring must finish at exactly this time
    duration: Option<f64>,
    regime: Regime,
}

impl Spring {
    /// Build a spring moving from `origin` to `target`
    pub fn new(origin: f64, target: f64, config: &SpringConfig) -> Result<Self> {
        let origin = ensure_finite("origin", origin)?;
        let target = ensure_finite("target", target)?;
        let velocity = ensure_finite("velocity", config.velocity)?;

        if !config.has_physics() && config.has_perceptual() {
            let solution = find_spring(origin, target, config);
            debug!(
                duration = solution.duration,
                stiffness = solution.stiffness,
                damping = solution.damping,
                iterations = solution.iterations,
                "resolved spring from duration"
            );
            return Ok(Self::build(
                origin,
                target,
                Physics {
                    stiffness: solution.stiffness,
                    damping: solution.damping,
                    mass: solution.mass,
                    velocity,
                },
                config.rest_speed,
                config.rest_delta,
                Some(solution.duration),
            ));
        }

        let physics = Physics {
            stiffness: ensure_positive("stiffness", config.stiffness.unwrap_or(DEFAULT_STIFFNESS))?,
            damping: ensure_finite("damping", config.damping.unwrap_or(DEFAULT_DAMPING))?.max(0.0),
            mass: ensure_positive("mass", config.mass.unwrap_or(DEFAULT_MASS))?,
            velocity,
        };
        let duration = match (config.resolved_from_duration, config.duration) {
            (true, Some(duration)) => Some(ensure_duration(duration)?),
            _ => None,
        };

        Ok(Self::build(
            origin,
            target,
            physics,
            config.rest_speed,
            config.rest_delta,
            duration,
        ))
    }

    /// Build a spring from the first and last of `keyframes`
    pub fn from_keyframes(keyframes: &[f64], config: &SpringConfig) -> Result<Self> {
        match (keyframes.first(), keyframes.last()) {
            (Some(origin), Some(target)) => Self::new(*origin, *target, config),
            _ => Err(MotionError::EmptyKeyframes),
        }
    }

    /// Assemble from validated constants
    pub(crate) fn build(
        origin: f64,
        target: f64,
        physics: Physics,
        rest_speed: Option<f64>,
        rest_delta: Option<f64>,
        duration: Option<f64>,
    ) -> Self {
        let Physics {
            stiffness,
            damping,
            mass,
            velocity,
        } = physics;

        let damping_ratio = damping / (2.0 * (stiffness * mass).sqrt());
        let undamped_angular_freq = (stiffness / mass).sqrt() / 1000.0;

        let is_granular = (target - origin).abs() < GRANULAR_SCALE;
        let rest_speed = rest_speed.unwrap_or(if is_granular { 0.01 } else { 2.0 });
        let rest_delta = rest_delta.unwrap_or(if is_granular { 0.005 } else { 0.5 });

        Self {
            origin,
            target,
            initial_velocity: if velocity != 0.0 { -(velocity / 1000.0) } else { 0.0 },
            damping_ratio,
            undamped_angular_freq,
            rest_speed,
            rest_delta,
            duration,
            regime: Regime::new(damping_ratio, undamped_angular_freq),
        }
    }

    pub fn origin(&self) -> f64 {
        self.origin
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Damping ratio ζ
    pub fn damping_ratio(&self) -> f64 {
        self.damping_ratio
    }

    /// Whether completion is time-based rather than physical rest
    pub fn is_resolved_from_duration(&self) -> bool {
        self.duration.is_some()
    }

    /// Raw position at `t` milliseconds
    pub fn position(&self, t: f64) -> f64 {
        let initial_delta = self.target - self.origin;
        let v0 = self.initial_velocity;
        let w0 = self.undamped_angular_freq;
        let zeta = self.damping_ratio;

        match self.regime {
            Regime::Underdamped { angular_freq } => {
                let envelope = (-zeta * w0 * t).exp();
                self.target
                    - envelope
                        * (((v0 + zeta * w0 * initial_delta) / angular_freq)
                            * (angular_freq * t).sin()
                            + initial_delta * (angular_freq * t).cos())
            }
            Regime::Critical => {
                self.target - (-w0 * t).exp() * (initial_delta + (v0 + w0 * initial_delta) * t)
            }
            Regime::Overdamped {
                damped_angular_freq,
            } => {
                let envelope = (-zeta * w0 * t).exp();
                let freq_for_t = (damped_angular_freq * t).min(MAX_HYPERBOLIC_ARGUMENT);
                self.target
                    - (envelope
                        * ((v0 + zeta * w0 * initial_delta) * freq_for_t.sinh()
                            + damped_angular_freq * initial_delta * freq_for_t.cosh()))
                        / damped_angular_freq
            }
        }
    }

    /// Velocity at `t` in units per second
    pub fn velocity(&self, t: f64) -> f64 {
        if t == 0.0 {
            -self.initial_velocity * 1000.0
        } else {
            sample_velocity(|s| self.position(s), t, self.position(t))
        }
    }

    /// Whether the remaining oscillation fits inside the rest thresholds
    ///
    /// An underdamped spring meets both thresholds at every turning point
    /// once its swing is small, then speeds up again through the target.
    /// Rest starts only when the decaying envelope bounds both displacement
    /// and speed, which keeps `done` from flickering.
    fn swing_is_at_rest(&self, t: f64) -> bool {
        let Regime::Underdamped { angular_freq } = self.regime else {
            return true;
        };
        let initial_delta = self.target - self.origin;
        let decay_rate = self.damping_ratio * self.undamped_angular_freq;
        let swing = initial_delta
            .hypot((self.initial_velocity + decay_rate * initial_delta) / angular_freq);
        let amplitude = swing * (-decay_rate * t).exp();

        amplitude <= self.rest_delta
            && amplitude * self.undamped_angular_freq * 1000.0 <= self.rest_speed
    }
}

/// Validated physical constants
#[derive(Clone, Copy, Debug)]
pub(crate) struct Physics {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
    /// Units per second
    pub velocity: f64,
}

impl Generator for Spring {
    type Value = f64;

    fn next(&self, t: f64) -> GeneratorState<f64> {
        let current = self.position(t);

        let done = match self.duration {
            Some(duration) => t >= duration,
            None => {
                let velocity = if t == 0.0 {
                    -self.initial_velocity * 1000.0
                } else {
                    sample_velocity(|s| self.position(s), t, current)
                };
                velocity.abs() <= self.rest_speed
                    && (self.target - current).abs() <= self.rest_delta
                    && self.swing_is_at_rest(t)
            }
        };

        GeneratorState::new(if done { self.target } else { current }, done)
    }

    /// Swap origin and target and reverse the initial velocity
    fn flip_target(&mut self) {
        self.initial_velocity = -self.initial_velocity;
        std::mem::swap(&mut self.origin, &mut self.target);
        self.regime = Regime::new(self.damping_ratio, self.undamped_angular_freq);
    }

    fn declared_duration(&self) -> Option<f64> {
        self.duration
    }
}
