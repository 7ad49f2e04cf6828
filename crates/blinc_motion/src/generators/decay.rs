//! Decay generator
//!
//! Exponential deceleration from an initial velocity, as used for momentum
//! scrolling. The resting point is projected up front as
//! `origin + power * velocity` and can be adjusted by a target modifier
//! (snap-to-grid and the like).

use std::fmt;
use std::rc::Rc;

use crate::error::{ensure_finite, ensure_positive, Result};
use crate::generators::{Generator, GeneratorState};

/// Maps the projected resting point onto the one actually used
pub type TargetModifier = Rc<dyn Fn(f64) -> f64>;

/// Decay configuration
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecayConfig {
    /// Initial velocity in units per second
    pub velocity: f64,
    /// Scales velocity into travel distance
    pub power: f64,
    /// Exponential time constant in milliseconds
    pub time_constant: f64,
    /// Distance from the resting point at which the decay finishes
    pub rest_delta: f64,
    /// Optional resting point adjustment
    #[cfg_attr(feature = "serde", serde(skip))]
    pub modify_target: Option<TargetModifier>,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            velocity: 0.0,
            power: 0.8,
            time_constant: 350.0,
            rest_delta: 0.5,
            modify_target: None,
        }
    }
}

impl fmt::Debug for DecayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecayConfig")
            .field("velocity", &self.velocity)
            .field("power", &self.power)
            .field("time_constant", &self.time_constant)
            .field("rest_delta", &self.rest_delta)
            .field("modify_target", &self.modify_target.is_some())
            .finish()
    }
}

impl DecayConfig {
    /// Builder: set initial velocity (units per second)
    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder: set power
    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    /// Builder: set time constant (ms)
    pub fn with_time_constant(mut self, time_constant: f64) -> Self {
        self.time_constant = time_constant;
        self
    }

    /// Builder: set rest distance
    pub fn with_rest_delta(mut self, rest_delta: f64) -> Self {
        self.rest_delta = rest_delta;
        self
    }

    /// Builder: adjust the projected resting point
    pub fn with_modify_target(mut self, modify: impl Fn(f64) -> f64 + 'static) -> Self {
        self.modify_target = Some(Rc::new(modify));
        self
    }
}

/// Exponential decay toward a projected resting point
#[derive(Clone, Debug, PartialEq)]
pub struct Decay {
    origin: f64,
    target: f64,
    amplitude: f64,
    time_constant: f64,
    rest_delta: f64,
}

impl Decay {
    /// Build a decay starting at `origin`
    pub fn new(origin: f64, config: &DecayConfig) -> Result<Self> {
        let origin = ensure_finite("origin", origin)?;
        let velocity = ensure_finite("velocity", config.velocity)?;
        let power = ensure_finite("power", config.power)?;
        let time_constant = ensure_positive("time_constant", config.time_constant)?;
        let rest_delta = ensure_finite("rest_delta", config.rest_delta)?;

        let mut amplitude = power * velocity;
        let ideal = origin + amplitude;
        let target = match &config.modify_target {
            Some(modify) => ensure_finite("target", modify(ideal))?,
            None => ideal,
        };

        // Keep the trajectory passing through an adjusted target
        if target != ideal {
            amplitude = target - origin;
        }

        Ok(Self {
            origin,
            target,
            amplitude,
            time_constant,
            rest_delta,
        })
    }

    pub fn origin(&self) -> f64 {
        self.origin
    }

    /// The resting point the decay moves toward
    pub fn target(&self) -> f64 {
        self.target
    }
}

impl Generator for Decay {
    type Value = f64;

    fn next(&self, t: f64) -> GeneratorState<f64> {
        let delta = -self.amplitude * (-t / self.time_constant).exp();
        let done = !(delta > self.rest_delta || delta < -self.rest_delta);
        GeneratorState::new(if done { self.target } else { self.target + delta }, done)
    }

    /// Decay has no opposite direction to run in
    fn flip_target(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(decay: &Decay) -> Vec<f64> {
        let mut out = Vec::new();
        let mut t = 0.0;
        loop {
            let state = decay.next(t);
            out.push(state.value.round());
            if state.done {
                break;
            }
            t += 200.0;
        }
        out
    }

    fn config(velocity: f64) -> DecayConfig {
        DecayConfig::default()
            .with_velocity(velocity)
            .with_power(0.8)
            .with_time_constant(350.0)
            .with_rest_delta(0.5)
    }

    #[test]
    fn decays_toward_projected_target() {
        let decay = Decay::new(100.0, &config(100.0)).unwrap();
        assert_eq!(
            run(&decay),
            vec![100.0, 135.0, 154.0, 166.0, 172.0, 175.0, 177.0, 179.0, 179.0, 180.0]
        );
    }

    #[test]
    fn negative_velocity_mirrors_output() {
        for velocity in [100.0, 250.0, 1000.0] {
            let forward = run(&Decay::new(0.0, &config(velocity)).unwrap());
            let backward = run(&Decay::new(0.0, &config(-velocity)).unwrap());
            let negated: Vec<f64> = forward.iter().map(|v| -v).collect();
            assert_eq!(backward, negated);
        }
    }

    #[test]
    fn modify_target_adjusts_resting_point() {
        let snap = config(100.0).with_modify_target(|v| (v / 50.0).round() * 50.0);
        let decay = Decay::new(100.0, &snap).unwrap();
        assert_eq!(decay.target(), 200.0);
        assert_eq!(decay.next(0.0).value, 100.0);
        assert_eq!(*run(&decay).last().unwrap(), 200.0);
    }

    #[test]
    fn zero_velocity_is_done_immediately() {
        let decay = Decay::new(42.0, &DecayConfig::default()).unwrap();
        assert_eq!(decay.next(0.0), GeneratorState::new(42.0, true));
    }

    #[test]
    fn rejects_zero_time_constant() {
        assert!(Decay::new(0.0, &DecayConfig::default().with_time_constant(0.0)).is_err());
    }
}
