//! Momentum with boundaries
//!
//! [`inertia`] releases a value with a velocity. It decelerates with a decay
//! and, when `min`/`max` bounds are given, bounces back into range with a
//! spring:
//!
//! - starting out of bounds springs straight to the nearest boundary
//! - a decay projected to land out of bounds is watched every frame, and the
//!   first time it crosses the boundary it hands its position and velocity to
//!   a spring that settles on the boundary

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::animate::{animate, Animation, AnimationOptions, EventCallback, UpdateCallback};
use crate::driver::{Driver, FrameScheduler};
use crate::error::{ensure_finite, Result};
use crate::generators::decay::TargetModifier;
use crate::generators::{Decay, DecayConfig, GeneratorKind, SpringConfig};

/// Configuration for [`inertia`]
pub struct InertiaOptions {
    pub from: f64,
    /// Release velocity in units per second
    pub velocity: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Scales velocity into travel distance
    pub power: f64,
    /// Decay time constant in milliseconds
    pub time_constant: f64,
    /// Stiffness of the spring used at the boundaries
    pub bounce_stiffness: f64,
    /// Damping of the spring used at the boundaries
    pub bounce_damping: f64,
    pub rest_delta: f64,
    pub rest_speed: Option<f64>,
    pub modify_target: Option<TargetModifier>,
    driver: Option<Rc<dyn Driver>>,
    on_update: Option<UpdateCallback<f64>>,
    on_complete: Option<EventCallback>,
    on_stop: Option<EventCallback>,
}

impl InertiaOptions {
    pub fn new(from: f64, velocity: f64) -> Self {
        Self {
            from,
            velocity,
            min: None,
            max: None,
            power: 0.8,
            time_constant: 750.0,
            bounce_stiffness: 500.0,
            bounce_damping: 10.0,
            rest_delta: 1.0,
            rest_speed: None,
            modify_target: None,
            driver: None,
            on_update: None,
            on_complete: None,
            on_stop: None,
        }
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    pub fn time_constant(mut self, time_constant: f64) -> Self {
        self.time_constant = time_constant;
        self
    }

    pub fn bounce_stiffness(mut self, stiffness: f64) -> Self {
        self.bounce_stiffness = stiffness;
        self
    }

    pub fn bounce_damping(mut self, damping: f64) -> Self {
        self.bounce_damping = damping;
        self
    }

    pub fn rest_delta(mut self, rest_delta: f64) -> Self {
        self.rest_delta = rest_delta;
        self
    }

    pub fn rest_speed(mut self, rest_speed: f64) -> Self {
        self.rest_speed = Some(rest_speed);
        self
    }

    /// Adjust the projected resting point, e.g. to snap to a grid
    pub fn modify_target(mut self, modify: impl Fn(f64) -> f64 + 'static) -> Self {
        self.modify_target = Some(Rc::new(modify));
        self
    }

    pub fn driver(mut self, driver: impl Driver + 'static) -> Self {
        self.driver = Some(Rc::new(driver));
        self
    }

    pub fn shared_driver(mut self, driver: Rc<dyn Driver>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn on_update(mut self, f: impl FnMut(&f64) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    /// Called once when the value comes to rest
    pub fn on_complete(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Called once if the motion is stopped before coming to rest
    pub fn on_stop(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_stop = Some(Box::new(f));
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Bounds {
    min: Option<f64>,
    max: Option<f64>,
}

impl Bounds {
    fn is_outside(&self, v: f64) -> bool {
        self.min.is_some_and(|min| v < min) || self.max.is_some_and(|max| v > max)
    }

    fn nearest(&self, v: f64) -> Option<f64> {
        match (self.min, self.max) {
            (None, max) => max,
            (min, None) => min,
            (Some(min), Some(max)) => Some(if (min - v).abs() < (max - v).abs() {
                min
            } else {
                max
            }),
        }
    }
}

/// Constants for the boundary spring
#[derive(Clone, Copy, Debug)]
struct Bounce {
    stiffness: f64,
    damping: f64,
    rest_delta: f64,
    rest_speed: Option<f64>,
}

impl Bounce {
    fn config(&self, velocity: f64) -> SpringConfig {
        let config = SpringConfig::new(self.stiffness, self.damping, 1.0)
            .with_velocity(velocity)
            .with_rest_delta(self.rest_delta);
        match self.rest_speed {
            Some(rest_speed) => config.with_rest_speed(rest_speed),
            None => config,
        }
    }
}

struct InertiaState {
    /// The decay or spring currently running
    current: RefCell<Option<Animation<f64>>>,
    driver: Rc<dyn Driver>,
    bounce: Bounce,
    finished: Cell<bool>,
    on_update: RefCell<Option<UpdateCallback<f64>>>,
    on_complete: RefCell<Option<EventCallback>>,
    on_stop: RefCell<Option<EventCallback>>,
}

impl InertiaState {
    fn notify_update(&self, value: f64) {
        if let Some(f) = self.on_update.borrow_mut().as_mut() {
            f(&value);
        }
    }

    fn start_spring(self: &Rc<Self>, from: f64, to: f64, velocity: f64) -> Result<()> {
        let on_update = self.clone();
        let on_complete = self.clone();
        let spring = animate(
            AnimationOptions::new([from, to])
                .spring(self.bounce.config(velocity))
                .shared_driver(self.driver.clone())
                .autoplay(false)
                .on_update(move |v: &f64| on_update.notify_update(*v))
                .on_complete(move || on_complete.complete()),
        )?;

        *self.current.borrow_mut() = Some(spring.clone());
        spring.play();
        Ok(())
    }

    fn start_decay(self: &Rc<Self>, from: f64, config: DecayConfig, bounds: Bounds) -> Result<()> {
        // Projected up front to decide whether the boundaries need watching
        let target = Decay::new(from, &config)?.target();
        let boundary = if bounds.is_outside(target) {
            bounds.nearest(target)
        } else {
            None
        };

        let on_update = self.clone();
        let on_complete = self.clone();
        let decay = animate(
            AnimationOptions::new([from])
                .decay(config)
                .shared_driver(self.driver.clone())
                .autoplay(false)
                .on_update(move |v: &f64| {
                    on_update.notify_update(*v);
                    if let Some(boundary) = boundary {
                        let crossed = if target > boundary {
                            *v > boundary
                        } else {
                            *v < boundary
                        };
                        if crossed {
                            on_update.bounce_off(*v, boundary);
                        }
                    }
                })
                .on_complete(move || on_complete.complete()),
        )?;

        *self.current.borrow_mut() = Some(decay.clone());
        decay.play();
        Ok(())
    }

    /// Replace the running decay with a spring settling on `boundary`
    fn bounce_off(self: &Rc<Self>, value: f64, boundary: f64) {
        if self.finished.get() {
            return;
        }
        let Some(decay) = self.current.borrow_mut().take() else {
            return;
        };
        let velocity = decay.hand_off().velocity;
        decay.cancel();

        debug!(value, boundary, velocity, "inertia crossed boundary, switching to spring");
        if let Err(err) = self.start_spring(value, boundary, velocity) {
            warn!(%err, "failed to start boundary spring");
            self.complete();
        }
    }

    fn complete(&self) {
        if self.finished.replace(true) {
            return;
        }
        let _ = self.current.borrow_mut().take();
        trace!("inertia complete");
        if let Some(f) = self.on_complete.borrow_mut().as_mut() {
            f();
        }
    }

    fn stop(&self) {
        if self.finished.replace(true) {
            return;
        }
        let current = self.current.borrow_mut().take();
        if let Some(animation) = current {
            animation.cancel();
        }
        trace!("inertia stopped");
        if let Some(f) = self.on_stop.borrow_mut().as_mut() {
            f();
        }
    }
}

/// Handle to a running [`inertia`] motion
#[derive(Clone)]
pub struct InertiaControls {
    state: Rc<InertiaState>,
}

impl InertiaControls {
    /// Stop whichever animation is running, decay or boundary spring
    ///
    /// Fires `on_stop` unless the motion already came to rest.
    pub fn stop(&self) {
        self.state.stop();
    }

    /// Whether the motion came to rest or was stopped
    pub fn is_finished(&self) -> bool {
        self.state.finished.get()
    }

    /// The generator currently moving the value
    pub fn current_kind(&self) -> Option<GeneratorKind> {
        self.state.current.borrow().as_ref().map(Animation::kind)
    }
}

/// Release `from` with a velocity, keeping it within optional bounds
///
/// Fails on non-finite input or invalid decay parameters.
pub fn inertia(options: InertiaOptions) -> Result<InertiaControls> {
    let from = ensure_finite("from", options.from)?;
    let velocity = ensure_finite("velocity", options.velocity)?;
    let bounds = Bounds {
        min: options.min.map(|v| ensure_finite("min", v)).transpose()?,
        max: options.max.map(|v| ensure_finite("max", v)).transpose()?,
    };

    let state = Rc::new(InertiaState {
        current: RefCell::new(None),
        driver: options
            .driver
            .unwrap_or_else(|| Rc::new(FrameScheduler::global())),
        bounce: Bounce {
            stiffness: options.bounce_stiffness,
            damping: options.bounce_damping,
            rest_delta: options.rest_delta,
            rest_speed: options.rest_speed,
        },
        finished: Cell::new(false),
        on_update: RefCell::new(options.on_update),
        on_complete: RefCell::new(options.on_complete),
        on_stop: RefCell::new(options.on_stop),
    });

    match bounds.nearest(from).filter(|_| bounds.is_outside(from)) {
        Some(boundary) => {
            trace!(from, boundary, velocity, "inertia starting out of bounds");
            state.start_spring(from, boundary, velocity)?;
        }
        None => {
            trace!(from, velocity, "inertia starting decay");
            let config = DecayConfig {
                velocity,
                power: options.power,
                time_constant: options.time_constant,
                rest_delta: options.rest_delta,
                modify_target: options.modify_target,
            };
            state.start_decay(from, config, bounds)?;
        }
    }

    Ok(InertiaControls { state })
}
