//! Blinc Motion
//!
//! Time-driven value animation: springs, decay, keyframes and the playback
//! loop that runs them.
//!
//! # Features
//!
//! - **Spring Physics**: closed-form damped springs, configured physically
//!   (stiffness, damping, mass) or perceptually (duration, bounce)
//! - **Decay**: momentum that decelerates toward a projected resting point
//! - **Keyframes**: eased interpolation through any number of values
//! - **Playback**: repeat (loop, reverse, mirror), delays and lifecycle callbacks
//! - **Inertia**: decay that springs back into `min`/`max` bounds
//! - **Interruptible**: hand position and velocity from one animation to the next
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use blinc_motion::{animate, AnimationOptions, Easing, ImmediateDriver};
//!
//! let values = Rc::new(RefCell::new(Vec::new()));
//! let sink = values.clone();
//!
//! animate(
//!     AnimationOptions::new([0.0, 100.0])
//!         .duration(100.0)
//!         .ease(Easing::Linear)
//!         .driver(ImmediateDriver::new(25.0))
//!         .on_update(move |v: &f64| sink.borrow_mut().push(*v)),
//! )?;
//!
//! assert_eq!(*values.borrow(), vec![0.0, 25.0, 50.0, 75.0, 100.0]);
//! # Ok::<(), blinc_motion::MotionError>(())
//! ```

pub mod animate;
pub mod driver;
pub mod easing;
pub mod error;
pub mod generators;
pub mod inertia;
pub mod value;
pub mod velocity;

pub use animate::{
    animate, Animation, AnimationOptions, HandOff, PlaybackStatus, RepeatType, REPEAT_FOREVER,
};
pub use driver::{Driver, DriverControls, FrameCallback, FrameScheduler, ImmediateDriver};
pub use easing::Easing;
pub use error::{MotionError, Result};
pub use generators::{
    find_spring, Decay, DecayConfig, EasingSpec, Generator, GeneratorKind, GeneratorState,
    Keyframes, KeyframesConfig, MotionGenerator, Spring, SpringConfig, SpringSolution,
};
pub use inertia::{inertia, InertiaControls, InertiaOptions};
pub use value::Animatable;
pub use velocity::{sample_velocity, velocity_per_second};
