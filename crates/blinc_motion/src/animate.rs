//! Playback orchestration
//!
//! [`animate`] wraps a generator in a playable animation: it pulls frame deltas
//! from a [`Driver`], tracks elapsed time, handles repeats (loop, reverse,
//! mirror) and repeat delays, and reports values through callbacks.
//!
//! ```ignore
//! let animation = animate(
//!     AnimationOptions::new([0.0, 100.0])
//!         .spring(SpringConfig::wobbly())
//!         .on_update(|v| println!("{v}")),
//! )?;
//! // later
//! animation.stop();
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::trace;

use crate::driver::{Driver, DriverControls, FrameScheduler};
use crate::error::{MotionError, Result};
use crate::generators::keyframes::DEFAULT_DURATION_MS;
use crate::generators::{
    Decay, DecayConfig, EasingSpec, Generator, GeneratorKind, GeneratorState, Keyframes,
    KeyframesConfig, MotionGenerator, Spring, SpringConfig, ValueSpace,
};
use crate::value::Animatable;

/// Repeat count that never runs out
pub const REPEAT_FOREVER: u32 = u32::MAX;

/// How a finished animation runs again
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RepeatType {
    /// Start over from the beginning
    #[default]
    Loop,
    /// Play backwards, then forwards, alternating
    Reverse,
    /// Restart with origin and target swapped
    Mirror,
}

/// Elapsed time at the start of the next loop
#[inline]
pub fn loop_elapsed(elapsed: f64, duration: f64, delay: f64) -> f64 {
    elapsed - duration - delay
}

/// Elapsed time after flipping playback direction
///
/// Reflects `elapsed` so the value at the flip is continuous.
#[inline]
pub fn reverse_elapsed(elapsed: f64, duration: f64, delay: f64, is_forward: bool) -> f64 {
    if is_forward {
        loop_elapsed(duration - elapsed, duration, delay)
    } else {
        duration - (elapsed - duration) + delay
    }
}

/// Whether the repeat delay after a finished run has passed
#[inline]
pub fn has_repeat_delay_elapsed(elapsed: f64, duration: f64, delay: f64, is_forward: bool) -> bool {
    if is_forward {
        elapsed >= duration + delay
    } else {
        elapsed <= -delay
    }
}

/// Value callback
pub type UpdateCallback<T> = Box<dyn FnMut(&T)>;
/// Lifecycle callback
pub type EventCallback = Box<dyn FnMut()>;

/// Configuration for [`animate`]
pub struct AnimationOptions<T: Animatable> {
    keyframes: SmallVec<[T; 2]>,
    kind: GeneratorKind,
    duration: Option<f64>,
    elapsed: f64,
    repeat: u32,
    repeat_type: RepeatType,
    repeat_delay: f64,
    autoplay: bool,
    velocity: Option<f64>,
    driver: Option<Rc<dyn Driver>>,
    spring: SpringConfig,
    decay: DecayConfig,
    ease: EasingSpec,
    times: Option<Vec<f64>>,
    on_play: Option<EventCallback>,
    on_update: Option<UpdateCallback<T>>,
    on_complete: Option<EventCallback>,
    on_repeat: Option<EventCallback>,
    on_stop: Option<EventCallback>,
}

impl<T: Animatable> AnimationOptions<T> {
    /// Animate through `keyframes`; first is the origin, last the target
    pub fn new(keyframes: impl IntoIterator<Item = T>) -> Self {
        Self {
            keyframes: keyframes.into_iter().collect(),
            kind: GeneratorKind::Keyframes,
            duration: None,
            elapsed: 0.0,
            repeat: 0,
            repeat_type: RepeatType::Loop,
            repeat_delay: 0.0,
            autoplay: true,
            velocity: None,
            driver: None,
            spring: SpringConfig::default(),
            decay: DecayConfig::default(),
            ease: EasingSpec::default(),
            times: None,
            on_play: None,
            on_update: None,
            on_complete: None,
            on_repeat: None,
            on_stop: None,
        }
    }

    /// Request a generator kind
    pub fn kind(mut self, kind: GeneratorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Use a spring with `config`
    pub fn spring(mut self, config: SpringConfig) -> Self {
        self.kind = GeneratorKind::Spring;
        self.spring = config;
        self
    }

    /// Use a decay with `config`
    pub fn decay(mut self, config: DecayConfig) -> Self {
        self.kind = GeneratorKind::Decay;
        self.decay = config;
        self
    }

    /// Duration in milliseconds (keyframes, or a perceptual spring)
    pub fn duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Starting elapsed time; negative values delay the start
    pub fn elapsed(mut self, elapsed: f64) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Delay the start by `delay` milliseconds
    pub fn delay(mut self, delay: f64) -> Self {
        self.elapsed = -delay;
        self
    }

    /// Number of extra runs after the first
    pub fn repeat(mut self, count: u32) -> Self {
        self.repeat = count;
        self
    }

    pub fn repeat_type(mut self, repeat_type: RepeatType) -> Self {
        self.repeat_type = repeat_type;
        self
    }

    /// Pause between runs in milliseconds
    pub fn repeat_delay(mut self, delay: f64) -> Self {
        self.repeat_delay = delay;
        self
    }

    /// Start on construction (default `true`)
    pub fn autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    /// Initial velocity in units per second, for spring and decay
    pub fn velocity(mut self, velocity: f64) -> Self {
        self.velocity = Some(velocity);
        self
    }

    /// Drive with `driver` instead of the thread's global frame scheduler
    pub fn driver(mut self, driver: impl Driver + 'static) -> Self {
        self.driver = Some(Rc::new(driver));
        self
    }

    /// Drive with a shared driver
    pub fn shared_driver(mut self, driver: Rc<dyn Driver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Easing for keyframe transitions
    pub fn ease(mut self, ease: impl Into<EasingSpec>) -> Self {
        self.ease = ease.into();
        self
    }

    /// Keyframe offsets as fractions of the duration
    pub fn times(mut self, times: Vec<f64>) -> Self {
        self.times = Some(times);
        self
    }

    pub fn on_play(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_play = Some(Box::new(f));
        self
    }

    /// Called with the latest value on every frame
    pub fn on_update(mut self, f: impl FnMut(&T) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    /// Called once when the last run finishes
    pub fn on_complete(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Called at the start of every repeat
    pub fn on_repeat(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_repeat = Some(Box::new(f));
        self
    }

    /// Called when the animation is stopped before completing
    pub fn on_stop(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_stop = Some(Box::new(f));
        self
    }

    fn build_generator(&self) -> Result<MotionGenerator<T>> {
        let (Some(origin), Some(target)) = (self.keyframes.first(), self.keyframes.last()) else {
            return Err(MotionError::EmptyKeyframes);
        };

        match self.kind.resolve(self.keyframes.len()) {
            GeneratorKind::Keyframes => {
                let config = KeyframesConfig {
                    duration: self.duration.unwrap_or(DEFAULT_DURATION_MS),
                    ease: self.ease.clone(),
                    times: self.times.clone(),
                };
                Ok(MotionGenerator::Keyframes(Keyframes::new(
                    self.keyframes.iter().cloned(),
                    &config,
                )?))
            }
            GeneratorKind::Spring => {
                let (space, from, to) = ValueSpace::resolve(origin, target);
                let mut config = self.spring.clone();
                if let Some(velocity) = self.velocity {
                    config.velocity = velocity;
                }
                if config.duration.is_none() {
                    config.duration = self.duration;
                }
                Ok(MotionGenerator::Spring(Spring::new(from, to, &config)?, space))
            }
            GeneratorKind::Decay => {
                let (space, from, _) = ValueSpace::resolve(origin, target);
                let mut config = self.decay.clone();
                if let Some(velocity) = self.velocity {
                    config.velocity = velocity;
                }
                Ok(MotionGenerator::Decay(Decay::new(from, &config)?, space))
            }
        }
    }
}

/// Lifecycle of an animation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Created without autoplay, waiting for `play`
    Idle,
    Playing,
    /// Finished its last run
    Completed,
    /// Stopped before completing
    Stopped,
}

/// Position and velocity of a running animation, for handing off to another
#[derive(Clone, Debug, PartialEq)]
pub struct HandOff<T> {
    pub value: T,
    /// Units per second in the generator's numeric space
    pub velocity: f64,
}

impl<T: Animatable> HandOff<T> {
    /// Options for an animation continuing from this state toward `target`
    pub fn retarget(self, target: T) -> AnimationOptions<T> {
        AnimationOptions::new([self.value, target]).velocity(self.velocity)
    }
}

/// Outcome of a finished run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunEnd {
    Repeated,
    Completed,
}

/// Timing state of one animation
struct Playback<T: Animatable> {
    generator: MotionGenerator<T>,
    elapsed: f64,
    repeat_count: u32,
    repeat_max: u32,
    repeat_type: RepeatType,
    repeat_delay: f64,
    /// Known up front for tweens, measured on the first run for physics
    computed_duration: Option<f64>,
    is_complete: bool,
    is_forward: bool,
    latest: T,
}

impl<T: Animatable> Playback<T> {
    /// Advance by `delta` and return the value to report
    fn step(&mut self, delta: f64) -> T {
        let delta = if self.is_forward { delta } else { -delta };
        self.elapsed += delta;

        if !self.is_complete {
            let state = self.generator.next(self.elapsed.max(0.0));
            self.latest = state.value;
            self.is_complete = if self.is_forward {
                state.done
            } else {
                self.elapsed <= 0.0
            };
        }

        self.latest.clone()
    }

    /// Repeat and completion bookkeeping after a step
    fn settle(&mut self) -> Option<RunEnd> {
        if !self.is_complete {
            return None;
        }

        if self.repeat_count == 0 && self.computed_duration.is_none() {
            self.computed_duration = Some(self.elapsed);
        }
        let duration = self.computed_duration.unwrap_or(self.elapsed);

        if self.repeat_count >= self.repeat_max {
            return Some(RunEnd::Completed);
        }

        if has_repeat_delay_elapsed(self.elapsed, duration, self.repeat_delay, self.is_forward) {
            self.repeat(duration);
            Some(RunEnd::Repeated)
        } else {
            None
        }
    }

    fn repeat(&mut self, duration: f64) {
        self.repeat_count += 1;

        match self.repeat_type {
            RepeatType::Reverse => {
                self.is_forward = self.repeat_count % 2 == 0;
                self.elapsed =
                    reverse_elapsed(self.elapsed, duration, self.repeat_delay, self.is_forward);
            }
            RepeatType::Loop => {
                self.elapsed = loop_elapsed(self.elapsed, duration, self.repeat_delay);
            }
            RepeatType::Mirror => {
                self.elapsed = loop_elapsed(self.elapsed, duration, self.repeat_delay);
                self.generator.flip_target();
            }
        }

        self.is_complete = false;
    }
}

struct Callbacks<T> {
    on_play: RefCell<Option<EventCallback>>,
    on_update: RefCell<Option<UpdateCallback<T>>>,
    on_complete: RefCell<Option<EventCallback>>,
    on_repeat: RefCell<Option<EventCallback>>,
    on_stop: RefCell<Option<EventCallback>>,
}

fn fire(callback: &RefCell<Option<EventCallback>>) {
    if let Some(f) = callback.borrow_mut().as_mut() {
        f();
    }
}

struct Shared<T: Animatable> {
    playback: RefCell<Playback<T>>,
    callbacks: Callbacks<T>,
    driver: Rc<dyn Driver>,
    controls: RefCell<Option<Rc<dyn DriverControls>>>,
    status: Cell<PlaybackStatus>,
}

impl<T: Animatable> Shared<T> {
    fn update(&self, delta: f64) {
        if self.status.get() != PlaybackStatus::Playing {
            return;
        }

        let value = self.playback.borrow_mut().step(delta);
        if let Some(f) = self.callbacks.on_update.borrow_mut().as_mut() {
            f(&value);
        }

        // Stopped from inside on_update
        if self.status.get() != PlaybackStatus::Playing {
            return;
        }

        let end = self.playback.borrow_mut().settle();
        match end {
            Some(RunEnd::Repeated) => {
                trace!(
                    repeat = self.playback.borrow().repeat_count,
                    "animation repeating"
                );
                fire(&self.callbacks.on_repeat);
            }
            Some(RunEnd::Completed) => self.finish(PlaybackStatus::Completed),
            None => {}
        }
    }

    /// Leave the playing state and release the driver
    fn finish(&self, status: PlaybackStatus) {
        self.status.set(status);
        let controls = self.controls.borrow_mut().take();
        if let Some(controls) = controls {
            controls.stop();
        }

        match status {
            PlaybackStatus::Completed => {
                trace!("animation complete");
                fire(&self.callbacks.on_complete);
            }
            PlaybackStatus::Stopped => trace!("animation stopped"),
            PlaybackStatus::Idle | PlaybackStatus::Playing => {}
        }
    }
}

/// Handle to a running animation
///
/// Cloning yields another handle to the same animation.
pub struct Animation<T: Animatable> {
    shared: Rc<Shared<T>>,
}

impl<T: Animatable> Clone for Animation<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

/// Build an animation and, unless autoplay is off, start it
///
/// Fails on an empty keyframe sequence and on invalid generator configuration.
pub fn animate<T: Animatable>(options: AnimationOptions<T>) -> Result<Animation<T>> {
    let generator = options.build_generator()?;
    let kind = generator.kind();
    let computed_duration = options.duration.or_else(|| generator.declared_duration());
    let latest = generator.next(0.0).value;

    trace!(
        ?kind,
        repeat = options.repeat,
        repeat_type = ?options.repeat_type,
        autoplay = options.autoplay,
        "animation created"
    );

    let AnimationOptions {
        elapsed,
        repeat,
        repeat_type,
        repeat_delay,
        autoplay,
        driver,
        on_play,
        on_update,
        on_complete,
        on_repeat,
        on_stop,
        ..
    } = options;

    let animation = Animation {
        shared: Rc::new(Shared {
            playback: RefCell::new(Playback {
                generator,
                elapsed,
                repeat_count: 0,
                repeat_max: repeat,
                repeat_type,
                repeat_delay,
                computed_duration,
                is_complete: false,
                is_forward: true,
                latest,
            }),
            callbacks: Callbacks {
                on_play: RefCell::new(on_play),
                on_update: RefCell::new(on_update),
                on_complete: RefCell::new(on_complete),
                on_repeat: RefCell::new(on_repeat),
                on_stop: RefCell::new(on_stop),
            },
            driver: driver.unwrap_or_else(|| Rc::new(FrameScheduler::global())),
            controls: RefCell::new(None),
            status: Cell::new(PlaybackStatus::Idle),
        }),
    };

    if autoplay {
        animation.play();
    }

    Ok(animation)
}

impl<T: Animatable> Animation<T> {
    /// Start playback. Does nothing unless the animation is idle.
    pub fn play(&self) {
        if self.shared.status.get() != PlaybackStatus::Idle {
            return;
        }
        self.shared.status.set(PlaybackStatus::Playing);
        trace!("animation playing");
        fire(&self.shared.callbacks.on_play);
        if self.shared.status.get() != PlaybackStatus::Playing {
            return;
        }

        let shared = self.shared.clone();
        let controls = self
            .shared
            .driver
            .bind(Box::new(move |delta: f64| shared.update(delta)));
        *self.shared.controls.borrow_mut() = Some(controls.clone());
        controls.start();
    }

    /// Stop playback without completing
    ///
    /// Fires `on_stop`. No further updates or callbacks are delivered. Does
    /// nothing once the animation has completed or been stopped.
    pub fn stop(&self) {
        if self.is_finished() {
            return;
        }
        self.shared.finish(PlaybackStatus::Stopped);
        fire(&self.shared.callbacks.on_stop);
    }

    /// Stop without firing `on_stop`
    pub(crate) fn cancel(&self) {
        if !self.is_finished() {
            self.shared.finish(PlaybackStatus::Stopped);
        }
    }

    /// Evaluate the generator at `t` without touching playback state
    pub fn sample(&self, t: f64) -> GeneratorState<T> {
        self.shared.playback.borrow().generator.next(t.max(0.0))
    }

    /// Velocity at `t` in units per second, see [`MotionGenerator::velocity`]
    pub fn velocity_at(&self, t: f64) -> f64 {
        self.shared.playback.borrow().generator.velocity(t.max(0.0))
    }

    /// Current position and velocity, for starting a replacement animation
    pub fn hand_off(&self) -> HandOff<T> {
        let playback = self.shared.playback.borrow();
        let t = playback.elapsed.max(0.0);
        HandOff {
            value: playback.generator.next(t).value,
            velocity: playback.generator.velocity(t),
        }
    }

    /// Elapsed time of the current run in milliseconds
    pub fn elapsed(&self) -> f64 {
        self.shared.playback.borrow().elapsed
    }

    /// The last value reported to `on_update`
    pub fn latest(&self) -> T {
        self.shared.playback.borrow().latest.clone()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.shared.status.get()
    }

    /// Whether the animation completed or was stopped
    pub fn is_finished(&self) -> bool {
        matches!(
            self.shared.status.get(),
            PlaybackStatus::Completed | PlaybackStatus::Stopped
        )
    }

    /// Repeats started so far
    pub fn repeat_count(&self) -> u32 {
        self.shared.playback.borrow().repeat_count
    }

    /// The generator in use, after keyframe-count resolution
    pub fn kind(&self) -> GeneratorKind {
        self.shared.playback.borrow().generator.kind()
    }
}
