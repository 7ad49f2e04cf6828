//! Time drivers
//!
//! A driver repeatedly calls an update callback with the time, in
//! milliseconds, since the previous call. Animations never schedule their own
//! timers; all timing arrives through a driver.
//!
//! [`FrameScheduler`] is a frame loop shared by any number of animations.
//! [`ImmediateDriver`] runs an animation to completion synchronously at a fixed
//! step, which is useful for precomputing values and for tests.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Instant;

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use tracing::warn;

/// Longest delta [`FrameScheduler::tick`] delivers, in milliseconds
pub const MAX_FRAME_DELTA_MS: f64 = 250.0;

/// Update callback receiving the frame delta in milliseconds
pub type FrameCallback = Box<dyn FnMut(f64)>;

/// A source of frame deltas
pub trait Driver {
    /// Bind `update` to this driver. Nothing is delivered until `start`.
    fn bind(&self, update: FrameCallback) -> Rc<dyn DriverControls>;
}

/// Start/stop handle for a bound update callback
///
/// `stop` may be called from inside the update callback. No further updates
/// are delivered after it returns.
pub trait DriverControls {
    fn start(&self);
    fn stop(&self);
}

new_key_type! {
    pub struct FrameSubscriptionId;
}

struct Subscription {
    /// Taken out while the callback runs
    update: Option<FrameCallback>,
    active: bool,
}

struct SchedulerState {
    subscriptions: RefCell<SlotMap<FrameSubscriptionId, Subscription>>,
    last_frame: Cell<Instant>,
}

/// A frame loop that ticks all subscribed animations
///
/// Cloning yields another handle to the same loop. Subscriptions started
/// during a tick receive their first update on the next tick.
#[derive(Clone)]
pub struct FrameScheduler {
    state: Rc<SchedulerState>,
}

thread_local! {
    static GLOBAL_SCHEDULER: FrameScheduler = FrameScheduler::new();
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            state: Rc::new(SchedulerState {
                subscriptions: RefCell::new(SlotMap::with_key()),
                last_frame: Cell::new(Instant::now()),
            }),
        }
    }

    /// The scheduler animations use when no driver is given
    ///
    /// One per thread. The host is responsible for calling [`tick`](Self::tick)
    /// once per frame.
    pub fn global() -> Self {
        GLOBAL_SCHEDULER.with(Clone::clone)
    }

    /// Tick with the wall-clock time since the previous tick
    ///
    /// The clock restarts when the first subscription starts on an idle
    /// scheduler, and long pauses are capped at [`MAX_FRAME_DELTA_MS`].
    pub fn tick(&self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame.get()).as_secs_f64() * 1000.0;
        self.state.last_frame.set(now);
        self.tick_by(dt.min(MAX_FRAME_DELTA_MS));
    }

    /// Tick all active subscriptions with an explicit delta (ms)
    pub fn tick_by(&self, delta_ms: f64) {
        let ids: SmallVec<[FrameSubscriptionId; 16]> = self
            .state
            .subscriptions
            .borrow()
            .iter()
            .filter(|(_, sub)| sub.active)
            .map(|(id, _)| id)
            .collect();

        for id in ids {
            let update = self
                .state
                .subscriptions
                .borrow_mut()
                .get_mut(id)
                .filter(|sub| sub.active)
                .and_then(|sub| sub.update.take());

            let Some(mut update) = update else {
                continue;
            };
            update(delta_ms);

            // Stopped subscriptions are gone; their callback drops here
            if let Some(sub) = self.state.subscriptions.borrow_mut().get_mut(id) {
                sub.update = Some(update);
            }
        }
    }

    /// Check if any subscriptions are running
    pub fn has_active(&self) -> bool {
        self.state
            .subscriptions
            .borrow()
            .iter()
            .any(|(_, sub)| sub.active)
    }

    /// Number of running subscriptions
    pub fn active_count(&self) -> usize {
        self.state
            .subscriptions
            .borrow()
            .iter()
            .filter(|(_, sub)| sub.active)
            .count()
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for FrameScheduler {
    fn bind(&self, update: FrameCallback) -> Rc<dyn DriverControls> {
        let id = self.state.subscriptions.borrow_mut().insert(Subscription {
            update: Some(update),
            active: false,
        });
        Rc::new(FrameSubscription {
            scheduler: Rc::downgrade(&self.state),
            id,
        })
    }
}

/// Controls for one callback bound to a [`FrameScheduler`]
struct FrameSubscription {
    scheduler: Weak<SchedulerState>,
    id: FrameSubscriptionId,
}

impl DriverControls for FrameSubscription {
    fn start(&self) {
        let Some(state) = self.scheduler.upgrade() else {
            return;
        };
        let mut subscriptions = state.subscriptions.borrow_mut();
        let was_idle = !subscriptions.iter().any(|(_, sub)| sub.active);
        if let Some(sub) = subscriptions.get_mut(self.id) {
            sub.active = true;
            // Time spent idle is not animation time
            if was_idle {
                state.last_frame.set(Instant::now());
            }
        }
    }

    fn stop(&self) {
        if let Some(state) = self.scheduler.upgrade() {
            state.subscriptions.borrow_mut().remove(self.id);
        }
    }
}

/// Runs an animation to completion inside `start`
///
/// Delivers `update(0)` and then `update(interval)` until stopped or until
/// `max_frames` frames have run.
#[derive(Clone, Copy, Debug)]
pub struct ImmediateDriver {
    pub interval: f64,
    pub max_frames: usize,
}

impl ImmediateDriver {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            max_frames: 100_000,
        }
    }

    /// Builder: cap the number of delivered frames
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }
}

impl Default for ImmediateDriver {
    /// 60fps frame step
    fn default() -> Self {
        Self::new(1000.0 / 60.0)
    }
}

impl Driver for ImmediateDriver {
    fn bind(&self, update: FrameCallback) -> Rc<dyn DriverControls> {
        Rc::new(ImmediateRun {
            update: RefCell::new(Some(update)),
            running: Cell::new(false),
            interval: self.interval,
            max_frames: self.max_frames,
        })
    }
}

struct ImmediateRun {
    update: RefCell<Option<FrameCallback>>,
    running: Cell<bool>,
    interval: f64,
    max_frames: usize,
}

impl DriverControls for ImmediateRun {
    fn start(&self) {
        let Some(mut update) = self.update.borrow_mut().take() else {
            return;
        };
        self.running.set(true);

        let mut frames = 0;
        let mut delta = 0.0;
        while self.running.get() && frames < self.max_frames {
            update(delta);
            delta = self.interval;
            frames += 1;
        }
        if self.running.replace(false) {
            warn!(
                frames,
                interval = self.interval,
                "immediate driver hit its frame cap before the animation finished"
            );
        }
    }

    fn stop(&self) {
        self.running.set(false);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<f64>>>, FrameCallback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        (log, Box::new(move |dt: f64| sink.borrow_mut().push(dt)))
    }

    #[test]
    fn bound_callbacks_wait_for_start() {
        let scheduler = FrameScheduler::new();
        let (log, update) = recorder();
        let controls = scheduler.bind(update);

        scheduler.tick_by(16.0);
        assert!(log.borrow().is_empty());
        assert!(!scheduler.has_active());

        controls.start();
        scheduler.tick_by(16.0);
        scheduler.tick_by(8.0);
        assert_eq!(*log.borrow(), vec![16.0, 8.0]);
        assert_eq!(scheduler.active_count(), 1);

        controls.stop();
        scheduler.tick_by(16.0);
        assert_eq!(log.borrow().len(), 2);
        assert!(!scheduler.has_active());
    }

    #[test]
    fn stop_from_inside_update() {
        let scheduler = FrameScheduler::new();
        let count = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Rc<dyn DriverControls>>>> = Rc::new(RefCell::new(None));

        let count_clone = count.clone();
        let slot_clone = slot.clone();
        let controls = scheduler.bind(Box::new(move |_| {
            count_clone.set(count_clone.get() + 1);
            if let Some(controls) = slot_clone.borrow().as_ref() {
                controls.stop();
            }
        }));
        *slot.borrow_mut() = Some(controls.clone());
        controls.start();

        scheduler.tick_by(16.0);
        scheduler.tick_by(16.0);
        assert_eq!(count.get(), 1);
        assert!(!scheduler.has_active());
    }

    #[test]
    fn started_during_tick_runs_next_tick() {
        let scheduler = FrameScheduler::new();
        let (log, inner_update) = recorder();
        let inner = scheduler.bind(inner_update);

        let outer = scheduler.bind(Box::new(move |_| inner.start()));
        outer.start();

        scheduler.tick_by(10.0);
        assert!(log.borrow().is_empty());
        scheduler.tick_by(20.0);
        assert_eq!(*log.borrow(), vec![20.0]);
    }

    #[test]
    fn first_tick_after_idle_starts_from_zero() {
        let scheduler = FrameScheduler::new();
        let (log, update) = recorder();
        let controls = scheduler.bind(update);

        std::thread::sleep(Duration::from_millis(300));
        controls.start();
        scheduler.tick();
        assert!(log.borrow()[0] < MAX_FRAME_DELTA_MS);
    }

    #[test]
    fn tick_caps_long_pauses() {
        let scheduler = FrameScheduler::new();
        let (log, update) = recorder();
        scheduler.bind(update).start();

        std::thread::sleep(Duration::from_millis(300));
        scheduler.tick();
        assert_eq!(*log.borrow(), vec![MAX_FRAME_DELTA_MS]);
    }

    #[test]
    fn immediate_driver_runs_until_stopped() {
        let driver = ImmediateDriver::new(100.0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let slot: Rc<RefCell<Option<Rc<dyn DriverControls>>>> = Rc::new(RefCell::new(None));

        let sink = log.clone();
        let slot_clone = slot.clone();
        let controls = driver.bind(Box::new(move |dt: f64| {
            sink.borrow_mut().push(dt);
            if sink.borrow().len() == 4 {
                if let Some(controls) = slot_clone.borrow().as_ref() {
                    controls.stop();
                }
            }
        }));
        *slot.borrow_mut() = Some(controls.clone());
        controls.start();

        assert_eq!(*log.borrow(), vec![0.0, 100.0, 100.0, 100.0]);
    }

    #[test]
    fn immediate_driver_respects_frame_cap() {
        let driver = ImmediateDriver::new(10.0).with_max_frames(3);
        let (log, update) = recorder();
        let controls = driver.bind(update);
        controls.start();
        assert_eq!(log.borrow().len(), 3);

        // A capped run has released its callback and cannot be resumed
        controls.start();
        assert_eq!(log.borrow().len(), 3);
    }
}
