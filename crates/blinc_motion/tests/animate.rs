//! Integration tests for the playback orchestrator
//!
//! Runs animations through both drivers:
//! - `ImmediateDriver` for whole runs at a fixed frame step
//! - `FrameScheduler::tick_by` for frame-by-frame control

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use blinc_motion::{
    animate, Animation, AnimationOptions, Easing, FrameScheduler, GeneratorKind, ImmediateDriver,
    MotionError, PlaybackStatus, RepeatType, SpringConfig,
};

fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<T>>>, impl FnMut(&T) + 'static) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    (log, move |v: &T| sink.borrow_mut().push(v.clone()))
}

fn counter() -> (Rc<Cell<u32>>, impl FnMut() + 'static) {
    let count = Rc::new(Cell::new(0));
    let inc = count.clone();
    (count, move || inc.set(inc.get() + 1))
}

fn linear(keyframes: [f64; 2], duration: f64) -> AnimationOptions<f64> {
    AnimationOptions::new(keyframes)
        .duration(duration)
        .ease(Easing::Linear)
}

#[test]
fn loop_repeats_then_completes_once() {
    let (values, on_update) = recorder();
    let (repeats, on_repeat) = counter();
    let (completes, on_complete) = counter();

    let animation = animate(
        linear([0.0, 100.0], 100.0)
            .repeat(2)
            .driver(ImmediateDriver::new(50.0))
            .on_update(on_update)
            .on_repeat(on_repeat)
            .on_complete(on_complete),
    )
    .unwrap();

    assert_eq!(
        *values.borrow(),
        vec![0.0, 50.0, 100.0, 50.0, 100.0, 50.0, 100.0]
    );
    assert_eq!(repeats.get(), 2);
    assert_eq!(completes.get(), 1);
    assert_eq!(animation.repeat_count(), 2);
    assert_eq!(animation.status(), PlaybackStatus::Completed);
}

#[test]
fn zero_duration_completes_on_final_value() {
    let (values, on_update) = recorder();
    let (completes, on_complete) = counter();
    let animation = animate(
        linear([0.0, 100.0], 0.0)
            .driver(ImmediateDriver::new(16.0))
            .on_update(on_update)
            .on_complete(on_complete),
    )
    .unwrap();

    assert_eq!(*values.borrow(), vec![100.0]);
    assert_eq!(completes.get(), 1);
    assert_eq!(animation.status(), PlaybackStatus::Completed);
}

#[test]
fn loop_restarts_at_origin() {
    let scheduler = FrameScheduler::new();
    let (values, on_update) = recorder();
    let _animation = animate(
        linear([0.0, 100.0], 100.0)
            .repeat(1)
            .driver(scheduler.clone())
            .on_update(on_update),
    )
    .unwrap();

    scheduler.tick_by(100.0);
    scheduler.tick_by(0.0);
    assert_eq!(*values.borrow(), vec![100.0, 0.0]);
}

#[test]
fn reverse_plays_backwards() {
    let (values, on_update) = recorder();
    animate(
        linear([0.0, 100.0], 100.0)
            .repeat(1)
            .repeat_type(RepeatType::Reverse)
            .driver(ImmediateDriver::new(50.0))
            .on_update(on_update),
    )
    .unwrap();

    assert_eq!(*values.borrow(), vec![0.0, 50.0, 100.0, 50.0, 0.0]);
}

#[test]
fn mirror_springs_back_to_origin() {
    let (values, on_update) = recorder();
    let animation = animate(
        AnimationOptions::new([0.0, 100.0])
            .spring(SpringConfig::stiff())
            .repeat(1)
            .repeat_type(RepeatType::Mirror)
            .driver(ImmediateDriver::new(16.0))
            .on_update(on_update),
    )
    .unwrap();

    let values = values.borrow();
    assert_eq!(values.first(), Some(&0.0));
    assert!(values.contains(&100.0));
    assert_eq!(values.last(), Some(&0.0));
    assert!(values.len() < 1_000);
    assert_eq!(animation.status(), PlaybackStatus::Completed);
}

#[test]
fn repeat_delay_holds_last_value() {
    let scheduler = FrameScheduler::new();
    let (values, on_update) = recorder();
    let (repeats, on_repeat) = counter();
    let _animation = animate(
        linear([0.0, 100.0], 100.0)
            .repeat(1)
            .repeat_delay(50.0)
            .driver(scheduler.clone())
            .on_update(on_update)
            .on_repeat(on_repeat),
    )
    .unwrap();

    scheduler.tick_by(100.0);
    scheduler.tick_by(25.0);
    assert_eq!(repeats.get(), 0);
    scheduler.tick_by(25.0);
    assert_eq!(repeats.get(), 1);
    scheduler.tick_by(50.0);

    assert_eq!(*values.borrow(), vec![100.0, 100.0, 100.0, 50.0]);
}

#[test]
fn delay_holds_origin() {
    let scheduler = FrameScheduler::new();
    let (values, on_update) = recorder();
    let _animation = animate(
        linear([0.0, 100.0], 100.0)
            .delay(50.0)
            .driver(scheduler.clone())
            .on_update(on_update),
    )
    .unwrap();

    scheduler.tick_by(25.0);
    scheduler.tick_by(75.0);
    assert_eq!(*values.borrow(), vec![0.0, 50.0]);
}

#[test]
fn stop_inside_update_ends_playback() {
    let (values, on_update) = recorder::<f64>();
    let (stops, on_stop) = counter();
    let (completes, on_complete) = counter();
    let slot: Rc<RefCell<Option<Animation<f64>>>> = Rc::new(RefCell::new(None));

    let handle = slot.clone();
    let mut record = on_update;
    let animation = animate(
        linear([0.0, 100.0], 100.0)
            .autoplay(false)
            .driver(ImmediateDriver::new(25.0))
            .on_update(move |v: &f64| {
                record(v);
                if *v >= 50.0 {
                    if let Some(animation) = handle.borrow().as_ref() {
                        animation.stop();
                    }
                }
            })
            .on_stop(on_stop)
            .on_complete(on_complete),
    )
    .unwrap();
    assert_eq!(animation.status(), PlaybackStatus::Idle);

    *slot.borrow_mut() = Some(animation.clone());
    animation.play();

    assert_eq!(*values.borrow(), vec![0.0, 25.0, 50.0]);
    assert_eq!(stops.get(), 1);
    assert_eq!(completes.get(), 0);
    assert_eq!(animation.status(), PlaybackStatus::Stopped);

    // Already finished
    animation.stop();
    assert_eq!(stops.get(), 1);
}

#[test]
fn stop_releases_the_scheduler() {
    let scheduler = FrameScheduler::new();
    let (values, on_update) = recorder::<f64>();
    let animation = animate(
        linear([0.0, 100.0], 100.0)
            .driver(scheduler.clone())
            .on_update(on_update),
    )
    .unwrap();
    assert!(scheduler.has_active());

    scheduler.tick_by(10.0);
    animation.stop();
    assert!(!scheduler.has_active());
    scheduler.tick_by(10.0);

    assert_eq!(values.borrow().len(), 1);
    assert!(animation.is_finished());
}

#[test]
fn completion_releases_the_scheduler() {
    let scheduler = FrameScheduler::new();
    let (stops, on_stop) = counter();
    let animation = animate(
        linear([0.0, 100.0], 100.0)
            .driver(scheduler.clone())
            .on_stop(on_stop),
    )
    .unwrap();

    scheduler.tick_by(150.0);
    assert_eq!(animation.status(), PlaybackStatus::Completed);
    assert!(!scheduler.has_active());

    // Stopping a completed animation is a no-op
    animation.stop();
    assert_eq!(stops.get(), 0);
}

#[test]
fn play_starts_an_idle_animation_once() {
    let scheduler = FrameScheduler::new();
    let (plays, on_play) = counter();
    let animation = animate(
        linear([0.0, 100.0], 100.0)
            .autoplay(false)
            .driver(scheduler.clone())
            .on_play(on_play),
    )
    .unwrap();
    assert!(!scheduler.has_active());

    animation.play();
    animation.play();
    assert_eq!(plays.get(), 1);
    assert_eq!(scheduler.active_count(), 1);
    assert_eq!(animation.status(), PlaybackStatus::Playing);
}

#[test]
fn sample_does_not_touch_playback() {
    let scheduler = FrameScheduler::new();
    let animation = animate(linear([0.0, 100.0], 100.0).driver(scheduler.clone())).unwrap();

    scheduler.tick_by(40.0);
    assert_eq!(animation.sample(80.0).value, 80.0);
    assert!(animation.sample(100.0).done);
    assert_eq!(animation.sample(-10.0).value, 0.0);
    assert_eq!(animation.elapsed(), 40.0);
    assert_eq!(animation.latest(), 40.0);
}

#[test]
fn vectors_spring_through_progress() {
    let (values, on_update) = recorder();
    let animation = animate(
        AnimationOptions::new([[0.0, 0.0], [10.0, 100.0]])
            .spring(SpringConfig::stiff())
            .driver(ImmediateDriver::default())
            .on_update(on_update),
    )
    .unwrap();

    assert_eq!(animation.kind(), GeneratorKind::Spring);
    let values = values.borrow();
    assert_eq!(values.first(), Some(&[0.0, 0.0]));
    assert_eq!(values.last(), Some(&[10.0, 100.0]));
}

#[test]
fn long_sequences_use_keyframes() {
    let animation = animate(
        AnimationOptions::new([0.0, 50.0, 100.0])
            .spring(SpringConfig::stiff())
            .autoplay(false),
    )
    .unwrap();
    assert_eq!(animation.kind(), GeneratorKind::Keyframes);
}

#[test]
fn perceptual_spring_takes_animation_duration() {
    let (values, on_update) = recorder::<f64>();
    let animation = animate(
        AnimationOptions::new([0.0, 100.0])
            .spring(SpringConfig::default().with_bounce(0.3))
            .duration(400.0)
            .driver(ImmediateDriver::new(100.0))
            .on_update(on_update),
    )
    .unwrap();

    // Frames at 0, 100, 200, 300 and 400ms
    assert_eq!(values.borrow().len(), 5);
    assert_eq!(values.borrow().last(), Some(&100.0));
    assert_eq!(animation.status(), PlaybackStatus::Completed);
}

#[test]
fn hand_off_continues_motion() {
    let scheduler = FrameScheduler::new();
    let animation = animate(linear([0.0, 100.0], 1000.0).driver(scheduler.clone())).unwrap();
    scheduler.tick_by(500.0);

    let hand_off = animation.hand_off();
    assert_eq!(hand_off.value, 50.0);
    assert!((hand_off.velocity - 100.0).abs() < 1e-6);
    animation.stop();

    let (values, on_update) = recorder::<f64>();
    let next = animate(
        hand_off
            .retarget(200.0)
            .spring(SpringConfig::stiff())
            .driver(scheduler.clone())
            .on_update(on_update),
    )
    .unwrap();

    assert!((next.velocity_at(0.0) - 100.0).abs() < 1e-6);
    scheduler.tick_by(16.0);
    let first = values.borrow()[0];
    assert!(first > 50.0 && first < 200.0);
}

#[test]
fn invalid_configuration_fails_fast() {
    assert!(matches!(
        animate(AnimationOptions::<f64>::new([])),
        Err(MotionError::EmptyKeyframes)
    ));

    let result = animate(
        AnimationOptions::new([0.0, 1.0, 2.0])
            .ease(vec![Easing::Linear])
            .autoplay(false),
    );
    assert!(matches!(
        result,
        Err(MotionError::EasingCountMismatch {
            expected: 2,
            found: 1
        })
    ));

    let result = animate(
        AnimationOptions::new([0.0, 1.0])
            .spring(SpringConfig::new(100.0, 10.0, 0.0))
            .autoplay(false),
    );
    assert!(result.is_err());
}
