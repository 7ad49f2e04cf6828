//! Generator benchmarks
//!
//! Run with: `cargo bench --bench generators`

use blinc_motion::{
    find_spring, Decay, DecayConfig, Easing, Generator, Keyframes, KeyframesConfig, Spring,
    SpringConfig,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_spring_next(c: &mut Criterion) {
    let mut group = c.benchmark_group("spring_next");

    let configs = [
        ("underdamped", SpringConfig::wobbly()),
        ("critical", SpringConfig::new(100.0, 20.0, 1.0)),
        ("overdamped", SpringConfig::molasses()),
    ];

    for (name, config) in configs {
        let Ok(spring) = Spring::new(0.0, 100.0, &config) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(name), &spring, |b, spring| {
            b.iter(|| black_box(spring.next(black_box(240.0))));
        });
    }

    group.finish();
}

fn bench_decay_next(c: &mut Criterion) {
    let Ok(decay) = Decay::new(0.0, &DecayConfig::default().with_velocity(1000.0)) else {
        return;
    };
    c.bench_function("decay_next", |b| {
        b.iter(|| black_box(decay.next(black_box(240.0))));
    });
}

fn bench_keyframes_next(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyframes_next");

    for count in [2usize, 8, 32] {
        let values: Vec<f64> = (0..count).map(|i| i as f64 * 10.0).collect();
        let config = KeyframesConfig::new(1000.0).with_ease(Easing::EaseInOutCubic);
        let Ok(keyframes) = Keyframes::new(values, &config) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(count), &keyframes, |b, kf| {
            b.iter(|| black_box(kf.next(black_box(730.0))));
        });
    }

    group.finish();
}

fn bench_find_spring(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_spring");

    for bounce in [0.0, 0.25, 0.75] {
        let config = SpringConfig::perceptual(600.0, bounce);
        group.bench_with_input(BenchmarkId::from_parameter(bounce), &config, |b, config| {
            b.iter(|| black_box(find_spring(0.0, black_box(100.0), config)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_spring_next,
    bench_decay_next,
    bench_keyframes_next,
    bench_find_spring
);
criterion_main!(benches);
