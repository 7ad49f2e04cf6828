//! Spring parameter solver
//!
//! Derives physical stiffness and damping from a perceptual duration and
//! bounce. Bounce fixes the damping ratio; stiffness is then found by a
//! bracketed bisection so that the spring physically comes to rest at the
//! requested duration. A spring that is at rest stays at rest, so the search
//! predicate only flips once over the bracket.

use tracing::warn;

use crate::generators::spring::{Physics, Spring, SpringConfig, DEFAULT_MASS};
use crate::generators::Generator;

/// Default perceptual duration in milliseconds
pub const DEFAULT_DURATION_MS: f64 = 800.0;
/// Default perceptual bounce
pub const DEFAULT_BOUNCE: f64 = 0.25;

pub const MIN_DURATION_MS: f64 = 10.0;
pub const MAX_DURATION_MS: f64 = 10_000.0;
pub const MIN_DAMPING_RATIO: f64 = 0.05;
pub const MAX_DAMPING_RATIO: f64 = 1.0;

/// Initial upper bound of the stiffness search
const INITIAL_MAX_STIFFNESS: f64 = 800.0;
/// Stiffness bracket width at which the search stops
const STIFFNESS_TOLERANCE: f64 = 0.05;
/// Iteration budget shared by bracketing and bisection
const MAX_ITERATIONS: u32 = 40;

/// Physical constants for a perceptually configured spring
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpringSolution {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
    /// Clamped duration in milliseconds the constants were solved for
    pub duration: f64,
    /// Always true: springs built from a solution finish at `duration`
    pub resolved_from_duration: bool,
    /// Whether the search narrowed to tolerance within its iteration budget
    pub converged: bool,
    /// Iterations spent bracketing and bisecting
    pub iterations: u32,
}

/// Solve stiffness and damping for a spring from `origin` to `target`
///
/// Uses `duration`, `bounce`, `mass`, `velocity` and the rest thresholds from
/// `config`; physical constants in `config` are ignored. The search is
/// deterministic and always returns its best estimate. When the iteration
/// budget runs out first, `converged` is false.
pub fn find_spring(origin: f64, target: f64, config: &SpringConfig) -> SpringSolution {
    let requested = config.duration.unwrap_or(DEFAULT_DURATION_MS);
    if requested > MAX_DURATION_MS {
        warn!(
            requested,
            max = MAX_DURATION_MS,
            "spring duration must be 10 seconds or less"
        );
    }
    let duration = requested.clamp(MIN_DURATION_MS, MAX_DURATION_MS);
    let bounce = config.bounce.unwrap_or(DEFAULT_BOUNCE);
    let damping_ratio = (1.0 - bounce).clamp(MIN_DAMPING_RATIO, MAX_DAMPING_RATIO);
    let mass = config.mass.unwrap_or(DEFAULT_MASS);

    let damping_for = |stiffness: f64| damping_ratio * 2.0 * (mass * stiffness).sqrt();
    let settles = |stiffness: f64| {
        let spring = Spring::build(
            origin,
            target,
            Physics {
                stiffness,
                damping: damping_for(stiffness),
                mass,
                velocity: config.velocity,
            },
            config.rest_speed,
            config.rest_delta,
            None,
        );
        spring.next(duration).done
    };

    let mut lo = 0.0;
    let mut hi = INITIAL_MAX_STIFFNESS;
    let mut iterations = 0;

    // Widen until the upper bound is stiff enough to rest by `duration`
    while !settles(hi) && iterations < MAX_ITERATIONS {
        lo = hi;
        hi *= 2.0;
        iterations += 1;
    }

    while hi - lo > STIFFNESS_TOLERANCE && iterations < MAX_ITERATIONS {
        let mid = (lo + hi) / 2.0;
        if settles(mid) {
            hi = mid;
        } else {
            lo = mid;
        }
        iterations += 1;
    }

    let converged = hi - lo <= STIFFNESS_TOLERANCE;
    if !converged {
        warn!(
            duration,
            bounce,
            stiffness = hi,
            "spring search did not converge within {} iterations",
            MAX_ITERATIONS
        );
    }

    SpringSolution {
        stiffness: hi,
        damping: damping_for(hi),
        mass,
        duration,
        resolved_from_duration: true,
        converged,
        iterations,
    }
}
