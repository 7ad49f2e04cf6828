//! Motion error types

use thiserror::Error;

/// Configuration errors raised while building generators and animations
///
/// Every variant is a programmer error surfaced at construction time. Nothing
/// in the per-frame path returns an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// The keyframe sequence was empty
    #[error("Keyframe sequence must contain at least one value")]
    EmptyKeyframes,

    /// Per-segment easing list does not match the number of transitions
    #[error("Expected {expected} easing functions for the keyframe transitions, found {found}")]
    EasingCountMismatch { expected: usize, found: usize },

    /// Offset list does not match the number of keyframes
    #[error("Expected {expected} keyframe times, found {found}")]
    TimesCountMismatch { expected: usize, found: usize },

    /// Offsets must be within 0..=1 and non-decreasing
    #[error("Keyframe times must be non-decreasing values in 0..=1")]
    InvalidTimes,

    /// Duration was negative or not finite
    #[error("Invalid duration: {0}ms")]
    InvalidDuration(f64),

    /// A numeric parameter was NaN or infinite
    #[error("Parameter `{name}` must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },

    /// A numeric parameter that must be strictly positive was not
    #[error("Parameter `{name}` must be greater than zero, got {value}")]
    NonPositiveParameter { name: &'static str, value: f64 },
}

/// Result type for motion construction
pub type Result<T> = std::result::Result<T, MotionError>;

/// Reject NaN and infinite parameters
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MotionError::NonFiniteParameter { name, value })
    }
}

/// Reject non-finite, zero and negative parameters
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<f64> {
    let value = ensure_finite(name, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(MotionError::NonPositiveParameter { name, value })
    }
}

/// Reject negative and non-finite durations
pub(crate) fn ensure_duration(duration_ms: f64) -> Result<f64> {
    if duration_ms.is_finite() && duration_ms >= 0.0 {
        Ok(duration_ms)
    } else {
        Err(MotionError::InvalidDuration(duration_ms))
    }
}
