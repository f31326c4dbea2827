//! Shared animation timing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default expand/collapse duration
pub const DEFAULT_DURATION: Duration = Duration::from_millis(300);

/// Timing curve applied to the linear elapsed fraction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolator {
    /// Constant speed
    Linear,
    /// Material standard curve, cubic-bezier(0.4, 0, 0.2, 1)
    #[default]
    FastOutSlowIn,
}

impl Interpolator {
    /// Map an elapsed fraction in `[0, 1]` to an animation progress
    ///
    /// Inputs outside the range are clamped.
    #[must_use]
    pub fn interpolate(self, fraction: f32) -> f32 {
        let fraction = fraction.clamp(0.0, 1.0);
        match self {
            Self::Linear => fraction,
            Self::FastOutSlowIn => cubic_bezier(0.4, 0.0, 0.2, 1.0, fraction),
        }
    }
}

impl fmt::Display for Interpolator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::FastOutSlowIn => write!(f, "fast_out_slow_in"),
        }
    }
}

/// Error parsing an [`Interpolator`] name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown interpolator: {0}")]
pub struct ParseInterpolatorError(pub String);

impl FromStr for Interpolator {
    type Err = ParseInterpolatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "fast_out_slow_in" | "fast-out-slow-in" => Ok(Self::FastOutSlowIn),
            other => Err(ParseInterpolatorError(other.to_string())),
        }
    }
}

/// One point on a cubic bezier from (0,0) to (1,1)
fn bezier(p1: f32, p2: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
}

/// Solve the curve for `x` by bisection, then evaluate `y`
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    for _ in 0..32 {
        let mid = (lo + hi) / 2.0;
        if bezier(x1, x2, mid) < x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    bezier(y1, y2, (lo + hi) / 2.0)
}

/// Duration and curve shared by every sub-animation of a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Length of every sub-animation
    pub duration: Duration,
    /// Curve applied to all of them
    pub interpolator: Interpolator,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            interpolator: Interpolator::default(),
        }
    }
}

impl AnimationConfig {
    /// Create a config
    #[must_use]
    pub const fn new(duration: Duration, interpolator: Interpolator) -> Self {
        Self {
            duration,
            interpolator,
        }
    }

    /// Linear fraction of the duration covered by `elapsed`, clamped to 1
    #[must_use]
    pub fn fraction(&self, elapsed: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        #[allow(clippy::cast_possible_truncation)]
        let fraction = (elapsed.as_secs_f64() / self.duration.as_secs_f64()) as f32;
        fraction.min(1.0)
    }

    /// Interpolated progress after `elapsed`
    #[must_use]
    pub fn progress(&self, elapsed: Duration) -> f32 {
        self.interpolator.interpolate(self.fraction(elapsed))
    }

    /// Staleness window for replaying queued edit presses
    #[must_use]
    pub fn replay_window(&self) -> Duration {
        self.duration / 2
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn curves_hit_both_ends() {
        for interpolator in [Interpolator::Linear, Interpolator::FastOutSlowIn] {
            assert!(interpolator.interpolate(0.0).abs() < 1e-4);
            assert!((interpolator.interpolate(1.0) - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn fast_out_slow_in_leads_linear() {
        let eased = Interpolator::FastOutSlowIn.interpolate(0.5);
        assert!(eased > 0.5, "got {eased}");
        assert!(eased < 1.0);
    }

    #[test]
    fn parse_names() {
        assert_eq!("linear".parse::<Interpolator>().unwrap(), Interpolator::Linear);
        assert_eq!(
            " Fast_Out_Slow_In ".parse::<Interpolator>().unwrap(),
            Interpolator::FastOutSlowIn
        );
        assert!("bounce".parse::<Interpolator>().is_err());
        assert_eq!(
            Interpolator::FastOutSlowIn
                .to_string()
                .parse::<Interpolator>()
                .unwrap(),
            Interpolator::FastOutSlowIn
        );
    }

    #[test]
    fn fraction_clamps_and_handles_zero_duration() {
        let config = AnimationConfig::new(Duration::from_millis(200), Interpolator::Linear);
        assert!((config.fraction(Duration::from_millis(50)) - 0.25).abs() < 1e-6);
        assert!((config.fraction(Duration::from_secs(5)) - 1.0).abs() < f32::EPSILON);

        let instant = AnimationConfig::new(Duration::ZERO, Interpolator::Linear);
        assert!((instant.progress(Duration::ZERO) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn replay_window_is_half_the_duration() {
        assert_eq!(
            AnimationConfig::default().replay_window(),
            Duration::from_millis(150)
        );
    }
}
