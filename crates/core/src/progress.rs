//! Progress fraction computation for the poll loop.
//!
//! Fractions reported to the caller stay in `[0, 1]` and never decrease
//! within one generation.

/// Scale of backend-reported progress values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ProgressScale {
    /// Values are fractions in `[0, 1)`.
    #[default]
    Fraction,
    /// Values are percentages in `[0, 100]`.
    Percent,
}

impl ProgressScale {
    /// Scale implied by a single value: `1` and above reads as a percentage.
    pub fn of(value: f64) -> Self {
        if value >= 1.0 {
            Self::Percent
        } else {
            Self::Fraction
        }
    }
}

/// Normalize a backend-reported progress value on `scale` to a fraction.
///
/// Non-finite values are discarded.
pub fn normalize_reported(value: f64, scale: ProgressScale) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let fraction = match scale {
        ProgressScale::Fraction => value,
        ProgressScale::Percent => value / 100.0,
    };
    Some(fraction.clamp(0.0, 1.0))
}

/// Fraction derived from the attempt counter alone.
pub fn attempt_ratio(attempt: u32, max_attempts: u32) -> f64 {
    if max_attempts == 0 {
        return 0.0;
    }
    (f64::from(attempt) / f64::from(max_attempts)).clamp(0.0, 1.0)
}

/// Tracks the last fraction handed to the caller.
///
/// Once any reported value reads as a percentage, every later value of the
/// same generation is read as one too.
#[derive(Debug, Default, Clone)]
pub struct ProgressTracker {
    last: f64,
    scale: ProgressScale,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction to report for this tick.
    ///
    /// Prefers the backend value and falls back to the attempt ratio. The
    /// result is never lower than the previous one.
    pub fn next(&mut self, reported: Option<f64>, attempt: u32, max_attempts: u32) -> f64 {
        let reported = reported.filter(|v| v.is_finite());
        if let Some(value) = reported {
            if ProgressScale::of(value) == ProgressScale::Percent {
                self.scale = ProgressScale::Percent;
            }
        }

        let fraction = reported
            .and_then(|v| normalize_reported(v, self.scale))
            .unwrap_or_else(|| attempt_ratio(attempt, max_attempts));
        self.last = self.last.max(fraction);
        self.last
    }

    pub fn last(&self) -> f64 {
        self.last
    }

    pub fn scale(&self) -> ProgressScale {
        self.scale
    }
}
