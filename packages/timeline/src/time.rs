//! # Rational Time
//!
//! Exact fractional timestamps: a `RationalTime` is `value / rate` seconds.
//!
//! Arithmetic between values with different rates rescales the right-hand
//! operand to the left-hand rate before combining, so the result always
//! carries the rate of the left operand.

use crate::error::TimeError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

/// A timestamp of `value` frames at `rate` frames per second
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RationalTime {
    pub value: f64,
    pub rate: f64,
}

impl RationalTime {
    /// Build a time without validation. `rate` must be positive.
    pub const fn new(value: f64, rate: f64) -> Self {
        Self { value, rate }
    }

    /// Build a time, rejecting non-positive or non-finite rates
    pub fn try_new(value: f64, rate: f64) -> Result<Self, TimeError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(TimeError::InvalidRate(rate));
        }
        if !value.is_finite() {
            return Err(TimeError::InvalidValue(value));
        }
        Ok(Self { value, rate })
    }

    pub const fn zero(rate: f64) -> Self {
        Self { value: 0.0, rate }
    }

    pub fn from_seconds(seconds: f64, rate: f64) -> Self {
        Self {
            value: seconds * rate,
            rate,
        }
    }

    pub fn to_seconds(&self) -> f64 {
        self.value / self.rate
    }

    /// Nearest whole frame at this time's own rate
    pub fn to_frames(&self) -> i64 {
        self.value.round() as i64
    }

    pub fn is_valid(&self) -> bool {
        self.rate.is_finite() && self.rate > 0.0 && self.value.is_finite()
    }

    /// Express this time at `new_rate`. The frame value may become fractional.
    pub fn rescaled_to(&self, new_rate: f64) -> Self {
        if self.rate == new_rate {
            return *self;
        }
        Self {
            value: self.value * new_rate / self.rate,
            rate: new_rate,
        }
    }

    /// Clamp into `[min, max]` by seconds. A clamped result is the bound
    /// rescaled to this time's rate.
    pub fn clamp(&self, min: RationalTime, max: RationalTime) -> Self {
        if self.compare(&min) == Ordering::Less {
            min.rescaled_to(self.rate)
        } else if self.compare(&max) == Ordering::Greater {
            max.rescaled_to(self.rate)
        } else {
            *self
        }
    }

    /// Order by seconds, regardless of rate
    pub fn compare(&self, other: &RationalTime) -> Ordering {
        self.to_seconds().total_cmp(&other.to_seconds())
    }

    /// True when both times denote the same instant (up to float precision)
    pub fn is_equivalent(&self, other: &RationalTime) -> bool {
        (self.to_seconds() - other.to_seconds()).abs() < 1e-9
    }

    /// Format as `HH:MM:SS:FF` at the nearest integral rate
    pub fn to_timecode(&self) -> String {
        let fps = (self.rate.round() as i64).max(1);
        let total = self.to_frames();
        let sign = if total < 0 { "-" } else { "" };
        let total = total.abs();

        let frames = total % fps;
        let total_seconds = total / fps;
        let seconds = total_seconds % 60;
        let minutes = (total_seconds / 60) % 60;
        let hours = total_seconds / 3600;

        format!("{sign}{hours:02}:{minutes:02}:{seconds:02}:{frames:02}")
    }
}

impl Add for RationalTime {
    type Output = RationalTime;

    fn add(self, rhs: RationalTime) -> RationalTime {
        let rhs = rhs.rescaled_to(self.rate);
        RationalTime::new(self.value + rhs.value, self.rate)
    }
}

impl Sub for RationalTime {
    type Output = RationalTime;

    fn sub(self, rhs: RationalTime) -> RationalTime {
        let rhs = rhs.rescaled_to(self.rate);
        RationalTime::new(self.value - rhs.value, self.rate)
    }
}

impl fmt::Display for RationalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_timecode())
    }
}

/// A start time plus a duration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_time: RationalTime,
    pub duration: RationalTime,
}

impl TimeRange {
    pub const fn new(start_time: RationalTime, duration: RationalTime) -> Self {
        Self {
            start_time,
            duration,
        }
    }

    /// Range of `duration` frames starting at frame `start`, both at `rate`
    pub const fn from_frames(start: f64, duration: f64, rate: f64) -> Self {
        Self {
            start_time: RationalTime::new(start, rate),
            duration: RationalTime::new(duration, rate),
        }
    }

    /// First instant after the range, at the start time's rate
    pub fn end_time_exclusive(&self) -> RationalTime {
        self.start_time + self.duration
    }

    pub fn is_valid(&self) -> bool {
        self.start_time.is_valid() && self.duration.is_valid()
    }
}
