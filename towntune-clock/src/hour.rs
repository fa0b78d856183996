//! Validated hour-of-day type

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ClockError, Result};

/// An hour of the day in 24-hour form, always within 0..=23
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Hour(u8);

impl Hour {
    /// Midnight
    pub const MIDNIGHT: Hour = Hour(0);

    /// Noon
    pub const NOON: Hour = Hour(12);

    /// Create an hour, rejecting anything outside 0..=23
    pub fn new(hour: i64) -> Result<Self> {
        u8::try_from(hour)
            .ok()
            .filter(|h| *h < 24)
            .map(Hour)
            .ok_or(ClockError::InvalidHour(hour))
    }

    /// Wrap an arbitrary signed hour into 0..=23
    pub fn wrapping(hour: i64) -> Self {
        // rem_euclid(24) is always in 0..24
        Hour(hour.rem_euclid(24) as u8)
    }

    /// Get the raw hour value
    pub fn get(&self) -> u8 {
        self.0
    }

    /// Twelve-hour label such as `12AM`, `9AM` or `2PM`
    pub fn twelve_hour_label(&self) -> String {
        let suffix = if self.0 < 12 { "AM" } else { "PM" };
        let display = match self.0 % 12 {
            0 => 12,
            h => h,
        };
        format!("{}{}", display, suffix)
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Hour {
    type Error = ClockError;

    fn try_from(value: u8) -> Result<Self> {
        Hour::new(i64::from(value))
    }
}

impl From<Hour> for u8 {
    fn from(hour: Hour) -> Self {
        hour.0
    }
}
