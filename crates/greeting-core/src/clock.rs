//! Wall-clock hour reading.
//!
//! The updater never stores a time; it asks an [`HourSource`] for the
//! current hour once per invocation. [`LocalClock`] reads the host's local
//! time zone. [`FixedClock`] is a settable source for tests and demos.

use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{Local, Timelike};

/// Number of hours in a day. Valid hours are `0..HOURS_PER_DAY`.
pub const HOURS_PER_DAY: u8 = 24;

/// Errors that can occur when constructing an hour.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The value is not a valid hour of the day.
    #[error("invalid hour {value}: must be in 0..=23")]
    InvalidHour {
        /// The rejected value.
        value: u32,
    },
}

/// An hour of the day in `0..=23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hour(u8);

impl Hour {
    /// 00:00.
    pub const MIDNIGHT: Self = Self(0);

    /// 12:00.
    pub const NOON: Self = Self(12);

    /// Validate and wrap an hour value.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidHour`] if `value` is 24 or more.
    pub fn new(value: u32) -> Result<Self, ClockError> {
        u8::try_from(value)
            .ok()
            .filter(|h| *h < HOURS_PER_DAY)
            .map(Self)
            .ok_or(ClockError::InvalidHour { value })
    }

    /// Return the hour as a plain integer.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for Hour {
    type Error = ClockError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl core::fmt::Display for Hour {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

/// Source of the current hour of the day.
pub trait HourSource: Send + Sync {
    /// Read the current hour.
    fn current_hour(&self) -> Hour;
}

/// Reads the hour from the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl HourSource for LocalClock {
    fn current_hour(&self) -> Hour {
        // chrono guarantees 0..=23 here.
        Hour::new(Local::now().hour()).unwrap_or(Hour::MIDNIGHT)
    }
}

/// A clock frozen at a settable hour.
#[derive(Debug)]
pub struct FixedClock {
    hour: AtomicU8,
}

impl FixedClock {
    /// Create a clock that reports `hour` until changed.
    pub const fn new(hour: Hour) -> Self {
        Self {
            hour: AtomicU8::new(hour.get()),
        }
    }

    /// Change the reported hour.
    pub fn set(&self, hour: Hour) {
        self.hour.store(hour.get(), Ordering::Release);
    }
}

impl HourSource for FixedClock {
    fn current_hour(&self) -> Hour {
        Hour(self.hour.load(Ordering::Acquire))
    }
}
