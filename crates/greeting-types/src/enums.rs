//! Enumeration types for the greeting widget.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A time-of-day range that maps to exactly one greeting message.
///
/// The ranges partition the 24-hour day:
/// - `Morning`: hours 0 through 11
/// - `Afternoon`: hours 12 through 17
/// - `Evening`: hours 18 through 23
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum GreetingBucket {
    /// Before noon.
    Morning,
    /// Noon until 18:00.
    Afternoon,
    /// 18:00 until midnight.
    Evening,
}

impl GreetingBucket {
    /// All buckets in the order they occur during a day.
    pub const ALL: [Self; 3] = [Self::Morning, Self::Afternoon, Self::Evening];

    /// Lower-case name used in logs and JSON.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }
}

impl core::fmt::Display for GreetingBucket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
