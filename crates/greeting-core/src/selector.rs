//! Greeting selection by hour of day.
//!
//! The day is split into three buckets: hours before 12 are morning, 12
//! through 17 are afternoon, 18 and later are evening. Each bucket maps to
//! one fixed message.

use greeting_types::GreetingBucket;
use serde::Deserialize;

use crate::clock::Hour;

/// Message shown before noon.
pub const MORNING_GREETING: &str = "Good morning, IT Department!";

/// Message shown from noon until 18:00.
pub const AFTERNOON_GREETING: &str = "Good afternoon, IT Department!";

/// Message shown from 18:00 until midnight.
pub const EVENING_GREETING: &str = "Good evening, IT Department!";

/// First hour of the afternoon bucket.
pub const AFTERNOON_STARTS_AT: u8 = 12;

/// First hour of the evening bucket.
pub const EVENING_STARTS_AT: u8 = 18;

/// Map an hour to its greeting bucket.
pub const fn bucket_for_hour(hour: Hour) -> GreetingBucket {
    let h = hour.get();
    if h < AFTERNOON_STARTS_AT {
        GreetingBucket::Morning
    } else if h < EVENING_STARTS_AT {
        GreetingBucket::Afternoon
    } else {
        GreetingBucket::Evening
    }
}

/// The built-in message for a bucket.
pub const fn default_message(bucket: GreetingBucket) -> &'static str {
    match bucket {
        GreetingBucket::Morning => MORNING_GREETING,
        GreetingBucket::Afternoon => AFTERNOON_GREETING,
        GreetingBucket::Evening => EVENING_GREETING,
    }
}

/// Select the built-in greeting for an hour.
pub const fn select_greeting(hour: Hour) -> &'static str {
    default_message(bucket_for_hour(hour))
}

/// The three greeting texts, one per bucket.
///
/// Deserializes from the `greetings` section of the widget config; missing
/// entries fall back to the built-in messages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GreetingTable {
    /// Text for [`GreetingBucket::Morning`].
    #[serde(default = "default_morning")]
    pub morning: String,

    /// Text for [`GreetingBucket::Afternoon`].
    #[serde(default = "default_afternoon")]
    pub afternoon: String,

    /// Text for [`GreetingBucket::Evening`].
    #[serde(default = "default_evening")]
    pub evening: String,
}

impl GreetingTable {
    /// Return the text configured for `bucket`.
    pub fn message(&self, bucket: GreetingBucket) -> &str {
        match bucket {
            GreetingBucket::Morning => &self.morning,
            GreetingBucket::Afternoon => &self.afternoon,
            GreetingBucket::Evening => &self.evening,
        }
    }

    /// Select the bucket and text for an hour.
    pub fn select(&self, hour: Hour) -> (GreetingBucket, &str) {
        let bucket = bucket_for_hour(hour);
        (bucket, self.message(bucket))
    }
}

impl Default for GreetingTable {
    fn default() -> Self {
        Self {
            morning: default_morning(),
            afternoon: default_afternoon(),
            evening: default_evening(),
        }
    }
}

fn default_morning() -> String {
    MORNING_GREETING.to_owned()
}

fn default_afternoon() -> String {
    AFTERNOON_GREETING.to_owned()
}

fn default_evening() -> String {
    EVENING_GREETING.to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn hour(value: u32) -> Hour {
        Hour::new(value).unwrap()
    }

    #[test]
    fn morning_hours() {
        for h in 0..12 {
            assert_eq!(select_greeting(hour(h)), "Good morning, IT Department!");
        }
    }

    #[test]
    fn afternoon_hours() {
        for h in 12..18 {
            assert_eq!(select_greeting(hour(h)), "Good afternoon, IT Department!");
        }
    }

    #[test]
    fn evening_hours() {
        for h in 18..24 {
            assert_eq!(select_greeting(hour(h)), "Good evening, IT Department!");
        }
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(bucket_for_hour(hour(11)), GreetingBucket::Morning);
        assert_eq!(bucket_for_hour(hour(12)), GreetingBucket::Afternoon);
        assert_eq!(bucket_for_hour(hour(17)), GreetingBucket::Afternoon);
        assert_eq!(bucket_for_hour(hour(18)), GreetingBucket::Evening);
        assert_eq!(bucket_for_hour(Hour::MIDNIGHT), GreetingBucket::Morning);
        assert_eq!(bucket_for_hour(hour(23)), GreetingBucket::Evening);
    }

    #[test]
    fn default_table_matches_constants() {
        let table = GreetingTable::default();
        for h in 0..24 {
            let (bucket, text) = table.select(hour(h));
            assert_eq!(text, default_message(bucket));
            assert_eq!(text, select_greeting(hour(h)));
        }
    }

    #[test]
    fn custom_table_overrides_text() {
        let table = GreetingTable {
            morning: String::from("Morning!"),
            ..GreetingTable::default()
        };
        assert_eq!(table.select(hour(8)), (GreetingBucket::Morning, "Morning!"));
        assert_eq!(
            table.select(hour(13)),
            (GreetingBucket::Afternoon, AFTERNOON_GREETING)
        );
    }
}
