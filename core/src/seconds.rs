//! Serde adapter that stores a [`Duration`] as fractional seconds.
//!
//! Level files are written by hand, so `time_limit = 15` or `start = 6.5`
//! reads better than a `{ secs, nanos }` table.

use std::time::Duration;

use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

/// Serializes the duration as a floating point number of seconds.
pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(value.as_secs_f64())
}

/// Deserializes a non-negative, finite number of seconds.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(seconds)
        .map_err(|error| D::Error::custom(format!("invalid duration {seconds}s: {error}")))
}
