//! Lap time stored as hundredths of a second, written as `mm:ss.hh`

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LapTime {
    hundredths: u32,
}

impl LapTime {
    pub fn from_hundredths(hundredths: u32) -> Self {
        Self { hundredths }
    }

    /// Truncates to whole hundredths, like the lap timer display does
    pub fn from_duration(elapsed: Duration) -> Self {
        let hundredths = elapsed.as_millis() / 10;
        Self {
            hundredths: u32::try_from(hundredths).unwrap_or(u32::MAX),
        }
    }

    pub fn as_hundredths(self) -> u32 {
        self.hundredths
    }

    pub fn minutes(self) -> u32 {
        self.hundredths / 6000
    }

    pub fn seconds(self) -> u32 {
        (self.hundredths % 6000) / 100
    }

    pub fn fraction(self) -> u32 {
        self.hundredths % 100
    }
}

impl fmt::Display for LapTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}.{:02}", self.minutes(), self.seconds(), self.fraction())
    }
}

impl FromStr for LapTime {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (minutes, rest) = s
            .trim()
            .split_once(':')
            .with_context(|| format!("lap time '{s}' is missing ':'"))?;
        let (seconds, fraction) = rest
            .split_once('.')
            .with_context(|| format!("lap time '{s}' is missing '.'"))?;

        if fraction.len() != 2 {
            bail!("lap time '{s}' must have exactly two fractional digits");
        }

        let minutes: u32 = minutes.parse().with_context(|| format!("invalid minutes in '{s}'"))?;
        let seconds: u32 = seconds.parse().with_context(|| format!("invalid seconds in '{s}'"))?;
        let fraction: u32 = fraction.parse().with_context(|| format!("invalid hundredths in '{s}'"))?;

        if seconds >= 60 {
            bail!("lap time '{s}' has {seconds} seconds");
        }

        let hundredths = minutes
            .checked_mul(6000)
            .and_then(|m| m.checked_add(seconds * 100 + fraction))
            .with_context(|| format!("lap time '{s}' is too long"))?;
        Ok(Self { hundredths })
    }
}

impl Serialize for LapTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LapTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
