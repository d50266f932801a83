//! Candle intervals and wall-clock alignment of rebalance ticks.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Length of one candle window. Ticks fire when a window closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "1d")]
    D1,
}

impl Interval {
    pub fn seconds(self) -> u64 {
        match self {
            Interval::M1 => 60,
            Interval::M5 => 5 * 60,
            Interval::M15 => 15 * 60,
            Interval::M30 => 30 * 60,
            Interval::H1 => 3600,
            Interval::H2 => 2 * 3600,
            Interval::H4 => 4 * 3600,
            Interval::H6 => 6 * 3600,
            Interval::H12 => 12 * 3600,
            Interval::D1 => 24 * 3600,
        }
    }

    /// Time from `now` until the current window closes.
    ///
    /// Windows are aligned to the Unix epoch, like exchange klines. Standing
    /// exactly on a boundary waits for the whole next window.
    pub fn until_next_close(self, now: DateTime<Utc>) -> Duration {
        let period = self.seconds() as i64;
        let elapsed = now.timestamp().rem_euclid(period);
        let remaining = Duration::from_secs((period - elapsed) as u64);
        remaining.saturating_sub(Duration::from_nanos(u64::from(now.timestamp_subsec_nanos())))
    }

    fn as_str(self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1h",
            Interval::H2 => "2h",
            Interval::H4 => "4h",
            Interval::H6 => "6h",
            Interval::H12 => "12h",
            Interval::D1 => "1d",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
