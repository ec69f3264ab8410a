// Historical window domain model - lookback filter applied to the log
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::reading::RawLogPoint;

const HOUR_MS: i64 = 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SeriesWindow {
    #[serde(rename = "6h")]
    SixHours,
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "all")]
    All,
}

impl SeriesWindow {
    /// Lookback in milliseconds, `None` for the unbounded window
    pub fn duration_ms(self) -> Option<i64> {
        match self {
            SeriesWindow::SixHours => Some(6 * HOUR_MS),
            SeriesWindow::Day => Some(24 * HOUR_MS),
            SeriesWindow::Week => Some(7 * 24 * HOUR_MS),
            SeriesWindow::All => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            SeriesWindow::SixHours => "6h",
            SeriesWindow::Day => "24h",
            SeriesWindow::Week => "7d",
            SeriesWindow::All => "all",
        }
    }

    pub fn contains(self, ts: i64, now_ms: i64) -> bool {
        match self.duration_ms() {
            Some(d) => ts >= now_ms.saturating_sub(d),
            None => true,
        }
    }

    pub fn filter(self, points: Vec<RawLogPoint>, now_ms: i64) -> Vec<RawLogPoint> {
        if self == SeriesWindow::All {
            return points;
        }
        points
            .into_iter()
            .filter(|p| self.contains(p.timestamp, now_ms))
            .collect()
    }
}

impl fmt::Display for SeriesWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown window: {0} (expected 6h, 24h, 7d or all)")]
pub struct UnknownWindow(pub String);

impl FromStr for SeriesWindow {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "6h" => Ok(SeriesWindow::SixHours),
            "24h" => Ok(SeriesWindow::Day),
            "7d" => Ok(SeriesWindow::Week),
            "all" => Ok(SeriesWindow::All),
            other => Err(UnknownWindow(other.to_string())),
        }
    }
}
