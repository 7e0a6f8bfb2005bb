//! Query windows for the bill page endpoint.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire format of `timeS` / `timeE`.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which days a run looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowStrategy {
    /// Today only.
    Today,
    /// Yesterday 00:00:00 through today 23:59:59. Catches bills that changed status
    /// after the previous run.
    #[default]
    SinceYesterday,
}

impl fmt::Display for WindowStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowStrategy::Today => f.write_str("today"),
            WindowStrategy::SinceYesterday => f.write_str("since-yesterday"),
        }
    }
}

impl FromStr for WindowStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(WindowStrategy::Today),
            "since-yesterday" | "yesterday" => Ok(WindowStrategy::SinceYesterday),
            other => Err(format!(
                "unknown window '{other}' (expected 'today' or 'since-yesterday')"
            )),
        }
    }
}

/// Inclusive start/end of a bill query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateWindow {
    /// Build the window for `strategy` relative to the local calendar day `today`.
    pub fn resolve(strategy: WindowStrategy, today: NaiveDate) -> Self {
        let first_day = match strategy {
            WindowStrategy::Today => today,
            WindowStrategy::SinceYesterday => today - Duration::days(1),
        };
        Self {
            start: first_day.and_time(NaiveTime::MIN),
            end: today.and_time(NaiveTime::MIN) + Duration::seconds(86_399),
        }
    }

    pub fn time_s(&self) -> String {
        self.start.format(TIME_FORMAT).to_string()
    }

    pub fn time_e(&self) -> String {
        self.end.format(TIME_FORMAT).to_string()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.time_s(), self.time_e())
    }
}
