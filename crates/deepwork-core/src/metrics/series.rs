use std::collections::HashMap;

use chrono::{Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::model::HistoryEntry;

/// Chart granularity. Each maps to a trailing window of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn window_days(self) -> u64 {
        match self {
            Granularity::Day => 1,
            Granularity::Week => 7,
            Granularity::Month => 30,
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            other => Err(format!("unknown granularity '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub deepworks: u64,
}

/// One point per day of the window ending `today`, oldest first.
pub fn deepwork_series<Tz: TimeZone>(
    history: &[HistoryEntry],
    granularity: Granularity,
    today: NaiveDate,
    tz: &Tz,
) -> Vec<SeriesPoint> {
    let mut per_day: HashMap<NaiveDate, u64> = HashMap::new();
    for entry in history {
        let total = per_day
            .entry(entry.date.with_timezone(tz).date_naive())
            .or_default();
        *total = total.saturating_add(u64::from(entry.deepworks_completed_this_day));
    }

    let window = granularity.window_days();
    (0..window)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|date| SeriesPoint {
            date,
            deepworks: per_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}
