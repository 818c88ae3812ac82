use std::collections::BTreeSet;

use chrono::{Datelike, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::model::HistoryEntry;

/// Coarse part of the day an hour falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
}

impl DayPeriod {
    pub fn from_hour(hour: u32) -> Self {
        if hour < 12 {
            DayPeriod::Morning
        } else if hour < 18 {
            DayPeriod::Afternoon
        } else {
            DayPeriod::Evening
        }
    }
}

/// Behavioral peaks. Every field is `None` for an empty history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peaks {
    pub most_productive_day: Option<Weekday>,
    /// Lowest non-zero weekday total.
    pub least_productive_day: Option<Weekday>,
    pub peak_hour: Option<u32>,
    pub most_active_period: Option<DayPeriod>,
}

/// Weekdays indexed from Sunday, matching the week layout front-ends show.
const WEEK: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

pub fn compute_peaks<Tz: TimeZone>(history: &[HistoryEntry], tz: &Tz) -> Peaks {
    if history.is_empty() {
        return Peaks::default();
    }

    let mut by_day = [0u64; 7];
    let mut by_hour = [0u64; 24];
    for entry in history {
        let local = entry.date.with_timezone(tz);
        let deepworks = u64::from(entry.deepworks_completed_this_day);
        let day = &mut by_day[local.weekday().num_days_from_sunday() as usize];
        *day = day.saturating_add(deepworks);
        let hour = &mut by_hour[local.hour() as usize];
        *hour = hour.saturating_add(deepworks);
    }

    let most_productive_day = first_max(&by_day).map(|i| WEEK[i]);
    let least_productive_day = by_day
        .iter()
        .enumerate()
        .filter(|&(_, &total)| total > 0)
        .fold(None::<(usize, u64)>, |best, (i, &total)| match best {
            Some((_, min)) if min <= total => best,
            _ => Some((i, total)),
        })
        .map(|(i, _)| WEEK[i]);
    let peak_hour = first_max(&by_hour).map(|h| h as u32);

    Peaks {
        most_productive_day,
        least_productive_day,
        peak_hour,
        most_active_period: peak_hour.map(DayPeriod::from_hour),
    }
}

/// Index of the largest value; the first one wins ties.
fn first_max(values: &[u64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None::<(usize, u64)>, |best, (i, &v)| match best {
            Some((_, max)) if max >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Sum of focus time, saturating on absurd imported durations.
pub fn total_focus_seconds(history: &[HistoryEntry]) -> u64 {
    history
        .iter()
        .fold(0u64, |acc, e| acc.saturating_add(e.focus_duration_seconds))
}

/// Total focus seconds divided by the number of distinct active days.
pub fn average_focus_seconds_per_day<Tz: TimeZone>(history: &[HistoryEntry], tz: &Tz) -> u64 {
    let days: BTreeSet<_> = history
        .iter()
        .map(|e| e.date.with_timezone(tz).date_naive())
        .collect();
    if days.is_empty() {
        return 0;
    }
    let total = total_focus_seconds(history);
    (total as f64 / days.len() as f64).round() as u64
}
