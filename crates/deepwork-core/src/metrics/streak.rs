use std::collections::BTreeSet;

use chrono::{Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::model::HistoryEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    /// Consecutive days ending today or yesterday.
    pub current: u32,
    /// Longest run of consecutive days anywhere in the history.
    pub best: u32,
}

/// Distinct local calendar days with at least one entry.
pub fn active_days<Tz: TimeZone>(history: &[HistoryEntry], tz: &Tz) -> BTreeSet<NaiveDate> {
    history
        .iter()
        .map(|e| e.date.with_timezone(tz).date_naive())
        .collect()
}

pub fn compute_streak<Tz: TimeZone>(history: &[HistoryEntry], today: NaiveDate, tz: &Tz) -> Streak {
    let days: Vec<NaiveDate> = active_days(history, tz).into_iter().rev().collect();
    let Some(&latest) = days.first() else {
        return Streak::default();
    };

    let yesterday = today.checked_sub_days(Days::new(1));
    let current = if latest == today || Some(latest) == yesterday {
        1 + days
            .windows(2)
            .take_while(|w| is_previous_day(w[1], w[0]))
            .count() as u32
    } else {
        0
    };

    let mut best = 1;
    let mut run = 1;
    for w in days.windows(2) {
        if is_previous_day(w[1], w[0]) {
            run += 1;
        } else {
            run = 1;
        }
        best = best.max(run);
    }

    Streak {
        current,
        best: best.max(current),
    }
}

fn is_previous_day(earlier: NaiveDate, later: NaiveDate) -> bool {
    later.signed_duration_since(earlier).num_days() == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn on(day: &str) -> HistoryEntry {
        serde_json::from_value(json!({
            "id": day,
            "projectId": "p1",
            "date": format!("{day}T10:00:00Z")
        }))
        .unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn empty_history_has_no_streak() {
        assert_eq!(compute_streak(&[], date("2024-01-03"), &Utc), Streak::default());
    }

    #[test]
    fn streak_ending_today() {
        let history = vec![on("2024-01-01"), on("2024-01-02"), on("2024-01-03")];
        let s = compute_streak(&history, date("2024-01-03"), &Utc);
        assert_eq!(s, Streak { current: 3, best: 3 });
    }

    #[test]
    fn streak_ending_yesterday_still_counts() {
        let history = vec![on("2024-01-01"), on("2024-01-02")];
        let s = compute_streak(&history, date("2024-01-03"), &Utc);
        assert_eq!(s, Streak { current: 2, best: 2 });
    }

    #[test]
    fn gap_breaks_current_but_not_best() {
        let history = vec![on("2024-01-01"), on("2024-01-02"), on("2024-01-03")];
        let s = compute_streak(&history, date("2024-01-05"), &Utc);
        assert_eq!(s, Streak { current: 0, best: 3 });
    }

    #[test]
    fn best_run_in_the_middle_of_disjoint_runs() {
        let history = vec![
            on("2024-01-01"),
            on("2024-01-03"),
            on("2024-01-04"),
            on("2024-01-05"),
            on("2024-01-06"),
            on("2024-01-09"),
            on("2024-01-10"),
        ];
        let s = compute_streak(&history, date("2024-01-10"), &Utc);
        assert_eq!(s, Streak { current: 2, best: 4 });
    }

    #[test]
    fn oldest_run_is_longest() {
        let history = vec![
            on("2024-01-01"),
            on("2024-01-02"),
            on("2024-01-03"),
            on("2024-01-04"),
            on("2024-01-08"),
        ];
        let s = compute_streak(&history, date("2024-01-08"), &Utc);
        assert_eq!(s, Streak { current: 1, best: 4 });
    }

    #[test]
    fn several_entries_on_one_day_count_once() {
        let mut second = on("2024-01-03");
        second.id = "other".into();
        let history = vec![on("2024-01-03"), second];
        let s = compute_streak(&history, date("2024-01-03"), &Utc);
        assert_eq!(s, Streak { current: 1, best: 1 });
    }

    #[test]
    fn local_timezone_decides_the_day() {
        let late: HistoryEntry = serde_json::from_value(json!({
            "id": "e1",
            "projectId": "p1",
            "date": "2024-01-02T02:00:00Z"
        }))
        .unwrap();
        let minus_five = chrono::FixedOffset::west_opt(5 * 3600).unwrap();
        let days = active_days(&[late], &minus_five);
        assert_eq!(days.into_iter().collect::<Vec<_>>(), vec![date("2024-01-01")]);
    }
}
