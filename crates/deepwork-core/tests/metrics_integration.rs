//! Integration tests for metrics over stored history.

use chrono::{Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use deepwork_core::metrics::{DayPeriod, Granularity, MetricsEngine, Streak};
use deepwork_core::storage::ProjectTemplate;
use deepwork_core::{merge, Backup, BackupPayload, HistoryEntry, Store};
use proptest::prelude::*;
use serde_json::json;

fn seed() -> ProjectTemplate {
    ProjectTemplate {
        name: "Reading".into(),
        emoji: "📚".into(),
        focus: None,
    }
}

fn entry(id: usize, project_id: &str, at: chrono::DateTime<Utc>, seconds: u64) -> HistoryEntry {
    serde_json::from_value(json!({
        "id": id.to_string(),
        "projectId": project_id,
        "date": at,
        "focusDurationSeconds": seconds
    }))
    .unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_report_over_recorded_sessions() {
    let mut store = Store::open_memory(&seed()).unwrap();
    let mut project = store.current_project().unwrap();
    project.hours_goal = Some(2.0);
    project.planned_duration_days = Some(10);
    project.created_at = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    store.upsert_project(&project).unwrap();

    let morning = |d: u32| Utc.with_ymd_and_hms(2024, 1, d, 9, 0, 0).unwrap();
    for (i, d) in [1, 2, 3].into_iter().enumerate() {
        store.record_session(&entry(i, &project.id, morning(d), 1800)).unwrap();
    }
    store
        .record_session(&entry(9, &project.id, morning(3) + Duration::hours(6), 1800))
        .unwrap();

    let snapshot = store.snapshot().unwrap();
    let report = MetricsEngine::from_backup(&snapshot, day(2024, 1, 3), Utc).report(Granularity::Week);

    assert_eq!(report.streak, Streak { current: 3, best: 3 });
    assert_eq!(report.total_sessions, 4);
    assert_eq!(report.total_focus_seconds, 7200);
    assert_eq!(report.average_focus_seconds_per_day, 2400);
    assert_eq!(report.series.len(), 7);
    assert_eq!(report.series.last().unwrap().deepworks, 2);
    assert_eq!(report.peaks.peak_hour, Some(9));
    assert_eq!(report.peaks.most_active_period, Some(DayPeriod::Morning));

    let stats = &report.projects[0];
    assert_eq!(stats.project_id, project.id);
    assert_eq!(stats.total_deepworks_completed, 4);
    assert_eq!(stats.progress, Some(1.0));
    assert_eq!(stats.days_left, Some(8));

    let later = MetricsEngine::from_backup(&snapshot, day(2024, 1, 5), Utc);
    assert_eq!(later.streak(), Streak { current: 0, best: 3 });
}

#[test]
fn test_timezone_moves_sessions_between_days() {
    let late_evening = Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap();
    let history = vec![
        entry(1, "p", Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(), 600),
        entry(2, "p", late_evening, 600),
    ];
    let utc = MetricsEngine::new(&history, &[], day(2024, 1, 2), Utc);
    assert_eq!(utc.average_focus_seconds_per_day(), 600);

    let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
    let local = MetricsEngine::new(&history, &[], day(2024, 1, 1), new_york);
    assert_eq!(local.average_focus_seconds_per_day(), 1200);
    assert_eq!(local.streak(), Streak { current: 1, best: 1 });
    // 07:00 and 22:00 local tie; the earlier hour wins.
    assert_eq!(local.peaks().peak_hour, Some(7));
    assert_eq!(local.peaks().most_active_period, Some(DayPeriod::Morning));
}

#[test]
fn test_imported_huge_counts_still_summarize() {
    let payload = BackupPayload::parse(
        r#"[
            {"id": "1", "projectId": "p", "date": "2024-01-02T09:00:00Z", "deepworksCompleted": 4000000000},
            {"id": "2", "projectId": "p", "date": "2024-01-02T10:00:00Z", "deepworksCompleted": 4000000000}
        ]"#,
    )
    .unwrap();
    let outcome = merge(&Backup::default(), payload).unwrap();
    let merged = Backup {
        history: outcome.history,
        projects: outcome.projects,
    };

    let report = MetricsEngine::from_backup(&merged, day(2024, 1, 2), Utc).report(Granularity::Day);
    assert_eq!(report.series[0].deepworks, 8_000_000_000);
    assert_eq!(report.peaks.peak_hour, Some(9));
}

proptest! {
    #[test]
    fn best_streak_bounds_current(offsets in prop::collection::vec(0i64..40, 0..25), today in 0i64..45) {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let history: Vec<HistoryEntry> = offsets
            .iter()
            .enumerate()
            .map(|(i, d)| entry(i, "p", base + Duration::days(*d), 60))
            .collect();
        let today = day(2024, 3, 1) + Duration::days(today);
        let engine = MetricsEngine::new(&history, &[], today, Utc);
        let streak = engine.streak();

        prop_assert!(streak.best >= streak.current);
        let active: std::collections::HashSet<_> = offsets.iter().collect();
        prop_assert!(streak.best as usize <= active.len());
        if history.is_empty() {
            prop_assert_eq!(streak, Streak::default());
        } else {
            prop_assert!(streak.best >= 1);
        }
    }

    #[test]
    fn series_never_exceeds_history(offsets in prop::collection::vec(0i64..60, 0..25)) {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let history: Vec<HistoryEntry> = offsets
            .iter()
            .enumerate()
            .map(|(i, d)| entry(i, "p", base + Duration::days(*d), 60))
            .collect();
        let engine = MetricsEngine::new(&history, &[], day(2024, 4, 1), Utc);
        let total: u64 = history.iter().map(|e| u64::from(e.deepworks_completed_this_day)).sum();
        for g in [Granularity::Day, Granularity::Week, Granularity::Month] {
            let series = engine.series(g);
            prop_assert_eq!(series.len() as u64, g.window_days());
            prop_assert!(series.iter().map(|p| p.deepworks).sum::<u64>() <= total);
        }
    }
}
