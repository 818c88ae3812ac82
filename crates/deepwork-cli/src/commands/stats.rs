use chrono::Local;
use clap::Subcommand;
use deepwork_core::{Granularity, MetricsEngine};

use super::{open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Full metrics report
    Report {
        /// day, week or month
        #[arg(long, default_value = "week")]
        granularity: Granularity,
    },
    /// Current and best streak
    Streak,
    /// Deepworks per day over a window
    Series {
        #[arg(long, default_value = "week")]
        granularity: Granularity,
    },
    /// Most and least productive weekday, peak hour
    Peaks,
    /// Projects ranked by completed deepworks
    Projects,
}

pub fn run(action: StatsAction) -> CmdResult {
    let (_, store) = open_store()?;
    let snapshot = store.snapshot()?;
    let engine = MetricsEngine::from_backup(&snapshot, Local::now().date_naive(), Local);

    match action {
        StatsAction::Report { granularity } => print_json(&engine.report(granularity))?,
        StatsAction::Streak => print_json(&engine.streak())?,
        StatsAction::Series { granularity } => print_json(&engine.series(granularity))?,
        StatsAction::Peaks => print_json(&engine.peaks())?,
        StatsAction::Projects => print_json(&engine.project_ranking())?,
    }
    Ok(())
}
