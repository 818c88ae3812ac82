//! Session flow commands.
//!
//! Every invocation resumes the working state saved in the store, applies one
//! action and saves it again. Countdowns advance only through `tick` and
//! `run`, one logical second per tick.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use clap::Subcommand;
use deepwork_core::backup::{event_log_file_name, export_events};
use deepwork_core::storage::{MoodDisplay, MoodPreset};
use deepwork_core::{
    Event, EvidenceType, Mood, MoodPresets, SessionFlowController, SessionWorkingState, Stage,
    Store,
};
use serde::Serialize;

use super::{open_store, print_json, CmdResult};

const SESSION_KEY: &str = "session_state";

#[derive(Subcommand)]
pub enum SessionAction {
    /// Begin a new day at mood selection
    Start,
    /// List selectable moods with their presets
    Moods,
    /// Select today's mood
    Mood {
        /// Mood id (e.g. "ready", "flow")
        mood: String,
    },
    /// Set how many deepworks to do today and start the warmup
    Count {
        count: u32,
    },
    /// Add a guiding question
    Question {
        text: String,
    },
    /// Start the focus countdown
    Focus,
    /// Mark the current question answered
    Complete,
    /// Write the synthesis of this session
    Synthesis {
        /// Explanation of what was learned
        explanation: String,
        /// Concept still unclear (repeatable)
        #[arg(long = "stuck-on")]
        stuck_on: Vec<String>,
    },
    /// Attach evidence and record the session
    Evidence {
        /// Evidence type: screenshot, link, flashcard, audio
        #[arg(long = "type")]
        kind: Option<String>,
        /// Evidence content
        #[arg(default_value = "")]
        content: String,
    },
    /// Start the next planned deepwork
    Next,
    /// Start one deepwork beyond today's target
    Extra,
    /// Finish the day
    Finish,
    /// Abandon the current session and go back to the start
    Restart,
    /// Print the current session state as JSON
    Status,
    /// Advance the running countdown
    Tick {
        #[arg(long, default_value = "1")]
        seconds: u64,
    },
    /// Run the active countdown in real time until it ends
    Run,
    /// Export this day's event log as JSON
    ExportLog {
        /// Output file (defaults to deepwork-logs-<date>.json)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct SessionStatus<'a> {
    stage: Stage,
    mood: Option<&'a Mood>,
    deepwork_index: u32,
    deepwork_target: u32,
    questions: &'a [String],
    current_question: Option<&'a str>,
    questions_answered: usize,
    remaining_secs: Option<u64>,
    can_add_extra: bool,
    preset: MoodPreset,
}

#[derive(Serialize)]
struct MoodOption<'a> {
    #[serde(flatten)]
    display: &'a MoodDisplay,
    preset: Option<MoodPreset>,
}

fn load_flow(
    store: &Store,
    presets: &MoodPresets,
) -> Result<SessionFlowController, Box<dyn std::error::Error>> {
    if let Some(json) = store.kv_get(SESSION_KEY)? {
        match serde_json::from_str::<SessionWorkingState>(&json) {
            Ok(state) => return Ok(SessionFlowController::resume(state, presets.clone())),
            Err(e) => tracing::warn!("discarding unreadable session state: {e}"),
        }
    }
    Ok(SessionFlowController::new(presets.clone()))
}

fn save_flow(store: &Store, flow: &SessionFlowController) -> CmdResult {
    let json = serde_json::to_string(flow.state())?;
    store.kv_set(SESSION_KEY, &json)?;
    Ok(())
}

fn status(flow: &SessionFlowController) -> SessionStatus<'_> {
    let state = flow.state();
    let current_question = (state.stage == Stage::Focus)
        .then(|| state.questions.get(state.current_question))
        .flatten()
        .map(String::as_str);
    SessionStatus {
        stage: state.stage,
        mood: state.mood.as_ref(),
        deepwork_index: state.deepwork_index,
        deepwork_target: state.deepwork_target,
        questions: &state.questions,
        current_question,
        questions_answered: state.completed_questions.len(),
        remaining_secs: flow.remaining_secs(),
        can_add_extra: flow.can_add_extra(),
        preset: flow.preset(),
    }
}

pub fn run(action: SessionAction) -> CmdResult {
    let (config, mut store) = open_store()?;
    let presets = config.mood_presets();
    let mut flow = load_flow(&store, &presets)?;

    match action {
        SessionAction::Start => {
            let event = flow.start()?;
            print_json(&event)?;
        }
        SessionAction::Moods => {
            let options: Vec<MoodOption<'_>> = config
                .mood_display
                .iter()
                .map(|display| MoodOption {
                    display,
                    preset: presets.get(&Mood::from(display.id.as_str())),
                })
                .collect();
            print_json(&options)?;
        }
        SessionAction::Mood { mood } => {
            let event = flow.select_mood(Mood::from(mood))?;
            print_json(&event)?;
        }
        SessionAction::Count { count } => {
            if !config.count_options.contains(&count) {
                return Err(format!("count must be one of {:?}", config.count_options).into());
            }
            flow.configure_count(count)?;
            print_json(&status(&flow))?;
        }
        SessionAction::Question { text } => {
            flow.add_question(&text)?;
            print_json(&status(&flow))?;
        }
        SessionAction::Focus => {
            flow.begin_focus()?;
            print_json(&status(&flow))?;
        }
        SessionAction::Complete => match flow.complete_current_question()? {
            Some(event) => print_json(&event)?,
            None => print_json(&status(&flow))?,
        },
        SessionAction::Synthesis {
            explanation,
            stuck_on,
        } => {
            flow.submit_synthesis(&explanation, stuck_on)?;
            print_json(&status(&flow))?;
        }
        SessionAction::Evidence { kind, content } => {
            let kind = kind.map(EvidenceType::from);
            let entry = flow.submit_evidence(&mut store, kind, &content)?;
            print_json(&entry)?;
        }
        SessionAction::Next => {
            flow.next_deepwork()?;
            print_json(&status(&flow))?;
        }
        SessionAction::Extra => {
            flow.extra_deepwork()?;
            print_json(&status(&flow))?;
        }
        SessionAction::Finish => {
            flow.finish_day()?;
            print_json(&status(&flow))?;
        }
        SessionAction::Restart => {
            flow.restart();
            print_json(&status(&flow))?;
        }
        SessionAction::Status => {
            print_json(&status(&flow))?;
        }
        SessionAction::Tick { seconds } => {
            for event in tick_for(&mut flow, seconds) {
                print_json(&event)?;
            }
            print_json(&status(&flow))?;
        }
        SessionAction::Run => {
            if flow.active_timer().is_none() {
                return Err(format!("no countdown running in stage {}", flow.stage()).into());
            }
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()?;
            runtime.block_on(run_countdown(&store, &presets))?;
            // The loop saved its own progress; reload so the final save below
            // does not overwrite it.
            flow = load_flow(&store, &presets)?;
            print_json(&status(&flow))?;
        }
        SessionAction::ExportLog { out } => {
            let json = export_events(flow.events())?;
            let path = out.unwrap_or_else(|| {
                PathBuf::from(event_log_file_name(Local::now().date_naive()))
            });
            std::fs::write(&path, json)?;
            println!("{}", path.display());
        }
    }

    save_flow(&store, &flow)?;
    Ok(())
}

/// Deliver up to `seconds` ticks to whatever countdown is active.
fn tick_for(flow: &mut SessionFlowController, seconds: u64) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..seconds {
        let Some(token) = flow.active_timer() else {
            break;
        };
        events.extend(flow.tick(token));
    }
    events
}

/// Tick once per wall-clock second until the active countdown ends.
///
/// The state is reloaded before every tick, so actions taken from another
/// shell in the meantime (such as completing the last question) win and the
/// stale countdown simply stops.
async fn run_countdown(store: &Store, presets: &MoodPresets) -> CmdResult {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.tick().await;
    let Some(started) = load_flow(store, presets)?.active_timer() else {
        return Ok(());
    };

    loop {
        interval.tick().await;
        let mut flow = load_flow(store, presets)?;
        let event = flow.tick(started);
        save_flow(store, &flow)?;

        if let Some(event) = event {
            eprintln!();
            print_json(&event)?;
            return Ok(());
        }
        match flow.remaining_secs().filter(|_| flow.active_timer() == Some(started)) {
            Some(remaining) => {
                eprint!("\r{} {:02}:{:02} ", flow.stage(), remaining / 60, remaining % 60);
            }
            None => {
                eprintln!();
                tracing::info!(stage = %flow.stage(), "countdown superseded");
                return Ok(());
            }
        }
    }
}
