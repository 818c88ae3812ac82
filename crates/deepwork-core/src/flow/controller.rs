//! Session flow controller implementation.
//!
//! The controller is a single-owner state machine. Every user action is a
//! method that checks the current [`Stage`] first and fails with
//! `InvalidState` when called out of order, so a misbehaving front-end cannot
//! silently skip a step. Countdown expiry and the "all questions answered"
//! shortcut are the only transitions not triggered by a user action.
//!
//! ## Usage
//!
//! ```ignore
//! let mut flow = SessionFlowController::new(config.mood_presets());
//! flow.start()?;
//! flow.select_mood(Mood::Ready)?;
//! flow.configure_count(2)?;
//! while let Some(token) = flow.active_timer() {
//!     flow.tick(token); // once per second
//! }
//! ```

use std::collections::BTreeSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::countdown::{CountdownTimer, TickOutcome, TimerToken};
use super::stage::Stage;
use super::SessionSink;
use crate::error::{CoreError, Result, ValidationError};
use crate::events::{content_preview, Event};
use crate::model::{Evidence, EvidenceType, HistoryEntry, Mood, Synthesis};
use crate::storage::{MoodPreset, MoodPresets};

/// Used when the selected mood has no preset at all.
const FALLBACK_PRESET: MoodPreset = MoodPreset::new(2, 120, 1500);

/// Transient state of one deepwork day. Never persisted as history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionWorkingState {
    pub stage: Stage,
    pub mood: Option<Mood>,
    /// 1-based number of the current session within the day.
    pub deepwork_index: u32,
    pub deepwork_target: u32,
    pub questions: Vec<String>,
    pub completed_questions: BTreeSet<usize>,
    pub current_question: usize,
    /// Focus time actually spent in the current session.
    pub focus_seconds: u64,
    pub synthesis: Option<Synthesis>,
    pub evidence: Option<Evidence>,
    pub events: Vec<Event>,
    timer: CountdownTimer,
    #[serde(default)]
    last_entry_ms: i64,
}

impl Default for SessionWorkingState {
    fn default() -> Self {
        Self {
            stage: Stage::Entry,
            mood: None,
            deepwork_index: 1,
            deepwork_target: 1,
            questions: Vec::new(),
            completed_questions: BTreeSet::new(),
            current_question: 0,
            focus_seconds: 0,
            synthesis: None,
            evidence: None,
            events: Vec::new(),
            timer: CountdownTimer::new(),
            last_entry_ms: 0,
        }
    }
}

impl SessionWorkingState {
    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    pub fn all_questions_completed(&self) -> bool {
        !self.questions.is_empty() && self.completed_questions.len() >= self.questions.len()
    }
}

/// Drives one deepwork day through its stages.
#[derive(Debug, Clone)]
pub struct SessionFlowController {
    state: SessionWorkingState,
    presets: MoodPresets,
}

impl SessionFlowController {
    /// Start at the entry stage.
    pub fn new(presets: MoodPresets) -> Self {
        Self::resume(SessionWorkingState::default(), presets)
    }

    /// Continue from a previously saved state.
    pub fn resume(state: SessionWorkingState, presets: MoodPresets) -> Self {
        Self { state, presets }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionWorkingState {
        &self.state
    }

    pub fn into_state(self) -> SessionWorkingState {
        self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn events(&self) -> &[Event] {
        &self.state.events
    }

    /// Token of the running countdown, if the stage has one.
    pub fn active_timer(&self) -> Option<TimerToken> {
        self.state.timer.token()
    }

    pub fn remaining_secs(&self) -> Option<u64> {
        self.state.timer.remaining_secs()
    }

    /// Preset for the selected mood.
    pub fn preset(&self) -> MoodPreset {
        self.state
            .mood
            .as_ref()
            .and_then(|m| self.presets.get(m))
            .unwrap_or(FALLBACK_PRESET)
    }

    /// Whether `extra_deepwork` is available.
    pub fn can_add_extra(&self) -> bool {
        self.state.stage == Stage::Completed
            && self.state.deepwork_index >= self.state.deepwork_target
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Result<Event> {
        self.expect_stage("start", &[Stage::Entry])?;
        let event = Event::SessionStart { at: Utc::now() };
        self.state.events.push(event.clone());
        self.enter(Stage::MoodSelect);
        Ok(event)
    }

    /// Record the mood and take its suggested deepwork count as the target.
    pub fn select_mood(&mut self, mood: Mood) -> Result<Event> {
        self.expect_stage("select_mood", &[Stage::MoodSelect])?;
        let preset = self.presets.get(&mood).ok_or_else(|| ValidationError::InvalidValue {
            field: "mood".into(),
            message: format!("unknown mood '{mood}'"),
        })?;

        self.state.deepwork_target = preset.suggested.max(1);
        self.state.mood = Some(mood.clone());
        let event = Event::MoodSet {
            mood,
            at: Utc::now(),
        };
        self.state.events.push(event.clone());
        self.enter(Stage::SessionConfig);
        Ok(event)
    }

    /// Confirm how many sessions to run today and begin the first warm-up.
    pub fn configure_count(&mut self, count: u32) -> Result<TimerToken> {
        self.expect_stage("configure_count", &[Stage::SessionConfig])?;
        if count == 0 {
            return Err(ValidationError::InvalidValue {
                field: "count".into(),
                message: "at least one deepwork is required".into(),
            }
            .into());
        }
        self.state.deepwork_target = count;
        Ok(self.enter_warmup())
    }

    /// Deliver one logical second to the countdown owned by `token`.
    ///
    /// Ticks for a countdown that was cancelled, replaced, or belongs to a
    /// stage the flow has already left are ignored.
    pub fn tick(&mut self, token: TimerToken) -> Option<Event> {
        if token.stage != self.state.stage {
            return None;
        }
        let duration = self.state.timer.active().map(|c| c.duration_secs)?;
        match self.state.timer.tick(token) {
            TickOutcome::Expired(expired) => match expired.stage {
                Stage::Warmup => Some(self.finish_warmup(duration)),
                Stage::Focus => Some(self.finish_focus(duration)),
                _ => None,
            },
            TickOutcome::Running { .. } | TickOutcome::Stale => None,
        }
    }

    /// Append a question. Allowed while capturing questions and during focus.
    pub fn add_question(&mut self, text: &str) -> Result<usize> {
        self.expect_stage("add_question", &[Stage::QuestionCapture, Stage::Focus])?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyField("question").into());
        }
        self.state.questions.push(text.to_string());
        let index = self.state.questions.len() - 1;

        if self.state.stage == Stage::Focus
            && self
                .state
                .completed_questions
                .contains(&self.state.current_question)
        {
            self.state.current_question = index;
        }
        Ok(index)
    }

    /// Leave question capture and start the focus countdown.
    pub fn begin_focus(&mut self) -> Result<TimerToken> {
        self.expect_stage("begin_focus", &[Stage::QuestionCapture])?;
        if self.state.questions.is_empty() {
            return Err(ValidationError::NoQuestion.into());
        }
        self.state.current_question = 0;
        self.state.completed_questions.clear();
        self.enter(Stage::Focus);
        let seconds = self.preset().focus_seconds;
        Ok(self.state.timer.arm(Stage::Focus, seconds))
    }

    /// Mark the current question answered and move to the next open one.
    ///
    /// Completing an already completed question does nothing. When the last
    /// open question is completed, focus ends immediately and the countdown
    /// is cancelled; the returned event is the `focus_complete` it produced.
    pub fn complete_current_question(&mut self) -> Result<Option<Event>> {
        self.expect_stage("complete_current_question", &[Stage::Focus])?;
        let current = self.state.current_question;
        if !self.state.completed_questions.insert(current) {
            return Ok(None);
        }

        let len = self.state.questions.len();
        let next_open = (current + 1..len)
            .chain(0..current)
            .find(|i| !self.state.completed_questions.contains(i));
        match next_open {
            Some(next) => {
                self.state.current_question = next;
                Ok(None)
            }
            None => {
                let elapsed = self
                    .state
                    .timer
                    .cancel()
                    .map(|c| c.elapsed_secs())
                    .unwrap_or(0);
                tracing::debug!(elapsed, "all questions answered, ending focus early");
                Ok(Some(self.finish_focus(elapsed)))
            }
        }
    }

    pub fn submit_synthesis<I, S>(&mut self, explanation: &str, stuck_on: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expect_stage("submit_synthesis", &[Stage::Synthesis])?;
        let explanation = explanation.trim();
        if explanation.is_empty() {
            return Err(ValidationError::EmptyField("explanation").into());
        }
        self.state.synthesis = Some(Synthesis {
            explanation: explanation.to_string(),
            stuck_on: stuck_on.into_iter().map(Into::into).collect(),
        });
        self.enter(Stage::Evidence);
        Ok(())
    }

    /// Validate the evidence, finalize the session's history entry and hand
    /// it to `sink`.
    ///
    /// Nothing changes if validation or the write fails.
    pub fn submit_evidence<K: SessionSink + ?Sized>(
        &mut self,
        sink: &mut K,
        kind: Option<EvidenceType>,
        content: &str,
    ) -> Result<HistoryEntry> {
        self.expect_stage("submit_evidence", &[Stage::Evidence])?;
        let kind = kind.ok_or(ValidationError::MissingEvidenceType)?;
        if content.trim().is_empty() && !kind.allows_empty_content() {
            return Err(ValidationError::MissingEvidenceContent(kind.to_string()).into());
        }
        let evidence = Evidence {
            kind,
            content: content.trim().to_string(),
        };

        let project = sink.current_project()?;
        let now = Utc::now();
        // Ids are millisecond timestamps, strictly increasing per controller.
        let millis = now.timestamp_millis().max(self.state.last_entry_ms + 1);
        let entry = HistoryEntry {
            id: millis.to_string(),
            project_id: project.id.clone(),
            project_name: Some(project.name.clone()),
            project_emoji: Some(project.emoji.clone()),
            project_focus: project.focus.clone(),
            date: now,
            mood: self.state.mood.clone().unwrap_or_default(),
            deepworks_completed_this_day: self.state.deepwork_index,
            deepworks_planned_this_day: self.state.deepwork_target,
            focus_duration_seconds: self.state.focus_seconds,
            questions: self.state.questions.clone(),
            synthesis: self.state.synthesis.clone().unwrap_or_default(),
            evidence: Some(evidence.clone()),
        };
        sink.record_session(&entry)?;

        self.state.last_entry_ms = millis;
        self.state.events.push(Event::EvidenceAdded {
            kind: evidence.kind.clone(),
            content_preview: content_preview(&evidence.content),
            at: now,
        });
        self.state.evidence = Some(evidence);
        self.enter(Stage::Completed);
        Ok(entry)
    }

    /// Run the next planned session of the day.
    pub fn next_deepwork(&mut self) -> Result<TimerToken> {
        self.expect_stage("next_deepwork", &[Stage::Completed])?;
        if self.state.deepwork_index >= self.state.deepwork_target {
            return Err(CoreError::invalid_state("next_deepwork", self.state.stage));
        }
        self.state.deepwork_index += 1;
        Ok(self.enter_warmup())
    }

    /// Run one session beyond today's target.
    pub fn extra_deepwork(&mut self) -> Result<TimerToken> {
        self.expect_stage("extra_deepwork", &[Stage::Completed])?;
        if !self.can_add_extra() {
            return Err(CoreError::invalid_state("extra_deepwork", self.state.stage));
        }
        self.state.deepwork_target += 1;
        self.state.deepwork_index += 1;
        Ok(self.enter_warmup())
    }

    /// End the day and return to the entry stage.
    pub fn finish_day(&mut self) -> Result<()> {
        self.expect_stage("finish_day", &[Stage::Completed])?;
        self.restart();
        Ok(())
    }

    /// Abandon whatever is in progress and return to the entry stage.
    pub fn restart(&mut self) {
        let mut timer = std::mem::take(&mut self.state.timer);
        timer.cancel();
        let last_entry_ms = self.state.last_entry_ms;
        self.state = SessionWorkingState {
            timer,
            last_entry_ms,
            ..SessionWorkingState::default()
        };
        tracing::debug!("session flow reset");
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn expect_stage(&self, operation: &'static str, allowed: &[Stage]) -> Result<()> {
        if allowed.contains(&self.state.stage) {
            Ok(())
        } else {
            Err(CoreError::invalid_state(operation, self.state.stage))
        }
    }

    /// Move to `stage`, cancelling any countdown from the stage being left.
    fn enter(&mut self, stage: Stage) {
        self.state.timer.cancel();
        tracing::debug!(from = %self.state.stage, to = %stage, "stage transition");
        self.state.stage = stage;
    }

    fn enter_warmup(&mut self) -> TimerToken {
        self.state.questions.clear();
        self.state.completed_questions.clear();
        self.state.current_question = 0;
        self.state.focus_seconds = 0;
        self.state.synthesis = None;
        self.state.evidence = None;
        self.enter(Stage::Warmup);
        let seconds = self.preset().warmup_seconds;
        self.state.timer.arm(Stage::Warmup, seconds)
    }

    fn finish_warmup(&mut self, duration_seconds: u64) -> Event {
        let event = Event::WarmupComplete {
            duration_seconds,
            deepwork_index: self.state.deepwork_index,
            at: Utc::now(),
        };
        self.state.events.push(event.clone());
        self.enter(Stage::QuestionCapture);
        event
    }

    fn finish_focus(&mut self, elapsed_seconds: u64) -> Event {
        self.state.focus_seconds = elapsed_seconds;
        let event = Event::FocusComplete {
            questions_answered: self.state.completed_questions.len(),
            duration_seconds: elapsed_seconds,
            at: Utc::now(),
        };
        self.state.events.push(event.clone());
        self.enter(Stage::Synthesis);
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Project;
    use std::collections::BTreeMap;

    /// In-memory sink recording what the controller hands over.
    struct MemorySink {
        project: Project,
        entries: Vec<HistoryEntry>,
        fail: bool,
    }

    impl MemorySink {
        fn new() -> Self {
            Self {
                project: Project::new("Rust", "🦀"),
                entries: Vec::new(),
                fail: false,
            }
        }
    }

    impl SessionSink for MemorySink {
        fn current_project(&self) -> Result<Project> {
            Ok(self.project.clone())
        }

        fn record_session(&mut self, entry: &HistoryEntry) -> Result<()> {
            if self.fail {
                return Err(CoreError::project_not_found(&entry.project_id));
            }
            self.entries.push(entry.clone());
            self.project.total_deepworks_completed += 1;
            Ok(())
        }
    }

    fn short_presets() -> MoodPresets {
        MoodPresets::from_table(BTreeMap::from([(
            "ready".to_string(),
            MoodPreset::new(2, 3, 10),
        )]))
    }

    fn run_ticks(flow: &mut SessionFlowController, n: usize) -> Option<Event> {
        let mut last = None;
        for _ in 0..n {
            let Some(token) = flow.active_timer() else {
                break;
            };
            if let Some(ev) = flow.tick(token) {
                last = Some(ev);
            }
        }
        last
    }

    /// Drive a flow from entry to the question capture stage.
    fn at_questions() -> SessionFlowController {
        let mut flow = SessionFlowController::new(short_presets());
        flow.start().unwrap();
        flow.select_mood(Mood::Ready).unwrap();
        flow.configure_count(2).unwrap();
        run_ticks(&mut flow, 3);
        assert_eq!(flow.stage(), Stage::QuestionCapture);
        flow
    }

    fn complete_session(flow: &mut SessionFlowController, sink: &mut MemorySink) {
        run_ticks(flow, 3);
        flow.add_question("What is ownership?").unwrap();
        flow.begin_focus().unwrap();
        flow.complete_current_question().unwrap();
        flow.submit_synthesis("Values have one owner", ["Part A"]).unwrap();
        flow.submit_evidence(sink, Some(EvidenceType::Link), "https://doc.rust-lang.org")
            .unwrap();
    }

    #[test]
    fn select_mood_suggests_target() {
        let mut flow = SessionFlowController::new(MoodPresets::builtin());
        flow.start().unwrap();
        flow.select_mood(Mood::Flow).unwrap();
        assert_eq!(flow.stage(), Stage::SessionConfig);
        assert_eq!(flow.state().deepwork_target, 5);
    }

    #[test]
    fn unknown_mood_is_a_validation_error() {
        let mut flow = SessionFlowController::new(MoodPresets::builtin());
        flow.start().unwrap();
        let err = flow.select_mood(Mood::from("sleepy")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(flow.stage(), Stage::MoodSelect);
    }

    #[test]
    fn wrong_stage_fails_fast() {
        let mut flow = SessionFlowController::new(MoodPresets::builtin());
        let err = flow.select_mood(Mood::Low).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidState {
                stage: Stage::Entry,
                ..
            }
        ));
        assert!(flow.complete_current_question().is_err());
        assert_eq!(flow.stage(), Stage::Entry);
    }

    #[test]
    fn configure_count_rejects_zero() {
        let mut flow = SessionFlowController::new(MoodPresets::builtin());
        flow.start().unwrap();
        flow.select_mood(Mood::Low).unwrap();
        assert!(flow.configure_count(0).unwrap_err().is_validation());
        assert_eq!(flow.stage(), Stage::SessionConfig);
        flow.configure_count(3).unwrap();
        assert_eq!(flow.stage(), Stage::Warmup);
        assert_eq!(flow.state().deepwork_target, 3);
        assert_eq!(flow.remaining_secs(), Some(120));
    }

    #[test]
    fn warmup_expiry_advances_and_logs() {
        let mut flow = SessionFlowController::new(short_presets());
        flow.start().unwrap();
        flow.select_mood(Mood::Ready).unwrap();
        flow.configure_count(1).unwrap();
        assert!(run_ticks(&mut flow, 2).is_none());
        assert_eq!(flow.stage(), Stage::Warmup);
        let event = run_ticks(&mut flow, 1).unwrap();
        assert_eq!(event.name(), "warmup_complete");
        assert_eq!(flow.stage(), Stage::QuestionCapture);
        assert!(flow.active_timer().is_none());
    }

    #[test]
    fn focus_needs_a_question() {
        let mut flow = at_questions();
        assert!(matches!(
            flow.begin_focus(),
            Err(CoreError::Validation(ValidationError::NoQuestion))
        ));
        assert!(flow.add_question("   ").unwrap_err().is_validation());
        flow.add_question("Why?").unwrap();
        flow.begin_focus().unwrap();
        assert_eq!(flow.stage(), Stage::Focus);
        assert_eq!(flow.remaining_secs(), Some(10));
    }

    #[test]
    fn answering_everything_ends_focus_early() {
        let mut flow = at_questions();
        flow.add_question("Q1").unwrap();
        flow.add_question("Q2").unwrap();
        let token = flow.begin_focus().unwrap();
        run_ticks(&mut flow, 5);
        assert_eq!(flow.remaining_secs(), Some(5));

        assert!(flow.complete_current_question().unwrap().is_none());
        assert_eq!(flow.state().current_question, 1);
        let event = flow.complete_current_question().unwrap().unwrap();
        assert_eq!(
            event,
            Event::FocusComplete {
                questions_answered: 2,
                duration_seconds: 5,
                at: event.at(),
            }
        );
        assert_eq!(flow.stage(), Stage::Synthesis);
        assert!(flow.active_timer().is_none());

        // The cancelled countdown can no longer fire.
        assert!(flow.tick(token).is_none());
        assert_eq!(flow.stage(), Stage::Synthesis);
        let focus_events = flow
            .events()
            .iter()
            .filter(|e| e.name() == "focus_complete")
            .count();
        assert_eq!(focus_events, 1);
    }

    #[test]
    fn focus_expiry_with_open_questions() {
        let mut flow = at_questions();
        flow.add_question("Q1").unwrap();
        flow.add_question("Q2").unwrap();
        flow.begin_focus().unwrap();
        flow.complete_current_question().unwrap();
        let event = run_ticks(&mut flow, 10).unwrap();
        assert!(matches!(
            event,
            Event::FocusComplete {
                questions_answered: 1,
                duration_seconds: 10,
                ..
            }
        ));
        assert_eq!(flow.stage(), Stage::Synthesis);
        assert_eq!(flow.state().focus_seconds, 10);
    }

    #[test]
    fn completing_twice_is_a_noop() {
        let mut flow = at_questions();
        flow.add_question("Q1").unwrap();
        flow.add_question("Q2").unwrap();
        flow.add_question("Q3").unwrap();
        flow.begin_focus().unwrap();
        flow.complete_current_question().unwrap();
        flow.complete_current_question().unwrap();
        assert_eq!(flow.state().current_question, 2);
        assert_eq!(flow.state().completed_questions.len(), 2);
        assert_eq!(flow.stage(), Stage::Focus);
    }

    #[test]
    fn question_added_during_focus_becomes_current_when_pointer_is_done() {
        let mut flow = at_questions();
        flow.add_question("Q1").unwrap();
        flow.add_question("Q2").unwrap();
        flow.begin_focus().unwrap();
        flow.complete_current_question().unwrap();
        // Pointer is on Q2 (open); adding keeps it there.
        assert_eq!(flow.add_question("Q3").unwrap(), 2);
        assert_eq!(flow.state().current_question, 1);
        flow.complete_current_question().unwrap();
        assert_eq!(flow.state().current_question, 2);
        assert_eq!(flow.stage(), Stage::Focus);
    }

    #[test]
    fn stale_tick_from_previous_stage_is_ignored() {
        let mut flow = SessionFlowController::new(short_presets());
        flow.start().unwrap();
        flow.select_mood(Mood::Ready).unwrap();
        let warmup = flow.configure_count(1).unwrap();
        run_ticks(&mut flow, 3);
        flow.add_question("Q1").unwrap();
        let focus = flow.begin_focus().unwrap();
        assert!(flow.tick(warmup).is_none());
        assert_eq!(flow.remaining_secs(), Some(10));
        assert!(flow.tick(focus).is_none());
        assert_eq!(flow.remaining_secs(), Some(9));
    }

    #[test]
    fn synthesis_requires_explanation() {
        let mut flow = at_questions();
        flow.add_question("Q1").unwrap();
        flow.begin_focus().unwrap();
        flow.complete_current_question().unwrap();
        assert!(flow.submit_synthesis("  ", Vec::<String>::new()).unwrap_err().is_validation());
        assert_eq!(flow.stage(), Stage::Synthesis);
        flow.submit_synthesis("Borrowing", ["Part A", "Part A", "Part B"]).unwrap();
        assert_eq!(flow.state().synthesis.as_ref().unwrap().stuck_on.len(), 2);
        assert_eq!(flow.stage(), Stage::Evidence);
    }

    #[test]
    fn evidence_validation_leaves_stage_untouched() {
        let mut sink = MemorySink::new();
        let mut flow = at_questions();
        flow.add_question("Q1").unwrap();
        flow.begin_focus().unwrap();
        flow.complete_current_question().unwrap();
        flow.submit_synthesis("Explained", Vec::<String>::new()).unwrap();

        let err = flow
            .submit_evidence(&mut sink, Some(EvidenceType::Link), "")
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MissingEvidenceContent(_))
        ));
        assert_eq!(flow.stage(), Stage::Evidence);
        assert!(matches!(
            flow.submit_evidence(&mut sink, None, "x"),
            Err(CoreError::Validation(ValidationError::MissingEvidenceType))
        ));
        assert!(sink.entries.is_empty());

        let entry = flow
            .submit_evidence(&mut sink, Some(EvidenceType::Screenshot), "")
            .unwrap();
        assert_eq!(flow.stage(), Stage::Completed);
        assert_eq!(entry.evidence.unwrap().kind, EvidenceType::Screenshot);
        assert_eq!(sink.entries.len(), 1);
    }

    #[test]
    fn failed_write_keeps_evidence_stage() {
        let mut sink = MemorySink::new();
        sink.fail = true;
        let mut flow = at_questions();
        flow.add_question("Q1").unwrap();
        flow.begin_focus().unwrap();
        flow.complete_current_question().unwrap();
        flow.submit_synthesis("Explained", Vec::<String>::new()).unwrap();
        assert!(flow
            .submit_evidence(&mut sink, Some(EvidenceType::Flashcard), "card")
            .is_err());
        assert_eq!(flow.stage(), Stage::Evidence);
        assert!(!flow.events().iter().any(|e| e.name() == "evidence_added"));
    }

    #[test]
    fn full_day_with_extra_session() {
        let mut sink = MemorySink::new();
        let mut flow = SessionFlowController::new(short_presets());
        flow.start().unwrap();
        flow.select_mood(Mood::Ready).unwrap();
        flow.configure_count(2).unwrap();

        complete_session(&mut flow, &mut sink);
        assert_eq!(flow.stage(), Stage::Completed);
        assert!(!flow.can_add_extra());
        assert!(flow.extra_deepwork().is_err());
        flow.next_deepwork().unwrap();
        assert_eq!(flow.state().deepwork_index, 2);
        assert!(flow.state().questions.is_empty());

        complete_session(&mut flow, &mut sink);
        assert!(flow.next_deepwork().is_err());
        flow.extra_deepwork().unwrap();
        assert_eq!(flow.state().deepwork_index, 3);
        assert_eq!(flow.state().deepwork_target, 3);

        complete_session(&mut flow, &mut sink);
        assert_eq!(sink.project.total_deepworks_completed, 3);
        let indices: Vec<u32> = sink
            .entries
            .iter()
            .map(|e| e.deepworks_completed_this_day)
            .collect();
        assert_eq!(indices, vec![1, 2, 3]);
        let ids: BTreeSet<&str> = sink.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), 3);

        flow.finish_day().unwrap();
        assert_eq!(flow.stage(), Stage::Entry);
        assert_eq!(flow.state().deepwork_index, 1);
        assert!(flow.events().is_empty());
    }

    #[test]
    fn restart_cancels_running_countdown() {
        let mut flow = SessionFlowController::new(short_presets());
        flow.start().unwrap();
        flow.select_mood(Mood::Ready).unwrap();
        let token = flow.configure_count(1).unwrap();
        flow.restart();
        assert_eq!(flow.stage(), Stage::Entry);
        assert!(flow.tick(token).is_none());

        // A fresh countdown in the same stage gets a different token.
        flow.start().unwrap();
        flow.select_mood(Mood::Ready).unwrap();
        let fresh = flow.configure_count(1).unwrap();
        assert_ne!(token, fresh);
        assert!(flow.tick(token).is_none());
        assert_eq!(flow.remaining_secs(), Some(3));
    }

    #[test]
    fn state_survives_serialization() {
        let flow = at_questions();
        let json = serde_json::to_string(flow.state()).unwrap();
        let state: SessionWorkingState = serde_json::from_str(&json).unwrap();
        let resumed = SessionFlowController::resume(state, short_presets());
        assert_eq!(resumed.state(), flow.state());
    }
}
