//! Quiz engine orchestrator.
//!
//! Owns the selection navigator, the live session, the persistence slots and
//! the periodic timers, and drives the `menu → active → completed → reviewing`
//! lifecycle. Every dependency (content, storage, clock, RNG) is injected.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, TimeZone};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::clock::Clock;
use crate::config::CortexConfig;
use crate::content::ContentStore;
use crate::error::QuizError;
use crate::model::{Format, Region, Response, Scope, System};
use crate::navigator::{self, Navigator, Selection, Step};
use crate::persistence::{HistoryEntry, HistoryLog, KeyValueStore, ProgressStore, Snapshot};
use crate::pool::build_question_pool;
use crate::scheduler::{Scheduler, Task};
use crate::search::NavigationTarget;
use crate::session::{Advance, AnswerOutcome, QuizSession, QuizState, RejectReason, SessionSummary};

pub type QuizResult<T> = Result<T, QuizError>;

/// Timer settings for the engine.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// How often an active session is written to the progress slot.
    pub autosave_interval: Duration,
    /// How often the elapsed-time display refreshes.
    pub tick_interval: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            autosave_interval: Duration::from_secs(30),
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl From<&CortexConfig> for EngineOptions {
    fn from(config: &CortexConfig) -> Self {
        Self {
            autosave_interval: config.autosave_interval(),
            tick_interval: config.tick_interval(),
        }
    }
}

/// User-facing message queued by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Warning(String),
}

/// Something a timer did during [`QuizEngine::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Autosaved,
    Tick { elapsed_secs: u64 },
}

/// The quiz engine.
pub struct QuizEngine {
    content: Arc<ContentStore>,
    progress: ProgressStore,
    history: HistoryLog,
    clock: Arc<dyn Clock>,
    rng: Box<dyn RngCore + Send>,
    options: EngineOptions,
    navigator: Navigator,
    scheduler: Scheduler,
    state: QuizState,
    session: Option<QuizSession>,
    notices: Vec<Notice>,
}

impl QuizEngine {
    pub fn new(
        content: Arc<ContentStore>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            content,
            progress: ProgressStore::new(store.clone()),
            history: HistoryLog::new(store),
            clock,
            rng: Box::new(StdRng::from_entropy()),
            options: EngineOptions::default(),
            navigator: Navigator::new(),
            scheduler: Scheduler::new(),
            state: QuizState::Menu,
            session: None,
            notices: Vec::new(),
        }
    }

    /// Replace the shuffle RNG, e.g. with a seeded one for reproducible pools.
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn step(&self) -> Step {
        self.navigator.step()
    }

    pub fn selection(&self) -> &Selection {
        self.navigator.selection()
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    /// Whether a resumable snapshot is stored.
    pub fn has_saved_progress(&self) -> bool {
        self.progress.exists()
    }

    fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    fn require_idle(&self, action: &'static str) -> QuizResult<()> {
        match self.state {
            QuizState::Active => Err(QuizError::InvalidTransition {
                action,
                state: self.state,
            }),
            _ => Ok(()),
        }
    }

    pub fn select_region(&mut self, region: Scope<Region>) -> QuizResult<Step> {
        self.require_idle("select a region")?;
        Ok(self.navigator.select_region(region))
    }

    pub fn select_system(&mut self, system: Scope<System>) -> QuizResult<Step> {
        self.require_idle("select a system")?;
        Ok(self.navigator.select_system(system))
    }

    pub fn back(&mut self) -> Option<Step> {
        self.navigator.back()
    }

    /// Number of questions the current selection would yield for `format`.
    pub fn available(&self, format: Format) -> usize {
        let selection = self.navigator.selection();
        match (selection.region, selection.system) {
            (Some(region), Some(system)) => {
                navigator::question_count(&self.content, region, system, Some(format))
            }
            _ => 0,
        }
    }

    /// Start a fresh session for the current selection. Returns the pool size.
    pub fn start(&mut self, format: Format) -> QuizResult<usize> {
        let selection = self.navigator.selection().clone();
        let region = selection
            .region
            .ok_or(QuizError::IncompleteSelection("region"))?;
        let system = selection
            .system
            .ok_or(QuizError::IncompleteSelection("system"))?;

        if navigator::question_count(&self.content, region, system, Some(format)) == 0 {
            tracing::info!(%region, %system, %format, "no questions for selection");
            self.notices.push(Notice::Warning(format!(
                "No {} questions available for {region} - {system}.",
                format.label()
            )));
            return Err(QuizError::NoQuestionsAvailable {
                region,
                system,
                format,
            });
        }

        let pool = build_question_pool(&self.content, region, system, format, &mut *self.rng);
        let size = pool.len();
        let now = self.now();
        self.session = Some(QuizSession::new(format, region, system, pool, now));
        self.enter_active(now);
        tracing::info!(%region, %system, %format, questions = size, "quiz started");
        Ok(size)
    }

    fn enter_active(&mut self, now: i64) {
        self.state = QuizState::Active;
        self.scheduler.stop_all();
        self.scheduler
            .start(Task::Autosave, self.options.autosave_interval, now);
        self.scheduler.start(Task::Tick, self.options.tick_interval, now);
    }

    fn active_session(&mut self) -> Option<&mut QuizSession> {
        match self.state {
            QuizState::Active => self.session.as_mut(),
            _ => None,
        }
    }

    /// Submit a response for the current question.
    pub fn answer(&mut self, response: Response) -> AnswerOutcome {
        match self.active_session() {
            Some(session) => session.check_answer(response),
            None => AnswerOutcome::Rejected(RejectReason::NotActive),
        }
    }

    pub fn prev(&mut self) -> bool {
        self.active_session().is_some_and(QuizSession::prev)
    }

    /// Move forward; past the last question this completes the session.
    pub fn next(&mut self) -> QuizResult<Advance> {
        let advance = match self.active_session() {
            Some(session) => session.next(),
            None => return Ok(Advance::Stayed),
        };
        if advance == Advance::Completed {
            self.complete()?;
        }
        Ok(advance)
    }

    pub fn go_to(&mut self, index: usize) -> bool {
        self.active_session()
            .is_some_and(|session| session.go_to(index))
    }

    /// Complete the session early.
    pub fn finish(&mut self) -> QuizResult<()> {
        if self.state != QuizState::Active {
            return Err(QuizError::InvalidTransition {
                action: "finish",
                state: self.state,
            });
        }
        self.complete()
    }

    pub fn toggle_bookmark(&mut self) -> Option<bool> {
        self.active_session()?.toggle_bookmark()
    }

    pub fn toggle_flag(&mut self) -> Option<bool> {
        self.active_session()?.toggle_flag()
    }

    fn complete(&mut self) -> QuizResult<()> {
        let now = self.now();
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        session.finish(now);
        let summary = session.summary(now);
        self.scheduler.stop_all();
        self.state = QuizState::Completed;
        tracing::info!(
            score = summary.score,
            attempted = summary.attempted,
            accuracy = summary.accuracy,
            elapsed_secs = summary.elapsed_secs,
            "quiz completed"
        );

        let cleared = self.progress.clear();
        let recorded = if summary.attempted > 0 {
            let at = Local
                .timestamp_millis_opt(now)
                .single()
                .unwrap_or_else(Local::now);
            self.history
                .append(HistoryEntry::from_summary(&summary, &at))
        } else {
            tracing::debug!("nothing attempted, history not updated");
            Ok(())
        };
        cleared?;
        recorded?;
        Ok(())
    }

    /// Summary of the live or just-completed session.
    pub fn summary(&self) -> Option<SessionSummary> {
        let now = self.now();
        self.session.as_ref().map(|s| s.summary(now))
    }

    /// Enter read-only review of the completed session.
    pub fn review(&mut self) -> QuizResult<&QuizSession> {
        match (self.state, self.session.as_ref()) {
            (QuizState::Completed | QuizState::Reviewing, Some(session)) => {
                self.state = QuizState::Reviewing;
                Ok(session)
            }
            _ => Err(QuizError::InvalidTransition {
                action: "review",
                state: self.state,
            }),
        }
    }

    /// Leave the quiz view. An active session is saved and parked for resume.
    ///
    /// If the save fails the session stays active, timers included.
    pub fn close(&mut self) -> QuizResult<()> {
        if self.state == QuizState::Active {
            self.save_snapshot()?;
            self.scheduler.stop_all();
            self.session = None;
            self.state = QuizState::Paused;
            tracing::info!("quiz paused");
            Ok(())
        } else {
            self.reset();
            Ok(())
        }
    }

    /// Back to the menu, discarding the selection and any live session.
    pub fn reset(&mut self) {
        self.scheduler.stop_all();
        self.session = None;
        self.navigator.reset();
        self.state = QuizState::Menu;
    }

    /// Restore the saved session. Unusable progress is discarded and reported.
    pub fn resume(&mut self) -> QuizResult<usize> {
        let now = self.now();
        let restored = self
            .progress
            .load()
            .and_then(|snapshot| snapshot.restore(now));

        let session = match restored {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "discarding saved progress");
                if let Err(e) = self.progress.clear() {
                    tracing::warn!(error = %e, "failed to clear saved progress");
                }
                self.reset();
                self.notices.push(Notice::Warning(
                    "Saved progress could not be restored and has been cleared.".to_string(),
                ));
                return Err(match err {
                    QuizError::Storage(e) => QuizError::CorruptProgress(e.to_string()),
                    other => other,
                });
            }
        };

        let remaining = session.len() - session.current_index();
        self.navigator.reset();
        self.navigator.select_region(session.region());
        self.navigator.select_system(session.system());
        tracing::info!(
            region = %session.region(),
            system = %session.system(),
            index = session.current_index(),
            "quiz resumed"
        );
        self.notices.push(Notice::Info(format!(
            "Resumed at question {} of {}.",
            session.current_index() + 1,
            session.len()
        )));
        self.session = Some(session);
        self.enter_active(now);
        Ok(remaining)
    }

    /// Write the active session to the progress slot. Returns `false` when idle.
    pub fn save_snapshot(&mut self) -> QuizResult<bool> {
        let now = self.now();
        match (self.state, self.session.as_ref()) {
            (QuizState::Active, Some(session)) => {
                self.progress.save(&Snapshot::capture(session, now))?;
                tracing::debug!(index = session.current_index(), "progress saved");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Best-effort save when the host is going away.
    pub fn on_unload(&mut self) {
        if let Err(e) = self.save_snapshot() {
            tracing::warn!(error = %e, "failed to save progress on unload");
        }
    }

    /// Fire due timers. Autosave failures are logged, not returned.
    pub fn poll(&mut self) -> Vec<TimerEvent> {
        let now = self.now();
        let mut events = Vec::new();
        for task in self.scheduler.due(now) {
            match task {
                Task::Autosave => match self.save_snapshot() {
                    Ok(true) => events.push(TimerEvent::Autosaved),
                    Ok(false) => {}
                    Err(e) => tracing::warn!(error = %e, "autosave failed"),
                },
                Task::Tick => {
                    if let Some(session) = self.session.as_ref() {
                        events.push(TimerEvent::Tick {
                            elapsed_secs: session.elapsed_secs(now),
                        });
                    }
                }
            }
        }
        events
    }

    /// Time until the next timer fires, if any are running.
    pub fn next_timer_in(&self) -> Option<Duration> {
        self.scheduler
            .next_deadline_in(self.now())
            .map(|ms| Duration::from_millis(ms as u64))
    }

    /// Follow a search hit. Quiz targets land on the format step for their
    /// region and system; other views are resolved by the caller.
    pub fn navigate_to(&mut self, target: &NavigationTarget) -> QuizResult<Option<Step>> {
        let NavigationTarget::Quiz { region, system, .. } = target else {
            return Ok(None);
        };
        self.close()?;
        self.reset();
        self.navigator.select_region(Scope::Only(*region));
        Ok(Some(self.navigator.select_system(Scope::Only(*system))))
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Stop timers and save any active session.
    pub fn dispose(&mut self) {
        self.on_unload();
        self.scheduler.stop_all();
    }
}
