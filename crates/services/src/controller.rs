use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use rush_core::Clock;
use rush_core::model::{LanguageCode, Question, RushSummary};
use rush_core::session::{Answer, Resolution, RushConfig, RushError, RushSession, Tick};
use storage::repository::{SeenQuestionRecord, SeenQuestionRepository};

use crate::error::{ControllerError, SupplyError};
use crate::question_supply::QuestionSupply;
use crate::score_sink::ScoreSink;

//
// ─── EVENTS AND UPDATES ────────────────────────────────────────────────────────
//

/// What the frontend can do to a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The widget's verdict on the current question (or a pass).
    Answered(Answer),
    /// Ask for a question again after a supply failure.
    Refresh,
    /// Restart from the game-over screen.
    PlayAgain,
    /// Leave the screen; tears the session down.
    Quit,
}

/// What the frontend renders.
#[derive(Debug, Clone)]
pub enum RushUpdate {
    /// A question fetch is in flight.
    Loading,
    /// The next question is in play.
    QuestionReady(Question),
    /// Countdown heartbeat, once per second.
    Status { time_remaining: u32, score: u32 },
    /// Effect of the last answer.
    Resolved(Resolution),
    /// The supply gave up; the player may `Refresh`.
    SupplyFailed { error: String },
    /// A question of an unknown kind was skipped without penalty.
    UnsupportedSkipped { kind: String },
    /// Passing is disabled for this session.
    PassUnavailable,
    /// The countdown hit zero; the final score is already on its way out.
    GameOver { summary: RushSummary },
}

/// Completed question fetch, tagged with the generation it was spawned for.
#[derive(Debug)]
pub struct FetchOutcome {
    pub generation: u64,
    pub result: Result<Question, SupplyError>,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Runs one Mixed Rush screen: owns the session state machine, the one tick
/// timer, and the in-flight question fetch.
///
/// The controller is a single task; ticks, widget verdicts, and fetch
/// results all arrive through `select!`, so session state is never touched
/// concurrently. Question fetches are spawned fire-and-forget and report
/// back through an internal channel tagged with the session generation:
/// a slow fetch never blocks the countdown, and results that arrive after
/// game over or "Play Again" fail the generation check and are dropped.
pub struct RushController {
    session: RushSession,
    language: LanguageCode,
    clock: Clock,
    supply: Arc<dyn QuestionSupply>,
    sink: Arc<dyn ScoreSink>,
    seen: Arc<dyn SeenQuestionRepository>,
}

impl RushController {
    #[must_use]
    pub fn new(
        config: RushConfig,
        language: LanguageCode,
        supply: Arc<dyn QuestionSupply>,
        sink: Arc<dyn ScoreSink>,
        seen: Arc<dyn SeenQuestionRepository>,
    ) -> Self {
        Self {
            session: RushSession::new(config),
            language,
            clock: Clock::default(),
            supply,
            sink,
            seen,
        }
    }

    /// Override the clock (tests pin it to a fixed timestamp).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Drives the session until the player quits or the frontend goes away.
    ///
    /// This loop holds the only tick timer for the session; it dies with
    /// the task, so there is never a second one. Update sends are
    /// best-effort: when the frontend drops its receiver the next
    /// heartbeat notices and the loop exits.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError` only for state-machine violations that
    /// indicate a bug; collaborator failures are logged and surfaced as
    /// updates instead.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<PlayerEvent>,
        updates: mpsc::Sender<RushUpdate>,
    ) -> Result<(), ControllerError> {
        let (fetch_tx, mut fetch_rx) = mpsc::channel::<FetchOutcome>(8);

        self.session.start(self.clock.now())?;
        info!(
            target: "rush",
            session = %self.session.id(),
            language = %self.language,
            duration = self.session.config().duration_secs(),
            "rush session started"
        );

        let mut ticker = time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // An interval yields immediately on its first tick; consume it so
        // the countdown starts a full second out.
        ticker.tick().await;

        let mut submitted = false;
        let mut pending_fetch: Option<u64> = None;
        self.request_question(&fetch_tx, &mut pending_fetch, &updates)
            .await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.session.tick() {
                        Ok(Tick::Running { time_remaining }) => {
                            let update = RushUpdate::Status {
                                time_remaining,
                                score: self.session.score(),
                            };
                            if updates.send(update).await.is_err() {
                                break;
                            }
                        }
                        Ok(Tick::Finished { .. }) => {
                            self.submit_final_score(&mut submitted);
                            let summary = self.session.summary(self.clock.now())?;
                            info!(
                                target: "rush",
                                session = %self.session.id(),
                                score = summary.final_score(),
                                answered = summary.total_answered(),
                                "rush session over"
                            );
                            if updates.send(RushUpdate::GameOver { summary }).await.is_err() {
                                break;
                            }
                        }
                        // Ticks after game over are inert until "Play Again".
                        Err(RushError::NotRunning) => {}
                        Err(err) => return Err(err.into()),
                    }
                }
                Some(outcome) = fetch_rx.recv() => {
                    if pending_fetch == Some(outcome.generation) {
                        pending_fetch = None;
                    }
                    self.handle_fetch_outcome(outcome, &fetch_tx, &mut pending_fetch, &updates)
                        .await?;
                }
                maybe_event = events.recv() => {
                    match maybe_event {
                        None | Some(PlayerEvent::Quit) => break,
                        Some(PlayerEvent::Answered(answer)) => {
                            self.handle_answer(answer, &fetch_tx, &mut pending_fetch, &updates)
                                .await?;
                        }
                        Some(PlayerEvent::Refresh) => {
                            if self.session.current_question().is_none() {
                                self.request_question(&fetch_tx, &mut pending_fetch, &updates)
                                    .await;
                            }
                        }
                        Some(PlayerEvent::PlayAgain) => {
                            if !self.session.is_over() {
                                debug!(target: "rush", "ignoring play-again while running");
                                continue;
                            }
                            self.session.reset();
                            submitted = false;
                            pending_fetch = None;
                            self.session.start(self.clock.now())?;
                            info!(
                                target: "rush",
                                session = %self.session.id(),
                                "rush session restarted"
                            );
                            let fresh = RushUpdate::Status {
                                time_remaining: self.session.time_remaining(),
                                score: self.session.score(),
                            };
                            if updates.send(fresh).await.is_err() {
                                break;
                            }
                            self.request_question(&fetch_tx, &mut pending_fetch, &updates)
                                .await;
                        }
                    }
                }
            }
        }

        debug!(target: "rush", session = %self.session.id(), "rush controller stopped");
        Ok(())
    }

    /// Spawns one question fetch for the current generation, unless one is
    /// already in flight.
    async fn request_question(
        &self,
        fetch_tx: &mpsc::Sender<FetchOutcome>,
        pending_fetch: &mut Option<u64>,
        updates: &mpsc::Sender<RushUpdate>,
    ) {
        if self.session.is_over() {
            return;
        }
        let generation = self.session.generation();
        if *pending_fetch == Some(generation) {
            debug!(target: "rush", generation, "question fetch already in flight");
            return;
        }
        *pending_fetch = Some(generation);
        let _ = updates.send(RushUpdate::Loading).await;

        let supply = Arc::clone(&self.supply);
        let language = self.language.clone();
        let tx = fetch_tx.clone();
        tokio::spawn(async move {
            let result = supply.next_question(&language).await;
            // A closed receiver just means the session is gone.
            let _ = tx.send(FetchOutcome { generation, result }).await;
        });
    }

    async fn handle_fetch_outcome(
        &mut self,
        outcome: FetchOutcome,
        fetch_tx: &mpsc::Sender<FetchOutcome>,
        pending_fetch: &mut Option<u64>,
        updates: &mpsc::Sender<RushUpdate>,
    ) -> Result<(), ControllerError> {
        if outcome.generation != self.session.generation() {
            debug!(
                target: "rush",
                got = outcome.generation,
                current = self.session.generation(),
                "discarding fetch result from a previous play-through"
            );
            return Ok(());
        }
        if self.session.is_over() {
            debug!(target: "rush", "discarding fetch result after game over");
            return Ok(());
        }

        match outcome.result {
            Ok(question) if !question.payload().is_supported() => {
                let kind = question.payload().kind_tag().to_string();
                warn!(target: "rush", %kind, "skipping question of unsupported kind");
                let _ = updates.send(RushUpdate::UnsupportedSkipped { kind }).await;
                self.request_question(fetch_tx, pending_fetch, updates).await;
                Ok(())
            }
            Ok(question) => {
                match self
                    .session
                    .install_question(outcome.generation, question.clone())
                {
                    Ok(()) => {
                        let _ = updates.send(RushUpdate::QuestionReady(question)).await;
                        Ok(())
                    }
                    Err(RushError::StaleQuestion { .. } | RushError::NotRunning) => Ok(()),
                    Err(err) => Err(err.into()),
                }
            }
            Err(err) => {
                error!(target: "rush", error = %err, "question supply failed");
                let _ = updates
                    .send(RushUpdate::SupplyFailed {
                        error: err.to_string(),
                    })
                    .await;
                Ok(())
            }
        }
    }

    async fn handle_answer(
        &mut self,
        answer: Answer,
        fetch_tx: &mpsc::Sender<FetchOutcome>,
        pending_fetch: &mut Option<u64>,
        updates: &mpsc::Sender<RushUpdate>,
    ) -> Result<(), ControllerError> {
        let question = self.session.current_question().cloned();
        match self.session.resolve(answer) {
            Ok(resolution) => {
                if resolution.answer == Answer::Correct {
                    if let Some(question) = &question {
                        self.record_seen(question).await;
                    }
                }
                let _ = updates.send(RushUpdate::Resolved(resolution)).await;
                let status = RushUpdate::Status {
                    time_remaining: self.session.time_remaining(),
                    score: self.session.score(),
                };
                let _ = updates.send(status).await;
                self.request_question(fetch_tx, pending_fetch, updates).await;
                Ok(())
            }
            Err(RushError::NoCurrentQuestion) => {
                debug!(target: "rush", "answer with no question in play (double report?)");
                Ok(())
            }
            Err(RushError::PassDisabled) => {
                let _ = updates.send(RushUpdate::PassUnavailable).await;
                Ok(())
            }
            Err(RushError::NotRunning) => {
                debug!(target: "rush", "answer arrived after game over");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Submits the final score exactly once per play-through.
    ///
    /// The score is read off the session here, at submission time, never
    /// from a value captured when the timer was armed, so the submission
    /// always carries the latest total. Failures are logged and do not
    /// block the game-over screen.
    fn submit_final_score(&self, submitted: &mut bool) {
        if *submitted {
            return;
        }
        *submitted = true;
        let score = self.session.score();
        let session_id = self.session.id();
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(err) = sink.submit_score(score).await {
                error!(
                    target: "rush_score",
                    session = %session_id,
                    score,
                    error = %err,
                    "failed to submit final score"
                );
            }
        });
    }

    async fn record_seen(&self, question: &Question) {
        let (Some(id), Some(kind)) = (question.id(), question.kind()) else {
            return;
        };
        let record = SeenQuestionRecord {
            question_id: id.clone(),
            language: self.language.clone(),
            kind,
            seen_at: self.clock.now(),
        };
        if let Err(err) = self.seen.mark_seen(&record).await {
            warn!(target: "rush", error = %err, "failed to record solved question");
        }
    }
}
