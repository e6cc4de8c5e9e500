use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Level, Question, RushSummary, RushSummaryError, SessionId};
use crate::scoring;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum RushConfigError {
    #[error("session duration must be > 0 seconds")]
    InvalidDuration,
}

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum RushError {
    #[error("session already started")]
    AlreadyStarted,

    #[error("session is not running")]
    NotRunning,

    #[error("no question is currently in play")]
    NoCurrentQuestion,

    #[error("passing is disabled for this session")]
    PassDisabled,

    #[error("question belongs to generation {got}, session is at {expected}")]
    StaleQuestion { expected: u64, got: u64 },

    #[error("session has not finished")]
    NotFinished,

    #[error(transparent)]
    Summary(#[from] RushSummaryError),
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Tunables for one rush session. `Default` carries the production values;
/// the constructors exist for tests and experiments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RushConfig {
    duration_secs: u32,
    wrong_penalty_secs: u32,
    pass_penalty_secs: u32,
    allow_pass: bool,
}

impl RushConfig {
    /// Creates a config with explicit timings.
    ///
    /// # Errors
    ///
    /// Returns `RushConfigError::InvalidDuration` when `duration_secs` is 0.
    pub fn new(
        duration_secs: u32,
        wrong_penalty_secs: u32,
        pass_penalty_secs: u32,
    ) -> Result<Self, RushConfigError> {
        if duration_secs == 0 {
            return Err(RushConfigError::InvalidDuration);
        }
        Ok(Self {
            duration_secs,
            wrong_penalty_secs,
            pass_penalty_secs,
            allow_pass: true,
        })
    }

    /// Enable or disable the pass/skip action.
    #[must_use]
    pub fn with_allow_pass(mut self, allow_pass: bool) -> Self {
        self.allow_pass = allow_pass;
        self
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn wrong_penalty_secs(&self) -> u32 {
        self.wrong_penalty_secs
    }

    #[must_use]
    pub fn pass_penalty_secs(&self) -> u32 {
        self.pass_penalty_secs
    }

    #[must_use]
    pub fn allow_pass(&self) -> bool {
        self.allow_pass
    }
}

impl Default for RushConfig {
    fn default() -> Self {
        Self {
            duration_secs: scoring::SESSION_DURATION_SECS,
            wrong_penalty_secs: scoring::WRONG_ANSWER_PENALTY_SECS,
            pass_penalty_secs: scoring::PASS_PENALTY_SECS,
            allow_pass: true,
        }
    }
}

//
// ─── EVENTS ────────────────────────────────────────────────────────────────────
//

/// Verdict reported by a game widget for the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Correct,
    Wrong,
    Pass,
}

/// Effect of resolving one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub answer: Answer,
    pub level: Level,
    pub points_awarded: u32,
    /// Seconds actually added to (positive) or removed from (negative) the
    /// countdown; penalties clamp at zero so this can be smaller than the
    /// nominal penalty.
    pub time_delta: i32,
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running { time_remaining: u32 },
    Finished { final_score: u32 },
}

/// Lifecycle of a session: `NotStarted → Running → GameOver`, with
/// `GameOver` terminal until a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RushPhase {
    NotStarted,
    Running,
    GameOver,
}

/// Snapshot of the running state for frontends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RushProgress {
    pub time_remaining: u32,
    pub score: u32,
    pub answered: u32,
    pub is_over: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State machine for one Mixed Rush play-through.
///
/// Owns the countdown, the score, and the single in-flight question. All
/// mutation goes through [`tick`](Self::tick), [`resolve`](Self::resolve),
/// [`install_question`](Self::install_question) and [`reset`](Self::reset),
/// which enforce the phase transitions; driving the tick once per second is
/// the caller's job.
///
/// The generation counter orphans slow question fetches: a reset bumps it,
/// and [`install_question`](Self::install_question) rejects deliveries
/// tagged with any other generation.
#[derive(Debug, Clone)]
pub struct RushSession {
    id: SessionId,
    config: RushConfig,
    phase: RushPhase,
    time_remaining: u32,
    score: u32,
    current: Option<Question>,
    generation: u64,
    correct: u32,
    wrong: u32,
    passed: u32,
    started_at: Option<DateTime<Utc>>,
}

impl RushSession {
    #[must_use]
    pub fn new(config: RushConfig) -> Self {
        let time_remaining = config.duration_secs();
        Self {
            id: SessionId::new(),
            config,
            phase: RushPhase::NotStarted,
            time_remaining,
            score: 0,
            current: None,
            generation: 0,
            correct: 0,
            wrong: 0,
            passed: 0,
            started_at: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> &RushConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> RushPhase {
        self.phase
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == RushPhase::GameOver
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn progress(&self) -> RushProgress {
        RushProgress {
            time_remaining: self.time_remaining,
            score: self.score,
            answered: self.correct + self.wrong + self.passed,
            is_over: self.is_over(),
        }
    }

    /// Begins the countdown. The caller requests the first question next.
    ///
    /// # Errors
    ///
    /// Returns `RushError::AlreadyStarted` unless the session is fresh.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), RushError> {
        if self.phase != RushPhase::NotStarted {
            return Err(RushError::AlreadyStarted);
        }
        self.phase = RushPhase::Running;
        self.started_at = Some(now);
        Ok(())
    }

    /// Advances the countdown by one second.
    ///
    /// Reaching zero flips the session to `GameOver` and clears the current
    /// question; the caller must then submit the returned final score
    /// exactly once.
    ///
    /// # Errors
    ///
    /// Returns `RushError::NotRunning` outside the `Running` phase, so a
    /// straggling timer firing after game over cannot mutate anything.
    pub fn tick(&mut self) -> Result<Tick, RushError> {
        if self.phase != RushPhase::Running {
            return Err(RushError::NotRunning);
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            self.phase = RushPhase::GameOver;
            self.current = None;
            return Ok(Tick::Finished {
                final_score: self.score,
            });
        }
        Ok(Tick::Running {
            time_remaining: self.time_remaining,
        })
    }

    /// Installs a fetched question as the current one.
    ///
    /// # Errors
    ///
    /// Returns `RushError::StaleQuestion` when `generation` predates a
    /// reset, and `RushError::NotRunning` for deliveries after game over.
    /// Both mean the fetched question must be discarded.
    pub fn install_question(
        &mut self,
        generation: u64,
        question: Question,
    ) -> Result<(), RushError> {
        if generation != self.generation {
            return Err(RushError::StaleQuestion {
                expected: self.generation,
                got: generation,
            });
        }
        if self.phase != RushPhase::Running {
            return Err(RushError::NotRunning);
        }
        self.current = Some(question);
        Ok(())
    }

    /// Resolves the current question with the widget's verdict, applying
    /// score and countdown effects. The question is consumed, so each
    /// instance resolves at most once; the caller fetches the next one.
    ///
    /// # Errors
    ///
    /// Returns `RushError::NotRunning` after game over,
    /// `RushError::PassDisabled` when passing is configured off, and
    /// `RushError::NoCurrentQuestion` when nothing is in play (including a
    /// second resolution of an already-resolved question).
    pub fn resolve(&mut self, answer: Answer) -> Result<Resolution, RushError> {
        if self.phase != RushPhase::Running {
            return Err(RushError::NotRunning);
        }
        if answer == Answer::Pass && !self.config.allow_pass() {
            return Err(RushError::PassDisabled);
        }
        let question = self.current.take().ok_or(RushError::NoCurrentQuestion)?;
        let level = question.level();

        let resolution = match answer {
            Answer::Correct => {
                let points = scoring::points_for(level);
                let bonus = scoring::time_bonus_for(level);
                self.score += points;
                self.time_remaining += bonus;
                self.correct += 1;
                Resolution {
                    answer,
                    level,
                    points_awarded: points,
                    time_delta: i32::try_from(bonus).unwrap_or(i32::MAX),
                }
            }
            Answer::Wrong => {
                let applied = self.apply_penalty(self.config.wrong_penalty_secs());
                self.wrong += 1;
                Resolution {
                    answer,
                    level,
                    points_awarded: 0,
                    time_delta: -applied,
                }
            }
            Answer::Pass => {
                let applied = self.apply_penalty(self.config.pass_penalty_secs());
                self.passed += 1;
                Resolution {
                    answer,
                    level,
                    points_awarded: 0,
                    time_delta: -applied,
                }
            }
        };
        Ok(resolution)
    }

    /// "Play Again": every field returns to its initial value and the
    /// generation is bumped so in-flight fetches from the previous
    /// play-through are discarded on arrival.
    pub fn reset(&mut self) {
        self.id = SessionId::new();
        self.generation += 1;
        self.phase = RushPhase::NotStarted;
        self.time_remaining = self.config.duration_secs();
        self.score = 0;
        self.current = None;
        self.correct = 0;
        self.wrong = 0;
        self.passed = 0;
        self.started_at = None;
    }

    /// Builds the end-of-session summary.
    ///
    /// # Errors
    ///
    /// Returns `RushError::NotFinished` before game over.
    pub fn summary(&self, completed_at: DateTime<Utc>) -> Result<RushSummary, RushError> {
        if self.phase != RushPhase::GameOver {
            return Err(RushError::NotFinished);
        }
        let started_at = self.started_at.ok_or(RushError::NotFinished)?;
        Ok(RushSummary::new(
            self.id,
            self.score,
            self.correct,
            self.wrong,
            self.passed,
            started_at,
            completed_at,
        )?)
    }

    /// Clamped countdown deduction; returns the seconds actually removed.
    fn apply_penalty(&mut self, penalty_secs: u32) -> i32 {
        let applied = penalty_secs.min(self.time_remaining);
        self.time_remaining -= applied;
        i32::try_from(applied).unwrap_or(i32::MAX)
    }
}

impl Default for RushSession {
    fn default() -> Self {
        Self::new(RushConfig::default())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        FillInTheBlank, Level, Question, QuestionId, QuestionPayload, SentenceScramble,
    };
    use crate::time::fixed_now;
    use chrono::Duration;

    fn scramble_question(level: u8) -> Question {
        let payload = SentenceScramble::new(
            vec!["runs".to_string(), "she".to_string()],
            "she runs",
        )
        .unwrap();
        Question::new(
            Some(QuestionId::new(format!("q-{level}"))),
            Level::new(level),
            QuestionPayload::SentenceScramble(payload),
        )
    }

    fn blank_question(level: u8) -> Question {
        let payload = FillInTheBlank::new(
            ["Ich ".to_string(), " Wasser.".to_string()],
            vec!["trinke".to_string(), "esse".to_string()],
            "trinke",
        )
        .unwrap();
        Question::new(None, Level::new(level), QuestionPayload::FillInTheBlank(payload))
    }

    fn running_session() -> RushSession {
        let mut session = RushSession::new(RushConfig::default());
        session.start(fixed_now()).unwrap();
        session
    }

    #[test]
    fn starts_with_spec_duration() {
        let session = RushSession::default();
        assert_eq!(session.time_remaining(), 75);
        assert_eq!(session.score(), 0);
        assert_eq!(session.phase(), RushPhase::NotStarted);
    }

    #[test]
    fn tick_requires_running_phase() {
        let mut session = RushSession::default();
        assert_eq!(session.tick(), Err(RushError::NotRunning));
    }

    #[test]
    fn correct_answer_awards_table_points_and_bonus() {
        let cases = [(1, 5, 2), (2, 7, 3), (3, 10, 4), (4, 15, 5), (5, 17, 6)];
        for (level, points, bonus) in cases {
            let mut session = running_session();
            session.install_question(0, scramble_question(level)).unwrap();
            let res = session.resolve(Answer::Correct).unwrap();
            assert_eq!(res.points_awarded, points);
            assert_eq!(res.time_delta, i32::try_from(bonus).unwrap());
            assert_eq!(session.score(), points);
            assert_eq!(session.time_remaining(), 75 + bonus);
        }
    }

    #[test]
    fn unmapped_level_awards_nothing() {
        let mut session = running_session();
        session.install_question(0, scramble_question(9)).unwrap();
        let res = session.resolve(Answer::Correct).unwrap();
        assert_eq!(res.points_awarded, 0);
        assert_eq!(res.time_delta, 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.time_remaining(), 75);
    }

    #[test]
    fn wrong_answer_costs_ten_seconds_and_no_points() {
        let mut session = running_session();
        session.install_question(0, blank_question(3)).unwrap();
        let res = session.resolve(Answer::Wrong).unwrap();
        assert_eq!(res.points_awarded, 0);
        assert_eq!(res.time_delta, -10);
        assert_eq!(session.score(), 0);
        assert_eq!(session.time_remaining(), 65);
    }

    #[test]
    fn pass_costs_five_seconds() {
        let mut session = running_session();
        session.install_question(0, blank_question(2)).unwrap();
        let res = session.resolve(Answer::Pass).unwrap();
        assert_eq!(res.time_delta, -5);
        assert_eq!(session.time_remaining(), 70);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn penalties_clamp_at_zero() {
        let config = RushConfig::new(3, 10, 5).unwrap();
        let mut session = RushSession::new(config);
        session.start(fixed_now()).unwrap();
        session.install_question(0, blank_question(1)).unwrap();

        let res = session.resolve(Answer::Wrong).unwrap();
        assert_eq!(res.time_delta, -3);
        assert_eq!(session.time_remaining(), 0);

        // Game over happens on the next tick, not on the answer itself.
        assert_eq!(session.phase(), RushPhase::Running);
        assert_eq!(session.tick(), Ok(Tick::Finished { final_score: 0 }));
        assert!(session.is_over());
    }

    #[test]
    fn pass_can_be_disabled() {
        let config = RushConfig::default().with_allow_pass(false);
        let mut session = RushSession::new(config);
        session.start(fixed_now()).unwrap();
        session.install_question(0, blank_question(1)).unwrap();

        assert_eq!(session.resolve(Answer::Pass), Err(RushError::PassDisabled));
        // The question stays in play after the rejected pass.
        assert!(session.current_question().is_some());
        assert!(session.resolve(Answer::Correct).is_ok());
    }

    #[test]
    fn question_resolves_at_most_once() {
        let mut session = running_session();
        session.install_question(0, scramble_question(1)).unwrap();
        session.resolve(Answer::Correct).unwrap();
        assert_eq!(
            session.resolve(Answer::Correct),
            Err(RushError::NoCurrentQuestion)
        );
    }

    #[test]
    fn countdown_runs_to_game_over_with_zero_answers() {
        let mut session = running_session();
        for second in (1..75).rev() {
            assert_eq!(
                session.tick(),
                Ok(Tick::Running {
                    time_remaining: second
                })
            );
        }
        assert_eq!(session.tick(), Ok(Tick::Finished { final_score: 0 }));
        assert!(session.is_over());
        assert_eq!(session.current_question(), None);
        assert_eq!(session.tick(), Err(RushError::NotRunning));
    }

    #[test]
    fn three_level_one_corrects_score_fifteen() {
        let mut session = running_session();
        let mut ticks = 0;
        for _ in 0..3 {
            session.tick().unwrap();
            ticks += 1;
            session.install_question(0, scramble_question(1)).unwrap();
            session.resolve(Answer::Correct).unwrap();
        }
        assert_eq!(session.score(), 15);
        assert_eq!(session.time_remaining(), 75 - ticks + 6);
    }

    #[test]
    fn no_mutation_after_game_over() {
        let config = RushConfig::new(1, 10, 5).unwrap();
        let mut session = RushSession::new(config);
        session.start(fixed_now()).unwrap();
        assert_eq!(session.tick(), Ok(Tick::Finished { final_score: 0 }));

        assert_eq!(session.resolve(Answer::Correct), Err(RushError::NotRunning));
        assert_eq!(
            session.install_question(0, scramble_question(1)),
            Err(RushError::NotRunning)
        );
        assert_eq!(session.tick(), Err(RushError::NotRunning));
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn stale_generation_is_rejected_after_reset() {
        let mut session = running_session();
        let old_generation = session.generation();
        session.reset();
        session.start(fixed_now()).unwrap();

        let err = session
            .install_question(old_generation, scramble_question(1))
            .unwrap_err();
        assert_eq!(
            err,
            RushError::StaleQuestion {
                expected: old_generation + 1,
                got: old_generation
            }
        );
        assert_eq!(session.current_question(), None);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut session = running_session();
        let first_id = session.id();
        session.install_question(0, scramble_question(4)).unwrap();
        session.resolve(Answer::Correct).unwrap();
        session.tick().unwrap();

        session.reset();
        assert_eq!(session.phase(), RushPhase::NotStarted);
        assert_eq!(session.score(), 0);
        assert_eq!(session.time_remaining(), 75);
        assert_eq!(session.current_question(), None);
        assert_eq!(session.generation(), 1);
        assert_ne!(session.id(), first_id);
        assert!(!session.is_over());
    }

    #[test]
    fn summary_reflects_final_state() {
        let config = RushConfig::new(5, 10, 5).unwrap();
        let mut session = RushSession::new(config);
        let started = fixed_now();
        session.start(started).unwrap();

        session.install_question(0, scramble_question(3)).unwrap();
        session.resolve(Answer::Correct).unwrap();
        session.install_question(0, blank_question(1)).unwrap();
        session.resolve(Answer::Wrong).unwrap();

        while !session.is_over() {
            session.tick().unwrap();
        }

        let completed = started + Duration::seconds(9);
        let summary = session.summary(completed).unwrap();
        assert_eq!(summary.final_score(), 10);
        assert_eq!(summary.correct(), 1);
        assert_eq!(summary.wrong(), 1);
        assert_eq!(summary.passed(), 0);
        assert_eq!(summary.total_answered(), 2);
        assert_eq!(summary.started_at(), started);
        assert_eq!(summary.completed_at(), completed);
    }

    #[test]
    fn progress_snapshot_tracks_the_session() {
        let mut session = running_session();
        session.tick().unwrap();
        session.install_question(0, scramble_question(2)).unwrap();
        session.resolve(Answer::Correct).unwrap();

        let progress = session.progress();
        assert_eq!(progress.time_remaining, 74 + 3);
        assert_eq!(progress.score, 7);
        assert_eq!(progress.answered, 1);
        assert!(!progress.is_over);
    }

    #[test]
    fn summary_requires_game_over() {
        let session = running_session();
        assert_eq!(
            session.summary(fixed_now()),
            Err(RushError::NotFinished)
        );
    }
}
