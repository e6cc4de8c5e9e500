use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{Duration, advance};

use rush_core::model::{
    FillInTheBlank, LanguageCode, Level, Question, QuestionId, QuestionPayload, RushSummary,
};
use rush_core::session::{Answer, RushConfig};
use rush_core::time::fixed_clock;
use services::{
    PlayerEvent, QuestionSupply, RushController, RushUpdate, ScoreSink, SubmitError, SupplyError,
};
use storage::repository::{InMemoryRepository, SeenQuestionRepository};

//
// ─── TEST DOUBLES ──────────────────────────────────────────────────────────────
//

fn level_one_question(n: u32) -> Question {
    let payload = FillInTheBlank::new(
        ["Ich ".to_string(), " Wasser.".to_string()],
        vec!["trinke".to_string(), "esse".to_string()],
        "trinke",
    )
    .unwrap();
    Question::new(
        Some(QuestionId::new(format!("q-{n}"))),
        Level::new(1),
        QuestionPayload::FillInTheBlank(payload),
    )
}

/// Serves numbered level-1 questions immediately.
#[derive(Default)]
struct NumberedSupply {
    counter: AtomicU32,
}

#[async_trait]
impl QuestionSupply for NumberedSupply {
    async fn next_question(&self, _language: &LanguageCode) -> Result<Question, SupplyError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(level_one_question(n))
    }
}

/// Takes longer than the whole session to produce its first question.
struct SlowSupply {
    delay: Duration,
}

#[async_trait]
impl QuestionSupply for SlowSupply {
    async fn next_question(&self, _language: &LanguageCode) -> Result<Question, SupplyError> {
        tokio::time::sleep(self.delay).await;
        Ok(level_one_question(0))
    }
}

/// Fails the first `failures` calls, then serves questions.
struct FlakySupply {
    failures_left: AtomicU32,
    counter: AtomicU32,
}

impl FlakySupply {
    fn new(failures: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
            counter: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl QuestionSupply for FlakySupply {
    async fn next_question(&self, _language: &LanguageCode) -> Result<Question, SupplyError> {
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(SupplyError::RetriesExhausted {
                attempts: 3,
                last_error: "connection refused".to_string(),
            });
        }
        Ok(level_one_question(self.counter.fetch_add(1, Ordering::SeqCst)))
    }
}

/// Records every submitted score.
struct RecordingSink {
    scores: Arc<Mutex<Vec<u32>>>,
}

#[async_trait]
impl ScoreSink for RecordingSink {
    async fn submit_score(&self, score: u32) -> Result<(), SubmitError> {
        self.scores.lock().unwrap().push(score);
        Ok(())
    }
}

//
// ─── HARNESS ───────────────────────────────────────────────────────────────────
//

struct Harness {
    events: mpsc::Sender<PlayerEvent>,
    updates: mpsc::Receiver<RushUpdate>,
    scores: Arc<Mutex<Vec<u32>>>,
    seen: Arc<InMemoryRepository>,
    task: tokio::task::JoinHandle<Result<(), services::ControllerError>>,
}

impl Harness {
    fn start(config: RushConfig, supply: Arc<dyn QuestionSupply>) -> Self {
        let scores = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::new(RecordingSink {
            scores: Arc::clone(&scores),
        });
        let seen = Arc::new(InMemoryRepository::new());
        let controller = RushController::new(
            config,
            LanguageCode::default(),
            supply,
            sink,
            Arc::clone(&seen) as Arc<dyn SeenQuestionRepository>,
        )
        .with_clock(fixed_clock());

        let (event_tx, event_rx) = mpsc::channel(8);
        let (update_tx, update_rx) = mpsc::channel(64);
        let task = tokio::spawn(controller.run(event_rx, update_tx));

        Self {
            events: event_tx,
            updates: update_rx,
            scores,
            seen,
            task,
        }
    }

    async fn next_update(&mut self) -> RushUpdate {
        self.updates.recv().await.expect("controller stopped early")
    }

    /// Consumes updates until `want` matches, returning the match.
    async fn wait_for(&mut self, want: impl Fn(&RushUpdate) -> bool) -> RushUpdate {
        loop {
            let update = self.next_update().await;
            if want(&update) {
                return update;
            }
        }
    }

    /// Consumes updates until game over, returning the summary and
    /// everything seen along the way.
    async fn run_to_game_over(&mut self) -> (RushSummary, Vec<RushUpdate>) {
        let mut seen = Vec::new();
        loop {
            let update = self.next_update().await;
            if let RushUpdate::GameOver { summary } = update {
                return (summary, seen);
            }
            seen.push(update);
        }
    }

    async fn quit(mut self) -> Vec<RushUpdate> {
        self.events.send(PlayerEvent::Quit).await.expect("send quit");
        let mut rest = Vec::new();
        while let Some(update) = self.updates.recv().await {
            rest.push(update);
        }
        self.task.await.expect("join").expect("controller error");
        rest
    }

    fn submitted_scores(&self) -> Vec<u32> {
        self.scores.lock().unwrap().clone()
    }
}

fn heartbeat_count(updates: &[RushUpdate], duration_secs: u32) -> usize {
    updates
        .iter()
        .filter(|update| match update {
            RushUpdate::Status { time_remaining, .. } => *time_remaining < duration_secs,
            _ => false,
        })
        .count()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[tokio::test(start_paused = true)]
async fn idle_session_submits_zero_exactly_once() {
    let config = RushConfig::new(3, 10, 5).unwrap();
    let mut harness = Harness::start(config, Arc::new(SlowSupply {
        delay: Duration::from_secs(3600),
    }));

    let (summary, _) = harness.run_to_game_over().await;
    assert_eq!(summary.final_score(), 0);
    assert_eq!(summary.total_answered(), 0);

    // Give the fire-and-forget submission room to run, then extra ticks to
    // prove nothing fires twice.
    advance(Duration::from_secs(10)).await;
    assert_eq!(harness.submitted_scores(), vec![0]);

    harness.quit().await;
}

#[tokio::test(start_paused = true)]
async fn correct_answers_follow_the_level_table() {
    let mut harness = Harness::start(RushConfig::default(), Arc::new(NumberedSupply::default()));

    for expected_score in [5_u32, 10, 15] {
        harness
            .wait_for(|u| matches!(u, RushUpdate::QuestionReady(_)))
            .await;
        harness
            .events
            .send(PlayerEvent::Answered(Answer::Correct))
            .await
            .unwrap();
        let resolved = harness
            .wait_for(|u| matches!(u, RushUpdate::Resolved(_)))
            .await;
        match resolved {
            RushUpdate::Resolved(resolution) => {
                assert_eq!(resolution.points_awarded, 5);
                assert_eq!(resolution.time_delta, 2);
            }
            _ => unreachable!(),
        }
        let status = harness
            .wait_for(|u| matches!(u, RushUpdate::Status { .. }))
            .await;
        match status {
            RushUpdate::Status { score, .. } => assert_eq!(score, expected_score),
            _ => unreachable!(),
        }
    }

    // Every solved question lands in the seen ledger.
    assert_eq!(
        harness.seen.seen_count(&LanguageCode::default()).await.unwrap(),
        3
    );

    harness.quit().await;
}

#[tokio::test(start_paused = true)]
async fn wrong_and_pass_penalties_apply() {
    let mut harness = Harness::start(RushConfig::default(), Arc::new(NumberedSupply::default()));

    harness
        .wait_for(|u| matches!(u, RushUpdate::QuestionReady(_)))
        .await;
    harness
        .events
        .send(PlayerEvent::Answered(Answer::Wrong))
        .await
        .unwrap();
    match harness
        .wait_for(|u| matches!(u, RushUpdate::Resolved(_)))
        .await
    {
        RushUpdate::Resolved(resolution) => {
            assert_eq!(resolution.points_awarded, 0);
            assert_eq!(resolution.time_delta, -10);
        }
        _ => unreachable!(),
    }

    harness
        .wait_for(|u| matches!(u, RushUpdate::QuestionReady(_)))
        .await;
    harness
        .events
        .send(PlayerEvent::Answered(Answer::Pass))
        .await
        .unwrap();
    match harness
        .wait_for(|u| matches!(u, RushUpdate::Resolved(_)))
        .await
    {
        RushUpdate::Resolved(resolution) => {
            assert_eq!(resolution.points_awarded, 0);
            assert_eq!(resolution.time_delta, -5);
        }
        _ => unreachable!(),
    }

    // Neither outcome marks the question as solved.
    assert_eq!(
        harness.seen.seen_count(&LanguageCode::default()).await.unwrap(),
        0
    );

    harness.quit().await;
}

#[tokio::test(start_paused = true)]
async fn pass_can_be_configured_off() {
    let config = RushConfig::default().with_allow_pass(false);
    let mut harness = Harness::start(config, Arc::new(NumberedSupply::default()));

    harness
        .wait_for(|u| matches!(u, RushUpdate::QuestionReady(_)))
        .await;
    harness
        .events
        .send(PlayerEvent::Answered(Answer::Pass))
        .await
        .unwrap();
    harness
        .wait_for(|u| matches!(u, RushUpdate::PassUnavailable))
        .await;

    // The question is still in play and answers still work.
    harness
        .events
        .send(PlayerEvent::Answered(Answer::Correct))
        .await
        .unwrap();
    harness
        .wait_for(|u| matches!(u, RushUpdate::Resolved(_)))
        .await;

    harness.quit().await;
}

#[tokio::test(start_paused = true)]
async fn play_again_resets_everything_with_a_single_timer() {
    let config = RushConfig::new(3, 10, 5).unwrap();
    let mut harness = Harness::start(config, Arc::new(SlowSupply {
        delay: Duration::from_secs(3600),
    }));

    let (first, updates) = harness.run_to_game_over().await;
    assert_eq!(first.final_score(), 0);
    // One heartbeat per second: a duplicated timer would double this.
    assert_eq!(heartbeat_count(&updates, 3), 2);

    advance(Duration::from_secs(1)).await;
    assert_eq!(harness.submitted_scores(), vec![0]);

    harness.events.send(PlayerEvent::PlayAgain).await.unwrap();
    let fresh = harness
        .wait_for(|u| matches!(u, RushUpdate::Status { .. }))
        .await;
    match fresh {
        RushUpdate::Status {
            time_remaining,
            score,
        } => {
            assert_eq!(time_remaining, 3);
            assert_eq!(score, 0);
        }
        _ => unreachable!(),
    }

    let (second, updates) = harness.run_to_game_over().await;
    assert_eq!(second.final_score(), 0);
    assert_ne!(second.session_id(), first.session_id());
    assert_eq!(heartbeat_count(&updates, 3), 2);

    advance(Duration::from_secs(1)).await;
    // One submission per completed play-through.
    assert_eq!(harness.submitted_scores(), vec![0, 0]);

    harness.quit().await;
}

#[tokio::test(start_paused = true)]
async fn fetch_landing_after_game_over_is_discarded() {
    let config = RushConfig::new(2, 10, 5).unwrap();
    let mut harness = Harness::start(config, Arc::new(SlowSupply {
        delay: Duration::from_secs(30),
    }));

    let (_, updates) = harness.run_to_game_over().await;
    assert!(
        !updates
            .iter()
            .any(|u| matches!(u, RushUpdate::QuestionReady(_)))
    );

    // Let the slow fetch finish well after game over.
    advance(Duration::from_secs(60)).await;
    let rest = harness.quit().await;
    assert!(
        !rest
            .iter()
            .any(|u| matches!(u, RushUpdate::QuestionReady(_))),
        "stale fetch result must not surface a question"
    );
}

#[tokio::test(start_paused = true)]
async fn supply_failure_is_visible_and_refresh_recovers() {
    let mut harness = Harness::start(RushConfig::default(), Arc::new(FlakySupply::new(1)));

    harness
        .wait_for(|u| matches!(u, RushUpdate::SupplyFailed { .. }))
        .await;

    harness.events.send(PlayerEvent::Refresh).await.unwrap();
    harness
        .wait_for(|u| matches!(u, RushUpdate::QuestionReady(_)))
        .await;

    harness.quit().await;
}

#[tokio::test(start_paused = true)]
async fn answers_after_game_over_change_nothing() {
    let config = RushConfig::new(2, 10, 5).unwrap();
    let mut harness = Harness::start(config, Arc::new(NumberedSupply::default()));

    harness.run_to_game_over().await;
    harness
        .events
        .send(PlayerEvent::Answered(Answer::Correct))
        .await
        .unwrap();

    let rest = harness.quit().await;
    assert!(
        !rest.iter().any(|u| matches!(u, RushUpdate::Resolved(_))),
        "late answers must not resolve"
    );
}
