//! Terminal play loop: renders controller updates, turns typed lines into
//! player events.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use rush_core::model::Question;
use rush_core::session::Answer;
use services::{PlayerEvent, RushUpdate};

use crate::widgets::{self, Verdict};

const HELP: &str = "Commands: type your answer, 'pass' to skip, 'retry' after a load failure, \
'again' from the game-over screen, 'quit' to leave.";

pub async fn play(
    events: mpsc::Sender<PlayerEvent>,
    mut updates: mpsc::Receiver<RushUpdate>,
) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut current: Option<Question> = None;
    let mut game_over = false;

    println!("Mixed Rush: answer as many questions as you can before the timer runs out.");
    println!("{HELP}");

    loop {
        tokio::select! {
            maybe_update = updates.recv() => {
                // Controller gone means the session is over for good.
                let Some(update) = maybe_update else { break };
                render_update(update, &mut current, &mut game_over);
            }
            maybe_line = lines.next_line() => {
                let Some(line) = maybe_line? else {
                    // stdin closed; tear the session down.
                    let _ = events.send(PlayerEvent::Quit).await;
                    break;
                };
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if !handle_input(input, &events, &mut current, &mut game_over).await {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn render_update(update: RushUpdate, current: &mut Option<Question>, game_over: &mut bool) {
    match update {
        RushUpdate::Loading => println!("Loading next question..."),
        RushUpdate::QuestionReady(question) => {
            println!();
            println!("{}", widgets::render(question.payload()));
            *current = Some(question);
        }
        RushUpdate::Status {
            time_remaining,
            score,
        } => println!("[ {time_remaining:>3}s | score {score} ]"),
        RushUpdate::Resolved(resolution) => {
            *current = None;
            match resolution.answer {
                Answer::Correct => println!(
                    "Correct! +{} points, +{}s.",
                    resolution.points_awarded, resolution.time_delta
                ),
                Answer::Wrong => println!("Wrong! {}s.", resolution.time_delta),
                Answer::Pass => println!("Passed. {}s.", resolution.time_delta),
            }
        }
        RushUpdate::SupplyFailed { error } => {
            println!("Could not load the next question ({error}). Type 'retry' to try again.");
        }
        RushUpdate::UnsupportedSkipped { kind } => {
            println!("Skipped a '{kind}' question this client cannot play.");
        }
        RushUpdate::PassUnavailable => println!("Passing is disabled for this session."),
        RushUpdate::GameOver { summary } => {
            *current = None;
            *game_over = true;
            println!();
            println!("Time's up! Final score: {}", summary.final_score());
            println!(
                "Answered {} ({} correct, {} wrong, {} passed).",
                summary.total_answered(),
                summary.correct(),
                summary.wrong(),
                summary.passed()
            );
            println!("Type 'again' to play again, or 'quit' to leave.");
        }
    }
}

/// Returns false when the loop should stop.
async fn handle_input(
    input: &str,
    events: &mpsc::Sender<PlayerEvent>,
    current: &mut Option<Question>,
    game_over: &mut bool,
) -> bool {
    match input.to_ascii_lowercase().as_str() {
        "quit" | "q" => {
            let _ = events.send(PlayerEvent::Quit).await;
            return false;
        }
        "help" | "?" => {
            println!("{HELP}");
            return true;
        }
        "again" | "a" if *game_over => {
            *game_over = false;
            let _ = events.send(PlayerEvent::PlayAgain).await;
            return true;
        }
        "retry" => {
            let _ = events.send(PlayerEvent::Refresh).await;
            return true;
        }
        "pass" | "p" => {
            if current.is_some() {
                let _ = events.send(PlayerEvent::Answered(Answer::Pass)).await;
            } else {
                println!("No question to pass on.");
            }
            return true;
        }
        _ => {}
    }

    let Some(question) = current.as_ref() else {
        println!("No question in play. {HELP}");
        return true;
    };
    match widgets::evaluate(question.payload(), input) {
        Some(Verdict::Correct) => {
            *current = None;
            let _ = events.send(PlayerEvent::Answered(Answer::Correct)).await;
        }
        Some(Verdict::Incorrect) => {
            *current = None;
            let _ = events.send(PlayerEvent::Answered(Answer::Wrong)).await;
        }
        None => println!("This question cannot be answered here."),
    }
    true
}
