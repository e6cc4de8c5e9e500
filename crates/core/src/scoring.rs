use crate::model::Level;

//
// ─── SESSION CONSTANTS ─────────────────────────────────────────────────────────
//

/// Countdown length of a rush session, in seconds.
pub const SESSION_DURATION_SECS: u32 = 75;

/// Seconds removed from the countdown for a wrong answer.
pub const WRONG_ANSWER_PENALTY_SECS: u32 = 10;

/// Seconds removed from the countdown for passing on a question.
pub const PASS_PENALTY_SECS: u32 = 5;

//
// ─── LOOKUP TABLES ─────────────────────────────────────────────────────────────
//

/// Points awarded for a correct answer at the given difficulty level.
///
/// Levels outside 1–5 award nothing.
///
/// # Examples
///
/// ```
/// # use rush_core::model::Level;
/// # use rush_core::scoring::points_for;
/// assert_eq!(points_for(Level::new(3)), 10);
/// assert_eq!(points_for(Level::new(9)), 0);
/// ```
#[must_use]
pub fn points_for(level: Level) -> u32 {
    match level.value() {
        1 => 5,
        2 => 7,
        3 => 10,
        4 => 15,
        5 => 17,
        _ => 0,
    }
}

/// Seconds added to the countdown for a correct answer at the given level.
///
/// Levels outside 1–5 add nothing.
#[must_use]
pub fn time_bonus_for(level: Level) -> u32 {
    match level.value() {
        1 => 2,
        2 => 3,
        3 => 4,
        4 => 5,
        5 => 6,
        _ => 0,
    }
}
