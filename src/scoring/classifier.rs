//! Delivery outcome classification.
//!
//! A single pure function turns one raw ball description into the numbers
//! every other part of the engine consumes.  Replay and live scoring both
//! receive it through [`ScoringRules`](super::ScoringRules).

use crate::db::models::{ExtraType, WicketKind};

use super::request::RawBall;

/// Signature of the classification rule injected into both scoring paths.
pub type Classifier = fn(&RawBall) -> Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub extra_type: ExtraType,
    pub total_runs: u32,
    /// Credited to the striker's personal tally.
    pub batter_runs: u32,
    pub extra_runs: u32,
    /// Counts toward the over.
    pub is_legal: bool,
    /// Charged to the bowler's figures.
    pub bowler_runs: u32,
    /// Runs the batters physically ran or hit (excludes the mandatory
    /// wide/no-ball penalty run).
    pub runs_run: u32,
    pub is_wicket: bool,
    pub wicket_kind: Option<WicketKind>,
    pub bowler_wicket: bool,
}

impl Outcome {
    /// Batters end up at opposite ends after an odd number of runs.
    pub fn rotates_strike(&self) -> bool {
        self.runs_run % 2 == 1
    }
}

/// Classify one delivery.
pub fn classify(ball: &RawBall) -> Outcome {
    let extra_type = ExtraType::from_token(ball.extra_type.as_deref());

    // A wide or no-ball always costs at least the penalty run.
    let total_runs = if extra_type.is_illegal() {
        ball.runs.max(1)
    } else {
        ball.runs
    };

    let batter_runs = match extra_type {
        ExtraType::None => total_runs,
        ExtraType::NoBall => total_runs - 1,
        ExtraType::Wide | ExtraType::Bye | ExtraType::LegBye => 0,
    };
    let runs_run = if extra_type.is_illegal() {
        total_runs - 1
    } else {
        total_runs
    };
    let bowler_runs = match extra_type {
        ExtraType::Bye | ExtraType::LegBye => 0,
        _ => total_runs,
    };

    let wicket_kind = ball
        .is_wicket
        .then(|| WicketKind::from_token(ball.wicket_kind.as_deref()));

    Outcome {
        extra_type,
        total_runs,
        batter_runs,
        extra_runs: total_runs - batter_runs,
        is_legal: !extra_type.is_illegal(),
        bowler_runs,
        runs_run,
        is_wicket: ball.is_wicket,
        wicket_kind,
        bowler_wicket: wicket_kind.is_some_and(WicketKind::credits_bowler),
    }
}
