//! Full innings recomputation from a corrected ball log.

use tracing::debug;

use crate::db::models::{CurrentPlayers, Match};
use crate::error::ScoringError;

use super::classifier::Classifier;
use super::ledger::{next_players, InningsLedger};
use super::request::RawBall;

/// Rebuilds the active innings from `balls`, replacing its score, figures,
/// fall of wickets and ball events.  The other innings is left untouched.
///
/// Every entry is validated before anything is written, so a bad entry
/// leaves the match as it was.  Entries after the innings has ended (all
/// out, overs used up, target reached) are rejected as invalid.
pub fn replay_innings(
    m: &mut Match,
    balls: &[RawBall],
    classify: Classifier,
) -> Result<(), ScoringError> {
    let participants = balls
        .iter()
        .enumerate()
        .map(|(index, ball)| {
            ball.participants(&CurrentPlayers::default())
                .map_err(|e| ScoringError::InvalidBall {
                    index,
                    reason: e.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut ledger = InningsLedger::blank(m);
    let mut last = None;
    for (index, (who, ball)) in participants.iter().zip(balls).enumerate() {
        if ledger.is_finished() {
            return Err(ScoringError::InvalidBall {
                index,
                reason: format!(
                    "the innings was already over at {}/{} ({})",
                    ledger.innings.score,
                    ledger.innings.wickets,
                    ledger.innings.overs_display()
                ),
            });
        }
        let outcome = classify(ball);
        let recorded = ledger.record(who, &outcome);
        last = Some((who, outcome, recorded));
    }
    ledger.attach(m);

    m.current = match last {
        Some((who, outcome, recorded)) => next_players(who, &outcome, &recorded),
        None => CurrentPlayers::default(),
    };
    m.undo_log.clear();

    debug!(
        "Match {}: replayed innings {} from {} balls ({})",
        m.id,
        m.current_innings,
        balls.len(),
        m.active_innings().overs_display()
    );
    Ok(())
}
