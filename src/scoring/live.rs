//! Live, one-ball-at-a-time scoring with undo.
//!
//! Each delivery is recorded through the shared innings ledger without
//! refolding the log.  Before it is applied, the pre-ball state is pushed onto
//! a bounded [`UndoLog`] kept inside the match document, so undo is a plain
//! restore rather than inverse arithmetic per extras type.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use crate::db::models::{
    BallEvent, BatsmanStat, BowlerStat, CurrentPlayers, FallOfWicket, Innings, Match, MatchStatus,
};
use crate::error::ScoringError;

use super::ledger::{next_players, InningsLedger};
use super::request::RawBall;
use super::ScoringRules;

/// Everything one delivery can change, captured before it is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    status: MatchStatus,
    current_innings: u8,
    current: CurrentPlayers,
    innings: [Innings; 2],
    batting: Vec<BatsmanStat>,
    bowling: Vec<BowlerStat>,
    fall_of_wickets: Vec<FallOfWicket>,
    ball_events_len: usize,
}

impl Snapshot {
    pub fn capture(m: &Match) -> Self {
        Snapshot {
            status: m.status,
            current_innings: m.current_innings,
            current: m.current.clone(),
            innings: m.innings.clone(),
            batting: m.batting.clone(),
            bowling: m.bowling.clone(),
            fall_of_wickets: m.fall_of_wickets.clone(),
            ball_events_len: m.ball_events.len(),
        }
    }

    /// Puts the match back and returns the ball events recorded since.
    fn restore(self, m: &mut Match) -> Vec<BallEvent> {
        m.status = self.status;
        m.current_innings = self.current_innings;
        m.current = self.current;
        m.innings = self.innings;
        m.batting = self.batting;
        m.bowling = self.bowling;
        m.fall_of_wickets = self.fall_of_wickets;
        let keep = self.ball_events_len.min(m.ball_events.len());
        m.ball_events.split_off(keep)
    }
}

/// Pre-ball snapshots, one per delivery since the innings was last replayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UndoLog {
    entries: VecDeque<Snapshot>,
}

impl UndoLog {
    /// Pushes a snapshot, dropping the oldest beyond `depth`.
    pub fn push(&mut self, snapshot: Snapshot, depth: usize) {
        if depth == 0 {
            return;
        }
        while self.entries.len() >= depth {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    pub fn pop(&mut self) -> Option<Snapshot> {
        self.entries.pop_back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveBall {
    pub over_complete: bool,
    pub wicket: bool,
}

/// Applies one delivery to the active innings.
pub fn apply_delivery(
    m: &mut Match,
    ball: &RawBall,
    rules: &ScoringRules,
) -> Result<LiveBall, ScoringError> {
    let snapshot = Snapshot::capture(m);
    record_delivery(m, ball, rules, snapshot)
}

/// Applies one delivery, with `snapshot` as the state undo returns to.
pub fn record_delivery(
    m: &mut Match,
    ball: &RawBall,
    rules: &ScoringRules,
    snapshot: Snapshot,
) -> Result<LiveBall, ScoringError> {
    let who = ball.participants(&m.current)?;
    let outcome = (rules.classify)(ball);

    let mut ledger = InningsLedger::detach(m);
    let recorded = ledger.record(&who, &outcome);
    ledger.attach(m);

    m.current = next_players(&who, &outcome, &recorded);
    m.undo_log.push(snapshot, rules.undo_depth);

    if recorded.over_complete {
        debug!(
            "Match {}: over complete, {} to choose the next bowler",
            m.id,
            m.team_name(m.active_innings().bowling_team)
        );
    }

    Ok(LiveBall {
        over_complete: recorded.over_complete,
        wicket: recorded.dismissed.is_some(),
    })
}

/// Reverts the most recently applied delivery and returns it.
pub fn undo_last_ball(m: &mut Match) -> Result<BallEvent, ScoringError> {
    let snapshot = m.undo_log.pop().ok_or(ScoringError::NothingToUndo)?;
    let mut removed = snapshot.restore(m);
    removed.pop().ok_or(ScoringError::NothingToUndo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{MatchFormat, NewMatch, PlayerRef, Team};
    use crate::scoring::request::TossRequest;
    use chrono::Utc;

    fn live_match() -> Match {
        let mut m = Match::new(
            NewMatch {
                id: "m1".into(),
                format: MatchFormat::t20(),
                team_a: Team::named("Strikers"),
                team_b: Team::named("Thunder"),
            },
            Utc::now(),
        )
        .unwrap();
        m.set_toss(
            &TossRequest {
                toss_winner_team: "teamA".into(),
                decision: "bat".into(),
            },
            Utc::now(),
        )
        .unwrap();
        m
    }

    fn ball(runs: u32) -> RawBall {
        RawBall::new(runs).striker("A").non_striker("B").bowler("X")
    }

    #[test]
    fn test_six_dots_complete_an_over() {
        let mut m = live_match();
        let rules = ScoringRules::default();
        let first = apply_delivery(&mut m, &ball(0), &rules).unwrap();
        assert!(!first.over_complete);
        // later balls fall back to the players at the crease
        for i in 1..6 {
            let live = apply_delivery(&mut m, &RawBall::new(0), &rules).unwrap();
            assert_eq!(live.over_complete, i == 5);
            if i < 5 {
                assert_eq!(m.current.striker, Some(PlayerRef::new("A")));
            }
        }
        let inn = m.active_innings();
        assert_eq!(inn.overs_display(), "1.0");
        assert_eq!(inn.score, 0);
        assert_eq!(m.bowling[0].maidens, 1);
        // ends change at the end of the over; the bowler must be named again
        assert_eq!(m.current.striker, Some(PlayerRef::new("B")));
        assert!(m.current.bowler.is_none());
    }

    #[test]
    fn test_no_maiden_when_bowler_changes_mid_over() {
        let mut m = live_match();
        let rules = ScoringRules::default();
        for i in 0..6 {
            let bowler = if i < 3 { "X" } else { "Y" };
            apply_delivery(&mut m, &ball(0).bowler(bowler), &rules).unwrap();
        }
        assert_eq!(m.active_innings().overs_display(), "1.0");
        assert!(m.bowling.iter().all(|b| b.maidens == 0));
        assert_eq!(m.bowler(1, &PlayerRef::new("Y")).unwrap().balls, 3);
    }

    #[test]
    fn test_no_maiden_when_over_contains_a_wide() {
        let mut m = live_match();
        let rules = ScoringRules::default();
        apply_delivery(&mut m, &ball(0).extra("wd"), &rules).unwrap();
        for _ in 0..6 {
            apply_delivery(&mut m, &ball(0), &rules).unwrap();
        }
        assert_eq!(m.active_innings().overs_display(), "1.0");
        let x = m.bowler(1, &PlayerRef::new("X")).unwrap();
        assert_eq!((x.balls, x.runs, x.wides, x.maidens), (6, 1, 1, 0));
    }

    #[test]
    fn test_odd_runs_rotate_strike() {
        let mut m = live_match();
        let rules = ScoringRules::default();
        apply_delivery(&mut m, &ball(1), &rules).unwrap();
        assert_eq!(m.current.striker, Some(PlayerRef::new("B")));
        assert_eq!(m.current.non_striker, Some(PlayerRef::new("A")));

        apply_delivery(&mut m, &RawBall::new(2), &rules).unwrap();
        assert_eq!(m.current.striker, Some(PlayerRef::new("B")));

        // penalty run alone never rotates
        apply_delivery(&mut m, &RawBall::new(1).extra("wd"), &rules).unwrap();
        assert_eq!(m.current.striker, Some(PlayerRef::new("B")));

        // leg-bye single does
        apply_delivery(&mut m, &RawBall::new(1).extra("lb"), &rules).unwrap();
        assert_eq!(m.current.striker, Some(PlayerRef::new("A")));
    }

    #[test]
    fn test_wicket_vacates_the_crease() {
        let mut m = live_match();
        let rules = ScoringRules::default();
        apply_delivery(&mut m, &ball(0).wicket("caught").fielder("Y"), &rules).unwrap();
        assert!(m.current.striker.is_none());
        assert_eq!(m.current.non_striker, Some(PlayerRef::new("B")));
        assert_eq!(m.active_innings().partnership.runs, 0);
        let err = apply_delivery(&mut m, &RawBall::new(0), &rules).unwrap_err();
        assert_eq!(err, ScoringError::MissingStriker);
    }

    #[test]
    fn test_apply_then_undo_restores_state() {
        let mut m = live_match();
        let rules = ScoringRules::default();
        apply_delivery(&mut m, &ball(4), &rules).unwrap();
        apply_delivery(&mut m, &RawBall::new(1).extra("nb"), &rules).unwrap();
        let before = m.clone();

        apply_delivery(&mut m, &RawBall::new(1).wicket("run out").dismissed("B"), &rules).unwrap();
        assert_ne!(m.active_innings(), before.active_innings());

        let undone = undo_last_ball(&mut m).unwrap();
        assert!(undone.is_wicket);
        assert_eq!(m.innings, before.innings);
        assert_eq!(m.batting, before.batting);
        assert_eq!(m.bowling, before.bowling);
        assert_eq!(m.fall_of_wickets, before.fall_of_wickets);
        assert_eq!(m.ball_events, before.ball_events);
        assert_eq!(m.current, before.current);
    }

    #[test]
    fn test_undo_log_is_bounded() {
        let mut m = live_match();
        let rules = ScoringRules {
            undo_depth: 2,
            ..ScoringRules::default()
        };
        for _ in 0..4 {
            apply_delivery(&mut m, &ball(0), &rules).unwrap();
        }
        assert_eq!(m.undo_log.len(), 2);
        undo_last_ball(&mut m).unwrap();
        undo_last_ball(&mut m).unwrap();
        assert_eq!(m.active_innings().balls, 2);
        assert_eq!(undo_last_ball(&mut m).unwrap_err(), ScoringError::NothingToUndo);
    }
}
