//! Per-ball bookkeeping shared by replay and live scoring.
//!
//! An [`InningsLedger`] holds one innings' worth of materialized state (the
//! innings record, its stat rows, fall of wickets and ball events) detached
//! from the match.  Replay starts it blank and folds a whole log through
//! [`InningsLedger::record`]; live scoring detaches the existing state and
//! records a single ball.

use crate::db::models::{
    BallEvent, BatsmanStat, BowlerStat, CurrentPlayers, Dismissal, ExtraType, FallOfWicket,
    Innings, Match, MatchFormat, Partnership, PlayerRef, WicketDetail, MAX_WICKETS,
};
use crate::db::models::{round2, runs_per_over};

use super::classifier::Outcome;
use super::identity::{same_player, RowBook};
use super::request::Participants;

/// What a recorded ball did beyond the numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub over_complete: bool,
    pub dismissed: Option<PlayerRef>,
}

pub struct InningsLedger {
    number: u8,
    format: MatchFormat,
    next_ball_number: u32,
    pub innings: Innings,
    pub batting: RowBook<BatsmanStat>,
    pub bowling: RowBook<BowlerStat>,
    pub fall_of_wickets: Vec<FallOfWicket>,
    pub events: Vec<BallEvent>,
}

impl InningsLedger {
    /// Takes the active innings' rows and events out of the match.
    pub fn detach(m: &mut Match) -> Self {
        let number = m.current_innings;
        let next_ball_number = m.ball_events.iter().map(|e| e.ball_number).max().unwrap_or(0) + 1;

        let (batting, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut m.batting)
            .into_iter()
            .partition(|r| r.innings == number);
        m.batting = rest;
        let (bowling, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut m.bowling)
            .into_iter()
            .partition(|r| r.innings == number);
        m.bowling = rest;
        let (fall_of_wickets, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut m.fall_of_wickets)
            .into_iter()
            .partition(|f| f.innings == number);
        m.fall_of_wickets = rest;
        let (events, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut m.ball_events)
            .into_iter()
            .partition(|e| e.innings == number);
        m.ball_events = rest;

        InningsLedger {
            number,
            format: m.format.clone(),
            next_ball_number,
            innings: m.innings[m.innings_index()].clone(),
            batting: RowBook::new(batting),
            bowling: RowBook::new(bowling),
            fall_of_wickets,
            events,
        }
    }

    /// A blank slate for the active innings.  Team assignment and target are
    /// kept; ball numbering continues after the other innings' events.
    pub fn blank(m: &Match) -> Self {
        let number = m.current_innings;
        let prior = m.active_innings();
        let next_ball_number = m
            .ball_events
            .iter()
            .filter(|e| e.innings != number)
            .map(|e| e.ball_number)
            .max()
            .unwrap_or(0)
            + 1;
        let mut innings = Innings {
            batting_team: prior.batting_team,
            bowling_team: prior.bowling_team,
            target: prior.target,
            ..Innings::default()
        };
        refresh_rates(&mut innings, &m.format);

        InningsLedger {
            number,
            format: m.format.clone(),
            next_ball_number,
            innings,
            batting: RowBook::new(Vec::new()),
            bowling: RowBook::new(Vec::new()),
            fall_of_wickets: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Writes the ledger back, replacing whatever the match holds for this
    /// innings.
    pub fn attach(self, m: &mut Match) {
        let number = self.number;
        let index = m.innings_index();
        m.innings[index] = self.innings;

        m.batting.retain(|r| r.innings != number);
        m.batting.extend(self.batting.into_rows());
        m.batting.sort_by_key(|r| r.innings);

        m.bowling.retain(|r| r.innings != number);
        m.bowling.extend(self.bowling.into_rows());
        m.bowling.sort_by_key(|r| r.innings);

        m.fall_of_wickets.retain(|f| f.innings != number);
        m.fall_of_wickets.extend(self.fall_of_wickets);
        m.fall_of_wickets.sort_by_key(|f| f.innings);

        m.ball_events.retain(|e| e.innings != number);
        m.ball_events.extend(self.events);
        m.ball_events.sort_by_key(|e| (e.innings, e.ball_number));
    }

    /// Records one classified delivery.
    pub fn record(&mut self, who: &Participants, outcome: &Outcome) -> Recorded {
        let number = self.number;
        let bpo = self.format.balls_per_over;
        let over = self.innings.overs;
        let ball_in_over = self.innings.balls + 1;

        // team totals
        self.innings.extras.add(outcome.extra_type, outcome.extra_runs);
        self.innings.score += outcome.total_runs;
        self.innings.partnership.runs += outcome.total_runs;
        if outcome.is_legal {
            self.innings.partnership.balls += 1;
        }

        // striker
        let batter = self
            .batting
            .entry(&who.striker, || BatsmanStat::new(who.striker.clone(), number));
        if outcome.is_legal {
            batter.balls += 1;
        }
        batter.runs += outcome.batter_runs;
        // boundaries off a no-ball still count to the batter
        let plain = outcome.is_legal && outcome.extra_type == ExtraType::None;
        let off_the_bat = plain || outcome.extra_type == ExtraType::NoBall;
        match outcome.batter_runs {
            0 if plain => batter.dots += 1,
            1 if plain => batter.singles += 1,
            2 if plain => batter.twos += 1,
            3 if plain => batter.threes += 1,
            4 if off_the_bat => batter.fours += 1,
            6 if off_the_bat => batter.sixes += 1,
            _ => {}
        }
        batter.recompute();

        // bowler
        let bowler = self
            .bowling
            .entry(&who.bowler, || BowlerStat::new(who.bowler.clone(), number));
        if outcome.is_legal {
            bowler.balls += 1;
            if outcome.bowler_runs == 0 {
                bowler.dots += 1;
            }
        }
        bowler.runs += outcome.bowler_runs;
        match outcome.extra_type {
            ExtraType::Wide => bowler.wides += 1,
            ExtraType::NoBall => bowler.no_balls += 1,
            _ => {}
        }
        if outcome.bowler_wicket {
            bowler.wickets += 1;
        }
        bowler.recompute(bpo);

        // wicket
        let dismissal = outcome.wicket_kind.filter(|_| outcome.is_wicket).map(|kind| {
            self.innings.wickets = (self.innings.wickets + 1).min(MAX_WICKETS);
            let out = who
                .wicket_player
                .clone()
                .unwrap_or_else(|| who.striker.clone());
            let row = self
                .batting
                .entry(&out, || BatsmanStat::new(out.clone(), number));
            row.is_out = kind.is_out();
            row.dismissal = Some(Dismissal {
                kind,
                bowler: kind.credits_bowler().then(|| who.bowler.name.clone()),
                fielder: who.fielder.clone(),
                over,
            });
            self.innings.partnership = Partnership::default();
            (out, kind)
        });

        // over position
        let mut over_complete = false;
        if outcome.is_legal {
            self.innings.balls += 1;
            if self.innings.balls >= bpo {
                self.innings.overs += 1;
                self.innings.balls = 0;
                over_complete = true;
            }
        }

        if let Some((out, kind)) = &dismissal {
            self.fall_of_wickets.push(FallOfWicket {
                innings: number,
                wicket: self.fall_of_wickets.len() as u32 + 1,
                score: self.innings.score,
                overs: self.innings.overs_display(),
                player: out.clone(),
                kind: *kind,
            });
        }

        self.events.push(BallEvent {
            ball_number: self.next_ball_number,
            innings: number,
            over,
            ball: ball_in_over,
            is_legal: outcome.is_legal,
            striker: who.striker.clone(),
            non_striker: who.non_striker.clone(),
            bowler: who.bowler.clone(),
            total_runs: outcome.total_runs,
            batter_runs: outcome.batter_runs,
            extra_type: outcome.extra_type,
            extra_runs: outcome.extra_runs,
            is_wicket: outcome.is_wicket,
            wicket: dismissal.as_ref().map(|(out, kind)| WicketDetail {
                kind: *kind,
                player: out.clone(),
                fielder: who.fielder.clone(),
            }),
            commentary: who.commentary.clone(),
        });
        self.next_ball_number += 1;

        if over_complete && self.is_maiden(over, &who.bowler) {
            self.bowling
                .entry(&who.bowler, || BowlerStat::new(who.bowler.clone(), number))
                .maidens += 1;
        }

        refresh_rates(&mut self.innings, &self.format);

        Recorded {
            over_complete,
            dismissed: dismissal.map(|(out, _)| out),
        }
    }

    /// All out, overs used up, or the target reached.
    pub fn is_finished(&self) -> bool {
        let legal = self.innings.legal_balls(self.format.balls_per_over);
        self.innings.wickets >= MAX_WICKETS
            || legal >= self.format.max_balls()
            || self
                .innings
                .target
                .is_some_and(|target| self.innings.score >= target)
    }

    /// Every ball of the over came from this bowler and none cost the bowler a run.
    fn is_maiden(&self, over: u32, bowler: &PlayerRef) -> bool {
        let mut balls = self.events.iter().filter(|e| e.over == over).peekable();
        balls.peek().is_some()
            && balls.all(|e| same_player(&e.bowler, bowler) && e.bowler_runs() == 0)
    }
}

/// Recomputes run rate and, when chasing, the required rate.
pub fn refresh_rates(innings: &mut Innings, format: &MatchFormat) {
    let bpo = format.balls_per_over;
    let legal = innings.legal_balls(bpo);
    innings.run_rate = runs_per_over(innings.score, legal, bpo);
    innings.required_run_rate = innings.target.and_then(|target| {
        let remaining = format.max_balls().saturating_sub(legal);
        let needed = target.saturating_sub(innings.score);
        (remaining > 0).then(|| round2(needed as f64 * bpo as f64 / remaining as f64))
    });
}

/// Who should be at the crease, and with the ball, after a delivery.
///
/// Strike changes when an odd number of runs was run and again at the end of
/// an over.  A dismissed batter's end is left empty, and a completed over
/// clears the bowler so the next one has to be named.
pub fn next_players(who: &Participants, outcome: &Outcome, recorded: &Recorded) -> CurrentPlayers {
    let mut striker = Some(who.striker.clone());
    let mut non_striker = who.non_striker.clone();
    if outcome.rotates_strike() {
        std::mem::swap(&mut striker, &mut non_striker);
    }
    if recorded.over_complete {
        std::mem::swap(&mut striker, &mut non_striker);
    }
    if let Some(out) = &recorded.dismissed {
        for end in [&mut striker, &mut non_striker] {
            if end.as_ref().is_some_and(|p| same_player(p, out)) {
                *end = None;
            }
        }
    }
    CurrentPlayers {
        striker,
        non_striker,
        bowler: (!recorded.over_complete).then(|| who.bowler.clone()),
    }
}
