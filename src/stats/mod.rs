//! Career aggregation for completed matches.
//!
//! Folding a match into player careers and team records happens exactly once.
//! The guard is the match's [`CompletionPhase`]: a [`StatsTicket`] can only be
//! claimed while the phase is `Pending`, and finishing the ticket stamps
//! `StatsApplied`.  Every career and team record also remembers which matches
//! it has absorbed, so a fold interrupted between record writes can be retried.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::db::career::{BestFigures, MatchHistoryEntry, MatchOutcome, PlayerCareer, TeamRecord};
use crate::db::models::{
    BatsmanStat, BowlerStat, CompletionPhase, Innings, Match, MatchStatus, PlayerRef, TeamSide,
};
use crate::db::CareerStore;
use crate::error::ScoringError;
use crate::scoring::identity::{PlayerRow, RowBook};

// ── Ticket ────────────────────────────────────────────────────────────────────

/// Exclusive right to fold one completed match into the career records.
#[derive(Debug)]
pub struct StatsTicket<'a> {
    scored: &'a mut Match,
}

impl<'a> StatsTicket<'a> {
    pub fn claim(m: &'a mut Match) -> Result<Self, ScoringError> {
        if m.status != MatchStatus::Completed {
            return Err(ScoringError::NotCompleted(m.id.clone()));
        }
        if m.completion.is_applied() {
            return Err(ScoringError::StatsAlreadyApplied(m.id.clone()));
        }
        Ok(StatsTicket { scored: m })
    }

    pub fn scored_match(&self) -> &Match {
        self.scored
    }

    fn finish(self, now: DateTime<Utc>) {
        self.scored.completion = CompletionPhase::StatsApplied { applied_at: now };
    }
}

// ── Contributions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BattingLine {
    pub innings: u32,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub dismissed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BowlingLine {
    pub innings: u32,
    pub balls: u32,
    pub runs: u32,
    pub wickets: u32,
    pub maidens: u32,
}

/// One identifiable player's part in a match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub player_id: String,
    pub player: PlayerRef,
    pub side: TeamSide,
    pub batting: Option<BattingLine>,
    pub bowling: Option<BowlingLine>,
}

/// Player being assembled from rosters and stat rows.
struct Draft {
    player: PlayerRef,
    side: Option<TeamSide>,
    batting: Option<BattingLine>,
    bowling: Option<BowlingLine>,
}

impl Draft {
    fn new(player: &PlayerRef, side: Option<TeamSide>) -> Self {
        Draft {
            player: player.clone(),
            side,
            batting: None,
            bowling: None,
        }
    }
}

impl PlayerRow for Draft {
    fn player(&self) -> &PlayerRef {
        &self.player
    }

    fn player_mut(&mut self) -> &mut PlayerRef {
        &mut self.player
    }
}

fn innings_of(m: &Match, number: u8) -> &Innings {
    &m.innings[if number >= 2 { 1 } else { 0 }]
}

fn add_batting(line: &mut BattingLine, row: &BatsmanStat) {
    line.innings += 1;
    line.runs += row.runs;
    line.balls += row.balls;
    line.fours += row.fours;
    line.sixes += row.sixes;
    line.dismissed |= row.is_out;
}

fn add_bowling(line: &mut BowlingLine, row: &BowlerStat) {
    line.innings += 1;
    line.balls += row.balls;
    line.runs += row.runs;
    line.wickets += row.wickets;
    line.maidens += row.maidens;
}

/// Everyone in the match with a stable id, roster players first.  Stat rows
/// recorded by name alone are matched to roster entries; players that never
/// resolve to an id are left out.
pub fn contributions(m: &Match) -> Vec<Contribution> {
    let mut book: RowBook<Draft> = RowBook::new(Vec::new());

    for side in [TeamSide::TeamA, TeamSide::TeamB] {
        for player in &m.team(side).players {
            book.entry(player, || Draft::new(player, Some(side)));
        }
    }

    for row in &m.batting {
        let side = innings_of(m, row.innings).batting_team;
        let draft = book.entry(&row.player, || Draft::new(&row.player, side));
        draft.side = draft.side.or(side);
        // a row that never faced, scored or fell is not an innings
        if row.balls > 0 || row.runs > 0 || row.is_out {
            add_batting(draft.batting.get_or_insert_with(BattingLine::default), row);
        }
    }

    for row in &m.bowling {
        let side = innings_of(m, row.innings).bowling_team;
        let draft = book.entry(&row.player, || Draft::new(&row.player, side));
        draft.side = draft.side.or(side);
        add_bowling(draft.bowling.get_or_insert_with(BowlingLine::default), row);
    }

    book.into_rows()
        .into_iter()
        .filter_map(|d| {
            let player_id = d.player.id.clone()?;
            Some(Contribution {
                player_id,
                side: d.side?,
                player: d.player,
                batting: d.batting,
                bowling: d.bowling,
            })
        })
        .collect()
}

fn outcome_for(m: &Match, side: TeamSide) -> MatchOutcome {
    match m.result.as_ref().and_then(|r| r.winner) {
        None => MatchOutcome::Tied,
        Some(winner) if winner == side => MatchOutcome::Won,
        Some(_) => MatchOutcome::Lost,
    }
}

// ── Folding ───────────────────────────────────────────────────────────────────

/// Folds one contribution into a career.  Returns false when the career has
/// already absorbed this match.
pub fn fold_player(
    career: &mut PlayerCareer,
    c: &Contribution,
    m: &Match,
    played_at: DateTime<Utc>,
) -> bool {
    if career.has_played(&m.id) {
        return false;
    }
    career.record_outcome(outcome_for(m, c.side));
    if !c.player.name.trim().is_empty() {
        career.name = c.player.name.clone();
    }

    if let Some(line) = &c.batting {
        let bat = &mut career.batting;
        bat.innings += line.innings;
        bat.runs += line.runs;
        bat.balls += line.balls;
        bat.fours += line.fours;
        bat.sixes += line.sixes;
        if !line.dismissed {
            bat.not_outs += 1;
        } else if line.runs == 0 {
            bat.ducks += 1;
        }
        if line.runs >= 100 {
            bat.hundreds += 1;
        } else if line.runs >= 50 {
            bat.fifties += 1;
        }
        bat.highest = bat.highest.max(line.runs);
        bat.recompute();
    }

    if let Some(line) = &c.bowling {
        let bowl = &mut career.bowling;
        bowl.innings += line.innings;
        bowl.balls += line.balls;
        bowl.runs += line.runs;
        bowl.wickets += line.wickets;
        bowl.maidens += line.maidens;
        let figures = BestFigures {
            wickets: line.wickets,
            runs: line.runs,
        };
        if bowl.best.map_or(true, |best| figures.beats(&best)) {
            bowl.best = Some(figures);
        }
        bowl.recompute();
    }

    let format = m.format.tracked_key();
    if let Some(key) = format {
        let summary = career.formats.entry(key.to_string()).or_default();
        summary.matches += 1;
        if let Some(line) = &c.batting {
            summary.runs += line.runs;
            summary.balls_faced += line.balls;
        }
        if let Some(line) = &c.bowling {
            summary.wickets += line.wickets;
            summary.runs_conceded += line.runs;
            summary.balls_bowled += line.balls;
        }
    }

    career.history.push(MatchHistoryEntry {
        match_id: m.id.clone(),
        played_at,
        team: m.team(c.side).name.clone(),
        opponent: m.team(c.side.other()).name.clone(),
        format: format.map(str::to_string),
        outcome: outcome_for(m, c.side),
        runs: c.batting.as_ref().map(|b| b.runs),
        balls_faced: c.batting.as_ref().map(|b| b.balls),
        wickets: c.bowling.as_ref().map(|b| b.wickets),
        runs_conceded: c.bowling.as_ref().map(|b| b.runs),
    });
    career.updated_at = Some(played_at);
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub players_updated: u32,
    pub players_skipped: u32,
    pub teams_updated: u32,
}

/// Folds the ticket's match into the store and stamps the match as applied.
///
/// If a store call fails the ticket is dropped unfinished, the match stays
/// `Pending` and the fold can be retried.
pub fn apply_match_stats<S>(
    ticket: StatsTicket<'_>,
    store: &S,
    now: DateTime<Utc>,
) -> Result<StatsSummary>
where
    S: CareerStore + ?Sized,
{
    let m = ticket.scored_match();
    let played_at = m.completed_at.unwrap_or(now);
    let mut summary = StatsSummary::default();

    for c in contributions(m) {
        let mut career = store
            .load_player(&c.player_id)?
            .unwrap_or_else(|| PlayerCareer::for_player(&c.player, &c.player_id));
        if fold_player(&mut career, &c, m, played_at) {
            store
                .save_player(&career)
                .with_context(|| format!("Failed to save career for {}", c.player_id))?;
            summary.players_updated += 1;
        } else {
            debug!("Career {} already includes match {}", c.player_id, m.id);
            summary.players_skipped += 1;
        }
    }

    for side in [TeamSide::TeamA, TeamSide::TeamB] {
        let team = m.team(side);
        let Some(team_id) = team.id.as_deref() else {
            continue;
        };
        let mut record = store
            .load_team(team_id)?
            .unwrap_or_else(|| TeamRecord::new(team_id, team.name.clone()));
        record.name = team.name.clone();
        if record.record(&m.id, outcome_for(m, side)) {
            record.updated_at = Some(now);
            store
                .save_team(&record)
                .with_context(|| format!("Failed to save team record {}", team_id))?;
            summary.teams_updated += 1;
        }
    }

    info!(
        "Stats applied for match {}: {} players updated, {} skipped, {} teams",
        m.id, summary.players_updated, summary.players_skipped, summary.teams_updated
    );
    ticket.finish(now);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{MatchFormat, NewMatch, Team};
    use crate::scoring::{RawBall, ScoringRequest, ScoringRules, TossRequest};
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        players: RefCell<HashMap<String, PlayerCareer>>,
        teams: RefCell<HashMap<String, TeamRecord>>,
    }

    impl CareerStore for MemoryStore {
        fn load_player(&self, player_id: &str) -> Result<Option<PlayerCareer>> {
            Ok(self.players.borrow().get(player_id).cloned())
        }

        fn save_player(&self, career: &PlayerCareer) -> Result<()> {
            self.players
                .borrow_mut()
                .insert(career.player_id.clone(), career.clone());
            Ok(())
        }

        fn load_team(&self, team_id: &str) -> Result<Option<TeamRecord>> {
            Ok(self.teams.borrow().get(team_id).cloned())
        }

        fn save_team(&self, record: &TeamRecord) -> Result<()> {
            self.teams
                .borrow_mut()
                .insert(record.team_id.clone(), record.clone());
            Ok(())
        }
    }

    /// Ana 4, Ana 1, Bea bowled by Xu for a duck, then called off.
    fn completed_match() -> Match {
        let team_a = Team {
            name: "Strikers".into(),
            id: Some("t-str".into()),
            players: vec![PlayerRef::with_id("Ana", "p1"), PlayerRef::with_id("Bea", "p2")],
        };
        let team_b = Team {
            name: "Thunder".into(),
            id: Some("t-thu".into()),
            players: vec![PlayerRef::with_id("Xu", "p9"), PlayerRef::new("Yan")],
        };
        let mut m = Match::new(
            NewMatch {
                id: "m1".into(),
                format: MatchFormat::t20(),
                team_a,
                team_b,
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
        let rules = ScoringRules::default();
        for ball in [
            RawBall::new(4).striker("ana").non_striker("Bea").bowler("Xu"),
            RawBall::new(1),
            RawBall::new(0).wicket("bowled"),
        ] {
            m.score(&ScoringRequest::Delivery(ball), &rules, Utc::now()).unwrap();
        }
        m.complete(Utc::now()).unwrap();
        m
    }

    #[test]
    fn test_claim_requires_pending_completed_match() {
        let mut m = completed_match();
        m.status = MatchStatus::Live;
        assert!(matches!(
            StatsTicket::claim(&mut m),
            Err(ScoringError::NotCompleted(_))
        ));

        let mut m = completed_match();
        m.completion = CompletionPhase::StatsApplied {
            applied_at: Utc::now(),
        };
        assert!(matches!(
            StatsTicket::claim(&mut m),
            Err(ScoringError::StatsAlreadyApplied(_))
        ));
    }

    #[test]
    fn test_contributions_resolve_names_against_rosters() {
        let m = completed_match();
        let list = contributions(&m);
        let ids: Vec<_> = list.iter().map(|c| c.player_id.as_str()).collect();
        // Yan has no id and never played
        assert_eq!(ids, vec!["p1", "p2", "p9"]);

        let ana = &list[0];
        assert_eq!(ana.side, TeamSide::TeamA);
        let bat = ana.batting.as_ref().unwrap();
        assert_eq!((bat.runs, bat.balls, bat.fours, bat.dismissed), (5, 2, 1, false));
        assert!(ana.bowling.is_none());

        let xu = &list[2];
        assert_eq!(xu.side, TeamSide::TeamB);
        let bowl = xu.bowling.as_ref().unwrap();
        assert_eq!((bowl.balls, bowl.runs, bowl.wickets), (3, 5, 1));
    }

    #[test]
    fn test_apply_folds_careers_and_teams_once() {
        let mut m = completed_match();
        let store = MemoryStore::default();
        let now = Utc::now();

        let ticket = StatsTicket::claim(&mut m).unwrap();
        let summary = apply_match_stats(ticket, &store, now).unwrap();
        assert_eq!(summary.players_updated, 3);
        assert_eq!(summary.teams_updated, 2);
        assert!(m.completion.is_applied());

        let players = store.players.borrow();
        let ana = &players["p1"];
        assert_eq!((ana.matches, ana.wins), (1, 1));
        assert_eq!(ana.batting.not_outs, 1);
        assert!(ana.batting.average.is_none());
        assert_eq!(ana.formats["T20"].runs, 5);
        assert_eq!(ana.history[0].opponent, "Thunder");

        let bea = &players["p2"];
        assert_eq!(bea.batting.ducks, 1);
        assert_relative_eq!(bea.batting.average.unwrap(), 0.0);

        let xu = &players["p9"];
        assert_eq!(xu.losses, 1);
        assert_eq!(xu.bowling.best, Some(BestFigures { wickets: 1, runs: 5 }));
        assert_eq!(xu.bowling.overs(), "0.3");
        drop(players);

        let teams = store.teams.borrow();
        assert_eq!(teams["t-str"].wins, 1);
        assert_eq!(teams["t-thu"].losses, 1);
        drop(teams);

        assert!(matches!(
            StatsTicket::claim(&mut m),
            Err(ScoringError::StatsAlreadyApplied(_))
        ));
    }

    #[test]
    fn test_retry_after_interrupted_fold_skips_absorbed_records() {
        let mut m = completed_match();
        let store = MemoryStore::default();
        apply_match_stats(StatsTicket::claim(&mut m).unwrap(), &store, Utc::now()).unwrap();
        let before = store.players.borrow().clone();

        // the match save after the fold never happened
        m.completion = CompletionPhase::Pending;
        let summary =
            apply_match_stats(StatsTicket::claim(&mut m).unwrap(), &store, Utc::now()).unwrap();
        assert_eq!(summary.players_updated, 0);
        assert_eq!(summary.players_skipped, 3);
        assert_eq!(summary.teams_updated, 0);
        assert_eq!(*store.players.borrow(), before);
        assert_eq!(store.teams.borrow()["t-str"].matches, 1);
    }

    #[test]
    fn test_best_figures_keep_the_better_spell() {
        let mut m = completed_match();
        let mut career = PlayerCareer::new("p9", "Xu");
        career.bowling.best = Some(BestFigures { wickets: 1, runs: 3 });
        let c = contributions(&m).into_iter().find(|c| c.player_id == "p9").unwrap();
        assert!(fold_player(&mut career, &c, &m, Utc::now()));
        assert_eq!(career.bowling.best, Some(BestFigures { wickets: 1, runs: 3 }));
        assert!(!fold_player(&mut career, &c, &m, Utc::now()));

        m.id = "m2".into();
        career.bowling.best = Some(BestFigures { wickets: 0, runs: 0 });
        assert!(fold_player(&mut career, &c, &m, Utc::now()));
        assert_eq!(career.bowling.best.unwrap().to_string(), "1/5");
    }
}
