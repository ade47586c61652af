//! Match lifecycle: toss, innings transitions, target, completion.
//!
//! ```text
//! scheduled ──toss──▶ live ──innings over──▶ innings_break ──▶ live ──▶ completed
//!     └──────────────────────┴──────── abandoned ◀──────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::info;

use crate::db::models::{
    BallEvent, CurrentPlayers, Innings, Match, MatchFormat, MatchResult, MatchStatus, PlayerRef,
    ResultType, TeamSide, Toss, TossDecision, MAX_RUNS_PER_BALL, MAX_WICKETS,
};
use crate::error::ScoringError;

use super::identity::same_player;
use super::ledger::refresh_rates;
use super::live;
use super::replay;
use super::request::{AbsoluteRequest, PlayersRequest, ScoringRequest, TossRequest};
use super::ScoringRules;

/// Transient flags returned alongside the updated match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub over_complete: bool,
    pub innings_complete: bool,
    pub match_complete: bool,
    pub message: Option<String>,
}

/// Parses over notation (`12.3`) against the format.
pub fn parse_overs(value: f64, format: &MatchFormat) -> Result<(u32, u32), ScoringError> {
    let invalid = || ScoringError::InvalidOvers(value.to_string());
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    let whole = value.trunc();
    if whole > f64::from(format.total_overs) {
        return Err(invalid());
    }
    let balls = ((value - whole) * 10.0).round() as u32;
    let overs = whole as u32;
    if balls >= format.balls_per_over
        || overs * format.balls_per_over + balls > format.max_balls()
    {
        return Err(invalid());
    }
    Ok((overs, balls))
}

fn plural(n: u32, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

impl Match {
    fn ensure_open(&self) -> Result<(), ScoringError> {
        match self.status {
            MatchStatus::Completed => Err(ScoringError::AlreadyCompleted),
            MatchStatus::Abandoned => Err(ScoringError::Abandoned),
            _ => Ok(()),
        }
    }

    fn ensure_scorable(&self) -> Result<(), ScoringError> {
        self.ensure_open()?;
        if self.status == MatchStatus::Scheduled || self.toss.is_none() {
            return Err(ScoringError::TossNotSet);
        }
        Ok(())
    }

    // ── Toss ──────────────────────────────────────────────────────────────────

    /// Records the toss and resets both innings for a fresh start.
    pub fn set_toss(&mut self, request: &TossRequest, now: DateTime<Utc>) -> Result<(), ScoringError> {
        self.ensure_open()?;
        let winner = TeamSide::from_token(&request.toss_winner_team)
            .ok_or_else(|| ScoringError::InvalidTossTeam(request.toss_winner_team.clone()))?;
        let decision = TossDecision::from_token(&request.decision)
            .ok_or_else(|| ScoringError::InvalidTossDecision(request.decision.clone()))?;

        let toss = Toss { winner, decision };
        let batting = toss.batting_first();
        self.toss = Some(toss);
        self.innings = [
            Innings::for_sides(batting, batting.other()),
            Innings::for_sides(batting.other(), batting),
        ];
        self.current_innings = 1;
        self.current = CurrentPlayers::default();
        self.ball_events.clear();
        self.batting.clear();
        self.bowling.clear();
        self.fall_of_wickets.clear();
        self.undo_log.clear();
        self.result = None;
        self.status = MatchStatus::Live;
        self.updated_at = now;

        info!(
            "Match {}: {} won the toss, {} bat first",
            self.id,
            self.team(winner).name,
            self.team(batting).name
        );
        Ok(())
    }

    // ── Scoring ───────────────────────────────────────────────────────────────

    /// Applies a scoring request and evaluates innings/match transitions.
    /// On error the match is left exactly as it was.
    pub fn score(
        &mut self,
        request: &ScoringRequest,
        rules: &ScoringRules,
        now: DateTime<Utc>,
    ) -> Result<Transition, ScoringError> {
        self.ensure_scorable()?;
        let mut draft = self.clone();
        let transition = draft.apply_request(request, rules, now)?;
        draft.updated_at = now;
        *self = draft;
        Ok(transition)
    }

    fn apply_request(
        &mut self,
        request: &ScoringRequest,
        rules: &ScoringRules,
        now: DateTime<Utc>,
    ) -> Result<Transition, ScoringError> {
        match request {
            ScoringRequest::Delivery(ball) => {
                // undo has to land back at the break, not in an empty chase
                let before = live::Snapshot::capture(self);
                if self.status == MatchStatus::InningsBreak {
                    self.begin_second_innings();
                }
                let live = live::record_delivery(self, ball, rules, before)?;
                let mut transition = self.settle(now);
                if live.over_complete && !transition.innings_complete {
                    transition.over_complete = true;
                    transition.message = Some(format!(
                        "Over complete ({}). Select the next bowler",
                        self.active_innings().overs_display()
                    ));
                }
                Ok(transition)
            }
            ScoringRequest::Absolute(absolute) => {
                match &absolute.ball_events {
                    Some(balls) => replay::replay_innings(self, balls, rules.classify)?,
                    None => self.overwrite_totals(absolute)?,
                }
                Ok(self.settle(now))
            }
        }
    }

    /// Manual correction without per-ball detail.
    fn overwrite_totals(&mut self, request: &AbsoluteRequest) -> Result<(), ScoringError> {
        if let Some(wickets) = request.wickets {
            if wickets > MAX_WICKETS {
                return Err(ScoringError::InvalidWickets(wickets));
            }
        }
        if let Some(runs) = request.runs {
            let ceiling = self.format.max_balls().saturating_mul(MAX_RUNS_PER_BALL);
            if runs > ceiling {
                return Err(ScoringError::InvalidRequest(format!(
                    "{} runs is more than an innings of {} can score",
                    runs,
                    self.format.max_balls()
                )));
            }
        }
        let position = request
            .overs
            .map(|overs| parse_overs(overs, &self.format))
            .transpose()?;

        let index = self.innings_index();
        let innings = &mut self.innings[index];
        if let Some(runs) = request.runs {
            innings.score = runs;
        }
        if let Some(wickets) = request.wickets {
            innings.wickets = wickets;
        }
        if let Some((overs, balls)) = position {
            innings.overs = overs;
            innings.balls = balls;
        }
        refresh_rates(innings, &self.format);
        self.undo_log.clear();
        Ok(())
    }

    /// Reverts the last live delivery.
    pub fn undo_last_ball(&mut self, now: DateTime<Utc>) -> Result<BallEvent, ScoringError> {
        self.ensure_open()?;
        let ball = live::undo_last_ball(self)?;
        self.updated_at = now;
        Ok(ball)
    }

    /// Names the batters and/or bowler for the next delivery.
    pub fn set_current_players(
        &mut self,
        request: &PlayersRequest,
        now: DateTime<Utc>,
    ) -> Result<(), ScoringError> {
        self.ensure_scorable()?;
        let mut next = if self.status == MatchStatus::InningsBreak {
            CurrentPlayers::default()
        } else {
            self.current.clone()
        };
        if let Some(p) =
            PlayerRef::from_parts(request.striker_name.as_deref(), request.striker_id.as_deref())
        {
            next.striker = Some(p);
        }
        if let Some(p) = PlayerRef::from_parts(
            request.non_striker_name.as_deref(),
            request.non_striker_id.as_deref(),
        ) {
            next.non_striker = Some(p);
        }
        if let Some(p) =
            PlayerRef::from_parts(request.bowler_name.as_deref(), request.bowler_id.as_deref())
        {
            next.bowler = Some(p);
        }
        if let (Some(s), Some(n)) = (&next.striker, &next.non_striker) {
            if same_player(s, n) {
                return Err(ScoringError::SamePlayerBothEnds);
            }
        }

        if self.status == MatchStatus::InningsBreak {
            self.begin_second_innings();
        }
        self.current = next;
        self.updated_at = now;
        Ok(())
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    /// Checks the active innings for its end conditions.
    fn settle(&mut self, now: DateTime<Utc>) -> Transition {
        let mut transition = Transition::default();
        let bpo = self.format.balls_per_over;
        let max_balls = self.format.max_balls();
        let (exhausted, chased) = {
            let active = self.active_innings();
            (
                active.wickets >= MAX_WICKETS || active.legal_balls(bpo) >= max_balls,
                active.target.is_some_and(|target| active.score >= target),
            )
        };

        if self.current_innings < 2 {
            if exhausted {
                let newly_complete = !self.innings[0].completed;
                let target = self.close_first_innings();
                if newly_complete {
                    transition.innings_complete = true;
                    transition.message = Some(format!(
                        "Innings complete. {} need {} runs to win",
                        self.team_name(self.innings[1].batting_team),
                        target
                    ));
                }
            } else if self.innings[0].completed {
                // a correction took the first innings back below its end
                self.reopen_first_innings();
            }
            return transition;
        }

        if chased || exhausted {
            self.innings[1].completed = true;
            let result = self.finish(now);
            transition.innings_complete = true;
            transition.match_complete = true;
            transition.message = Some(result.summary);
        }
        transition
    }

    /// Freezes the first innings and sets the chase.  Returns the target.
    fn close_first_innings(&mut self) -> u32 {
        let target = self.innings[0].score + 1;
        self.innings[0].completed = true;
        let batting = self.innings[0].bowling_team;
        let bowling = self.innings[0].batting_team;

        let second = &mut self.innings[1];
        second.batting_team = batting;
        second.bowling_team = bowling;
        second.target = Some(target);
        refresh_rates(second, &self.format);
        self.status = MatchStatus::InningsBreak;

        info!(
            "Match {}: first innings closed at {}/{}, target {}",
            self.id, self.innings[0].score, self.innings[0].wickets, target
        );
        target
    }

    fn reopen_first_innings(&mut self) {
        self.innings[0].completed = false;
        self.innings[1].target = None;
        self.innings[1].required_run_rate = None;
        self.status = MatchStatus::Live;
    }

    /// Moves from the innings break to the chase.
    pub fn start_second_innings(&mut self, now: DateTime<Utc>) -> Result<(), ScoringError> {
        self.ensure_open()?;
        if self.status != MatchStatus::InningsBreak {
            return Err(ScoringError::NotInningsBreak);
        }
        self.begin_second_innings();
        self.updated_at = now;
        Ok(())
    }

    fn begin_second_innings(&mut self) {
        self.current_innings = 2;
        self.status = MatchStatus::Live;
        self.current = CurrentPlayers::default();
        self.undo_log.clear();
    }

    // ── Completion ────────────────────────────────────────────────────────────

    /// Manual completion.  A second attempt is an error.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<Transition, ScoringError> {
        self.ensure_scorable()?;
        let index = self.innings_index();
        self.innings[index].completed = true;
        let result = self.finish(now);
        Ok(Transition {
            over_complete: false,
            innings_complete: true,
            match_complete: true,
            message: Some(result.summary),
        })
    }

    fn finish(&mut self, now: DateTime<Utc>) -> MatchResult {
        let result = self.decide_result();
        self.result = Some(result.clone());
        self.status = MatchStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
        self.current = CurrentPlayers::default();
        self.undo_log.clear();
        info!("Match {} completed: {}", self.id, result.summary);
        result
    }

    fn decide_result(&self) -> MatchResult {
        let [first, second] = &self.innings;
        match first.score.cmp(&second.score) {
            Ordering::Greater => {
                let margin = first.score - second.score;
                let winner_name = self.team_name(first.batting_team).to_string();
                MatchResult {
                    winner: first.batting_team,
                    summary: format!("{} won by {} {}", winner_name, margin, plural(margin, "run")),
                    winner_name,
                    result_type: ResultType::Runs,
                    margin,
                }
            }
            Ordering::Less => {
                let margin = MAX_WICKETS.saturating_sub(second.wickets);
                let winner_name = self.team_name(second.batting_team).to_string();
                MatchResult {
                    winner: second.batting_team,
                    summary: format!(
                        "{} won by {} {}",
                        winner_name,
                        margin,
                        plural(margin, "wicket")
                    ),
                    winner_name,
                    result_type: ResultType::Wickets,
                    margin,
                }
            }
            Ordering::Equal => MatchResult {
                winner: None,
                winner_name: "Tie".to_string(),
                result_type: ResultType::Tie,
                margin: 0,
                summary: "Match tied".to_string(),
            },
        }
    }

    /// Declared externally; never derived from the score.
    pub fn abandon(&mut self, now: DateTime<Utc>) -> Result<(), ScoringError> {
        self.ensure_open()?;
        self.status = MatchStatus::Abandoned;
        self.current = CurrentPlayers::default();
        self.undo_log.clear();
        self.updated_at = now;
        info!("Match {} abandoned", self.id);
        Ok(())
    }

    pub fn ensure_deletable(&self) -> Result<(), ScoringError> {
        if self.status == MatchStatus::Completed {
            return Err(ScoringError::CannotDeleteCompleted);
        }
        Ok(())
    }
}
