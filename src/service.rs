//! Load, mutate, save.  Each call works on one match document; callers are
//! expected to serialize updates per match.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::db::career::{PlayerCareer, TeamRecord};
use crate::db::models::{Match, MatchStatus, NewMatch};
use crate::db::{CareerStore, MatchStore};
use crate::error::ScoringError;
use crate::report::{build_report, MatchReport};
use crate::scoring::{PlayersRequest, ScoringRequest, ScoringRules, TossRequest, Transition};
use crate::stats::{apply_match_stats, StatsSummary, StatsTicket};

/// Result of any call that can move the match along.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    #[serde(rename = "match")]
    pub scored_match: Match,
    pub innings_complete: bool,
    pub match_complete: bool,
    pub over_complete: bool,
    pub message: Option<String>,
}

impl UpdateResponse {
    fn new(scored_match: Match, transition: Transition) -> Self {
        UpdateResponse {
            scored_match,
            innings_complete: transition.innings_complete,
            match_complete: transition.match_complete,
            over_complete: transition.over_complete,
            message: transition.message,
        }
    }
}

pub struct ScoringService<S> {
    store: S,
    rules: ScoringRules,
}

impl<S> ScoringService<S>
where
    S: MatchStore + CareerStore,
{
    pub fn new(store: S, rules: ScoringRules) -> Self {
        ScoringService { store, rules }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load(&self, id: &str) -> Result<Match> {
        self.store
            .load_match(id)?
            .ok_or_else(|| ScoringError::MatchNotFound(id.to_string()).into())
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    pub fn create_match(&self, new: NewMatch) -> Result<Match> {
        if self.store.load_match(&new.id)?.is_some() {
            return Err(ScoringError::MatchExists(new.id).into());
        }
        let m = Match::new(new, Utc::now())?;
        self.store.save_match(&m)?;
        info!(
            "Created match {}: {} v {} ({}x{})",
            m.id, m.team_a.name, m.team_b.name, m.format.total_overs, m.format.balls_per_over
        );
        Ok(m)
    }

    pub fn get_match(&self, id: &str) -> Result<Match> {
        self.load(id)
    }

    pub fn set_toss(&self, id: &str, request: &TossRequest) -> Result<Match> {
        let mut m = self.load(id)?;
        m.set_toss(request, Utc::now())?;
        self.store.save_match(&m)?;
        Ok(m)
    }

    pub fn set_players(&self, id: &str, request: &PlayersRequest) -> Result<Match> {
        let mut m = self.load(id)?;
        m.set_current_players(request, Utc::now())?;
        self.store.save_match(&m)?;
        Ok(m)
    }

    pub fn start_second_innings(&self, id: &str) -> Result<Match> {
        let mut m = self.load(id)?;
        m.start_second_innings(Utc::now())?;
        self.store.save_match(&m)?;
        info!("Match {}: second innings under way", id);
        Ok(m)
    }

    pub fn abandon(&self, id: &str) -> Result<Match> {
        let mut m = self.load(id)?;
        m.abandon(Utc::now())?;
        self.store.save_match(&m)?;
        Ok(m)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let m = self.load(id)?;
        m.ensure_deletable()?;
        self.store.delete_match(id)?;
        info!("Deleted match {}", id);
        Ok(())
    }

    // ── Scoring ───────────────────────────────────────────────────────────────

    pub fn score(&self, id: &str, request: &ScoringRequest) -> Result<UpdateResponse> {
        let mut m = self.load(id)?;
        let now = Utc::now();
        let transition = m.score(request, &self.rules, now)?;
        if transition.match_complete {
            self.finalize(&mut m, now)?;
        } else {
            self.store.save_match(&m)?;
        }
        Ok(UpdateResponse::new(m, transition))
    }

    pub fn undo(&self, id: &str) -> Result<UpdateResponse> {
        let mut m = self.load(id)?;
        let ball = m.undo_last_ball(Utc::now())?;
        self.store.save_match(&m)?;
        let message = format!(
            "Removed delivery {} ({}, {} run(s))",
            ball.ball_number,
            ball.over_label(),
            ball.total_runs
        );
        info!("Match {}: {}", id, message);
        Ok(UpdateResponse::new(
            m,
            Transition {
                message: Some(message),
                ..Transition::default()
            },
        ))
    }

    pub fn complete(&self, id: &str) -> Result<UpdateResponse> {
        let mut m = self.load(id)?;
        let now = Utc::now();
        let transition = m.complete(now)?;
        self.finalize(&mut m, now)?;
        Ok(UpdateResponse::new(m, transition))
    }

    /// Saves the completed match, then folds it into the career records.
    /// A failed fold leaves the match `Pending` for [`Self::ensure_stats`].
    fn finalize(&self, m: &mut Match, now: DateTime<Utc>) -> Result<()> {
        self.store.save_match(m)?;
        let ticket = StatsTicket::claim(m)?;
        match apply_match_stats(ticket, &self.store, now) {
            Ok(_) => self.store.save_match(m),
            Err(e) => {
                warn!("Stats for match {} not applied yet: {:#}", m.id, e);
                Ok(())
            }
        }
    }

    /// Applies career statistics for a completed match if that has not
    /// happened yet.  `None` means they were already applied.
    pub fn ensure_stats(&self, id: &str) -> Result<Option<StatsSummary>> {
        let mut m = self.load(id)?;
        if m.status != MatchStatus::Completed {
            return Err(ScoringError::NotCompleted(id.to_string()).into());
        }
        if m.completion.is_applied() {
            return Ok(None);
        }
        let summary = apply_match_stats(StatsTicket::claim(&mut m)?, &self.store, Utc::now())?;
        self.store.save_match(&m)?;
        Ok(Some(summary))
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn report(&self, id: &str, limit: usize) -> Result<MatchReport> {
        Ok(build_report(&self.load(id)?, limit))
    }

    pub fn player_career(&self, player_id: &str) -> Result<PlayerCareer> {
        self.store
            .load_player(player_id)?
            .ok_or_else(|| anyhow!("No career recorded for player '{}'", player_id))
    }

    pub fn team_record(&self, team_id: &str) -> Result<TeamRecord> {
        self.store
            .load_team(team_id)?
            .ok_or_else(|| anyhow!("No record for team '{}'", team_id))
    }
}
