use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::models::{overs_notation, round2, PlayerRef};

/// Career overs are always counted in six-ball overs.
pub const CAREER_BALLS_PER_OVER: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Won,
    Lost,
    Tied,
}

/// Wickets/runs-conceded pair, e.g. 4/21.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestFigures {
    pub wickets: u32,
    pub runs: u32,
}

impl BestFigures {
    /// More wickets wins; equal wickets, fewer runs wins.
    pub fn beats(&self, other: &BestFigures) -> bool {
        self.wickets > other.wickets || (self.wickets == other.wickets && self.runs < other.runs)
    }
}

impl fmt::Display for BestFigures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.wickets, self.runs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattingCareer {
    pub innings: u32,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub not_outs: u32,
    pub ducks: u32,
    pub hundreds: u32,
    pub fifties: u32,
    pub highest: u32,
    /// Runs per dismissal; absent until the first dismissal.
    pub average: Option<f64>,
    pub strike_rate: f64,
}

impl BattingCareer {
    pub fn recompute(&mut self) {
        let dismissals = self.innings.saturating_sub(self.not_outs);
        self.average = (dismissals > 0).then(|| round2(self.runs as f64 / dismissals as f64));
        self.strike_rate = if self.balls == 0 {
            0.0
        } else {
            round2(self.runs as f64 * 100.0 / self.balls as f64)
        };
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BowlingCareer {
    pub innings: u32,
    pub balls: u32,
    pub runs: u32,
    pub wickets: u32,
    pub maidens: u32,
    pub best: Option<BestFigures>,
    pub economy: f64,
    pub average: Option<f64>,
    /// Balls per wicket.
    pub strike_rate: Option<f64>,
}

impl BowlingCareer {
    pub fn overs(&self) -> String {
        overs_notation(self.balls, CAREER_BALLS_PER_OVER)
    }

    pub fn recompute(&mut self) {
        self.economy = if self.balls == 0 {
            0.0
        } else {
            round2(self.runs as f64 * CAREER_BALLS_PER_OVER as f64 / self.balls as f64)
        };
        self.average = (self.wickets > 0).then(|| round2(self.runs as f64 / self.wickets as f64));
        self.strike_rate =
            (self.wickets > 0).then(|| round2(self.balls as f64 / self.wickets as f64));
    }
}

/// Totals kept per tracked format (T20, ODI, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSummary {
    pub matches: u32,
    pub runs: u32,
    pub balls_faced: u32,
    pub wickets: u32,
    pub runs_conceded: u32,
    pub balls_bowled: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchHistoryEntry {
    pub match_id: String,
    pub played_at: DateTime<Utc>,
    pub team: String,
    pub opponent: String,
    pub format: Option<String>,
    pub outcome: MatchOutcome,
    pub runs: Option<u32>,
    pub balls_faced: Option<u32>,
    pub wickets: Option<u32>,
    pub runs_conceded: Option<u32>,
}

/// Long-run record of one identifiable player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerCareer {
    pub player_id: String,
    pub name: String,
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub batting: BattingCareer,
    pub bowling: BowlingCareer,
    #[serde(default)]
    pub formats: BTreeMap<String, FormatSummary>,
    #[serde(default)]
    pub history: Vec<MatchHistoryEntry>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PlayerCareer {
    pub fn new(player_id: impl Into<String>, name: impl Into<String>) -> Self {
        PlayerCareer {
            player_id: player_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn for_player(player: &PlayerRef, player_id: &str) -> Self {
        Self::new(player_id, player.name.clone())
    }

    pub fn has_played(&self, match_id: &str) -> bool {
        self.history.iter().any(|h| h.match_id == match_id)
    }

    pub fn record_outcome(&mut self, outcome: MatchOutcome) {
        self.matches += 1;
        match outcome {
            MatchOutcome::Won => self.wins += 1,
            MatchOutcome::Lost => self.losses += 1,
            MatchOutcome::Tied => self.ties += 1,
        }
    }
}

/// Win/loss record of a persistent team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub team_id: String,
    pub name: String,
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    #[serde(default)]
    pub match_ids: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TeamRecord {
    pub fn new(team_id: impl Into<String>, name: impl Into<String>) -> Self {
        TeamRecord {
            team_id: team_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns false if the match was already counted.
    pub fn record(&mut self, match_id: &str, outcome: MatchOutcome) -> bool {
        if self.match_ids.iter().any(|m| m == match_id) {
            return false;
        }
        self.match_ids.push(match_id.to_string());
        self.matches += 1;
        match outcome {
            MatchOutcome::Won => self.wins += 1,
            MatchOutcome::Lost => self.losses += 1,
            MatchOutcome::Tied => self.ties += 1,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_best_figures_tie_break() {
        let four_for_30 = BestFigures { wickets: 4, runs: 30 };
        let four_for_21 = BestFigures { wickets: 4, runs: 21 };
        let three_for_5 = BestFigures { wickets: 3, runs: 5 };
        assert!(four_for_21.beats(&four_for_30));
        assert!(!four_for_30.beats(&four_for_21));
        assert!(four_for_30.beats(&three_for_5));
        assert!(!four_for_21.beats(&four_for_21));
        assert_eq!(four_for_21.to_string(), "4/21");
    }

    #[test]
    fn test_batting_average_excludes_not_outs() {
        let mut batting = BattingCareer {
            innings: 3,
            runs: 120,
            balls: 100,
            not_outs: 1,
            ..Default::default()
        };
        batting.recompute();
        assert_relative_eq!(batting.average.unwrap(), 60.0, epsilon = 1e-9);
        assert_relative_eq!(batting.strike_rate, 120.0, epsilon = 1e-9);

        let mut unbeaten = BattingCareer {
            innings: 1,
            runs: 40,
            balls: 20,
            not_outs: 1,
            ..Default::default()
        };
        unbeaten.recompute();
        assert!(unbeaten.average.is_none());
    }

    #[test]
    fn test_bowling_rates() {
        let mut bowling = BowlingCareer {
            balls: 48,
            runs: 64,
            wickets: 4,
            ..Default::default()
        };
        bowling.recompute();
        assert_eq!(bowling.overs(), "8.0");
        assert_relative_eq!(bowling.economy, 8.0, epsilon = 1e-9);
        assert_relative_eq!(bowling.average.unwrap(), 16.0, epsilon = 1e-9);
        assert_relative_eq!(bowling.strike_rate.unwrap(), 12.0, epsilon = 1e-9);
    }

    #[test]
    fn test_team_record_dedupes_matches() {
        let mut team = TeamRecord::new("t1", "Strikers");
        assert!(team.record("m1", MatchOutcome::Won));
        assert!(!team.record("m1", MatchOutcome::Won));
        assert!(team.record("m2", MatchOutcome::Tied));
        assert_eq!((team.matches, team.wins, team.ties), (2, 1, 1));
    }
}
