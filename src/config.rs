use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::db::models::MatchStatus;
use crate::scoring::ScoringRules;

/// Ball-by-ball scorer for limited-overs cricket
#[derive(Parser, Debug, Clone)]
#[command(name = "cricket-scorer", version, about)]
pub struct Config {
    /// SQLite database path
    #[arg(long, global = true, env = "DATABASE_PATH", default_value = "cricket.db")]
    pub database_path: String,

    /// Number of deliveries that can be undone
    #[arg(long, global = true, env = "UNDO_DEPTH", default_value = "12")]
    pub undo_depth: usize,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, env = "LOG_FILTER", default_value = "info")]
    pub log_filter: String,

    #[command(subcommand)]
    pub command: Command,
}

/// JSON bodies are read from a file, or from stdin when the path is `-`.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a match from a JSON description
    Create { file: PathBuf },
    /// Record the toss
    Toss {
        match_id: String,
        /// teamA or teamB
        winner: String,
        /// bat or bowl
        decision: String,
    },
    /// Apply a scoring request (incremental delivery or absolute correction)
    Score { match_id: String, request: PathBuf },
    /// Revert the last delivery
    Undo { match_id: String },
    /// Name the striker, non-striker and/or bowler
    Players {
        match_id: String,
        #[arg(long)]
        striker: Option<String>,
        #[arg(long)]
        striker_id: Option<String>,
        #[arg(long)]
        non_striker: Option<String>,
        #[arg(long)]
        non_striker_id: Option<String>,
        #[arg(long)]
        bowler: Option<String>,
        #[arg(long)]
        bowler_id: Option<String>,
    },
    /// Start the second innings
    NextInnings { match_id: String },
    /// Complete the match and apply career statistics
    Complete { match_id: String },
    /// Abandon the match
    Abandon { match_id: String },
    /// Delete a match that has not been completed
    Delete { match_id: String },
    /// Print the match document
    Show { match_id: String },
    /// List matches, optionally by status
    List {
        #[arg(long, value_parser = parse_status)]
        status: Option<MatchStatus>,
    },
    /// Summary lines, leaders and highlights
    Report {
        match_id: String,
        #[arg(long, default_value = "3")]
        top: usize,
    },
    /// Print a player's career record
    Career { player_id: String },
    /// Print a team's record
    Team { team_id: String },
    /// Apply career statistics for a completed match if still pending
    Stats { match_id: String },
}

fn parse_status(value: &str) -> Result<MatchStatus, String> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_lowercase()))
        .map_err(|_| format!("unknown match status '{}'", value))
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_path.trim().is_empty() {
            anyhow::bail!("database_path must not be empty");
        }
        if !(1..=100).contains(&self.undo_depth) {
            anyhow::bail!("undo_depth must be between 1 and 100");
        }
        Ok(())
    }

    pub fn rules(&self) -> ScoringRules {
        ScoringRules {
            undo_depth: self.undo_depth,
            ..ScoringRules::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_validation() {
        let config = Config::try_parse_from(["cricket-scorer", "show", "m1"]).unwrap();
        assert_eq!(config.undo_depth, 12);
        assert!(config.validate().is_ok());
        assert_eq!(config.rules().undo_depth, 12);

        let config =
            Config::try_parse_from(["cricket-scorer", "--undo-depth", "0", "undo", "m1"]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!(parse_status("Live"), Ok(MatchStatus::Live));
        assert_eq!(parse_status("upcoming"), Ok(MatchStatus::Scheduled));
        assert_eq!(parse_status("innings_break"), Ok(MatchStatus::InningsBreak));
        assert!(parse_status("paused").is_err());
    }
}
