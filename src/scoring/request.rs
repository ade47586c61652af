//! Wire shapes of the requests the engine consumes.
//!
//! Field names are camelCase to match what scoring clients send.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::models::{CurrentPlayers, PlayerRef, MAX_RUNS_PER_BALL};
use crate::error::ScoringError;

/// One delivery as described by the scorer.  Every token is optional and
/// parsed leniently by the classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBall {
    pub runs: u32,
    #[serde(alias = "extras", skip_serializing_if = "Option::is_none")]
    pub extra_type: Option<String>,
    pub is_wicket: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wicket_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub striker_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub striker_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_striker_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_striker_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bowler_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bowler_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wicket_player_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wicket_player_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fielder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
}

/// The people involved in one delivery, after falling back to the match's
/// current players for anything the request left out.
#[derive(Debug, Clone, PartialEq)]
pub struct Participants {
    pub striker: PlayerRef,
    pub non_striker: Option<PlayerRef>,
    pub bowler: PlayerRef,
    pub wicket_player: Option<PlayerRef>,
    pub fielder: Option<String>,
    pub commentary: Option<String>,
}

impl RawBall {
    pub fn new(runs: u32) -> Self {
        RawBall {
            runs,
            ..Default::default()
        }
    }

    pub fn striker(mut self, name: &str) -> Self {
        self.striker_name = Some(name.to_string());
        self
    }

    pub fn non_striker(mut self, name: &str) -> Self {
        self.non_striker_name = Some(name.to_string());
        self
    }

    pub fn bowler(mut self, name: &str) -> Self {
        self.bowler_name = Some(name.to_string());
        self
    }

    pub fn extra(mut self, token: &str) -> Self {
        self.extra_type = Some(token.to_string());
        self
    }

    pub fn wicket(mut self, kind: &str) -> Self {
        self.is_wicket = true;
        self.wicket_kind = Some(kind.to_string());
        self
    }

    pub fn dismissed(mut self, name: &str) -> Self {
        self.wicket_player_name = Some(name.to_string());
        self
    }

    pub fn fielder(mut self, name: &str) -> Self {
        self.fielder_name = Some(name.to_string());
        self
    }

    /// Resolves striker, non-striker and bowler, falling back to `current`.
    pub fn participants(&self, current: &CurrentPlayers) -> Result<Participants, ScoringError> {
        if self.runs > MAX_RUNS_PER_BALL {
            return Err(ScoringError::InvalidRequest(format!(
                "{} runs off one ball (at most {})",
                self.runs, MAX_RUNS_PER_BALL
            )));
        }
        let striker = PlayerRef::from_parts(self.striker_name.as_deref(), self.striker_id.as_deref())
            .or_else(|| current.striker.clone())
            .ok_or(ScoringError::MissingStriker)?;
        let bowler = PlayerRef::from_parts(self.bowler_name.as_deref(), self.bowler_id.as_deref())
            .or_else(|| current.bowler.clone())
            .ok_or(ScoringError::MissingBowler)?;
        let non_striker =
            PlayerRef::from_parts(self.non_striker_name.as_deref(), self.non_striker_id.as_deref())
                .or_else(|| current.non_striker.clone());
        Ok(Participants {
            striker,
            non_striker,
            bowler,
            wicket_player: PlayerRef::from_parts(
                self.wicket_player_name.as_deref(),
                self.wicket_player_id.as_deref(),
            ),
            fielder: self
                .fielder_name
                .as_deref()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string),
            commentary: self.commentary.clone(),
        })
    }
}

/// `{ mode: "absolute", ... }`: replay a full ball log, or overwrite totals
/// when per-ball detail is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AbsoluteRequest {
    pub runs: Option<u32>,
    pub wickets: Option<u32>,
    /// Over notation, e.g. `12.3`.
    pub overs: Option<f64>,
    pub ball_events: Option<Vec<RawBall>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScoringRequest {
    Delivery(RawBall),
    Absolute(AbsoluteRequest),
}

impl ScoringRequest {
    pub fn from_value(value: Value) -> Result<Self, ScoringError> {
        let mode = value
            .get("mode")
            .and_then(Value::as_str)
            .map(|m| m.trim().to_lowercase());
        let parsed = match mode.as_deref() {
            Some("absolute") => serde_json::from_value(value).map(ScoringRequest::Absolute),
            None | Some("") | Some("incremental") => {
                serde_json::from_value(value).map(ScoringRequest::Delivery)
            }
            Some(other) => {
                return Err(ScoringError::InvalidRequest(format!(
                    "unknown mode '{}'",
                    other
                )))
            }
        };
        parsed.map_err(|e| ScoringError::InvalidRequest(e.to_string()))
    }

    pub fn from_json(body: &str) -> Result<Self, ScoringError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| ScoringError::InvalidRequest(e.to_string()))?;
        Self::from_value(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TossRequest {
    pub toss_winner_team: String,
    pub decision: String,
}

/// Names the batters and bowler for the next delivery; absent fields keep
/// their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayersRequest {
    pub striker_name: Option<String>,
    pub striker_id: Option<String>,
    pub non_striker_name: Option<String>,
    pub non_striker_id: Option<String>,
    pub bowler_name: Option<String>,
    pub bowler_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_incremental_request_parses_extras_alias() {
        let req = ScoringRequest::from_value(json!({
            "runs": 1,
            "isWicket": false,
            "extras": "wd",
            "strikerName": "Rohit",
            "bowlerName": "Starc"
        }))
        .unwrap();
        match req {
            ScoringRequest::Delivery(ball) => {
                assert_eq!(ball.extra_type.as_deref(), Some("wd"));
                assert_eq!(ball.striker_name.as_deref(), Some("Rohit"));
            }
            other => panic!("Expected delivery, got {:?}", other),
        }
    }

    #[test]
    fn test_absolute_request_with_ball_events() {
        let req = ScoringRequest::from_value(json!({
            "mode": "absolute",
            "runs": 4,
            "wickets": 0,
            "overs": 0.1,
            "ballEvents": [{ "runs": 4, "strikerName": "A", "bowlerName": "X" }]
        }))
        .unwrap();
        match req {
            ScoringRequest::Absolute(abs) => {
                assert_eq!(abs.runs, Some(4));
                assert_eq!(abs.ball_events.map(|b| b.len()), Some(1));
            }
            other => panic!("Expected absolute, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let err = ScoringRequest::from_value(json!({ "mode": "delta" })).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidRequest(_)));
    }

    #[test]
    fn test_negative_runs_rejected() {
        assert!(ScoringRequest::from_json(r#"{"runs": -1}"#).is_err());
    }

    #[test]
    fn test_participants_fall_back_to_current() {
        let current = CurrentPlayers {
            striker: Some(PlayerRef::new("A")),
            non_striker: Some(PlayerRef::new("B")),
            bowler: Some(PlayerRef::new("X")),
        };
        let who = RawBall::new(0).participants(&current).unwrap();
        assert_eq!(who.striker.name, "A");
        assert_eq!(who.bowler.name, "X");

        let err = RawBall::new(0)
            .striker("A")
            .participants(&CurrentPlayers::default())
            .unwrap_err();
        assert_eq!(err, ScoringError::MissingBowler);

        let blank = RawBall::new(0).striker("  ").bowler("X");
        assert_eq!(
            blank.participants(&CurrentPlayers::default()).unwrap_err(),
            ScoringError::MissingStriker
        );
    }

    #[test]
    fn test_runs_per_ball_are_bounded() {
        let ball = RawBall::new(MAX_RUNS_PER_BALL).striker("A").bowler("X");
        assert!(ball.participants(&CurrentPlayers::default()).is_ok());

        let req = ScoringRequest::from_json(
            r#"{"runs": 4294967295, "strikerName": "A", "bowlerName": "X"}"#,
        )
        .unwrap();
        let ScoringRequest::Delivery(ball) = req else {
            panic!("Expected delivery");
        };
        assert!(matches!(
            ball.participants(&CurrentPlayers::default()),
            Err(ScoringError::InvalidRequest(_))
        ));
    }
}
