use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::scoring::identity::same_player;
use crate::scoring::live::UndoLog;

/// Wickets that end an innings.
pub const MAX_WICKETS: u32 = 10;

/// Most runs a single delivery can be scored for, penalty and overthrows
/// included.
pub const MAX_RUNS_PER_BALL: u32 = 12;

/// Lower-cases and strips punctuation so "No-Ball", "no_ball" and "noball"
/// all compare equal.
fn normalize_token(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

// ── Format ───────────────────────────────────────────────────────────────────

/// Fixed-overs format a match is played under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFormat {
    pub total_overs: u32,
    pub balls_per_over: u32,
}

impl MatchFormat {
    pub const fn new(total_overs: u32, balls_per_over: u32) -> Self {
        MatchFormat {
            total_overs,
            balls_per_over,
        }
    }

    pub const fn t20() -> Self {
        Self::new(20, 6)
    }

    /// Legal deliveries available to one innings.
    pub fn max_balls(&self) -> u32 {
        self.total_overs * self.balls_per_over
    }

    /// Key of the career summary this format is folded into, if tracked.
    pub fn tracked_key(&self) -> Option<&'static str> {
        match (self.total_overs, self.balls_per_over) {
            (10, 6) => Some("T10"),
            (20, 6) => Some("T20"),
            (50, 6) => Some("ODI"),
            (20, 5) => Some("Hundred"),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.total_overs == 0 {
            return Err(ScoringError::InvalidFormat(
                "total_overs must be positive".into(),
            ));
        }
        // Over notation ("12.3") needs the ball counter to stay a single digit.
        if !(1..=9).contains(&self.balls_per_over) {
            return Err(ScoringError::InvalidFormat(format!(
                "balls_per_over must be between 1 and 9, got {}",
                self.balls_per_over
            )));
        }
        if self.total_overs.checked_mul(self.balls_per_over).is_none() {
            return Err(ScoringError::InvalidFormat(format!(
                "{} overs of {} balls is too many deliveries",
                self.total_overs, self.balls_per_over
            )));
        }
        Ok(())
    }
}

impl Default for MatchFormat {
    fn default() -> Self {
        Self::t20()
    }
}

/// "overs.balls" notation, e.g. `3.4`.
pub fn overs_notation(legal_balls: u32, balls_per_over: u32) -> String {
    let bpo = balls_per_over.max(1);
    format!("{}.{}", legal_balls / bpo, legal_balls % bpo)
}

/// Same notation as a decimal, the way bowling figures are usually stored.
pub fn overs_decimal(legal_balls: u32, balls_per_over: u32) -> f64 {
    let bpo = balls_per_over.max(1);
    (legal_balls / bpo) as f64 + (legal_balls % bpo) as f64 / 10.0
}

/// Runs per over, rounded to two decimals.  Zero before the first legal ball.
pub fn runs_per_over(runs: u32, legal_balls: u32, balls_per_over: u32) -> f64 {
    if legal_balls == 0 {
        return 0.0;
    }
    round2(runs as f64 * balls_per_over as f64 / legal_balls as f64)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ── Sides, players, toss ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamSide {
    #[serde(rename = "teamA")]
    TeamA,
    #[serde(rename = "teamB")]
    TeamB,
}

impl TeamSide {
    pub fn other(self) -> Self {
        match self {
            TeamSide::TeamA => TeamSide::TeamB,
            TeamSide::TeamB => TeamSide::TeamA,
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            "teama" | "a" => Some(TeamSide::TeamA),
            "teamb" | "b" => Some(TeamSide::TeamB),
            _ => None,
        }
    }
}

/// A player as named on the scoresheet, optionally carrying a stable id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl PlayerRef {
    pub fn new(name: impl Into<String>) -> Self {
        PlayerRef {
            name: name.into(),
            id: None,
        }
    }

    pub fn with_id(name: impl Into<String>, id: impl Into<String>) -> Self {
        PlayerRef {
            name: name.into(),
            id: Some(id.into()),
        }
    }

    /// Builds a reference from optional request fields; blank names are absent.
    pub fn from_parts(name: Option<&str>, id: Option<&str>) -> Option<Self> {
        let name = name.map(str::trim).filter(|n| !n.is_empty())?;
        let id = id.map(str::trim).filter(|i| !i.is_empty());
        Some(PlayerRef {
            name: name.to_string(),
            id: id.map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    /// Present when the team is a persistent entity with its own record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub players: Vec<PlayerRef>,
}

impl Team {
    pub fn named(name: impl Into<String>) -> Self {
        Team {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TossDecision {
    Bat,
    Bowl,
}

impl TossDecision {
    pub fn from_token(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            "bat" | "batting" => Some(TossDecision::Bat),
            "bowl" | "bowling" | "field" | "fielding" => Some(TossDecision::Bowl),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toss {
    pub winner: TeamSide,
    pub decision: TossDecision,
}

impl Toss {
    pub fn batting_first(&self) -> TeamSide {
        match self.decision {
            TossDecision::Bat => self.winner,
            TossDecision::Bowl => self.winner.other(),
        }
    }
}

// ── Delivery classification tokens ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraType {
    #[default]
    None,
    Wide,
    NoBall,
    Bye,
    LegBye,
}

impl ExtraType {
    /// Lenient parse: anything unrecognised is a plain delivery.
    pub fn from_token(token: Option<&str>) -> Self {
        let Some(raw) = token else {
            return ExtraType::None;
        };
        match normalize_token(raw).as_str() {
            "wd" | "wide" | "wides" => ExtraType::Wide,
            "nb" | "noball" | "noballs" => ExtraType::NoBall,
            "b" | "bye" | "byes" => ExtraType::Bye,
            "lb" | "legbye" | "legbyes" => ExtraType::LegBye,
            _ => ExtraType::None,
        }
    }

    /// Wides and no-balls do not count toward the over.
    pub fn is_illegal(self) -> bool {
        matches!(self, ExtraType::Wide | ExtraType::NoBall)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WicketKind {
    #[default]
    Bowled,
    Caught,
    Lbw,
    RunOut,
    Stumped,
    HitWicket,
    CaughtAndBowled,
    RetiredHurt,
    TimedOut,
    ObstructingField,
}

impl WicketKind {
    /// Lenient parse: unknown kinds fall back to bowled.
    pub fn from_token(token: Option<&str>) -> Self {
        let Some(raw) = token else {
            return WicketKind::Bowled;
        };
        match normalize_token(raw).as_str() {
            "caught" | "c" | "ct" => WicketKind::Caught,
            "lbw" | "legbeforewicket" => WicketKind::Lbw,
            "runout" | "ro" => WicketKind::RunOut,
            "stumped" | "st" => WicketKind::Stumped,
            "hitwicket" | "hw" => WicketKind::HitWicket,
            "caughtandbowled" | "cb" | "candb" => WicketKind::CaughtAndBowled,
            "retiredhurt" | "retired" | "rh" => WicketKind::RetiredHurt,
            "timedout" | "timed" => WicketKind::TimedOut,
            "obstructingfield" | "obstructingthefield" | "obstructing" => {
                WicketKind::ObstructingField
            }
            _ => WicketKind::Bowled,
        }
    }

    /// Whether the bowler is credited with the wicket.
    pub fn credits_bowler(self) -> bool {
        !matches!(
            self,
            WicketKind::RunOut
                | WicketKind::RetiredHurt
                | WicketKind::TimedOut
                | WicketKind::ObstructingField
        )
    }

    /// Retired hurt batters are not out.
    pub fn is_out(self) -> bool {
        self != WicketKind::RetiredHurt
    }

    pub fn label(self) -> &'static str {
        match self {
            WicketKind::Bowled => "bowled",
            WicketKind::Caught => "caught",
            WicketKind::Lbw => "lbw",
            WicketKind::RunOut => "run out",
            WicketKind::Stumped => "stumped",
            WicketKind::HitWicket => "hit wicket",
            WicketKind::CaughtAndBowled => "caught and bowled",
            WicketKind::RetiredHurt => "retired hurt",
            WicketKind::TimedOut => "timed out",
            WicketKind::ObstructingField => "obstructing the field",
        }
    }
}

// ── Innings ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extras {
    pub wides: u32,
    pub no_balls: u32,
    pub byes: u32,
    pub leg_byes: u32,
    pub penalty: u32,
    pub total: u32,
}

impl Extras {
    pub fn add(&mut self, kind: ExtraType, runs: u32) {
        match kind {
            ExtraType::Wide => self.wides += runs,
            ExtraType::NoBall => self.no_balls += runs,
            ExtraType::Bye => self.byes += runs,
            ExtraType::LegBye => self.leg_byes += runs,
            ExtraType::None => {}
        }
        if kind != ExtraType::None {
            self.total += runs;
        }
    }
}

/// The stand between the two batters currently at the crease.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partnership {
    pub runs: u32,
    pub balls: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Innings {
    pub batting_team: Option<TeamSide>,
    pub bowling_team: Option<TeamSide>,
    pub score: u32,
    pub wickets: u32,
    /// Completed overs.
    pub overs: u32,
    /// Legal balls bowled in the current over, always below balls-per-over.
    pub balls: u32,
    pub completed: bool,
    pub extras: Extras,
    pub run_rate: f64,
    /// Runs needed to win (second innings only).
    pub target: Option<u32>,
    pub required_run_rate: Option<f64>,
    #[serde(default)]
    pub partnership: Partnership,
}

impl Innings {
    pub fn for_sides(batting: TeamSide, bowling: TeamSide) -> Self {
        Innings {
            batting_team: Some(batting),
            bowling_team: Some(bowling),
            ..Default::default()
        }
    }

    pub fn legal_balls(&self, balls_per_over: u32) -> u32 {
        self.overs * balls_per_over + self.balls
    }

    pub fn overs_display(&self) -> String {
        format!("{}.{}", self.overs, self.balls)
    }
}

/// Who is at the crease and who has the ball.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentPlayers {
    pub striker: Option<PlayerRef>,
    pub non_striker: Option<PlayerRef>,
    pub bowler: Option<PlayerRef>,
}

// ── Ball log and figures ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WicketDetail {
    pub kind: WicketKind,
    pub player: PlayerRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fielder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallEvent {
    /// Sequential across the whole match.
    pub ball_number: u32,
    pub innings: u8,
    /// Completed overs when the ball was bowled.
    pub over: u32,
    /// Legal balls already bowled in the over, plus one.
    pub ball: u32,
    pub is_legal: bool,
    pub striker: PlayerRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_striker: Option<PlayerRef>,
    pub bowler: PlayerRef,
    pub total_runs: u32,
    pub batter_runs: u32,
    pub extra_type: ExtraType,
    pub extra_runs: u32,
    pub is_wicket: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wicket: Option<WicketDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
}

impl BallEvent {
    /// Runs charged to the bowler (byes and leg-byes are not).
    pub fn bowler_runs(&self) -> u32 {
        match self.extra_type {
            ExtraType::Bye | ExtraType::LegBye => 0,
            _ => self.total_runs,
        }
    }

    /// Over notation of the delivery, e.g. `3.2`.
    pub fn over_label(&self) -> String {
        format!("{}.{}", self.over, self.ball)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dismissal {
    pub kind: WicketKind,
    /// Bowler credited with the wicket, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bowler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fielder: Option<String>,
    pub over: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatsmanStat {
    pub player: PlayerRef,
    pub innings: u8,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub dots: u32,
    pub singles: u32,
    pub twos: u32,
    pub threes: u32,
    pub strike_rate: f64,
    pub is_out: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismissal: Option<Dismissal>,
}

impl BatsmanStat {
    pub fn new(player: PlayerRef, innings: u8) -> Self {
        BatsmanStat {
            player,
            innings,
            runs: 0,
            balls: 0,
            fours: 0,
            sixes: 0,
            dots: 0,
            singles: 0,
            twos: 0,
            threes: 0,
            strike_rate: 0.0,
            is_out: false,
            dismissal: None,
        }
    }

    pub fn recompute(&mut self) {
        self.strike_rate = if self.balls == 0 {
            0.0
        } else {
            round2(self.runs as f64 * 100.0 / self.balls as f64)
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowlerStat {
    pub player: PlayerRef,
    pub innings: u8,
    /// Legal deliveries.
    pub balls: u32,
    pub overs: f64,
    pub runs: u32,
    pub wickets: u32,
    pub maidens: u32,
    pub wides: u32,
    pub no_balls: u32,
    pub dots: u32,
    pub economy: f64,
}

impl BowlerStat {
    pub fn new(player: PlayerRef, innings: u8) -> Self {
        BowlerStat {
            player,
            innings,
            balls: 0,
            overs: 0.0,
            runs: 0,
            wickets: 0,
            maidens: 0,
            wides: 0,
            no_balls: 0,
            dots: 0,
            economy: 0.0,
        }
    }

    pub fn recompute(&mut self, balls_per_over: u32) {
        self.overs = overs_decimal(self.balls, balls_per_over);
        self.economy = runs_per_over(self.runs, self.balls, balls_per_over);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallOfWicket {
    pub innings: u8,
    pub wicket: u32,
    pub score: u32,
    pub overs: String,
    pub player: PlayerRef,
    pub kind: WicketKind,
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    #[serde(alias = "upcoming")]
    Scheduled,
    Live,
    InningsBreak,
    Completed,
    Abandoned,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::InningsBreak => "innings_break",
            MatchStatus::Completed => "completed",
            MatchStatus::Abandoned => "abandoned",
        }
    }
}

/// Whether career statistics have been folded for a completed match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum CompletionPhase {
    #[default]
    Pending,
    StatsApplied { applied_at: DateTime<Utc> },
}

impl CompletionPhase {
    pub fn is_applied(&self) -> bool {
        matches!(self, CompletionPhase::StatsApplied { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    Runs,
    Wickets,
    Tie,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// `None` on a tie.
    pub winner: Option<TeamSide>,
    /// Winning team's name, or "Tie".
    pub winner_name: String,
    pub result_type: ResultType,
    pub margin: u32,
    pub summary: String,
}

/// Request body for creating a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMatch {
    pub id: String,
    #[serde(default)]
    pub format: MatchFormat,
    pub team_a: Team,
    pub team_b: Team,
}

/// One limited-overs match: the document the engine is handed and returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub format: MatchFormat,
    pub team_a: Team,
    pub team_b: Team,
    pub status: MatchStatus,
    pub toss: Option<Toss>,
    /// 1 or 2.
    pub current_innings: u8,
    #[serde(default)]
    pub current: CurrentPlayers,
    pub innings: [Innings; 2],
    #[serde(default)]
    pub ball_events: Vec<BallEvent>,
    #[serde(default)]
    pub batting: Vec<BatsmanStat>,
    #[serde(default)]
    pub bowling: Vec<BowlerStat>,
    #[serde(default)]
    pub fall_of_wickets: Vec<FallOfWicket>,
    pub result: Option<MatchResult>,
    #[serde(default)]
    pub completion: CompletionPhase,
    #[serde(default)]
    pub undo_log: UndoLog,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn new(new: NewMatch, now: DateTime<Utc>) -> Result<Self, ScoringError> {
        new.format.validate()?;
        if new.id.trim().is_empty() {
            return Err(ScoringError::InvalidRequest("match id is required".into()));
        }
        for team in [&new.team_a, &new.team_b] {
            if team.name.trim().is_empty() {
                return Err(ScoringError::InvalidRequest("team name is required".into()));
            }
        }
        Ok(Match {
            id: new.id,
            format: new.format,
            team_a: new.team_a,
            team_b: new.team_b,
            status: MatchStatus::Scheduled,
            toss: None,
            current_innings: 1,
            current: CurrentPlayers::default(),
            innings: [Innings::default(), Innings::default()],
            ball_events: Vec::new(),
            batting: Vec::new(),
            bowling: Vec::new(),
            fall_of_wickets: Vec::new(),
            result: None,
            completion: CompletionPhase::Pending,
            undo_log: UndoLog::default(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    pub fn team(&self, side: TeamSide) -> &Team {
        match side {
            TeamSide::TeamA => &self.team_a,
            TeamSide::TeamB => &self.team_b,
        }
    }

    pub fn team_name(&self, side: Option<TeamSide>) -> &str {
        side.map(|s| self.team(s).name.as_str()).unwrap_or("")
    }

    /// Index into `innings` for the active innings.
    pub fn innings_index(&self) -> usize {
        if self.current_innings >= 2 {
            1
        } else {
            0
        }
    }

    pub fn active_innings(&self) -> &Innings {
        &self.innings[self.innings_index()]
    }

    pub fn events_for(&self, innings: u8) -> impl Iterator<Item = &BallEvent> {
        self.ball_events.iter().filter(move |e| e.innings == innings)
    }

    /// The batter row for a player in the given innings.
    pub fn batter(&self, innings: u8, player: &PlayerRef) -> Option<&BatsmanStat> {
        self.batting
            .iter()
            .find(|r| r.innings == innings && same_player(&r.player, player))
    }

    pub fn bowler(&self, innings: u8, player: &PlayerRef) -> Option<&BowlerStat> {
        self.bowling
            .iter()
            .find(|r| r.innings == innings && same_player(&r.player, player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_extra_type_aliases() {
        assert_eq!(ExtraType::from_token(Some("wd")), ExtraType::Wide);
        assert_eq!(ExtraType::from_token(Some("Wide")), ExtraType::Wide);
        assert_eq!(ExtraType::from_token(Some("nb")), ExtraType::NoBall);
        assert_eq!(ExtraType::from_token(Some("No-Ball")), ExtraType::NoBall);
        assert_eq!(ExtraType::from_token(Some("no_ball")), ExtraType::NoBall);
        assert_eq!(ExtraType::from_token(Some("lb")), ExtraType::LegBye);
        assert_eq!(ExtraType::from_token(Some("leg-bye")), ExtraType::LegBye);
        assert_eq!(ExtraType::from_token(Some("byes")), ExtraType::Bye);
        assert_eq!(ExtraType::from_token(Some("penalty?")), ExtraType::None);
        assert_eq!(ExtraType::from_token(None), ExtraType::None);
    }

    #[test]
    fn test_wicket_kind_defaults_to_bowled() {
        assert_eq!(WicketKind::from_token(Some("c&b")), WicketKind::CaughtAndBowled);
        assert_eq!(WicketKind::from_token(Some("Run Out")), WicketKind::RunOut);
        assert_eq!(WicketKind::from_token(Some("st")), WicketKind::Stumped);
        assert_eq!(WicketKind::from_token(Some("handled ball")), WicketKind::Bowled);
        assert_eq!(WicketKind::from_token(None), WicketKind::Bowled);
    }

    #[test]
    fn test_bowler_credit() {
        assert!(WicketKind::Caught.credits_bowler());
        assert!(WicketKind::Stumped.credits_bowler());
        assert!(!WicketKind::RunOut.credits_bowler());
        assert!(!WicketKind::RetiredHurt.credits_bowler());
        assert!(!WicketKind::TimedOut.credits_bowler());
        assert!(!WicketKind::ObstructingField.credits_bowler());
    }

    #[test]
    fn test_toss_batting_first() {
        let toss = Toss {
            winner: TeamSide::TeamA,
            decision: TossDecision::Bowl,
        };
        assert_eq!(toss.batting_first(), TeamSide::TeamB);
        assert_eq!(TeamSide::from_token("teamA"), Some(TeamSide::TeamA));
        assert_eq!(TeamSide::from_token("team c"), None);
        assert_eq!(TossDecision::from_token("field"), Some(TossDecision::Bowl));
    }

    #[test]
    fn test_overs_helpers() {
        assert_eq!(overs_notation(22, 6), "3.4");
        assert_relative_eq!(overs_decimal(22, 6), 3.4, epsilon = 1e-9);
        assert_relative_eq!(runs_per_over(45, 30, 6), 9.0, epsilon = 1e-9);
        assert_relative_eq!(runs_per_over(10, 0, 6), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_format_validation() {
        assert!(MatchFormat::t20().validate().is_ok());
        assert!(MatchFormat::new(0, 6).validate().is_err());
        assert!(MatchFormat::new(20, 10).validate().is_err());
        assert!(matches!(
            MatchFormat::new(1_000_000_000, 6).validate(),
            Err(ScoringError::InvalidFormat(_))
        ));
        assert!(MatchFormat::new(u32::MAX / 9, 9).validate().is_ok());
        assert_eq!(MatchFormat::new(50, 6).tracked_key(), Some("ODI"));
        assert_eq!(MatchFormat::new(15, 6).tracked_key(), None);
    }

    #[test]
    fn test_status_accepts_upcoming_alias() {
        let status: MatchStatus = serde_json::from_str("\"upcoming\"").unwrap();
        assert_eq!(status, MatchStatus::Scheduled);
        assert_eq!(
            serde_json::to_string(&MatchStatus::InningsBreak).unwrap(),
            "\"innings_break\""
        );
    }
}
