use thiserror::Error;

/// Rejections raised by the scoring engine.  None of these leave a match
/// partially mutated: every operation works on a draft and only commits on
/// success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("match '{0}' not found")]
    MatchNotFound(String),

    #[error("match '{0}' already exists")]
    MatchExists(String),

    #[error("invalid match format: {0}")]
    InvalidFormat(String),

    #[error("the toss has not been set")]
    TossNotSet,

    #[error("match is already completed")]
    AlreadyCompleted,

    #[error("match has been abandoned")]
    Abandoned,

    #[error("invalid toss team '{0}' (expected teamA or teamB)")]
    InvalidTossTeam(String),

    #[error("invalid toss decision '{0}' (expected bat or bowl)")]
    InvalidTossDecision(String),

    #[error("striker name is required")]
    MissingStriker,

    #[error("bowler name is required")]
    MissingBowler,

    #[error("ball {index} of the replay log is invalid: {reason}")]
    InvalidBall { index: usize, reason: String },

    #[error("invalid overs value {0}")]
    InvalidOvers(String),

    #[error("wickets must be between 0 and 10, got {0}")]
    InvalidWickets(u32),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("striker and non-striker must be different players")]
    SamePlayerBothEnds,

    #[error("match is not at the innings break")]
    NotInningsBreak,

    #[error("match '{0}' is not completed")]
    NotCompleted(String),

    #[error("statistics already applied for match '{0}'")]
    StatsAlreadyApplied(String),

    #[error("a completed match cannot be deleted")]
    CannotDeleteCompleted,

    #[error("invalid scoring request: {0}")]
    InvalidRequest(String),
}
