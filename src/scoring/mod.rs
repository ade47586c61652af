pub mod classifier;
pub mod identity;
pub mod ledger;
pub mod live;
pub mod replay;
pub mod request;
pub mod state_machine;

pub use classifier::{classify, Classifier, Outcome};
pub use request::{AbsoluteRequest, PlayersRequest, RawBall, ScoringRequest, TossRequest};
pub use state_machine::Transition;

/// Snapshots kept for undo when nothing else is configured.
pub const DEFAULT_UNDO_DEPTH: usize = 12;

/// Rules shared by every scoring path.
#[derive(Clone, Copy)]
pub struct ScoringRules {
    /// Outcome classification used by both replay and live scoring.
    pub classify: Classifier,
    /// How many deliveries can be undone.
    pub undo_depth: usize,
}

impl std::fmt::Debug for ScoringRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringRules")
            .field("undo_depth", &self.undo_depth)
            .finish_non_exhaustive()
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        ScoringRules {
            classify: classifier::classify,
            undo_depth: DEFAULT_UNDO_DEPTH,
        }
    }
}
