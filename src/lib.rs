//! Ball-by-ball scoring engine for limited-overs cricket.
//!
//! A match is a single JSON document.  Deliveries are applied one at a time
//! or the whole innings is replayed from a corrected ball log; both paths
//! write through the same innings ledger.  Completion folds the match into
//! player careers and team records exactly once.

pub mod config;
pub mod db;
pub mod error;
pub mod report;
pub mod scoring;
pub mod service;
pub mod stats;

pub use error::ScoringError;
