//! Credibility learning.
//!
//! Outcomes reported after a decision plays out feed back into each
//! member's credibility, which in turn weights their future votes.

mod tracker;

pub use tracker::{
    is_correct, CredibilityStats, CredibilityTracker, CredibilityUpdate, DecisionOutcome,
    MemberCredibility, OutcomeDecision, OutcomeReport,
};
