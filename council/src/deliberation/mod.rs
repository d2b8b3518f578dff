//! Proposal deliberation.
//!
//! ```text
//! Proposal → ProposalAnalyzer → (per member) profile or style default
//!          → VotingStyleEnforcer → DomainWeighter → aggregation
//! ```

mod analyzer;
mod engine;
mod style;
mod weighter;

pub use analyzer::{BiasKind, BiasWarning, ProposalAnalysis, ProposalAnalyzer};
pub use engine::{Aggregate, DeliberationEngine, DeliberationResult, MemberRecommendation};
pub use style::{default_recommendation, StyleAdjustment, VotingStyleEnforcer};
pub use weighter::{DomainWeighter, MAX_WEIGHT, MIN_WEIGHT};
