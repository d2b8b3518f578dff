//! Council deliberation, member identity and credibility learning.
//!
//! A council of specialist members reviews proposals:
//!
//! - **Analysis**: domains, risk, bias warnings and virtue alignment from
//!   proposal text
//! - **Member identity**: personality profiles drive each member's view;
//!   members without one fall back to their voting style
//! - **Weighting**: domain expertise, veto authority and credibility set how
//!   much each vote counts
//! - **Credibility**: real-world outcomes feed back into member credibility
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       GovernanceCore                         │
//! │                                                              │
//! │  ┌──────────┐   ┌──────────┐   ┌─────────┐   ┌──────────┐   │
//! │  │ Analyzer │──▶│ Profiles │──▶│  Style  │──▶│ Weighter │   │
//! │  └──────────┘   └──────────┘   └─────────┘   └────▲─────┘   │
//! │                                                   │         │
//! │   outcomes ─────────────────────────────▶ ┌───────┴──────┐  │
//! │                                           │ Credibility  │  │
//! │                                           └──────────────┘  │
//! │                                                              │
//! │  gates: ConstitutionalRuleEngine · EmergencyHalt             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use council::{GovernanceCore, Proposal};
//!
//! let core = GovernanceCore::builder("home-council")
//!     .profile_dir("/etc/council/profiles")
//!     .build()
//!     .await?;
//!
//! let result = core
//!     .deliberate(&Proposal::new("Generate weekly report", "read-only summary"))
//!     .await?;
//! println!("{} ({:.2})", result.aggregate, result.weighted_approval);
//! ```

pub mod config;
pub mod credibility;
pub mod deliberation;
pub mod governance;
pub mod identity;
pub mod lexicon;
pub mod registry;
pub mod types;

// Re-export main types
pub use config::{CouncilConfig, CredibilityConfig, ProfileConfig};
pub use credibility::{CredibilityTracker, DecisionOutcome, MemberCredibility, OutcomeDecision};
pub use deliberation::{
    Aggregate, DeliberationEngine, DeliberationResult, MemberRecommendation, ProposalAnalysis,
    ProposalAnalyzer,
};
pub use governance::{GovernanceBuilder, GovernanceCore};
pub use identity::{MemberIdentityStore, MemberProfile};
pub use registry::CouncilRegistry;
pub use types::*;
