//! Member identity: personality profiles and the store that consults them.

mod profile;
mod store;

pub use profile::{DecisionThresholds, MemberProfile, ProfileFormat, VotingBehavior, PROFILE_VERSION};
pub use store::{
    DecisionContext, Influence, InfluenceOutcome, LoadReport, MemberIdentityStore,
    ProfileRecommendation, ProposalSummary, SkippedProfile,
};
