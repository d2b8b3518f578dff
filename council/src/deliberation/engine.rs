//! Deliberation engine.
//!
//! Runs a proposal past every voting member and aggregates the result.
//! Deliberation is synchronous and only reads shared state, so independent
//! proposals can be deliberated concurrently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use oversight::{AuditSink, EventPublisher, TrustLevel};

use crate::credibility::CredibilityTracker;
use crate::identity::{MemberIdentityStore, ProposalSummary};
use crate::registry::{CouncilRegistry, CouncilSeat};
use crate::types::{Proposal, Recommendation, VotingStyle};

use super::analyzer::{ProposalAnalysis, ProposalAnalyzer};
use super::style::{default_recommendation, VotingStyleEnforcer};
use super::weighter::DomainWeighter;

/// Share of weighted influence needed for a collective position.
const AGGREGATE_THRESHOLD: f64 = 0.6;

/// Collective position of the council.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Approve,
    Reject,
    Mixed,
}

impl Aggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One member's recommendation on a proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRecommendation {
    pub member_id: String,
    /// Recommendation after style enforcement
    pub recommendation: Recommendation,
    /// Confidence after style enforcement
    pub confidence: f64,
    pub reasoning: String,
    /// Share of proposal domains the member covers
    pub domain_relevance: f64,
    /// Whether a loaded profile drove the recommendation
    pub profile_consulted: bool,
    /// Style enforced
    pub style_applied: VotingStyle,
    /// Vote weight
    pub weight: f64,
    /// `weight * confidence`
    pub weighted_influence: f64,
}

/// Outcome of a deliberation. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliberationResult {
    pub proposal: Proposal,
    pub analysis: ProposalAnalysis,
    /// Per-member recommendations, in roster order
    pub recommendations: Vec<MemberRecommendation>,
    pub aggregate: Aggregate,
    /// Share of influence behind approval
    pub weighted_approval: f64,
    /// Share of influence behind rejection
    pub weighted_rejection: f64,
    /// Unweighted agreement among members who took a side
    pub consensus_strength: f64,
    pub deliberated_at: DateTime<Utc>,
}

impl DeliberationResult {
    /// Recommendation of a member.
    pub fn recommendation_of(&self, member_id: &str) -> Option<&MemberRecommendation> {
        self.recommendations.iter().find(|r| r.member_id == member_id)
    }

    /// How many members made a recommendation.
    pub fn count(&self, recommendation: Recommendation) -> usize {
        count(&self.recommendations, recommendation)
    }
}

/// Orchestrates analysis, member recommendations and aggregation.
pub struct DeliberationEngine {
    registry: CouncilRegistry,
    analyzer: ProposalAnalyzer,
    weighter: DomainWeighter,
    enforcer: VotingStyleEnforcer,
    identities: Arc<MemberIdentityStore>,
    credibility: Arc<CredibilityTracker>,
    audit: Arc<dyn AuditSink>,
}

impl DeliberationEngine {
    /// Create an engine.
    pub fn new(
        registry: CouncilRegistry,
        identities: Arc<MemberIdentityStore>,
        credibility: Arc<CredibilityTracker>,
        audit: Arc<dyn AuditSink>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            registry,
            analyzer: ProposalAnalyzer::new(registry, events),
            weighter: DomainWeighter::new(registry),
            enforcer: VotingStyleEnforcer::new(),
            identities,
            credibility,
            audit,
        }
    }

    /// Analyze a proposal without deliberating.
    pub fn analyze(&self, proposal: &Proposal) -> ProposalAnalysis {
        self.analyzer.analyze(proposal)
    }

    /// Deliberate a proposal.
    pub fn deliberate(&self, proposal: &Proposal) -> DeliberationResult {
        let analysis = self.analyzer.analyze(proposal);
        let summary = ProposalSummary {
            topic: proposal.topic.clone(),
            description: proposal.description.clone(),
            domains: analysis.domains.clone(),
            risk: analysis.risk_level,
        };

        let recommendations: Vec<MemberRecommendation> = self
            .registry
            .voting_seats()
            .map(|seat| self.recommend(seat, &summary, &analysis))
            .collect();

        let total: f64 = recommendations.iter().map(|r| r.weighted_influence).sum();
        let share = |rec: Recommendation| {
            if total > 0.0 {
                recommendations
                    .iter()
                    .filter(|r| r.recommendation == rec)
                    .map(|r| r.weighted_influence)
                    .sum::<f64>()
                    / total
            } else {
                0.0
            }
        };
        let weighted_approval = share(Recommendation::Approve);
        let weighted_rejection = share(Recommendation::Reject);

        let aggregate = if weighted_approval > AGGREGATE_THRESHOLD {
            Aggregate::Approve
        } else if weighted_rejection > AGGREGATE_THRESHOLD {
            Aggregate::Reject
        } else {
            Aggregate::Mixed
        };

        let approvals = count(&recommendations, Recommendation::Approve);
        let rejections = count(&recommendations, Recommendation::Reject);
        let consensus_strength = if approvals + rejections == 0 {
            0.0
        } else {
            approvals.abs_diff(rejections) as f64 / (approvals + rejections) as f64
        };

        self.audit.log(
            "deliberation",
            "deliberation-engine",
            TrustLevel::System,
            serde_json::json!({
                "proposal_id": proposal.id,
                "topic": proposal.topic,
                "risk": analysis.risk_level.as_str(),
                "aggregate": aggregate.as_str(),
                "weighted_approval": weighted_approval,
                "weighted_rejection": weighted_rejection,
                "consensus_strength": consensus_strength,
            }),
        );

        info!(
            proposal_id = %proposal.id,
            topic = %proposal.topic,
            risk = %analysis.risk_level,
            aggregate = %aggregate,
            weighted_approval = weighted_approval,
            weighted_rejection = weighted_rejection,
            "Deliberation complete"
        );

        DeliberationResult {
            proposal: proposal.clone(),
            analysis,
            recommendations,
            aggregate,
            weighted_approval,
            weighted_rejection,
            consensus_strength,
            deliberated_at: Utc::now(),
        }
    }

    fn recommend(
        &self,
        seat: &CouncilSeat,
        summary: &ProposalSummary,
        analysis: &ProposalAnalysis,
    ) -> MemberRecommendation {
        let profile = self.identities.get(seat.id);
        let style = profile.map(|p| p.voting.style).unwrap_or(seat.style);

        let (raw, raw_confidence, mut reasoning, profile_consulted) = if profile.is_some() {
            let rec = self.identities.get_voting_recommendation(seat.id, summary);
            (rec.recommendation, rec.confidence, rec.reasoning, rec.profile_consulted)
        } else {
            let (rec, confidence) = default_recommendation(style, analysis.risk_level);
            (
                rec,
                confidence,
                format!("Default for {} member at {} risk", style, analysis.risk_level),
                false,
            )
        };

        let adjusted = self
            .enforcer
            .enforce(raw, raw_confidence, style, analysis.risk_level);
        if let Some(note) = &adjusted.note {
            reasoning = format!("{}; {}", reasoning, note);
        }

        let domain_relevance = self.weighter.domain_relevance(seat.id, &analysis.domains);
        let weight = self.weighter.calculate_weight(
            seat.id,
            &analysis.domains,
            self.credibility.credibility_of(seat.id),
        );

        debug!(
            member_id = %seat.id,
            raw = %raw,
            recommendation = %adjusted.recommendation,
            confidence = adjusted.confidence,
            weight = weight,
            "Member recommendation"
        );

        MemberRecommendation {
            member_id: seat.id.to_string(),
            recommendation: adjusted.recommendation,
            confidence: adjusted.confidence,
            reasoning,
            domain_relevance,
            profile_consulted,
            style_applied: style,
            weight,
            weighted_influence: weight * adjusted.confidence,
        }
    }
}

fn count(recommendations: &[MemberRecommendation], rec: Recommendation) -> usize {
    recommendations
        .iter()
        .filter(|r| r.recommendation == rec)
        .count()
}
