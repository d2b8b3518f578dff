//! Credibility tracking from real-world decision outcomes.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use oversight::{AuditSink, EventPublisher, GovernanceEvent, TrustLevel};

use crate::config::CredibilityConfig;
use crate::registry::CouncilRegistry;
use crate::types::Recommendation;

/// How a vote was ultimately decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeDecision {
    Passed,
    Failed,
    Vetoed,
    Expired,
    Overturned,
}

impl OutcomeDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Vetoed => "VETOED",
            Self::Expired => "EXPIRED",
            Self::Overturned => "OVERTURNED",
        }
    }
}

/// A real-world outcome of a council decision. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionOutcome {
    /// Vote this outcome belongs to
    pub vote_id: String,
    /// Topic voted on
    pub topic: String,
    /// How the vote was decided
    pub decision: OutcomeDecision,
    /// How things turned out (-1.0 harmful to 1.0 beneficial)
    pub outcome_quality: f64,
    /// What happened
    pub description: String,
    /// How each member voted
    pub member_votes: HashMap<String, Recommendation>,
    /// Domains the decision touched
    #[serde(default)]
    pub domains: Vec<String>,
    /// When the outcome was reported
    pub recorded_at: DateTime<Utc>,
}

impl DecisionOutcome {
    /// Create an outcome with no votes.
    pub fn new(
        vote_id: impl Into<String>,
        topic: impl Into<String>,
        decision: OutcomeDecision,
        outcome_quality: f64,
    ) -> Self {
        Self {
            vote_id: vote_id.into(),
            topic: topic.into(),
            decision,
            outcome_quality,
            description: String::new(),
            member_votes: HashMap::new(),
            domains: Vec::new(),
            recorded_at: Utc::now(),
        }
    }

    /// Record a member's vote.
    pub fn with_vote(mut self, member_id: impl Into<String>, vote: Recommendation) -> Self {
        self.member_votes.insert(member_id.into(), vote);
        self
    }

    /// Set the domains.
    pub fn with_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Whether a vote anticipated the real outcome.
///
/// Only four combinations count as correct; every other combination,
/// including all VETOED, EXPIRED and OVERTURNED outcomes, does not.
pub fn is_correct(vote: Recommendation, decision: OutcomeDecision, quality: f64) -> bool {
    use OutcomeDecision::{Failed, Passed};
    use Recommendation::{Approve, Reject};

    match (vote, decision) {
        (Approve, Passed) => quality > 0.0,
        (Reject, Passed) => quality < 0.0,
        (Reject, Failed) => quality >= 0.0,
        (Approve, Failed) => quality < 0.0,
        _ => false,
    }
}

/// A member's track record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberCredibility {
    pub member_id: String,
    /// Current credibility
    pub credibility: f64,
    /// Votes scored
    pub total_votes: u32,
    /// Votes that anticipated the outcome
    pub correct_predictions: u32,
    /// Positive for consecutive correct votes, negative for consecutive misses
    pub streak: i32,
    /// Credibility per domain
    pub domain_credibility: HashMap<String, f64>,
    pub last_updated: DateTime<Utc>,
}

impl MemberCredibility {
    fn new(member_id: &str, initial: f64) -> Self {
        Self {
            member_id: member_id.to_string(),
            credibility: initial,
            total_votes: 0,
            correct_predictions: 0,
            streak: 0,
            domain_credibility: HashMap::new(),
            last_updated: Utc::now(),
        }
    }

    /// Lifetime accuracy; zero before any vote.
    pub fn accuracy(&self) -> f64 {
        if self.total_votes == 0 {
            0.0
        } else {
            self.correct_predictions as f64 / self.total_votes as f64
        }
    }

    fn apply(&mut self, correct: bool, domains: &[String], config: &CredibilityConfig) {
        self.total_votes += 1;
        if correct {
            self.correct_predictions += 1;
            self.streak = if self.streak > 0 { self.streak + 1 } else { 1 };
        } else {
            self.streak = if self.streak < 0 { self.streak - 1 } else { -1 };
        }

        let rate = config.ema_rate;
        self.credibility = config.clamp(self.credibility * (1.0 - rate) + self.accuracy() * rate);

        let observed = if correct { 1.0 } else { 0.0 };
        for domain in domains {
            let previous = self
                .domain_credibility
                .get(domain)
                .copied()
                .unwrap_or(config.initial);
            self.domain_credibility.insert(
                domain.clone(),
                config.clamp(previous * (1.0 - rate) + observed * rate),
            );
        }

        self.last_updated = Utc::now();
    }
}

/// One member's change from an outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityUpdate {
    pub member_id: String,
    pub previous: f64,
    pub credibility: f64,
    pub correct: bool,
}

/// Effect of recording one outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeReport {
    /// Members whose credibility changed, by member ID
    pub updates: Vec<CredibilityUpdate>,
    /// Voters not tracked by this council
    pub untracked: Vec<String>,
    /// Voters who abstained
    pub abstained: Vec<String>,
}

/// Aggregate tracker statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityStats {
    pub tracked_members: usize,
    pub outcomes_recorded: usize,
    pub votes_scored: u64,
    pub mean_credibility: f64,
    pub most_credible: Option<String>,
}

/// Learns member credibility from outcomes.
pub struct CredibilityTracker {
    config: CredibilityConfig,
    /// Per-member records
    records: DashMap<String, MemberCredibility>,
    /// All outcomes, oldest first
    history: RwLock<Vec<DecisionOutcome>>,
    /// Serializes outcome recording
    write_lock: Mutex<()>,
    audit: Arc<dyn AuditSink>,
    events: Arc<dyn EventPublisher>,
}

impl CredibilityTracker {
    /// Track every voting member of the registry.
    pub fn new(
        registry: CouncilRegistry,
        config: CredibilityConfig,
        audit: Arc<dyn AuditSink>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        let records = DashMap::new();
        for seat in registry.voting_seats() {
            records.insert(
                seat.id.to_string(),
                MemberCredibility::new(seat.id, config.initial),
            );
        }

        Self {
            config,
            records,
            history: RwLock::new(Vec::new()),
            write_lock: Mutex::new(()),
            audit,
            events,
        }
    }

    /// Ingest an outcome and rescore every voter.
    pub async fn record_outcome(&self, mut outcome: DecisionOutcome) -> OutcomeReport {
        let _guard = self.write_lock.lock().await;

        if !outcome.outcome_quality.is_finite() {
            warn!(vote_id = %outcome.vote_id, "Non-finite outcome quality, treating as neutral");
            outcome.outcome_quality = 0.0;
        }
        outcome.outcome_quality = outcome.outcome_quality.clamp(-1.0, 1.0);

        let domains: Vec<String> = outcome
            .domains
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        let mut voters: Vec<(&String, &Recommendation)> = outcome.member_votes.iter().collect();
        voters.sort_by(|a, b| a.0.cmp(b.0));

        let mut report = OutcomeReport::default();
        for (member_id, vote) in voters {
            if *vote == Recommendation::Abstain {
                report.abstained.push(member_id.clone());
                continue;
            }

            let Some(mut record) = self.records.get_mut(member_id) else {
                warn!(member_id = %member_id, vote_id = %outcome.vote_id, "Voter not tracked, skipping");
                report.untracked.push(member_id.clone());
                continue;
            };

            let correct = is_correct(*vote, outcome.decision, outcome.outcome_quality);
            let previous = record.credibility;
            record.apply(correct, &domains, &self.config);

            debug!(
                member_id = %member_id,
                previous = previous,
                credibility = record.credibility,
                correct = correct,
                "Credibility updated"
            );

            report.updates.push(CredibilityUpdate {
                member_id: member_id.clone(),
                previous,
                credibility: record.credibility,
                correct,
            });
        }

        self.audit.log(
            "outcome_recorded",
            "credibility-tracker",
            TrustLevel::System,
            serde_json::json!({
                "vote_id": outcome.vote_id,
                "topic": outcome.topic,
                "decision": outcome.decision.as_str(),
                "outcome_quality": outcome.outcome_quality,
                "updates": report.updates,
            }),
        );

        for update in &report.updates {
            self.events.publish(GovernanceEvent::CredibilityUpdated {
                member_id: update.member_id.clone(),
                previous: update.previous,
                credibility: update.credibility,
                correct: update.correct,
            });
        }
        self.events.publish(GovernanceEvent::OutcomeRecorded {
            vote_id: outcome.vote_id.clone(),
            decision: outcome.decision.as_str().to_string(),
            outcome_quality: outcome.outcome_quality,
            voters_scored: report.updates.len(),
        });

        info!(
            vote_id = %outcome.vote_id,
            decision = outcome.decision.as_str(),
            scored = report.updates.len(),
            untracked = report.untracked.len(),
            "Outcome recorded"
        );

        self.history
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(outcome);

        report
    }

    /// Current credibility of a member.
    pub fn credibility_of(&self, member_id: &str) -> Option<f64> {
        self.records.get(member_id).map(|r| r.credibility)
    }

    /// Domain credibility of a member, falling back to overall credibility.
    pub fn domain_credibility_of(&self, member_id: &str, domain: &str) -> Option<f64> {
        let record = self.records.get(member_id)?;
        let domain = domain.trim().to_lowercase();
        Some(
            record
                .domain_credibility
                .get(&domain)
                .copied()
                .unwrap_or(record.credibility),
        )
    }

    /// Full record of a member.
    pub fn record(&self, member_id: &str) -> Option<MemberCredibility> {
        self.records.get(member_id).map(|r| r.value().clone())
    }

    /// All records, by member ID.
    pub fn all(&self) -> Vec<MemberCredibility> {
        let mut all: Vec<MemberCredibility> =
            self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.member_id.cmp(&b.member_id));
        all
    }

    /// Recorded outcomes, oldest first.
    pub fn history(&self) -> Vec<DecisionOutcome> {
        self.history
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Aggregate statistics.
    pub fn stats(&self) -> CredibilityStats {
        let all = self.all();
        let tracked_members = all.len();
        let mean_credibility = if tracked_members == 0 {
            0.0
        } else {
            all.iter().map(|r| r.credibility).sum::<f64>() / tracked_members as f64
        };
        let most_credible = all
            .iter()
            .filter(|r| r.total_votes > 0)
            .max_by(|a, b| a.credibility.total_cmp(&b.credibility))
            .map(|r| r.member_id.clone());

        CredibilityStats {
            tracked_members,
            outcomes_recorded: self
                .history
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .len(),
            votes_scored: all.iter().map(|r| r.total_votes as u64).sum(),
            mean_credibility,
            most_credible,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &CredibilityConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oversight::{AuditLog, EventBus, NullPublisher};

    fn tracker() -> CredibilityTracker {
        CredibilityTracker::new(
            CouncilRegistry::standard(),
            CredibilityConfig::default(),
            Arc::new(AuditLog::new()),
            Arc::new(NullPublisher),
        )
    }

    #[test]
    fn test_correctness_table() {
        use OutcomeDecision::*;
        use Recommendation::*;

        assert!(is_correct(Approve, Passed, 0.5));
        assert!(!is_correct(Approve, Passed, 0.0));
        assert!(is_correct(Reject, Passed, -0.2));
        assert!(is_correct(Reject, Failed, 0.0));
        assert!(is_correct(Approve, Failed, -0.1));
        assert!(!is_correct(Approve, Failed, 0.3));
        for decision in [Vetoed, Expired, Overturned] {
            for quality in [-1.0, 0.0, 1.0] {
                assert!(!is_correct(Approve, decision, quality));
                assert!(!is_correct(Reject, decision, quality));
            }
        }
        assert!(!is_correct(Abstain, Passed, 1.0));
    }

    #[test]
    fn test_initial_state() {
        let tracker = tracker();
        assert_eq!(tracker.all().len(), 9);
        assert_eq!(tracker.credibility_of("guardian"), Some(0.5));
        assert_eq!(tracker.credibility_of("healer"), None);
        assert_eq!(tracker.record("scholar").unwrap().total_votes, 0);
        assert!(tracker.stats().most_credible.is_none());
    }

    #[tokio::test]
    async fn test_single_update() {
        let tracker = tracker();
        let outcome = DecisionOutcome::new("v1", "Rotate keys", OutcomeDecision::Passed, 0.8)
            .with_vote("guardian", Recommendation::Approve)
            .with_vote("scholar", Recommendation::Reject)
            .with_vote("engineer", Recommendation::Abstain)
            .with_vote("stranger", Recommendation::Approve);

        let report = tracker.record_outcome(outcome).await;

        assert_eq!(report.updates.len(), 2);
        assert_eq!(report.abstained, vec!["engineer".to_string()]);
        assert_eq!(report.untracked, vec!["stranger".to_string()]);

        // 0.5 * 0.85 + 1.0 * 0.15
        let guardian = tracker.record("guardian").unwrap();
        assert!((guardian.credibility - 0.575).abs() < 1e-9);
        assert_eq!(guardian.streak, 1);
        assert_eq!(guardian.correct_predictions, 1);

        // 0.5 * 0.85 + 0.0 * 0.15
        let scholar = tracker.record("scholar").unwrap();
        assert!((scholar.credibility - 0.425).abs() < 1e-9);
        assert_eq!(scholar.streak, -1);

        assert_eq!(tracker.record("engineer").unwrap().total_votes, 0);
        assert_eq!(tracker.history().len(), 1);
        assert_eq!(tracker.stats().most_credible.as_deref(), Some("guardian"));
    }

    #[tokio::test]
    async fn test_correct_streak_bounded_above() {
        let tracker = tracker();
        let mut previous = 0.5;
        for i in 0..60 {
            let outcome =
                DecisionOutcome::new(format!("v{}", i), "t", OutcomeDecision::Passed, 1.0)
                    .with_vote("steward", Recommendation::Approve);
            tracker.record_outcome(outcome).await;
            let c = tracker.credibility_of("steward").unwrap();
            assert!(c >= previous && c <= 0.9);
            previous = c;
        }
        assert_eq!(previous, 0.9);
        assert_eq!(tracker.record("steward").unwrap().streak, 60);
    }

    #[tokio::test]
    async fn test_incorrect_streak_bounded_below() {
        let tracker = tracker();
        let mut previous = 0.5;
        for i in 0..60 {
            let outcome =
                DecisionOutcome::new(format!("v{}", i), "t", OutcomeDecision::Failed, -0.5)
                    .with_vote("artisan", Recommendation::Reject);
            tracker.record_outcome(outcome).await;
            let c = tracker.credibility_of("artisan").unwrap();
            assert!(c <= previous && c >= 0.2);
            previous = c;
        }
        assert_eq!(previous, 0.2);
        assert_eq!(tracker.record("artisan").unwrap().streak, -60);
    }

    #[tokio::test]
    async fn test_streak_resets_on_flip() {
        let tracker = tracker();
        let vote = |q: f64| {
            DecisionOutcome::new("v", "t", OutcomeDecision::Passed, q)
                .with_vote("diplomat", Recommendation::Approve)
        };
        tracker.record_outcome(vote(0.5)).await;
        tracker.record_outcome(vote(0.5)).await;
        assert_eq!(tracker.record("diplomat").unwrap().streak, 2);
        tracker.record_outcome(vote(-0.5)).await;
        assert_eq!(tracker.record("diplomat").unwrap().streak, -1);
        tracker.record_outcome(vote(0.5)).await;
        assert_eq!(tracker.record("diplomat").unwrap().streak, 1);
    }

    #[tokio::test]
    async fn test_domain_credibility() {
        let tracker = tracker();
        let outcome = DecisionOutcome::new("v1", "Retention", OutcomeDecision::Passed, 0.6)
            .with_domains(["Memory"])
            .with_vote("archivist", Recommendation::Approve);
        tracker.record_outcome(outcome).await;

        let memory = tracker.domain_credibility_of("archivist", "memory").unwrap();
        assert!((memory - 0.575).abs() < 1e-9);
        // unseen domains fall back to overall credibility
        assert_eq!(
            tracker.domain_credibility_of("archivist", "finance"),
            tracker.credibility_of("archivist")
        );
    }

    #[tokio::test]
    async fn test_custom_config() {
        let config = CredibilityConfig {
            initial: 0.5,
            ema_rate: 0.5,
            floor: 0.1,
            ceiling: 0.95,
        };
        let tracker = CredibilityTracker::new(
            CouncilRegistry::standard(),
            config,
            Arc::new(AuditLog::new()),
            Arc::new(NullPublisher),
        );
        let outcome = DecisionOutcome::new("v1", "t", OutcomeDecision::Passed, 1.0)
            .with_vote("guardian", Recommendation::Approve);
        tracker.record_outcome(outcome).await;
        assert!((tracker.credibility_of("guardian").unwrap() - 0.75).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_audit_and_events() {
        let audit = Arc::new(AuditLog::new());
        let events = Arc::new(EventBus::new());
        let mut rx = events.subscribe();
        let tracker = CredibilityTracker::new(
            CouncilRegistry::standard(),
            CredibilityConfig::default(),
            audit.clone(),
            events.clone(),
        );

        let outcome = DecisionOutcome::new("v9", "t", OutcomeDecision::Vetoed, f64::NAN)
            .with_vote("guardian", Recommendation::Reject)
            .with_vote("ethicist", Recommendation::Approve);
        tracker.record_outcome(outcome).await;

        let names: Vec<&str> = (0..3).map(|_| rx.try_recv().unwrap().name()).collect();
        assert_eq!(
            names,
            vec!["credibility-updated", "credibility-updated", "outcome-recorded"]
        );

        let entries = audit.by_action("outcome_recorded");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].details["outcome_quality"], 0.0);
        assert_eq!(tracker.history()[0].outcome_quality, 0.0);
    }

    #[tokio::test]
    async fn test_concurrent_recording_serialized() {
        let tracker = Arc::new(tracker());
        let mut handles = Vec::new();
        for i in 0..20 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                let outcome =
                    DecisionOutcome::new(format!("v{}", i), "t", OutcomeDecision::Passed, 1.0)
                        .with_vote("treasurer", Recommendation::Approve);
                tracker.record_outcome(outcome).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let record = tracker.record("treasurer").unwrap();
        assert_eq!(record.total_votes, 20);
        assert_eq!(tracker.history().len(), 20);
    }
}
