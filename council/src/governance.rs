//! GovernanceCore - one council governance instance.
//!
//! Owns deliberation, credibility learning, the constitutional rule engine
//! and the emergency halt. Nothing is global; each instance is built
//! explicitly and owns its state.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use constitution::{
    ActionContext, ConstitutionalRuleEngine, EmergencyHalt, HaltAuthority, HaltState,
    HaltTransition, Ruling,
};
use oversight::{AuditLog, AuditSink, EventPublisher, NullPublisher};

use crate::config::CouncilConfig;
use crate::credibility::{CredibilityTracker, DecisionOutcome, OutcomeReport};
use crate::deliberation::{DeliberationEngine, DeliberationResult, ProposalAnalysis};
use crate::identity::{MemberIdentityStore, MemberProfile};
use crate::registry::CouncilRegistry;
use crate::types::{CouncilError, Proposal, Result};

/// A council governance instance.
pub struct GovernanceCore {
    /// Configuration
    config: CouncilConfig,
    /// Member roster
    registry: CouncilRegistry,
    /// Deliberation pipeline
    engine: DeliberationEngine,
    /// Loaded member profiles
    identities: Arc<MemberIdentityStore>,
    /// Credibility learning
    credibility: Arc<CredibilityTracker>,
    /// Immutable rule gate
    rules: ConstitutionalRuleEngine,
    /// Emergency halt gate
    halt: EmergencyHalt,
}

impl GovernanceCore {
    /// Start building an instance.
    pub fn builder(council_id: impl Into<String>) -> GovernanceBuilder {
        GovernanceBuilder::new(council_id)
    }

    /// Council ID.
    pub fn id(&self) -> &str {
        &self.config.council_id
    }

    /// Active configuration.
    pub fn config(&self) -> &CouncilConfig {
        &self.config
    }

    /// Member roster.
    pub fn registry(&self) -> CouncilRegistry {
        self.registry
    }

    /// Deliberate a proposal. Refused while halted.
    pub async fn deliberate(&self, proposal: &Proposal) -> Result<DeliberationResult> {
        let halt = self.halt.status().await;
        if halt.halted {
            warn!(
                council_id = %self.config.council_id,
                proposal_id = %proposal.id,
                "Deliberation refused while halted"
            );
            return Err(halted_error(halt));
        }
        Ok(self.engine.deliberate(proposal))
    }

    /// Analyze a proposal without deliberating.
    pub fn analyze(&self, proposal: &Proposal) -> ProposalAnalysis {
        self.engine.analyze(proposal)
    }

    /// Report a real-world outcome into the credibility loop.
    ///
    /// Outcomes are accepted while halted; they describe decisions already made.
    pub async fn report_outcome(&self, outcome: DecisionOutcome) -> OutcomeReport {
        self.credibility.record_outcome(outcome).await
    }

    /// Rule on an action.
    pub fn evaluate_action(&self, action: &str, context: &ActionContext) -> Ruling {
        self.rules.evaluate_action(action, context)
    }

    /// Rule on a dispute.
    pub fn handle_dispute(&self, parties: &[String], issue: &str, context: &ActionContext) -> Ruling {
        self.rules.handle_dispute(parties, issue, context)
    }

    /// Engage the emergency halt.
    pub async fn halt(&self, authority: HaltAuthority, reason: impl Into<String>) -> HaltTransition {
        self.halt.halt(authority, reason).await
    }

    /// Lift the emergency halt. Operator only.
    pub async fn resume(&self, authority: HaltAuthority) -> Result<HaltTransition> {
        Ok(self.halt.resume(authority).await?)
    }

    /// Whether the instance is halted.
    pub async fn is_halted(&self) -> bool {
        self.halt.is_halted().await
    }

    /// Halt state snapshot.
    pub async fn halt_status(&self) -> HaltState {
        self.halt.status().await
    }

    /// Member profiles.
    pub fn identities(&self) -> &MemberIdentityStore {
        &self.identities
    }

    /// Credibility tracker.
    pub fn credibility(&self) -> &CredibilityTracker {
        &self.credibility
    }

    /// Constitutional rule engine.
    pub fn rule_engine(&self) -> &ConstitutionalRuleEngine {
        &self.rules
    }
}

fn halted_error(state: HaltState) -> CouncilError {
    CouncilError::Halted {
        halted_by: state
            .halted_by
            .map(|a| a.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        reason: state.reason.unwrap_or_default(),
    }
}

/// Builder for [`GovernanceCore`].
pub struct GovernanceBuilder {
    config: CouncilConfig,
    registry: CouncilRegistry,
    audit: Option<Arc<dyn AuditSink>>,
    events: Option<Arc<dyn EventPublisher>>,
    profiles: Option<Vec<MemberProfile>>,
}

impl GovernanceBuilder {
    /// Create a new builder.
    pub fn new(council_id: impl Into<String>) -> Self {
        Self {
            config: CouncilConfig::new(council_id),
            registry: CouncilRegistry::standard(),
            audit: None,
            events: None,
            profiles: None,
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: CouncilConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom roster.
    pub fn with_registry(mut self, registry: CouncilRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the audit sink. Defaults to an in-memory [`AuditLog`].
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Set the event publisher. Defaults to discarding events.
    pub fn with_events(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = Some(events);
        self
    }

    /// Use these profiles instead of reading a directory.
    pub fn with_profiles(mut self, profiles: impl IntoIterator<Item = MemberProfile>) -> Self {
        self.profiles = Some(profiles.into_iter().collect());
        self
    }

    /// Load profiles from a directory at build time.
    pub fn profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.profiles.directory = Some(dir.into());
        self
    }

    /// Set the credibility EMA rate.
    pub fn ema_rate(mut self, rate: f64) -> Self {
        self.config.credibility.ema_rate = rate;
        self
    }

    /// Set the credibility clamp bounds.
    pub fn credibility_bounds(mut self, floor: f64, ceiling: f64) -> Self {
        self.config.credibility.floor = floor;
        self.config.credibility.ceiling = ceiling;
        self
    }

    /// Build the instance, loading profiles if a directory is configured.
    pub async fn build(self) -> Result<GovernanceCore> {
        self.config.validate()?;

        let audit = self.audit.unwrap_or_else(|| Arc::new(AuditLog::new()));
        let events = self.events.unwrap_or_else(|| Arc::new(NullPublisher));

        let identities = match (self.profiles, &self.config.profiles.directory) {
            (Some(profiles), _) => MemberIdentityStore::with_profiles(profiles, events.clone()),
            (None, Some(dir)) => MemberIdentityStore::load(dir, events.clone()).await,
            (None, None) => MemberIdentityStore::empty(events.clone()),
        };
        let identities = Arc::new(identities);

        let credibility = Arc::new(CredibilityTracker::new(
            self.registry,
            self.config.credibility,
            audit.clone(),
            events.clone(),
        ));

        let engine = DeliberationEngine::new(
            self.registry,
            identities.clone(),
            credibility.clone(),
            audit.clone(),
            events.clone(),
        );
        let rules = ConstitutionalRuleEngine::new(audit.clone(), events.clone());
        let halt = EmergencyHalt::new(audit, events);

        info!(
            council_id = %self.config.council_id,
            members = self.registry.voting_seats().count(),
            profiles = identities.len(),
            rule_set_hash = %rules.rule_set_hash(),
            "Governance core ready"
        );

        Ok(GovernanceCore {
            config: self.config,
            registry: self.registry,
            engine,
            identities,
            credibility,
            rules,
            halt,
        })
    }
}
