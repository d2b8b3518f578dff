//! Constitutional rule engine.
//!
//! Evaluation is stateless: every call runs the full rule set and produces a
//! binding, audit-logged and published ruling.

use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, warn};

use oversight::{AuditSink, EventPublisher, GovernanceEvent, TrustLevel};

use crate::rules::{immutable_rules, ConstitutionalRule};
use crate::types::{
    ActionContext, RuleDescriptor, Ruling, RulingStatus, RulingSubject, Violation,
};

/// Actor name recorded on rulings.
const ENGINE_ACTOR: &str = "constitutional-engine";

/// Evaluates actions and disputes against the immutable rule set.
pub struct ConstitutionalRuleEngine {
    /// Rules in evaluation order
    rules: Vec<Box<dyn ConstitutionalRule>>,
    /// SHA256 fingerprint of the rule set
    rule_set_hash: String,
    audit: Arc<dyn AuditSink>,
    events: Arc<dyn EventPublisher>,
}

impl ConstitutionalRuleEngine {
    /// Create an engine over the immutable rule set.
    pub fn new(audit: Arc<dyn AuditSink>, events: Arc<dyn EventPublisher>) -> Self {
        let rules = immutable_rules();
        let rule_set_hash = compute_rule_set_hash(&rules);

        info!(
            rule_count = rules.len(),
            rule_set_hash = %rule_set_hash,
            "Constitutional rule engine ready"
        );

        Self {
            rules,
            rule_set_hash,
            audit,
            events,
        }
    }

    /// Descriptors of every rule, in evaluation order.
    pub fn rules(&self) -> Vec<RuleDescriptor> {
        self.rules.iter().map(|r| r.descriptor()).collect()
    }

    /// Fingerprint of the rule set.
    pub fn rule_set_hash(&self) -> &str {
        &self.rule_set_hash
    }

    /// Evaluate an action. Allowed iff no rule objects.
    pub fn evaluate_action(&self, action: &str, context: &ActionContext) -> Ruling {
        let violations = self.collect_violations(context);
        let allowed = violations.is_empty();
        let status = if allowed {
            RulingStatus::Allowed
        } else {
            RulingStatus::Denied
        };

        let ruling = self.issue(
            RulingSubject::Action {
                action: action.to_string(),
            },
            violations,
            status,
        );
        self.record(&ruling, context);
        ruling
    }

    /// Rule on a dispute.
    ///
    /// A dispute that breaks a rule is denied; anything else is referred to
    /// the council. The engine never approves a substantive dispute itself.
    pub fn handle_dispute(
        &self,
        parties: &[String],
        issue: &str,
        context: &ActionContext,
    ) -> Ruling {
        let violations = self.collect_violations(context);
        let status = if violations.is_empty() {
            RulingStatus::ReferToCouncil
        } else {
            RulingStatus::Denied
        };

        let ruling = self.issue(
            RulingSubject::Dispute {
                parties: parties.to_vec(),
                issue: issue.to_string(),
            },
            violations,
            status,
        );
        self.record(&ruling, context);
        ruling
    }

    /// Run every rule and collect denials.
    fn collect_violations(&self, context: &ActionContext) -> Vec<Violation> {
        self.rules
            .iter()
            .filter_map(|rule| {
                let check = rule.check(context);
                if check.allowed {
                    return None;
                }
                let reason = check.reason.unwrap_or_else(|| "denied".to_string());
                debug!(rule_id = %rule.id(), reason = %reason, "Rule denied action");
                Some(Violation {
                    rule_id: rule.id().to_string(),
                    reason,
                })
            })
            .collect()
    }

    fn issue(
        &self,
        subject: RulingSubject,
        violations: Vec<Violation>,
        status: RulingStatus,
    ) -> Ruling {
        Ruling {
            ruling_id: uuid::Uuid::new_v4().to_string(),
            subject,
            allowed: violations.is_empty(),
            violations,
            status,
            binding: true,
            rule_set_hash: self.rule_set_hash.clone(),
            issued_at: chrono::Utc::now(),
        }
    }

    /// Audit-log and publish a ruling.
    fn record(&self, ruling: &Ruling, context: &ActionContext) {
        let reasons = ruling.reasons();

        if ruling.allowed {
            info!(
                ruling_id = %ruling.ruling_id,
                status = ruling.status.as_str(),
                "Constitutional ruling issued"
            );
        } else {
            warn!(
                ruling_id = %ruling.ruling_id,
                status = ruling.status.as_str(),
                violations = ?reasons,
                "Constitutional ruling denied action"
            );
        }

        self.audit.log(
            "constitutional_ruling",
            ENGINE_ACTOR,
            TrustLevel::System,
            serde_json::json!({
                "ruling_id": ruling.ruling_id,
                "subject": ruling.subject,
                "status": ruling.status,
                "allowed": ruling.allowed,
                "violations": reasons,
                "binding": ruling.binding,
                "rule_set_hash": ruling.rule_set_hash,
                "requested_by": context.actor,
                "requester_trust": context.trust_level,
            }),
        );

        self.events.publish(GovernanceEvent::Ruling {
            ruling_id: ruling.ruling_id.clone(),
            status: ruling.status.as_str().to_string(),
            allowed: ruling.allowed,
            violations: reasons,
        });
    }
}

fn compute_rule_set_hash(rules: &[Box<dyn ConstitutionalRule>]) -> String {
    let mut hasher = Sha256::new();
    for rule in rules {
        hasher.update(rule.id().as_bytes());
        hasher.update(b":");
        hasher.update(rule.status().as_str().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
