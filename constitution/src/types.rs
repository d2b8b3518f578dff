//! Core types for constitutional evaluation.
//!
//! With the `typescript` feature enabled, the plain enums and descriptors can
//! be exported to TypeScript using ts-rs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use oversight::TrustLevel;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Whether a rule may ever change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleStatus {
    /// Fixed for the lifetime of the deployment
    Immutable,
    /// Adjustable through governance
    Mutable,
}

impl RuleStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immutable => "IMMUTABLE",
            Self::Mutable => "MUTABLE",
        }
    }
}

/// Result of a single rule check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCheck {
    /// Whether the rule permits the action
    pub allowed: bool,
    /// Machine-readable denial reason
    pub reason: Option<String>,
}

impl RuleCheck {
    /// The rule permits the action.
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    /// The rule denies the action.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Operation performed against the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum AuditOperation {
    Append,
    Update,
    Delete,
    Truncate,
}

/// Context an action is evaluated in.
///
/// Every field defaults to the permissive value, so a context can be
/// deserialized from a partial JSON object such as `{"against_creator": true}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionContext {
    /// Action works against the system's creator
    pub against_creator: bool,
    /// Host the action connects to, if any
    pub target_host: Option<String>,
    /// External content is being executed as instructions
    pub content_as_command: bool,
    /// Operation on the audit log, if the action touches it
    pub audit_operation: Option<AuditOperation>,
    /// Action is destructive
    pub destructive: bool,
    /// Destructive action was approved beforehand
    pub prior_approval: bool,
    /// Action touches sensitive resources
    pub sensitive: bool,
    /// Trust level of the requester
    pub trust_level: Option<TrustLevel>,
    /// Who requested the action
    pub actor: Option<String>,
    /// Any further caller-supplied fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ActionContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the requesting actor and trust level.
    pub fn by(mut self, actor: impl Into<String>, trust_level: TrustLevel) -> Self {
        self.actor = Some(actor.into());
        self.trust_level = Some(trust_level);
        self
    }

    /// Mark the action as working against the creator.
    pub fn against_creator(mut self) -> Self {
        self.against_creator = true;
        self
    }

    /// Set the target host.
    pub fn targeting(mut self, host: impl Into<String>) -> Self {
        self.target_host = Some(host.into());
        self
    }

    /// Mark that external content is executed as a command.
    pub fn content_as_command(mut self) -> Self {
        self.content_as_command = true;
        self
    }

    /// Set the audit log operation.
    pub fn audit_operation(mut self, operation: AuditOperation) -> Self {
        self.audit_operation = Some(operation);
        self
    }

    /// Mark the action as destructive, with or without prior approval.
    pub fn destructive(mut self, prior_approval: bool) -> Self {
        self.destructive = true;
        self.prior_approval = prior_approval;
        self
    }

    /// Mark the action as touching sensitive resources.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// A rule that denied an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule identifier
    pub rule_id: String,
    /// Machine-readable reason
    pub reason: String,
}

/// Outcome category of a ruling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RulingStatus {
    /// No rule objected
    Allowed,
    /// At least one rule objected
    Denied,
    /// Constitutionally permissible; the substance belongs to the council
    ReferToCouncil,
}

impl RulingStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allowed => "ALLOWED",
            Self::Denied => "DENIED",
            Self::ReferToCouncil => "REFER_TO_COUNCIL",
        }
    }
}

/// What a ruling was issued about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RulingSubject {
    /// A single action
    Action { action: String },
    /// A dispute between parties
    Dispute { parties: Vec<String>, issue: String },
}

/// A binding ruling of the constitutional engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ruling {
    /// Ruling ID for audit correlation
    pub ruling_id: String,
    /// What was ruled on
    pub subject: RulingSubject,
    /// Whether the action may proceed
    pub allowed: bool,
    /// Rules that objected
    pub violations: Vec<Violation>,
    /// Outcome category
    pub status: RulingStatus,
    /// Rulings are always binding
    pub binding: bool,
    /// Fingerprint of the rule set that produced the ruling
    pub rule_set_hash: String,
    /// When the ruling was issued
    pub issued_at: DateTime<Utc>,
}

impl Ruling {
    /// Denial reasons formatted as `rule_id: reason`.
    pub fn reasons(&self) -> Vec<String> {
        self.violations
            .iter()
            .map(|v| format!("{}: {}", v.rule_id, v.reason))
            .collect()
    }
}

/// Public description of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct RuleDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: RuleStatus,
}
