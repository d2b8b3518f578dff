//! Audit boundary for governance activity.
//!
//! Every component records its evaluations, rulings, halts and deliberations
//! through [`AuditSink::log`]. The hash-chained production log lives outside
//! this workspace; [`AuditLog`] is the bounded in-memory implementation used
//! for embedding and tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::RwLock;

use crate::types::TrustLevel;

/// Maximum entries in the audit log before pruning.
const MAX_AUDIT_ENTRIES: usize = 10_000;

/// Acknowledgement returned for a logged entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditAck {
    /// Identifier of the stored entry
    pub entry_id: String,
    /// When the sink accepted the entry
    pub recorded_at: DateTime<Utc>,
}

/// Sink for audit records.
///
/// Delivery is at-least-once; nothing in governance state is derived by
/// replaying the log, so duplicates are harmless.
pub trait AuditSink: Send + Sync {
    /// Record an action taken by `actor` at `trust_level`.
    fn log(
        &self,
        action: &str,
        actor: &str,
        trust_level: TrustLevel,
        details: serde_json::Value,
    ) -> AuditAck;
}

/// An entry in the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry ID
    pub entry_id: String,
    /// Action name, e.g. `deliberation` or `constitutional_ruling`
    pub action: String,
    /// Who performed the action
    pub actor: String,
    /// Trust level of the actor
    pub trust_level: TrustLevel,
    /// Structured details
    pub details: serde_json::Value,
    /// When the entry was recorded
    pub recorded_at: DateTime<Utc>,
}

/// In-memory audit log (newest first).
pub struct AuditLog {
    entries: RwLock<VecDeque<AuditEntry>>,
    /// Maximum entries to retain
    max_entries: usize,
}

impl AuditLog {
    /// Create a new audit log.
    pub fn new() -> Self {
        Self::with_max_entries(MAX_AUDIT_ENTRIES)
    }

    /// Create with custom max entries.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            max_entries,
        }
    }

    /// Get recent entries.
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.iter().take(limit).cloned().collect()
    }

    /// Get entries for an action name.
    pub fn by_action(&self, action: &str) -> Vec<AuditEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }

    /// Get entries recorded for an actor.
    pub fn by_actor(&self, actor: &str, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|e| e.actor == actor)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Get count.
    pub fn count(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Clear the log.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for AuditLog {
    fn log(
        &self,
        action: &str,
        actor: &str,
        trust_level: TrustLevel,
        details: serde_json::Value,
    ) -> AuditAck {
        let entry = AuditEntry {
            entry_id: uuid::Uuid::new_v4().to_string(),
            action: action.to_string(),
            actor: actor.to_string(),
            trust_level,
            details,
            recorded_at: Utc::now(),
        };
        let ack = AuditAck {
            entry_id: entry.entry_id.clone(),
            recorded_at: entry.recorded_at,
        };

        tracing::trace!(entry_id = %ack.entry_id, action = %action, actor = %actor, "Audit entry recorded");

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push_front(entry);

        // Prune if over limit
        while entries.len() > self.max_entries {
            entries.pop_back();
        }

        ack
    }
}
