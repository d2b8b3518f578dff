//! Emergency halt.
//!
//! A dual-authority gate: either the operator or the guardian can halt the
//! system, only the operator can resume it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use oversight::{AuditSink, EventPublisher, GovernanceEvent, TrustLevel};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Error types for halt operations.
#[derive(Debug, thiserror::Error)]
pub enum HaltError {
    /// Authority may not perform the operation
    #[error("Authority '{authority}' is not permitted to {operation}")]
    Unauthorized {
        authority: HaltAuthority,
        operation: &'static str,
    },

    /// Authority string not recognised
    #[error("Unknown halt authority: {0}")]
    UnknownAuthority(String),
}

/// Who may operate the halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum HaltAuthority {
    /// Human operator; may halt and resume
    Operator,
    /// Guardian council seat; may only halt
    Guardian,
}

impl HaltAuthority {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Guardian => "guardian",
        }
    }

    fn trust_level(&self) -> TrustLevel {
        match self {
            Self::Operator => TrustLevel::Operator,
            Self::Guardian => TrustLevel::System,
        }
    }
}

impl fmt::Display for HaltAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HaltAuthority {
    type Err = HaltError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "operator" => Ok(Self::Operator),
            "guardian" => Ok(Self::Guardian),
            _ => Err(HaltError::UnknownAuthority(s.to_string())),
        }
    }
}

/// Snapshot of the halt gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaltState {
    /// Whether the system is halted
    pub halted: bool,
    /// Who halted it
    pub halted_by: Option<HaltAuthority>,
    /// When it was halted
    pub halted_at: Option<DateTime<Utc>>,
    /// Why it was halted
    pub reason: Option<String>,
}

/// Result of a halt or resume call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltTransition {
    /// Running → Halted
    Halted,
    /// Already halted; nothing changed
    AlreadyHalted,
    /// Halted → Running
    Resumed,
    /// Already running; nothing changed
    AlreadyRunning,
}

/// The emergency halt gate. Starts in the running state.
pub struct EmergencyHalt {
    state: RwLock<HaltState>,
    audit: Arc<dyn AuditSink>,
    events: Arc<dyn EventPublisher>,
}

impl EmergencyHalt {
    /// Create a running gate.
    pub fn new(audit: Arc<dyn AuditSink>, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            state: RwLock::new(HaltState::default()),
            audit,
            events,
        }
    }

    /// Halt the system. Idempotent.
    pub async fn halt(&self, authority: HaltAuthority, reason: impl Into<String>) -> HaltTransition {
        let reason = reason.into();
        let mut state = self.state.write().await;

        if state.halted {
            warn!(
                authority = %authority,
                halted_by = ?state.halted_by,
                "Halt requested while already halted"
            );
            return HaltTransition::AlreadyHalted;
        }

        let now = Utc::now();
        *state = HaltState {
            halted: true,
            halted_by: Some(authority),
            halted_at: Some(now),
            reason: Some(reason.clone()),
        };

        error!(authority = %authority, reason = %reason, "EMERGENCY HALT engaged");

        self.audit.log(
            "emergency_halt",
            authority.as_str(),
            authority.trust_level(),
            serde_json::json!({ "reason": reason, "halted_at": now }),
        );
        self.events.publish(GovernanceEvent::Halted {
            authority: authority.as_str().to_string(),
            reason,
        });

        HaltTransition::Halted
    }

    /// Resume the system. Only the operator may resume.
    pub async fn resume(&self, authority: HaltAuthority) -> Result<HaltTransition, HaltError> {
        if authority != HaltAuthority::Operator {
            error!(authority = %authority, "Rejected resume from unauthorized authority");
            self.audit.log(
                "emergency_resume_rejected",
                authority.as_str(),
                authority.trust_level(),
                serde_json::json!({ "reason": "only the operator may resume" }),
            );
            return Err(HaltError::Unauthorized {
                authority,
                operation: "resume",
            });
        }

        let mut state = self.state.write().await;

        if !state.halted {
            warn!(authority = %authority, "Resume requested while running");
            return Ok(HaltTransition::AlreadyRunning);
        }

        let previous = std::mem::take(&mut *state);

        info!(
            authority = %authority,
            halted_by = ?previous.halted_by,
            "Emergency halt lifted"
        );

        self.audit.log(
            "emergency_resume",
            authority.as_str(),
            authority.trust_level(),
            serde_json::json!({
                "halted_by": previous.halted_by,
                "halted_at": previous.halted_at,
                "reason": previous.reason,
            }),
        );
        self.events.publish(GovernanceEvent::Resumed {
            authority: authority.as_str().to_string(),
        });

        Ok(HaltTransition::Resumed)
    }

    /// Whether the system is halted.
    pub async fn is_halted(&self) -> bool {
        self.state.read().await.halted
    }

    /// Current halt state.
    pub async fn status(&self) -> HaltState {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oversight::{AuditLog, EventBus, NullPublisher};

    fn gate() -> (EmergencyHalt, Arc<AuditLog>) {
        let audit = Arc::new(AuditLog::new());
        (EmergencyHalt::new(audit.clone(), Arc::new(NullPublisher)), audit)
    }

    #[tokio::test]
    async fn test_initially_running() {
        let (halt, _) = gate();
        assert!(!halt.is_halted().await);
        assert_eq!(halt.status().await, HaltState::default());
    }

    #[tokio::test]
    async fn test_guardian_halt_operator_resume() {
        let (halt, audit) = gate();

        assert_eq!(
            halt.halt(HaltAuthority::Guardian, "x").await,
            HaltTransition::Halted
        );
        let status = halt.status().await;
        assert!(status.halted);
        assert_eq!(status.halted_by, Some(HaltAuthority::Guardian));
        assert!(status.halted_at.is_some());
        assert_eq!(status.reason.as_deref(), Some("x"));

        assert_eq!(
            halt.resume(HaltAuthority::Operator).await.unwrap(),
            HaltTransition::Resumed
        );
        let status = halt.status().await;
        assert!(!status.halted);
        assert!(status.halted_by.is_none());
        assert!(status.halted_at.is_none());
        assert!(status.reason.is_none());

        assert_eq!(audit.by_action("emergency_halt").len(), 1);
        assert_eq!(audit.by_action("emergency_resume").len(), 1);
    }

    #[tokio::test]
    async fn test_guardian_cannot_resume() {
        let (halt, _) = gate();

        // Rejected even while running
        assert!(matches!(
            halt.resume(HaltAuthority::Guardian).await,
            Err(HaltError::Unauthorized { .. })
        ));

        halt.halt(HaltAuthority::Operator, "maintenance").await;
        assert!(halt.resume(HaltAuthority::Guardian).await.is_err());
        assert!(halt.is_halted().await);
    }

    #[tokio::test]
    async fn test_idempotent_transitions() {
        let (halt, _) = gate();

        assert_eq!(
            halt.resume(HaltAuthority::Operator).await.unwrap(),
            HaltTransition::AlreadyRunning
        );

        halt.halt(HaltAuthority::Operator, "first").await;
        assert_eq!(
            halt.halt(HaltAuthority::Guardian, "second").await,
            HaltTransition::AlreadyHalted
        );

        let status = halt.status().await;
        assert_eq!(status.halted_by, Some(HaltAuthority::Operator));
        assert_eq!(status.reason.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_transitions_published() {
        let events = Arc::new(EventBus::new());
        let mut rx = events.subscribe();
        let halt = EmergencyHalt::new(Arc::new(AuditLog::new()), events.clone());

        halt.halt(HaltAuthority::Guardian, "anomaly spike").await;
        halt.resume(HaltAuthority::Operator).await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            GovernanceEvent::Halted {
                authority: "guardian".to_string(),
                reason: "anomaly spike".to_string(),
            }
        );
        assert_eq!(rx.recv().await.unwrap().name(), "resumed");
    }

    #[test]
    fn test_authority_parsing() {
        assert_eq!("operator".parse::<HaltAuthority>().unwrap(), HaltAuthority::Operator);
        assert_eq!(" Guardian ".parse::<HaltAuthority>().unwrap(), HaltAuthority::Guardian);
        assert!(matches!(
            "root".parse::<HaltAuthority>(),
            Err(HaltError::UnknownAuthority(_))
        ));
    }
}
