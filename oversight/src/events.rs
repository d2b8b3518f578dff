//! Event boundary for state-change announcements.
//!
//! Publishing is fire-and-forget. Events emitted by one call keep their
//! order; there is no ordering guarantee across event names.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Default capacity of the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// A governance state-change announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum GovernanceEvent {
    /// A proposal finished analysis
    ProposalAnalyzed {
        proposal_id: String,
        topic: String,
        risk_level: String,
        risk_score: f64,
        domains: Vec<String>,
    },
    /// A member profile was consulted for a recommendation
    ProfileConsulted {
        member_id: String,
        topic: String,
        recommendation: String,
        confidence: f64,
    },
    /// A member's credibility changed after an outcome
    CredibilityUpdated {
        member_id: String,
        previous: f64,
        credibility: f64,
        correct: bool,
    },
    /// A real-world decision outcome was ingested
    OutcomeRecorded {
        vote_id: String,
        decision: String,
        outcome_quality: f64,
        voters_scored: usize,
    },
    /// The constitutional engine issued a ruling
    Ruling {
        ruling_id: String,
        status: String,
        allowed: bool,
        violations: Vec<String>,
    },
    /// The system was halted
    Halted { authority: String, reason: String },
    /// The system resumed
    Resumed { authority: String },
}

impl GovernanceEvent {
    /// Event name as published on the boundary.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProposalAnalyzed { .. } => "proposal-analyzed",
            Self::ProfileConsulted { .. } => "profile-consulted",
            Self::CredibilityUpdated { .. } => "credibility-updated",
            Self::OutcomeRecorded { .. } => "outcome-recorded",
            Self::Ruling { .. } => "ruling",
            Self::Halted { .. } => "halted",
            Self::Resumed { .. } => "resumed",
        }
    }
}

/// Publisher of governance events.
pub trait EventPublisher: Send + Sync {
    /// Publish an event. Never fails from the caller's point of view.
    fn publish(&self, event: GovernanceEvent);
}

/// Broadcast-backed event bus.
///
/// Events published with no live subscribers are dropped.
pub struct EventBus {
    sender: broadcast::Sender<GovernanceEvent>,
}

impl EventBus {
    /// Create a bus with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus with a custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to all subsequently published events.
    pub fn subscribe(&self) -> broadcast::Receiver<GovernanceEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, event: GovernanceEvent) {
        let name = event.name();
        if self.sender.send(event).is_err() {
            trace!(event = name, "No subscribers for governance event");
        }
    }
}

/// Publisher that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

impl EventPublisher for NullPublisher {
    fn publish(&self, _event: GovernanceEvent) {}
}
