//! Core types for council deliberation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Risk level of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Score used when a proposal presets its risk.
    pub fn preset_score(&self) -> f64 {
        match self {
            Self::Low => 0.2,
            Self::Medium => 0.5,
            Self::High => 0.75,
            Self::Critical => 0.95,
        }
    }

    /// Level for a risk score.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Critical
        } else if score >= 0.6 {
            Self::High
        } else if score >= 0.35 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Confidence multiplier applied by voting styles.
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Low => 0.8,
            Self::Medium => 1.0,
            Self::High => 1.2,
            Self::Critical => 1.5,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member's recommendation on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Approve,
    Reject,
    Abstain,
}

impl Recommendation {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Abstain => "abstain",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Disposition of a member towards risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingStyle {
    Cautious,
    Balanced,
    Progressive,
}

impl VotingStyle {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cautious => "cautious",
            Self::Balanced => "balanced",
            Self::Progressive => "progressive",
        }
    }

    /// Parse a style name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cautious" => Some(Self::Cautious),
            "balanced" => Some(Self::Balanced),
            "progressive" => Some(Self::Progressive),
            _ => None,
        }
    }
}

impl Default for VotingStyle {
    fn default() -> Self {
        Self::Balanced
    }
}

impl fmt::Display for VotingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposal submitted for council review. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Unique proposal ID
    pub id: String,
    /// Short topic line
    pub topic: String,
    /// Free-text description
    pub description: String,
    /// Domains declared by the initiator
    pub domains: Vec<String>,
    /// Risk declared by the initiator, if any
    pub risk: Option<RiskLevel>,
    /// Who submitted the proposal
    pub initiator: String,
    /// Caller-supplied metadata
    pub metadata: HashMap<String, serde_json::Value>,
    /// When the proposal was submitted
    pub submitted_at: DateTime<Utc>,
}

impl Proposal {
    /// Create a new proposal.
    pub fn new(topic: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            topic: topic.into(),
            description: description.into(),
            domains: Vec::new(),
            risk: None,
            initiator: "unknown".to_string(),
            metadata: HashMap::new(),
            submitted_at: Utc::now(),
        }
    }

    /// Declare domains.
    pub fn with_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Preset the risk level.
    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk = Some(risk);
        self
    }

    /// Set the initiator.
    pub fn with_initiator(mut self, initiator: impl Into<String>) -> Self {
        self.initiator = initiator.into();
        self
    }

    /// Attach a metadata value.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Lowercased topic and description, used for keyword matching.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.topic, self.description).to_lowercase()
    }
}

/// Errors that can occur in council operations.
#[derive(Debug, thiserror::Error)]
pub enum CouncilError {
    /// Governance is halted
    #[error("Governance halted by {halted_by}: {reason}")]
    Halted { halted_by: String, reason: String },

    /// Profile document could not be used
    #[error("Profile error in {file}: {reason}")]
    Profile { file: String, reason: String },

    /// Halt or resume refused
    #[error(transparent)]
    Halt(#[from] constitution::HaltError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CouncilError>;
