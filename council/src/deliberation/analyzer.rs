//! Proposal analyzer - derives domains, risk, biases and virtue alignment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use oversight::{EventPublisher, GovernanceEvent};

use crate::lexicon::{self, DOMAIN_KEYWORDS};
use crate::registry::CouncilRegistry;
use crate::types::{Proposal, RiskLevel};

/// Baseline risk score for proposals without a preset level.
const BASELINE_RISK: f64 = 0.3;
/// Baseline virtue alignment.
const BASELINE_VIRTUE: f64 = 0.5;

/// Kind of cognitive bias detected in proposal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasKind {
    Urgency,
    Authority,
    Framing,
    Anchoring,
    SunkCost,
}

impl BiasKind {
    fn description(&self) -> &'static str {
        match self {
            Self::Urgency => "Urgency pressure may discourage careful review",
            Self::Authority => "Appeal to authority or assumed consensus",
            Self::Framing => "Framed as having no alternative",
            Self::Anchoring => "Fixed reference point may anchor judgement",
            Self::SunkCost => "Justified by effort already spent",
        }
    }
}

/// An informational bias warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiasWarning {
    /// Bias category
    pub kind: BiasKind,
    /// Phrase that triggered the warning
    pub trigger: String,
    /// Human-readable explanation
    pub description: String,
}

/// Snapshot analysis of a proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalAnalysis {
    /// Risk level derived from the score
    pub risk_level: RiskLevel,
    /// Risk score (0.0 - 1.0)
    pub risk_score: f64,
    /// Declared and detected domains
    pub domains: Vec<String>,
    /// Voting members whose coverage touches the domains
    pub relevant_members: Vec<String>,
    /// Detected biases
    pub bias_warnings: Vec<BiasWarning>,
    /// Virtue alignment (0.0 - 1.0)
    pub virtue_alignment: f64,
    /// Step-by-step reasoning
    pub reasoning: Vec<String>,
    /// When the analysis ran
    pub analyzed_at: DateTime<Utc>,
}

/// Analyzes proposal text.
pub struct ProposalAnalyzer {
    registry: CouncilRegistry,
    events: Arc<dyn EventPublisher>,
}

impl ProposalAnalyzer {
    /// Create an analyzer over a registry.
    pub fn new(registry: CouncilRegistry, events: Arc<dyn EventPublisher>) -> Self {
        Self { registry, events }
    }

    /// Analyze a proposal.
    pub fn analyze(&self, proposal: &Proposal) -> ProposalAnalysis {
        let text = proposal.searchable_text();
        let mut reasoning = Vec::new();

        let domains = identify_domains(proposal, &text);
        reasoning.push(format!("Domains: {}", join_or_none(&domains)));

        let relevant_members = self.registry.relevant_members(&domains);
        reasoning.push(format!(
            "Relevant members: {}",
            join_or_none(&relevant_members)
        ));

        let (risk_score, risk_note) = score_risk(proposal, &text);
        let risk_level = RiskLevel::from_score(risk_score);
        reasoning.push(format!("{} → {} ({:.2})", risk_note, risk_level, risk_score));

        let bias_warnings = detect_biases(&text);
        if !bias_warnings.is_empty() {
            let kinds: Vec<String> = bias_warnings
                .iter()
                .map(|w| format!("{:?}", w.kind).to_lowercase())
                .collect();
            reasoning.push(format!("Bias warnings: {}", kinds.join(", ")));
        }

        let (virtue_alignment, virtue_notes) = score_virtue(&text);
        reasoning.push(format!(
            "Virtue alignment {:.2}{}",
            virtue_alignment,
            if virtue_notes.is_empty() {
                String::new()
            } else {
                format!(" ({})", virtue_notes.join(", "))
            }
        ));

        debug!(
            proposal_id = %proposal.id,
            risk = %risk_level,
            risk_score = risk_score,
            domains = ?domains,
            biases = bias_warnings.len(),
            "Proposal analyzed"
        );

        self.events.publish(GovernanceEvent::ProposalAnalyzed {
            proposal_id: proposal.id.clone(),
            topic: proposal.topic.clone(),
            risk_level: risk_level.as_str().to_string(),
            risk_score,
            domains: domains.clone(),
        });

        ProposalAnalysis {
            risk_level,
            risk_score,
            domains,
            relevant_members,
            bias_warnings,
            virtue_alignment,
            reasoning,
            analyzed_at: Utc::now(),
        }
    }
}

/// Declared domains first, then auto-detected ones; deduplicated.
fn identify_domains(proposal: &Proposal, text: &str) -> Vec<String> {
    let mut domains: Vec<String> = Vec::new();
    let mut push = |domain: String| {
        if !domain.is_empty() && !domains.contains(&domain) {
            domains.push(domain);
        }
    };

    for declared in &proposal.domains {
        push(declared.trim().to_lowercase());
    }
    for (domain, keywords) in DOMAIN_KEYWORDS {
        if lexicon::any_hit(text, keywords) {
            push(domain.to_string());
        }
    }
    domains
}

/// Risk score and a note describing how it was reached.
fn score_risk(proposal: &Proposal, text: &str) -> (f64, String) {
    if let Some(preset) = proposal.risk {
        return (preset.preset_score(), format!("Risk preset {}", preset));
    }

    let critical = lexicon::hits(text, lexicon::CRITICAL_RISK_KEYWORDS);
    let high = lexicon::hits(text, lexicon::HIGH_RISK_KEYWORDS);
    let low = lexicon::hits(text, lexicon::LOW_RISK_KEYWORDS);

    let score = BASELINE_RISK + 0.15 * critical.len() as f64 + 0.1 * high.len() as f64
        - 0.05 * low.len() as f64;

    (
        score.clamp(0.0, 1.0),
        format!(
            "Risk keywords critical={:?} high={:?} low={:?}",
            critical, high, low
        ),
    )
}

fn detect_biases(text: &str) -> Vec<BiasWarning> {
    let checks: [(BiasKind, &[&str]); 5] = [
        (BiasKind::Urgency, lexicon::URGENCY_PHRASES),
        (BiasKind::Authority, lexicon::AUTHORITY_PHRASES),
        (BiasKind::Framing, lexicon::FRAMING_PHRASES),
        (BiasKind::Anchoring, lexicon::ANCHORING_PHRASES),
        (BiasKind::SunkCost, lexicon::SUNK_COST_PHRASES),
    ];

    checks
        .iter()
        .filter_map(|(kind, phrases)| {
            phrases.iter().find(|p| text.contains(*p)).map(|trigger| BiasWarning {
                kind: *kind,
                trigger: trigger.to_string(),
                description: kind.description().to_string(),
            })
        })
        .collect()
}

/// Virtue alignment and the categories that moved it.
fn score_virtue(text: &str) -> (f64, Vec<&'static str>) {
    let adjustments: [(&[&str], f64, &'static str); 6] = [
        (lexicon::EVIDENCE_PHRASES, 0.1, "evidence"),
        (lexicon::IMPROVEMENT_PHRASES, 0.05, "improvement"),
        (lexicon::FAIRNESS_PHRASES, 0.1, "fairness"),
        (lexicon::GRADUALISM_PHRASES, 0.1, "gradualism"),
        (lexicon::FORCE_PHRASES, -0.15, "force"),
        (lexicon::RUSH_PHRASES, -0.1, "rush"),
    ];

    let mut score = BASELINE_VIRTUE;
    let mut notes = Vec::new();
    for (phrases, delta, label) in adjustments {
        if lexicon::any_hit(text, phrases) {
            score += delta;
            notes.push(label);
        }
    }
    (score.clamp(0.0, 1.0), notes)
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
