//! Voting style enforcement.
//!
//! Cautious members need more confidence the riskier the proposal;
//! progressive members need strong conviction to reject.

use serde::{Deserialize, Serialize};

use crate::types::{Recommendation, RiskLevel, VotingStyle};

/// Result of applying a voting style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleAdjustment {
    /// Possibly adjusted recommendation
    pub recommendation: Recommendation,
    /// Adjusted confidence (0.0 - 1.0)
    pub confidence: f64,
    /// What changed, if anything
    pub note: Option<String>,
}

/// Applies voting-style adjustments.
#[derive(Debug, Clone, Copy, Default)]
pub struct VotingStyleEnforcer;

impl VotingStyleEnforcer {
    pub fn new() -> Self {
        Self
    }

    /// Adjust a recommendation for the member's style and the proposal's risk.
    pub fn enforce(
        &self,
        recommendation: Recommendation,
        confidence: f64,
        style: VotingStyle,
        risk: RiskLevel,
    ) -> StyleAdjustment {
        let multiplier = risk.multiplier();

        let (recommendation, confidence, note) = match (style, recommendation) {
            (VotingStyle::Cautious, Recommendation::Approve) => {
                let required = 0.7 * multiplier;
                if confidence < required {
                    (
                        Recommendation::Abstain,
                        confidence * 0.85,
                        Some(format!(
                            "cautious: approval below {:.2} on {} risk, abstaining",
                            required, risk
                        )),
                    )
                } else {
                    (
                        Recommendation::Approve,
                        confidence - 0.15 * multiplier,
                        Some(format!("cautious: approval tempered for {} risk", risk)),
                    )
                }
            }
            (VotingStyle::Progressive, Recommendation::Reject) if confidence < 0.7 => (
                Recommendation::Abstain,
                confidence * 1.1,
                Some("progressive: weak rejection, abstaining".to_string()),
            ),
            (VotingStyle::Progressive, Recommendation::Approve) => (
                Recommendation::Approve,
                confidence * 1.1,
                Some("progressive: approval strengthened".to_string()),
            ),
            (_, recommendation) => (recommendation, confidence, None),
        };

        StyleAdjustment {
            recommendation,
            confidence: clamp_unit(confidence),
            note,
        }
    }
}

/// Recommendation used for a member with no loaded profile.
pub fn default_recommendation(style: VotingStyle, risk: RiskLevel) -> (Recommendation, f64) {
    match style {
        VotingStyle::Cautious => match risk {
            RiskLevel::Critical => (Recommendation::Reject, 0.7),
            RiskLevel::High | RiskLevel::Medium => (Recommendation::Abstain, 0.7),
            RiskLevel::Low => (Recommendation::Approve, 0.6),
        },
        VotingStyle::Progressive => match risk {
            RiskLevel::Critical => (Recommendation::Abstain, 0.5),
            _ => (Recommendation::Approve, 0.75),
        },
        VotingStyle::Balanced => match risk {
            RiskLevel::Critical => (Recommendation::Reject, 0.6),
            RiskLevel::High => (Recommendation::Abstain, 0.5),
            _ => (Recommendation::Approve, 0.6),
        },
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RISKS: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    #[test]
    fn test_balanced_is_identity() {
        let enforcer = VotingStyleEnforcer::new();
        for risk in RISKS {
            for rec in [
                Recommendation::Approve,
                Recommendation::Reject,
                Recommendation::Abstain,
            ] {
                for confidence in [0.0, 0.3, 0.65, 1.0] {
                    let adj = enforcer.enforce(rec, confidence, VotingStyle::Balanced, risk);
                    assert_eq!(adj.recommendation, rec);
                    assert_eq!(adj.confidence, confidence);
                    assert!(adj.note.is_none());
                }
            }
        }
    }

    #[test]
    fn test_cautious_weak_approval_abstains() {
        let adj = VotingStyleEnforcer::new().enforce(
            Recommendation::Approve,
            0.8,
            VotingStyle::Cautious,
            RiskLevel::High,
        );
        // 0.8 < 0.7 * 1.2
        assert_eq!(adj.recommendation, Recommendation::Abstain);
        assert!((adj.confidence - 0.68).abs() < 1e-9);
    }

    #[test]
    fn test_cautious_strong_approval_tempered() {
        let adj = VotingStyleEnforcer::new().enforce(
            Recommendation::Approve,
            0.6,
            VotingStyle::Cautious,
            RiskLevel::Low,
        );
        // 0.6 >= 0.56, minus 0.12
        assert_eq!(adj.recommendation, Recommendation::Approve);
        assert!((adj.confidence - 0.48).abs() < 1e-9);
    }

    #[test]
    fn test_cautious_reject_unchanged() {
        let adj = VotingStyleEnforcer::new().enforce(
            Recommendation::Reject,
            0.7,
            VotingStyle::Cautious,
            RiskLevel::Critical,
        );
        assert_eq!(adj.recommendation, Recommendation::Reject);
        assert_eq!(adj.confidence, 0.7);
    }

    #[test]
    fn test_progressive_adjustments() {
        let enforcer = VotingStyleEnforcer::new();

        let adj = enforcer.enforce(
            Recommendation::Reject,
            0.6,
            VotingStyle::Progressive,
            RiskLevel::Medium,
        );
        assert_eq!(adj.recommendation, Recommendation::Abstain);
        assert!((adj.confidence - 0.66).abs() < 1e-9);

        let adj = enforcer.enforce(
            Recommendation::Reject,
            0.9,
            VotingStyle::Progressive,
            RiskLevel::Medium,
        );
        assert_eq!(adj.recommendation, Recommendation::Reject);
        assert_eq!(adj.confidence, 0.9);

        let adj = enforcer.enforce(
            Recommendation::Approve,
            0.95,
            VotingStyle::Progressive,
            RiskLevel::Low,
        );
        assert_eq!(adj.confidence, 1.0);
    }

    #[test]
    fn test_confidence_always_in_unit_range() {
        let enforcer = VotingStyleEnforcer::new();
        for style in [VotingStyle::Cautious, VotingStyle::Progressive] {
            for risk in RISKS {
                for rec in [Recommendation::Approve, Recommendation::Reject] {
                    for confidence in [0.0, 0.1, 0.5, 0.99, 1.0] {
                        let adj = enforcer.enforce(rec, confidence, style, risk);
                        assert!((0.0..=1.0).contains(&adj.confidence));
                    }
                }
            }
        }
    }

    #[test]
    fn test_defaults_by_style() {
        assert_eq!(
            default_recommendation(VotingStyle::Cautious, RiskLevel::Critical),
            (Recommendation::Reject, 0.7)
        );
        assert_eq!(
            default_recommendation(VotingStyle::Cautious, RiskLevel::Medium),
            (Recommendation::Abstain, 0.7)
        );
        assert_eq!(
            default_recommendation(VotingStyle::Progressive, RiskLevel::Low),
            (Recommendation::Approve, 0.75)
        );
        assert_eq!(
            default_recommendation(VotingStyle::Progressive, RiskLevel::Critical),
            (Recommendation::Abstain, 0.5)
        );
        assert_eq!(
            default_recommendation(VotingStyle::Balanced, RiskLevel::High),
            (Recommendation::Abstain, 0.5)
        );
    }
}
