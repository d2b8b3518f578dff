//! Domain-expertise weighting of member votes.

use crate::registry::{terms_match, CouncilRegistry};

/// Base weight for every member.
const BASE_WEIGHT: f64 = 1.0;
/// Maximum bonus from domain coverage.
const COVERAGE_BONUS: f64 = 0.5;
/// Bonus when a veto domain is in play.
const VETO_BONUS: f64 = 0.25;
/// Scale applied to credibility's distance from neutral.
const CREDIBILITY_SCALE: f64 = 0.4;
/// Credibility assumed when none is known.
const NEUTRAL_CREDIBILITY: f64 = 0.5;

/// Weight bounds.
pub const MIN_WEIGHT: f64 = 0.5;
pub const MAX_WEIGHT: f64 = 2.0;

/// Computes how much a member's vote counts on a proposal.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainWeighter {
    registry: CouncilRegistry,
}

impl DomainWeighter {
    /// Create a weighter over a registry.
    pub fn new(registry: CouncilRegistry) -> Self {
        Self { registry }
    }

    /// Share of proposal domains the member covers (0.0 - 1.0).
    pub fn domain_relevance(&self, member_id: &str, domains: &[String]) -> f64 {
        if domains.is_empty() {
            return 0.0;
        }
        let Some(seat) = self.registry.seat(member_id) else {
            return 0.0;
        };
        let matching = domains
            .iter()
            .filter(|d| CouncilRegistry::covers(seat, d))
            .count();
        matching as f64 / domains.len() as f64
    }

    /// Vote weight, clamped to [`MIN_WEIGHT`], [`MAX_WEIGHT`].
    pub fn calculate_weight(
        &self,
        member_id: &str,
        domains: &[String],
        credibility: Option<f64>,
    ) -> f64 {
        let mut weight = BASE_WEIGHT;

        if let Some(seat) = self.registry.seat(member_id) {
            weight += COVERAGE_BONUS * self.domain_relevance(member_id, domains);

            let holds_veto = seat
                .veto_domains
                .iter()
                .any(|veto| domains.iter().any(|d| terms_match(veto, d)));
            if holds_veto {
                weight += VETO_BONUS;
            }
        }

        let credibility = credibility
            .filter(|c| c.is_finite())
            .unwrap_or(NEUTRAL_CREDIBILITY);
        weight += (credibility - NEUTRAL_CREDIBILITY) * CREDIBILITY_SCALE;

        weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domains(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_expert_with_veto() {
        let weighter = DomainWeighter::default();
        let weight = weighter.calculate_weight("guardian", &domains(&["security"]), Some(0.5));
        assert!((weight - 1.75).abs() < 1e-9);
    }

    #[test]
    fn test_partial_relevance() {
        let weighter = DomainWeighter::default();
        let d = domains(&["memory", "finance"]);
        assert!((weighter.domain_relevance("archivist", &d) - 0.5).abs() < 1e-9);
        // 1.0 + 0.25 coverage + 0.25 veto
        assert!((weighter.calculate_weight("archivist", &d, None) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_member_only_credibility() {
        let weighter = DomainWeighter::default();
        let d = domains(&["security"]);
        assert_eq!(weighter.calculate_weight("stranger", &d, None), 1.0);
        assert!((weighter.calculate_weight("stranger", &d, Some(0.9)) - 1.16).abs() < 1e-9);
        assert_eq!(weighter.domain_relevance("stranger", &d), 0.0);
    }

    #[test]
    fn test_no_domains() {
        let weighter = DomainWeighter::default();
        assert_eq!(weighter.domain_relevance("guardian", &[]), 0.0);
        assert_eq!(weighter.calculate_weight("guardian", &[], Some(0.5)), 1.0);
    }

    #[test]
    fn test_weight_bounded_for_any_credibility() {
        let weighter = DomainWeighter::default();
        let d = domains(&["security", "privacy", "ethics"]);
        for credibility in [
            None,
            Some(f64::NAN),
            Some(f64::INFINITY),
            Some(f64::NEG_INFINITY),
            Some(-100.0),
            Some(0.0),
            Some(1.0),
            Some(100.0),
        ] {
            for member in ["guardian", "ethicist", "healer", "stranger"] {
                let w = weighter.calculate_weight(member, &d, credibility);
                assert!(
                    (MIN_WEIGHT..=MAX_WEIGHT).contains(&w),
                    "{} out of range for {} / {:?}",
                    w,
                    member,
                    credibility
                );
            }
        }
    }

    #[test]
    fn test_non_finite_counts_as_neutral() {
        let weighter = DomainWeighter::default();
        let d = domains(&["finance"]);
        assert_eq!(
            weighter.calculate_weight("treasurer", &d, Some(f64::NAN)),
            weighter.calculate_weight("treasurer", &d, None)
        );
    }
}
