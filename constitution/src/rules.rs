//! The immutable constitutional rules.
//!
//! These are the hard boundaries of the governance system. No council vote,
//! operator setting or runtime call can add, remove or weaken them. The set
//! is fixed when the rule engine is constructed.

use std::net::{IpAddr, SocketAddr};

use crate::types::{ActionContext, AuditOperation, RuleCheck, RuleDescriptor, RuleStatus};

/// A constitutional rule. Checks must be pure and total.
pub trait ConstitutionalRule: Send + Sync {
    /// Unique rule identifier.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// What the rule protects.
    fn description(&self) -> &str;

    /// Mutability of the rule.
    fn status(&self) -> RuleStatus {
        RuleStatus::Immutable
    }

    /// Check the rule against an action context.
    fn check(&self, context: &ActionContext) -> RuleCheck;

    /// Public description of the rule.
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            id: self.id().to_string(),
            name: self.name().to_string(),
            description: self.description().to_string(),
            status: self.status(),
        }
    }
}

/// The fixed rule set, in evaluation order.
pub(crate) fn immutable_rules() -> Vec<Box<dyn ConstitutionalRule>> {
    vec![
        Box::new(CreatorPrimacy),
        Box::new(NetworkLocality),
        Box::new(ContentCommandSegregation),
        Box::new(AuditAppendOnly),
        Box::new(LeastPrivilege),
        Box::new(TrustFloor),
    ]
}

/// No action may work against the system's creator.
pub struct CreatorPrimacy;

impl ConstitutionalRule for CreatorPrimacy {
    fn id(&self) -> &str {
        "creator_primacy"
    }
    fn name(&self) -> &str {
        "Creator Primacy"
    }
    fn description(&self) -> &str {
        "No action may be taken against the interests of the system's creator."
    }
    fn check(&self, context: &ActionContext) -> RuleCheck {
        if context.against_creator {
            return RuleCheck::deny("action_against_creator");
        }
        RuleCheck::allow()
    }
}

/// Network traffic stays on the loopback interface.
pub struct NetworkLocality;

impl ConstitutionalRule for NetworkLocality {
    fn id(&self) -> &str {
        "network_locality"
    }
    fn name(&self) -> &str {
        "Network Locality"
    }
    fn description(&self) -> &str {
        "The system may only connect to loopback addresses."
    }
    fn check(&self, context: &ActionContext) -> RuleCheck {
        match context.target_host.as_deref() {
            Some(host) if !is_loopback_host(host) => {
                RuleCheck::deny(format!("non_loopback_target:{}", host))
            }
            _ => RuleCheck::allow(),
        }
    }
}

/// Content is data, never instructions.
pub struct ContentCommandSegregation;

impl ConstitutionalRule for ContentCommandSegregation {
    fn id(&self) -> &str {
        "content_command_segregation"
    }
    fn name(&self) -> &str {
        "Content/Command Segregation"
    }
    fn description(&self) -> &str {
        "External content is processed as data and never executed as a command."
    }
    fn check(&self, context: &ActionContext) -> RuleCheck {
        if context.content_as_command {
            return RuleCheck::deny("content_executed_as_command");
        }
        RuleCheck::allow()
    }
}

/// The audit log only grows.
pub struct AuditAppendOnly;

impl ConstitutionalRule for AuditAppendOnly {
    fn id(&self) -> &str {
        "audit_append_only"
    }
    fn name(&self) -> &str {
        "Audit Append-Only"
    }
    fn description(&self) -> &str {
        "Audit records may be appended but never modified, deleted or truncated."
    }
    fn check(&self, context: &ActionContext) -> RuleCheck {
        match context.audit_operation {
            None | Some(AuditOperation::Append) => RuleCheck::allow(),
            Some(op) => RuleCheck::deny(format!("audit_mutation:{:?}", op).to_lowercase()),
        }
    }
}

/// Destructive actions need approval first.
pub struct LeastPrivilege;

impl ConstitutionalRule for LeastPrivilege {
    fn id(&self) -> &str {
        "least_privilege"
    }
    fn name(&self) -> &str {
        "Least Privilege"
    }
    fn description(&self) -> &str {
        "Destructive actions require a prior approval."
    }
    fn check(&self, context: &ActionContext) -> RuleCheck {
        if context.destructive && !context.prior_approval {
            return RuleCheck::deny("destructive_without_prior_approval");
        }
        RuleCheck::allow()
    }
}

/// Sensitive actions need an elevated requester.
pub struct TrustFloor;

impl ConstitutionalRule for TrustFloor {
    fn id(&self) -> &str {
        "trust_floor"
    }
    fn name(&self) -> &str {
        "Trust Floor"
    }
    fn description(&self) -> &str {
        "Sensitive actions require a verified, operator or system requester."
    }
    fn check(&self, context: &ActionContext) -> RuleCheck {
        if !context.sensitive {
            return RuleCheck::allow();
        }
        match context.trust_level {
            Some(level) if level.is_elevated() => RuleCheck::allow(),
            Some(level) => RuleCheck::deny(format!("insufficient_trust:{}", level)),
            None => RuleCheck::deny("insufficient_trust:unknown"),
        }
    }
}

/// Whether a host (optionally with scheme, port or path) is loopback.
fn is_loopback_host(host: &str) -> bool {
    let host = host.trim().to_lowercase();
    let host = host
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(host.as_str());
    let authority = host.split(['/', '?', '#']).next().unwrap_or(host);
    if authority.is_empty() || authority.contains(['@', '\\']) {
        return false;
    }

    if let Ok(addr) = authority.parse::<SocketAddr>() {
        return addr.ip().is_loopback();
    }
    let bare = authority.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        return ip.is_loopback();
    }

    let name = match authority.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        Some(_) => return false,
        None => authority,
    };
    let labels: Vec<&str> = name.split('.').collect();
    labels.last() == Some(&"localhost") && labels.iter().all(|label| is_host_label(label))
}

/// A DNS label: alphanumerics and inner hyphens.
fn is_host_label(label: &str) -> bool {
    !label.is_empty()
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use oversight::TrustLevel;

    #[test]
    fn test_loopback_hosts() {
        assert!(is_loopback_host("127.0.0.1"));
        assert!(is_loopback_host("127.0.0.1:8080"));
        assert!(is_loopback_host("::1"));
        assert!(is_loopback_host("[::1]:443"));
        assert!(is_loopback_host("localhost"));
        assert!(is_loopback_host("http://localhost:3000/health"));
        assert!(!is_loopback_host("10.0.0.4"));
        assert!(!is_loopback_host("example.com"));
        assert!(!is_loopback_host("https://api.example.com/v1"));
        assert!(!is_loopback_host("localhost.example.com"));
        assert!(is_loopback_host("api.localhost:8443"));
    }

    #[test]
    fn test_query_and_fragment_cannot_fake_loopback() {
        assert!(!is_loopback_host("http://evil.com?.localhost"));
        assert!(!is_loopback_host("https://attacker.net#.localhost"));
        assert!(!is_loopback_host("http://evil.com:.localhost"));
        assert!(!is_loopback_host("http://evil.com/.localhost"));
        assert!(!is_loopback_host("http://localhost@evil.com"));
        assert!(!is_loopback_host("http://evil.com\\.localhost"));
        assert!(!is_loopback_host("localhost:"));
        assert!(is_loopback_host("http://localhost?next=/"));

        let ctx = ActionContext::new().targeting("http://evil.com?.localhost");
        assert!(!NetworkLocality.check(&ctx).allowed);
    }

    #[test]
    fn test_network_locality() {
        let rule = NetworkLocality;
        assert!(rule.check(&ActionContext::new()).allowed);
        assert!(rule.check(&ActionContext::new().targeting("127.0.0.1")).allowed);

        let check = rule.check(&ActionContext::new().targeting("198.51.100.7"));
        assert!(!check.allowed);
        assert_eq!(check.reason.as_deref(), Some("non_loopback_target:198.51.100.7"));
    }

    #[test]
    fn test_audit_append_only() {
        let rule = AuditAppendOnly;
        assert!(rule.check(&ActionContext::new().audit_operation(AuditOperation::Append)).allowed);

        let check = rule.check(&ActionContext::new().audit_operation(AuditOperation::Truncate));
        assert_eq!(check.reason.as_deref(), Some("audit_mutation:truncate"));
    }

    #[test]
    fn test_least_privilege() {
        let rule = LeastPrivilege;
        assert!(!rule.check(&ActionContext::new().destructive(false)).allowed);
        assert!(rule.check(&ActionContext::new().destructive(true)).allowed);
    }

    #[test]
    fn test_trust_floor() {
        let rule = TrustFloor;
        assert!(rule.check(&ActionContext::new()).allowed);
        assert!(!rule.check(&ActionContext::new().sensitive()).allowed);
        assert!(
            !rule
                .check(&ActionContext::new().sensitive().by("alice", TrustLevel::User))
                .allowed
        );
        for level in [TrustLevel::Verified, TrustLevel::Operator, TrustLevel::System] {
            assert!(
                rule.check(&ActionContext::new().sensitive().by("ops", level))
                    .allowed
            );
        }
    }

    #[test]
    fn test_all_rules_immutable() {
        let rules = immutable_rules();
        assert_eq!(rules.len(), 6);
        assert!(rules.iter().all(|r| r.status() == RuleStatus::Immutable));
    }
}
