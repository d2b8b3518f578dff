//! Keyword tables used by proposal analysis.
//!
//! Thresholds and phrase lists here shape governance decisions recorded in
//! audit history. Changing them changes how past proposals would be scored.

/// Keywords that auto-detect each domain in proposal text.
pub static DOMAIN_KEYWORDS: &[(&str, &[&str])] = &[
    ("security", &["security", "attack", "threat", "vulnerab", "exploit", "injection", "malware", "intrusion", "firewall"]),
    ("privacy", &["privacy", "personal data", "pii", "consent", "anonymi", "tracking"]),
    ("memory", &["memory", "archive", "retention", "storage", "history", "recall", "forget"]),
    ("infrastructure", &["infrastructure", "server", "deploy", "database", "network", "cluster", "hardware"]),
    ("ethics", &["ethic", "moral", "fairness", "bias", "harm", "values"]),
    ("governance", &["governance", "policy", "vote", "council", "constitution", "amendment"]),
    ("performance", &["performance", "latency", "speed", "optimiz", "throughput", "cache"]),
    ("communication", &["communicat", "message", "notification", "email", "chat", "announce"]),
    ("learning", &["learning", "training", "model", "skill", "knowledge", "teach"]),
    ("creativity", &["creative", "design", "artwork", "aesthetic", "style", "format"]),
    ("finance", &["budget", "cost", "finance", "payment", "spend", "billing"]),
    ("health", &["health", "wellbeing", "well-being", "burnout", "fatigue", "stress"]),
    ("research", &["research", "experiment", "study", "analysis", "hypothes", "report"]),
    ("integration", &["integrat", "plugin", "third-party", "webhook", "external service", "connector"]),
];

/// Each present keyword adds 0.15 to the risk score.
pub static CRITICAL_RISK_KEYWORDS: &[&str] = &[
    "delete",
    "permanent",
    "all data",
    "irreversible",
    "wipe",
    "destroy",
    "erase",
    "disable security",
    "root access",
    "self-modify",
    "override constitution",
];

/// Each present keyword adds 0.1 to the risk score.
pub static HIGH_RISK_KEYWORDS: &[&str] = &[
    "modify",
    "external",
    "network",
    "permission",
    "credential",
    "access",
    "migrate",
    "audit",
    "archive",
    "schema",
    "deploy",
];

/// Each present keyword subtracts 0.05 from the risk score.
pub static LOW_RISK_KEYWORDS: &[&str] = &[
    "read-only",
    "report",
    "summary",
    "minor",
    "cosmetic",
    "formatting",
    "documentation",
    "typo",
    "display",
];

/// Pressure to act before thinking.
pub static URGENCY_PHRASES: &[&str] = &[
    "urgent",
    "immediately",
    "asap",
    "right now",
    "no time",
    "before it's too late",
    "act now",
];

/// Appeals to authority or assumed consensus.
pub static AUTHORITY_PHRASES: &[&str] = &[
    "everyone agrees",
    "everyone knows",
    "obviously",
    "experts say",
    "the creator wants",
    "as instructed",
    "unanimous",
];

/// Choices framed as having no alternative.
pub static FRAMING_PHRASES: &[&str] = &[
    "only option",
    "only way",
    "no alternative",
    "no other choice",
    "either we",
    "must be done",
];

/// Fixed reference points steering judgement.
pub static ANCHORING_PHRASES: &[&str] = &[
    "at least",
    "at most",
    "baseline of",
    "compared to last",
    "previously agreed",
    "industry standard",
];

/// Justification by what has already been spent.
pub static SUNK_COST_PHRASES: &[&str] = &[
    "already invested",
    "already spent",
    "already built",
    "come this far",
    "too far to stop",
    "wasted effort",
];

/// Evidence language (+0.1).
pub static EVIDENCE_PHRASES: &[&str] = &[
    "evidence",
    "data shows",
    "tested",
    "measured",
    "benchmark",
    "research",
];

/// Improvement verbs (+0.05).
pub static IMPROVEMENT_PHRASES: &[&str] = &["improve", "enhance", "strengthen", "refine", "fix"];

/// Fairness language (+0.1).
pub static FAIRNESS_PHRASES: &[&str] = &["fair", "equitable", "transparent", "inclusive", "consent"];

/// Gradualism language (+0.1).
pub static GRADUALISM_PHRASES: &[&str] = &[
    "gradual",
    "incremental",
    "pilot",
    "phased",
    "rollback",
    "reversible",
    "trial",
];

/// Force, override or bypass language (-0.15).
pub static FORCE_PHRASES: &[&str] = &["force", "override", "bypass", "circumvent", "ignore"];

/// Rush or shortcut language (-0.1).
pub static RUSH_PHRASES: &[&str] = &["rush", "shortcut", "skip review", "skip testing", "quick fix"];

/// Phrases from `list` present in `text` (already lowercased).
pub fn hits<'a>(text: &str, list: &'a [&'a str]) -> Vec<&'a str> {
    list.iter().copied().filter(|p| text.contains(p)).collect()
}

/// Whether any phrase from `list` is present in `text`.
pub fn any_hit(text: &str, list: &[&str]) -> bool {
    list.iter().any(|p| text.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourteen_domains() {
        assert_eq!(DOMAIN_KEYWORDS.len(), 14);
    }

    #[test]
    fn test_hits_counts_each_phrase_once() {
        let text = "delete delete delete the archive";
        assert_eq!(hits(text, CRITICAL_RISK_KEYWORDS), vec!["delete"]);
        assert_eq!(hits(text, HIGH_RISK_KEYWORDS), vec!["archive"]);
    }

    #[test]
    fn test_risk_lists_disjoint() {
        for word in CRITICAL_RISK_KEYWORDS {
            assert!(!HIGH_RISK_KEYWORDS.contains(word));
            assert!(!LOW_RISK_KEYWORDS.contains(word));
        }
        for word in HIGH_RISK_KEYWORDS {
            assert!(!LOW_RISK_KEYWORDS.contains(word));
        }
    }
}
