//! Static council registry.
//!
//! The roster, each seat's domain coverage, the domain synonym table and the
//! profile filename table are immutable build-time data.

use crate::types::VotingStyle;

/// A seat on the council.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouncilSeat {
    /// Member identifier
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Voting style used when no profile is loaded
    pub style: VotingStyle,
    /// Whether the seat votes (advisory seats do not)
    pub voting: bool,
    /// Topical areas the member is expert in
    pub coverage: &'static [&'static str],
    /// Domains where the member holds veto authority
    pub veto_domains: &'static [&'static str],
}

/// The standard council.
pub static STANDARD_SEATS: &[CouncilSeat] = &[
    CouncilSeat {
        id: "guardian",
        name: "Guardian",
        style: VotingStyle::Cautious,
        voting: true,
        coverage: &["security", "threats", "injection", "anomalies", "defense", "access control"],
        veto_domains: &["security"],
    },
    CouncilSeat {
        id: "archivist",
        name: "Archivist",
        style: VotingStyle::Cautious,
        voting: true,
        coverage: &["memory", "archives", "retention", "audit", "history"],
        veto_domains: &["memory"],
    },
    CouncilSeat {
        id: "ethicist",
        name: "Ethicist",
        style: VotingStyle::Cautious,
        voting: true,
        coverage: &["ethics", "values", "fairness", "consent", "privacy"],
        veto_domains: &["ethics", "privacy"],
    },
    CouncilSeat {
        id: "steward",
        name: "Steward",
        style: VotingStyle::Balanced,
        voting: true,
        coverage: &["governance", "policy", "constitution", "process"],
        veto_domains: &[],
    },
    CouncilSeat {
        id: "engineer",
        name: "Engineer",
        style: VotingStyle::Balanced,
        voting: true,
        coverage: &["infrastructure", "performance", "reliability", "deployment", "integration"],
        veto_domains: &[],
    },
    CouncilSeat {
        id: "diplomat",
        name: "Diplomat",
        style: VotingStyle::Balanced,
        voting: true,
        coverage: &["communication", "relationships", "community", "outreach"],
        veto_domains: &[],
    },
    CouncilSeat {
        id: "scholar",
        name: "Scholar",
        style: VotingStyle::Progressive,
        voting: true,
        coverage: &["learning", "research", "experimentation", "knowledge", "evidence"],
        veto_domains: &[],
    },
    CouncilSeat {
        id: "artisan",
        name: "Artisan",
        style: VotingStyle::Progressive,
        voting: true,
        coverage: &["creativity", "design", "content", "aesthetics"],
        veto_domains: &[],
    },
    CouncilSeat {
        id: "treasurer",
        name: "Treasurer",
        style: VotingStyle::Balanced,
        voting: true,
        coverage: &["finance", "resources", "budget", "cost"],
        veto_domains: &[],
    },
    CouncilSeat {
        id: "healer",
        name: "Healer",
        style: VotingStyle::Balanced,
        voting: false,
        coverage: &["health", "wellbeing", "care", "balance"],
        veto_domains: &[],
    },
];

/// Synonyms each domain expands to before coverage matching.
pub static DOMAIN_SYNONYMS: &[(&str, &[&str])] = &[
    ("security", &["threats", "injection", "anomalies", "safety", "defense"]),
    ("privacy", &["consent", "personal data", "confidentiality", "anonymity"]),
    ("memory", &["archives", "retention", "audit", "recall", "knowledge"]),
    ("infrastructure", &["systems", "reliability", "deployment", "operations", "hardware"]),
    ("ethics", &["values", "fairness", "harm", "morality", "consent"]),
    ("governance", &["policy", "process", "constitution", "voting"]),
    ("performance", &["efficiency", "latency", "optimization", "reliability"]),
    ("communication", &["messaging", "relationships", "community", "outreach"]),
    ("learning", &["research", "education", "skills", "knowledge"]),
    ("creativity", &["design", "content", "aesthetics", "expression"]),
    ("finance", &["resources", "budget", "cost"]),
    ("health", &["wellbeing", "care", "balance"]),
    ("research", &["experimentation", "analysis", "learning", "evidence"]),
    ("integration", &["interoperability", "connectors", "external systems"]),
];

/// Profile filenames (without extension) and the member each belongs to.
pub static PROFILE_FILES: &[(&str, &str)] = &[
    ("guardian", "guardian"),
    ("sentinel", "guardian"),
    ("archivist", "archivist"),
    ("keeper-of-records", "archivist"),
    ("ethicist", "ethicist"),
    ("conscience", "ethicist"),
    ("steward", "steward"),
    ("engineer", "engineer"),
    ("builder", "engineer"),
    ("diplomat", "diplomat"),
    ("scholar", "scholar"),
    ("artisan", "artisan"),
    ("treasurer", "treasurer"),
    ("healer", "healer"),
];

/// Case-insensitive bidirectional substring match.
pub fn terms_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// A domain plus its synonyms, lowercased.
pub fn expand_domain(domain: &str) -> Vec<String> {
    let domain = domain.trim().to_lowercase();
    let mut terms = vec![domain.clone()];
    if let Some((_, synonyms)) = DOMAIN_SYNONYMS.iter().find(|(d, _)| *d == domain) {
        terms.extend(synonyms.iter().map(|s| s.to_string()));
    }
    terms
}

/// Member id for a profile file stem.
pub fn member_for_profile_file(stem: &str) -> Option<&'static str> {
    let stem = stem.trim().to_lowercase();
    PROFILE_FILES
        .iter()
        .find(|(file, _)| *file == stem)
        .map(|(_, member)| *member)
}

/// Lookup over a set of council seats.
#[derive(Debug, Clone, Copy)]
pub struct CouncilRegistry {
    seats: &'static [CouncilSeat],
}

impl CouncilRegistry {
    /// Registry over a custom roster.
    pub const fn new(seats: &'static [CouncilSeat]) -> Self {
        Self { seats }
    }

    /// Registry over the standard council.
    pub const fn standard() -> Self {
        Self::new(STANDARD_SEATS)
    }

    /// All seats, in roster order.
    pub fn seats(&self) -> &'static [CouncilSeat] {
        self.seats
    }

    /// Voting-eligible seats, in roster order.
    pub fn voting_seats(&self) -> impl Iterator<Item = &'static CouncilSeat> {
        self.seats.iter().filter(|s| s.voting)
    }

    /// Seat by member id.
    pub fn seat(&self, member_id: &str) -> Option<&'static CouncilSeat> {
        self.seats.iter().find(|s| s.id == member_id)
    }

    /// Whether the member votes.
    pub fn is_voting(&self, member_id: &str) -> bool {
        self.seat(member_id).map(|s| s.voting).unwrap_or(false)
    }

    /// Whether a seat's coverage includes a domain, synonyms considered.
    pub fn covers(seat: &CouncilSeat, domain: &str) -> bool {
        expand_domain(domain)
            .iter()
            .any(|term| seat.coverage.iter().any(|c| terms_match(term, c)))
    }

    /// Voting members covering any of the domains, in roster order.
    pub fn relevant_members(&self, domains: &[String]) -> Vec<String> {
        self.voting_seats()
            .filter(|seat| domains.iter().any(|d| Self::covers(seat, d)))
            .map(|seat| seat.id.to_string())
            .collect()
    }
}

impl Default for CouncilRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
