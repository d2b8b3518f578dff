//! Member identity store.
//!
//! Profiles are loaded once at startup and never change afterwards. A
//! member without a profile is not an error; lookups fall back to neutral
//! defaults and deliberation uses style defaults instead.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use oversight::{EventPublisher, GovernanceEvent, NullPublisher};

use crate::registry::{member_for_profile_file, terms_match};
use crate::types::{Recommendation, Result, RiskLevel, VotingStyle};

use super::profile::{MemberProfile, ProfileFormat};

/// Words of a refusal entry compared against an action.
const REFUSAL_PREFIX_WORDS: usize = 3;

/// What a member needs to know about a proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalSummary {
    pub topic: String,
    pub description: String,
    pub domains: Vec<String>,
    pub risk: RiskLevel,
}

/// A member's profile-driven recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecommendation {
    pub member_id: String,
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub reasoning: String,
    /// Whether a loaded profile produced this
    pub profile_consulted: bool,
}

/// Context of a pending action for influence checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionContext {
    /// Action description
    pub action: String,
    /// Current confidence in the action (0.0 - 1.0)
    pub confidence: f64,
}

impl DecisionContext {
    pub fn new(action: impl Into<String>, confidence: f64) -> Self {
        Self {
            action: action.into(),
            confidence,
        }
    }
}

/// Effect of a member's profile on a pending action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluenceOutcome {
    Proceed,
    Block,
    Escalate,
}

/// Influence of a member on a pending action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Influence {
    pub outcome: InfluenceOutcome,
    /// Confidence after the member's nudge
    pub confidence: f64,
    pub reason: Option<String>,
}

/// A profile document that was not loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedProfile {
    pub file: String,
    pub reason: String,
}

/// Outcome of a profile directory load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Member IDs loaded
    pub loaded: Vec<String>,
    /// Documents skipped
    pub skipped: Vec<SkippedProfile>,
}

/// Holds member profiles and derives recommendations from them.
pub struct MemberIdentityStore {
    profiles: HashMap<String, MemberProfile>,
    report: LoadReport,
    events: Arc<dyn EventPublisher>,
}

impl MemberIdentityStore {
    /// Store with no profiles.
    pub fn empty(events: Arc<dyn EventPublisher>) -> Self {
        Self {
            profiles: HashMap::new(),
            report: LoadReport::default(),
            events,
        }
    }

    /// Store over already-built profiles.
    ///
    /// Profiles failing validation are logged and recorded as skipped.
    pub fn with_profiles(
        profiles: impl IntoIterator<Item = MemberProfile>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        let mut store = Self::empty(events);
        for profile in profiles {
            let member_id = profile.id.clone();
            if let Err(e) = profile.validate(&member_id, &member_id) {
                error!(member_id = %member_id, error = %e, "Invalid profile, skipping");
                store.skip(member_id, e.to_string());
                continue;
            }
            store.profiles.insert(member_id, profile);
        }
        store.report.loaded = store.profiles.keys().cloned().collect();
        store.report.loaded.sort();
        store
    }

    /// Load every profile document in a directory.
    ///
    /// Never fails: a missing directory gives an empty store and each bad
    /// document is logged and skipped.
    pub async fn load(dir: impl AsRef<Path>, events: Arc<dyn EventPublisher>) -> Self {
        let dir = dir.as_ref();
        let mut store = Self::empty(events);

        let files = match list_documents(dir).await {
            Ok(listing) => {
                store.report.skipped = listing.skipped;
                listing.files
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Profile directory unavailable, no profiles loaded");
                return store;
            }
        };

        for (path, format) in files {
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            let Some(member_id) = member_for_profile_file(&stem) else {
                warn!(file = %file, "Profile file not mapped to a member, skipping");
                store.skip(file, "not mapped to a council member".to_string());
                continue;
            };

            if store.profiles.contains_key(member_id) {
                warn!(file = %file, member_id = %member_id, "Duplicate profile, skipping");
                store.skip(file, format!("duplicate profile for {}", member_id));
                continue;
            }

            match load_document(&path, format, &file, member_id).await {
                Ok(profile) => {
                    debug!(file = %file, member_id = %member_id, "Profile loaded");
                    store.report.loaded.push(member_id.to_string());
                    store.profiles.insert(member_id.to_string(), profile);
                }
                Err(e) => {
                    error!(file = %file, error = %e, "Failed to load profile, skipping");
                    store.skip(file, e.to_string());
                }
            }
        }

        info!(
            dir = %dir.display(),
            loaded = store.report.loaded.len(),
            skipped = store.report.skipped.len(),
            "Member profiles loaded"
        );
        store
    }

    fn skip(&mut self, file: String, reason: String) {
        self.report.skipped.push(SkippedProfile { file, reason });
    }

    /// Outcome of the load.
    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Profile for a member.
    pub fn get(&self, member_id: &str) -> Option<&MemberProfile> {
        self.profiles.get(member_id)
    }

    /// Whether a member has a loaded profile.
    pub fn has_profile(&self, member_id: &str) -> bool {
        self.profiles.contains_key(member_id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Recommendation derived from a member's profile.
    pub fn get_voting_recommendation(
        &self,
        member_id: &str,
        summary: &ProposalSummary,
    ) -> ProfileRecommendation {
        let Some(profile) = self.profiles.get(member_id) else {
            return ProfileRecommendation {
                member_id: member_id.to_string(),
                recommendation: Recommendation::Abstain,
                confidence: 0.5,
                reasoning: "No profile loaded".to_string(),
                profile_consulted: false,
            };
        };

        let (recommendation, confidence, reasoning) = derive_recommendation(profile, summary);

        debug!(
            member_id = %member_id,
            recommendation = %recommendation,
            confidence = confidence,
            "Profile consulted"
        );
        self.events.publish(GovernanceEvent::ProfileConsulted {
            member_id: member_id.to_string(),
            topic: summary.topic.clone(),
            recommendation: recommendation.as_str().to_string(),
            confidence,
        });

        ProfileRecommendation {
            member_id: member_id.to_string(),
            recommendation,
            confidence,
            reasoning,
            profile_consulted: true,
        }
    }

    /// How a member's profile bears on a pending action.
    pub fn influence_decision(&self, member_id: &str, context: &DecisionContext) -> Influence {
        let Some(profile) = self.profiles.get(member_id) else {
            return Influence {
                outcome: InfluenceOutcome::Proceed,
                confidence: context.confidence,
                reason: None,
            };
        };

        let action = context.action.to_lowercase();
        if let Some(refusal) = profile.refuses.iter().find(|r| refusal_matches(r, &action)) {
            return Influence {
                outcome: InfluenceOutcome::Block,
                confidence: context.confidence,
                reason: Some(format!("{} refuses: {}", profile.name, refusal)),
            };
        }

        if let Some(t) = profile.thresholds {
            if context.confidence < t.escalate_below {
                return Influence {
                    outcome: InfluenceOutcome::Escalate,
                    confidence: context.confidence,
                    reason: Some(format!(
                        "confidence {:.2} below escalation threshold {:.2}",
                        context.confidence, t.escalate_below
                    )),
                };
            }
            if context.confidence < t.block_below {
                return Influence {
                    outcome: InfluenceOutcome::Block,
                    confidence: context.confidence,
                    reason: Some(format!(
                        "confidence {:.2} below blocking threshold {:.2}",
                        context.confidence, t.block_below
                    )),
                };
            }
        }

        let nudge = match profile.voting.style {
            VotingStyle::Cautious => -0.1,
            VotingStyle::Progressive => 0.1,
            VotingStyle::Balanced => 0.0,
        };
        Influence {
            outcome: InfluenceOutcome::Proceed,
            confidence: (context.confidence + nudge).clamp(0.0, 1.0),
            reason: None,
        }
    }
}

impl Default for MemberIdentityStore {
    fn default() -> Self {
        Self::empty(Arc::new(NullPublisher))
    }
}

fn derive_recommendation(
    profile: &MemberProfile,
    summary: &ProposalSummary,
) -> (Recommendation, f64, String) {
    let vetoed_domain = profile
        .voting
        .veto_authority_domains
        .iter()
        .find(|veto| summary.domains.iter().any(|d| terms_match(veto, d)));

    if let (Some(domain), RiskLevel::Critical) = (vetoed_domain, summary.risk) {
        return (
            Recommendation::Reject,
            0.95,
            format!("Veto authority over {} on a critical proposal", domain),
        );
    }

    match (profile.voting.style, summary.risk) {
        (VotingStyle::Cautious, RiskLevel::Critical) => {
            return (
                Recommendation::Reject,
                0.7,
                "Cautious member rejects critical risk".to_string(),
            );
        }
        (VotingStyle::Cautious, risk) if risk != RiskLevel::Low => {
            return (
                Recommendation::Abstain,
                0.7,
                format!("Cautious member withholds support at {} risk", risk),
            );
        }
        (VotingStyle::Progressive, risk) if risk != RiskLevel::Critical => {
            return (
                Recommendation::Approve,
                0.75,
                format!("Progressive member supports change at {} risk", risk),
            );
        }
        _ => {}
    }

    let text = format!("{} {}", summary.topic, summary.description).to_lowercase();
    let care = profile.cares.iter().find(|care| {
        let care = care.to_lowercase();
        text.contains(&care) || summary.domains.iter().any(|d| terms_match(&care, d))
    });
    if let Some(care) = care {
        let recommendation = if summary.risk == RiskLevel::Low {
            Recommendation::Approve
        } else {
            Recommendation::Abstain
        };
        return (recommendation, 0.8, format!("Cares about {}", care));
    }

    (
        profile.voting.default_position,
        0.5,
        "Default position".to_string(),
    )
}

/// The first words of a refusal entry appear in the action.
fn refusal_matches(refusal: &str, action: &str) -> bool {
    let prefix: Vec<String> = refusal
        .split_whitespace()
        .take(REFUSAL_PREFIX_WORDS)
        .map(str::to_lowercase)
        .collect();
    !prefix.is_empty() && action.contains(&prefix.join(" "))
}

/// Profile documents found in a directory.
#[derive(Debug, Default)]
struct Listing {
    /// Readable documents, sorted by path
    files: Vec<(PathBuf, ProfileFormat)>,
    /// Entries with a profile extension that cannot be read as a file
    skipped: Vec<SkippedProfile>,
}

/// List profile documents in a directory.
///
/// Only a failure to open the directory is an error. Symlinks are followed;
/// entries that fail to resolve are logged and skipped.
async fn list_documents(dir: &Path) -> Result<Listing> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut listing = Listing::default();

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "Failed to read profile directory entry, stopping listing");
                break;
            }
        };

        let path = entry.path();
        let file = entry.file_name().to_string_lossy().into_owned();
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ProfileFormat::from_extension);
        let Some(format) = format else {
            debug!(path = %path.display(), "Ignoring non-profile file");
            continue;
        };

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => listing.files.push((path, format)),
            Ok(_) => {
                warn!(file = %file, "Profile entry is not a regular file, skipping");
                listing.skipped.push(SkippedProfile {
                    file,
                    reason: "not a regular file".to_string(),
                });
            }
            Err(e) => {
                warn!(file = %file, error = %e, "Profile entry unreadable, skipping");
                listing.skipped.push(SkippedProfile {
                    file,
                    reason: e.to_string(),
                });
            }
        }
    }

    listing.files.sort_by(|a, b| a.0.cmp(&b.0));
    listing.skipped.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(listing)
}

async fn load_document(
    path: &Path,
    format: ProfileFormat,
    file: &str,
    member_id: &str,
) -> Result<MemberProfile> {
    let content = tokio::fs::read_to_string(path).await?;
    MemberProfile::parse(&content, format, file, member_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oversight::EventBus;

    fn summary(risk: RiskLevel, domains: &[&str]) -> ProposalSummary {
        ProposalSummary {
            topic: "Adjust retention window".to_string(),
            description: "Shorten audit retention for old logs".to_string(),
            domains: domains.iter().map(|s| s.to_string()).collect(),
            risk,
        }
    }

    fn store(profiles: Vec<MemberProfile>) -> MemberIdentityStore {
        MemberIdentityStore::with_profiles(profiles, Arc::new(NullPublisher))
    }

    #[test]
    fn test_missing_profile_is_neutral() {
        let store = MemberIdentityStore::default();
        let rec = store.get_voting_recommendation("guardian", &summary(RiskLevel::High, &[]));
        assert_eq!(rec.recommendation, Recommendation::Abstain);
        assert_eq!(rec.confidence, 0.5);
        assert!(!rec.profile_consulted);

        let influence = store.influence_decision("guardian", &DecisionContext::new("anything", 0.42));
        assert_eq!(influence.outcome, InfluenceOutcome::Proceed);
        assert_eq!(influence.confidence, 0.42);
    }

    #[test]
    fn test_veto_on_critical() {
        let store = store(vec![MemberProfile::new("archivist", "Archivist")
            .with_style(VotingStyle::Progressive)
            .with_veto_domains(["memory"])]);

        let rec =
            store.get_voting_recommendation("archivist", &summary(RiskLevel::Critical, &["memory"]));
        assert_eq!(rec.recommendation, Recommendation::Reject);
        assert_eq!(rec.confidence, 0.95);
        assert!(rec.profile_consulted);

        // veto does not apply below critical
        let rec = store.get_voting_recommendation("archivist", &summary(RiskLevel::High, &["memory"]));
        assert_eq!(rec.recommendation, Recommendation::Approve);
        assert_eq!(rec.confidence, 0.75);
    }

    #[test]
    fn test_style_rules() {
        let store = store(vec![
            MemberProfile::new("guardian", "Guardian").with_style(VotingStyle::Cautious),
            MemberProfile::new("scholar", "Scholar").with_style(VotingStyle::Progressive),
        ]);

        let rec = store.get_voting_recommendation("guardian", &summary(RiskLevel::Critical, &[]));
        assert_eq!((rec.recommendation, rec.confidence), (Recommendation::Reject, 0.7));

        let rec = store.get_voting_recommendation("guardian", &summary(RiskLevel::Medium, &[]));
        assert_eq!((rec.recommendation, rec.confidence), (Recommendation::Abstain, 0.7));

        let rec = store.get_voting_recommendation("scholar", &summary(RiskLevel::Critical, &[]));
        assert_eq!((rec.recommendation, rec.confidence), (Recommendation::Abstain, 0.5));
    }

    #[test]
    fn test_care_match_and_default() {
        let store = store(vec![
            MemberProfile::new("steward", "Steward").with_cares(["retention"]),
            MemberProfile::new("treasurer", "Treasurer")
                .with_cares(["budget"])
                .with_default_position(Recommendation::Reject),
        ]);

        let rec = store.get_voting_recommendation("steward", &summary(RiskLevel::Low, &[]));
        assert_eq!((rec.recommendation, rec.confidence), (Recommendation::Approve, 0.8));

        let rec = store.get_voting_recommendation("steward", &summary(RiskLevel::High, &[]));
        assert_eq!((rec.recommendation, rec.confidence), (Recommendation::Abstain, 0.8));

        let rec = store.get_voting_recommendation("treasurer", &summary(RiskLevel::Medium, &[]));
        assert_eq!((rec.recommendation, rec.confidence), (Recommendation::Reject, 0.5));
    }

    #[test]
    fn test_influence_refusal_blocks() {
        let store = store(vec![MemberProfile::new("archivist", "Archivist")
            .with_refuses(["Deleting records without review or consent"])]);

        let influence = store.influence_decision(
            "archivist",
            &DecisionContext::new("Start deleting records without review tonight", 0.99),
        );
        assert_eq!(influence.outcome, InfluenceOutcome::Block);
        assert!(influence.reason.unwrap().contains("refuses"));

        let influence =
            store.influence_decision("archivist", &DecisionContext::new("Deleting cache files", 0.9));
        assert_eq!(influence.outcome, InfluenceOutcome::Proceed);
    }

    #[test]
    fn test_influence_thresholds_and_nudge() {
        let store = store(vec![
            MemberProfile::new("guardian", "Guardian")
                .with_style(VotingStyle::Cautious)
                .with_thresholds(0.5, 0.2),
            MemberProfile::new("scholar", "Scholar").with_style(VotingStyle::Progressive),
        ]);

        let ctx = |c| DecisionContext::new("rotate keys", c);
        assert_eq!(
            store.influence_decision("guardian", &ctx(0.1)).outcome,
            InfluenceOutcome::Escalate
        );
        assert_eq!(
            store.influence_decision("guardian", &ctx(0.3)).outcome,
            InfluenceOutcome::Block
        );

        let influence = store.influence_decision("guardian", &ctx(0.8));
        assert_eq!(influence.outcome, InfluenceOutcome::Proceed);
        assert!((influence.confidence - 0.7).abs() < 1e-9);

        let influence = store.influence_decision("scholar", &ctx(0.95));
        assert_eq!(influence.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_consultation_published() {
        let events = Arc::new(EventBus::new());
        let mut rx = events.subscribe();
        let store = MemberIdentityStore::with_profiles(
            vec![MemberProfile::new("guardian", "Guardian")],
            events.clone(),
        );

        store.get_voting_recommendation("guardian", &summary(RiskLevel::Low, &[]));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "profile-consulted");
    }

    #[tokio::test]
    async fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, body: &str| std::fs::write(dir.path().join(name), body).unwrap();

        write(
            "sentinel.yaml",
            "version: 1\nid: guardian\nname: Guardian\nvoting:\n  style: cautious\n",
        );
        write("scholar.md", "# Scholar\nstyle: progressive\n\n## Cares About\n- research\n");
        write("ethicist.yml", "version: 3\nid: ethicist\nname: Ethicist\n");
        write("treasurer.md", "no header");
        write("intruder.yaml", "version: 1\nid: intruder\nname: Intruder\n");
        write("notes.json", "{}");

        let store = MemberIdentityStore::load(dir.path(), Arc::new(NullPublisher)).await;

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("guardian").unwrap().voting.style, VotingStyle::Cautious);
        assert_eq!(store.get("scholar").unwrap().cares, vec!["research"]);

        let report = store.report();
        assert_eq!(report.loaded, vec!["scholar".to_string(), "guardian".to_string()]);
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.file.as_str()).collect();
        assert_eq!(skipped, vec!["ethicist.yml", "intruder.yaml", "treasurer.md"]);
    }

    #[tokio::test]
    async fn test_load_duplicate_member() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("builder.yaml"),
            "version: 1\nid: engineer\nname: Builder\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("engineer.yaml"),
            "version: 1\nid: engineer\nname: Engineer\n",
        )
        .unwrap();

        let store = MemberIdentityStore::load(dir.path(), Arc::new(NullPublisher)).await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("engineer").unwrap().name, "Builder");
        assert_eq!(store.report().skipped.len(), 1);
    }

    #[test]
    fn test_invalid_built_profiles_skipped() {
        let store = store(vec![
            MemberProfile::new("guardian", "Guardian").with_thresholds(0.2, 0.6),
            MemberProfile::new("scholar", "Scholar").with_thresholds(0.5, 0.2),
        ]);

        assert!(!store.has_profile("guardian"));
        assert_eq!(store.report().loaded, vec!["scholar".to_string()]);
        assert_eq!(store.report().skipped.len(), 1);
        assert_eq!(store.report().skipped[0].file, "guardian");
        assert!(store.report().skipped[0].reason.contains("above block_below"));

        let influence = store.influence_decision("guardian", &DecisionContext::new("rotate keys", 0.4));
        assert_eq!(influence.outcome, InfluenceOutcome::Proceed);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_load_follows_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let records = dir.path().join("records");
        std::fs::create_dir(&records).unwrap();
        std::fs::write(
            records.join("guardian-profile.txt"),
            "version: 1\nid: guardian\nname: Guardian\nvoting:\n  style: cautious\n",
        )
        .unwrap();
        std::os::unix::fs::symlink(
            records.join("guardian-profile.txt"),
            dir.path().join("sentinel.yaml"),
        )
        .unwrap();

        let store = MemberIdentityStore::load(dir.path(), Arc::new(NullPublisher)).await;
        assert_eq!(store.report().loaded, vec!["guardian".to_string()]);
        assert_eq!(store.get("guardian").unwrap().voting.style, VotingStyle::Cautious);
        assert!(store.report().skipped.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_entries_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("scholar.yaml"),
            "version: 1\nid: scholar\nname: Scholar\n",
        )
        .unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("missing.yaml"),
            dir.path().join("engineer.yaml"),
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("guardian.yaml")).unwrap();

        let store = MemberIdentityStore::load(dir.path(), Arc::new(NullPublisher)).await;
        assert_eq!(store.report().loaded, vec!["scholar".to_string()]);

        let skipped: Vec<&str> = store.report().skipped.iter().map(|s| s.file.as_str()).collect();
        assert_eq!(skipped, vec!["engineer.yaml", "guardian.yaml"]);
        assert_eq!(store.report().skipped[1].reason, "not a regular file");
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = tokio_test::block_on(MemberIdentityStore::load(
            dir.path().join("absent"),
            Arc::new(NullPublisher),
        ));
        assert!(store.is_empty());
        assert!(store.report().skipped.is_empty());
    }
}
