//! Member personality profiles.
//!
//! The primary format is a versioned YAML record:
//!
//! ```yaml
//! version: 1
//! id: guardian
//! name: Guardian
//! role: Security sentinel
//! voting:
//!   style: cautious
//!   veto_authority_domains: [security]
//!   default_position: abstain
//! thresholds:
//!   block_below: 0.4
//!   escalate_below: 0.2
//! ```
//!
//! Older deployments keep a plain text document: a `# Title` header,
//! `field: value` lines and bulleted sections (`## Values`,
//! `## Decision Patterns`, `## Cares About`, `## Refuses`).

use serde::{Deserialize, Serialize};

use crate::types::{CouncilError, Recommendation, Result, VotingStyle};

/// Supported profile record version.
pub const PROFILE_VERSION: u32 = 1;

/// A council member's personality profile. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    /// Record version
    pub version: u32,
    /// Member ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Role on the council
    #[serde(default)]
    pub role: String,
    /// Pillar the member represents
    #[serde(default)]
    pub pillar: Option<String>,
    /// Core values
    #[serde(default)]
    pub values: Vec<String>,
    /// How the member tends to decide
    #[serde(default)]
    pub decision_patterns: Vec<String>,
    /// Topics the member cares about
    #[serde(default)]
    pub cares: Vec<String>,
    /// Actions the member refuses outright
    #[serde(default)]
    pub refuses: Vec<String>,
    /// Voting behavior
    #[serde(default)]
    pub voting: VotingBehavior,
    /// Confidence thresholds for influence checks
    #[serde(default)]
    pub thresholds: Option<DecisionThresholds>,
}

/// How a member votes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingBehavior {
    /// Voting style
    pub style: VotingStyle,
    /// Domains where the member can veto
    pub veto_authority_domains: Vec<String>,
    /// Position taken when nothing else applies
    pub default_position: Recommendation,
    /// Free-text condition for approval
    pub approval_condition: Option<String>,
}

impl Default for VotingBehavior {
    fn default() -> Self {
        Self {
            style: VotingStyle::Balanced,
            veto_authority_domains: Vec::new(),
            default_position: Recommendation::Abstain,
            approval_condition: None,
        }
    }
}

/// Confidence thresholds. Escalation sits below blocking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionThresholds {
    /// Block when confidence falls below this
    pub block_below: f64,
    /// Escalate when confidence falls below this
    pub escalate_below: f64,
}

/// Profile document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFormat {
    Yaml,
    Legacy,
}

impl ProfileFormat {
    /// Format for a file extension, if it is a profile document.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "md" | "txt" => Some(Self::Legacy),
            _ => None,
        }
    }
}

impl MemberProfile {
    /// Minimal profile for a member.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            version: PROFILE_VERSION,
            id: id.into(),
            name: name.into(),
            role: String::new(),
            pillar: None,
            values: Vec::new(),
            decision_patterns: Vec::new(),
            cares: Vec::new(),
            refuses: Vec::new(),
            voting: VotingBehavior::default(),
            thresholds: None,
        }
    }

    /// Set the voting style.
    pub fn with_style(mut self, style: VotingStyle) -> Self {
        self.voting.style = style;
        self
    }

    /// Grant veto authority over domains.
    pub fn with_veto_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.voting.veto_authority_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Set what the member cares about.
    pub fn with_cares<I, S>(mut self, cares: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cares = cares.into_iter().map(Into::into).collect();
        self
    }

    /// Set what the member refuses.
    pub fn with_refuses<I, S>(mut self, refuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.refuses = refuses.into_iter().map(Into::into).collect();
        self
    }

    /// Set influence thresholds.
    pub fn with_thresholds(mut self, block_below: f64, escalate_below: f64) -> Self {
        self.thresholds = Some(DecisionThresholds {
            block_below,
            escalate_below,
        });
        self
    }

    /// Set the default position.
    pub fn with_default_position(mut self, position: Recommendation) -> Self {
        self.voting.default_position = position;
        self
    }

    /// Parse a versioned YAML record.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Parse a legacy text document. `member_id` fills in a missing `id:` field.
    pub fn from_legacy(content: &str, file: &str, member_id: &str) -> Result<Self> {
        let err = |reason: String| CouncilError::Profile {
            file: file.to_string(),
            reason,
        };

        let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
        let title = match lines.next().and_then(|line| line.strip_prefix("# ")) {
            Some(title) => title.trim().to_string(),
            None => return Err(err("missing '# Title' header".to_string())),
        };

        let mut profile = MemberProfile::new(member_id, title);
        let mut section: Option<LegacySection> = None;
        let mut block_below: Option<f64> = None;
        let mut escalate_below: Option<f64> = None;

        for line in lines {
            if let Some(heading) = line.strip_prefix("## ") {
                section = LegacySection::from_heading(heading);
                continue;
            }

            if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
                let item = item.trim().to_string();
                match section {
                    Some(LegacySection::Values) => profile.values.push(item),
                    Some(LegacySection::DecisionPatterns) => profile.decision_patterns.push(item),
                    Some(LegacySection::Cares) => profile.cares.push(item),
                    Some(LegacySection::Refuses) => profile.refuses.push(item),
                    None => {}
                }
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase().replace([' ', '-'], "_");
            let value = value.trim();

            match key.as_str() {
                "version" => {
                    profile.version = value
                        .parse()
                        .map_err(|_| err(format!("invalid version '{}'", value)))?;
                }
                "id" => profile.id = value.to_string(),
                "name" => profile.name = value.to_string(),
                "role" => profile.role = value.to_string(),
                "pillar" => profile.pillar = Some(value.to_string()),
                "style" | "voting_style" => {
                    profile.voting.style = VotingStyle::parse(value)
                        .ok_or_else(|| err(format!("unknown voting style '{}'", value)))?;
                }
                "veto_authority" | "veto_authority_domains" | "veto_domains" => {
                    profile.voting.veto_authority_domains = split_list(value);
                }
                "default_position" => {
                    profile.voting.default_position = parse_position(value)
                        .ok_or_else(|| err(format!("unknown default position '{}'", value)))?;
                }
                "approval_condition" => {
                    profile.voting.approval_condition = Some(value.to_string());
                }
                "block_below" => block_below = Some(parse_threshold(value).map_err(err)?),
                "escalate_below" => escalate_below = Some(parse_threshold(value).map_err(err)?),
                _ => {}
            }
        }

        profile.thresholds = match (block_below, escalate_below) {
            (None, None) => None,
            (block, escalate) => Some(DecisionThresholds {
                block_below: block.or(escalate).unwrap_or(0.0),
                escalate_below: escalate.unwrap_or(0.0),
            }),
        };

        Ok(profile)
    }

    /// Parse a document and check it belongs to `member_id`.
    pub fn parse(content: &str, format: ProfileFormat, file: &str, member_id: &str) -> Result<Self> {
        let profile = match format {
            ProfileFormat::Yaml => Self::from_yaml(content)?,
            ProfileFormat::Legacy => Self::from_legacy(content, file, member_id)?,
        };
        profile.validate(file, member_id)?;
        Ok(profile)
    }

    pub(crate) fn validate(&self, file: &str, member_id: &str) -> Result<()> {
        let err = |reason: String| CouncilError::Profile {
            file: file.to_string(),
            reason,
        };

        if self.version != PROFILE_VERSION {
            return Err(err(format!("unsupported profile version {}", self.version)));
        }
        if self.id != member_id {
            return Err(err(format!(
                "profile id '{}' does not match member '{}'",
                self.id, member_id
            )));
        }
        if let Some(t) = &self.thresholds {
            let in_range = |v: f64| (0.0..=1.0).contains(&v);
            if !in_range(t.block_below) || !in_range(t.escalate_below) {
                return Err(err("thresholds must be within 0.0 - 1.0".to_string()));
            }
            if t.escalate_below > t.block_below {
                return Err(err(format!(
                    "escalate_below {} is above block_below {}",
                    t.escalate_below, t.block_below
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum LegacySection {
    Values,
    DecisionPatterns,
    Cares,
    Refuses,
}

impl LegacySection {
    fn from_heading(heading: &str) -> Option<Self> {
        match heading.trim().to_lowercase().as_str() {
            "values" | "core values" => Some(Self::Values),
            "decision patterns" => Some(Self::DecisionPatterns),
            "cares about" | "cares" => Some(Self::Cares),
            "refuses" | "will not" => Some(Self::Refuses),
            _ => None,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_position(value: &str) -> Option<Recommendation> {
    match value.trim().to_lowercase().as_str() {
        "approve" => Some(Recommendation::Approve),
        "reject" => Some(Recommendation::Reject),
        "abstain" => Some(Recommendation::Abstain),
        _ => None,
    }
}

fn parse_threshold(value: &str) -> std::result::Result<f64, String> {
    value
        .parse::<f64>()
        .map_err(|_| format!("invalid threshold '{}'", value))
}
