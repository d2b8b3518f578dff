//! Configuration for a council governance instance.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{CouncilError, Result};

/// Configuration for a council.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouncilConfig {
    /// Council ID
    pub council_id: String,
    /// Credibility learning
    pub credibility: CredibilityConfig,
    /// Member profiles
    pub profiles: ProfileConfig,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            council_id: uuid::Uuid::new_v4().to_string(),
            credibility: CredibilityConfig::default(),
            profiles: ProfileConfig::default(),
        }
    }
}

impl CouncilConfig {
    /// Create a new config with council ID.
    pub fn new(council_id: impl Into<String>) -> Self {
        Self {
            council_id: council_id.into(),
            ..Default::default()
        }
    }

    /// Set the profile directory.
    pub fn with_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profiles.directory = Some(dir.into());
        self
    }

    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        self.credibility.validate()
    }
}

/// Credibility learning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredibilityConfig {
    /// Starting credibility for every voting member
    pub initial: f64,
    /// EMA rate for new accuracy observations
    pub ema_rate: f64,
    /// Lower clamp
    pub floor: f64,
    /// Upper clamp
    pub ceiling: f64,
}

impl Default for CredibilityConfig {
    fn default() -> Self {
        Self {
            initial: 0.5,
            ema_rate: 0.15,
            floor: 0.2,
            ceiling: 0.9,
        }
    }
}

impl CredibilityConfig {
    /// Clamp a credibility value to the configured bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.floor, self.ceiling)
    }

    fn validate(&self) -> Result<()> {
        let finite = [self.initial, self.ema_rate, self.floor, self.ceiling]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(CouncilError::Config(
                "credibility values must be finite".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.floor)
            || !(0.0..=1.0).contains(&self.ceiling)
            || self.floor > self.ceiling
        {
            return Err(CouncilError::Config(format!(
                "credibility bounds must satisfy 0 <= floor <= ceiling <= 1 (got {} / {})",
                self.floor, self.ceiling
            )));
        }
        if !(self.floor..=self.ceiling).contains(&self.initial) {
            return Err(CouncilError::Config(format!(
                "initial credibility {} outside [{}, {}]",
                self.initial, self.floor, self.ceiling
            )));
        }
        if self.ema_rate <= 0.0 || self.ema_rate > 1.0 {
            return Err(CouncilError::Config(format!(
                "ema_rate must be in (0, 1] (got {})",
                self.ema_rate
            )));
        }
        Ok(())
    }
}

/// Member profile loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Directory scanned at startup; no profiles when unset
    pub directory: Option<PathBuf>,
}
