//! Common types shared across governance boundaries.

use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Trust level of an actor recorded against audit entries and checked by
/// constitutional rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    /// Unknown or external origin
    Untrusted,
    /// Authenticated end user
    User,
    /// Verified identity
    Verified,
    /// Human operator of the deployment
    Operator,
    /// The governance system itself
    System,
}

impl TrustLevel {
    /// Whether this level clears the floor for sensitive operations.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::Verified | Self::Operator | Self::System)
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Untrusted => "untrusted",
            Self::User => "user",
            Self::Verified => "verified",
            Self::Operator => "operator",
            Self::System => "system",
        }
    }
}

impl Default for TrustLevel {
    fn default() -> Self {
        Self::Untrusted
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
