//! Constitutional gates for council governance.
//!
//! Two gates sit alongside council deliberation rather than inside it:
//!
//! - [`ConstitutionalRuleEngine`]: evaluates actions and disputes against a
//!   fixed set of immutable rules that no vote can override
//! - [`EmergencyHalt`]: dual-authority halt (operator or guardian) with
//!   operator-only resume
//!
//! # Immutable rules
//!
//! - **Creator primacy**: nothing may act against the creator
//! - **Network locality**: loopback-only connections
//! - **Content/command segregation**: content is never executed
//! - **Audit append-only**: the audit log only grows
//! - **Least privilege**: destructive actions need prior approval
//! - **Trust floor**: sensitive actions need verified, operator or system trust
//!
//! # Example
//!
//! ```ignore
//! use constitution::{ActionContext, ConstitutionalRuleEngine};
//!
//! let engine = ConstitutionalRuleEngine::new(audit, events);
//! let ruling = engine.evaluate_action("purge_cache", &ActionContext::new().destructive(false));
//! assert!(!ruling.allowed);
//! ```

pub mod engine;
pub mod halt;
pub mod rules;
pub mod types;

// Re-export main types
pub use engine::ConstitutionalRuleEngine;
pub use halt::{EmergencyHalt, HaltAuthority, HaltError, HaltState, HaltTransition};
pub use rules::ConstitutionalRule;
pub use types::*;
