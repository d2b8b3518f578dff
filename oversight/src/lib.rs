//! Oversight - audit and event boundaries for council governance.
//!
//! Every governance component reports through two narrow boundaries:
//!
//! - [`AuditSink`]: records evaluations, rulings, halts and deliberations
//! - [`EventPublisher`]: fire-and-forget state-change announcements
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Constitution │   │   Council    │   │     Halt     │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        └──────────┬───────┴──────────────────┘
//!           ┌───────▼───────┐   ┌───────────────┐
//!           │   AuditSink   │   │ EventPublisher│
//!           └───────────────┘   └───────────────┘
//! ```

pub mod audit;
pub mod events;
pub mod types;

// Re-export main types for convenience
pub use audit::{AuditAck, AuditEntry, AuditLog, AuditSink};
pub use events::{EventBus, EventPublisher, GovernanceEvent, NullPublisher};
pub use types::*;
