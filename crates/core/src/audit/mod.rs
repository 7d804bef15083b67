//! Append-only audit trail of criteria and scoring changes.

mod error;
mod trail;
mod types;


pub use error::AuditError;
pub use trail::{AuditRepository, AuditTrail, MAX_RECENT_ACTIVITY};
pub use types::{
    AuditActivity, CriteriaAuditAction, CriteriaAuditEntry, ScoringAuditAction, ScoringAuditEntry,
};
