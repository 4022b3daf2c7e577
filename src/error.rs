use thiserror::Error;

use crate::gateway::GatewayError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("invalid subject string has come: {subject} (expected pattern: {pattern})")]
    InvalidSubjectFormat { subject: String, pattern: String },

    #[error("there is no available rule number on {acl_id} (scanned {start}..={ceiling})")]
    SlotSpaceExhausted { acl_id: String, start: i64, ceiling: i64 },

    #[error("{acl_id} reports rule count exceeded but no denied applicant is tracked for it")]
    NoEvictableEntry { acl_id: String },

    #[error("insufficient event source ARN has come: {0}")]
    InsufficientEventSourceArn(String),

    #[error("invalid change record: {0}")]
    InvalidChange(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ReconcileError {
    /// Whether the error points at diverged store/gateway state rather than bad input.
    pub fn needs_operator(&self) -> bool {
        matches!(self, ReconcileError::NoEvictableEntry { .. })
    }
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
