//! Ordered store of denied applicants.
//!
//! The store is the record of which applicant holds which rule number, and its
//! insertion order is the authoritative FIFO order for eviction.
//!
//! - [`MemoryDenialStore`]: in-memory, volatile - for testing
//! - [`SqliteDenialStore`]: `denied_applicants` table, ordered by `seq`

mod memory;
mod sqlite;

pub use memory::MemoryDenialStore;
pub use sqlite::SqliteDenialStore;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::applicant::DeniedApplicant;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("there is no denied applicant for subject {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait DenialStore: Send + Sync {
    /// Track an applicant. Inserting an already tracked subject is a no-op and
    /// keeps its original position in the FIFO order.
    async fn insert(&self, applicant: &DeniedApplicant) -> Result<(), StoreError>;

    async fn get(&self, subject: &str) -> Result<Option<DeniedApplicant>, StoreError>;

    /// Record the rule number assigned to a tracked applicant.
    async fn update_slot(&self, subject: &str, rule_slot: i64) -> Result<(), StoreError>;

    /// Forget an applicant. Missing subjects are ignored.
    async fn delete_by_subject(&self, subject: &str) -> Result<(), StoreError>;

    /// The earliest inserted applicant on `acl_id` that holds a rule.
    async fn oldest(&self, acl_id: &str) -> Result<Option<DeniedApplicant>, StoreError>;

    fn name(&self) -> &'static str;
}

pub type SharedStore = Arc<dyn DenialStore>;
