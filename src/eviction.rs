//! FIFO eviction: frees one rule on an ACL that has hit its entry limit by
//! releasing the oldest tracked denial on it.

use std::sync::Arc;
use tracing::warn;

use crate::applicant::DeniedApplicant;
use crate::error::{ReconcileError, ReconcileResult};
use crate::gateway::SharedGateway;
use crate::metrics::ReconcileMetrics;
use crate::store::SharedStore;

pub struct FifoEviction {
    gateway: SharedGateway,
    store: SharedStore,
    metrics: Arc<ReconcileMetrics>,
}

impl FifoEviction {
    pub fn new(gateway: SharedGateway, store: SharedStore, metrics: Arc<ReconcileMetrics>) -> Self {
        Self { gateway, store, metrics }
    }

    /// Evict the oldest materialized denial on `acl_id` and return it.
    ///
    /// The rule is deleted before the record, and either failure aborts the
    /// eviction: a record must never outlive its rule silently.
    pub async fn evict_oldest(&self, acl_id: &str) -> ReconcileResult<DeniedApplicant> {
        let victim = self
            .store
            .oldest(acl_id)
            .await?
            .ok_or_else(|| ReconcileError::NoEvictableEntry { acl_id: acl_id.to_string() })?;

        self.gateway.delete_rule(&victim.acl_id, victim.rule_slot).await?;
        self.store.delete_by_subject(&victim.subject).await?;

        self.metrics.inc_eviction();
        warn!(
            acl_id = %victim.acl_id,
            rule_number = victim.rule_slot,
            subject = %victim.subject,
            "evicted oldest denied applicant"
        );
        Ok(victim)
    }
}
