//! Rule number allocation on a network ACL.
//!
//! The allocator probes upward from `begin_rule_number` for a number the ACL
//! does not use yet and creates the deny rule there:
//!   - number taken by a concurrent writer → probe the next free number
//!   - ACL entry limit reached             → evict the oldest denial, retry the same number
//!   - anything else                       → give up
//!
//! The probe never moves backwards, so a single call tries each number at most once.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AllocatorConfig;
use crate::error::{ReconcileError, ReconcileResult};
use crate::eviction::FifoEviction;
use crate::gateway::{DenyRule, GatewayError, SharedGateway};
use crate::metrics::ReconcileMetrics;
use crate::store::SharedStore;
use crate::subject::Subject;

pub struct SlotAllocator {
    gateway: SharedGateway,
    eviction: FifoEviction,
    range: AllocatorConfig,
    metrics: Arc<ReconcileMetrics>,
}

impl SlotAllocator {
    pub fn new(
        gateway: SharedGateway,
        store: SharedStore,
        range: AllocatorConfig,
        metrics: Arc<ReconcileMetrics>,
    ) -> Self {
        let eviction = FifoEviction::new(gateway.clone(), store, metrics.clone());
        Self { gateway, eviction, range, metrics }
    }

    /// Materialize a deny rule for `subject` on `acl_id`. Returns the rule number.
    pub async fn allocate(&self, acl_id: &str, subject: &Subject) -> ReconcileResult<i64> {
        let used = self.gateway.list_used_slots(acl_id).await?;
        let rule = DenyRule::from(subject);
        let mut candidate = self.next_free(acl_id, self.range.begin_rule_number, &used)?;

        loop {
            debug!(acl_id, rule_number = candidate, "creating deny rule");
            match self.gateway.create_deny_rule(acl_id, candidate, &rule).await {
                Ok(()) => {
                    self.metrics.inc_allocated();
                    info!(acl_id, rule_number = candidate, subject = %subject, "deny rule created");
                    return Ok(candidate);
                }
                Err(GatewayError::SlotOccupied { .. }) => {
                    self.metrics.inc_collision();
                    warn!(acl_id, rule_number = candidate, "rule number taken concurrently, probing next");
                    candidate = self.next_free(acl_id, candidate + 1, &used)?;
                }
                Err(GatewayError::RuleCountExceeded { .. }) => {
                    // the freed capacity is what matters, not the freed number
                    self.eviction.evict_oldest(acl_id).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn next_free(&self, acl_id: &str, from: i64, used: &BTreeSet<i64>) -> ReconcileResult<i64> {
        (from..=self.range.rule_number_ceiling)
            .find(|n| !used.contains(n))
            .ok_or_else(|| ReconcileError::SlotSpaceExhausted {
                acl_id: acl_id.to_string(),
                start: self.range.begin_rule_number,
                ceiling: self.range.rule_number_ceiling,
            })
    }
}
