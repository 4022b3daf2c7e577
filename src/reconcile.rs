//! Applies change records to the firewall: inserts become deny rules, removals
//! release them.

use std::sync::Arc;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::allocator::SlotAllocator;
use crate::applicant::DeniedApplicant;
use crate::config::{AllocatorConfig, Config};
use crate::error::ReconcileResult;
use crate::event::{ChangeBatch, ChangeKind, ChangeRecord};
use crate::gateway::SharedGateway;
use crate::metrics::ReconcileMetrics;
use crate::store::SharedStore;

pub const BATCH_OK: &str = "OK";

pub struct Reconciler {
    allocator: SlotAllocator,
    gateway: SharedGateway,
    store: SharedStore,
    ignore_error: bool,
    metrics: Arc<ReconcileMetrics>,
}

impl Reconciler {
    pub fn new(
        gateway: SharedGateway,
        store: SharedStore,
        allocator: AllocatorConfig,
        ignore_error: bool,
        metrics: Arc<ReconcileMetrics>,
    ) -> Self {
        debug!(gateway = gateway.name(), store = store.name(), ignore_error, "reconciler ready");
        Self {
            allocator: SlotAllocator::new(gateway.clone(), store.clone(), allocator, metrics.clone()),
            gateway,
            store,
            ignore_error,
            metrics,
        }
    }

    pub fn from_config(
        cfg: &Config,
        gateway: SharedGateway,
        store: SharedStore,
        metrics: Arc<ReconcileMetrics>,
    ) -> Self {
        Self::new(gateway, store, cfg.allocator, cfg.reconcile.ignore_error, metrics)
    }

    /// Apply every record in order. Returns [`BATCH_OK`] or the first error that
    /// was not ignored.
    pub async fn handle_batch(&self, batch: &ChangeBatch) -> ReconcileResult<&'static str> {
        let span = info_span!("batch", id = %Uuid::new_v4(), records = batch.records.len());
        async {
            for record in &batch.records {
                self.metrics.inc_record();
                if let Err(e) = self.handle_record(record).await {
                    self.metrics.inc_failed();
                    if e.needs_operator() {
                        error!("{} (store and firewall disagree, manual check required)", e);
                    } else {
                        error!("{}", e);
                    }
                    if self.ignore_error {
                        info!("continued");
                        continue;
                    }
                    return Err(e);
                }
            }
            Ok(BATCH_OK)
        }
        .instrument(span)
        .await
    }

    pub async fn handle_record(&self, record: &ChangeRecord) -> ReconcileResult<()> {
        match record.event_name {
            ChangeKind::Insert => {
                let applicant = record.image()?;
                info!(?applicant, "inserted denied applicant");
                self.deny(applicant).await
            }
            ChangeKind::Remove => {
                let applicant = record.image()?;
                info!(?applicant, "removed denied applicant");
                self.release(applicant).await
            }
            ChangeKind::Modify => Ok(()),
        }
    }

    async fn deny(&self, applicant: &DeniedApplicant) -> ReconcileResult<()> {
        let subject = applicant.parse_subject()?;

        self.store.insert(applicant).await?;
        if let Some(tracked) = self.store.get(&applicant.subject).await? {
            if tracked.is_materialized() {
                info!(rule_number = tracked.rule_slot, subject = %tracked.subject, "already denied");
                return Ok(());
            }
        }

        let rule_slot = self.allocator.allocate(&applicant.acl_id, &subject).await?;

        if let Err(e) = self.store.update_slot(&applicant.subject, rule_slot).await {
            // Nothing records the rule, so take it back down.
            if let Err(rollback) = self.gateway.delete_rule(&applicant.acl_id, rule_slot).await {
                error!(
                    acl_id = %applicant.acl_id,
                    rule_number = rule_slot,
                    "failed to roll back unrecorded deny rule: {}",
                    rollback
                );
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn release(&self, applicant: &DeniedApplicant) -> ReconcileResult<()> {
        // The store owns the slot. Without a record the rule is already gone
        // (evicted or never materialized) and its number may belong to someone else.
        let Some(tracked) = self.store.get(&applicant.subject).await? else {
            info!(subject = %applicant.subject, "not tracked, nothing to release");
            return Ok(());
        };

        if tracked.is_materialized() {
            self.gateway.delete_rule(&tracked.acl_id, tracked.rule_slot).await?;
            self.metrics.inc_released();
            info!(acl_id = %tracked.acl_id, rule_number = tracked.rule_slot, "deny rule released");
        }

        self.store.delete_by_subject(&applicant.subject).await?;
        Ok(())
    }
}
