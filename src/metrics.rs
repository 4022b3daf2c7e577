use std::sync::atomic::{AtomicU64, Ordering};

/// Reconciliation counters shared by the driver and the allocator.
#[derive(Default)]
pub struct ReconcileMetrics {
    pub records_total: AtomicU64,
    pub records_failed: AtomicU64,
    pub rules_allocated: AtomicU64,
    pub rules_released: AtomicU64,
    pub evictions: AtomicU64,
    pub slot_collisions: AtomicU64,
}

impl ReconcileMetrics {
    pub fn inc_record(&self) {
        self.records_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.records_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_allocated(&self) {
        self.rules_allocated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_released(&self) {
        self.rules_released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_collision(&self) {
        self.slot_collisions.fetch_add(1, Ordering::Relaxed);
    }

    /// Serialize to Prometheus text exposition format.
    pub fn to_prometheus_text(&self) -> String {
        let total = self.records_total.load(Ordering::Relaxed);
        let failed = self.records_failed.load(Ordering::Relaxed);
        let allocated = self.rules_allocated.load(Ordering::Relaxed);
        let released = self.rules_released.load(Ordering::Relaxed);
        let evictions = self.evictions.load(Ordering::Relaxed);
        let collisions = self.slot_collisions.load(Ordering::Relaxed);

        format!(
            "# HELP acl_hangman_records_total Change records processed\n\
             # TYPE acl_hangman_records_total counter\n\
             acl_hangman_records_total{{status=\"total\"}} {total}\n\
             acl_hangman_records_total{{status=\"failed\"}} {failed}\n\
             # HELP acl_hangman_rules_total Deny rules created and deleted\n\
             # TYPE acl_hangman_rules_total counter\n\
             acl_hangman_rules_total{{op=\"allocated\"}} {allocated}\n\
             acl_hangman_rules_total{{op=\"released\"}} {released}\n\
             acl_hangman_rules_total{{op=\"evicted\"}} {evictions}\n\
             # HELP acl_hangman_slot_collisions_total Rule numbers lost to a concurrent writer\n\
             # TYPE acl_hangman_slot_collisions_total counter\n\
             acl_hangman_slot_collisions_total {collisions}\n"
        )
    }
}
