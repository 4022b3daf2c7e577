//! In-memory firewall gateway.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet};

use super::{DenyRule, FirewallGateway, GatewayError};

/// ACL tables held in memory, each capped at `max_entries` rules.
pub struct MemoryGateway {
    acls: DashMap<String, BTreeMap<i64, DenyRule>>,
    max_entries: usize,
}

impl MemoryGateway {
    pub fn new(max_entries: usize) -> Self {
        Self {
            acls: DashMap::new(),
            max_entries,
        }
    }

    /// Put a rule in place without any capacity check (pre-existing entries).
    pub fn seed(&self, acl_id: &str, slot: i64, rule: DenyRule) {
        self.acls.entry(acl_id.to_string()).or_default().insert(slot, rule);
    }

    pub fn rule(&self, acl_id: &str, slot: i64) -> Option<DenyRule> {
        self.acls.get(acl_id).and_then(|table| table.get(&slot).cloned())
    }

    pub fn rule_count(&self, acl_id: &str) -> usize {
        self.acls.get(acl_id).map(|table| table.len()).unwrap_or(0)
    }
}

#[async_trait]
impl FirewallGateway for MemoryGateway {
    async fn list_used_slots(&self, acl_id: &str) -> Result<BTreeSet<i64>, GatewayError> {
        Ok(self
            .acls
            .get(acl_id)
            .map(|table| table.keys().copied().collect())
            .unwrap_or_default())
    }

    async fn create_deny_rule(&self, acl_id: &str, slot: i64, rule: &DenyRule) -> Result<(), GatewayError> {
        let mut table = self.acls.entry(acl_id.to_string()).or_default();
        if table.contains_key(&slot) {
            return Err(GatewayError::SlotOccupied { acl_id: acl_id.to_string(), slot });
        }
        if table.len() >= self.max_entries {
            return Err(GatewayError::RuleCountExceeded { acl_id: acl_id.to_string() });
        }
        table.insert(slot, rule.clone());
        Ok(())
    }

    async fn delete_rule(&self, acl_id: &str, slot: i64) -> Result<(), GatewayError> {
        let removed = self
            .acls
            .get_mut(acl_id)
            .and_then(|mut table| table.remove(&slot));
        match removed {
            Some(_) => Ok(()),
            None => Err(GatewayError::RuleNotFound { acl_id: acl_id.to_string(), slot }),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
