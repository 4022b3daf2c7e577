//! Firewall gateway over the `acl_entries` table.
//!
//! Rule numbers are unique per (ACL, direction), and each direction of an ACL
//! holds at most `max_entries` rules, like a cloud network ACL quota.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;

use super::{DenyRule, FirewallGateway, GatewayError};
use crate::db::DbPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AclEntry {
    pub acl_id: String,
    pub egress: bool,
    pub rule_number: i64,
    pub cidr: String,
    pub protocol: i64,
    pub from_port: Option<i64>,
    pub to_port: Option<i64>,
    pub action: String,
    pub created_at: String,
}

pub struct SqliteAclGateway {
    db: DbPool,
    egress: bool,
    max_entries: usize,
}

impl SqliteAclGateway {
    pub fn new(db: DbPool, egress: bool, max_entries: usize) -> Self {
        Self { db, egress, max_entries }
    }

    /// Rules on one ACL in this gateway's direction, by rule number. The trait
    /// only exposes numbers; this reads back what each rule denies.
    pub async fn entries(&self, acl_id: &str) -> Result<Vec<AclEntry>, GatewayError> {
        let rows = sqlx::query_as::<_, AclEntry>(
            "SELECT acl_id, egress, rule_number, cidr, protocol, from_port, to_port, action, created_at
             FROM acl_entries WHERE acl_id = ? AND egress = ? ORDER BY rule_number",
        )
        .bind(acl_id)
        .bind(self.egress)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl FirewallGateway for SqliteAclGateway {
    async fn list_used_slots(&self, acl_id: &str) -> Result<BTreeSet<i64>, GatewayError> {
        let slots: Vec<i64> = sqlx::query_scalar(
            "SELECT rule_number FROM acl_entries WHERE acl_id = ? AND egress = ?",
        )
        .bind(acl_id)
        .bind(self.egress)
        .fetch_all(&self.db)
        .await?;
        Ok(slots.into_iter().collect())
    }

    async fn create_deny_rule(&self, acl_id: &str, slot: i64, rule: &DenyRule) -> Result<(), GatewayError> {
        // One statement so the quota check runs under the write lock. A deferred
        // transaction that reads first cannot upgrade while another writer holds it.
        let inserted = sqlx::query(
            "INSERT INTO acl_entries (acl_id, egress, rule_number, cidr, protocol, from_port, to_port, action, created_at)
             SELECT ?, ?, ?, ?, ?, ?, ?, 'deny', ?
             WHERE (SELECT COUNT(*) FROM acl_entries WHERE acl_id = ? AND egress = ?) < ?",
        )
        .bind(acl_id)
        .bind(self.egress)
        .bind(slot)
        .bind(rule.cidr.to_string())
        .bind(rule.protocol as i64)
        .bind(rule.port_range.map(|r| r.from as i64))
        .bind(rule.port_range.map(|r| r.to as i64))
        .bind(Utc::now().to_rfc3339())
        .bind(acl_id)
        .bind(self.egress)
        .bind(self.max_entries as i64)
        .execute(&self.db)
        .await;

        let result = match inserted {
            Ok(result) => result,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(GatewayError::SlotOccupied { acl_id: acl_id.to_string(), slot });
            }
            Err(e) => return Err(e.into()),
        };
        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Full. A taken number still reports as taken, same as the memory gateway.
        let taken: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM acl_entries WHERE acl_id = ? AND egress = ? AND rule_number = ?",
        )
        .bind(acl_id)
        .bind(self.egress)
        .bind(slot)
        .fetch_one(&self.db)
        .await?;
        if taken > 0 {
            return Err(GatewayError::SlotOccupied { acl_id: acl_id.to_string(), slot });
        }
        Err(GatewayError::RuleCountExceeded { acl_id: acl_id.to_string() })
    }

    async fn delete_rule(&self, acl_id: &str, slot: i64) -> Result<(), GatewayError> {
        let result = sqlx::query(
            "DELETE FROM acl_entries WHERE acl_id = ? AND egress = ? AND rule_number = ?",
        )
        .bind(acl_id)
        .bind(self.egress)
        .bind(slot)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::RuleNotFound { acl_id: acl_id.to_string(), slot });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
