use async_trait::async_trait;
use chrono::Utc;

use super::{DenialStore, StoreError};
use crate::applicant::DeniedApplicant;
use crate::db::DbPool;

/// Denied applicants of one namespace (a table name on the event source side).
pub struct SqliteDenialStore {
    db: DbPool,
    namespace: String,
}

impl SqliteDenialStore {
    pub fn new(db: DbPool, namespace: impl Into<String>) -> Self {
        Self {
            db,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Subjects in FIFO order.
    pub async fn subjects(&self) -> Result<Vec<String>, StoreError> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT subject FROM denied_applicants WHERE namespace = ? ORDER BY seq",
        )
        .bind(&self.namespace)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl DenialStore for SqliteDenialStore {
    async fn insert(&self, applicant: &DeniedApplicant) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT OR IGNORE INTO denied_applicants (namespace, subject, acl_id, rule_slot, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&self.namespace)
        .bind(&applicant.subject)
        .bind(&applicant.acl_id)
        .bind(applicant.rule_slot)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn get(&self, subject: &str) -> Result<Option<DeniedApplicant>, StoreError> {
        let row = sqlx::query_as::<_, DeniedApplicant>(
            "SELECT subject, acl_id, rule_slot FROM denied_applicants
             WHERE namespace = ? AND subject = ?",
        )
        .bind(&self.namespace)
        .bind(subject)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn update_slot(&self, subject: &str, rule_slot: i64) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE denied_applicants SET rule_slot = ? WHERE namespace = ? AND subject = ?",
        )
        .bind(rule_slot)
        .bind(&self.namespace)
        .bind(subject)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(subject.to_string()));
        }
        Ok(())
    }

    async fn delete_by_subject(&self, subject: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM denied_applicants WHERE namespace = ? AND subject = ?")
            .bind(&self.namespace)
            .bind(subject)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn oldest(&self, acl_id: &str) -> Result<Option<DeniedApplicant>, StoreError> {
        // Per-ACL rule counts are small (cloud quota is 20, 40 on request),
        // so the scan stays cheap.
        let row = sqlx::query_as::<_, DeniedApplicant>(
            "SELECT subject, acl_id, rule_slot FROM denied_applicants
             WHERE namespace = ? AND acl_id = ? AND rule_slot != 0
             ORDER BY seq ASC LIMIT 1",
        )
        .bind(&self.namespace)
        .bind(acl_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
