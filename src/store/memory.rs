//! In-memory denial store.

use async_trait::async_trait;
use std::sync::RwLock;

use super::{DenialStore, StoreError};
use crate::applicant::DeniedApplicant;

/// Applicants kept in insertion order.
#[derive(Default)]
pub struct MemoryDenialStore {
    applicants: RwLock<Vec<DeniedApplicant>>,
}

impl MemoryDenialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.applicants.read().unwrap_or_else(recover).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subjects in FIFO order.
    pub fn subjects(&self) -> Vec<String> {
        let applicants = self.applicants.read().unwrap_or_else(recover);
        applicants.iter().map(|a| a.subject.clone()).collect()
    }
}

// A poisoned lock still holds consistent data: every mutation below is a single
// Vec operation.
fn recover<T>(err: std::sync::PoisonError<T>) -> T {
    err.into_inner()
}

#[async_trait]
impl DenialStore for MemoryDenialStore {
    async fn insert(&self, applicant: &DeniedApplicant) -> Result<(), StoreError> {
        let mut applicants = self.applicants.write().unwrap_or_else(recover);
        if !applicants.iter().any(|a| a.subject == applicant.subject) {
            applicants.push(applicant.clone());
        }
        Ok(())
    }

    async fn get(&self, subject: &str) -> Result<Option<DeniedApplicant>, StoreError> {
        let applicants = self.applicants.read().unwrap_or_else(recover);
        Ok(applicants.iter().find(|a| a.subject == subject).cloned())
    }

    async fn update_slot(&self, subject: &str, rule_slot: i64) -> Result<(), StoreError> {
        let mut applicants = self.applicants.write().unwrap_or_else(recover);
        match applicants.iter_mut().find(|a| a.subject == subject) {
            Some(applicant) => {
                applicant.rule_slot = rule_slot;
                Ok(())
            }
            None => Err(StoreError::NotFound(subject.to_string())),
        }
    }

    async fn delete_by_subject(&self, subject: &str) -> Result<(), StoreError> {
        let mut applicants = self.applicants.write().unwrap_or_else(recover);
        applicants.retain(|a| a.subject != subject);
        Ok(())
    }

    async fn oldest(&self, acl_id: &str) -> Result<Option<DeniedApplicant>, StoreError> {
        let applicants = self.applicants.read().unwrap_or_else(recover);
        Ok(applicants
            .iter()
            .find(|a| a.acl_id == acl_id && a.is_materialized())
            .cloned())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applicant(subject: &str, acl_id: &str, rule_slot: i64) -> DeniedApplicant {
        DeniedApplicant {
            subject: subject.to_string(),
            acl_id: acl_id.to_string(),
            rule_slot,
        }
    }

    #[tokio::test]
    async fn test_oldest_follows_insertion_order() {
        let store = MemoryDenialStore::new();
        store.insert(&applicant("192.168.1.1/32:6", "acl-foo", 100)).await.unwrap();
        store.insert(&applicant("192.168.0.2/32:6", "acl-foo", 101)).await.unwrap();

        let oldest = store.oldest("acl-foo").await.unwrap().unwrap();
        assert_eq!(oldest.rule_slot, 100);

        store.delete_by_subject(&oldest.subject).await.unwrap();
        let oldest = store.oldest("acl-foo").await.unwrap().unwrap();
        assert_eq!(oldest.rule_slot, 101);

        store.delete_by_subject(&oldest.subject).await.unwrap();
        assert!(store.oldest("acl-foo").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oldest_skips_unassigned_and_other_acls() {
        let store = MemoryDenialStore::new();
        store.insert(&applicant("192.168.1.1/32:6", "acl-bar", 100)).await.unwrap();
        store.insert(&applicant("192.168.1.2/32:6", "acl-foo", 0)).await.unwrap();
        store.insert(&applicant("192.168.1.3/32:6", "acl-foo", 105)).await.unwrap();

        let oldest = store.oldest("acl-foo").await.unwrap().unwrap();
        assert_eq!(oldest.subject, "192.168.1.3/32:6");
    }

    #[tokio::test]
    async fn test_reinsert_keeps_position() {
        let store = MemoryDenialStore::new();
        store.insert(&applicant("192.168.1.1/32:6", "acl-foo", 100)).await.unwrap();
        store.insert(&applicant("192.168.1.2/32:6", "acl-foo", 101)).await.unwrap();
        store.insert(&applicant("192.168.1.1/32:6", "acl-foo", 0)).await.unwrap();

        assert_eq!(store.subjects(), vec!["192.168.1.1/32:6", "192.168.1.2/32:6"]);
        assert_eq!(store.get("192.168.1.1/32:6").await.unwrap().unwrap().rule_slot, 100);
    }

    #[tokio::test]
    async fn test_update_slot() {
        let store = MemoryDenialStore::new();
        store.insert(&applicant("192.168.1.1/32:6", "acl-foo", 0)).await.unwrap();
        store.update_slot("192.168.1.1/32:6", 200).await.unwrap();
        assert_eq!(store.get("192.168.1.1/32:6").await.unwrap().unwrap().rule_slot, 200);

        let err = store.update_slot("10.0.0.1/32:6", 200).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
