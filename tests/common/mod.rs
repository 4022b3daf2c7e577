//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use acl_hangman::applicant::DeniedApplicant;
use acl_hangman::gateway::{DenyRule, FirewallGateway, GatewayError, MemoryGateway};
use acl_hangman::subject::Subject;

/// A gateway call as observed by [`ScriptedGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Create(String, i64),
    Delete(String, i64),
}

/// [`MemoryGateway`] that records every call and can inject faults.
pub struct ScriptedGateway {
    pub inner: MemoryGateway,
    calls: Mutex<Vec<Call>>,
    /// Slots a concurrent writer claims right before our create reaches them.
    stolen: Mutex<BTreeSet<i64>>,
    fail_creates: Mutex<Option<String>>,
    fail_deletes: Mutex<Option<String>>,
}

impl ScriptedGateway {
    pub fn new(max_entries: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryGateway::new(max_entries),
            calls: Mutex::new(Vec::new()),
            stolen: Mutex::new(BTreeSet::new()),
            fail_creates: Mutex::new(None),
            fail_deletes: Mutex::new(None),
        })
    }

    pub fn seed(&self, acl_id: &str, slot: i64) {
        self.inner.seed(acl_id, slot, rule("198.51.100.1/32:6"));
    }

    pub fn steal(&self, slot: i64) {
        self.stolen.lock().unwrap().insert(slot);
    }

    pub fn fail_creates(&self, message: &str) {
        *self.fail_creates.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_deletes(&self, message: &str) {
        *self.fail_deletes.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Delete(..)))
            .collect()
    }

    pub async fn used(&self, acl_id: &str) -> Vec<i64> {
        self.inner.list_used_slots(acl_id).await.unwrap().into_iter().collect()
    }
}

#[async_trait]
impl FirewallGateway for ScriptedGateway {
    async fn list_used_slots(&self, acl_id: &str) -> Result<BTreeSet<i64>, GatewayError> {
        self.calls.lock().unwrap().push(Call::List(acl_id.to_string()));
        self.inner.list_used_slots(acl_id).await
    }

    async fn create_deny_rule(&self, acl_id: &str, slot: i64, rule: &DenyRule) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(Call::Create(acl_id.to_string(), slot));
        let failure = self.fail_creates.lock().unwrap().clone();
        if let Some(message) = failure {
            return Err(GatewayError::Backend(message));
        }
        let stolen = self.stolen.lock().unwrap().remove(&slot);
        if stolen {
            self.inner.seed(acl_id, slot, rule.clone());
        }
        self.inner.create_deny_rule(acl_id, slot, rule).await
    }

    async fn delete_rule(&self, acl_id: &str, slot: i64) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(Call::Delete(acl_id.to_string(), slot));
        let failure = self.fail_deletes.lock().unwrap().clone();
        if let Some(message) = failure {
            return Err(GatewayError::Backend(message));
        }
        self.inner.delete_rule(acl_id, slot).await
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub fn rule(subject: &str) -> DenyRule {
    DenyRule::from(&Subject::parse(subject).unwrap())
}

pub fn applicant(subject: &str, acl_id: &str, rule_slot: i64) -> DeniedApplicant {
    DeniedApplicant {
        subject: subject.to_string(),
        acl_id: acl_id.to_string(),
        rule_slot,
    }
}
