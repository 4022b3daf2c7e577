use serde::{Deserialize, Serialize};

use crate::error::ReconcileResult;
use crate::subject::Subject;

/// An applicant whose traffic is denied by a network ACL rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeniedApplicant {
    /// Natural key in the store; see [`Subject`] for the format.
    pub subject: String,

    /// Identifier of the ACL the deny rule is applied to.
    #[serde(rename = "networkAclID")]
    pub acl_id: String,

    /// Rule number currently holding the deny rule. 0 = not assigned yet.
    #[serde(rename = "aclRuleNumber", default)]
    pub rule_slot: i64,
}

impl DeniedApplicant {
    pub fn new(subject: &Subject, acl_id: impl Into<String>, rule_slot: i64) -> Self {
        Self {
            subject: subject.to_string(),
            acl_id: acl_id.into(),
            rule_slot,
        }
    }

    pub fn parse_subject(&self) -> ReconcileResult<Subject> {
        Subject::parse(&self.subject)
    }

    pub fn is_materialized(&self) -> bool {
        self.rule_slot != 0
    }
}
