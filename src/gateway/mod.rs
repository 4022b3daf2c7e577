//! Firewall gateway: the network ACL backend deny rules are materialized on.
//!
//! - [`MemoryGateway`] - in-process ACL tables (tests, dry runs)
//! - [`SqliteAclGateway`] - ACL tables kept in the local SQLite database
//!
//! A cloud API adapter implements the same trait; the allocator only relies on
//! the error classification below to decide between retrying and giving up.

mod memory;
mod sqlite;

pub use memory::MemoryGateway;
pub use sqlite::{AclEntry, SqliteAclGateway};

use async_trait::async_trait;
use ipnet::Ipv4Net;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

use crate::subject::{PortRange, Subject};

/// Gateway error, classified the way the allocator reacts to it.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The rule number is already taken (another writer won the race).
    #[error("rule number {slot} already exists on {acl_id}")]
    SlotOccupied { acl_id: String, slot: i64 },

    /// The ACL holds as many entries as it is allowed to.
    #[error("network ACL entry limit exceeded on {acl_id}")]
    RuleCountExceeded { acl_id: String },

    #[error("no rule number {slot} on {acl_id}")]
    RuleNotFound { acl_id: String, slot: i64 },

    #[error("backend error: {0}")]
    Backend(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What a deny rule blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenyRule {
    pub cidr: Ipv4Net,
    pub protocol: u8,
    pub port_range: Option<PortRange>,
}

impl From<&Subject> for DenyRule {
    fn from(subject: &Subject) -> Self {
        Self {
            cidr: subject.cidr,
            protocol: subject.protocol,
            port_range: subject.port_range(),
        }
    }
}

#[async_trait]
pub trait FirewallGateway: Send + Sync {
    /// All rule numbers currently occupied on the ACL.
    async fn list_used_slots(&self, acl_id: &str) -> Result<BTreeSet<i64>, GatewayError>;

    /// Create a deny rule at exactly `slot`.
    async fn create_deny_rule(&self, acl_id: &str, slot: i64, rule: &DenyRule) -> Result<(), GatewayError>;

    /// Delete the rule at `slot`.
    async fn delete_rule(&self, acl_id: &str, slot: i64) -> Result<(), GatewayError>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

pub type SharedGateway = Arc<dyn FirewallGateway>;
