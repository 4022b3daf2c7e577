//! Denied applicant subject codec.
//!
//! A subject is the natural key of a denied applicant:
//!   `192.0.2.1/32:6`                     CIDR + protocol number
//!   `192.0.2.1/32:17:22-123`             with an inclusive port range
//!   `1582425243392:192.0.2.1/32:6:22-80` prefixed with the creation time (epoch millis)
//!
//! `protocol` is the IP protocol number (6=TCP, 17=UDP). IPv6 blocks are not supported.

use ipnet::Ipv4Net;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::{ReconcileError, ReconcileResult};

const SUBJECT_PATTERN_SRC: &str = r"^(?:([0-9]+):)?([0-9]{1,3}[.][0-9]{1,3}[.][0-9]{1,3}[.][0-9]{1,3}/[0-9]{1,2}):([0-9]+)(?::([0-9]{1,5})-([0-9]{1,5}))?$";

static SUBJECT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SUBJECT_PATTERN_SRC).expect("Invalid regex"));

/// Inclusive port range of a deny rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub from: u16,
    pub to: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Only informational: FIFO order is decided by the store's insertion sequence.
    pub created_at_epoch_millis: Option<u64>,
    pub cidr: Ipv4Net,
    pub protocol: u8,
    /// 0 means "no port restriction". Both ends must be non-zero for a range to apply.
    pub from_port: u16,
    pub to_port: u16,
}

impl Subject {
    pub fn new(cidr: Ipv4Net, protocol: u8) -> Self {
        Self {
            created_at_epoch_millis: None,
            cidr,
            protocol,
            from_port: 0,
            to_port: 0,
        }
    }

    pub fn with_ports(mut self, from_port: u16, to_port: u16) -> Self {
        self.from_port = from_port;
        self.to_port = to_port;
        self
    }

    pub fn created_at(mut self, epoch_millis: u64) -> Self {
        self.created_at_epoch_millis = Some(epoch_millis);
        self
    }

    /// Parse a subject key. Any sub-group that does not fit its numeric type
    /// (or a CIDR with invalid octets / prefix) is rejected rather than zeroed.
    pub fn parse(subject: &str) -> ReconcileResult<Self> {
        let invalid = || ReconcileError::InvalidSubjectFormat {
            subject: subject.to_string(),
            pattern: SUBJECT_PATTERN_SRC.to_string(),
        };

        let caps = SUBJECT_PATTERN.captures(subject).ok_or_else(invalid)?;

        let created_at_epoch_millis = match caps.get(1) {
            Some(m) => Some(m.as_str().parse::<u64>().map_err(|_| invalid())?),
            None => None,
        };
        let cidr = caps[2].parse::<Ipv4Net>().map_err(|_| invalid())?;
        let protocol = caps[3].parse::<u8>().map_err(|_| invalid())?;

        let port = |idx: usize| -> ReconcileResult<u16> {
            match caps.get(idx) {
                Some(m) => m.as_str().parse::<u16>().map_err(|_| invalid()),
                None => Ok(0),
            }
        };
        let from_port = port(4)?;
        let to_port = port(5)?;

        Ok(Self {
            created_at_epoch_millis,
            cidr,
            protocol,
            from_port,
            to_port,
        })
    }

    pub fn port_range(&self) -> Option<PortRange> {
        if self.from_port != 0 && self.to_port != 0 {
            Some(PortRange {
                from: self.from_port,
                to: self.to_port,
            })
        } else {
            None
        }
    }
}

impl FromStr for Subject {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ms) = self.created_at_epoch_millis.filter(|ms| *ms != 0) {
            write!(f, "{}:", ms)?;
        }
        write!(f, "{}:{}", self.cidr, self.protocol)?;
        if let Some(range) = self.port_range() {
            write!(f, ":{}-{}", range.from, range.to)?;
        }
        Ok(())
    }
}
