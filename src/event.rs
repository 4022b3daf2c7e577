//! Change records delivered by the store's change stream.
//!
//! ```json
//! {"records": [
//!   {"eventName": "INSERT",
//!    "eventSourceArn": "arn:aws:dynamodb:ap-northeast-1:0123456789:table/denied/stream/2019-11-30T22:24:10.892",
//!    "newImage": {"subject": "192.0.2.1/32:6", "networkAclID": "acl-foo"}}
//! ]}
//! ```

use serde::{Deserialize, Serialize};

use crate::applicant::DeniedApplicant;
use crate::error::{ReconcileError, ReconcileResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Modify,
    Remove,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub event_name: ChangeKind,
    #[serde(default)]
    pub event_source_arn: Option<String>,
    #[serde(default)]
    pub new_image: Option<DeniedApplicant>,
    #[serde(default)]
    pub old_image: Option<DeniedApplicant>,
}

impl ChangeRecord {
    pub fn insert(applicant: DeniedApplicant) -> Self {
        Self {
            event_name: ChangeKind::Insert,
            event_source_arn: None,
            new_image: Some(applicant),
            old_image: None,
        }
    }

    pub fn remove(applicant: DeniedApplicant) -> Self {
        Self {
            event_name: ChangeKind::Remove,
            event_source_arn: None,
            new_image: None,
            old_image: Some(applicant),
        }
    }

    /// Image describing the applicant the change is about.
    pub fn image(&self) -> ReconcileResult<&DeniedApplicant> {
        let image = match self.event_name {
            ChangeKind::Insert | ChangeKind::Modify => self.new_image.as_ref(),
            ChangeKind::Remove => self.old_image.as_ref(),
        };
        image.ok_or_else(|| {
            ReconcileError::InvalidChange(format!("{:?} record without its image", self.event_name))
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeBatch {
    #[serde(default)]
    pub records: Vec<ChangeRecord>,
}

impl ChangeBatch {
    pub fn from_json(json: &str) -> ReconcileResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Table the batch was streamed from, taken from the first record carrying an ARN.
    pub fn source_table(&self) -> ReconcileResult<Option<String>> {
        match self.records.iter().find_map(|r| r.event_source_arn.as_deref()) {
            Some(arn) => table_name_from_source_arn(arn).map(Some),
            None => Ok(None),
        }
    }
}

/// Extract the table name from a stream ARN such as
/// `arn:aws:dynamodb:ap-northeast-1:0123456789:table/tableName/stream/2019-11-30T22:24:10.892`.
pub fn table_name_from_source_arn(arn: &str) -> ReconcileResult<String> {
    let insufficient = || ReconcileError::InsufficientEventSourceArn(arn.to_string());

    // the stream label itself contains ':' so only split off the first five fields
    let resource = arn.splitn(6, ':').nth(5).ok_or_else(insufficient)?;
    let parts: Vec<&str> = resource.split('/').collect();
    if parts.len() < 4 || parts[1].is_empty() {
        return Err(insufficient());
    }
    Ok(parts[1].to_string())
}
