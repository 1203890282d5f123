//! Assigned work item record.

use crate::model::schema::{FieldDef, FieldType, RecordSchema};
use crate::model::user::UserId;
use crate::model::ModelError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a job.
pub type JobId = Uuid;

/// Queryable field schema for [`Job`] records.
pub static JOB_SCHEMA: RecordSchema = RecordSchema {
    record: "job",
    table: "jobs",
    id_column: "uuid",
    fields: &[
        FieldDef {
            name: "name",
            column: "name",
            field_type: FieldType::Text,
        },
        FieldDef {
            name: "priority",
            column: "priority",
            field_type: FieldType::Integer,
        },
    ],
};

/// Work item, optionally assigned to one crew member.
///
/// `owner` is an advisory back-reference: it always points at the user
/// whose collection currently contains this job, or is absent. It is kept
/// consistent by the store's attach/detach and cascade paths and is not an
/// ownership edge itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Stable identity, assigned once at creation and never reassigned.
    pub uuid: JobId,
    pub name: String,
    pub priority: i64,
    #[serde(rename = "owner_uuid")]
    pub owner: Option<UserId>,
}

impl Job {
    /// Creates an unassigned job with a generated stable identity.
    pub fn new(name: impl Into<String>, priority: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            priority,
            owner: None,
        }
    }

    /// Creates a job with a caller-provided stable identity.
    pub fn with_id(
        uuid: JobId,
        name: impl Into<String>,
        priority: i64,
    ) -> Result<Self, ModelError> {
        if uuid.is_nil() {
            return Err(ModelError::NilUuid);
        }
        Ok(Self {
            uuid,
            name: name.into(),
            priority,
            owner: None,
        })
    }

    /// Returns a copy assigned to `owner`; used when inserting pre-assigned
    /// jobs.
    pub fn assigned_to(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }
}
