//! Crew member record.

use crate::model::schema::{FieldDef, FieldType, RecordSchema};
use crate::model::ModelError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a crew member.
pub type UserId = Uuid;

/// Queryable field schema for [`User`] records.
pub static USER_SCHEMA: RecordSchema = RecordSchema {
    record: "user",
    table: "users",
    id_column: "uuid",
    fields: &[
        FieldDef {
            name: "name",
            column: "name",
            field_type: FieldType::Text,
        },
        FieldDef {
            name: "city",
            column: "city",
            field_type: FieldType::Text,
        },
        FieldDef {
            name: "join_date",
            column: "join_date",
            field_type: FieldType::Timestamp,
        },
    ],
};

/// Crew member with a stable identity and an owned job collection.
///
/// The owned jobs live in the store, not on this struct; use
/// `RecordStore::jobs_of` to read the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identity, assigned once at creation and never reassigned.
    pub uuid: UserId,
    pub name: String,
    pub city: String,
    /// Unix epoch milliseconds.
    pub join_date: i64,
}

impl User {
    /// Creates a user with a generated stable identity.
    pub fn new(name: impl Into<String>, city: impl Into<String>, join_date: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            city: city.into(),
            join_date,
        }
    }

    /// Creates a user with a caller-provided stable identity.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        uuid: UserId,
        name: impl Into<String>,
        city: impl Into<String>,
        join_date: i64,
    ) -> Result<Self, ModelError> {
        if uuid.is_nil() {
            return Err(ModelError::NilUuid);
        }
        Ok(Self {
            uuid,
            name: name.into(),
            city: city.into(),
            join_date,
        })
    }
}
