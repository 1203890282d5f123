//! Storage contract for record types: canonical SELECT lists and row
//! decoding.
//!
//! # Invariants
//! - Read paths reject invalid persisted state instead of masking it.

use crate::model::job::{Job, JOB_SCHEMA};
use crate::model::schema::RecordSchema;
use crate::model::user::{User, USER_SCHEMA};
use crate::repo::store::StoreError;
use rusqlite::Row;
use uuid::Uuid;

pub(crate) const USER_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    city,
    join_date
FROM users";

pub(crate) const JOB_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    priority,
    owner_uuid
FROM jobs";

/// A record type the store can persist, fetch and observe.
pub trait Record: Clone + Sized {
    /// Static storage schema; also used for predicate/sort validation.
    fn schema() -> &'static RecordSchema;

    /// Canonical SELECT prefix matching [`Record::from_row`].
    fn select_sql() -> &'static str;

    /// Decodes one row produced by the canonical SELECT list.
    fn from_row(row: &Row<'_>) -> Result<Self, StoreError>;
}

impl Record for User {
    fn schema() -> &'static RecordSchema {
        &USER_SCHEMA
    }

    fn select_sql() -> &'static str {
        USER_SELECT_SQL
    }

    fn from_row(row: &Row<'_>) -> Result<Self, StoreError> {
        let uuid_text: String = row.get("uuid")?;
        Ok(User {
            uuid: parse_uuid(&uuid_text, "users.uuid")?,
            name: row.get("name")?,
            city: row.get("city")?,
            join_date: row.get("join_date")?,
        })
    }
}

impl Record for Job {
    fn schema() -> &'static RecordSchema {
        &JOB_SCHEMA
    }

    fn select_sql() -> &'static str {
        JOB_SELECT_SQL
    }

    fn from_row(row: &Row<'_>) -> Result<Self, StoreError> {
        let uuid_text: String = row.get("uuid")?;
        let owner = row
            .get::<_, Option<String>>("owner_uuid")?
            .map(|value| parse_uuid(&value, "jobs.owner_uuid"))
            .transpose()?;
        Ok(Job {
            uuid: parse_uuid(&uuid_text, "jobs.uuid")?,
            name: row.get("name")?,
            priority: row.get("priority")?,
            owner,
        })
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}
