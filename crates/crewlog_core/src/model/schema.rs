//! Field schemas describing how record types map onto storage.
//!
//! A schema is the static contract shared by predicate validation and the
//! SQL planner: every field a query may reference is listed here with its
//! storage column and value type.

use std::fmt::{Display, Formatter};

/// Value type of a queryable record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// UTF-8 text.
    Text,
    /// Signed integer.
    Integer,
    /// Unix epoch milliseconds; ordered like an integer.
    Timestamp,
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Timestamp => "timestamp",
        };
        write!(f, "{name}")
    }
}

/// One queryable field of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name as referenced by predicates and sort orders.
    pub name: &'static str,
    /// Backing storage column.
    pub column: &'static str,
    /// Value type used for operator/operand checks.
    pub field_type: FieldType,
}

/// Static storage contract for one record type.
#[derive(Debug)]
pub struct RecordSchema {
    /// Record type name used in error messages and schema-match checks.
    pub record: &'static str,
    /// Backing table.
    pub table: &'static str,
    /// Identity column; also the final sort tiebreak.
    pub id_column: &'static str,
    /// Queryable fields.
    pub fields: &'static [FieldDef],
}

impl RecordSchema {
    /// Looks up a field definition by predicate-facing name.
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|def| def.name == name)
    }
}
