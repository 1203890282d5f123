//! Sort orders: ordered `(field, direction)` keys applied lexicographically.

use crate::model::schema::{FieldDef, RecordSchema};
use crate::query::QueryError;

/// Sort direction for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// One resolved sort key.
#[derive(Debug, Clone, Copy)]
pub struct SortKey {
    field: &'static FieldDef,
    direction: Direction,
}

impl SortKey {
    pub fn field(&self) -> &'static FieldDef {
        self.field
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Validated sort order over one record type.
///
/// Keys apply lexicographically: the first key is primary, ties break on
/// the next key. The store appends the identity column as a final tiebreak
/// so produced sequences are deterministic.
#[derive(Debug, Clone)]
pub struct SortOrder {
    schema: &'static RecordSchema,
    keys: Vec<SortKey>,
}

impl SortOrder {
    /// Resolves and validates `keys` against `schema`.
    ///
    /// Fails with [`QueryError::EmptySort`] for an empty key list and
    /// [`QueryError::UnknownField`] for a key the schema does not define.
    pub fn new(
        schema: &'static RecordSchema,
        keys: &[(&str, Direction)],
    ) -> Result<Self, QueryError> {
        if keys.is_empty() {
            return Err(QueryError::EmptySort);
        }

        let mut resolved = Vec::with_capacity(keys.len());
        for (name, direction) in keys {
            let field = schema.field(name).ok_or_else(|| QueryError::UnknownField {
                record: schema.record,
                field: (*name).to_string(),
            })?;
            resolved.push(SortKey {
                field,
                direction: *direction,
            });
        }

        Ok(Self {
            schema,
            keys: resolved,
        })
    }

    /// Single-key convenience constructor.
    pub fn by(
        schema: &'static RecordSchema,
        field: &str,
        direction: Direction,
    ) -> Result<Self, QueryError> {
        Self::new(schema, &[(field, direction)])
    }

    /// Schema the keys were resolved against.
    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }

    /// Resolved keys in application order.
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }
}
