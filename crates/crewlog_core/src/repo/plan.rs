//! Compilation of validated query criteria into SQL fragments.
//!
//! Inputs here have already passed schema validation at construction
//! time, so lookups cannot miss through the public API; a miss is
//! surfaced as `InvalidData` rather than masked.

use crate::model::schema::{FieldType, RecordSchema};
use crate::query::expr::{CompareOp, Expr, Literal};
use crate::query::sort::{Direction, SortOrder};
use crate::query::Predicate;
use crate::repo::store::{StoreError, StoreResult};
use rusqlite::types::Value;

/// Compiles a predicate into a WHERE fragment plus bind values.
pub(crate) fn where_clause(predicate: &Predicate) -> StoreResult<(String, Vec<Value>)> {
    let mut sql = String::new();
    let mut binds = Vec::new();
    match predicate.root() {
        None => sql.push_str("1 = 1"),
        Some(expr) => emit(predicate.schema(), expr, &mut sql, &mut binds)?,
    }
    Ok((sql, binds))
}

/// Compiles a sort order into an ORDER BY fragment.
///
/// Text keys compare with NOCASE; the identity column is appended as a
/// final tiebreak so every produced sequence is deterministic.
pub(crate) fn order_clause(sort_order: &SortOrder) -> String {
    let mut parts = Vec::with_capacity(sort_order.keys().len() + 1);
    for key in sort_order.keys() {
        let direction = match key.direction() {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        let column = key.field().column;
        match key.field().field_type {
            FieldType::Text => parts.push(format!("{column} COLLATE NOCASE {direction}")),
            FieldType::Integer | FieldType::Timestamp => {
                parts.push(format!("{column} {direction}"))
            }
        }
    }
    parts.push(format!("{} ASC", sort_order.schema().id_column));
    parts.join(", ")
}

fn emit(
    schema: &'static RecordSchema,
    expr: &Expr,
    sql: &mut String,
    binds: &mut Vec<Value>,
) -> StoreResult<()> {
    match expr {
        Expr::And(lhs, rhs) => {
            sql.push('(');
            emit(schema, lhs, sql, binds)?;
            sql.push_str(" AND ");
            emit(schema, rhs, sql, binds)?;
            sql.push(')');
            Ok(())
        }
        Expr::Or(lhs, rhs) => {
            sql.push('(');
            emit(schema, lhs, sql, binds)?;
            sql.push_str(" OR ");
            emit(schema, rhs, sql, binds)?;
            sql.push(')');
            Ok(())
        }
        Expr::Not(inner) => {
            sql.push_str("NOT (");
            emit(schema, inner, sql, binds)?;
            sql.push(')');
            Ok(())
        }
        Expr::Equal(lhs, rhs) => emit_comparison(schema, "=", lhs, rhs, sql, binds),
        Expr::NotEqual(lhs, rhs) => emit_comparison(schema, "<>", lhs, rhs, sql, binds),
        Expr::Compare { op, lhs, rhs } => {
            let operator = match op {
                CompareOp::Lt => "<",
                CompareOp::Le => "<=",
                CompareOp::Gt => ">",
                CompareOp::Ge => ">=",
            };
            emit_comparison(schema, operator, lhs, rhs, sql, binds)
        }
        Expr::Contains(lhs, rhs) => {
            let column = column_of(schema, lhs)?;
            sql.push_str(&format!("instr({column}, ?) > 0"));
            binds.push(literal_value(rhs)?);
            Ok(())
        }
        Expr::Field(_) | Expr::Literal(_) => Err(unvalidated("bare operand as condition")),
    }
}

fn emit_comparison(
    schema: &'static RecordSchema,
    operator: &str,
    lhs: &Expr,
    rhs: &Expr,
    sql: &mut String,
    binds: &mut Vec<Value>,
) -> StoreResult<()> {
    let column = column_of(schema, lhs)?;
    sql.push_str(&format!("{column} {operator} ?"));
    binds.push(literal_value(rhs)?);
    Ok(())
}

fn column_of(schema: &'static RecordSchema, expr: &Expr) -> StoreResult<&'static str> {
    match expr {
        Expr::Field(name) => schema
            .field(name)
            .map(|def| def.column)
            .ok_or_else(|| unvalidated("unknown field reference")),
        _ => Err(unvalidated("non-field left operand")),
    }
}

fn literal_value(expr: &Expr) -> StoreResult<Value> {
    match expr {
        Expr::Literal(Literal::Text(value)) => Ok(Value::Text(value.clone())),
        Expr::Literal(Literal::Integer(value)) => Ok(Value::Integer(*value)),
        _ => Err(unvalidated("non-literal right operand")),
    }
}

fn unvalidated(detail: &str) -> StoreError {
    StoreError::InvalidData(format!("unvalidated predicate reached the planner: {detail}"))
}
