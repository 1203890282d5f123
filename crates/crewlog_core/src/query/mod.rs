//! Declarative query layer: predicate expression trees, sort orders and
//! live, re-evaluated views.
//!
//! # Responsibility
//! - Represent filters as closed boolean expression trees over record
//!   fields, validated against the record schema at construction.
//! - Keep invalid criteria unrepresentable: a [`Predicate`] or
//!   [`SortOrder`] that exists has already passed every check, so
//!   evaluation never fails on query shape.
//!
//! # Invariants
//! - A predicate always reduces to exactly one evaluable expression.
//! - Construction errors surface before any store access.

use crate::model::schema::{FieldType, RecordSchema};
use crate::query::expr::{CompareOp, Expr, Literal};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod expr;
pub mod live;
pub mod parse;
pub mod sort;

/// Construction-time error for predicates and sort orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Referenced field is not defined by the record schema.
    UnknownField {
        record: &'static str,
        field: String,
    },
    /// Operator applied to a field whose type does not support it.
    TypeMismatch {
        operation: &'static str,
        field: String,
        field_type: FieldType,
    },
    /// Comparison operands are not in field-literal shape.
    InvalidOperand {
        operation: &'static str,
        detail: &'static str,
    },
    /// Expression does not reduce to a condition.
    NonBoolean { found: &'static str },
    /// Sort order was built with no keys.
    EmptySort,
    /// Lexical or grammatical error in predicate text.
    Syntax { position: usize, message: String },
    /// Predicate text holds more than one top-level expression.
    TrailingInput { position: usize },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField { record, field } => {
                write!(f, "unknown field `{field}` on record `{record}`")
            }
            Self::TypeMismatch {
                operation,
                field,
                field_type,
            } => write!(
                f,
                "operator `{operation}` cannot apply to field `{field}` of type {field_type}"
            ),
            Self::InvalidOperand { operation, detail } => {
                write!(f, "operator `{operation}`: {detail}")
            }
            Self::NonBoolean { found } => {
                write!(f, "expression does not evaluate to a condition: {found}")
            }
            Self::EmptySort => write!(f, "sort order requires at least one key"),
            Self::Syntax { position, message } => {
                write!(f, "syntax error at byte {position}: {message}")
            }
            Self::TrailingInput { position } => write!(
                f,
                "predicate must be a single expression; unexpected trailing input at byte {position}"
            ),
        }
    }
}

impl Error for QueryError {}

/// Validated filter over one record type.
///
/// Holds a closed expression tree checked against the record schema; the
/// root is inspectable via [`Predicate::root`] so callers can examine the
/// compiled plan.
#[derive(Debug, Clone)]
pub struct Predicate {
    schema: &'static RecordSchema,
    root: Option<Expr>,
}

impl Predicate {
    /// Validates `expr` against `schema` and wraps it as a predicate.
    pub fn new(schema: &'static RecordSchema, expr: Expr) -> Result<Self, QueryError> {
        validate_condition(schema, &expr)?;
        Ok(Self {
            schema,
            root: Some(expr),
        })
    }

    /// The predicate matching every record of the schema.
    pub fn always(schema: &'static RecordSchema) -> Self {
        Self { schema, root: None }
    }

    /// Parses predicate text; see [`parse::parse_predicate`].
    pub fn parse(schema: &'static RecordSchema, input: &str) -> Result<Self, QueryError> {
        parse::parse_predicate(schema, input)
    }

    /// Schema the predicate was validated against.
    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }

    /// Root of the expression tree; `None` means match-all.
    pub fn root(&self) -> Option<&Expr> {
        self.root.as_ref()
    }
}

enum OperandRule {
    MatchingType,
    TextOnly,
    OrderedOnly,
}

fn validate_condition(schema: &'static RecordSchema, expr: &Expr) -> Result<(), QueryError> {
    match expr {
        Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
            validate_condition(schema, lhs)?;
            validate_condition(schema, rhs)
        }
        Expr::Not(inner) => validate_condition(schema, inner),
        Expr::Equal(lhs, rhs) => {
            validate_comparison(schema, "==", lhs, rhs, OperandRule::MatchingType)
        }
        Expr::NotEqual(lhs, rhs) => {
            validate_comparison(schema, "!=", lhs, rhs, OperandRule::MatchingType)
        }
        Expr::Contains(lhs, rhs) => {
            validate_comparison(schema, "contains", lhs, rhs, OperandRule::TextOnly)
        }
        Expr::Compare { op, lhs, rhs } => {
            validate_comparison(schema, op_name(*op), lhs, rhs, OperandRule::OrderedOnly)
        }
        Expr::Field(_) => Err(QueryError::NonBoolean {
            found: "a bare field reference",
        }),
        Expr::Literal(_) => Err(QueryError::NonBoolean {
            found: "a bare literal",
        }),
    }
}

fn validate_comparison(
    schema: &'static RecordSchema,
    operation: &'static str,
    lhs: &Expr,
    rhs: &Expr,
    rule: OperandRule,
) -> Result<(), QueryError> {
    let Expr::Field(name) = lhs else {
        return Err(QueryError::InvalidOperand {
            operation,
            detail: "left operand must be a field reference",
        });
    };
    let Some(def) = schema.field(name) else {
        return Err(QueryError::UnknownField {
            record: schema.record,
            field: name.clone(),
        });
    };
    let Expr::Literal(literal) = rhs else {
        return Err(QueryError::InvalidOperand {
            operation,
            detail: "right operand must be a literal",
        });
    };

    let compatible = match rule {
        OperandRule::MatchingType => literal_matches(def.field_type, literal),
        OperandRule::TextOnly => {
            matches!((def.field_type, literal), (FieldType::Text, Literal::Text(_)))
        }
        OperandRule::OrderedOnly => matches!(
            (def.field_type, literal),
            (FieldType::Integer | FieldType::Timestamp, Literal::Integer(_))
        ),
    };
    if !compatible {
        return Err(QueryError::TypeMismatch {
            operation,
            field: name.clone(),
            field_type: def.field_type,
        });
    }
    Ok(())
}

fn literal_matches(field_type: FieldType, literal: &Literal) -> bool {
    matches!(
        (field_type, literal),
        (FieldType::Text, Literal::Text(_))
            | (FieldType::Integer | FieldType::Timestamp, Literal::Integer(_))
    )
}

fn op_name(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Lt => "<",
        CompareOp::Le => "<=",
        CompareOp::Gt => ">",
        CompareOp::Ge => ">=",
    }
}
