//! Core domain logic for crewlog.
//! This crate is the single source of truth for record, query and editing
//! invariants; binaries only wire it up.

pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::job::{Job, JobId, JOB_SCHEMA};
pub use model::schema::{FieldDef, FieldType, RecordSchema};
pub use model::user::{User, UserId, USER_SCHEMA};
pub use model::ModelError;
pub use query::expr::{field, int, not, text, CompareOp, Expr, Literal};
pub use query::live::LiveQuery;
pub use query::parse::parse_predicate;
pub use query::sort::{Direction, SortOrder};
pub use query::{Predicate, QueryError};
pub use repo::record::Record;
pub use repo::store::{RecordStore, StoreError, StoreObserver, StoreResult};
pub use service::editor::{JobEditor, UserEditor};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
