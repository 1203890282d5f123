//! Record store: durable CRUD, relationship integrity and change
//! notification.
//!
//! # Responsibility
//! - Own the SQLite connection and the observer registry.
//! - Enforce identity and relationship invariants on every mutation.
//!
//! # Invariants
//! - Record identity is assigned once at creation and never reassigned.
//! - Cascade: deleting a user deletes all currently-owned jobs first,
//!   depth-first in relationship order; deleting a job never deletes its
//!   owner.
//! - `jobs.owner_uuid` always points at the user whose collection holds
//!   the job, or is NULL; detach clears it in the same statement.
//! - Every successful mutation synchronously notifies all registered
//!   observers after it is durably applied.

use crate::db::{self, DbError};
use crate::db::migrations::latest_version;
use crate::model::job::{Job, JobId};
use crate::model::user::{User, UserId};
use crate::query::sort::SortOrder;
use crate::query::Predicate;
use crate::repo::plan;
use crate::repo::record::{parse_uuid, Record, JOB_SELECT_SQL};
use rusqlite::{params, params_from_iter, Connection, Transaction, TransactionBehavior};
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::rc::{Rc, Weak};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer error for record persistence, lookup and notification.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap failure; fatal to the triggering
    /// operation, never retried.
    Db(DbError),
    /// Insert with an identity that already exists in the target table.
    DuplicateIdentity(Uuid),
    /// Target record does not exist.
    NotFound(Uuid),
    /// Criteria were validated for a different record type.
    SchemaMismatch {
        built_for: &'static str,
        requested: &'static str,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateIdentity(id) => write!(f, "record identity already exists: {id}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::SchemaMismatch {
                built_for,
                requested,
            } => write!(
                f,
                "criteria were built for record `{built_for}` but `{requested}` was requested"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "record store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "record store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "record store requires column `{column}` in table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Synchronous change notification callback.
///
/// Conservative contract: observers are notified after every successful
/// mutation, whatever it touched, and recompute their own state.
pub trait StoreObserver {
    fn store_changed(&self, store: &RecordStore);
}

/// Durable record store over one SQLite connection.
///
/// Single-writer discipline: the store is not `Sync`; all mutation and
/// notification happens on one logical thread of control.
pub struct RecordStore {
    conn: Connection,
    observers: RefCell<Vec<Weak<dyn StoreObserver>>>,
}

impl RecordStore {
    /// Opens a store over a database file, applying pending migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Rc<Self>> {
        let conn = db::open_db(path)?;
        Ok(Rc::new(Self::try_new(conn)?))
    }

    /// Opens a store over an in-memory database.
    pub fn open_in_memory() -> StoreResult<Rc<Self>> {
        let conn = db::open_db_in_memory()?;
        Ok(Rc::new(Self::try_new(conn)?))
    }

    /// Wraps a migrated connection, verifying the schema contract.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        ensure_store_ready(&conn)?;
        Ok(Self {
            conn,
            observers: RefCell::new(Vec::new()),
        })
    }

    /// Registers a change observer; dropped observers are pruned during
    /// notification sweeps.
    pub fn subscribe(&self, observer: Weak<dyn StoreObserver>) {
        self.observers.borrow_mut().push(observer);
    }

    /// Inserts a new user record.
    pub fn insert_user(&self, user: &User) -> StoreResult<UserId> {
        if identity_exists(&self.conn, "users", user.uuid)? {
            return Err(StoreError::DuplicateIdentity(user.uuid));
        }
        self.conn.execute(
            "INSERT INTO users (uuid, name, city, join_date) VALUES (?1, ?2, ?3, ?4);",
            params![
                user.uuid.to_string(),
                user.name.as_str(),
                user.city.as_str(),
                user.join_date,
            ],
        )?;
        self.notify_observers();
        Ok(user.uuid)
    }

    /// Inserts a new job record; a pre-assigned owner must exist.
    pub fn insert_job(&self, job: &Job) -> StoreResult<JobId> {
        if identity_exists(&self.conn, "jobs", job.uuid)? {
            return Err(StoreError::DuplicateIdentity(job.uuid));
        }
        if let Some(owner) = job.owner {
            if !identity_exists(&self.conn, "users", owner)? {
                return Err(StoreError::NotFound(owner));
            }
        }
        self.conn.execute(
            "INSERT INTO jobs (uuid, name, priority, owner_uuid) VALUES (?1, ?2, ?3, ?4);",
            params![
                job.uuid.to_string(),
                job.name.as_str(),
                job.priority,
                job.owner.map(|owner| owner.to_string()),
            ],
        )?;
        self.notify_observers();
        Ok(job.uuid)
    }

    /// Loads one user by identity.
    pub fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        self.load_by_id::<User>(id)
    }

    /// Loads one job by identity.
    pub fn get_job(&self, id: JobId) -> StoreResult<Option<Job>> {
        self.load_by_id::<Job>(id)
    }

    /// Applies a field-level mutation to an inserted user and persists it
    /// before returning the updated record.
    ///
    /// Identity is not mutable through the mutator.
    pub fn update_user<F: FnOnce(&mut User)>(&self, id: UserId, mutate: F) -> StoreResult<User> {
        let mut updated = self.get_user(id)?.ok_or(StoreError::NotFound(id))?;
        mutate(&mut updated);
        updated.uuid = id;

        let changed = self.conn.execute(
            "UPDATE users
             SET
                name = ?1,
                city = ?2,
                join_date = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?4;",
            params![
                updated.name.as_str(),
                updated.city.as_str(),
                updated.join_date,
                id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        self.notify_observers();
        Ok(updated)
    }

    /// Applies a field-level mutation to an inserted job and persists it
    /// before returning the updated record.
    ///
    /// Identity and assignment are not mutable through the mutator;
    /// assignment changes go through [`RecordStore::attach_job`] and
    /// [`RecordStore::detach_job`].
    pub fn update_job<F: FnOnce(&mut Job)>(&self, id: JobId, mutate: F) -> StoreResult<Job> {
        let current = self.get_job(id)?.ok_or(StoreError::NotFound(id))?;
        let owner = current.owner;
        let mut updated = current;
        mutate(&mut updated);
        updated.uuid = id;
        updated.owner = owner;

        let changed = self.conn.execute(
            "UPDATE jobs
             SET
                name = ?1,
                priority = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?3;",
            params![updated.name.as_str(), updated.priority, id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        self.notify_observers();
        Ok(updated)
    }

    /// Deletes a user and, depth-first, every job it currently owns.
    ///
    /// The cascade and the user delete commit atomically; children are
    /// removed in relationship order (`created_at ASC, uuid ASC`).
    pub fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;

        let owned = owned_job_ids(&tx, id)?;
        for job_id in &owned {
            tx.execute("DELETE FROM jobs WHERE uuid = ?1;", [job_id.to_string()])?;
        }

        let changed = tx.execute("DELETE FROM users WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        tx.commit()?;

        self.notify_observers();
        Ok(())
    }

    /// Deletes exactly one job; the owning user is never touched.
    pub fn delete_job(&self, id: JobId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM jobs WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        self.notify_observers();
        Ok(())
    }

    /// Moves a job into a user's owned collection.
    pub fn attach_job(&self, job: JobId, owner: UserId) -> StoreResult<()> {
        if !identity_exists(&self.conn, "users", owner)? {
            return Err(StoreError::NotFound(owner));
        }
        let changed = self.conn.execute(
            "UPDATE jobs
             SET
                owner_uuid = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?2;",
            params![owner.to_string(), job.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(job));
        }
        self.notify_observers();
        Ok(())
    }

    /// Removes a job from its owner's collection, clearing the
    /// back-reference so no dangling forward reference can be observed.
    pub fn detach_job(&self, job: JobId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE jobs
             SET
                owner_uuid = NULL,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [job.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(job));
        }
        self.notify_observers();
        Ok(())
    }

    /// Lists a user's owned jobs in relationship order.
    pub fn jobs_of(&self, owner: UserId) -> StoreResult<Vec<Job>> {
        if !identity_exists(&self.conn, "users", owner)? {
            return Err(StoreError::NotFound(owner));
        }
        let sql = format!(
            "{JOB_SELECT_SQL}
             WHERE owner_uuid = ?1
             ORDER BY created_at ASC, uuid ASC;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([owner.to_string()])?;
        let mut jobs = Vec::new();
        while let Some(row) = rows.next()? {
            jobs.push(Job::from_row(row)?);
        }
        Ok(jobs)
    }

    /// Fetches the ordered sequence of records matching validated
    /// criteria; the predicate/sort pair compiles to one SQL query.
    pub fn fetch<R: Record>(
        &self,
        predicate: &Predicate,
        sort_order: &SortOrder,
    ) -> StoreResult<Vec<R>> {
        ensure_criteria_record::<R>(predicate.schema().record)?;
        ensure_criteria_record::<R>(sort_order.schema().record)?;

        let (where_sql, binds) = plan::where_clause(predicate)?;
        let order_sql = plan::order_clause(sort_order);
        let sql = format!(
            "{} WHERE {where_sql} ORDER BY {order_sql};",
            R::select_sql()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(R::from_row(row)?);
        }
        Ok(records)
    }

    fn load_by_id<R: Record>(&self, id: Uuid) -> StoreResult<Option<R>> {
        let sql = format!("{} WHERE uuid = ?1;", R::select_sql());
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(R::from_row(row)?));
        }
        Ok(None)
    }

    fn notify_observers(&self) {
        let observers = self.observers.borrow().clone();
        let mut dropped = false;
        for weak in &observers {
            match weak.upgrade() {
                Some(observer) => observer.store_changed(self),
                None => dropped = true,
            }
        }
        if dropped {
            self.observers
                .borrow_mut()
                .retain(|weak| weak.strong_count() > 0);
        }
    }
}

fn ensure_criteria_record<R: Record>(built_for: &'static str) -> StoreResult<()> {
    let requested = R::schema().record;
    if built_for != requested {
        return Err(StoreError::SchemaMismatch {
            built_for,
            requested,
        });
    }
    Ok(())
}

fn identity_exists(conn: &Connection, table: &str, id: Uuid) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE uuid = ?1);"),
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn owned_job_ids(conn: &Connection, owner: UserId) -> StoreResult<Vec<JobId>> {
    let mut stmt = conn.prepare(
        "SELECT uuid
         FROM jobs
         WHERE owner_uuid = ?1
         ORDER BY created_at ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([owner.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "jobs.uuid")?);
    }
    Ok(ids)
}

fn ensure_store_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for (table, columns) in [
        (
            "users",
            &["uuid", "name", "city", "join_date", "created_at", "updated_at"][..],
        ),
        (
            "jobs",
            &["uuid", "name", "priority", "owner_uuid", "created_at", "updated_at"][..],
        ),
    ] {
        if !table_exists(conn, table)? {
            return Err(StoreError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(StoreError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
