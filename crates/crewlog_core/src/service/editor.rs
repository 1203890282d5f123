//! Bound editors: write-through field bindings over one record.
//!
//! # Contract
//! - Reading a field yields the record's current persisted value.
//! - Writing a field immediately persists through the store; there is no
//!   staging buffer and no separate save step.
//! - A failed write is rejected: the exposed value stays equal to the
//!   last persisted value and the error surfaces to the caller.

use crate::model::job::{Job, JobId};
use crate::model::user::{User, UserId};
use crate::repo::store::{RecordStore, StoreError, StoreResult};
use std::cell::RefCell;
use std::rc::Rc;

/// Write-through editing surface for one user record.
pub struct UserEditor {
    store: Rc<RecordStore>,
    current: RefCell<User>,
}

impl UserEditor {
    /// Opens an edit session on an inserted user.
    pub fn new(store: Rc<RecordStore>, id: UserId) -> StoreResult<Self> {
        let current = store.get_user(id)?.ok_or(StoreError::NotFound(id))?;
        Ok(Self {
            store,
            current: RefCell::new(current),
        })
    }

    pub fn id(&self) -> UserId {
        self.current.borrow().uuid
    }

    pub fn name(&self) -> String {
        self.current.borrow().name.clone()
    }

    pub fn city(&self) -> String {
        self.current.borrow().city.clone()
    }

    pub fn join_date(&self) -> i64 {
        self.current.borrow().join_date
    }

    pub fn set_name(&self, value: impl Into<String>) -> StoreResult<()> {
        let value = value.into();
        self.write(move |user| user.name = value)
    }

    pub fn set_city(&self, value: impl Into<String>) -> StoreResult<()> {
        let value = value.into();
        self.write(move |user| user.city = value)
    }

    pub fn set_join_date(&self, value: i64) -> StoreResult<()> {
        self.write(move |user| user.join_date = value)
    }

    /// Re-reads the persisted record, picking up external mutations.
    pub fn refresh(&self) -> StoreResult<()> {
        let id = self.id();
        let current = self.store.get_user(id)?.ok_or(StoreError::NotFound(id))?;
        *self.current.borrow_mut() = current;
        Ok(())
    }

    fn write<F: FnOnce(&mut User)>(&self, mutate: F) -> StoreResult<()> {
        // On failure `current` is left at the last persisted value.
        let updated = self.store.update_user(self.id(), mutate)?;
        *self.current.borrow_mut() = updated;
        Ok(())
    }
}

impl std::fmt::Debug for UserEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserEditor")
            .field("current", &self.current.borrow())
            .finish_non_exhaustive()
    }
}

/// Write-through editing surface for one job record.
///
/// Assignment is read-only here: attach/detach go through the store's
/// paired relationship operations, and [`JobEditor::refresh`] picks the
/// result up.
pub struct JobEditor {
    store: Rc<RecordStore>,
    current: RefCell<Job>,
}

impl JobEditor {
    /// Opens an edit session on an inserted job.
    pub fn new(store: Rc<RecordStore>, id: JobId) -> StoreResult<Self> {
        let current = store.get_job(id)?.ok_or(StoreError::NotFound(id))?;
        Ok(Self {
            store,
            current: RefCell::new(current),
        })
    }

    pub fn id(&self) -> JobId {
        self.current.borrow().uuid
    }

    pub fn name(&self) -> String {
        self.current.borrow().name.clone()
    }

    pub fn priority(&self) -> i64 {
        self.current.borrow().priority
    }

    pub fn owner(&self) -> Option<UserId> {
        self.current.borrow().owner
    }

    pub fn set_name(&self, value: impl Into<String>) -> StoreResult<()> {
        let value = value.into();
        self.write(move |job| job.name = value)
    }

    pub fn set_priority(&self, value: i64) -> StoreResult<()> {
        self.write(move |job| job.priority = value)
    }

    /// Re-reads the persisted record, picking up external mutations.
    pub fn refresh(&self) -> StoreResult<()> {
        let id = self.id();
        let current = self.store.get_job(id)?.ok_or(StoreError::NotFound(id))?;
        *self.current.borrow_mut() = current;
        Ok(())
    }

    fn write<F: FnOnce(&mut Job)>(&self, mutate: F) -> StoreResult<()> {
        let updated = self.store.update_job(self.id(), mutate)?;
        *self.current.borrow_mut() = updated;
        Ok(())
    }
}

impl std::fmt::Debug for JobEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobEditor")
            .field("current", &self.current.borrow())
            .finish_non_exhaustive()
    }
}
