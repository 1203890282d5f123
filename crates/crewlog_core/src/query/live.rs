//! Live, re-evaluated views over the record store.
//!
//! # Responsibility
//! - Keep an ordered snapshot of records matching a predicate+sort pair,
//!   recomputed synchronously on every store change notification.
//!
//! # Invariants
//! - After a completed notification cycle the snapshot reflects store
//!   state at the moment of notification; no stale reads are exposed.
//! - Replacing the predicate or sort order triggers an immediate
//!   re-evaluation.
//! - A failed recomputation keeps the previous snapshot and records the
//!   error; it never panics inside a notification.

use crate::query::sort::SortOrder;
use crate::query::Predicate;
use crate::repo::record::Record;
use crate::repo::store::{RecordStore, StoreError, StoreObserver, StoreResult};
use log::warn;
use std::cell::RefCell;
use std::rc::Rc;

/// Continuously-updated ordered view of matching records.
///
/// Registered with the store as a weak observer; dropping the query
/// unregisters it on the next notification sweep.
pub struct LiveQuery<R: Record> {
    store: Rc<RecordStore>,
    predicate: RefCell<Predicate>,
    sort_order: RefCell<SortOrder>,
    results: RefCell<Vec<R>>,
    last_error: RefCell<Option<StoreError>>,
}

impl<R: Record + 'static> LiveQuery<R> {
    /// Builds the view, runs the initial evaluation and subscribes to
    /// store change notifications.
    ///
    /// Fails if the criteria were built for a different record type or if
    /// the initial fetch fails; no half-configured query is ever returned.
    pub fn new(
        store: Rc<RecordStore>,
        predicate: Predicate,
        sort_order: SortOrder,
    ) -> StoreResult<Rc<Self>> {
        let query = Rc::new(Self {
            store,
            predicate: RefCell::new(predicate),
            sort_order: RefCell::new(sort_order),
            results: RefCell::new(Vec::new()),
            last_error: RefCell::new(None),
        });
        query.recompute(query.store.as_ref())?;

        let observer: Rc<dyn StoreObserver> = query.clone();
        query.store.subscribe(Rc::downgrade(&observer));
        Ok(query)
    }

    /// Current ordered snapshot.
    pub fn results(&self) -> Vec<R> {
        self.results.borrow().clone()
    }

    /// Replaces the filter and re-evaluates immediately.
    pub fn set_predicate(&self, predicate: Predicate) -> StoreResult<()> {
        ensure_record::<R>(predicate.schema().record)?;
        *self.predicate.borrow_mut() = predicate;
        self.recompute(self.store.as_ref())
    }

    /// Replaces the sort order and re-evaluates immediately.
    pub fn set_sort_order(&self, sort_order: SortOrder) -> StoreResult<()> {
        ensure_record::<R>(sort_order.schema().record)?;
        *self.sort_order.borrow_mut() = sort_order;
        self.recompute(self.store.as_ref())
    }

    /// Active filter.
    pub fn predicate(&self) -> Predicate {
        self.predicate.borrow().clone()
    }

    /// Active sort order.
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order.borrow().clone()
    }

    /// Takes the error left by the most recent failed notification
    /// recompute, if any.
    pub fn take_last_error(&self) -> Option<StoreError> {
        self.last_error.borrow_mut().take()
    }

    fn recompute(&self, store: &RecordStore) -> StoreResult<()> {
        let rows = {
            let predicate = self.predicate.borrow();
            let sort_order = self.sort_order.borrow();
            store.fetch::<R>(&predicate, &sort_order)?
        };
        *self.results.borrow_mut() = rows;
        *self.last_error.borrow_mut() = None;
        Ok(())
    }
}

impl<R: Record> std::fmt::Debug for LiveQuery<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveQuery")
            .field("record", &R::schema().record)
            .field("results", &self.results.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<R: Record + 'static> StoreObserver for LiveQuery<R> {
    fn store_changed(&self, store: &RecordStore) {
        if let Err(err) = self.recompute(store) {
            warn!(
                "event=live_query_recompute module=query status=error record={} error={}",
                R::schema().record,
                err
            );
            *self.last_error.borrow_mut() = Some(err);
        }
    }
}

fn ensure_record<R: Record>(built_for: &'static str) -> StoreResult<()> {
    let requested = R::schema().record;
    if built_for != requested {
        return Err(StoreError::SchemaMismatch {
            built_for,
            requested,
        });
    }
    Ok(())
}
