//! Store wrapper that injects optimistic version conflicts.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ticket::{Ticket, TicketError, TicketStage, TicketStore};

/// Wraps a real store and fails a configurable number of saves with
/// [`TicketError::Conflict`] before letting writes through again. Reads are
/// always delegated untouched.
pub struct ConflictInjectingStore<S> {
    inner: S,
    remaining: AtomicUsize,
}

impl<S: TicketStore> ConflictInjectingStore<S> {
    /// Wrap `inner` with no conflicts armed.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            remaining: AtomicUsize::new(0),
        }
    }

    /// Fail the next `count` saves with a version conflict.
    pub fn inject_conflicts(&self, count: usize) {
        self.remaining.store(count, Ordering::SeqCst);
    }

    /// How many injected conflicts are still armed.
    pub fn injected_remaining(&self) -> usize {
        self.remaining.load(Ordering::SeqCst)
    }

    fn take_conflict(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl<S: TicketStore> TicketStore for ConflictInjectingStore<S> {
    fn insert(&self, ticket: &Ticket) -> Result<(), TicketError> {
        self.inner.insert(ticket)
    }

    fn find_by_ticket_id(&self, ticket_id: &str) -> Result<Option<Ticket>, TicketError> {
        self.inner.find_by_ticket_id(ticket_id)
    }

    fn save(&self, ticket: &Ticket) -> Result<Ticket, TicketError> {
        if self.take_conflict() {
            return Err(TicketError::Conflict {
                ticket_id: ticket.ticket_id().to_string(),
                version: ticket.version(),
            });
        }
        self.inner.save(ticket)
    }

    fn count_by_stage(&self, stage: TicketStage) -> Result<i64, TicketError> {
        self.inner.count_by_stage(stage)
    }
}
