//! Ticket storage trait and error types.

use thiserror::Error;

use crate::ticket::{Ticket, TicketStage};

/// Error type for ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// Value does not match the canonical ticket grammar. Raised before any
    /// store access.
    #[error("invalid ticket value: {0}")]
    InvalidFormat(String),

    /// Well-formed ticket value with no matching ticket.
    #[error("ticket not found: {0}")]
    NotFound(String),

    /// The optimistic version check failed on save: another writer got there
    /// first. Transient; callers retry from a fresh load.
    #[error("concurrent modification of ticket {ticket_id} at version {version}")]
    Conflict {
        /// Ticket that was being saved.
        ticket_id: String,
        /// Version the save was attempted against.
        version: i64,
    },

    /// The outbound job notification could not be delivered.
    #[error("job dispatch failed: {0}")]
    Dispatch(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Trait for ticket storage backends.
///
/// The store is the only shared mutable resource in the lifecycle: all
/// coordination happens through the version check in [`TicketStore::save`].
/// There is no pessimistic locking anywhere.
pub trait TicketStore: Send + Sync {
    /// Persist a newly created ticket at version 0.
    ///
    /// Ticket ids are unique across all tickets that have ever existed; the
    /// store enforces this with a uniqueness constraint.
    fn insert(&self, ticket: &Ticket) -> Result<(), TicketError>;

    /// Look up a ticket by its ticket id.
    fn find_by_ticket_id(&self, ticket_id: &str) -> Result<Option<Ticket>, TicketError>;

    /// Conditionally update a ticket.
    ///
    /// Atomic: succeeds, bumping the stored version by one, only when the
    /// supplied ticket's version matches the stored row. A mismatch is
    /// rejected with [`TicketError::Conflict`] and the row is left untouched.
    /// Returns the ticket at its new version.
    fn save(&self, ticket: &Ticket) -> Result<Ticket, TicketError>;

    /// Count tickets currently at the given stage.
    fn count_by_stage(&self, stage: TicketStage) -> Result<i64, TicketError>;
}
