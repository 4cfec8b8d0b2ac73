//! Tickets for tracking share-clip jobs from request to redemption.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTicketStore;
pub use store::{TicketError, TicketStore};
pub use types::{GameplayInfo, Ticket, TicketStage, TicketStatus};
