//! Test doubles for the lifecycle's external collaborators.

mod conflict_store;
mod mock_dispatcher;

pub use conflict_store::ConflictInjectingStore;
pub use mock_dispatcher::MockDispatcher;
