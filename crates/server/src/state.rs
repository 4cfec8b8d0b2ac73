use std::sync::Arc;

use tokio::sync::mpsc;

use clipshare_core::{Config, StatusUpdate, TicketService, TicketStore};

/// Shared application state
pub struct AppState {
    config: Config,
    service: Arc<TicketService>,
    ticket_store: Arc<dyn TicketStore>,
    status_tx: mpsc::Sender<StatusUpdate>,
}

impl AppState {
    pub fn new(
        config: Config,
        service: Arc<TicketService>,
        ticket_store: Arc<dyn TicketStore>,
        status_tx: mpsc::Sender<StatusUpdate>,
    ) -> Self {
        Self {
            config,
            service,
            ticket_store,
            status_tx,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &TicketService {
        &self.service
    }

    pub fn ticket_store(&self) -> &dyn TicketStore {
        self.ticket_store.as_ref()
    }

    /// Sender feeding the status-update ingress consumer.
    pub fn status_tx(&self) -> &mpsc::Sender<StatusUpdate> {
        &self.status_tx
    }
}
