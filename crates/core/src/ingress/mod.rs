//! Asynchronous status-update consumption.
//!
//! The transport (queue consumer, HTTP adapter, test harness) pushes decoded
//! [`StatusUpdate`] messages into a channel; the ingress drains it and routes
//! each message into the lifecycle service. Delivery is at-least-once with no
//! ordering guarantee, which the service tolerates by design.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::metrics;
use crate::service::{StatusPayload, TicketService};
use crate::ticket::{TicketError, TicketStage};

/// One status message for a ticket, as decoded off the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    /// Ticket the update refers to.
    pub ticket_id: String,
    /// Integer job-status code (see [`TicketStage::from_code`]).
    pub status_code: u8,
    /// Extra payload; present only for `Recorded` (bytes) and `Completed`
    /// (location).
    pub payload: Option<StatusPayload>,
}

/// Background consumer routing status updates into the lifecycle service.
///
/// Spawn with `tokio::spawn(ingress.run())`; the loop ends when every sender
/// for the channel has been dropped.
pub struct StatusUpdateIngress {
    service: Arc<TicketService>,
    rx: mpsc::Receiver<StatusUpdate>,
    dead_letter: Option<mpsc::Sender<StatusUpdate>>,
}

impl StatusUpdateIngress {
    /// Create an ingress draining `rx` into `service`.
    pub fn new(service: Arc<TicketService>, rx: mpsc::Receiver<StatusUpdate>) -> Self {
        Self {
            service,
            rx,
            dead_letter: None,
        }
    }

    /// Forward updates that exhaust their retry budget to a dead-letter
    /// channel instead of dropping them with only a log line.
    pub fn with_dead_letter(mut self, tx: mpsc::Sender<StatusUpdate>) -> Self {
        self.dead_letter = Some(tx);
        self
    }

    /// Consume updates until the channel closes.
    pub async fn run(mut self) {
        tracing::info!("status update ingress started");

        while let Some(update) = self.rx.recv().await {
            self.handle(update).await;
        }

        tracing::info!("status update ingress shutting down");
    }

    async fn handle(&self, update: StatusUpdate) {
        let Some(stage) = TicketStage::from_code(update.status_code) else {
            metrics::STATUS_UPDATES_UNKNOWN_CODE.inc();
            tracing::warn!(
                ticket_id = %update.ticket_id,
                code = update.status_code,
                "dropping status update with unknown status code"
            );
            return;
        };

        tracing::debug!(
            ticket_id = %update.ticket_id,
            stage = stage.as_str(),
            "received status update"
        );

        match self
            .service
            .apply_status_update(&update.ticket_id, stage, update.payload.clone())
        {
            Ok(()) => {}
            Err(TicketError::NotFound(_)) => {
                // Unknown tickets must not crash or wedge the consumer; they
                // are logged and the message is consumed.
                metrics::STATUS_UPDATES_UNKNOWN_TICKET.inc();
                tracing::warn!(
                    ticket_id = %update.ticket_id,
                    stage = stage.as_str(),
                    "status update for unknown ticket"
                );
            }
            Err(e) => {
                tracing::error!(
                    ticket_id = %update.ticket_id,
                    stage = stage.as_str(),
                    "failed to apply status update: {e}"
                );
                if let Some(tx) = &self.dead_letter {
                    if tx.send(update).await.is_err() {
                        tracing::error!("dead letter channel closed, dropping status update");
                    }
                }
            }
        }
    }
}
