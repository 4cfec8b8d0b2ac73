//! Outbound job dispatch to the recording worker intake.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DispatchConfig;
use crate::ticket::Ticket;

/// The "new job" notification sent exactly once per created ticket,
/// addressed to the well-known job intake destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecallJob {
    /// Ticket the job belongs to.
    pub ticket_id: String,
    /// Opaque blob the worker needs to replay the game-play.
    pub recall_data: String,
    /// Game title, for the worker's overlay/metadata.
    pub game_title: String,
    /// Casino name (may be empty).
    pub casino: String,
    /// Cabinet type (may be empty).
    pub cabinet_type: String,
    /// When the game-play occurred (milliseconds since the epoch).
    pub played_at: i64,
}

impl RecallJob {
    /// Build the job notification for a freshly created ticket.
    pub fn for_ticket(ticket: &Ticket) -> Self {
        let gameplay = ticket.gameplay();
        Self {
            ticket_id: ticket.ticket_id().to_string(),
            recall_data: gameplay.recall_data().to_string(),
            game_title: gameplay.game_title().to_string(),
            casino: gameplay.casino().to_string(),
            cabinet_type: gameplay.cabinet_type().to_string(),
            played_at: gameplay.played_at(),
        }
    }
}

/// Errors raised while delivering a job notification.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The intake could not be reached.
    #[error("job intake unreachable: {0}")]
    Transport(String),

    /// The intake answered with a non-success status.
    #[error("job intake rejected the job with status {status}")]
    Rejected {
        /// HTTP status returned by the intake.
        status: u16,
    },
}

/// Sends the "new job" notification for a created ticket.
///
/// Implementations must deliver at most once per call; the service calls
/// dispatch exactly once per created ticket and fails the creation when
/// delivery fails.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    /// Deliver one job notification.
    async fn dispatch(&self, job: RecallJob) -> Result<(), DispatchError>;
}

/// HTTP dispatcher posting jobs to the configured intake URL as JSON.
pub struct HttpDispatcher {
    config: DispatchConfig,
    client: reqwest::Client,
}

impl HttpDispatcher {
    /// Create a dispatcher for the given intake configuration.
    pub fn new(config: DispatchConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_secs)))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }
}

#[async_trait]
impl JobDispatcher for HttpDispatcher {
    async fn dispatch(&self, job: RecallJob) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(&self.config.url)
            .json(&job)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DispatchError::Rejected {
                status: response.status().as_u16(),
            });
        }

        tracing::debug!(ticket_id = %job.ticket_id, "dispatched share-clip job");
        Ok(())
    }
}
