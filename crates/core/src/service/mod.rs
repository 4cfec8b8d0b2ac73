//! Ticket lifecycle orchestration.
//!
//! Every mutating operation follows the same pattern: load the ticket,
//! mutate the in-memory copy, save it with the store's optimistic version
//! check, and retry the whole cycle from a fresh load on a version conflict.
//! Retries are bounded; only true write conflicts are retried, never
//! application-level rejections.

use std::collections::HashMap;
use std::sync::Arc;

use crate::dispatch::{JobDispatcher, RecallJob};
use crate::metrics;
use crate::ticket::{GameplayInfo, Ticket, TicketError, TicketStage, TicketStore};

/// Default ceiling for save retries on version conflicts.
pub const DEFAULT_MAX_SAVE_ATTEMPTS: usize = 4;

/// Extra payload carried by the two status updates that have one.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusPayload {
    /// Raw recording bytes, delivered with the `Recorded` update.
    VideoBytes(Vec<u8>),
    /// Published clip location, delivered with the `Completed` update.
    VideoUrl(String),
}

/// Orchestrates ticket creation, status ingestion and redemption against the
/// store and the job dispatcher.
pub struct TicketService {
    store: Arc<dyn TicketStore>,
    dispatcher: Arc<dyn JobDispatcher>,
    max_save_attempts: usize,
}

impl TicketService {
    /// Create a service with the default retry ceiling.
    pub fn new(store: Arc<dyn TicketStore>, dispatcher: Arc<dyn JobDispatcher>) -> Self {
        Self {
            store,
            dispatcher,
            max_save_attempts: DEFAULT_MAX_SAVE_ATTEMPTS,
        }
    }

    /// Override the save-retry ceiling.
    pub fn with_max_save_attempts(mut self, max_save_attempts: usize) -> Self {
        self.max_save_attempts = max_save_attempts.max(1);
        self
    }

    /// Create a ticket for the given gameplay and notify the worker intake.
    ///
    /// The ticket is persisted before the job is dispatched, so a status
    /// update can never reference a ticket that is not yet durable. When
    /// dispatch fails the ticket is marked `Failed` and the submission as a
    /// whole fails: a live ticket that no worker will ever service must not
    /// be left behind.
    pub async fn submit(&self, gameplay: GameplayInfo) -> Result<Ticket, TicketError> {
        let ticket = Ticket::create(gameplay);
        self.store.insert(&ticket)?;

        let job = RecallJob::for_ticket(&ticket);
        if let Err(e) = self.dispatcher.dispatch(job).await {
            metrics::DISPATCH_FAILURES.inc();
            tracing::error!(ticket_id = %ticket.ticket_id(), "job dispatch failed: {e}");
            if let Err(mark_err) =
                self.apply_status_update(ticket.ticket_id(), TicketStage::Failed, None)
            {
                tracing::warn!(
                    ticket_id = %ticket.ticket_id(),
                    "could not mark undispatched ticket as failed: {mark_err}"
                );
            }
            return Err(TicketError::Dispatch(e.to_string()));
        }

        metrics::TICKETS_CREATED.inc();
        tracing::info!(ticket_id = %ticket.ticket_id(), "share-clip job submitted");
        Ok(ticket)
    }

    /// Apply an asynchronously delivered status update.
    ///
    /// Illegal transitions (duplicates, reordered deliveries) are silently
    /// ignored: nothing is saved and the call succeeds. The payload is
    /// attached only when the matching transition actually applies, so a
    /// duplicate `Completed` can never overwrite an already recorded clip
    /// location.
    pub fn apply_status_update(
        &self,
        ticket_id: &str,
        stage: TicketStage,
        payload: Option<StatusPayload>,
    ) -> Result<(), TicketError> {
        let mut last_conflict = None;

        for attempt in 1..=self.max_save_attempts {
            let mut ticket = self.load(ticket_id)?;

            if !ticket.set_status(stage) {
                tracing::debug!(
                    ticket_id,
                    stage = stage.as_str(),
                    current = ticket.status().stage().as_str(),
                    "ignoring stale or out-of-order status update"
                );
                metrics::STATUS_UPDATES_IGNORED.inc();
                return Ok(());
            }

            match (&payload, stage) {
                (Some(StatusPayload::VideoBytes(bytes)), TicketStage::Recorded) => {
                    ticket.set_video_bytes(bytes.clone());
                }
                (Some(StatusPayload::VideoUrl(url)), TicketStage::Completed) => {
                    ticket.set_video_url(url.clone());
                }
                (Some(_), _) => {
                    tracing::warn!(
                        ticket_id,
                        stage = stage.as_str(),
                        "discarding payload on a status update that carries none"
                    );
                }
                (None, _) => {}
            }

            match self.store.save(&ticket) {
                Ok(_) => {
                    metrics::STATUS_UPDATES_APPLIED
                        .with_label_values(&[stage.as_str()])
                        .inc();
                    return Ok(());
                }
                Err(conflict @ TicketError::Conflict { .. }) => {
                    metrics::SAVE_CONFLICTS.inc();
                    tracing::debug!(
                        ticket_id,
                        attempt,
                        "version conflict applying status update, reloading"
                    );
                    last_conflict = Some(conflict);
                }
                Err(e) => return Err(e),
            }
        }

        metrics::SAVE_RETRIES_EXHAUSTED.inc();
        tracing::error!(
            ticket_id,
            attempts = self.max_save_attempts,
            "status update retry budget exhausted"
        );
        Err(last_conflict
            .unwrap_or_else(|| TicketError::Database("retry budget exhausted".to_string())))
    }

    /// Redeem a ticket, claiming it when it has completed.
    ///
    /// Returns the published clip location regardless of whether this call
    /// performed the claim or a previous one did; `None` while the job has
    /// not completed. Idempotent from the caller's point of view.
    pub fn redeem(&self, ticket_id: &str) -> Result<Option<String>, TicketError> {
        self.claim_if_completed(ticket_id)
    }

    /// Poll a batch of tickets for completion.
    ///
    /// Best-effort: unknown and unfinished tickets are simply omitted from
    /// the result, never reported as errors. Completed tickets are included
    /// with their clip location and claimed as a side effect.
    pub fn redeem_batch(
        &self,
        ticket_ids: &[String],
    ) -> Result<HashMap<String, String>, TicketError> {
        let mut completed = HashMap::new();

        for ticket_id in ticket_ids {
            let Some(ticket) = self.store.find_by_ticket_id(ticket_id)? else {
                continue;
            };
            let Some(url) = ticket.video_url() else {
                continue;
            };
            completed.insert(ticket_id.clone(), url.to_string());

            // The location is already in the result; a claim that loses every
            // retry must not drop the entry or fail the batch.
            if let Err(e) = self.claim_if_completed(ticket_id) {
                tracing::warn!(%ticket_id, "claim during batch redemption failed: {e}");
            }
        }

        Ok(completed)
    }

    fn load(&self, ticket_id: &str) -> Result<Ticket, TicketError> {
        self.store
            .find_by_ticket_id(ticket_id)?
            .ok_or_else(|| TicketError::NotFound(ticket_id.to_string()))
    }

    /// Claim the ticket when eligible and return its current clip location.
    fn claim_if_completed(&self, ticket_id: &str) -> Result<Option<String>, TicketError> {
        let mut last_conflict = None;

        for attempt in 1..=self.max_save_attempts {
            let mut ticket = self.load(ticket_id)?;

            if !ticket.claim() {
                // Not yet completed, or already claimed. Either way the
                // current location is the answer.
                return Ok(ticket.video_url().map(str::to_string));
            }

            match self.store.save(&ticket) {
                Ok(saved) => {
                    metrics::TICKETS_CLAIMED.inc();
                    tracing::info!(ticket_id, "ticket claimed");
                    return Ok(saved.video_url().map(str::to_string));
                }
                Err(conflict @ TicketError::Conflict { .. }) => {
                    metrics::SAVE_CONFLICTS.inc();
                    tracing::debug!(ticket_id, attempt, "version conflict claiming, reloading");
                    last_conflict = Some(conflict);
                }
                Err(e) => return Err(e),
            }
        }

        metrics::SAVE_RETRIES_EXHAUSTED.inc();
        Err(last_conflict
            .unwrap_or_else(|| TicketError::Database("retry budget exhausted".to_string())))
    }
}
