//! Status-update intake.
//!
//! The HTTP face of the queue boundary: the worker (or a broker bridge)
//! posts one request per status message, and the handler only decodes and
//! enqueues. Applying the update, including its retry and ordering rules,
//! happens in the ingress consumer.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use clipshare_core::{StatusPayload, StatusUpdate, Ticket, TicketStage};

use crate::state::AppState;

/// Acknowledgement for an enqueued status update
#[derive(Debug, Serialize)]
pub struct StatusAccepted {
    pub ticket_id: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct StatusErrorResponse {
    pub error: String,
}

/// Accept one status update for a ticket.
///
/// The body is the raw recording for a `Recorded` update and the published
/// clip location for a `Completed` update; every other update has an empty
/// body. Whether the ticket exists is deliberately not revealed here; unknown
/// tickets surface in the consumer as a logged drop.
pub async fn submit_status_update(
    State(state): State<Arc<AppState>>,
    Path((ticket_value, code)): Path<(String, u8)>,
    body: Bytes,
) -> Result<(StatusCode, Json<StatusAccepted>), (StatusCode, Json<StatusErrorResponse>)> {
    if let Err(e) = Ticket::validate_ticket_value(&ticket_value) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(StatusErrorResponse {
                error: e.to_string(),
            }),
        ));
    }

    let payload = match TicketStage::from_code(code) {
        Some(TicketStage::Recorded) if !body.is_empty() => {
            Some(StatusPayload::VideoBytes(body.to_vec()))
        }
        Some(TicketStage::Completed) if !body.is_empty() => Some(StatusPayload::VideoUrl(
            String::from_utf8_lossy(&body).trim().to_string(),
        )),
        _ => None,
    };

    let update = StatusUpdate {
        ticket_id: ticket_value.clone(),
        status_code: code,
        payload,
    };

    if state.status_tx().send(update).await.is_err() {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusErrorResponse {
                error: "status ingress unavailable".to_string(),
            }),
        ));
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(StatusAccepted {
            ticket_id: ticket_value,
        }),
    ))
}
