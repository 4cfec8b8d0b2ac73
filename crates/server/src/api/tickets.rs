//! Ticket API handlers.

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use clipshare_core::{GameplayInfo, Ticket, TicketError, TicketStatus};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a ticket
#[derive(Debug, Deserialize)]
pub struct CreateTicketBody {
    /// Casino where the game-play happened (optional)
    pub casino: Option<String>,
    /// Cabinet type, e.g. atlas or retro (optional)
    pub cabinet_type: Option<String>,
    /// Game title
    pub game_title: String,
    /// When the game-play occurred (milliseconds since the epoch)
    pub played_at: i64,
    /// Amount won, in cents
    pub cents_won: i64,
    /// Opaque recall data needed to replay the game-play
    pub recall_data: String,
}

/// Response for ticket operations
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub ticket_id: String,
    pub status: TicketStatus,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            ticket_id: ticket.ticket_id().to_string(),
            status: ticket.status().clone(),
        }
    }
}

/// Response for single-ticket redemption
#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub ticket_id: String,
    /// Location of the published clip; null until the job completes
    pub video_url: Option<String>,
}

/// Response for batch redemption
#[derive(Debug, Serialize)]
pub struct RedeemBatchResponse {
    /// Completed tickets only, mapped to their clip location
    pub completed: HashMap<String, String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct TicketErrorResponse {
    pub error: String,
}

fn error_response(e: &TicketError) -> (StatusCode, Json<TicketErrorResponse>) {
    let (status, message) = match e {
        TicketError::InvalidFormat(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        TicketError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        TicketError::Dispatch(_) => (
            StatusCode::BAD_GATEWAY,
            "could not hand the job to the recording worker".to_string(),
        ),
        // Store internals stay internal.
        TicketError::Conflict { .. } | TicketError::Database(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
        }
    };
    (status, Json(TicketErrorResponse { error: message }))
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new ticket and dispatch its recording job
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTicketBody>,
) -> Result<(StatusCode, Json<TicketResponse>), (StatusCode, Json<TicketErrorResponse>)> {
    let gameplay = GameplayInfo::new(
        body.played_at,
        body.casino.unwrap_or_default(),
        body.cabinet_type.unwrap_or_default(),
        body.game_title,
        body.cents_won,
        body.recall_data,
    );

    match state.service().submit(gameplay).await {
        Ok(ticket) => Ok((StatusCode::CREATED, Json(TicketResponse::from(ticket)))),
        Err(e) => Err(error_response(&e)),
    }
}

/// Redeem a ticket, claiming it when its clip has been published
pub async fn redeem_ticket(
    State(state): State<Arc<AppState>>,
    Path(ticket_value): Path<String>,
) -> Response {
    // Cheap grammar check before the store is ever involved.
    if let Err(e) = Ticket::validate_ticket_value(&ticket_value) {
        return error_response(&e).into_response();
    }

    match state.service().redeem(&ticket_value) {
        Ok(video_url) => {
            let body = Json(RedeemResponse {
                ticket_id: ticket_value,
                video_url: video_url.clone(),
            });
            let mut response = (StatusCode::OK, body).into_response();
            if let Some(url) = video_url {
                if let Ok(value) = HeaderValue::from_str(&url) {
                    response.headers_mut().insert(header::LOCATION, value);
                }
            }
            response
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// Poll a comma-separated batch of tickets for completion
pub async fn redeem_tickets(
    State(state): State<Arc<AppState>>,
    Path(tickets): Path<String>,
) -> Result<Json<RedeemBatchResponse>, (StatusCode, Json<TicketErrorResponse>)> {
    // Malformed values are dropped silently; they never reach the service.
    let valid: Vec<String> = tickets
        .split(',')
        .map(str::trim)
        .filter(|value| Ticket::validate_ticket_value(value).is_ok())
        .map(String::from)
        .collect();

    match state.service().redeem_batch(&valid) {
        Ok(completed) => Ok(Json(RedeemBatchResponse { completed })),
        Err(e) => Err(error_response(&e)),
    }
}
