//! Core ticket data types.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::TicketError;

/// Canonical ticket value grammar: a lowercase hyphenated UUID string.
static TICKET_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("ticket id pattern is valid")
});

// ============================================================================
// Stages
// ============================================================================

/// The processing stage of a share-clip job.
///
/// Stages are ordered: a ticket only ever moves forward through them, except
/// for `Failed`, which is reachable from any stage and has no position in the
/// ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketStage {
    /// Ticket created, job not yet picked up.
    Received,
    /// Job handed to a recording worker.
    Dispatched,
    /// Worker is replaying and recording the game-play.
    Recording,
    /// Raw recording finished, bytes available.
    Recorded,
    /// Recording is being uploaded to its public location.
    Uploading,
    /// Upload finished.
    Uploaded,
    /// Clip published, ticket redeemable.
    Completed,
    /// The requester has taken ownership of the clip location.
    Claimed,
    /// Processing failed.
    Failed,
}

impl TicketStage {
    /// Every stage, in rank order with `Failed` last.
    pub const ALL: [TicketStage; 9] = [
        TicketStage::Received,
        TicketStage::Dispatched,
        TicketStage::Recording,
        TicketStage::Recorded,
        TicketStage::Uploading,
        TicketStage::Uploaded,
        TicketStage::Completed,
        TicketStage::Claimed,
        TicketStage::Failed,
    ];

    /// Position in the forward ordering. `Failed` sits outside it.
    pub fn rank(self) -> Option<u8> {
        match self {
            TicketStage::Received => Some(0),
            TicketStage::Dispatched => Some(1),
            TicketStage::Recording => Some(2),
            TicketStage::Recorded => Some(3),
            TicketStage::Uploading => Some(4),
            TicketStage::Uploaded => Some(5),
            TicketStage::Completed => Some(6),
            TicketStage::Claimed => Some(7),
            TicketStage::Failed => None,
        }
    }

    /// Integer code used on the status-update wire.
    pub fn code(self) -> u8 {
        match self.rank() {
            Some(rank) => rank,
            None => 8,
        }
    }

    /// Decode a wire status code. Unknown codes yield `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(TicketStage::Received),
            1 => Some(TicketStage::Dispatched),
            2 => Some(TicketStage::Recording),
            3 => Some(TicketStage::Recorded),
            4 => Some(TicketStage::Uploading),
            5 => Some(TicketStage::Uploaded),
            6 => Some(TicketStage::Completed),
            7 => Some(TicketStage::Claimed),
            8 => Some(TicketStage::Failed),
            _ => None,
        }
    }

    /// Stage name as a string (for filtering and metric labels).
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStage::Received => "received",
            TicketStage::Dispatched => "dispatched",
            TicketStage::Recording => "recording",
            TicketStage::Recorded => "recorded",
            TicketStage::Uploading => "uploading",
            TicketStage::Uploaded => "uploaded",
            TicketStage::Completed => "completed",
            TicketStage::Claimed => "claimed",
            TicketStage::Failed => "failed",
        }
    }

    /// Returns true if no further transition is expected from this stage.
    pub fn is_terminal(self) -> bool {
        matches!(self, TicketStage::Claimed | TicketStage::Failed)
    }
}

/// Decides whether a stage change is legal.
///
/// Legal iff the requested stage ranks strictly higher than the current one,
/// or the requested stage is `Failed` (reachable from anywhere). Total, pure,
/// no side effects. Illegal requests are ignored by callers rather than
/// reported: at-least-once delivery makes duplicates and reordering routine.
fn transition_allowed(current: TicketStage, requested: TicketStage) -> bool {
    if requested == TicketStage::Failed {
        return true;
    }
    match (current.rank(), requested.rank()) {
        (Some(cur), Some(req)) => req > cur,
        _ => false,
    }
}

// ============================================================================
// Status
// ============================================================================

/// The current stage of a ticket plus the date-time milestones of every stage
/// it has ever entered.
///
/// Milestones are write-once: `None` until the stage is first entered, then
/// fixed. Mutation goes through [`Ticket::set_status`] and [`Ticket::claim`]
/// only; this type exposes no public mutators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketStatus {
    stage: TicketStage,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dispatched_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recording_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recorded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uploading_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uploaded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    claimed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failed_at: Option<DateTime<Utc>>,
}

impl TicketStatus {
    fn new() -> Self {
        Self {
            stage: TicketStage::Received,
            created_at: Utc::now(),
            dispatched_at: None,
            recording_at: None,
            recorded_at: None,
            uploading_at: None,
            uploaded_at: None,
            completed_at: None,
            claimed_at: None,
            failed_at: None,
        }
    }

    /// The current stage.
    pub fn stage(&self) -> TicketStage {
        self.stage
    }

    /// When the ticket was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the given stage was first entered, if it ever was.
    ///
    /// `Received` is entered at creation, so it always has a value.
    pub fn entered_at(&self, stage: TicketStage) -> Option<DateTime<Utc>> {
        match stage {
            TicketStage::Received => Some(self.created_at),
            TicketStage::Dispatched => self.dispatched_at,
            TicketStage::Recording => self.recording_at,
            TicketStage::Recorded => self.recorded_at,
            TicketStage::Uploading => self.uploading_at,
            TicketStage::Uploaded => self.uploaded_at,
            TicketStage::Completed => self.completed_at,
            TicketStage::Claimed => self.claimed_at,
            TicketStage::Failed => self.failed_at,
        }
    }

    /// Move to `next` if the transition is legal, stamping its milestone.
    ///
    /// Returns false with no mutation for stale, duplicate or otherwise
    /// illegal requests. Re-entering `Failed` is a no-op: milestones are
    /// write-once.
    fn advance(&mut self, next: TicketStage) -> bool {
        if self.stage == next || !transition_allowed(self.stage, next) {
            return false;
        }
        self.stage = next;
        let changed_at = Utc::now();
        let slot = match next {
            TicketStage::Received => None,
            TicketStage::Dispatched => Some(&mut self.dispatched_at),
            TicketStage::Recording => Some(&mut self.recording_at),
            TicketStage::Recorded => Some(&mut self.recorded_at),
            TicketStage::Uploading => Some(&mut self.uploading_at),
            TicketStage::Uploaded => Some(&mut self.uploaded_at),
            TicketStage::Completed => Some(&mut self.completed_at),
            TicketStage::Claimed => Some(&mut self.claimed_at),
            TicketStage::Failed => Some(&mut self.failed_at),
        };
        if let Some(slot) = slot {
            if slot.is_none() {
                *slot = Some(changed_at);
            }
        }
        true
    }

    /// Claim the ticket. Only meaningful from exactly `Completed`.
    fn claim(&mut self) -> bool {
        if self.stage == TicketStage::Completed {
            self.advance(TicketStage::Claimed)
        } else {
            false
        }
    }
}

// ============================================================================
// Gameplay info
// ============================================================================

/// The data a player posts when requesting a shareable clip of their
/// game-play.
///
/// Immutable once attached to a ticket. String fields are trimmed on
/// construction; the optional casino and cabinet type normalize to the empty
/// string when blank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameplayInfo {
    casino: String,
    cabinet_type: String,
    game_title: String,
    played_at: i64,
    cents_won: i64,
    recall_data: String,
}

impl GameplayInfo {
    /// Create a new gameplay info record.
    ///
    /// `played_at` is milliseconds since the epoch; `recall_data` is the
    /// opaque blob the worker needs to replay the game-play and is kept
    /// verbatim.
    pub fn new(
        played_at: i64,
        casino: impl Into<String>,
        cabinet_type: impl Into<String>,
        game_title: impl Into<String>,
        cents_won: i64,
        recall_data: impl Into<String>,
    ) -> Self {
        Self {
            casino: casino.into().trim().to_string(),
            cabinet_type: cabinet_type.into().trim().to_string(),
            game_title: game_title.into().trim().to_string(),
            played_at,
            cents_won,
            recall_data: recall_data.into(),
        }
    }

    /// The casino where the game-play happened (may be empty).
    pub fn casino(&self) -> &str {
        &self.casino
    }

    /// The cabinet type, e.g. atlas or retro (may be empty).
    pub fn cabinet_type(&self) -> &str {
        &self.cabinet_type
    }

    /// The game title.
    pub fn game_title(&self) -> &str {
        &self.game_title
    }

    /// When the game-play occurred (milliseconds since the epoch).
    pub fn played_at(&self) -> i64 {
        self.played_at
    }

    /// The amount won, in cents.
    pub fn cents_won(&self) -> i64 {
        self.cents_won
    }

    /// Opaque recall data needed to reconstruct the game-play.
    pub fn recall_data(&self) -> &str {
        &self.recall_data
    }
}

// ============================================================================
// Ticket
// ============================================================================

/// A ticket issued to a client requesting a shareable clip of their
/// game-play. The ticket is redeemed once the clip has been published and its
/// location is available.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    ticket_id: String,
    gameplay: GameplayInfo,
    status: TicketStatus,
    video_url: Option<String>,
    video_bytes: Option<Vec<u8>>,
    version: i64,
}

impl Ticket {
    /// Create a new ticket with a fresh unique ticket id, stage `Received`
    /// and version 0.
    pub fn create(gameplay: GameplayInfo) -> Self {
        Self {
            ticket_id: uuid::Uuid::new_v4().to_string(),
            gameplay,
            status: TicketStatus::new(),
            video_url: None,
            video_bytes: None,
            version: 0,
        }
    }

    /// Rehydrate a ticket from stored parts.
    pub(crate) fn from_parts(
        ticket_id: String,
        gameplay: GameplayInfo,
        status: TicketStatus,
        video_url: Option<String>,
        video_bytes: Option<Vec<u8>>,
        version: i64,
    ) -> Self {
        Self {
            ticket_id,
            gameplay,
            status,
            video_url,
            video_bytes,
            version,
        }
    }

    /// Reject ticket values that do not match the canonical grammar.
    ///
    /// Static and storage-independent: runs before any lookup so malformed
    /// input never reaches the store.
    pub fn validate_ticket_value(value: &str) -> Result<(), TicketError> {
        if TICKET_ID_PATTERN.is_match(value) {
            Ok(())
        } else {
            Err(TicketError::InvalidFormat(value.to_string()))
        }
    }

    /// The unique, externally facing ticket id.
    pub fn ticket_id(&self) -> &str {
        &self.ticket_id
    }

    /// The gameplay info this ticket was issued for.
    pub fn gameplay(&self) -> &GameplayInfo {
        &self.gameplay
    }

    /// Current status.
    pub fn status(&self) -> &TicketStatus {
        &self.status
    }

    /// Location of the published clip, set by the `Completed` transition.
    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    /// Raw recording bytes, set by the `Recorded` transition.
    pub fn video_bytes(&self) -> Option<&[u8]> {
        self.video_bytes.as_deref()
    }

    /// Optimistic concurrency version; bumped by the store on every save.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Apply a stage change. Returns whether anything changed; illegal
    /// transitions are ignored. Persisting afterwards is the caller's job.
    pub fn set_status(&mut self, stage: TicketStage) -> bool {
        self.status.advance(stage)
    }

    /// Claim this ticket. True only on the first call while `Completed`.
    pub fn claim(&mut self) -> bool {
        self.status.claim()
    }

    pub(crate) fn set_video_url(&mut self, url: String) {
        self.video_url = Some(url);
    }

    pub(crate) fn set_video_bytes(&mut self, bytes: Vec<u8>) {
        self.video_bytes = Some(bytes);
    }

    pub(crate) fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }
}
