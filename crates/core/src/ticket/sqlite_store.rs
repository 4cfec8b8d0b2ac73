//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection};

use super::{GameplayInfo, Ticket, TicketError, TicketStage, TicketStatus, TicketStore};

const TICKET_COLUMNS: &str =
    "ticket_id, gameplay, status, video_url, video_bytes, version, created_at, updated_at";

/// SQLite-backed ticket store.
///
/// The optimistic version check lives in the `UPDATE ... WHERE version = ?`
/// predicate; SQLite's single-writer execution makes it atomic.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and
    /// tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                ticket_id TEXT PRIMARY KEY,
                gameplay TEXT NOT NULL,
                status TEXT NOT NULL,
                video_url TEXT,
                video_bytes BLOB,
                version INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_updated_at ON tickets(updated_at);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let ticket_id: String = row.get(0)?;
        let gameplay_json: String = row.get(1)?;
        let status_json: String = row.get(2)?;
        let video_url: Option<String> = row.get(3)?;
        let video_bytes: Option<Vec<u8>> = row.get(4)?;
        let version: i64 = row.get(5)?;

        let gameplay: GameplayInfo = serde_json::from_str(&gameplay_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let status: TicketStatus = serde_json::from_str(&status_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Ticket::from_parts(
            ticket_id,
            gameplay,
            status,
            video_url,
            video_bytes,
            version,
        ))
    }
}

impl TicketStore for SqliteTicketStore {
    fn insert(&self, ticket: &Ticket) -> Result<(), TicketError> {
        let conn = self.conn.lock().unwrap();

        let gameplay_json = serde_json::to_string(ticket.gameplay())
            .map_err(|e| TicketError::Database(e.to_string()))?;
        let status_json = serde_json::to_string(ticket.status())
            .map_err(|e| TicketError::Database(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            &format!("INSERT INTO tickets ({TICKET_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                ticket.ticket_id(),
                gameplay_json,
                status_json,
                ticket.video_url(),
                ticket.video_bytes(),
                ticket.version(),
                ticket.status().created_at().to_rfc3339(),
                now,
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(())
    }

    fn find_by_ticket_id(&self, ticket_id: &str) -> Result<Option<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_id = ?"),
            params![ticket_id],
            Self::row_to_ticket,
        );

        match result {
            Ok(ticket) => Ok(Some(ticket)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TicketError::Database(e.to_string())),
        }
    }

    fn save(&self, ticket: &Ticket) -> Result<Ticket, TicketError> {
        let conn = self.conn.lock().unwrap();

        let status_json = serde_json::to_string(ticket.status())
            .map_err(|e| TicketError::Database(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        let changed = conn
            .execute(
                "UPDATE tickets
                 SET status = ?, video_url = ?, video_bytes = ?, version = version + 1, updated_at = ?
                 WHERE ticket_id = ? AND version = ?",
                params![
                    status_json,
                    ticket.video_url(),
                    ticket.video_bytes(),
                    now,
                    ticket.ticket_id(),
                    ticket.version(),
                ],
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        if changed == 0 {
            let exists: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM tickets WHERE ticket_id = ?",
                    params![ticket.ticket_id()],
                    |row| row.get(0),
                )
                .map_err(|e| TicketError::Database(e.to_string()))?;

            return Err(if exists > 0 {
                TicketError::Conflict {
                    ticket_id: ticket.ticket_id().to_string(),
                    version: ticket.version(),
                }
            } else {
                TicketError::NotFound(ticket.ticket_id().to_string())
            });
        }

        Ok(ticket.clone().with_version(ticket.version() + 1))
    }

    fn count_by_stage(&self, stage: TicketStage) -> Result<i64, TicketError> {
        let conn = self.conn.lock().unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM tickets WHERE json_extract(status, '$.stage') = ?",
                params![stage.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(count)
    }
}
