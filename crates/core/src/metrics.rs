//! Prometheus metrics for the ticket lifecycle.

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts};

/// Tickets created since startup.
pub static TICKETS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("clipshare_tickets_created_total", "Total tickets created").unwrap()
});

/// Tickets claimed by their requester.
pub static TICKETS_CLAIMED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("clipshare_tickets_claimed_total", "Total tickets claimed").unwrap()
});

/// Status updates applied, by entered stage.
pub static STATUS_UPDATES_APPLIED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "clipshare_status_updates_applied_total",
            "Status updates that advanced a ticket",
        ),
        &["stage"],
    )
    .unwrap()
});

/// Status updates ignored as stale, duplicate or out of order.
pub static STATUS_UPDATES_IGNORED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipshare_status_updates_ignored_total",
        "Status updates ignored as stale or out of order",
    )
    .unwrap()
});

/// Status updates referencing a ticket that does not exist.
pub static STATUS_UPDATES_UNKNOWN_TICKET: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipshare_status_updates_unknown_ticket_total",
        "Status updates for unknown tickets",
    )
    .unwrap()
});

/// Status updates carrying a status code outside the known range.
pub static STATUS_UPDATES_UNKNOWN_CODE: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipshare_status_updates_unknown_code_total",
        "Status updates with an unknown status code",
    )
    .unwrap()
});

/// Optimistic save conflicts observed (each is retried).
pub static SAVE_CONFLICTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipshare_save_conflicts_total",
        "Optimistic version conflicts on save",
    )
    .unwrap()
});

/// Operations that exhausted their save-retry budget.
pub static SAVE_RETRIES_EXHAUSTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipshare_save_retries_exhausted_total",
        "Operations that ran out of save retries",
    )
    .unwrap()
});

/// Job dispatch failures (each fails the submission).
pub static DISPATCH_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "clipshare_dispatch_failures_total",
        "Job intake notifications that could not be delivered",
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TICKETS_CREATED.clone()),
        Box::new(TICKETS_CLAIMED.clone()),
        Box::new(STATUS_UPDATES_APPLIED.clone()),
        Box::new(STATUS_UPDATES_IGNORED.clone()),
        Box::new(STATUS_UPDATES_UNKNOWN_TICKET.clone()),
        Box::new(STATUS_UPDATES_UNKNOWN_CODE.clone()),
        Box::new(SAVE_CONFLICTS.clone()),
        Box::new(SAVE_RETRIES_EXHAUSTED.clone()),
        Box::new(DISPATCH_FAILURES.clone()),
    ]
}
