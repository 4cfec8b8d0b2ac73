//! Core domain for the clipshare service: tickets for long-running
//! share-clip jobs, the store and dispatch boundaries, and the lifecycle
//! service that keeps them consistent under concurrent, at-least-once
//! status delivery.

pub mod config;
pub mod dispatch;
pub mod ingress;
pub mod metrics;
pub mod service;
pub mod testing;
pub mod ticket;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    DispatchConfig, IngressConfig, ServerConfig, ServiceConfig,
};
pub use dispatch::{DispatchError, HttpDispatcher, JobDispatcher, RecallJob};
pub use ingress::{StatusUpdate, StatusUpdateIngress};
pub use service::{StatusPayload, TicketService};
pub use ticket::{
    GameplayInfo, SqliteTicketStore, Ticket, TicketError, TicketStage, TicketStatus, TicketStore,
};
