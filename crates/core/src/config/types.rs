use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Job intake the worker listens on; required, there is no useful way to
    /// run the service without it.
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub ingress: IngressConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("clipshare.db")
}

/// Job intake dispatch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Well-known job intake URL (e.g. "http://localhost:9200/jobs")
    pub url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_dispatch_timeout")]
    pub timeout_secs: u32,
}

fn default_dispatch_timeout() -> u32 {
    30
}

/// Lifecycle service tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Ceiling for save retries on optimistic version conflicts.
    #[serde(default = "default_max_save_attempts")]
    pub max_save_attempts: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_save_attempts: default_max_save_attempts(),
        }
    }
}

fn default_max_save_attempts() -> usize {
    4
}

/// Status-update ingress tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngressConfig {
    /// Channel buffer between the transport adapter and the consumer.
    #[serde(default = "default_ingress_buffer")]
    pub buffer: usize,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            buffer: default_ingress_buffer(),
        }
    }
}

fn default_ingress_buffer() -> usize {
    256
}
