//! Configuration management for the fabric warehouse tracker
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with FWH_ prefix

use chrono::FixedOffset;
use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Session token configuration
    pub jwt: JwtConfig,

    /// Warehouse-local settings
    pub warehouse: WarehouseConfig,

    /// Label printer configuration
    pub printer: PrinterConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection before reporting the store unreachable
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing session tokens
    pub secret: String,

    /// Session token lifetime in seconds (one working shift by default)
    pub session_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WarehouseConfig {
    /// Local UTC offset of the warehouse in minutes (420 = UTC+7)
    pub utc_offset_minutes: i32,
}

impl WarehouseConfig {
    pub fn offset(&self) -> FixedOffset {
        shared::offset_from_minutes(self.utc_offset_minutes)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PrinterConfig {
    /// Label printer host (raw TCP)
    pub host: String,

    /// Label printer port
    pub port: u16,

    /// Connection timeout in milliseconds
    pub timeout_ms: u64,

    /// QR module size in dots (1-16)
    pub qr_module_size: u8,
}

impl PrinterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("FWH_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("database.max_connections", 5)?
            .set_default("database.min_connections", 1)?
            .set_default("database.acquire_timeout_secs", 10)?
            .set_default("jwt.session_token_expiry", 43200)?
            .set_default("warehouse.utc_offset_minutes", 420)?
            .set_default("printer.host", "127.0.0.1")?
            .set_default("printer.port", 9100)?
            .set_default("printer.timeout_ms", 5000)?
            .set_default("printer.qr_module_size", 6)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (FWH_ prefix)
            .add_source(
                Environment::with_prefix("FWH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "127.0.0.1".to_string(),
        }
    }
}
