//! Configuration management for the Pharmacy Inventory Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PIM_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Report windows and exemptions
    pub reports: ReportsConfig,

    /// Master cleanup policy
    pub cleanup: CleanupConfig,
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
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportsConfig {
    /// Days without dispensing before a group counts as dead stock
    pub dead_stock_lookback_days: u32,

    /// Days of dispensing history used for reorder points
    pub usage_window_days: u32,

    /// Days of stock a reorder point should cover
    pub coverage_days: u32,

    /// Usage classes that never need verification in valuation
    pub valuation_exempt_usage_classes: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CleanupConfig {
    /// Days without movement before a zero-stock master may be deleted
    pub idle_days: u32,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("PIM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8080)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("reports.dead_stock_lookback_days", 90)?
            .set_default("reports.usage_window_days", 90)?
            .set_default("reports.coverage_days", 14)?
            .set_default("reports.valuation_exempt_usage_classes", vec!["5", "6"])?
            .set_default("cleanup.idle_days", 365)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PIM_ prefix)
            .add_source(
                Environment::with_prefix("PIM")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("reports.valuation_exempt_usage_classes"),
            )
            .build()?;

        config.try_deserialize()
    }
}
