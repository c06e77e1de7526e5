//! Application configuration management.

use serde::Deserialize;
use uuid::Uuid;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Detail code numbering offsets per instrument class.
    #[serde(default)]
    pub numbering: NumberingConfig,
    /// Explicit posting-code overrides (resolution tier 1).
    #[serde(default)]
    pub posting: PostingOverrides,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    #[serde(default)]
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Starting offsets for system-managed Detail code allocation.
///
/// Each instrument class scans for a free four-digit code from its own
/// offset, keeping the ranges disjoint as long as the offsets are spaced
/// wider than the instrument counts. The unique index on detail codes is
/// the final authority either way.
#[derive(Debug, Clone, Deserialize)]
pub struct NumberingConfig {
    /// First candidate code for bank account handler details.
    #[serde(default = "default_bank_account_offset")]
    pub bank_account_offset: u16,
    /// First candidate code for card reader handler details.
    #[serde(default = "default_card_reader_offset")]
    pub card_reader_offset: u16,
    /// First candidate code for cashbox handler details.
    #[serde(default = "default_cashbox_offset")]
    pub cashbox_offset: u16,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            bank_account_offset: default_bank_account_offset(),
            card_reader_offset: default_card_reader_offset(),
            cashbox_offset: default_cashbox_offset(),
        }
    }
}

fn default_bank_account_offset() -> u16 {
    6001
}

fn default_card_reader_offset() -> u16 {
    7001
}

fn default_cashbox_offset() -> u16 {
    8001
}

/// Explicit chart-of-accounts code overrides for the posting engine.
///
/// When set, these take precedence over named settings records and literal
/// fallback codes. Each identifier is verified to exist before use.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostingOverrides {
    /// Code node used for cash instrument lines.
    pub cash_code_id: Option<Uuid>,
    /// Code node used for card instrument lines.
    pub card_code_id: Option<Uuid>,
    /// Code node used for bank transfer instrument lines.
    pub transfer_code_id: Option<Uuid>,
    /// Code node used for check instrument lines.
    pub check_code_id: Option<Uuid>,
    /// Code node used for the counterparty line.
    pub counterparty_code_id: Option<Uuid>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DAFTAR").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
