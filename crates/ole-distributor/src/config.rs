//! Distributor configuration.
//!
//! [`DistributorConfig`] is the raw, string-typed form read from an optional
//! TOML file and `OLE_`-prefixed environment variables (environment wins).
//! [`DistributorConfig::validate`] turns it into typed [`Settings`].

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use ole_core::constants::{
    DEFAULT_MAX_PRICE_DEVIATION_BPS, DEFAULT_MIN_LOCK_DURATION, MAX_LOCK_DURATION,
    PERCENT_DIVISOR,
};
use ole_core::types::AccountId;

/// Environment variable prefix, e.g. `OLE_ADMIN`, `OLE_MIN_LOCK_DURATION`.
pub const ENV_PREFIX: &str = "OLE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)] Load(#[from] config::ConfigError),
    #[error("invalid {field} account: {source}")] InvalidAccount { field: &'static str, source: hex::FromHexError },
    #[error("max_price_deviation_bps {0} exceeds 10000")] DeviationOutOfRange(u64),
    #[error("min_lock_duration {0} exceeds the maximum lock duration")] MinLockOutOfRange(u64),
    #[error("unknown log format {0:?}")] LogFormat(String),
}

/// Raw configuration as deserialized from file and environment.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DistributorConfig {
    /// Hex account id of the administrator.
    pub admin: String,
    /// Hex account id allowed to create epochs besides the admin.
    #[serde(default)]
    pub operator: Option<String>,
    /// Hex account id of the escrow holding principal.
    pub escrow: String,
    #[serde(default = "default_min_lock_duration")]
    pub min_lock_duration: u64,
    #[serde(default = "default_max_price_deviation_bps")]
    pub max_price_deviation_bps: u64,
    /// Log level filter string (e.g. "info", "ole_distributor=debug").
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_min_lock_duration() -> u64 {
    DEFAULT_MIN_LOCK_DURATION
}

fn default_max_price_deviation_bps() -> u64 {
    DEFAULT_MAX_PRICE_DEVIATION_BPS
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl DistributorConfig {
    /// Load from `path` (if given) layered under `OLE_*` environment variables.
    ///
    /// Environment values stay strings; numeric fields are parsed during
    /// deserialization so hex account ids are never read as numbers.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_layered(path, config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load_layered(path: Option<&Path>, env: config::Environment) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let cfg = builder.add_source(env).build()?;
        Ok(cfg.try_deserialize()?)
    }

    /// Parse account ids and check numeric bounds.
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let admin = parse_account("admin", &self.admin)?;
        let escrow = parse_account("escrow", &self.escrow)?;
        let operator = self
            .operator
            .as_deref()
            .map(|s| parse_account("operator", s))
            .transpose()?;

        if self.max_price_deviation_bps > PERCENT_DIVISOR {
            return Err(ConfigError::DeviationOutOfRange(self.max_price_deviation_bps));
        }
        if self.min_lock_duration > MAX_LOCK_DURATION {
            return Err(ConfigError::MinLockOutOfRange(self.min_lock_duration));
        }
        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(ConfigError::LogFormat(self.log_format.clone()));
        }

        Ok(Settings {
            admin,
            operator,
            escrow,
            min_lock_duration: self.min_lock_duration,
            max_price_deviation_bps: self.max_price_deviation_bps,
        })
    }
}

fn parse_account(field: &'static str, value: &str) -> Result<AccountId, ConfigError> {
    AccountId::from_hex(value).map_err(|source| ConfigError::InvalidAccount { field, source })
}

/// Validated initial settings for a [`Distributor`](crate::Distributor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub admin: AccountId,
    pub operator: Option<AccountId>,
    pub escrow: AccountId,
    pub min_lock_duration: u64,
    pub max_price_deviation_bps: u64,
}

impl Settings {
    /// Settings with no operator and default conversion guards.
    pub fn new(admin: AccountId, escrow: AccountId) -> Self {
        Self {
            admin,
            operator: None,
            escrow,
            min_lock_duration: DEFAULT_MIN_LOCK_DURATION,
            max_price_deviation_bps: DEFAULT_MAX_PRICE_DEVIATION_BPS,
        }
    }

    pub fn with_operator(mut self, operator: AccountId) -> Self {
        self.operator = Some(operator);
        self
    }
}
