//! Configuration system (layered: code > env > TOML file > defaults).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::RelayError;

pub const DEFAULT_MAX_TURNS: usize = 16;
pub const DEFAULT_TURN_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_TRANSIENT_RETRIES: u32 = 1;
pub const DEFAULT_MAX_CLARIFICATION_ROUNDS: u32 = 3;

/// Layered configuration for relay.
///
/// Resolution order:
/// 1. Explicit values set in code (`with_*`)
/// 2. Environment variables (`RELAY_*`, `.env` honoured)
/// 3. `relay.toml` (explicit path, or `~/.relay/relay.toml`)
/// 4. Built-in defaults
#[derive(Clone)]
pub struct RelayConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_turns: usize,
    pub turn_timeout_ms: u64,
    pub transient_retries: u32,
    pub max_clarification_rounds: u32,
    pub debug_mode: bool,
    pub customer_id: String,
    pub account_id: String,
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("base_url", &self.base_url)
            .field("max_turns", &self.max_turns)
            .field("turn_timeout_ms", &self.turn_timeout_ms)
            .field("transient_retries", &self.transient_retries)
            .field("max_clarification_rounds", &self.max_clarification_rounds)
            .field("debug_mode", &self.debug_mode)
            .field("customer_id", &self.customer_id)
            .field("account_id", &self.account_id)
            .finish()
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            max_turns: DEFAULT_MAX_TURNS,
            turn_timeout_ms: DEFAULT_TURN_TIMEOUT_MS,
            transient_retries: DEFAULT_TRANSIENT_RETRIES,
            max_clarification_rounds: DEFAULT_MAX_CLARIFICATION_ROUNDS,
            debug_mode: false,
            customer_id: "cust-1".to_string(),
            account_id: "acct-123".to_string(),
        }
    }
}

/// On-disk shape of `relay.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_key: Option<String>,
    base_url: Option<String>,
    max_turns: Option<usize>,
    turn_timeout_ms: Option<u64>,
    transient_retries: Option<u32>,
    max_clarification_rounds: Option<u32>,
    debug_mode: Option<bool>,
    customer_id: Option<String>,
    account_id: Option<String>,
}

impl RelayConfig {
    /// Defaults, then the default config file (if any), then the environment.
    pub fn load() -> Result<Self, RelayError> {
        Self::load_from(None)
    }

    /// Like [`RelayConfig::load`], reading `path` instead of the default file.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load_from(path: Option<&Path>) -> Result<Self, RelayError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();
        match path {
            Some(path) => config.merge_file(path)?,
            None => {
                let default = default_config_path();
                if default.exists() {
                    config.merge_file(&default)?;
                }
            }
        }
        config.merge_env(|key| std::env::var(key).ok())?;
        tracing::debug!(config = ?config, "relay config loaded");
        Ok(config)
    }

    /// Overlay values from a TOML file.
    pub fn merge_file(&mut self, path: &Path) -> Result<(), RelayError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RelayError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let file: FileConfig = toml::from_str(&raw).map_err(|e| {
            RelayError::Configuration(format!("invalid {}: {e}", path.display()))
        })?;

        if file.api_key.is_some() {
            self.api_key = file.api_key;
        }
        if file.base_url.is_some() {
            self.base_url = file.base_url;
        }
        if let Some(v) = file.max_turns {
            self.max_turns = v;
        }
        if let Some(v) = file.turn_timeout_ms {
            self.turn_timeout_ms = v;
        }
        if let Some(v) = file.transient_retries {
            self.transient_retries = v;
        }
        if let Some(v) = file.max_clarification_rounds {
            self.max_clarification_rounds = v;
        }
        if let Some(v) = file.debug_mode {
            self.debug_mode = v;
        }
        if let Some(v) = file.customer_id {
            self.customer_id = v;
        }
        if let Some(v) = file.account_id {
            self.account_id = v;
        }
        self.validate()
    }

    /// Overlay `RELAY_*` variables read through `lookup`.
    pub fn merge_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), RelayError> {
        if let Some(v) = lookup("RELAY_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = lookup("RELAY_BASE_URL") {
            self.base_url = Some(v);
        }
        if let Some(v) = lookup("RELAY_MAX_TURNS") {
            self.max_turns = parse_number("RELAY_MAX_TURNS", &v)?;
        }
        if let Some(v) = lookup("RELAY_TURN_TIMEOUT_MS") {
            self.turn_timeout_ms = parse_number("RELAY_TURN_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("RELAY_TRANSIENT_RETRIES") {
            self.transient_retries = parse_number("RELAY_TRANSIENT_RETRIES", &v)?;
        }
        if let Some(v) = lookup("RELAY_MAX_CLARIFICATION_ROUNDS") {
            self.max_clarification_rounds = parse_number("RELAY_MAX_CLARIFICATION_ROUNDS", &v)?;
        }
        if let Some(v) = lookup("RELAY_DEBUG") {
            self.debug_mode = matches!(v.trim(), "1" | "true" | "yes" | "on");
        }
        if let Some(v) = lookup("RELAY_CUSTOMER_ID") {
            self.customer_id = v;
        }
        if let Some(v) = lookup("RELAY_ACCOUNT_ID") {
            self.account_id = v;
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), RelayError> {
        if self.max_turns == 0 {
            return Err(RelayError::Configuration("max_turns must be at least 1".into()));
        }
        if self.turn_timeout_ms == 0 {
            return Err(RelayError::Configuration(
                "turn_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_debug_mode(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>, account_id: impl Into<String>) -> Self {
        self.customer_id = customer_id.into();
        self.account_id = account_id.into();
        self
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_ms)
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, RelayError>
where
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| RelayError::Configuration(format!("{key}={raw:?} is not a valid number: {e}")))
}

/// `~/.relay/relay.toml`, or `.relay/relay.toml` when no home directory is known.
pub fn default_config_path() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".relay"))
        .unwrap_or_else(|| PathBuf::from(".relay"))
        .join("relay.toml")
}
