//! Registry configuration.
//!
//! ## Format
//!
//! ```toml
//! account = "daoregistry"
//! log_filter = "info"
//!
//! [system_token]
//! contract = "eosio.token"
//! symbol = "4,TLOS"
//!
//! [[settings]]
//! key = "b.rambytes"
//! value = { uint64 = 4096 }
//! description = "RAM bought for each new DAO"
//! ```
//!
//! Every field is optional; missing fields take the [`Default`] values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Name, Symbol, VariantValue};

/// Default registry account
pub const DEFAULT_ACCOUNT: Name = Name::constant("daoregistry");

/// Default quote token contract
pub const DEFAULT_TOKEN_CONTRACT: Name = Name::constant("eosio.token");

/// Default quote token symbol
pub const DEFAULT_SYSTEM_SYMBOL: Symbol = Symbol::constant(4, "TLOS");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The token that quotes every offer and funds the system (dao_id 0) scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemToken {
    pub contract: Name,
    pub symbol: Symbol,
}

impl Default for SystemToken {
    fn default() -> Self {
        Self {
            contract: DEFAULT_TOKEN_CONTRACT,
            symbol: DEFAULT_SYSTEM_SYMBOL,
        }
    }
}

/// A setting written at genesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingEntry {
    pub key: Name,
    pub value: VariantValue,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Account the registry runs under; its authority is the admin authority
    pub account: Name,

    pub system_token: SystemToken,

    /// Genesis contents of the settings table
    pub settings: Vec<SettingEntry>,

    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            account: DEFAULT_ACCOUNT,
            system_token: SystemToken::default(),
            settings: Vec::new(),
            log_filter: "info".to_string(),
        }
    }
}

impl RegistryConfig {
    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.account.to_string(), "daoregistry");
        assert_eq!(config.system_token.contract.to_string(), "eosio.token");
        assert_eq!(config.system_token.symbol.to_string(), "4,TLOS");
        assert!(config.settings.is_empty());
    }

    #[test]
    fn test_parse_partial_file() {
        let config = RegistryConfig::from_toml_str(
            r#"
            account = "registry"

            [[settings]]
            key = "b.rambytes"
            value = { uint64 = 4096 }

            [[settings]]
            key = "d.net"
            value = { asset = "1.0000 TLOS" }
            description = "NET stake"
            "#,
        )
        .unwrap();

        assert_eq!(config.account.to_string(), "registry");
        assert_eq!(config.system_token, SystemToken::default());
        assert_eq!(config.settings.len(), 2);
        assert_eq!(config.settings[0].value, VariantValue::Uint64(4096));
        assert_eq!(config.settings[1].description, "NET stake");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_parse_rejects_bad_name() {
        let err = RegistryConfig::from_toml_str(r#"account = "NotAName""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RegistryConfig::load("/nonexistent/registry.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
