//! The `config` table: typed key/value settings.
//!
//! Known keys:
//!
//! | Key | Type | Used by |
//! |---|---|---|
//! | `b.rambytes` | uint64 | RAM bought for each new DAO |
//! | `d.net` | asset | NET stake delegated to each new DAO |
//! | `d.cpu` | asset | CPU stake delegated to each new DAO |

use std::collections::BTreeMap;

use tracing::info;

use crate::error::RegistryError;
use crate::registry::{ActionContext, DaoDirectory, RegistryState};
use crate::types::{Asset, Name, VariantValue};

/// Maximum length of a setting description, in bytes
pub const MAX_DESCRIPTION_LEN: usize = 256;

pub const RAM_BYTES_KEY: Name = Name::constant("b.rambytes");
pub const NET_STAKE_KEY: Name = Name::constant("d.net");
pub const CPU_STAKE_KEY: Name = Name::constant("d.cpu");

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Setting {
    pub key: Name,
    pub value: VariantValue,
    pub description: String,
}

/// Settings ordered by key.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    entries: BTreeMap<Name, Setting>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a setting
    ///
    /// An empty `description` keeps the stored one.
    pub fn set(&mut self, key: Name, value: VariantValue, description: &str) -> Result<(), RegistryError> {
        if description.len() > MAX_DESCRIPTION_LEN {
            return Err(RegistryError::DescriptionTooLong {
                max: MAX_DESCRIPTION_LEN,
            });
        }

        let entry = self.entries.entry(key).or_insert_with(|| Setting {
            key,
            value: VariantValue::Empty,
            description: String::new(),
        });
        entry.value = value;
        if !description.is_empty() {
            entry.description = description.to_string();
        }
        Ok(())
    }

    pub fn get(&self, key: Name) -> Option<&Setting> {
        self.entries.get(&key)
    }

    pub fn get_uint64(&self, key: Name) -> Result<u64, RegistryError> {
        let setting = self.entries.get(&key).ok_or(RegistryError::SettingNotFound(key))?;
        setting
            .value
            .as_uint64()
            .ok_or_else(|| type_mismatch(setting, "uint64"))
    }

    pub fn get_asset(&self, key: Name) -> Result<Asset, RegistryError> {
        let setting = self.entries.get(&key).ok_or(RegistryError::SettingNotFound(key))?;
        setting
            .value
            .as_asset()
            .ok_or_else(|| type_mismatch(setting, "asset"))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Setting> {
        self.entries.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn type_mismatch(setting: &Setting, expected: &'static str) -> RegistryError {
    RegistryError::SettingTypeMismatch {
        key: setting.key,
        expected,
        found: setting.value.type_name(),
    }
}

// ============================================================================
// Actions
// ============================================================================

impl RegistryState {
    pub(crate) fn setparam(
        &mut self,
        ctx: &ActionContext,
        key: Name,
        value: VariantValue,
        description: &str,
    ) -> Result<(), RegistryError> {
        self.require_admin(ctx)?;
        self.settings.set(key, value, description)?;

        info!(%key, "Setting updated");
        Ok(())
    }

    /// Wipe every table the registry owns
    pub(crate) fn resetsttngs(&mut self, ctx: &ActionContext) -> Result<(), RegistryError> {
        self.require_admin(ctx)?;

        self.settings.clear();
        self.directory = DaoDirectory::new();
        self.ledger.clear();
        self.books.clear();

        info!("Registry tables reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_description_when_empty() {
        let mut settings = Settings::new();
        settings
            .set(RAM_BYTES_KEY, VariantValue::Uint64(4096), "RAM per DAO")
            .unwrap();
        settings.set(RAM_BYTES_KEY, VariantValue::Uint64(8192), "").unwrap();

        let setting = settings.get(RAM_BYTES_KEY).unwrap();
        assert_eq!(setting.value, VariantValue::Uint64(8192));
        assert_eq!(setting.description, "RAM per DAO");
    }

    #[test]
    fn test_description_limit() {
        let mut settings = Settings::new();
        let long = "x".repeat(MAX_DESCRIPTION_LEN + 1);

        let err = settings
            .set(RAM_BYTES_KEY, VariantValue::Uint64(1), &long)
            .unwrap_err();
        assert_eq!(err, RegistryError::DescriptionTooLong { max: 256 });
        assert!(settings.is_empty());

        let exact = "x".repeat(MAX_DESCRIPTION_LEN);
        assert!(settings.set(RAM_BYTES_KEY, VariantValue::Uint64(1), &exact).is_ok());
    }

    #[test]
    fn test_typed_getters() {
        let mut settings = Settings::new();
        let stake: Asset = "1.0000 TLOS".parse().unwrap();
        settings.set(NET_STAKE_KEY, VariantValue::Asset(stake), "").unwrap();

        assert_eq!(settings.get_asset(NET_STAKE_KEY).unwrap(), stake);
        assert_eq!(
            settings.get_uint64(NET_STAKE_KEY).unwrap_err(),
            RegistryError::SettingTypeMismatch {
                key: NET_STAKE_KEY,
                expected: "uint64",
                found: "asset",
            }
        );
        assert_eq!(
            settings.get_asset(CPU_STAKE_KEY).unwrap_err(),
            RegistryError::SettingNotFound(CPU_STAKE_KEY)
        );
    }

    #[test]
    fn test_iteration_follows_key_order() {
        let mut settings = Settings::new();
        settings.set(NET_STAKE_KEY, VariantValue::Empty, "").unwrap();
        settings.set(RAM_BYTES_KEY, VariantValue::Empty, "").unwrap();
        settings.set(CPU_STAKE_KEY, VariantValue::Empty, "").unwrap();

        let keys: Vec<String> = settings.iter().map(|s| s.key.to_string()).collect();
        assert_eq!(keys, vec!["b.rambytes", "d.cpu", "d.net"]);
        assert_eq!(settings.len(), 3);
    }
}
