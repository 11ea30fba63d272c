//! Balance rows of the ledger.
//!
//! ## Layout
//!
//! A row tracks one owner's holding of one token in one DAO scope:
//!
//! - `dao_id == 0`: system scope, only the quote token lives here
//! - `dao_id > 0`: a token registered to that DAO
//!
//! The symbol is carried by `available` (and `locked`, which always has the
//! same symbol). Rows are never deleted; a fully withdrawn row stays at zero.

use ssz_rs::prelude::*;

use crate::error::RegistryError;
use crate::types::{Asset, Name, Symbol};

/// One ledger row.
///
/// ## SSZ Layout
///
/// Fixed-size container: 8 + 16 + 16 + 8 + 8 = 56 bytes.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, SimpleSerialize, serde::Serialize, serde::Deserialize,
)]
pub struct Balance {
    /// Row id, unique per owner
    pub id: u64,

    /// Freely spendable amount
    pub available: Asset,

    /// Amount held back by a multi-step operation
    pub locked: Asset,

    /// DAO scope (0 = system)
    pub dao_id: u64,

    /// Token contract the funds came from
    pub token_account: Name,
}

impl Balance {
    /// Create an empty row
    pub fn new(id: u64, dao_id: u64, token_account: Name, symbol: Symbol) -> Self {
        Self {
            id,
            available: Asset::zero(symbol),
            locked: Asset::zero(symbol),
            dao_id,
            token_account,
        }
    }

    /// Symbol of the token held in this row
    #[inline]
    pub fn symbol(&self) -> Symbol {
        self.available.symbol
    }

    /// Check whether this row holds the given token in the given scope
    #[inline]
    pub fn matches(&self, dao_id: u64, token_account: Name, symbol: Symbol) -> bool {
        self.dao_id == dao_id && self.token_account == token_account && self.symbol() == symbol
    }

    /// available + locked
    pub fn total(&self) -> Result<Asset, RegistryError> {
        self.available.checked_add(&self.locked)
    }

    /// Add to available
    pub fn credit(&mut self, amount: &Asset) -> Result<(), RegistryError> {
        self.available = self.available.checked_add(amount)?;
        Ok(())
    }

    /// Remove from available
    ///
    /// Fails with `InsufficientBalance` and leaves the row untouched if
    /// available is too small.
    pub fn debit(&mut self, amount: &Asset) -> Result<(), RegistryError> {
        self.available = self
            .available
            .checked_sub(amount)?
            .ok_or(RegistryError::InsufficientBalance)?;
        Ok(())
    }

    /// Move `amount` from available to locked
    pub fn lock(&mut self, amount: &Asset) -> Result<(), RegistryError> {
        let available = self
            .available
            .checked_sub(amount)?
            .ok_or(RegistryError::InsufficientBalance)?;
        let locked = self.locked.checked_add(amount)?;
        self.available = available;
        self.locked = locked;
        Ok(())
    }

    /// Move `amount` from locked back to available
    pub fn unlock(&mut self, amount: &Asset) -> Result<(), RegistryError> {
        let locked = self
            .locked
            .checked_sub(amount)?
            .ok_or(RegistryError::InsufficientBalance)?;
        let available = self.available.checked_add(amount)?;
        self.available = available;
        self.locked = locked;
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dtk(s: &str) -> Asset {
        format!("{} DTK", s).parse().unwrap()
    }

    fn row() -> Balance {
        let contract: Name = "token.c".parse().unwrap();
        Balance::new(0, 1, contract, "4,DTK".parse().unwrap())
    }

    #[test]
    fn test_balance_new_is_zero() {
        let b = row();
        assert!(b.available.is_zero());
        assert!(b.locked.is_zero());
        assert_eq!(b.symbol().to_string(), "4,DTK");
    }

    #[test]
    fn test_credit_debit() {
        let mut b = row();
        b.credit(&dtk("100.0000")).unwrap();
        b.debit(&dtk("40.0000")).unwrap();
        assert_eq!(b.available, dtk("60.0000"));

        let err = b.debit(&dtk("60.0001")).unwrap_err();
        assert!(matches!(err, RegistryError::InsufficientBalance));
        assert_eq!(b.available, dtk("60.0000"));
    }

    #[test]
    fn test_lock_unlock() {
        let mut b = row();
        b.credit(&dtk("10.0000")).unwrap();

        b.lock(&dtk("4.0000")).unwrap();
        assert_eq!(b.available, dtk("6.0000"));
        assert_eq!(b.locked, dtk("4.0000"));
        assert_eq!(b.total().unwrap(), dtk("10.0000"));

        assert!(b.lock(&dtk("6.0001")).is_err());
        assert!(b.unlock(&dtk("4.0001")).is_err());

        b.unlock(&dtk("4.0000")).unwrap();
        assert_eq!(b.available, dtk("10.0000"));
        assert!(b.locked.is_zero());
    }

    #[test]
    fn test_wrong_symbol_rejected() {
        let mut b = row();
        let other: Asset = "1.0000 CTK".parse().unwrap();
        assert!(b.credit(&other).is_err());
    }

    #[test]
    fn test_balance_ssz_size() {
        let bytes = ssz_rs::serialize(&row()).expect("Failed to serialize");
        assert_eq!(bytes.len(), 56);
    }
}
