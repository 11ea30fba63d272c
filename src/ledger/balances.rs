//! Owner-scoped balance table.
//!
//! ## Architecture
//!
//! - **Owner scope**: one `OwnerScope` per account (map of maps)
//! - **Rows**: `BTreeMap<id, Balance>` so iteration follows row id
//! - **Index**: `BTreeMap<TokenKey, id>` for O(log n) lookup of the unique
//!   (dao_id, token_account, symbol) row
//!
//! Row ids are handed out per owner starting at 0 and never reused. Rows
//! are never removed except by a full reset.
//!
//! Owner scopes are shared between clones of the ledger and copied on first
//! write, so a staged copy only duplicates the owners an action touches.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::types::{Asset, Balance, Name, Symbol};

/// Identity of a token within a DAO scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenKey {
    /// 0 for the system (quote) token
    pub dao_id: u64,
    pub token_account: Name,
    pub symbol: Symbol,
}

impl TokenKey {
    pub fn new(dao_id: u64, token_account: Name, symbol: Symbol) -> Self {
        Self {
            dao_id,
            token_account,
            symbol,
        }
    }

    /// Key of an existing row
    pub fn of(balance: &Balance) -> Self {
        Self::new(balance.dao_id, balance.token_account, balance.symbol())
    }
}

#[derive(Debug, Clone, Default)]
struct OwnerScope {
    rows: BTreeMap<u64, Balance>,
    index: BTreeMap<TokenKey, u64>,
    next_id: u64,
}

impl OwnerScope {
    fn row_mut(&mut self, key: &TokenKey) -> Option<&mut Balance> {
        let id = *self.index.get(key)?;
        self.rows.get_mut(&id)
    }

    fn find_or_insert(&mut self, key: &TokenKey) -> &mut Balance {
        let id = match self.index.get(key) {
            Some(id) => *id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                self.index.insert(*key, id);
                id
            }
        };
        self.rows
            .entry(id)
            .or_insert_with(|| Balance::new(id, key.dao_id, key.token_account, key.symbol))
    }
}

/// Balance ledger for all owners.
#[derive(Debug, Clone, Default)]
pub struct BalanceLedger {
    owners: BTreeMap<Name, Arc<OwnerScope>>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Row for `owner` holding `key`
    pub fn get(&self, owner: Name, key: &TokenKey) -> Option<&Balance> {
        let scope = self.owners.get(&owner)?;
        let id = scope.index.get(key)?;
        scope.rows.get(id)
    }

    /// Rows of `owner` for this token in every DAO scope, ordered by id
    pub fn rows_for_token(
        &self,
        owner: Name,
        token_account: Name,
        symbol: Symbol,
    ) -> impl Iterator<Item = &Balance> {
        self.owners
            .get(&owner)
            .into_iter()
            .flat_map(|scope| scope.rows.values())
            .filter(move |b| b.token_account == token_account && b.symbol() == symbol)
    }

    /// Lowest-id row of `owner` that can pay out `amount`
    ///
    /// # Returns
    ///
    /// The row's key, `TokenNotRegisteredForOwner` when the owner has no row
    /// for the token, or `InsufficientBalance` when no single row covers it.
    pub fn find_withdrawable(
        &self,
        owner: Name,
        token_account: Name,
        amount: &Asset,
    ) -> Result<TokenKey, RegistryError> {
        let mut rows = self.rows_for_token(owner, token_account, amount.symbol).peekable();
        if rows.peek().is_none() {
            return Err(RegistryError::TokenNotRegisteredForOwner);
        }
        rows.find(|b| b.available.amount >= amount.amount)
            .map(TokenKey::of)
            .ok_or(RegistryError::InsufficientBalance)
    }

    /// All rows of `owner`, ordered by id
    pub fn balances(&self, owner: Name) -> Vec<Balance> {
        self.owners
            .get(&owner)
            .map(|scope| scope.rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every (owner, row) pair, ordered by owner then id
    pub fn iter(&self) -> impl Iterator<Item = (Name, &Balance)> {
        self.owners
            .iter()
            .flat_map(|(owner, scope)| scope.rows.values().map(move |b| (*owner, b)))
    }

    /// Σ(available + locked) over all owners for one token
    pub fn total_of(&self, key: &TokenKey) -> u128 {
        self.iter()
            .filter(|(_, b)| TokenKey::of(b) == *key)
            .map(|(_, b)| b.available.amount as u128 + b.locked.amount as u128)
            .sum()
    }

    /// Number of rows across all owners
    pub fn row_count(&self) -> usize {
        self.owners.values().map(|scope| scope.rows.len()).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add `amount` to available, creating the row if needed
    pub fn credit(&mut self, owner: Name, key: &TokenKey, amount: &Asset) -> Result<&Balance, RegistryError> {
        ensure_symbol(key, amount)?;
        let scope = Arc::make_mut(self.owners.entry(owner).or_default());
        let row = scope.find_or_insert(key);
        row.credit(amount)?;
        Ok(&*row)
    }

    /// Remove `amount` from available
    ///
    /// A missing row counts as a zero balance.
    pub fn debit(&mut self, owner: Name, key: &TokenKey, amount: &Asset) -> Result<&Balance, RegistryError> {
        ensure_symbol(key, amount)?;
        let row = self.row_mut(owner, key)?;
        row.debit(amount)?;
        Ok(&*row)
    }

    /// Move `amount` from available to locked
    pub fn lock(&mut self, owner: Name, key: &TokenKey, amount: &Asset) -> Result<&Balance, RegistryError> {
        ensure_symbol(key, amount)?;
        let row = self.row_mut(owner, key)?;
        row.lock(amount)?;
        Ok(&*row)
    }

    /// Move `amount` from locked back to available
    pub fn unlock(&mut self, owner: Name, key: &TokenKey, amount: &Asset) -> Result<&Balance, RegistryError> {
        ensure_symbol(key, amount)?;
        let row = self.row_mut(owner, key)?;
        row.unlock(amount)?;
        Ok(&*row)
    }

    /// Drop every row
    pub fn clear(&mut self) {
        self.owners.clear();
    }

    fn row_mut(&mut self, owner: Name, key: &TokenKey) -> Result<&mut Balance, RegistryError> {
        self.owners
            .get_mut(&owner)
            .and_then(|scope| Arc::make_mut(scope).row_mut(key))
            .ok_or(RegistryError::InsufficientBalance)
    }
}

fn ensure_symbol(key: &TokenKey, amount: &Asset) -> Result<(), RegistryError> {
    if key.symbol != amount.symbol {
        return Err(RegistryError::PrecisionMismatch {
            expected: key.symbol,
            found: amount.symbol,
        });
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================
