//! Per-DAO token registry.
//!
//! The position of an entry is its `token_idx`, which offers refer to, so
//! entries are only ever appended.

use tracing::info;

use crate::error::RegistryError;
use crate::registry::{ActionContext, RegistryState};
use crate::types::{Name, Symbol};

/// A token a DAO accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenEntry {
    pub token_contract: Name,
    pub symbol: Symbol,
}

/// Ordered list of tokens with unique symbol codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct TokenRegistry {
    entries: Vec<TokenEntry>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a token
    ///
    /// # Returns
    ///
    /// The new entry's index
    pub fn add(&mut self, token_contract: Name, symbol: Symbol) -> Result<u64, RegistryError> {
        if self.find_code(symbol).is_some() {
            return Err(RegistryError::DuplicateToken(symbol));
        }
        self.entries.push(TokenEntry {
            token_contract,
            symbol,
        });
        Ok(self.entries.len() as u64 - 1)
    }

    pub fn get(&self, token_idx: u64) -> Option<&TokenEntry> {
        usize::try_from(token_idx).ok().and_then(|idx| self.entries.get(idx))
    }

    /// Entry with the same symbol code, whatever its precision
    pub fn find_code(&self, symbol: Symbol) -> Option<(u64, &TokenEntry)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.symbol.code_raw() == symbol.code_raw())
            .map(|(idx, entry)| (idx as u64, entry))
    }

    /// Check if the exact (contract, symbol) pair is registered
    pub fn supports(&self, token_contract: Name, symbol: Symbol) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.token_contract == token_contract && entry.symbol == symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenEntry> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RegistryState {
    pub(crate) fn addtoken(
        &mut self,
        ctx: &ActionContext,
        dao_id: u64,
        token_contract: Name,
        symbol: Symbol,
    ) -> Result<(), RegistryError> {
        let dao = self.directory.require_mut(dao_id)?;
        ctx.require_auth(dao.creator)?;

        let token_idx = dao.tokens.add(token_contract, symbol)?;

        info!(dao_id, %token_contract, %symbol, token_idx, "Token registered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dtk() -> Symbol {
        "4,DTK".parse().unwrap()
    }

    #[test]
    fn test_add_assigns_indices() {
        let mut tokens = TokenRegistry::new();
        let contract: Name = "token.c".parse().unwrap();

        assert_eq!(tokens.add(contract, dtk()).unwrap(), 0);
        assert_eq!(tokens.add(contract, "2,GOV".parse().unwrap()).unwrap(), 1);
        assert_eq!(tokens.get(1).unwrap().symbol.to_string(), "2,GOV");
        assert!(tokens.get(2).is_none());
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let mut tokens = TokenRegistry::new();
        let contract: Name = "token.c".parse().unwrap();
        tokens.add(contract, dtk()).unwrap();

        // Same code at another precision or contract is still a duplicate
        let other: Symbol = "2,DTK".parse().unwrap();
        assert_eq!(
            tokens.add("other".parse().unwrap(), other).unwrap_err(),
            RegistryError::DuplicateToken(other)
        );
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn test_supports_requires_exact_pair() {
        let mut tokens = TokenRegistry::new();
        let contract: Name = "token.c".parse().unwrap();
        tokens.add(contract, dtk()).unwrap();

        assert!(tokens.supports(contract, dtk()));
        assert!(!tokens.supports("fake.token".parse().unwrap(), dtk()));
        assert!(!tokens.supports(contract, "2,DTK".parse().unwrap()));
        assert_eq!(tokens.find_code("2,DTK".parse().unwrap()).map(|(idx, _)| idx), Some(0));
    }

    #[test]
    fn test_json_is_plain_list() {
        let mut tokens = TokenRegistry::new();
        tokens.add("token.c".parse().unwrap(), dtk()).unwrap();

        let json = serde_json::to_value(&tokens).unwrap();
        assert_eq!(json[0]["symbol"], "4,DTK");
        assert_eq!(json[0]["token_contract"], "token.c");
    }
}
