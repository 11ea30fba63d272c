//! Fungible token contract.
//!
//! Supports create / issue / transfer and balance queries. Tokens are keyed
//! by symbol code; precision is fixed at `create`.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::registry::ActionContext;
use crate::types::{Asset, Name, Symbol};

/// Maximum memo length, in bytes
const MAX_MEMO_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("missing authority of {0}")]
    MissingAuthority(Name),

    #[error("token with symbol already exists")]
    AlreadyExists,

    #[error("token with symbol does not exist")]
    UnknownToken,

    #[error("max-supply must be positive")]
    InvalidMaxSupply,

    #[error("tokens can only be issued to issuer account")]
    IssueToOtherAccount,

    #[error("must use positive quantity")]
    NonPositiveQuantity,

    #[error("symbol precision mismatch")]
    PrecisionMismatch,

    #[error("quantity exceeds available supply")]
    SupplyExceeded,

    #[error("cannot transfer to self")]
    TransferToSelf,

    #[error("overdrawn balance")]
    Overdrawn,

    #[error("memo has more than 256 bytes")]
    MemoTooLong,
}

/// Token actions a transaction can carry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase", tag = "action")]
pub enum TokenAction {
    Create {
        issuer: Name,
        maximum_supply: Asset,
    },
    Issue {
        to: Name,
        quantity: Asset,
        memo: String,
    },
    Transfer {
        from: Name,
        to: Name,
        quantity: Asset,
        memo: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CurrencyStats {
    supply: Asset,
    max_supply: Asset,
    issuer: Name,
}

/// One deployed token contract.
#[derive(Debug, Clone)]
pub struct TokenContract {
    account: Name,

    /// Key: symbol code
    stats: BTreeMap<u64, CurrencyStats>,

    /// Key: (owner, symbol code)
    accounts: BTreeMap<(Name, u64), Asset>,
}

impl TokenContract {
    pub fn new(account: Name) -> Self {
        Self {
            account,
            stats: BTreeMap::new(),
            accounts: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn account(&self) -> Name {
        self.account
    }

    /// Register a new token; needs the contract's own authority
    pub fn create(&mut self, ctx: &ActionContext, issuer: Name, max_supply: Asset) -> Result<(), TokenError> {
        require_auth(ctx, self.account)?;

        if max_supply.is_zero() {
            return Err(TokenError::InvalidMaxSupply);
        }
        let code = max_supply.symbol.code_raw();
        if self.stats.contains_key(&code) {
            return Err(TokenError::AlreadyExists);
        }

        self.stats.insert(
            code,
            CurrencyStats {
                supply: Asset::zero(max_supply.symbol),
                max_supply,
                issuer,
            },
        );
        Ok(())
    }

    /// Mint new tokens to the issuer
    pub fn issue(&mut self, ctx: &ActionContext, to: Name, quantity: Asset, memo: &str) -> Result<(), TokenError> {
        check_memo(memo)?;
        let stats = self.stats.get_mut(&quantity.symbol.code_raw()).ok_or(TokenError::UnknownToken)?;

        require_auth(ctx, stats.issuer)?;
        if to != stats.issuer {
            return Err(TokenError::IssueToOtherAccount);
        }
        if quantity.is_zero() {
            return Err(TokenError::NonPositiveQuantity);
        }
        if quantity.symbol != stats.supply.symbol {
            return Err(TokenError::PrecisionMismatch);
        }

        let headroom = stats.max_supply.amount - stats.supply.amount;
        if quantity.amount > headroom {
            return Err(TokenError::SupplyExceeded);
        }
        stats.supply.amount += quantity.amount;

        self.add_balance(to, &quantity)
    }

    /// Move tokens between accounts; needs `from`'s authority
    pub fn transfer(
        &mut self,
        ctx: &ActionContext,
        from: Name,
        to: Name,
        quantity: Asset,
        memo: &str,
    ) -> Result<(), TokenError> {
        if from == to {
            return Err(TokenError::TransferToSelf);
        }
        require_auth(ctx, from)?;
        check_memo(memo)?;

        let stats = self.stats.get(&quantity.symbol.code_raw()).ok_or(TokenError::UnknownToken)?;
        if quantity.is_zero() {
            return Err(TokenError::NonPositiveQuantity);
        }
        if quantity.symbol != stats.supply.symbol {
            return Err(TokenError::PrecisionMismatch);
        }

        self.sub_balance(from, &quantity)?;
        self.add_balance(to, &quantity)?;

        debug!(contract = %self.account, %from, %to, %quantity, "Token transfer");
        Ok(())
    }

    /// Balance of `owner`; zero when the owner never held the token
    pub fn balance(&self, owner: Name, symbol: Symbol) -> Asset {
        self.accounts
            .get(&(owner, symbol.code_raw()))
            .copied()
            .unwrap_or_else(|| Asset::zero(symbol))
    }

    pub fn supply(&self, symbol: Symbol) -> Option<Asset> {
        self.stats.get(&symbol.code_raw()).map(|stats| stats.supply)
    }

    fn sub_balance(&mut self, owner: Name, quantity: &Asset) -> Result<(), TokenError> {
        let balance = self
            .accounts
            .get_mut(&(owner, quantity.symbol.code_raw()))
            .ok_or(TokenError::Overdrawn)?;
        balance.amount = balance
            .amount
            .checked_sub(quantity.amount)
            .ok_or(TokenError::Overdrawn)?;
        Ok(())
    }

    fn add_balance(&mut self, owner: Name, quantity: &Asset) -> Result<(), TokenError> {
        let balance = self
            .accounts
            .entry((owner, quantity.symbol.code_raw()))
            .or_insert_with(|| Asset::zero(quantity.symbol));
        // Supply caps every balance, so this cannot overflow
        balance.amount = balance
            .amount
            .checked_add(quantity.amount)
            .ok_or(TokenError::SupplyExceeded)?;
        Ok(())
    }
}

fn require_auth(ctx: &ActionContext, account: Name) -> Result<(), TokenError> {
    if ctx.has_auth(account) {
        Ok(())
    } else {
        Err(TokenError::MissingAuthority(account))
    }
}

fn check_memo(memo: &str) -> Result<(), TokenError> {
    if memo.len() > MAX_MEMO_LEN {
        return Err(TokenError::MemoTooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    fn asset(s: &str) -> Asset {
        s.parse().unwrap()
    }

    fn token_with_supply() -> TokenContract {
        let mut token = TokenContract::new(name("token.c"));
        token
            .create(
                &ActionContext::signed_by(name("token.c"), 0),
                name("issuer"),
                asset("1000.0000 DTK"),
            )
            .unwrap();
        token
            .issue(
                &ActionContext::signed_by(name("issuer"), 0),
                name("issuer"),
                asset("500.0000 DTK"),
                "",
            )
            .unwrap();
        token
    }

    #[test]
    fn test_create_and_issue() {
        let token = token_with_supply();
        let dtk = "4,DTK".parse().unwrap();

        assert_eq!(token.supply(dtk), Some(asset("500.0000 DTK")));
        assert_eq!(token.balance(name("issuer"), dtk), asset("500.0000 DTK"));
        assert!(token.balance(name("alice"), dtk).is_zero());
    }

    #[test]
    fn test_create_rules() {
        let mut token = token_with_supply();
        let ctx = ActionContext::signed_by(name("token.c"), 0);

        assert_eq!(
            token.create(&ctx, name("issuer"), asset("1.00 DTK")).unwrap_err(),
            TokenError::AlreadyExists
        );
        assert_eq!(
            token
                .create(&ActionContext::signed_by(name("alice"), 0), name("alice"), asset("1.0000 ABC"))
                .unwrap_err(),
            TokenError::MissingAuthority(name("token.c"))
        );
    }

    #[test]
    fn test_issue_rules() {
        let mut token = token_with_supply();
        let ctx = ActionContext::signed_by(name("issuer"), 0);

        assert_eq!(
            token.issue(&ctx, name("alice"), asset("1.0000 DTK"), "").unwrap_err(),
            TokenError::IssueToOtherAccount
        );
        assert_eq!(
            token.issue(&ctx, name("issuer"), asset("500.0001 DTK"), "").unwrap_err(),
            TokenError::SupplyExceeded
        );
        assert_eq!(
            token.issue(&ctx, name("issuer"), asset("1.00 DTK"), "").unwrap_err(),
            TokenError::PrecisionMismatch
        );
    }

    #[test]
    fn test_transfer() {
        let mut token = token_with_supply();
        let ctx = ActionContext::signed_by(name("issuer"), 0);
        let dtk = "4,DTK".parse().unwrap();

        token
            .transfer(&ctx, name("issuer"), name("alice"), asset("10.0000 DTK"), "hi")
            .unwrap();
        assert_eq!(token.balance(name("alice"), dtk), asset("10.0000 DTK"));
        assert_eq!(token.balance(name("issuer"), dtk), asset("490.0000 DTK"));

        // Alice did not sign
        assert_eq!(
            token
                .transfer(&ctx, name("alice"), name("bob"), asset("1.0000 DTK"), "")
                .unwrap_err(),
            TokenError::MissingAuthority(name("alice"))
        );

        let alice = ActionContext::signed_by(name("alice"), 0);
        assert_eq!(
            token
                .transfer(&alice, name("alice"), name("bob"), asset("10.0001 DTK"), "")
                .unwrap_err(),
            TokenError::Overdrawn
        );
        assert_eq!(
            token
                .transfer(&alice, name("alice"), name("alice"), asset("1.0000 DTK"), "")
                .unwrap_err(),
            TokenError::TransferToSelf
        );
    }
}
