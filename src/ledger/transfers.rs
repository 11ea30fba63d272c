//! Deposits and withdrawals.
//!
//! ## Deposit memo
//!
//! The memo of an inbound transfer selects the DAO scope the tokens are
//! credited to: `"0"` for the system token, `"<dao_id>"` for a token the DAO
//! registered. Anything else aborts the transfer.

use tracing::info;

use crate::error::RegistryError;
use crate::ledger::TokenKey;
use crate::registry::{ActionContext, RegistryState, TransferNotification};
use crate::types::{ActionReceipt, Asset, Name, OutboundAction};

/// Maximum length of a deposit memo, in bytes
pub const MAX_MEMO_LEN: usize = 256;

const WITHDRAW_MEMO: &str = "withdraw";

/// Parse the DAO scope out of a deposit memo
///
/// # Example
///
/// ```
/// use dao_registry::ledger::parse_dao_memo;
///
/// assert_eq!(parse_dao_memo("1").unwrap(), 1);
/// assert!(parse_dao_memo("").is_err());
/// assert!(parse_dao_memo("-1").is_err());
/// ```
pub fn parse_dao_memo(memo: &str) -> Result<u64, RegistryError> {
    if memo.is_empty() {
        return Err(RegistryError::EmptyMemo);
    }
    if memo.len() > MAX_MEMO_LEN {
        return Err(RegistryError::MemoTooLong { max: MAX_MEMO_LEN });
    }
    if memo.starts_with('-') {
        return Err(RegistryError::NegativeDaoId);
    }
    if !memo.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RegistryError::MalformedMemo(memo.to_string()));
    }
    memo.parse()
        .map_err(|_| RegistryError::MalformedMemo(memo.to_string()))
}

impl RegistryState {
    /// Handle a transfer addressed to the registry
    pub(crate) fn on_transfer(&mut self, notification: TransferNotification) -> Result<(), RegistryError> {
        if notification.quantity.is_zero() {
            return Err(RegistryError::NonPositiveAmount);
        }
        self.deposit(
            notification.from,
            notification.code,
            &notification.quantity,
            &notification.memo,
        )
    }

    /// Credit `amount` received from `token_contract` to `owner`
    pub(crate) fn deposit(
        &mut self,
        owner: Name,
        token_contract: Name,
        amount: &Asset,
        memo: &str,
    ) -> Result<(), RegistryError> {
        let dao_id = parse_dao_memo(memo)?;

        if dao_id == 0 {
            let system = self.system_token;
            if token_contract != system.contract || amount.symbol != system.symbol {
                return Err(RegistryError::UnsupportedSystemToken);
            }
        } else {
            let dao = self.directory.require(dao_id)?;
            if !dao.tokens.supports(token_contract, amount.symbol) {
                return Err(RegistryError::UnsupportedToken);
            }
        }

        let key = TokenKey::new(dao_id, token_contract, amount.symbol);
        let row = self.ledger.credit(owner, &key, amount)?;

        info!(%owner, dao_id, %amount, available = %row.available, "Deposit");
        Ok(())
    }

    /// Pay `amount` out of `owner`'s available balance
    pub(crate) fn withdraw(
        &mut self,
        ctx: &ActionContext,
        owner: Name,
        token_contract: Name,
        amount: Asset,
        receipt: &mut ActionReceipt,
    ) -> Result<(), RegistryError> {
        ctx.require_auth(owner)?;

        if amount.is_zero() {
            return Err(RegistryError::NonPositiveAmount);
        }

        let key = self.ledger.find_withdrawable(owner, token_contract, &amount)?;

        let row = self.ledger.debit(owner, &key, &amount)?;
        info!(%owner, dao_id = key.dao_id, %amount, available = %row.available, "Withdraw");

        receipt.outbound.push(OutboundAction::Transfer {
            contract: token_contract,
            from: self.account,
            to: owner,
            quantity: amount,
            memo: WITHDRAW_MEMO.to_string(),
        });
        Ok(())
    }
}
