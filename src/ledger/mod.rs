//! Balance ledger.
//!
//! ## Components
//!
//! - [`BalanceLedger`]: owner-scoped balance rows
//! - `transfers`: deposit (inbound transfer) and withdraw handlers
//!
//! ## Scopes
//!
//! Every row belongs to a DAO scope. Scope 0 holds the system (quote) token;
//! scope `n > 0` holds tokens registered to DAO `n`. The same token contract
//! and symbol may appear in several scopes of one owner.

mod balances;
mod transfers;

pub use balances::{BalanceLedger, TokenKey};
pub use transfers::{parse_dao_memo, MAX_MEMO_LEN};
