//! The registry contract.
//!
//! ## Architecture
//!
//! - [`RegistryState`]: every table the contract owns (settings, directory,
//!   balance ledger, offer books)
//! - [`DaoRegistry`]: the action dispatcher wrapped around that state
//!
//! ## Atomicity
//!
//! Each action runs against a staged clone of the state. The clone replaces
//! the live state only when the handler returns `Ok`, so a failing action
//! never leaves a partial write behind.
//!
//! ## Example
//!
//! ```
//! use dao_registry::config::RegistryConfig;
//! use dao_registry::registry::{Action, ActionContext, DaoRegistry};
//!
//! let mut registry = DaoRegistry::new(&RegistryConfig::default()).unwrap();
//! let creator = "creator".parse().unwrap();
//!
//! let receipt = registry
//!     .apply(
//!         &ActionContext::signed_by(creator, 0),
//!         Action::Create {
//!             dao: "firstdao".parse().unwrap(),
//!             creator,
//!             ipfs: "QmHash".to_string(),
//!         },
//!     )
//!     .unwrap();
//!
//! assert_eq!(receipt.sequence, 1);
//! assert_eq!(registry.dao(1).unwrap().dao.to_string(), "firstdao");
//! ```

pub mod directory;
pub mod settings;
pub mod tokens;

pub use directory::{Dao, DaoDirectory};
pub use settings::{Setting, Settings, MAX_DESCRIPTION_LEN};
pub use tokens::{TokenEntry, TokenRegistry};

use ssz_rs::SimpleSerialize;
use tracing::{debug, warn};

use crate::config::{RegistryConfig, SystemToken};
use crate::error::RegistryError;
use crate::ledger::{BalanceLedger, TokenKey};
use crate::orderbook::OfferBooks;
use crate::types::{
    compute_hash, ActionReceipt, Asset, Balance, Name, Offer, OfferType, Symbol, VariantValue,
};

// ============================================================================
// Action context
// ============================================================================

/// Signers and block time of the transaction running an action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionContext {
    /// Accounts whose authority the transaction carries
    pub signers: Vec<Name>,

    /// Block time in seconds
    pub now: u64,
}

impl ActionContext {
    pub fn new(signers: Vec<Name>, now: u64) -> Self {
        Self { signers, now }
    }

    /// Context signed by a single account
    pub fn signed_by(signer: Name, now: u64) -> Self {
        Self::new(vec![signer], now)
    }

    #[inline]
    pub fn has_auth(&self, account: Name) -> bool {
        self.signers.contains(&account)
    }

    pub fn require_auth(&self, account: Name) -> Result<(), RegistryError> {
        if self.has_auth(account) {
            Ok(())
        } else {
            Err(RegistryError::MissingAuthority(account))
        }
    }
}

// ============================================================================
// Action surface
// ============================================================================

/// Every action the registry accepts from a transaction.
///
/// Inbound transfer notifications are not here: only the host may deliver
/// them, through [`DaoRegistry::notify_transfer`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase", tag = "action")]
pub enum Action {
    Create {
        dao: Name,
        creator: Name,
        ipfs: String,
    },
    Update {
        dao_id: u64,
        ipfs: String,
    },
    Delorg {
        dao_id: u64,
    },
    Upsertattrs {
        dao_id: u64,
        attributes: Vec<(String, VariantValue)>,
    },
    Delattrs {
        dao_id: u64,
        attributes: Vec<String>,
    },
    Addtoken {
        dao_id: u64,
        token_contract: Name,
        token: Symbol,
    },
    Reset,
    Withdraw {
        account: Name,
        token_contract: Name,
        amount: Asset,
    },
    Createoffer {
        dao_id: u64,
        creator: Name,
        quantity: Asset,
        price_per_unit: Asset,
        #[serde(rename = "type")]
        offer_type: OfferType,
    },
    Canceloffer {
        dao_id: u64,
        offer_id: u64,
    },
    Setparam {
        key: Name,
        value: VariantValue,
        description: String,
    },
    Resetsttngs,
}

impl Action {
    /// On-chain action name
    pub fn name(&self) -> &'static str {
        match self {
            Action::Create { .. } => "create",
            Action::Update { .. } => "update",
            Action::Delorg { .. } => "delorg",
            Action::Upsertattrs { .. } => "upsertattrs",
            Action::Delattrs { .. } => "delattrs",
            Action::Addtoken { .. } => "addtoken",
            Action::Reset => "reset",
            Action::Withdraw { .. } => "withdraw",
            Action::Createoffer { .. } => "createoffer",
            Action::Canceloffer { .. } => "canceloffer",
            Action::Setparam { .. } => "setparam",
            Action::Resetsttngs => "resetsttngs",
        }
    }
}

/// A token transfer as seen by the registry when it is the recipient.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransferNotification {
    /// Contract that executed the transfer (set by the host)
    pub code: Name,
    pub from: Name,
    pub to: Name,
    pub quantity: Asset,
    pub memo: String,
}

// ============================================================================
// Registry state
// ============================================================================

/// All tables owned by the registry.
#[derive(Debug, Clone)]
pub struct RegistryState {
    pub(crate) account: Name,
    pub(crate) system_token: SystemToken,
    pub(crate) settings: Settings,
    pub(crate) directory: DaoDirectory,
    pub(crate) ledger: BalanceLedger,
    pub(crate) books: OfferBooks,
}

impl RegistryState {
    fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let mut settings = Settings::new();
        for entry in &config.settings {
            settings.set(entry.key, entry.value.clone(), &entry.description)?;
        }

        Ok(Self {
            account: config.account,
            system_token: config.system_token,
            settings,
            directory: DaoDirectory::new(),
            ledger: BalanceLedger::new(),
            books: OfferBooks::new(),
        })
    }

    /// Ledger key of the quote token
    pub(crate) fn system_key(&self) -> TokenKey {
        TokenKey::new(0, self.system_token.contract, self.system_token.symbol)
    }

    /// Authority of the registry account itself
    pub(crate) fn require_admin(&self, ctx: &ActionContext) -> Result<(), RegistryError> {
        ctx.require_auth(self.account)
    }

    fn execute(
        &mut self,
        ctx: &ActionContext,
        action: Action,
        receipt: &mut ActionReceipt,
    ) -> Result<(), RegistryError> {
        match action {
            Action::Create { dao, creator, ipfs } => self.create(ctx, dao, creator, ipfs, receipt),
            Action::Update { dao_id, ipfs } => self.update(ctx, dao_id, ipfs),
            Action::Delorg { dao_id } => self.delorg(ctx, dao_id),
            Action::Upsertattrs { dao_id, attributes } => self.upsertattrs(ctx, dao_id, attributes),
            Action::Delattrs { dao_id, attributes } => self.delattrs(ctx, dao_id, &attributes),
            Action::Addtoken {
                dao_id,
                token_contract,
                token,
            } => self.addtoken(ctx, dao_id, token_contract, token),
            Action::Reset => self.reset(ctx),
            Action::Withdraw {
                account,
                token_contract,
                amount,
            } => self.withdraw(ctx, account, token_contract, amount, receipt),
            Action::Createoffer {
                dao_id,
                creator,
                quantity,
                price_per_unit,
                offer_type,
            } => {
                let outcome =
                    self.createoffer(ctx, dao_id, creator, quantity, price_per_unit, offer_type)?;
                receipt.offer = Some(outcome);
                Ok(())
            }
            Action::Canceloffer { dao_id, offer_id } => {
                let outcome = self.canceloffer(ctx, dao_id, offer_id)?;
                receipt.offer = Some(outcome);
                Ok(())
            }
            Action::Setparam {
                key,
                value,
                description,
            } => self.setparam(ctx, key, value, &description),
            Action::Resetsttngs => self.resetsttngs(ctx),
        }
    }
}

// ============================================================================
// DaoRegistry
// ============================================================================

/// The registry contract with its action dispatcher.
#[derive(Debug, Clone)]
pub struct DaoRegistry {
    state: RegistryState,

    /// Number of successful actions so far
    sequence: u64,
}

impl DaoRegistry {
    /// Create an empty registry with the genesis settings of `config`
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        Ok(Self {
            state: RegistryState::new(config)?,
            sequence: 0,
        })
    }

    /// Account the registry runs under
    #[inline]
    pub fn account(&self) -> Name {
        self.state.account
    }

    /// Designated quote token
    #[inline]
    pub fn system_token(&self) -> SystemToken {
        self.state.system_token
    }

    /// Number of successful actions so far
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run one action atomically
    ///
    /// # Returns
    ///
    /// The receipt with any outbound requests the host must execute, or the
    /// error that aborted the action (state unchanged).
    pub fn apply(
        &mut self,
        ctx: &ActionContext,
        action: Action,
    ) -> Result<ActionReceipt, RegistryError> {
        let name = action.name();
        self.transact(name, |state, receipt| state.execute(ctx, action, receipt))
    }

    /// Deliver an inbound transfer notification
    ///
    /// Returns `Ok(None)` for notifications the registry ignores (not
    /// addressed to it, or the echo of its own outbound transfer).
    pub fn notify_transfer(
        &mut self,
        notification: TransferNotification,
    ) -> Result<Option<ActionReceipt>, RegistryError> {
        if notification.to != self.state.account || notification.from == self.state.account {
            debug!(
                from = %notification.from,
                to = %notification.to,
                "Ignoring transfer notification"
            );
            return Ok(None);
        }

        self.transact("transfer", |state, _| state.on_transfer(notification))
            .map(Some)
    }

    fn transact<F>(&mut self, name: &str, handler: F) -> Result<ActionReceipt, RegistryError>
    where
        F: FnOnce(&mut RegistryState, &mut ActionReceipt) -> Result<(), RegistryError>,
    {
        // Tables share rows with `self.state` until the handler writes them
        let mut staged = self.state.clone();
        let mut receipt = ActionReceipt::new(self.sequence + 1, name);

        match handler(&mut staged, &mut receipt) {
            Ok(()) => {
                self.state = staged;
                self.sequence += 1;
                debug!(action = name, sequence = self.sequence, "Action committed");
                Ok(receipt)
            }
            Err(err) => {
                warn!(action = name, %err, "Action rejected");
                Err(err)
            }
        }
    }

    // ========================================================================
    // Read accessors
    // ========================================================================

    pub fn dao(&self, dao_id: u64) -> Option<&Dao> {
        self.state.directory.get(dao_id)
    }

    /// All DAOs ordered by id
    pub fn daos(&self) -> impl Iterator<Item = &Dao> {
        self.state.directory.iter()
    }

    /// Id the next `create` will assign
    pub fn next_dao_id(&self) -> u64 {
        self.state.directory.next_id()
    }

    /// Balance rows of `owner` ordered by row id
    pub fn balances(&self, owner: Name) -> Vec<Balance> {
        self.state.ledger.balances(owner)
    }

    pub fn balance(&self, owner: Name, key: &TokenKey) -> Option<&Balance> {
        self.state.ledger.get(owner, key)
    }

    pub fn ledger(&self) -> &BalanceLedger {
        &self.state.ledger
    }

    /// Offers of one DAO ordered by offer id
    pub fn offers(&self, dao_id: u64) -> Vec<Offer> {
        self.state
            .books
            .get(dao_id)
            .map(|book| book.offers().cloned().collect())
            .unwrap_or_default()
    }

    pub fn offer(&self, dao_id: u64, offer_id: u64) -> Option<&Offer> {
        self.state.books.get(dao_id)?.get(offer_id)
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    /// Everything the registry owes for one token
    ///
    /// Σ(available + locked) over all balances plus the escrow of active
    /// offers. Equals the registry's balance on the token contract.
    pub fn liabilities(&self, key: &TokenKey) -> Result<u128, RegistryError> {
        let mut total = self.state.ledger.total_of(key);

        for (dao_id, book) in self.state.books.iter() {
            for offer in book.offers().filter(|offer| offer.is_active()) {
                if self.state.escrow_key(dao_id, offer) == *key {
                    total += offer.escrow()?.amount as u128;
                }
            }
        }

        Ok(total)
    }

    /// SHA-256 over the SSZ encoding of every balance and offer row
    ///
    /// Rows are visited in table order (owner then id, dao then offer id), so
    /// identical action sequences always give identical roots.
    pub fn state_root(&self) -> Result<[u8; 32], RegistryError> {
        let mut buffer = Vec::new();

        for (owner, balance) in self.state.ledger.iter() {
            buffer.extend(ssz_bytes(&owner)?);
            buffer.extend(ssz_bytes(balance)?);
        }

        for (dao_id, book) in self.state.books.iter() {
            buffer.extend_from_slice(&dao_id.to_le_bytes());
            for offer in book.offers() {
                buffer.extend(ssz_bytes(&offer.header())?);
                for record in &offer.conversion_info {
                    buffer.extend(ssz_bytes(record)?);
                }
            }
        }

        Ok(compute_hash(&buffer))
    }
}

fn ssz_bytes<T: SimpleSerialize>(value: &T) -> Result<Vec<u8>, RegistryError> {
    ssz_rs::serialize(value).map_err(|err| RegistryError::Encoding(format!("{err:?}")))
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    fn registry() -> DaoRegistry {
        DaoRegistry::new(&RegistryConfig::default()).unwrap()
    }

    #[test]
    fn test_require_auth() {
        let ctx = ActionContext::signed_by(name("alice"), 0);
        assert!(ctx.require_auth(name("alice")).is_ok());
        assert_eq!(
            ctx.require_auth(name("bob")).unwrap_err(),
            RegistryError::MissingAuthority(name("bob"))
        );
    }

    #[test]
    fn test_failed_action_leaves_state_untouched() {
        let mut registry = registry();
        let creator = name("creator");
        let ctx = ActionContext::signed_by(creator, 0);

        registry
            .apply(
                &ctx,
                Action::Create {
                    dao: name("firstdao"),
                    creator,
                    ipfs: "Qm".into(),
                },
            )
            .unwrap();
        let root = registry.state_root().unwrap();

        let err = registry
            .apply(
                &ctx,
                Action::Create {
                    dao: name("firstdao"),
                    creator,
                    ipfs: "Qm".into(),
                },
            )
            .unwrap_err();

        assert_eq!(err, RegistryError::DuplicateName(name("firstdao")));
        assert_eq!(registry.sequence(), 1);
        assert_eq!(registry.daos().count(), 1);
        assert_eq!(registry.state_root().unwrap(), root);
    }

    #[test]
    fn test_notification_filter() {
        let mut registry = registry();
        let account = registry.account();

        // Not addressed to the registry
        let outcome = registry
            .notify_transfer(TransferNotification {
                code: name("eosio.token"),
                from: name("alice"),
                to: name("bob"),
                quantity: "1.0000 TLOS".parse().unwrap(),
                memo: String::new(),
            })
            .unwrap();
        assert!(outcome.is_none());

        // Echo of an outbound transfer
        let outcome = registry
            .notify_transfer(TransferNotification {
                code: name("eosio.token"),
                from: account,
                to: account,
                quantity: "1.0000 TLOS".parse().unwrap(),
                memo: String::new(),
            })
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(registry.sequence(), 0);
    }

    #[test]
    fn test_action_names_and_json() {
        let action = Action::Canceloffer {
            dao_id: 1,
            offer_id: 0,
        };
        assert_eq!(action.name(), "canceloffer");

        let json = serde_json::to_value(&Action::Createoffer {
            dao_id: 1,
            creator: name("bob"),
            quantity: "1.0000 DTK".parse().unwrap(),
            price_per_unit: "0.1000 TLOS".parse().unwrap(),
            offer_type: OfferType::Sell,
        })
        .unwrap();
        assert_eq!(json["action"], "createoffer");
        assert_eq!(json["type"], "sell");
    }

    #[test]
    fn test_empty_state_root_is_stable() {
        assert_eq!(registry().state_root().unwrap(), registry().state_root().unwrap());
    }
}
