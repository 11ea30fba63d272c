//! Transaction runner.
//!
//! ## Transaction boundary
//!
//! A transaction is a list of actions signed by a set of accounts. Before
//! running it the chain snapshots the registry and every token contract;
//! the first failing step restores the snapshot and aborts the whole
//! transaction, including transfers that already ran. Tables and token
//! contracts are shared with the snapshot and copied on first write, so the
//! snapshot costs one pointer per contract, DAO, book and owner scope.
//!
//! ## Notifications
//!
//! Every token transfer that involves the registry account is delivered to
//! [`DaoRegistry::notify_transfer`] with the executing contract as `code`.
//! Outbound transfers the registry requests run inline, signed by the
//! registry, and are delivered the same way (the registry ignores its own
//! echo).

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::host::{TokenAction, TokenContract, TokenError};
use crate::registry::{Action, ActionContext, DaoRegistry, TransferNotification};
use crate::types::{ActionReceipt, Asset, Name, OutboundAction, Symbol};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("no contract deployed at {0}")]
    UnknownContract(Name),
}

impl ChainError {
    /// Registry error behind this failure, if any
    pub fn registry_error(&self) -> Option<&RegistryError> {
        match self {
            ChainError::Registry(err) => Some(err),
            _ => None,
        }
    }
}

/// One step of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionAction {
    Registry(Action),
    Token { contract: Name, action: TokenAction },
}

impl From<Action> for TransactionAction {
    fn from(action: Action) -> Self {
        TransactionAction::Registry(action)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub signers: Vec<Name>,
    pub actions: Vec<TransactionAction>,
}

impl Transaction {
    /// Single-action transaction signed by one account
    pub fn new(signer: Name, action: impl Into<TransactionAction>) -> Self {
        Self {
            signers: vec![signer],
            actions: vec![action.into()],
        }
    }

    /// Token transfer signed by `from`
    pub fn transfer(contract: Name, from: Name, to: Name, quantity: Asset, memo: &str) -> Self {
        Self::new(
            from,
            TransactionAction::Token {
                contract,
                action: TokenAction::Transfer {
                    from,
                    to,
                    quantity,
                    memo: memo.to_string(),
                },
            },
        )
    }
}

/// Registry receipts produced by one transaction, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionTrace {
    pub receipts: Vec<ActionReceipt>,
}

impl TransactionTrace {
    /// Receipt of the last registry action
    pub fn last(&self) -> Option<&ActionReceipt> {
        self.receipts.last()
    }
}

/// The in-process chain: one registry plus any number of token contracts.
#[derive(Debug, Clone)]
pub struct Chain {
    registry: DaoRegistry,
    tokens: BTreeMap<Name, Arc<TokenContract>>,

    /// Resource requests (RAM, bandwidth) the registry issued
    provisioning: Vec<OutboundAction>,

    /// Block time in seconds
    now: u64,
}

impl Chain {
    /// Chain with the registry and its quote token contract deployed
    pub fn new(config: &RegistryConfig) -> Result<Self, ChainError> {
        let mut chain = Self {
            registry: DaoRegistry::new(config)?,
            tokens: BTreeMap::new(),
            provisioning: Vec::new(),
            now: 0,
        };
        chain.deploy_token(config.system_token.contract);
        Ok(chain)
    }

    /// Deploy an empty token contract at `account` (no-op if one exists)
    pub fn deploy_token(&mut self, account: Name) {
        self.tokens
            .entry(account)
            .or_insert_with(|| Arc::new(TokenContract::new(account)));
    }

    pub fn registry(&self) -> &DaoRegistry {
        &self.registry
    }

    pub fn token(&self, account: Name) -> Option<&TokenContract> {
        self.tokens.get(&account).map(Arc::as_ref)
    }

    /// Balance of `owner` on token contract `contract`
    pub fn token_balance(&self, contract: Name, owner: Name, symbol: Symbol) -> Option<Asset> {
        self.tokens.get(&contract).map(|token| token.balance(owner, symbol))
    }

    pub fn provisioning(&self) -> &[OutboundAction] {
        &self.provisioning
    }

    #[inline]
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn advance_time(&mut self, seconds: u64) {
        self.now = self.now.saturating_add(seconds);
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run a transaction; all or nothing
    pub fn push(&mut self, transaction: Transaction) -> Result<TransactionTrace, ChainError> {
        let registry = self.registry.clone();
        let tokens = self.tokens.clone();
        let provisioned = self.provisioning.len();

        match self.execute(transaction) {
            Ok(trace) => Ok(trace),
            Err(err) => {
                self.registry = registry;
                self.tokens = tokens;
                self.provisioning.truncate(provisioned);
                warn!(%err, "Transaction rolled back");
                Err(err)
            }
        }
    }

    fn execute(&mut self, transaction: Transaction) -> Result<TransactionTrace, ChainError> {
        let ctx = ActionContext::new(transaction.signers, self.now);
        let mut trace = TransactionTrace::default();

        for action in transaction.actions {
            match action {
                TransactionAction::Registry(action) => {
                    let receipt = self.registry.apply(&ctx, action)?;
                    self.run_outbound(&receipt, &mut trace)?;
                    trace.receipts.push(receipt);
                }
                TransactionAction::Token { contract, action } => {
                    self.run_token_action(&ctx, contract, action, &mut trace)?;
                }
            }
        }

        Ok(trace)
    }

    fn run_token_action(
        &mut self,
        ctx: &ActionContext,
        contract: Name,
        action: TokenAction,
        trace: &mut TransactionTrace,
    ) -> Result<(), ChainError> {
        let token = self
            .tokens
            .get_mut(&contract)
            .map(Arc::make_mut)
            .ok_or(ChainError::UnknownContract(contract))?;

        match action {
            TokenAction::Create {
                issuer,
                maximum_supply,
            } => token.create(ctx, issuer, maximum_supply)?,
            TokenAction::Issue { to, quantity, memo } => token.issue(ctx, to, quantity, &memo)?,
            TokenAction::Transfer {
                from,
                to,
                quantity,
                memo,
            } => {
                token.transfer(ctx, from, to, quantity, &memo)?;
                self.notify(contract, from, to, quantity, memo, trace)?;
            }
        }
        Ok(())
    }

    /// Execute the registry's requests for this receipt
    fn run_outbound(&mut self, receipt: &ActionReceipt, trace: &mut TransactionTrace) -> Result<(), ChainError> {
        for request in &receipt.outbound {
            match request {
                OutboundAction::Transfer {
                    contract,
                    from,
                    to,
                    quantity,
                    memo,
                } => {
                    let ctx = ActionContext::signed_by(*from, self.now);
                    self.run_token_action(
                        &ctx,
                        *contract,
                        TokenAction::Transfer {
                            from: *from,
                            to: *to,
                            quantity: *quantity,
                            memo: memo.clone(),
                        },
                        trace,
                    )?;
                }
                OutboundAction::BuyRamBytes { .. } | OutboundAction::DelegateBandwidth { .. } => {
                    info!(request = ?request, "Resource request recorded");
                    self.provisioning.push(request.clone());
                }
            }
        }
        Ok(())
    }

    fn notify(
        &mut self,
        code: Name,
        from: Name,
        to: Name,
        quantity: Asset,
        memo: String,
        trace: &mut TransactionTrace,
    ) -> Result<(), ChainError> {
        let account = self.registry.account();
        if from != account && to != account {
            return Ok(());
        }

        let notification = TransferNotification {
            code,
            from,
            to,
            quantity,
            memo,
        };
        if let Some(receipt) = self.registry.notify_transfer(notification)? {
            trace.receipts.push(receipt);
        }
        Ok(())
    }
}
