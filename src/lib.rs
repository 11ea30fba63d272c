//! # DAO Registry
//!
//! On-chain registry for organizations (DAOs) with a custodial token ledger
//! and an exact-match offer book.
//!
//! ## Architecture
//!
//! The registry consists of:
//! - **Types**: Core data structures (Name, Asset, Balance, Offer, Settlement)
//! - **Registry**: DAO directory, per-DAO token lists, settings and the action dispatcher
//! - **Ledger**: Owner-scoped balances, deposits and withdrawals
//! - **OrderBook**: Per-DAO offer books with slab-based storage
//! - **Engine**: Deterministic exact-match settlement
//! - **Host**: In-process token contracts and transaction runner
//!
//! ## Design Principles
//!
//! 1. **Determinism**: Identical action sequences produce identical state roots
//! 2. **No Floating Point**: Amounts are fixed-point integers tagged with a symbol
//! 3. **Atomicity**: Every action commits fully or not at all
//! 4. **Synchronous Execution**: One action runs to completion before the next
//!
//! ## Conservation
//!
//! For every token, the sum of all balances plus the escrow of active offers
//! equals what the registry holds on the token contract.

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: Name, Asset, Balance, Offer, Settlement, ActionReceipt
pub mod types;

/// Registry error type
pub mod error;

/// Registry configuration (TOML)
pub mod config;

/// Balance ledger: owner-scoped rows, deposit and withdraw
pub mod ledger;

/// Registry contract: directory, tokens, settings, dispatcher
pub mod registry;

/// Offer books: slab storage with FIFO price levels
pub mod orderbook;

/// Matching engine: deterministic exact matching
pub mod engine;

/// In-process host: token contracts and transactions
pub mod host;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use config::RegistryConfig;
pub use engine::{MatchResult, MatchingEngine};
pub use error::{ErrorKind, RegistryError};
pub use host::{Chain, ChainError, Transaction};
pub use ledger::{BalanceLedger, TokenKey};
pub use orderbook::{OfferBook, PriceLevel};
pub use registry::{Action, ActionContext, DaoRegistry};
pub use types::{Asset, Balance, Name, Offer, OfferType, Settlement, Symbol};
