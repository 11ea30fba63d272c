//! Matching engine for the offer books.
//!
//! ## Design Principles
//!
//! 1. **Determinism**: Same input always produces same output
//! 2. **Fixed-Point Math**: Quote totals use `rust_decimal`, never floats
//! 3. **Synchronous Execution**: Runs inside `createoffer`, before any row is inserted
//! 4. **Time Priority**: Oldest exact fit first
//!
//! ## Matching Rules
//!
//! - An incoming **buy** matches a resting **sell** (and vice versa)
//! - Token, price and open quantity must be identical
//! - **No partial fills**: an offer is consumed whole or not at all
//! - An unmatched offer rests on the book
//!
//! ## Example
//!
//! ```
//! use dao_registry::engine::{IncomingOffer, MatchResult, MatchingEngine, SettlementAccounts};
//! use dao_registry::ledger::{BalanceLedger, TokenKey};
//! use dao_registry::orderbook::OfferBook;
//! use dao_registry::types::{Offer, OfferType};
//!
//! let mut book = OfferBook::new();
//! let mut ledger = BalanceLedger::new();
//! let engine = MatchingEngine::new();
//!
//! // Resting sell
//! book.insert(Offer::new(
//!     0,
//!     "bob".parse().unwrap(),
//!     "1.0000 DTK".parse().unwrap(),
//!     "0.1000 TLOS".parse().unwrap(),
//!     OfferType::Sell,
//!     0,
//!     "token.c".parse().unwrap(),
//!     0,
//! ));
//!
//! // Incoming buy at the same price and quantity
//! let buy = IncomingOffer {
//!     dao_id: 1,
//!     creator: "alice".parse().unwrap(),
//!     quantity: "1.0000 DTK".parse().unwrap(),
//!     price_per_unit: "0.1000 TLOS".parse().unwrap(),
//!     offer_type: OfferType::Buy,
//!     token_idx: 0,
//!     token_contract: "token.c".parse().unwrap(),
//! };
//! let accounts = SettlementAccounts {
//!     base: TokenKey::new(1, "token.c".parse().unwrap(), "4,DTK".parse().unwrap()),
//!     quote: TokenKey::new(0, "eosio.token".parse().unwrap(), "4,TLOS".parse().unwrap()),
//! };
//!
//! let result = engine.match_offer(&mut book, &mut ledger, &buy, &accounts, 1).unwrap();
//! assert!(matches!(result, MatchResult::Matched(_)));
//! assert!(!book.get(0).unwrap().is_active());
//! ```

pub mod matcher;

pub use matcher::{IncomingOffer, MatchResult, MatchingEngine, SettlementAccounts};
