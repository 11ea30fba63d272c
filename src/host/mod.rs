//! In-process host for the registry.
//!
//! Stands in for the chain: deploys token contracts, runs signed
//! transactions atomically, delivers transfer notifications and executes the
//! registry's outbound requests.
//!
//! ## Example
//!
//! ```
//! use dao_registry::config::RegistryConfig;
//! use dao_registry::host::{Chain, Transaction};
//! use dao_registry::registry::Action;
//!
//! let mut chain = Chain::new(&RegistryConfig::default()).unwrap();
//! let creator = "creator".parse().unwrap();
//!
//! chain
//!     .push(Transaction::new(
//!         creator,
//!         Action::Create {
//!             dao: "firstdao".parse().unwrap(),
//!             creator,
//!             ipfs: "QmHash".into(),
//!         },
//!     ))
//!     .unwrap();
//!
//! assert_eq!(chain.registry().daos().count(), 1);
//! ```

mod chain;
mod token;

pub use chain::{Chain, ChainError, Transaction, TransactionAction, TransactionTrace};
pub use token::{TokenAction, TokenContract, TokenError};
