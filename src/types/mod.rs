//! Core data types for the DAO registry
//!
//! Ledger rows implement SSZ serialization for deterministic state roots.
//! All amounts are fixed-point integers tagged with a symbol.
//!
//! ## Types
//!
//! - [`Name`]: 64-bit account identifier
//! - [`Symbol`], [`Asset`]: token symbol and fixed-point amount
//! - [`VariantValue`]: typed value for DAO attributes and settings
//! - [`Balance`]: one owner's holding of one token in one DAO scope
//! - [`Offer`]: a resting buy or sell order
//! - [`Settlement`]: an executed match between two offers
//! - [`ActionReceipt`]: result of one registry action

mod name;
mod asset;
mod value;
mod balance;
mod offer;
mod settlement;
mod receipt;

pub use name::Name;
pub use asset::{Asset, Symbol, MAX_PRECISION};
pub use value::VariantValue;
pub use balance::Balance;
pub use offer::{ConversionRecord, Offer, OfferStatus, OfferType};
pub use settlement::Settlement;
pub use receipt::{compute_hash, ActionReceipt, OfferOutcome, OutboundAction};

/// Text-form serde for types that implement `Display` + `FromStr`.
///
/// Names, symbols and assets appear in JSON and TOML the same way they are
/// written by hand: `"firstdao"`, `"4,DTK"`, `"100.0000 DTK"`.
macro_rules! impl_serde_via_str {
    ($($ty:ty),* $(,)?) => {$(
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = <String as serde::Deserialize>::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    )*};
}

impl_serde_via_str!(Name, Symbol, Asset);
