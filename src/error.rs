//! Registry errors.
//!
//! Every failure aborts the whole action; the message is what a rejected
//! transaction shows to the caller.

use thiserror::Error;

use crate::types::{Name, Symbol};

/// Error category of a [`RegistryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required signer is missing
    Authorization,
    /// DAO, balance, offer or setting does not exist
    NotFound,
    /// Name or token symbol already registered
    Duplicate,
    /// Malformed or out-of-range input
    Validation,
    /// Not enough available balance
    InsufficientFunds,
    /// Token not accepted in the requested scope
    UnsupportedToken,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    // ------------------------------------------------------------------
    // Authorization
    // ------------------------------------------------------------------
    #[error("missing authority of {0}")]
    MissingAuthority(Name),

    // ------------------------------------------------------------------
    // Not found
    // ------------------------------------------------------------------
    #[error("Organization not found")]
    OrgNotFound,

    #[error("No balance of this token is registered for the account")]
    TokenNotRegisteredForOwner,

    #[error("Offer not found")]
    OfferNotFound,

    #[error("setting {0} not found")]
    SettingNotFound(Name),

    // ------------------------------------------------------------------
    // Duplicate
    // ------------------------------------------------------------------
    #[error("dao with same name already registered")]
    DuplicateName(Name),

    #[error("This token symbol is already added")]
    DuplicateToken(Symbol),

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------
    #[error("quantity must be positive")]
    NonPositiveAmount,

    #[error("symbol precision mismatch: expected {expected}, found {found}")]
    PrecisionMismatch { expected: Symbol, found: Symbol },

    #[error("description has more than {max} bytes")]
    DescriptionTooLong { max: usize },

    #[error("memo has more than {max} bytes")]
    MemoTooLong { max: usize },

    #[error("Memo can not be empty, especify dao_id")]
    EmptyMemo,

    #[error("Dao id has to be a positive number")]
    NegativeDaoId,

    #[error("Memo must be a dao_id number, found {0:?}")]
    MalformedMemo(String),

    #[error("invalid name: {0:?}")]
    InvalidName(String),

    #[error("invalid symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("invalid asset: {0:?}")]
    InvalidAsset(String),

    #[error("setting {key} holds {found}, expected {expected}")]
    SettingTypeMismatch {
        key: Name,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Offer is not active")]
    OfferNotActive,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("state encoding failed: {0}")]
    Encoding(String),

    // ------------------------------------------------------------------
    // Funds
    // ------------------------------------------------------------------
    #[error("You do not have enough balance")]
    InsufficientBalance,

    // ------------------------------------------------------------------
    // Unsupported token
    // ------------------------------------------------------------------
    #[error("This is not a supported system token")]
    UnsupportedSystemToken,

    #[error("Token is not supported by a registred Dao")]
    UnsupportedToken,
}

impl RegistryError {
    /// Taxonomy category of this error
    pub fn kind(&self) -> ErrorKind {
        use RegistryError::*;

        match self {
            MissingAuthority(_) => ErrorKind::Authorization,
            OrgNotFound | TokenNotRegisteredForOwner | OfferNotFound | SettingNotFound(_) => {
                ErrorKind::NotFound
            }
            DuplicateName(_) | DuplicateToken(_) => ErrorKind::Duplicate,
            InsufficientBalance => ErrorKind::InsufficientFunds,
            UnsupportedSystemToken | UnsupportedToken => ErrorKind::UnsupportedToken,
            NonPositiveAmount
            | PrecisionMismatch { .. }
            | DescriptionTooLong { .. }
            | MemoTooLong { .. }
            | EmptyMemo
            | NegativeDaoId
            | MalformedMemo(_)
            | InvalidName(_)
            | InvalidSymbol(_)
            | InvalidAsset(_)
            | SettingTypeMismatch { .. }
            | OfferNotActive
            | Overflow
            | Encoding(_) => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_contract_wording() {
        assert_eq!(RegistryError::OrgNotFound.to_string(), "Organization not found");
        assert_eq!(
            RegistryError::EmptyMemo.to_string(),
            "Memo can not be empty, especify dao_id"
        );
        assert_eq!(
            RegistryError::InsufficientBalance.to_string(),
            "You do not have enough balance"
        );

        let firstuser: Name = "firstuser".parse().unwrap();
        assert_eq!(
            RegistryError::MissingAuthority(firstuser).to_string(),
            "missing authority of firstuser"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(RegistryError::NegativeDaoId.kind(), ErrorKind::Validation);
        assert_eq!(RegistryError::InsufficientBalance.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(RegistryError::UnsupportedSystemToken.kind(), ErrorKind::UnsupportedToken);
        assert_eq!(RegistryError::OfferNotFound.kind(), ErrorKind::NotFound);

        let symbol: Symbol = "4,DTK".parse().unwrap();
        assert_eq!(RegistryError::DuplicateToken(symbol).kind(), ErrorKind::Duplicate);
    }
}
