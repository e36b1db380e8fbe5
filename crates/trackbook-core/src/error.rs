use std::io;

use thiserror::Error;
use trackbook_domain::{Amount, DomainError, TransactionId};

pub type CoreResult<T> = Result<T, CoreError>;

/// Why a candidate set of splits is not a valid transaction.
///
/// Only the first failing rule is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("A transaction needs at least two splits, got {count}")]
    TooFewSplits { count: usize },
    #[error("Splits do not balance: total is {total}")]
    Unbalanced { total: Amount },
    #[error("Split #{index} has a zero amount")]
    ZeroAmountSplit { index: usize },
    #[error("Unknown account: {0}")]
    UnknownAccount(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Account already exists: {0}")]
    DuplicateName(String),
    #[error("Invalid account type: {0}")]
    InvalidType(String),
    #[error("Account name must not be empty")]
    EmptyName,
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),
    #[error("Transaction already recorded: {0}")]
    DuplicateTransaction(TransactionId),
    #[error("Account `{0}` cannot be its own substitute")]
    InvalidSubstitute(String),
    #[error("Split for `{0}` has a zero amount")]
    ZeroAmount(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Ledger lock poisoned")]
    LockPoisoned,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Coarse error categories callers can branch on without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateName,
    DuplicateId,
    InvalidType,
    InvalidName,
    NotFound,
    TooFewSplits,
    Unbalanced,
    ZeroAmountSplit,
    UnknownAccount,
    Collaborator,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::DuplicateName(_) => ErrorKind::DuplicateName,
            CoreError::DuplicateTransaction(_) => ErrorKind::DuplicateId,
            CoreError::InvalidType(_) => ErrorKind::InvalidType,
            CoreError::EmptyName | CoreError::InvalidSubstitute(_) => ErrorKind::InvalidName,
            CoreError::AccountNotFound(_) | CoreError::TransactionNotFound(_) => {
                ErrorKind::NotFound
            }
            CoreError::ZeroAmount(_) => ErrorKind::ZeroAmountSplit,
            CoreError::Validation(err) => match err {
                ValidationError::TooFewSplits { .. } => ErrorKind::TooFewSplits,
                ValidationError::Unbalanced { .. } => ErrorKind::Unbalanced,
                ValidationError::ZeroAmountSplit { .. } => ErrorKind::ZeroAmountSplit,
                ValidationError::UnknownAccount(_) => ErrorKind::UnknownAccount,
            },
            CoreError::LockPoisoned
            | CoreError::Storage(_)
            | CoreError::Serde(_)
            | CoreError::Io(_) => ErrorKind::Collaborator,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::UnknownAccountType(value) => CoreError::InvalidType(value),
            DomainError::ZeroAmount { account } => CoreError::ZeroAmount(account),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn validation_errors_display_their_detail() {
        let err = CoreError::from(ValidationError::Unbalanced { total: dec!(-10) });
        assert_eq!(err.to_string(), "Splits do not balance: total is -10");
        assert_eq!(err.kind(), ErrorKind::Unbalanced);
    }

    #[test]
    fn domain_errors_map_to_core_taxonomy() {
        let err = CoreError::from(DomainError::UnknownAccountType("savings".into()));
        assert!(matches!(err, CoreError::InvalidType(ref value) if value == "savings"));
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn not_found_covers_accounts_and_transactions() {
        assert!(CoreError::AccountNotFound("Cash".into()).is_not_found());
        assert!(CoreError::TransactionNotFound(TransactionId::new()).is_not_found());
        assert!(!CoreError::EmptyName.is_not_found());
    }
}
