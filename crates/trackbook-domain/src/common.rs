//! Shared traits, the amount type, and domain-level construction errors.

use std::fmt;

use rust_decimal::Decimal;

/// Exact decimal amount carried by splits. Positive is a debit, negative a credit.
pub type Amount = Decimal;

/// Provides read-only access to an entity's natural key.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Converts an entity into a short user-facing label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Errors raised while constructing domain values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The text does not name one of the five account types.
    UnknownAccountType(String),
    /// A split was built with a zero amount.
    ZeroAmount { account: String },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::UnknownAccountType(value) => {
                write!(f, "unknown account type `{value}`")
            }
            DomainError::ZeroAmount { account } => {
                write!(f, "split for `{account}` has a zero amount")
            }
        }
    }
}

impl std::error::Error for DomainError {}
