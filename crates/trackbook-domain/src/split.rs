//! Transaction legs.

use serde::{Deserialize, Serialize};

use crate::common::*;

/// One leg of a transaction: a signed amount applied to one account.
///
/// The account is referenced by name. Whether it exists is decided when the
/// owning transaction is validated, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Split {
    pub account_name: String,
    pub amount: Amount,
    #[serde(default)]
    pub description: String,
}

impl Split {
    /// Builds a split, rejecting a zero amount.
    pub fn new(
        amount: impl Into<Amount>,
        account_name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let amount = amount.into();
        let account_name = account_name.into();
        if amount.is_zero() {
            return Err(DomainError::ZeroAmount {
                account: account_name,
            });
        }
        Ok(Self {
            account_name,
            amount,
            description: String::new(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_debit(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    pub fn is_credit(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }
}
