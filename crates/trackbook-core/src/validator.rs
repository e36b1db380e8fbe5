//! Decides whether a candidate set of splits forms a valid transaction.

use std::collections::{BTreeSet, HashSet};

use rust_decimal::Decimal;
use trackbook_domain::Split;

use crate::{error::ValidationError, registry::AccountRegistry};

/// Read-only view of which account names exist.
pub trait AccountLookup {
    fn has_account(&self, name: &str) -> bool;
}

impl AccountLookup for AccountRegistry {
    fn has_account(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl AccountLookup for HashSet<String> {
    fn has_account(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl AccountLookup for BTreeSet<String> {
    fn has_account(&self, name: &str) -> bool {
        self.contains(name)
    }
}

/// Checks, in order: split count, balance, non-zero amounts, known accounts.
///
/// Returns the first rule that fails. An overflowing sum is reported as unbalanced.
pub fn validate<R>(splits: &[Split], accounts: &R) -> Result<(), ValidationError>
where
    R: AccountLookup + ?Sized,
{
    if splits.len() < 2 {
        return Err(ValidationError::TooFewSplits {
            count: splits.len(),
        });
    }

    match exact_total(splits) {
        Some(total) if total.is_zero() => {}
        Some(total) => return Err(ValidationError::Unbalanced { total }),
        None => {
            return Err(ValidationError::Unbalanced {
                total: Decimal::MAX,
            })
        }
    }

    if let Some(index) = splits.iter().position(|split| split.amount.is_zero()) {
        return Err(ValidationError::ZeroAmountSplit { index });
    }

    if let Some(split) = splits
        .iter()
        .find(|split| !accounts.has_account(&split.account_name))
    {
        return Err(ValidationError::UnknownAccount(split.account_name.clone()));
    }

    Ok(())
}

/// Sums the amounts without rounding, or `None` when the sum cannot be held exactly.
///
/// `Decimal` addition rounds once the mantissa runs out, so the mantissas are
/// rescaled to a common scale and added as `i128`.
fn exact_total(splits: &[Split]) -> Option<Decimal> {
    let amounts: Vec<Decimal> = splits.iter().map(|split| split.amount.normalize()).collect();
    let scale = amounts.iter().map(Decimal::scale).max().unwrap_or(0);
    let mut sum: i128 = 0;
    for amount in &amounts {
        let factor = 10_i128.checked_pow(scale - amount.scale())?;
        sum = sum.checked_add(amount.mantissa().checked_mul(factor)?)?;
    }
    Decimal::try_from_i128_with_scale(sum, scale).ok()
}
