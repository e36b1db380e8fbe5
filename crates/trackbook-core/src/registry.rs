//! Chart of accounts keyed by unique account name.
//!
//! The registry only manages account records. Operations that must also
//! rewrite splits (rename, delete) are orchestrated by [`crate::Ledger`].

use std::collections::BTreeMap;

use trackbook_domain::{Account, AccountType};

use crate::error::{CoreError, CoreResult};

/// Trims surrounding whitespace and rejects names that end up empty.
pub fn normalize_name(name: &str) -> CoreResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(CoreError::EmptyName)
    } else {
        Ok(trimmed)
    }
}

/// Partial update for descriptive account fields. The name is changed through rename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountUpdate {
    pub account_type: Option<AccountType>,
    pub description: Option<String>,
    pub hidden: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountRegistry {
    accounts: BTreeMap<String, Account>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an account after trimming its name.
    pub fn add(&mut self, mut account: Account) -> CoreResult<&Account> {
        let name = normalize_name(&account.name)?.to_string();
        if self.accounts.contains_key(&name) {
            return Err(CoreError::DuplicateName(name));
        }
        account.name = name.clone();
        Ok(&*self.accounts.entry(name).or_insert(account))
    }

    pub fn lookup(&self, name: &str) -> Option<&Account> {
        self.accounts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.accounts.contains_key(name)
    }

    /// Iterates accounts ordered by name. Clone the iterator to restart it.
    pub fn all(&self) -> impl Iterator<Item = &Account> + Clone {
        self.accounts.values()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn update(&mut self, name: &str, update: AccountUpdate) -> CoreResult<&Account> {
        let account = self
            .accounts
            .get_mut(name)
            .ok_or_else(|| CoreError::AccountNotFound(name.to_string()))?;
        if let Some(account_type) = update.account_type {
            account.account_type = account_type;
        }
        if let Some(description) = update.description {
            account.description = description;
        }
        if let Some(hidden) = update.hidden {
            account.hidden = hidden;
        }
        Ok(&*account)
    }

    /// Re-keys a single account record. Split references are not touched.
    pub(crate) fn rename_record(&mut self, old_name: &str, new_name: &str) -> CoreResult<()> {
        if self.accounts.contains_key(new_name) {
            return Err(CoreError::DuplicateName(new_name.to_string()));
        }
        let mut account = self
            .accounts
            .remove(old_name)
            .ok_or_else(|| CoreError::AccountNotFound(old_name.to_string()))?;
        account.name = new_name.to_string();
        self.accounts.insert(new_name.to_string(), account);
        Ok(())
    }

    pub(crate) fn remove(&mut self, name: &str) -> CoreResult<Account> {
        self.accounts
            .remove(name)
            .ok_or_else(|| CoreError::AccountNotFound(name.to_string()))
    }
}
