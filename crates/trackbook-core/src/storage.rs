use std::sync::RwLock;

use trackbook_domain::{Account, Transaction};

use crate::error::{CoreError, CoreResult};

/// Abstraction over persistence backends that hold the chart of accounts and the journal.
///
/// Each collection is saved as a whole; a save replaces whatever was stored before.
pub trait LedgerStorage: Send + Sync {
    fn load_accounts(&self) -> CoreResult<Vec<Account>>;
    fn save_accounts(&self, accounts: &[Account]) -> CoreResult<()>;
    fn load_transactions(&self) -> CoreResult<Vec<Transaction>>;
    fn save_transactions(&self, transactions: &[Transaction]) -> CoreResult<()>;
}

/// Keeps both collections in process memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    accounts: RwLock<Vec<Account>>,
    transactions: RwLock<Vec<Transaction>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store, as if a previous session had saved these records.
    pub fn with_records(accounts: Vec<Account>, transactions: Vec<Transaction>) -> Self {
        Self {
            accounts: RwLock::new(accounts),
            transactions: RwLock::new(transactions),
        }
    }
}

impl LedgerStorage for MemoryStorage {
    fn load_accounts(&self) -> CoreResult<Vec<Account>> {
        self.accounts
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| CoreError::LockPoisoned)
    }

    fn save_accounts(&self, accounts: &[Account]) -> CoreResult<()> {
        let mut guard = self.accounts.write().map_err(|_| CoreError::LockPoisoned)?;
        *guard = accounts.to_vec();
        Ok(())
    }

    fn load_transactions(&self) -> CoreResult<Vec<Transaction>> {
        self.transactions
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| CoreError::LockPoisoned)
    }

    fn save_transactions(&self, transactions: &[Transaction]) -> CoreResult<()> {
        let mut guard = self
            .transactions
            .write()
            .map_err(|_| CoreError::LockPoisoned)?;
        *guard = transactions.to_vec();
        Ok(())
    }
}

impl<S: LedgerStorage + ?Sized> LedgerStorage for std::sync::Arc<S> {
    fn load_accounts(&self) -> CoreResult<Vec<Account>> {
        (**self).load_accounts()
    }

    fn save_accounts(&self, accounts: &[Account]) -> CoreResult<()> {
        (**self).save_accounts(accounts)
    }

    fn load_transactions(&self) -> CoreResult<Vec<Transaction>> {
        (**self).load_transactions()
    }

    fn save_transactions(&self, transactions: &[Transaction]) -> CoreResult<()> {
        (**self).save_transactions(transactions)
    }
}
