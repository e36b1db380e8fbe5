//! Ledger service used by front-ends: ties the shared ledger to its
//! persistence and clock collaborators.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};
use trackbook_domain::{
    Account, Amount, Transaction, TransactionDraft, TransactionId, TransactionPatch,
};

use crate::{
    error::{CoreError, CoreResult},
    ledger::{AccountRemoval, Ledger},
    registry::AccountUpdate,
    shared::SharedLedger,
    storage::LedgerStorage,
    time::Clock,
};

/// Coordinates ledger state with persistence.
///
/// Every mutation runs against a copy of the ledger; the copy is saved and only
/// then becomes visible to readers.
pub struct Book {
    ledger: SharedLedger,
    storage: Box<dyn LedgerStorage>,
    clock: Box<dyn Clock>,
    substitute_fallback: Option<String>,
    /// Set when storage may disagree with memory; the next commit rewrites both collections.
    needs_full_save: AtomicBool,
}

impl Book {
    /// Loads both collections from `storage` and rebuilds the ledger from them.
    pub fn open(storage: Box<dyn LedgerStorage>, clock: Box<dyn Clock>) -> CoreResult<Self> {
        let accounts = storage.load_accounts()?;
        let transactions = storage.load_transactions()?;
        let ledger = Ledger::from_parts(accounts, transactions)?;
        Ok(Self {
            ledger: SharedLedger::new(ledger),
            storage,
            clock,
            substitute_fallback: None,
            needs_full_save: AtomicBool::new(false),
        })
    }

    /// Account that receives splits of deleted accounts when the caller names none.
    pub fn with_substitute_fallback(mut self, substitute: Option<String>) -> Self {
        self.substitute_fallback = substitute.filter(|name| !name.trim().is_empty());
        self
    }

    /// Handle for readers on other threads.
    pub fn shared(&self) -> SharedLedger {
        self.ledger.clone()
    }

    pub fn snapshot(&self) -> CoreResult<Ledger> {
        self.ledger.snapshot()
    }

    // Accounts

    pub fn add_account(&self, account: Account) -> CoreResult<Account> {
        self.mutate(|ledger| ledger.add_account(account).cloned())
    }

    pub fn open_account(
        &self,
        name: &str,
        account_type: &str,
        description: Option<&str>,
        hidden: Option<bool>,
    ) -> CoreResult<Account> {
        self.mutate(|ledger| {
            ledger
                .open_account(name, account_type, description, hidden)
                .cloned()
        })
    }

    pub fn update_account(&self, name: &str, update: AccountUpdate) -> CoreResult<Account> {
        self.mutate(|ledger| ledger.update_account(name, update).cloned())
    }

    pub fn rename_account(&self, old_name: &str, new_name: &str) -> CoreResult<()> {
        self.mutate(|ledger| ledger.rename_account(old_name, new_name))
    }

    /// Deletes an account. Without an explicit substitute the configured fallback
    /// is used unless it names the account itself; without either, referencing
    /// transactions are deleted.
    pub fn delete_account(
        &self,
        name: &str,
        substitute: Option<&str>,
    ) -> CoreResult<AccountRemoval> {
        let fallback = self
            .substitute_fallback
            .as_deref()
            .filter(|fallback| fallback.trim() != name.trim());
        let substitute = substitute.or(fallback);
        self.mutate(|ledger| ledger.delete_account(name, substitute))
    }

    pub fn account(&self, name: &str) -> CoreResult<Option<Account>> {
        self.ledger.read(|ledger| ledger.account(name).cloned())
    }

    pub fn accounts(&self) -> CoreResult<Vec<Account>> {
        self.ledger
            .read(|ledger| ledger.accounts().cloned().collect())
    }

    pub fn balance_of(&self, name: &str) -> CoreResult<Option<Amount>> {
        self.ledger.read(|ledger| ledger.balance_of(name))
    }

    // Transactions

    /// Records a draft, dating it today when it carries no date.
    pub fn add_transaction(&self, draft: TransactionDraft) -> CoreResult<TransactionId> {
        let today = self.clock.today();
        self.mutate(|ledger| ledger.record(draft, today))
    }

    pub fn edit_transaction(
        &self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> CoreResult<Transaction> {
        self.mutate(|ledger| {
            ledger.edit_transaction(id, patch)?;
            ledger
                .transaction(id)
                .cloned()
                .ok_or(CoreError::TransactionNotFound(id))
        })
    }

    pub fn delete_transaction(&self, id: TransactionId) -> CoreResult<Transaction> {
        self.mutate(|ledger| ledger.delete_transaction(id))
    }

    pub fn transaction(&self, id: TransactionId) -> CoreResult<Option<Transaction>> {
        self.ledger.read(|ledger| ledger.transaction(id).cloned())
    }

    /// Journal most recent first.
    pub fn transactions(&self) -> CoreResult<Vec<Transaction>> {
        self.ledger.read(|ledger| {
            ledger
                .transactions_by_date()
                .into_iter()
                .cloned()
                .collect()
        })
    }

    pub fn transactions_involving(&self, name: &str) -> CoreResult<Vec<Transaction>> {
        self.ledger.read(|ledger| {
            ledger
                .transactions_involving(name.trim())
                .cloned()
                .collect()
        })
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut Ledger) -> CoreResult<T>) -> CoreResult<T> {
        self.ledger
            .update(f, |before, after| self.persist(before, after))
    }

    /// Saves whichever collections differ between `before` and `after`.
    ///
    /// If transactions fail to save after accounts were written, the previous
    /// accounts are written back so storage keeps matching `before`.
    fn persist(&self, before: &Ledger, after: &Ledger) -> CoreResult<()> {
        let full = self.needs_full_save.load(Ordering::SeqCst);
        let accounts_changed = full || before.registry() != after.registry();
        if accounts_changed {
            let accounts: Vec<Account> = after.accounts().cloned().collect();
            self.storage.save_accounts(&accounts)?;
            debug!(accounts = accounts.len(), "accounts saved");
        }
        if full || before.transactions() != after.transactions() {
            if let Err(err) = self.storage.save_transactions(after.transactions()) {
                if accounts_changed {
                    self.restore_accounts(before);
                }
                return Err(err);
            }
            debug!(transactions = after.len(), "transactions saved");
        }
        if full {
            self.needs_full_save.store(false, Ordering::SeqCst);
            debug!("storage resynchronised");
        }
        Ok(())
    }

    fn restore_accounts(&self, before: &Ledger) {
        let accounts: Vec<Account> = before.accounts().cloned().collect();
        match self.storage.save_accounts(&accounts) {
            Ok(()) => warn!("transactions not saved, previous accounts restored"),
            Err(err) => {
                warn!(error = %err, "could not restore accounts, next commit rewrites storage");
                self.needs_full_save.store(true, Ordering::SeqCst);
            }
        }
    }
}

impl std::fmt::Debug for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Book")
            .field("ledger", &self.ledger)
            .field("substitute_fallback", &self.substitute_fallback)
            .finish_non_exhaustive()
    }
}
