//! The ledger aggregate: chart of accounts plus the journal of balanced transactions.
//!
//! Every mutation is validated before anything is written, so a failed call
//! leaves both the registry and the journal exactly as they were.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use trackbook_domain::{
    Account, AccountType, Amount, Split, Transaction, TransactionDraft, TransactionId,
    TransactionPatch,
};

use crate::{
    error::{CoreError, CoreResult},
    registry::{normalize_name, AccountRegistry, AccountUpdate},
    validator::validate,
};

/// What happened to the journal when an account was deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountRemoval {
    /// No split referenced the account.
    Unreferenced,
    /// Splits were re-pointed at the substitute account.
    Migrated {
        substitute: String,
        created_substitute: bool,
        splits_moved: usize,
    },
    /// Every transaction touching the account was deleted with it.
    Cascaded { removed: Vec<TransactionId> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    registry: AccountRegistry,
    journal: Vec<Transaction>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from persisted records, re-checking every invariant.
    pub fn from_parts(
        accounts: impl IntoIterator<Item = Account>,
        transactions: impl IntoIterator<Item = Transaction>,
    ) -> CoreResult<Self> {
        let mut ledger = Self::new();
        for account in accounts {
            ledger.registry.add(account)?;
        }
        for transaction in transactions {
            ledger.insert_validated(transaction)?;
        }
        debug!(
            accounts = ledger.registry.len(),
            transactions = ledger.journal.len(),
            "ledger rebuilt from records"
        );
        Ok(ledger)
    }

    pub fn into_parts(self) -> (Vec<Account>, Vec<Transaction>) {
        (self.registry.all().cloned().collect(), self.journal)
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    // Accounts

    pub fn account(&self, name: &str) -> Option<&Account> {
        self.registry.lookup(name.trim())
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> + Clone {
        self.registry.all()
    }

    pub fn add_account(&mut self, account: Account) -> CoreResult<&Account> {
        let added = self.registry.add(account)?;
        info!(account = %added.name, kind = %added.account_type, "account added");
        Ok(added)
    }

    /// Adds an account from loosely typed input, parsing the account type name.
    pub fn open_account(
        &mut self,
        name: &str,
        account_type: &str,
        description: Option<&str>,
        hidden: Option<bool>,
    ) -> CoreResult<&Account> {
        let account_type: AccountType = account_type.parse()?;
        let account = Account::new(name, account_type)
            .with_description(description.unwrap_or_default())
            .hidden(hidden.unwrap_or(false));
        self.add_account(account)
    }

    pub fn update_account(&mut self, name: &str, update: AccountUpdate) -> CoreResult<&Account> {
        self.registry.update(name.trim(), update)
    }

    /// Renames an account and re-points every split that referenced it.
    pub fn rename_account(&mut self, old_name: &str, new_name: &str) -> CoreResult<()> {
        let old_name = old_name.trim();
        let new_name = normalize_name(new_name)?;
        if !self.registry.contains(old_name) {
            return Err(CoreError::AccountNotFound(old_name.to_string()));
        }
        if old_name == new_name {
            return Ok(());
        }

        let mut registry = self.registry.clone();
        registry.rename_record(old_name, new_name)?;
        let rewritten = self.retarget_splits(old_name, new_name, &registry)?;
        let touched = rewritten.len();

        self.registry = registry;
        self.apply_rewrites(rewritten);
        info!(from = old_name, to = new_name, transactions = touched, "account renamed");
        Ok(())
    }

    /// Deletes an account, first migrating or removing whatever references it.
    ///
    /// With a substitute, referencing splits move to it (creating it with the
    /// deleted account's type when missing). Without one, every referencing
    /// transaction is deleted.
    pub fn delete_account(
        &mut self,
        name: &str,
        substitute: Option<&str>,
    ) -> CoreResult<AccountRemoval> {
        let name = name.trim();
        let account_type = self
            .registry
            .lookup(name)
            .map(|account| account.account_type)
            .ok_or_else(|| CoreError::AccountNotFound(name.to_string()))?;

        if !self.journal.iter().any(|txn| txn.involves(name)) {
            self.registry.remove(name)?;
            info!(account = name, "account deleted");
            return Ok(AccountRemoval::Unreferenced);
        }

        match substitute {
            Some(substitute) => {
                let substitute = normalize_name(substitute)?;
                if substitute == name {
                    return Err(CoreError::InvalidSubstitute(name.to_string()));
                }
                let mut registry = self.registry.clone();
                let created_substitute = !registry.contains(substitute);
                if created_substitute {
                    registry.add(Account::new(substitute, account_type))?;
                }
                registry.remove(name)?;
                let splits_moved = self.splits_for(name).count();
                let rewritten = self.retarget_splits(name, substitute, &registry)?;

                self.registry = registry;
                self.apply_rewrites(rewritten);
                info!(
                    account = name,
                    substitute,
                    created_substitute,
                    "account deleted, splits migrated"
                );
                Ok(AccountRemoval::Migrated {
                    substitute: substitute.to_string(),
                    created_substitute,
                    splits_moved,
                })
            }
            None => {
                self.registry.remove(name)?;
                let mut removed = Vec::new();
                self.journal.retain(|txn| {
                    if txn.involves(name) {
                        removed.push(txn.id);
                        false
                    } else {
                        true
                    }
                });
                warn!(
                    account = name,
                    removed = removed.len(),
                    "account deleted together with its transactions"
                );
                Ok(AccountRemoval::Cascaded { removed })
            }
        }
    }

    // Transactions

    /// Validates and appends a transaction, returning its identifier.
    pub fn add_transaction(&mut self, transaction: Transaction) -> CoreResult<TransactionId> {
        let id = self.insert_validated(transaction)?;
        info!(transaction = %id, "transaction added");
        Ok(id)
    }

    /// Convenience over [`Ledger::add_transaction`] for callers holding a draft.
    pub fn record(
        &mut self,
        draft: TransactionDraft,
        today: NaiveDate,
    ) -> CoreResult<TransactionId> {
        self.add_transaction(draft.into_transaction(today))
    }

    /// Replaces fields of a stored transaction after re-validating the result as a whole.
    pub fn edit_transaction(
        &mut self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> CoreResult<()> {
        let index = self.position(id)?;
        let edited = patch.apply_to(&self.journal[index]);
        validate(&edited.splits, &self.registry).map_err(|err| {
            debug!(transaction = %id, error = %err, "edit rejected");
            err
        })?;
        self.journal[index] = edited;
        info!(transaction = %id, "transaction edited");
        Ok(())
    }

    pub fn delete_transaction(&mut self, id: TransactionId) -> CoreResult<Transaction> {
        let index = self.position(id)?;
        let removed = self.journal.remove(index);
        info!(transaction = %id, "transaction deleted");
        Ok(removed)
    }

    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.journal.iter().find(|txn| txn.id == id)
    }

    /// Journal in insertion order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.journal
    }

    /// Journal ordered most recent first; same-day entries keep insertion order.
    pub fn transactions_by_date(&self) -> Vec<&Transaction> {
        let mut ordered: Vec<&Transaction> = self.journal.iter().collect();
        ordered.sort_by(|a, b| b.date.cmp(&a.date));
        ordered
    }

    pub fn transactions_involving<'a>(
        &'a self,
        account_name: &'a str,
    ) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.journal
            .iter()
            .filter(move |txn| txn.involves(account_name))
    }

    pub fn splits_for<'a>(
        &'a self,
        account_name: &'a str,
    ) -> impl Iterator<Item = &'a Split> + 'a {
        self.journal
            .iter()
            .flat_map(|txn| txn.splits.iter())
            .filter(move |split| split.account_name == account_name)
    }

    /// Sum of every split on the account, or `None` if the account does not exist.
    pub fn balance_of(&self, account_name: &str) -> Option<Amount> {
        let account = self.registry.lookup(account_name.trim())?;
        Some(self.splits_for(&account.name).map(|split| split.amount).sum())
    }

    pub fn len(&self) -> usize {
        self.journal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journal.is_empty()
    }

    /// Names referenced by splits but missing from the registry. Always empty for a
    /// ledger built through the public API.
    pub fn dangling_references(&self) -> HashSet<&str> {
        self.journal
            .iter()
            .flat_map(|txn| txn.splits.iter())
            .map(|split| split.account_name.as_str())
            .filter(|name| !self.registry.contains(name))
            .collect()
    }

    fn position(&self, id: TransactionId) -> CoreResult<usize> {
        self.journal
            .iter()
            .position(|txn| txn.id == id)
            .ok_or(CoreError::TransactionNotFound(id))
    }

    fn insert_validated(&mut self, transaction: Transaction) -> CoreResult<TransactionId> {
        if self.journal.iter().any(|txn| txn.id == transaction.id) {
            return Err(CoreError::DuplicateTransaction(transaction.id));
        }
        validate(&transaction.splits, &self.registry).map_err(|err| {
            debug!(transaction = %transaction.id, error = %err, "transaction rejected");
            err
        })?;
        let id = transaction.id;
        self.journal.push(transaction);
        Ok(id)
    }

    /// Rewrites `from` to `to` in every referencing transaction and validates each
    /// against `registry`, without touching the journal.
    fn retarget_splits(
        &self,
        from: &str,
        to: &str,
        registry: &AccountRegistry,
    ) -> CoreResult<Vec<(usize, Transaction)>> {
        let mut rewritten = Vec::new();
        for (index, txn) in self.journal.iter().enumerate() {
            if !txn.involves(from) {
                continue;
            }
            let mut txn = txn.clone();
            for split in txn.splits.iter_mut().filter(|split| split.account_name == from) {
                split.account_name = to.to_string();
            }
            validate(&txn.splits, registry)?;
            rewritten.push((index, txn));
        }
        Ok(rewritten)
    }

    fn apply_rewrites(&mut self, rewritten: Vec<(usize, Transaction)>) {
        for (index, txn) in rewritten {
            self.journal[index] = txn;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn split(amount: Amount, account: &str) -> Split {
        Split::new(amount, account).unwrap()
    }

    fn coffee_ledger() -> (Ledger, TransactionId) {
        let mut ledger = Ledger::new();
        ledger.open_account("Cash", "asset", None, None).unwrap();
        ledger.open_account("Drinks", "expense", None, None).unwrap();
        ledger.open_account("Rewards", "asset", None, None).unwrap();
        let id = ledger
            .add_transaction(
                Transaction::new(
                    date(2017, 1, 20),
                    vec![
                        split(dec!(-60), "Cash"),
                        split(dec!(54), "Drinks").with_description("coffee"),
                        split(dec!(6), "Rewards"),
                    ],
                )
                .with_description("mocha"),
            )
            .unwrap();
        (ledger, id)
    }

    #[test]
    fn balances_follow_the_journal() {
        let (ledger, _) = coffee_ledger();
        assert_eq!(ledger.balance_of("Cash"), Some(dec!(-60)));
        assert_eq!(ledger.balance_of("Drinks"), Some(dec!(54)));
        assert_eq!(ledger.balance_of("Rewards"), Some(dec!(6)));
        assert_eq!(ledger.balance_of("Ghost"), None);
    }

    #[test]
    fn account_without_splits_has_zero_balance() {
        let (mut ledger, _) = coffee_ledger();
        ledger.open_account("Savings", "asset", None, None).unwrap();
        assert_eq!(ledger.balance_of("Savings"), Some(dec!(0)));
    }

    #[test]
    fn open_account_rejects_unknown_type() {
        let mut ledger = Ledger::new();
        let err = ledger
            .open_account("Cash", "savings", None, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidType(ref value) if value == "savings"));
        assert_eq!(ledger.accounts().count(), 0);
    }

    #[test]
    fn open_account_applies_optional_fields() {
        let mut ledger = Ledger::new();
        let account = ledger
            .open_account(" Card ", "LIABILITY", Some("visa"), Some(true))
            .unwrap();
        assert_eq!(account.name, "Card");
        assert_eq!(account.account_type, AccountType::Liability);
        assert_eq!(account.description, "visa");
        assert!(account.hidden);
    }

    #[test]
    fn unbalanced_transaction_leaves_journal_untouched() {
        let (mut ledger, _) = coffee_ledger();
        let before = ledger.clone();
        let err = ledger
            .add_transaction(Transaction::new(
                date(2017, 1, 21),
                vec![split(dec!(-60), "Cash"), split(dec!(50), "Drinks")],
            ))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(crate::ValidationError::Unbalanced { .. })
        ));
        assert_eq!(ledger, before);
    }

    #[test]
    fn re_adding_the_same_transaction_is_rejected() {
        let (mut ledger, id) = coffee_ledger();
        let copy = ledger.transaction(id).unwrap().clone();
        let err = ledger.add_transaction(copy).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateTransaction(dup) if dup == id));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn edit_revalidates_the_whole_transaction() {
        let (mut ledger, id) = coffee_ledger();
        let err = ledger
            .edit_transaction(
                id,
                TransactionPatch {
                    description: Some("latte".into()),
                    splits: Some(vec![split(dec!(-1), "Cash"), split(dec!(1), "Ghost")]),
                    ..TransactionPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(crate::ValidationError::UnknownAccount(_))
        ));
        assert_eq!(ledger.transaction(id).unwrap().description, "mocha");

        ledger
            .edit_transaction(
                id,
                TransactionPatch {
                    date: Some(date(2017, 1, 22)),
                    splits: Some(vec![split(dec!(-10), "Cash"), split(dec!(10), "Drinks")]),
                    ..TransactionPatch::default()
                },
            )
            .unwrap();
        let stored = ledger.transaction(id).unwrap();
        assert_eq!(stored.date, date(2017, 1, 22));
        assert_eq!(stored.description, "mocha");
        assert_eq!(ledger.balance_of("Rewards"), Some(dec!(0)));
    }

    #[test]
    fn missing_transactions_are_not_found() {
        let (mut ledger, _) = coffee_ledger();
        let ghost = TransactionId::new();
        assert!(ledger.delete_transaction(ghost).unwrap_err().is_not_found());
        assert!(ledger
            .edit_transaction(ghost, TransactionPatch::default())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn delete_transaction_restores_balances() {
        let (mut ledger, id) = coffee_ledger();
        let removed = ledger.delete_transaction(id).unwrap();
        assert_eq!(removed.description, "mocha");
        assert_eq!(ledger.balance_of("Cash"), Some(dec!(0)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn date_view_is_most_recent_first_and_stable() {
        let (mut ledger, first) = coffee_ledger();
        let later = ledger
            .record(
                TransactionDraft::new(vec![split(dec!(-5), "Cash"), split(dec!(5), "Drinks")])
                    .on(date(2017, 2, 1)),
                date(2030, 1, 1),
            )
            .unwrap();
        let same_day = ledger
            .record(
                TransactionDraft::new(vec![split(dec!(-1), "Cash"), split(dec!(1), "Drinks")])
                    .on(date(2017, 1, 20)),
                date(2030, 1, 1),
            )
            .unwrap();

        let insertion: Vec<_> = ledger.transactions().iter().map(|txn| txn.id).collect();
        assert_eq!(insertion, vec![first, later, same_day]);
        let by_date: Vec<_> = ledger
            .transactions_by_date()
            .into_iter()
            .map(|txn| txn.id)
            .collect();
        assert_eq!(by_date, vec![later, first, same_day]);
    }

    #[test]
    fn record_dates_undated_drafts_with_today() {
        let (mut ledger, _) = coffee_ledger();
        let today = date(2024, 5, 4);
        let id = ledger
            .record(
                TransactionDraft::new(vec![split(dec!(-2), "Cash"), split(dec!(2), "Drinks")]),
                today,
            )
            .unwrap();
        assert_eq!(ledger.transaction(id).unwrap().date, today);
    }

    #[test]
    fn rename_cascades_to_every_split() {
        let (mut ledger, id) = coffee_ledger();
        ledger.rename_account("Cash", "Wallet").unwrap();
        assert_eq!(ledger.balance_of("Wallet"), Some(dec!(-60)));
        assert_eq!(ledger.balance_of("Cash"), None);
        assert!(!ledger.transaction(id).unwrap().involves("Cash"));
        assert_eq!(ledger.splits_for("Cash").count(), 0);
        assert!(ledger.dangling_references().is_empty());
    }

    #[test]
    fn rename_failures_change_nothing() {
        let (mut ledger, _) = coffee_ledger();
        let before = ledger.clone();
        assert!(matches!(
            ledger.rename_account("Cash", "Drinks").unwrap_err(),
            CoreError::DuplicateName(_)
        ));
        assert!(ledger.rename_account("Ghost", "Spirit").unwrap_err().is_not_found());
        assert!(matches!(
            ledger.rename_account("Cash", "  ").unwrap_err(),
            CoreError::EmptyName
        ));
        assert_eq!(ledger, before);
    }

    #[test]
    fn rename_to_same_name_is_a_no_op() {
        let (mut ledger, _) = coffee_ledger();
        let before = ledger.clone();
        ledger.rename_account("Cash", " Cash ").unwrap();
        assert_eq!(ledger, before);
    }

    #[test]
    fn delete_unreferenced_account() {
        let (mut ledger, _) = coffee_ledger();
        ledger.open_account("Spare", "asset", None, None).unwrap();
        assert_eq!(
            ledger.delete_account("Spare", None).unwrap(),
            AccountRemoval::Unreferenced
        );
        assert!(ledger.account("Spare").is_none());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn delete_with_new_substitute_creates_it_with_same_type() {
        let (mut ledger, _) = coffee_ledger();
        let removal = ledger.delete_account("Rewards", Some("Imbalance")).unwrap();
        assert_eq!(
            removal,
            AccountRemoval::Migrated {
                substitute: "Imbalance".into(),
                created_substitute: true,
                splits_moved: 1,
            }
        );
        let substitute = ledger.account("Imbalance").unwrap();
        assert_eq!(substitute.account_type, AccountType::Asset);
        assert_eq!(ledger.balance_of("Imbalance"), Some(dec!(6)));
        assert!(ledger.account("Rewards").is_none());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn delete_with_existing_substitute_merges_balances() {
        let (mut ledger, _) = coffee_ledger();
        let combined = ledger.balance_of("Cash").unwrap() + ledger.balance_of("Rewards").unwrap();
        let removal = ledger.delete_account("Rewards", Some("Cash")).unwrap();
        assert!(matches!(
            removal,
            AccountRemoval::Migrated {
                created_substitute: false,
                ..
            }
        ));
        assert_eq!(ledger.balance_of("Cash"), Some(combined));
    }

    #[test]
    fn delete_with_self_as_substitute_is_rejected() {
        let (mut ledger, _) = coffee_ledger();
        let before = ledger.clone();
        let err = ledger.delete_account("Cash", Some(" Cash")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSubstitute(_)));
        assert_eq!(ledger, before);
    }

    #[test]
    fn delete_without_substitute_cascades_only_to_referencing_transactions() {
        let (mut ledger, coffee) = coffee_ledger();
        ledger.open_account("Dinner", "expense", None, None).unwrap();
        let dinner = ledger
            .add_transaction(Transaction::new(
                date(2017, 1, 28),
                vec![split(dec!(69), "Dinner"), split(dec!(-69), "Cash")],
            ))
            .unwrap();
        let unrelated = ledger
            .add_transaction(Transaction::new(
                date(2017, 1, 29),
                vec![split(dec!(3), "Rewards"), split(dec!(-3), "Cash")],
            ))
            .unwrap();

        let removal = ledger.delete_account("Drinks", None).unwrap();
        assert_eq!(removal, AccountRemoval::Cascaded { removed: vec![coffee] });
        assert!(ledger.transaction(dinner).is_some());
        assert!(ledger.transaction(unrelated).is_some());
        assert_eq!(ledger.balance_of("Cash"), Some(dec!(-72)));
    }

    #[test]
    fn from_parts_rejects_invalid_records() {
        let accounts = vec![Account::new("Cash", AccountType::Asset)];
        let orphan = Transaction::new(
            date(2020, 1, 1),
            vec![split(dec!(1), "Cash"), split(dec!(-1), "Ghost")],
        );
        let err = Ledger::from_parts(accounts.clone(), vec![orphan]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(crate::ValidationError::UnknownAccount(_))
        ));

        let duplicated = vec![accounts[0].clone(), accounts[0].clone()];
        let err = Ledger::from_parts(duplicated, Vec::new()).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateName(_)));
    }

    #[test]
    fn parts_round_trip() {
        let (ledger, _) = coffee_ledger();
        let (accounts, transactions) = ledger.clone().into_parts();
        let rebuilt = Ledger::from_parts(accounts, transactions).unwrap();
        assert_eq!(rebuilt, ledger);
    }
}
