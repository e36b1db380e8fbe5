//! Journal transactions and the request shapes used to create or edit them.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, split::Split};

/// Stable surrogate key of a journal transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A dated set of splits. Only balanced transactions live in a ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub splits: Vec<Split>,
    #[serde(default)]
    pub description: String,
    /// Whitespace-separated labels, stored as entered.
    #[serde(default)]
    pub tags: String,
}

impl Transaction {
    pub fn new(date: NaiveDate, splits: Vec<Split>) -> Self {
        Self {
            id: TransactionId::new(),
            date,
            splits,
            description: String::new(),
            tags: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.split_whitespace()
    }

    /// Returns `true` when any split references `account_name`.
    pub fn involves(&self, account_name: &str) -> bool {
        self.splits
            .iter()
            .any(|split| split.account_name == account_name)
    }

    /// Sum of all split amounts; zero for a balanced transaction.
    pub fn total(&self) -> Amount {
        self.splits.iter().map(|split| split.amount).sum()
    }
}

impl Displayable for Transaction {
    fn display_label(&self) -> String {
        if self.description.is_empty() {
            self.date.to_string()
        } else {
            format!("{} {}", self.date, self.description)
        }
    }
}

/// A candidate transaction as supplied by a caller.
///
/// A missing date is filled in by whoever owns the clock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionDraft {
    pub date: Option<NaiveDate>,
    pub splits: Vec<Split>,
    pub description: String,
    pub tags: String,
}

impl TransactionDraft {
    pub fn new(splits: Vec<Split>) -> Self {
        Self {
            splits,
            ..Self::default()
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Turns the draft into an unvalidated transaction, dated `today` if no date was given.
    pub fn into_transaction(self, today: NaiveDate) -> Transaction {
        Transaction::new(self.date.unwrap_or(today), self.splits)
            .with_description(self.description)
            .with_tags(self.tags)
    }
}

/// Replacement values for an existing transaction. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionPatch {
    pub date: Option<NaiveDate>,
    pub splits: Option<Vec<Split>>,
    pub description: Option<String>,
    pub tags: Option<String>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.splits.is_none()
            && self.description.is_none()
            && self.tags.is_none()
    }

    /// Produces the edited copy of `current`, keeping its identifier.
    pub fn apply_to(&self, current: &Transaction) -> Transaction {
        Transaction {
            id: current.id,
            date: self.date.unwrap_or(current.date),
            splits: self
                .splits
                .clone()
                .unwrap_or_else(|| current.splits.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            tags: self.tags.clone().unwrap_or_else(|| current.tags.clone()),
        }
    }
}
