//! Plain-text rendering of accounts and transactions.

use colored::Colorize;
use rust_decimal::Decimal;
use trackbook_core::Ledger;
use trackbook_domain::{Account, Amount, Transaction};

const INDENT: &str = "    ";

/// Output settings. Colour is applied only when `color` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub color: bool,
    /// Decimal places shown for amounts.
    pub scale: u32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: true,
            scale: 2,
        }
    }
}

impl Style {
    pub fn plain() -> Self {
        Self {
            color: false,
            ..Self::default()
        }
    }

    fn amount(&self, amount: Amount) -> String {
        format!(
            "{:.prec$}",
            amount.round_dp(self.scale),
            prec = self.scale as usize
        )
    }

    /// Pads before colouring so escape codes never disturb alignment.
    fn amount_cell(&self, amount: Amount, width: usize) -> String {
        let text = format!("{:>width$}", self.amount(amount));
        if !self.color {
            return text;
        }
        if amount.is_sign_negative() && !amount.is_zero() {
            text.red().to_string()
        } else {
            text.green().to_string()
        }
    }

    fn heading(&self, text: String) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text
        }
    }
}

/// Header with name, type and balance, followed by the description when there is one.
pub fn render_account(account: &Account, balance: Amount, style: &Style) -> String {
    let mut out = style.heading(format!("{} [{}]", account.name, account.account_type));
    out.push_str("  ");
    out.push_str(&style.amount_cell(balance, 0));
    if account.hidden {
        out.push_str("  (hidden)");
    }
    if !account.description.is_empty() {
        out.push('\n');
        out.push_str(INDENT);
        out.push_str(&account.description);
    }
    out
}

/// Date, description and tags, then one aligned line per split.
pub fn render_transaction(transaction: &Transaction, style: &Style) -> String {
    let mut header = transaction.date.to_string();
    if !transaction.description.is_empty() {
        header.push_str("  ");
        header.push_str(&transaction.description);
    }
    let tags: Vec<String> = transaction.tags().map(|tag| format!("#{tag}")).collect();
    if !tags.is_empty() {
        header.push_str("  ");
        header.push_str(&tags.join(" "));
    }

    let name_width = transaction
        .splits
        .iter()
        .map(|split| split.account_name.chars().count())
        .max()
        .unwrap_or(0);
    let amount_width = transaction
        .splits
        .iter()
        .map(|split| style.amount(split.amount).len())
        .max()
        .unwrap_or(0);

    let mut out = style.heading(header);
    for split in &transaction.splits {
        let mut line = format!(
            "{INDENT}{:<name_width$}  {}",
            split.account_name,
            style.amount_cell(split.amount, amount_width)
        );
        if !split.description.is_empty() {
            line.push_str("  ");
            line.push_str(&split.description);
        }
        out.push('\n');
        out.push_str(&line);
    }
    out
}

/// One line per account, ordered by name, with its balance.
pub fn render_accounts(ledger: &Ledger, style: &Style, include_hidden: bool) -> String {
    let rows: Vec<(&Account, Amount)> = ledger
        .accounts()
        .filter(|account| include_hidden || !account.hidden)
        .map(|account| {
            let balance = ledger.balance_of(&account.name).unwrap_or(Decimal::ZERO);
            (account, balance)
        })
        .collect();

    let label_width = rows
        .iter()
        .map(|(account, _)| account.name.chars().count() + account.account_type.as_str().len() + 3)
        .max()
        .unwrap_or(0);
    let amount_width = rows
        .iter()
        .map(|(_, balance)| style.amount(*balance).len())
        .max()
        .unwrap_or(0);

    rows.iter()
        .map(|(account, balance)| {
            let label = format!("{} [{}]", account.name, account.account_type);
            format!(
                "{:<label_width$}  {}",
                label,
                style.amount_cell(*balance, amount_width)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
