#![doc(test(attr(deny(warnings))))]

//! Trackbook is a personal double-entry bookkeeping engine: a chart of
//! accounts, a journal of balanced transactions and the JSON files they live in.
//!
//! The facade wires configuration, storage and the system clock into a
//! [`trackbook_core::Book`] and renders its contents as text.

pub mod app;
pub mod clock;
pub mod presentation;
pub mod utils;

pub use app::{open_book, open_book_at, AppError};
pub use clock::SystemClock;
pub use presentation::{render_account, render_accounts, render_transaction, Style};

pub use trackbook_config as config;
pub use trackbook_core as core;
pub use trackbook_domain as domain;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with the default filter and emits a startup info log.
pub fn init() {
    init_with_filter(&trackbook_config::Config::default_log_filter());
}

/// Initializes global tracing once. `RUST_LOG` takes precedence over `filter`.
pub fn init_with_filter(filter: &str) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(filter);
        tracing::info!("Trackbook tracing initialized.");
    });
}
