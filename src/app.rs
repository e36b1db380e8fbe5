//! Wires configuration, JSON storage and the system clock into a [`Book`].

use std::path::Path;

use thiserror::Error;
use tracing::info;
use trackbook_config::{Config, ConfigError, ConfigManager};
use trackbook_core::{Book, CoreError};
use trackbook_storage_json::JsonStorage;

use crate::clock::SystemClock;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Loads `<data_dir>/config.json` (defaults when absent).
pub fn load_config(data_dir: &Path) -> Result<Config, AppError> {
    Ok(ConfigManager::with_base_dir(data_dir.to_path_buf())?.load()?)
}

/// Opens the book in the directory resolved from `config`.
pub fn open_book(config: &Config) -> Result<Book, AppError> {
    open_book_at(config, &config.resolve_data_dir())
}

/// Opens the book stored under `data_dir`, applying the configured retention and
/// fallback delete substitute.
pub fn open_book_at(config: &Config, data_dir: &Path) -> Result<Book, AppError> {
    let storage = JsonStorage::with_retention(data_dir, config.backup_retention)?;
    let book = Book::open(Box::new(storage), Box::new(SystemClock))?
        .with_substitute_fallback(config.substitute().map(str::to_string));
    info!(path = %data_dir.display(), "book opened");
    Ok(book)
}
