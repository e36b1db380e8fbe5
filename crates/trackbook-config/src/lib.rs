//! trackbook-config
//!
//! Persistent user preferences: where the book lives, backup retention,
//! the fallback delete substitute and output settings.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{Config, HOME_ENV};
