//! trackbook-core
//!
//! Double-entry rules for a personal ledger: the chart of accounts, the
//! transaction validator and the ledger aggregate that keeps the journal
//! consistent. Depends on trackbook-domain. No terminal I/O, no direct file access.

pub mod book;
pub mod error;
pub mod ledger;
pub mod registry;
pub mod shared;
pub mod storage;
pub mod time;
pub mod validator;

pub use book::Book;
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use ledger::{AccountRemoval, Ledger};
pub use registry::{normalize_name, AccountRegistry, AccountUpdate};
pub use shared::SharedLedger;
pub use storage::{LedgerStorage, MemoryStorage};
pub use time::{Clock, FixedClock};
pub use validator::{validate, AccountLookup};
