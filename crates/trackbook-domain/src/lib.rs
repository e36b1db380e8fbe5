//! trackbook-domain
//!
//! Pure bookkeeping value types (Account, Split, Transaction).
//! No I/O, no storage, no validation against a chart of accounts.

pub mod account;
pub mod common;
pub mod split;
pub mod transaction;

pub use account::*;
pub use common::*;
pub use split::*;
pub use transaction::*;
