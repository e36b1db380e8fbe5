//! Thread-safe handle over a [`Ledger`].
//!
//! Readers run concurrently; writers are serialised and never observed half-way.

use std::sync::{Arc, RwLock};

use crate::{
    error::{CoreError, CoreResult},
    ledger::Ledger,
};

#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    pub fn read<T>(&self, f: impl FnOnce(&Ledger) -> T) -> CoreResult<T> {
        let guard = self.inner.read().map_err(|_| CoreError::LockPoisoned)?;
        Ok(f(&guard))
    }

    /// Applies `f` under the write lock. Ledger mutations already leave the
    /// aggregate untouched when they fail.
    pub fn write<T>(&self, f: impl FnOnce(&mut Ledger) -> CoreResult<T>) -> CoreResult<T> {
        let mut guard = self.inner.write().map_err(|_| CoreError::LockPoisoned)?;
        f(&mut guard)
    }

    /// Runs `mutate` on a copy of the ledger, hands the before/after pair to
    /// `commit`, and publishes the copy only when both succeed. The write lock is
    /// held for the whole call.
    pub fn update<T>(
        &self,
        mutate: impl FnOnce(&mut Ledger) -> CoreResult<T>,
        commit: impl FnOnce(&Ledger, &Ledger) -> CoreResult<()>,
    ) -> CoreResult<T> {
        let mut guard = self.inner.write().map_err(|_| CoreError::LockPoisoned)?;
        let mut next = guard.clone();
        let value = mutate(&mut next)?;
        commit(&guard, &next)?;
        *guard = next;
        Ok(value)
    }

    pub fn snapshot(&self) -> CoreResult<Ledger> {
        self.read(Ledger::clone)
    }
}
