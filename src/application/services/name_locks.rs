//! Per-world operation locks
//!
//! Every lifecycle, import and export operation holds its world's lock for
//! its whole duration, covering both the I/O phase and the registry commit,
//! so two requests for the same name never interleave.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::value_objects::WorldName;

/// Held for the duration of one operation on a world
pub type NameGuard = OwnedMutexGuard<()>;

#[derive(Debug, Clone, Default)]
pub struct NameLocks {
    locks: Arc<Mutex<HashMap<WorldName, Arc<AsyncMutex<()>>>>>,
}

impl NameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other operation holds `name`, then hold it
    pub async fn acquire(&self, name: &WorldName) -> NameGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Drop entries nobody is holding or waiting on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(name.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Try to take `name` without waiting
    #[cfg(test)]
    pub fn try_acquire(&self, name: &WorldName) -> Option<NameGuard> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(name.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.try_lock_owned().ok()
    }

    #[cfg(test)]
    pub fn tracked(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}
