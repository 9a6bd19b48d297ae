//! Advisory run lock guard.

use crate::error::RunResult;
use cf_core::LockInfo;
use cf_db::HistoryStore;

/// Holds the run lock of one environment until [`RunLock::release`].
///
/// Release is async, so it cannot happen in `Drop`; a guard dropped while
/// still held logs a warning and leaves the lock row in place.
pub struct RunLock {
    store: HistoryStore,
    info: LockInfo,
    released: bool,
}

impl RunLock {
    /// Acquire the lock, failing with `LockHeld` if another run holds it
    pub async fn acquire(store: HistoryStore, owner: &str) -> RunResult<Self> {
        let info = store.acquire_lock(owner).await?;
        log::info!("Acquired run lock for environment '{}'", info.environment);
        Ok(Self {
            store,
            info,
            released: false,
        })
    }

    /// Release the lock
    pub async fn release(mut self) -> RunResult<()> {
        self.released = true;
        self.store.release_lock(&self.info.owner).await?;
        Ok(())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if !self.released {
            log::warn!(
                "Run lock for environment '{}' (owner {}) was not released; remove its row from {} if no run is active",
                self.info.environment,
                self.info.owner,
                self.store.table().lock_table()
            );
        }
    }
}
