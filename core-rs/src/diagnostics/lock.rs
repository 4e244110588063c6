//! Profiled exclusive lock
//!
//! Unlike `std::sync::Mutex`, ownership is not tied to a guard or a thread:
//! any thread may release a lock that another thread acquired, and a lock may
//! simply never be released. Waiting for a held lock is reported to the mutex
//! and block profiles. The held-lock table is updated under the lock's own
//! state mutex.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::Diagnostics;

pub struct ProfiledLock {
    id: u64,
    site: &'static str,
    locked: Mutex<bool>,
    released: Condvar,
    diagnostics: Diagnostics,
}

impl std::fmt::Debug for ProfiledLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfiledLock")
            .field("id", &self.id)
            .field("site", &self.site)
            .field("locked", &self.is_locked())
            .finish()
    }
}

impl ProfiledLock {
    /// Create an unlocked lock reporting under `site`
    pub fn new(diagnostics: &Diagnostics, site: &'static str) -> Self {
        Self {
            id: diagnostics.next_id(),
            site,
            locked: Mutex::new(false),
            released: Condvar::new(),
            diagnostics: diagnostics.clone(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn site(&self) -> &'static str {
        self.site
    }

    /// Acquire the lock, blocking the calling thread until it is free
    pub fn lock(&self) {
        let start = Instant::now();
        let mut locked = self.state();
        let contended = *locked;
        while *locked {
            locked = self
                .released
                .wait(locked)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *locked = true;
        self.diagnostics.mark_held(self.id, self.site);
        drop(locked);

        if contended {
            let waited = start.elapsed();
            self.diagnostics.record_contention(self.site, waited);
            self.diagnostics.record_blocking(self.site, waited);
        }
    }

    /// Acquire the lock only if nobody holds it
    pub fn try_lock(&self) -> bool {
        let mut locked = self.state();
        if *locked {
            return false;
        }
        *locked = true;
        self.diagnostics.mark_held(self.id, self.site);
        true
    }

    /// Release the lock. Any thread may call this.
    pub fn unlock(&self) {
        let mut locked = self.state();
        if !*locked {
            tracing::warn!(site = self.site, "unlock of unlocked lock");
            return;
        }
        *locked = false;
        self.diagnostics.mark_released(self.id);
        drop(locked);

        self.released.notify_one();
    }

    pub fn is_locked(&self) -> bool {
        *self.state()
    }

    fn state(&self) -> MutexGuard<'_, bool> {
        self.locked.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ProfiledLock {
    fn drop(&mut self) {
        // a dropped lock can no longer be held by anyone
        if self.is_locked() {
            self.diagnostics.mark_released(self.id);
        }
    }
}
