//! TangSeng - lock held forever, leaked sleepers
//!
//! `shit`: a fresh lock is acquired, a detached worker releases it after one
//! second, and this thread acquires it again. The second acquisition is never
//! released. The lock is leaked on purpose (`Box::leak`) so the held state
//! stays visible in the block and mutex profiles for the rest of the process.
//!
//! `sleep`: ten detached workers sleep 30 seconds each. With one cycle per
//! second the sleeping population keeps growing.

use std::thread;
use std::time::Duration;

use super::{announce, Actor, Phase};
use crate::diagnostics::{Diagnostics, ProfiledLock};

/// Delay before the helper worker releases the lock
pub const LOCK_RELEASE_DELAY: Duration = Duration::from_secs(1);

/// Sleepers leaked per `sleep`
pub const SLEEPER_COUNT: usize = 10;

/// How long each leaked sleeper lives
pub const SLEEPER_LIFETIME: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct TangSeng {
    diagnostics: Diagnostics,
    last_lock: Option<&'static ProfiledLock>,
}

impl TangSeng {
    pub const NAME: &'static str = "TangSeng";

    /// Site of the lock created in `shit`
    pub const LOCK_SITE: &'static str = "TangSeng.shit";

    /// Site of the worker that releases the first acquisition
    pub const UNLOCK_SITE: &'static str = "TangSeng.shit.unlock";

    /// Site of the sleepers leaked in `sleep`
    pub const SLEEPER_SITE: &'static str = "TangSeng.sleep";

    pub fn new(diagnostics: &Diagnostics) -> Self {
        Self {
            diagnostics: diagnostics.clone(),
            last_lock: None,
        }
    }

    /// Lock left held by the most recent `shit`
    pub fn last_lock(&self) -> Option<&'static ProfiledLock> {
        self.last_lock
    }
}

impl Actor for TangSeng {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn eat(&mut self) {
        announce!(Self::NAME, Phase::Eat);
    }

    fn drink(&mut self) {
        announce!(Self::NAME, Phase::Drink);
    }

    fn shit(&mut self) {
        announce!(Self::NAME, Phase::Shit);

        let lock: &'static ProfiledLock =
            Box::leak(Box::new(ProfiledLock::new(&self.diagnostics, Self::LOCK_SITE)));
        lock.lock();

        tracing::info!(
            actor = Self::NAME,
            lock = lock.id(),
            "{} waiting on its own lock",
            Self::NAME
        );
        let release = move || {
            thread::sleep(LOCK_RELEASE_DELAY);
            lock.unlock();
        };
        if let Err(e) = self.diagnostics.spawn_detached(Self::UNLOCK_SITE, release) {
            // no other thread will release it
            tracing::warn!(
                actor = Self::NAME,
                error = %e,
                "no worker to release the lock, releasing it inline"
            );
            thread::sleep(LOCK_RELEASE_DELAY);
            lock.unlock();
        }
        // reacquired and never released
        lock.lock();
        self.last_lock = Some(lock);
    }

    fn sleep(&mut self) {
        announce!(Self::NAME, Phase::Sleep);

        for _ in 0..SLEEPER_COUNT {
            let spawned = self
                .diagnostics
                .spawn_detached(Self::SLEEPER_SITE, || thread::sleep(SLEEPER_LIFETIME));
            if let Err(e) = spawned {
                tracing::warn!(actor = Self::NAME, error = %e, "failed to spawn sleeper");
            }
        }
    }
}
