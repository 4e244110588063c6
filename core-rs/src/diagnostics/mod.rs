//! Diagnostics - process-wide record of what the pathologies leave behind
//!
//! Responsibilities:
//! - Spawn detached workers and count them per site while they live
//! - Collect lock contention events (mutex profile)
//! - Collect blocking events (block profile)
//! - Track locks that are currently held, including the ones never released
//!
//! Sampling follows two knobs set once at startup:
//! - mutex profile fraction `n`: each contention event is kept with probability 1/n (0 = off)
//! - block profile rate `r` ns: events of at least `r` ns are kept, shorter
//!   ones with probability `duration / r` (0 = off)

pub mod alloc;
pub mod lock;
pub mod profile;
pub mod server;

pub use alloc::CountingAllocator;
pub use lock::ProfiledLock;
pub use profile::{
    ContentionProfile, CpuProfile, EventSample, GoroutineProfile, HeapProfile, HeldLockSample,
    ThreadCreateProfile, WorkerSiteSample,
};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::WORKER_STACK_SIZE;

static GLOBAL: Lazy<Diagnostics> = Lazy::new(Diagnostics::new);

/// Handle to a diagnostics registry. Clones share the same registry.
#[derive(Clone, Default)]
pub struct Diagnostics {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    mutex_fraction: AtomicU32,
    block_rate: AtomicU64,
    next_id: AtomicU64,
    spawned_total: AtomicU64,
    /// 0 = unlimited, otherwise limit + 1
    worker_limit: AtomicU64,
    workers: Mutex<HashMap<&'static str, WorkerSite>>,
    contention: Mutex<HashMap<&'static str, EventStats>>,
    blocking: Mutex<HashMap<&'static str, EventStats>>,
    held: Mutex<BTreeMap<u64, HeldLock>>,
}

#[derive(Default)]
struct WorkerSite {
    spawned: u64,
    live: BTreeMap<u64, Instant>,
}

#[derive(Default, Clone, Copy)]
struct EventStats {
    count: u64,
    total: Duration,
    max: Duration,
}

struct HeldLock {
    site: &'static str,
    since: Instant,
    since_wall: DateTime<Utc>,
}

/// Unregisters a detached worker when its thread finishes (or never starts).
struct WorkerGuard {
    diagnostics: Diagnostics,
    site: &'static str,
    id: u64,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        let mut workers = lock_table(&self.diagnostics.inner.workers);
        if let Some(site) = workers.get_mut(self.site) {
            site.live.remove(&self.id);
        }
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("mutex_profile_fraction", &self.mutex_profile_fraction())
            .field("block_profile_rate", &self.block_profile_rate())
            .field("spawned_total", &self.spawned_total())
            .finish()
    }
}

impl Diagnostics {
    /// Create an isolated registry with sampling disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by the whole process
    pub fn global() -> &'static Diagnostics {
        &GLOBAL
    }

    pub fn set_mutex_profile_fraction(&self, fraction: u32) {
        self.inner.mutex_fraction.store(fraction, Ordering::SeqCst);
    }

    pub fn mutex_profile_fraction(&self) -> u32 {
        self.inner.mutex_fraction.load(Ordering::SeqCst)
    }

    pub fn set_block_profile_rate(&self, rate_ns: u64) {
        self.inner.block_rate.store(rate_ns, Ordering::SeqCst);
    }

    pub fn block_profile_rate(&self) -> u64 {
        self.inner.block_rate.load(Ordering::SeqCst)
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Run `work` on a new OS thread that nobody joins.
    ///
    /// No handle is returned and nothing waits for the thread: the worker is
    /// intentionally unmanaged. Its only trace is the live count under `site`
    /// until it finishes. Fails when the OS refuses a new thread or the live
    /// worker limit is reached; `work` is dropped without running.
    pub fn spawn_detached<F>(&self, site: &'static str, work: F) -> io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.next_id();
        {
            let mut workers = lock_table(&self.inner.workers);
            if let Some(limit) = self.worker_limit() {
                let live: usize = workers.values().map(|s| s.live.len()).sum();
                if live >= limit {
                    return Err(io::Error::new(
                        io::ErrorKind::WouldBlock,
                        format!("detached worker limit of {} reached", limit),
                    ));
                }
            }
            let entry = workers.entry(site).or_default();
            entry.spawned += 1;
            entry.live.insert(id, Instant::now());
        }
        self.inner.spawned_total.fetch_add(1, Ordering::Relaxed);

        let guard = WorkerGuard {
            diagnostics: self.clone(),
            site,
            id,
        };

        thread::Builder::new()
            .name(site.to_string())
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || {
                let _guard = guard;
                work();
            })
            .map(|_| ())
    }

    /// Cap on live detached workers across all sites (`None` = only the OS limit)
    pub fn set_worker_limit(&self, limit: Option<usize>) {
        let raw = limit.map(|n| n as u64 + 1).unwrap_or(0);
        self.inner.worker_limit.store(raw, Ordering::SeqCst);
    }

    pub fn worker_limit(&self) -> Option<usize> {
        match self.inner.worker_limit.load(Ordering::SeqCst) {
            0 => None,
            raw => Some((raw - 1) as usize),
        }
    }

    /// Workers currently alive under `site`
    pub fn live_workers(&self, site: &str) -> usize {
        lock_table(&self.inner.workers)
            .get(site)
            .map(|s| s.live.len())
            .unwrap_or(0)
    }

    /// Workers currently alive across all sites
    pub fn total_live_workers(&self) -> usize {
        lock_table(&self.inner.workers).values().map(|s| s.live.len()).sum()
    }

    pub fn spawned_total(&self) -> u64 {
        self.inner.spawned_total.load(Ordering::Relaxed)
    }

    /// Block the calling thread for `duration` and report it to the block profile
    pub fn timed_wait(&self, site: &'static str, duration: Duration) {
        let start = Instant::now();
        thread::sleep(duration);
        self.record_blocking(site, start.elapsed());
    }

    pub fn record_contention(&self, site: &'static str, waited: Duration) {
        if self.sample_contention() {
            record(&self.inner.contention, site, waited);
        }
    }

    pub fn record_blocking(&self, site: &'static str, waited: Duration) {
        if self.sample_blocking(waited) {
            record(&self.inner.blocking, site, waited);
        }
    }

    pub(crate) fn mark_held(&self, id: u64, site: &'static str) {
        lock_table(&self.inner.held).insert(
            id,
            HeldLock {
                site,
                since: Instant::now(),
                since_wall: Utc::now(),
            },
        );
    }

    pub(crate) fn mark_released(&self, id: u64) {
        lock_table(&self.inner.held).remove(&id);
    }

    /// Locks currently held under `site`
    pub fn held_locks(&self, site: &str) -> usize {
        lock_table(&self.inner.held)
            .values()
            .filter(|h| h.site == site)
            .count()
    }

    fn sample_contention(&self) -> bool {
        match self.mutex_profile_fraction() {
            0 => false,
            1 => true,
            n => rand::thread_rng().gen_range(0..n) == 0,
        }
    }

    fn sample_blocking(&self, waited: Duration) -> bool {
        let rate = self.block_profile_rate();
        if rate == 0 {
            return false;
        }
        let nanos = u64::try_from(waited.as_nanos()).unwrap_or(u64::MAX);
        nanos >= rate || rand::thread_rng().gen_range(0..rate) < nanos
    }

    // --- Snapshots ---

    pub fn goroutine_profile(&self) -> GoroutineProfile {
        let now = Instant::now();
        let workers = lock_table(&self.inner.workers);
        let mut sites: Vec<WorkerSiteSample> = workers
            .iter()
            .filter(|(_, s)| !s.live.is_empty())
            .map(|(name, s)| WorkerSiteSample {
                site: name.to_string(),
                live: s.live.len(),
                spawned: s.spawned,
                oldest_age_ms: s
                    .live
                    .values()
                    .map(|t| now.duration_since(*t).as_millis() as u64)
                    .max()
                    .unwrap_or(0),
            })
            .collect();
        sites.sort_by(|a, b| b.live.cmp(&a.live).then_with(|| a.site.cmp(&b.site)));

        GoroutineProfile {
            captured_at: Utc::now(),
            total_live: sites.iter().map(|s| s.live).sum(),
            total_spawned: self.spawned_total(),
            os_threads: profile::os_thread_count(),
            sites,
        }
    }

    pub fn threadcreate_profile(&self) -> ThreadCreateProfile {
        let workers = lock_table(&self.inner.workers);
        let mut sites: Vec<(String, u64)> =
            workers.iter().map(|(k, s)| (k.to_string(), s.spawned)).collect();
        sites.sort();
        ThreadCreateProfile {
            captured_at: Utc::now(),
            total_spawned: self.spawned_total(),
            sites,
        }
    }

    pub fn mutex_profile(&self) -> ContentionProfile {
        let sampling = u64::from(self.mutex_profile_fraction());
        self.contention_snapshot("mutex", &self.inner.contention, sampling)
    }

    pub fn block_profile(&self) -> ContentionProfile {
        self.contention_snapshot("block", &self.inner.blocking, self.block_profile_rate())
    }

    fn contention_snapshot(
        &self,
        kind: &'static str,
        table: &Mutex<HashMap<&'static str, EventStats>>,
        sampling: u64,
    ) -> ContentionProfile {
        let mut events: Vec<EventSample> = lock_table(table)
            .iter()
            .map(|(site, stats)| EventSample {
                site: site.to_string(),
                count: stats.count,
                total_delay_ns: stats.total.as_nanos() as u64,
                max_delay_ns: stats.max.as_nanos() as u64,
            })
            .collect();
        events.sort_by(|a, b| b.total_delay_ns.cmp(&a.total_delay_ns));

        let now = Instant::now();
        let held_locks = lock_table(&self.inner.held)
            .iter()
            .map(|(id, h)| HeldLockSample {
                id: *id,
                site: h.site.to_string(),
                since: h.since_wall,
                held_for_ms: now.duration_since(h.since).as_millis() as u64,
            })
            .collect();

        ContentionProfile {
            kind,
            captured_at: Utc::now(),
            sampling,
            events,
            held_locks,
        }
    }
}

fn record(table: &Mutex<HashMap<&'static str, EventStats>>, site: &'static str, waited: Duration) {
    let mut table = lock_table(table);
    let stats = table.entry(site).or_default();
    stats.count += 1;
    stats.total += waited;
    stats.max = stats.max.max(waited);
}

/// Registry tables stay usable even if a worker panicked while holding one.
fn lock_table<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
