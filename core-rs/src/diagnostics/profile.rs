//! Profile snapshots served by the diagnostic endpoint
//!
//! Every snapshot serializes to JSON and renders as plain text through
//! `Display` (the `?debug=1` form).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use sysinfo::{ProcessesToUpdate, System};

use super::alloc::CountingAllocator;

/// Live detached workers grouped by spawn site
#[derive(Debug, Clone, Serialize)]
pub struct GoroutineProfile {
    pub captured_at: DateTime<Utc>,
    pub total_live: usize,
    pub total_spawned: u64,
    pub os_threads: Option<usize>,
    pub sites: Vec<WorkerSiteSample>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerSiteSample {
    pub site: String,
    pub live: usize,
    pub spawned: u64,
    pub oldest_age_ms: u64,
}

/// Aggregated contention (`mutex`) or blocking (`block`) events
#[derive(Debug, Clone, Serialize)]
pub struct ContentionProfile {
    pub kind: &'static str,
    pub captured_at: DateTime<Utc>,
    /// Mutex profile fraction or block profile rate in effect
    pub sampling: u64,
    pub events: Vec<EventSample>,
    pub held_locks: Vec<HeldLockSample>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventSample {
    pub site: String,
    pub count: u64,
    pub total_delay_ns: u64,
    pub max_delay_ns: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeldLockSample {
    pub id: u64,
    pub site: String,
    pub since: DateTime<Utc>,
    pub held_for_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeapProfile {
    pub captured_at: DateTime<Utc>,
    pub counting_allocator: bool,
    pub in_use_bytes: u64,
    pub allocated_bytes: u64,
    pub freed_bytes: u64,
    pub allocations: u64,
    pub frees: u64,
    pub resident_bytes: Option<u64>,
    pub virtual_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CpuProfile {
    pub captured_at: DateTime<Utc>,
    pub window_ms: u64,
    pub cpu_usage_percent: Option<f32>,
    pub run_time_secs: Option<u64>,
    pub allowed_cpus: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadCreateProfile {
    pub captured_at: DateTime<Utc>,
    pub total_spawned: u64,
    pub sites: Vec<(String, u64)>,
}

/// Heap counters plus the resident and virtual size of this process
pub fn heap_profile() -> HeapProfile {
    let counters = CountingAllocator::counters();
    let sizes = sample_process(|p| (p.memory(), p.virtual_memory()));
    let (resident_bytes, virtual_bytes) = match sizes {
        Some((resident, virt)) => (Some(resident), Some(virt)),
        None => (None, None),
    };

    HeapProfile {
        captured_at: Utc::now(),
        counting_allocator: CountingAllocator::is_active(),
        in_use_bytes: counters.in_use_bytes(),
        allocated_bytes: counters.allocated_bytes,
        freed_bytes: counters.freed_bytes,
        allocations: counters.allocations,
        frees: counters.frees,
        resident_bytes,
        virtual_bytes,
    }
}

/// CPU usage of this process measured over `window`
pub async fn cpu_profile(window: Duration) -> CpuProfile {
    let window = window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    let pid = sysinfo::get_current_pid().ok();
    let mut sys = System::new();

    if let Some(pid) = pid {
        sys.refresh_processes(ProcessesToUpdate::Some(&[pid]));
    }
    tokio::time::sleep(window).await;

    let (cpu_usage_percent, run_time_secs) = match pid {
        Some(pid) => {
            sys.refresh_processes(ProcessesToUpdate::Some(&[pid]));
            match sys.process(pid) {
                Some(p) => (Some(p.cpu_usage()), Some(p.run_time())),
                None => (None, None),
            }
        }
        None => (None, None),
    };

    CpuProfile {
        captured_at: Utc::now(),
        window_ms: window.as_millis() as u64,
        cpu_usage_percent,
        run_time_secs,
        allowed_cpus: std::thread::available_parallelism().ok().map(|n| n.get()),
    }
}

/// Number of OS threads in this process
pub fn os_thread_count() -> Option<usize> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_dir("/proc/self/task").ok().map(|d| d.count())
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

fn sample_process<T>(read: impl FnOnce(&sysinfo::Process) -> T) -> Option<T> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]));
    sys.process(pid).map(read)
}

fn or_unknown<T: fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "unknown".to_string(),
    }
}

impl fmt::Display for GoroutineProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "goroutine profile: total {}", self.total_live)?;
        writeln!(
            f,
            "# spawned {} os_threads {}",
            self.total_spawned,
            or_unknown(&self.os_threads)
        )?;
        for site in &self.sites {
            writeln!(f)?;
            writeln!(f, "{} @ {}", site.live, site.site)?;
            writeln!(f, "#\tspawned {} oldest {}ms", site.spawned, site.oldest_age_ms)?;
        }
        Ok(())
    }
}

impl fmt::Display for ContentionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {}:", self.kind)?;
        writeln!(f, "sampling={}", self.sampling)?;
        for event in &self.events {
            writeln!(f, "{} {} @ {}", event.count, event.total_delay_ns, event.site)?;
            writeln!(f, "#\tmax {}ns", event.max_delay_ns)?;
        }
        writeln!(f, "--- held locks: {}", self.held_locks.len())?;
        for held in &self.held_locks {
            writeln!(
                f,
                "held {}ms @ {} (lock {}, since {})",
                held.held_for_ms,
                held.site,
                held.id,
                held.since.to_rfc3339()
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for HeapProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "heap profile: in_use {} allocated {} freed {} allocations {} frees {}",
            self.in_use_bytes, self.allocated_bytes, self.freed_bytes, self.allocations, self.frees
        )?;
        if !self.counting_allocator {
            writeln!(f, "# counting allocator not installed")?;
        }
        writeln!(
            f,
            "# resident {} virtual {}",
            or_unknown(&self.resident_bytes),
            or_unknown(&self.virtual_bytes)
        )
    }
}

impl fmt::Display for CpuProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cpu profile: window {}ms", self.window_ms)?;
        writeln!(f, "usage {}%", or_unknown(&self.cpu_usage_percent))?;
        writeln!(
            f,
            "# run_time {}s allowed_cpus {}",
            or_unknown(&self.run_time_secs),
            or_unknown(&self.allowed_cpus)
        )
    }
}

impl fmt::Display for ThreadCreateProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "threadcreate profile: total {}", self.total_spawned)?;
        for (site, spawned) in &self.sites {
            writeln!(f, "{} @ {}", spawned, site)?;
        }
        Ok(())
    }
}
