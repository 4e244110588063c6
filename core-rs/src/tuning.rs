//! Runtime tuning applied once at process start
//!
//! Must run before any worker thread exists: the CPU restriction is set on
//! the calling thread and inherited by every thread spawned afterwards.

use crate::config::{BLOCK_PROFILE_RATE, MAX_PROCS, MUTEX_PROFILE_FRACTION};
use crate::diagnostics::Diagnostics;
use crate::errors::{HarnessError, Result};

/// Process-wide settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeTuning {
    /// Logical processors the process may use (`None` leaves affinity alone)
    pub max_procs: Option<usize>,
    pub mutex_profile_fraction: u32,
    pub block_profile_rate: u64,
}

/// What `apply` actually managed to set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTuning {
    pub pinned_cpus: Option<Vec<usize>>,
    pub mutex_profile_fraction: u32,
    pub block_profile_rate: u64,
}

impl Default for RuntimeTuning {
    fn default() -> Self {
        Self {
            max_procs: Some(MAX_PROCS),
            mutex_profile_fraction: MUTEX_PROFILE_FRACTION,
            block_profile_rate: BLOCK_PROFILE_RATE,
        }
    }
}

impl RuntimeTuning {
    /// Restrict CPUs and turn on contention/blocking sampling.
    ///
    /// A failed CPU restriction is logged and the harness keeps going: the
    /// pathologies still run, only less concentrated.
    pub fn apply(&self, diagnostics: &Diagnostics) -> AppliedTuning {
        let pinned_cpus = match self.max_procs {
            Some(n) => match restrict_cpus(n) {
                Ok(cpus) => {
                    tracing::info!(
                        cpus = ?cpus,
                        "restricted process to {} logical processor(s)",
                        cpus.len()
                    );
                    Some(cpus)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not restrict logical processors");
                    None
                }
            },
            None => None,
        };

        diagnostics.set_mutex_profile_fraction(self.mutex_profile_fraction);
        diagnostics.set_block_profile_rate(self.block_profile_rate);
        tracing::info!(
            mutex_profile_fraction = self.mutex_profile_fraction,
            block_profile_rate = self.block_profile_rate,
            "contention sampling enabled"
        );

        AppliedTuning {
            pinned_cpus,
            mutex_profile_fraction: self.mutex_profile_fraction,
            block_profile_rate: self.block_profile_rate,
        }
    }

    /// Runtime for the diagnostic endpoint, sized to `max_procs` workers
    pub fn build_runtime(&self) -> Result<tokio::runtime::Runtime> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        if let Some(n) = self.max_procs {
            builder.worker_threads(n.max(1));
        }
        builder
            .thread_name("pathos-diag")
            .enable_all()
            .build()
            .map_err(|e| HarnessError::Runtime(format!("failed to build tokio runtime: {}", e)))
    }
}

/// Keep the first `n` CPUs of the current affinity mask
#[cfg(target_os = "linux")]
fn restrict_cpus(n: usize) -> Result<Vec<usize>> {
    let n = n.max(1);
    unsafe {
        let mut current: libc::cpu_set_t = std::mem::zeroed();
        if libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut current) != 0 {
            return Err(HarnessError::Affinity(format!(
                "sched_getaffinity failed: {}",
                std::io::Error::last_os_error()
            )));
        }

        let cpus: Vec<usize> = (0..libc::CPU_SETSIZE as usize)
            .filter(|cpu| libc::CPU_ISSET(*cpu, &current))
            .take(n)
            .collect();
        if cpus.is_empty() {
            return Err(HarnessError::Affinity("no CPU in current affinity mask".to_string()));
        }

        let mut wanted: libc::cpu_set_t = std::mem::zeroed();
        for cpu in &cpus {
            libc::CPU_SET(*cpu, &mut wanted);
        }
        if libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &wanted) != 0 {
            return Err(HarnessError::Affinity(format!(
                "sched_setaffinity failed: {}",
                std::io::Error::last_os_error()
            )));
        }

        Ok(cpus)
    }
}

#[cfg(not(target_os = "linux"))]
fn restrict_cpus(_n: usize) -> Result<Vec<usize>> {
    Err(HarnessError::Affinity(
        "CPU affinity is only supported on Linux".to_string(),
    ))
}
