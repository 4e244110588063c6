//! Fixed harness constants
//!
//! Every run uses the same values. There are no flags, files or environment
//! variables that change which pathology runs or how hard it hits.

use std::time::Duration;

/// Address of the profiling endpoint served by `pathos`
pub const DIAGNOSTIC_ADDR: &str = "0.0.0.0:6060";

/// Address of the profiling endpoint served by `busy-poll`
pub const BUSY_POLL_DIAGNOSTIC_ADDR: &str = "0.0.0.0:6061";

/// Pause between two scheduler cycles
pub const CYCLE_INTERVAL: Duration = Duration::from_secs(1);

/// Logical processors the process may run on
pub const MAX_PROCS: usize = 1;

/// Record one of every N lock contention events (1 = all)
pub const MUTEX_PROFILE_FRACTION: u32 = 1;

/// Record blocking events that last at least this many nanoseconds (1 = all)
pub const BLOCK_PROFILE_RATE: u64 = 1;

/// Default window of `/debug/pprof/profile` when `seconds` is omitted
pub const DEFAULT_CPU_PROFILE_SECONDS: u64 = 30;

/// Upper bound accepted for `/debug/pprof/profile?seconds=`
pub const MAX_CPU_PROFILE_SECONDS: u64 = 300;

/// Stack reserved for each detached worker
pub const WORKER_STACK_SIZE: usize = 64 * crate::units::KI;

/// Number of spinning receivers started by `busy-poll`
pub const BUSY_POLL_WORKERS: usize = 4;
