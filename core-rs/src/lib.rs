//! # Pathos Core - Pathology Harness Runtime
//!
//! A synthetic workload that reproduces a fixed catalogue of runtime
//! pathologies on every cycle and keeps a profiling endpoint up so that
//! monitoring, alerting and profiling pipelines have a deterministic target.
//!
//! ## Core Principle
//!
//! **The failure IS the output**: no actor returns an error. Each lifecycle
//! phase is engineered so that one systemic failure mode (a leaked thread, a
//! lock held forever, a pinned CPU, a large resident footprint) shows up to an
//! outside observer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  Scheduler (main thread, 1s pause)       │
//! │  WuKong → TangSeng → ZhuBaJie → ShaHeShang│
//! └───────────────┬──────────────────────────┘
//!                 │ detached workers, profiled locks
//!                 ▼
//! ┌──────────────────────────────────────────┐
//! │  Diagnostics (process-wide registry)     │
//! └───────────────┬──────────────────────────┘
//!                 │
//!     GET /debug/pprof/{goroutine,heap,block,mutex,profile}
//! ```

pub mod actor;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod logging;
pub mod registry;
pub mod scheduler;
pub mod spin_poll;
pub mod tuning;
pub mod units;

pub use actor::{Actor, Phase, ShaHeShang, TangSeng, WuKong, ZhuBaJie};
pub use diagnostics::{CountingAllocator, Diagnostics, ProfiledLock};
pub use errors::HarnessError;
pub use registry::Registry;
pub use scheduler::{Scheduler, SchedulerState};
pub use tuning::{AppliedTuning, RuntimeTuning};
pub use units::{GI, KI, MI, PI, TI};

/// Version of the harness
pub const VERSION: &str = "0.1.0";
