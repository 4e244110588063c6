//! Scheduler - the serial loop driving the registry
//!
//! ```text
//! Idle ──► RunningCycle ──► Pausing ──► RunningCycle ──► ...
//! ```
//!
//! There is no terminal state. Actors run one after another on the calling
//! thread, so one stalled actor (TangSeng waiting on its lock, ZhuBaJie
//! spinning) holds up every actor behind it.

use std::thread;
use std::time::{Duration, Instant};

use crate::config::CYCLE_INTERVAL;
use crate::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    RunningCycle,
    Pausing,
}

#[derive(Debug)]
pub struct Scheduler {
    registry: Registry,
    interval: Duration,
    state: SchedulerState,
    cycles: u64,
}

impl Scheduler {
    pub fn new(registry: Registry) -> Self {
        Self::with_interval(registry, CYCLE_INTERVAL)
    }

    pub fn with_interval(registry: Registry, interval: Duration) -> Self {
        Self {
            registry,
            interval,
            state: SchedulerState::Idle,
            cycles: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Cycles completed so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run exactly one cycle, without the pause
    pub fn run_cycle(&mut self) {
        self.state = SchedulerState::RunningCycle;
        let start = Instant::now();

        self.registry.live_all();

        self.cycles += 1;
        self.state = SchedulerState::Idle;
        tracing::debug!(
            cycle = self.cycles,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "cycle complete"
        );
    }

    fn pause(&mut self) {
        self.state = SchedulerState::Pausing;
        thread::sleep(self.interval);
        self.state = SchedulerState::Idle;
    }

    /// Run `count` cycles separated by the pause interval
    pub fn run_cycles(&mut self, count: u64) {
        for i in 0..count {
            if i > 0 {
                self.pause();
            }
            self.run_cycle();
        }
    }

    /// Cycle and pause until the process is killed
    pub fn run_forever(&mut self) -> ! {
        tracing::info!(
            actors = ?self.registry.names(),
            interval_ms = self.interval.as_millis() as u64,
            "scheduler started"
        );
        loop {
            self.run_cycle();
            self.pause();
        }
    }
}
