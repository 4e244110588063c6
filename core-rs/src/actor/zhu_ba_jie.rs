//! ZhuBaJie - busy loop

use std::hint::black_box;
use std::time::Duration;

use super::{announce, Actor, Phase};
use crate::diagnostics::Diagnostics;

/// Iterations of the `drink` spin
pub const SPIN_ITERATIONS: u64 = 10_000_000_000;

/// Length of the timed wait in `sleep`
pub const NAP: Duration = Duration::from_secs(1);

/// Pins a processor in `drink` with a pure compute loop, then waits properly
/// in `sleep` for contrast.
#[derive(Debug)]
pub struct ZhuBaJie {
    diagnostics: Diagnostics,
    iterations: u64,
}

impl ZhuBaJie {
    pub const NAME: &'static str = "ZhuBaJie";

    /// Site of the timed wait in `sleep`
    pub const NAP_SITE: &'static str = "ZhuBaJie.sleep";

    pub fn new(diagnostics: &Diagnostics) -> Self {
        Self::with_iterations(diagnostics, SPIN_ITERATIONS)
    }

    /// Shorter spin for test harnesses; the registry always uses `SPIN_ITERATIONS`
    pub fn with_iterations(diagnostics: &Diagnostics, iterations: u64) -> Self {
        Self {
            diagnostics: diagnostics.clone(),
            iterations,
        }
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}

/// Count to `iterations` without yielding. Returns the final counter.
pub fn spin(iterations: u64) -> u64 {
    let mut i = 0u64;
    while i < black_box(iterations) {
        i = black_box(i) + 1;
    }
    i
}

impl Actor for ZhuBaJie {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn eat(&mut self) {
        announce!(Self::NAME, Phase::Eat);
    }

    fn drink(&mut self) {
        announce!(Self::NAME, Phase::Drink);

        tracing::info!(
            actor = Self::NAME,
            iterations = self.iterations,
            "{} spinning",
            Self::NAME
        );
        black_box(spin(self.iterations));
    }

    fn shit(&mut self) {
        announce!(Self::NAME, Phase::Shit);
    }

    fn sleep(&mut self) {
        announce!(Self::NAME, Phase::Sleep);
        self.diagnostics.timed_wait(Self::NAP_SITE, NAP);
    }
}
