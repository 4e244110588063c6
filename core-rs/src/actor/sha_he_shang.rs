//! ShaHeShang - retained memory
//!
//! `eat` appends 1 MiB blocks until the buffer holds the ceiling (1 GiB).
//! The first cycle reaches it; later cycles find it full and append nothing.
//! The footprint is reached and held, never released.

use super::{announce, Actor, Phase};
use crate::units::{GI, MI};

/// Size of one retained block
pub const BLOCK_SIZE: usize = MI;

/// Buffer size `eat` grows to
pub const BUFFER_CEILING: usize = GI;

/// Written into every block so its pages become resident
const FILL: u8 = 0x5A;

#[derive(Debug)]
pub struct ShaHeShang {
    buffer: Vec<Box<[u8]>>,
    ceiling: usize,
}

impl Default for ShaHeShang {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaHeShang {
    pub const NAME: &'static str = "ShaHeShang";

    pub fn new() -> Self {
        Self::with_ceiling(BUFFER_CEILING)
    }

    /// Lower ceiling for test harnesses; the registry always uses `BUFFER_CEILING`
    pub fn with_ceiling(ceiling: usize) -> Self {
        Self {
            buffer: Vec::new(),
            ceiling,
        }
    }

    /// Bytes currently retained
    pub fn buffer_bytes(&self) -> usize {
        self.buffer.len() * BLOCK_SIZE
    }

    pub fn blocks(&self) -> usize {
        self.buffer.len()
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }
}

impl Actor for ShaHeShang {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn eat(&mut self) {
        announce!(Self::NAME, Phase::Eat);
        while self.buffer_bytes() < self.ceiling {
            self.buffer.push(vec![FILL; BLOCK_SIZE].into_boxed_slice());
        }
    }

    fn drink(&mut self) {
        announce!(Self::NAME, Phase::Drink);
    }

    fn shit(&mut self) {
        announce!(Self::NAME, Phase::Shit);
    }

    fn sleep(&mut self) {
        announce!(Self::NAME, Phase::Sleep);
    }
}
