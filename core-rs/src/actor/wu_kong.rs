//! WuKong - allocation churn

use super::{announce, Actor, Phase};
use crate::units::MI;

/// Size of the block thrown away on every `shit`
pub const WASTE_SIZE: usize = 16 * MI;

/// Allocates and immediately drops a large block once per cycle.
/// Nothing is retained; the pressure is on the allocator.
#[derive(Debug, Default)]
pub struct WuKong;

impl WuKong {
    pub const NAME: &'static str = "WuKong";

    pub fn new() -> Self {
        Self
    }
}

impl Actor for WuKong {
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
        let waste = vec![0xA5u8; WASTE_SIZE];
        std::hint::black_box(&waste);
    }

    fn sleep(&mut self) {
        announce!(Self::NAME, Phase::Sleep);
    }
}
