//! Actors - behavioral units cycling through a fixed four-phase lifecycle
//!
//! Each variant concentrates one pathology into one phase:
//!
//! | Actor        | Phase  | Pathology                                    |
//! |--------------|--------|----------------------------------------------|
//! | `WuKong`     | shit   | 16 MiB transient allocation every cycle      |
//! | `TangSeng`   | shit   | lock reacquired and never released           |
//! | `TangSeng`   | sleep  | ten detached 30s sleepers per cycle          |
//! | `ZhuBaJie`   | drink  | 10^10 iteration busy loop                    |
//! | `ShaHeShang` | eat    | retained buffer grown to 1 GiB               |
//!
//! No phase returns an error. Failure is what an outside observer sees.

pub mod sha_he_shang;
pub mod tang_seng;
pub mod wu_kong;
pub mod zhu_ba_jie;

pub use sha_he_shang::ShaHeShang;
pub use tang_seng::TangSeng;
pub use wu_kong::WuKong;
pub use zhu_ba_jie::ZhuBaJie;

use std::fmt;

/// Lifecycle phases in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Eat,
    Drink,
    Shit,
    Sleep,
}

impl Phase {
    /// Every phase, in the order `Actor::live` runs them
    pub const ALL: [Phase; 4] = [Phase::Eat, Phase::Drink, Phase::Shit, Phase::Sleep];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Eat => "eat",
            Phase::Drink => "drink",
            Phase::Shit => "shit",
            Phase::Sleep => "sleep",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability contract shared by all pathology variants
pub trait Actor {
    /// Constant name of the variant
    fn name(&self) -> &'static str;

    fn eat(&mut self);
    fn drink(&mut self);
    fn shit(&mut self);
    fn sleep(&mut self);

    fn run_phase(&mut self, phase: Phase) {
        match phase {
            Phase::Eat => self.eat(),
            Phase::Drink => self.drink(),
            Phase::Shit => self.shit(),
            Phase::Sleep => self.sleep(),
        }
    }

    /// One full lifecycle, synchronously on the calling thread
    fn live(&mut self) {
        for phase in Phase::ALL {
            self.run_phase(phase);
        }
    }
}

/// Phase-start line: `<actor> <phase>`
macro_rules! announce {
    ($actor:expr, $phase:expr) => {
        tracing::info!(actor = $actor, phase = %$phase, "{} {}", $actor, $phase)
    };
}
pub(crate) use announce;
