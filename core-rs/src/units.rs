//! Byte-size multipliers used to size memory-stressing allocations

pub const KI: usize = 1024;
pub const MI: usize = KI * KI;
pub const GI: usize = KI * MI;
pub const TI: u64 = (KI as u64) * (GI as u64);
pub const PI: u64 = (KI as u64) * TI;
