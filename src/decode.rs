//! Conversion of raw register contents into physical values.

use modular_bitfield::prelude::*;

/// Scale a single 16 bit register by its resolution.
#[inline]
pub fn scale(raw: u16, resolution: f32) -> f32 {
    f32::from(raw) * resolution
}

/// Scale a combined 32 bit register pair by its resolution.
#[inline]
pub fn scale32(raw: i64, resolution: f32) -> f32 {
    raw as f32 * resolution
}

/// Concatenate two registers into a 32 bit value, `high` being the most significant word.
///
/// With `signed` the 32 bit pattern is read as two's complement, so `0xFFFF, 0xFFFF` gives `-1`.
/// Without it the same pattern gives `0xFFFF_FFFF`.
pub const fn combine32(high: u16, low: u16, signed: bool) -> i64 {
    let bits = ((high as u32) << 16) | low as u32;
    if signed {
        bits as i32 as i64
    } else {
        bits as i64
    }
}

/// Decode the `index`th signed register pair of `registers` and scale it.
///
/// Every power and energy quantity on the meter is a signed pair.
pub fn signed_pair(registers: &[u16], index: usize, resolution: f32) -> f32 {
    let high = registers[index * 2];
    let low = registers[index * 2 + 1];
    scale32(combine32(high, low, true), resolution)
}

/// One power factor register carries two 8 bit factors.
#[bitfield]
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerFactorPair {
    /// Second factor, in the low byte.
    pub low: B8,
    /// First factor, in the high byte.
    pub high: B8,
}

impl PowerFactorPair {
    /// Both factors scaled, first (high byte) then second (low byte).
    pub fn scaled(self, resolution: f32) -> (f32, f32) {
        (
            f32::from(self.high()) * resolution,
            f32::from(self.low()) * resolution,
        )
    }
}
