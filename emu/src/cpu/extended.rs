//! Handlers for the CB-prefixed table. Costs exclude the prefix fetch.

use super::registers::{FLAG_H, FLAG_N, FLAG_Z, REG_HL_INDIRECT, Registers};
use crate::bus::MemoryBus;

/// Rotate/shift group (CB 0x00-0x3F).
pub(super) fn shift<const OP: u8, const R: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let value = r.reg(R, bus);
    let result = r.shift(OP, value);
    r.set_reg(R, result, bus);
    if R == REG_HL_INDIRECT { 3 } else { 1 }
}

/// BIT b, r: carry untouched.
pub(super) fn bit<const BIT: u8, const R: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let value = r.reg(R, bus);
    r.set_flag(FLAG_Z, value & (1 << BIT) == 0);
    r.set_flag(FLAG_N, false);
    r.set_flag(FLAG_H, true);
    if R == REG_HL_INDIRECT { 2 } else { 1 }
}

pub(super) fn res<const BIT: u8, const R: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let value = r.reg(R, bus) & !(1 << BIT);
    r.set_reg(R, value, bus);
    if R == REG_HL_INDIRECT { 3 } else { 1 }
}

pub(super) fn set<const BIT: u8, const R: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let value = r.reg(R, bus) | 1 << BIT;
    r.set_reg(R, value, bus);
    if R == REG_HL_INDIRECT { 3 } else { 1 }
}
