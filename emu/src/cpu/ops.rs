//! Handlers for the primary opcode table.
//!
//! Operand indices are const generic parameters so one function body covers
//! a whole opcode column; the table in `table.rs` instantiates each cell.
//! Every handler returns its cost in machine cycles.

use super::alu::shift;
use super::registers::{FLAG_C, FLAG_H, FLAG_N, REG_HL_INDIRECT, Registers};
use crate::bus::MemoryBus;

/// Extra machine cycle for an (HL) operand.
#[inline]
const fn indirect_cost(index: u8) -> u32 {
    if index == REG_HL_INDIRECT { 1 } else { 0 }
}

pub(super) fn nop(_: &mut Registers, _: &mut MemoryBus) -> u32 {
    1
}

/// STOP: consumes its padding byte and idles like HALT.
pub(super) fn stop(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    r.fetch(bus);
    r.halted = true;
    1
}

pub(super) fn halt(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    r.halted = true;
    1
}

// 8-bit loads

pub(super) fn ld_r_r<const DST: u8, const SRC: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let value = r.reg(SRC, bus);
    r.set_reg(DST, value, bus);
    1 + indirect_cost(DST) + indirect_cost(SRC)
}

pub(super) fn ld_r_n<const R: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let n = r.fetch(bus);
    r.set_reg(R, n, bus);
    2 + indirect_cost(R)
}

/// LD (BC),A / LD (DE),A
pub(super) fn ld_pair_a<const P: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    bus.write(r.pair(P), r.a);
    2
}

/// LD A,(BC) / LD A,(DE)
pub(super) fn ld_a_pair<const P: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    r.a = bus.read(r.pair(P));
    2
}

/// LD (HL+),A and LD (HL-),A
pub(super) fn ld_hl_step_a<const INC: bool>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let hl = r.hl();
    bus.write(hl, r.a);
    r.set_hl(if INC { hl.wrapping_add(1) } else { hl.wrapping_sub(1) });
    2
}

/// LD A,(HL+) and LD A,(HL-)
pub(super) fn ld_a_hl_step<const INC: bool>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let hl = r.hl();
    r.a = bus.read(hl);
    r.set_hl(if INC { hl.wrapping_add(1) } else { hl.wrapping_sub(1) });
    2
}

pub(super) fn ldh_n_a(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let n = r.fetch(bus);
    bus.write(0xFF00 | n as u16, r.a);
    3
}

pub(super) fn ldh_a_n(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let n = r.fetch(bus);
    r.a = bus.read(0xFF00 | n as u16);
    3
}

pub(super) fn ldh_c_a(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    bus.write(0xFF00 | r.c as u16, r.a);
    2
}

pub(super) fn ldh_a_c(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    r.a = bus.read(0xFF00 | r.c as u16);
    2
}

pub(super) fn ld_nn_a(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let addr = r.fetch_word(bus);
    bus.write(addr, r.a);
    4
}

pub(super) fn ld_a_nn(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let addr = r.fetch_word(bus);
    r.a = bus.read(addr);
    4
}

// 16-bit loads and stack

pub(super) fn ld_rr_nn<const P: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let nn = r.fetch_word(bus);
    r.set_pair(P, nn);
    3
}

pub(super) fn ld_nn_sp(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let addr = r.fetch_word(bus);
    let [low, high] = r.sp.to_le_bytes();
    bus.write(addr, low);
    bus.write(addr.wrapping_add(1), high);
    5
}

pub(super) fn ld_sp_hl(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    r.sp = r.hl();
    2
}

pub(super) fn ld_hl_sp_e(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let e = r.fetch(bus);
    let value = r.sp_offset(e);
    r.set_hl(value);
    3
}

pub(super) fn push<const P: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let value = r.stack_pair(P);
    r.push_word(bus, value);
    4
}

pub(super) fn pop<const P: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let value = r.pop_word(bus);
    r.set_stack_pair(P, value);
    3
}

// 8-bit arithmetic

pub(super) fn alu_r<const OP: u8, const SRC: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let value = r.reg(SRC, bus);
    r.alu(OP, value);
    1 + indirect_cost(SRC)
}

pub(super) fn alu_n<const OP: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let n = r.fetch(bus);
    r.alu(OP, n);
    2
}

pub(super) fn inc_r<const R: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let value = r.reg(R, bus);
    let result = r.inc(value);
    r.set_reg(R, result, bus);
    1 + 2 * indirect_cost(R)
}

pub(super) fn dec_r<const R: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let value = r.reg(R, bus);
    let result = r.dec(value);
    r.set_reg(R, result, bus);
    1 + 2 * indirect_cost(R)
}

pub(super) fn daa(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    r.daa();
    1
}

pub(super) fn cpl(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    r.a = !r.a;
    r.set_flag(FLAG_N, true);
    r.set_flag(FLAG_H, true);
    1
}

pub(super) fn scf(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    r.set_flag(FLAG_N, false);
    r.set_flag(FLAG_H, false);
    r.set_flag(FLAG_C, true);
    1
}

pub(super) fn ccf(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    let carry = r.flag(FLAG_C);
    r.set_flag(FLAG_N, false);
    r.set_flag(FLAG_H, false);
    r.set_flag(FLAG_C, !carry);
    1
}

pub(super) fn rlca(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    r.rotate_a(shift::RLC);
    1
}

pub(super) fn rrca(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    r.rotate_a(shift::RRC);
    1
}

pub(super) fn rla(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    r.rotate_a(shift::RL);
    1
}

pub(super) fn rra(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    r.rotate_a(shift::RR);
    1
}

// 16-bit arithmetic

pub(super) fn inc_rr<const P: u8>(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    r.set_pair(P, r.pair(P).wrapping_add(1));
    2
}

pub(super) fn dec_rr<const P: u8>(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    r.set_pair(P, r.pair(P).wrapping_sub(1));
    2
}

pub(super) fn add_hl_rr<const P: u8>(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    let value = r.pair(P);
    r.add_hl(value);
    2
}

pub(super) fn add_sp_e(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let e = r.fetch(bus);
    r.sp = r.sp_offset(e);
    4
}

// Control flow

#[inline]
fn relative_jump(r: &mut Registers, offset: u8) {
    r.pc = r.pc.wrapping_add_signed(offset as i8 as i16);
}

pub(super) fn jr(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let e = r.fetch(bus);
    relative_jump(r, e);
    3
}

pub(super) fn jr_cc<const CC: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let e = r.fetch(bus);
    if r.condition(CC) {
        relative_jump(r, e);
        3
    } else {
        2
    }
}

pub(super) fn jp(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    r.pc = r.fetch_word(bus);
    4
}

pub(super) fn jp_cc<const CC: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let addr = r.fetch_word(bus);
    if r.condition(CC) {
        r.pc = addr;
        4
    } else {
        3
    }
}

pub(super) fn jp_hl(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    r.pc = r.hl();
    1
}

pub(super) fn call(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let addr = r.fetch_word(bus);
    let ret = r.pc;
    r.push_word(bus, ret);
    r.pc = addr;
    6
}

pub(super) fn call_cc<const CC: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let addr = r.fetch_word(bus);
    if r.condition(CC) {
        let ret = r.pc;
        r.push_word(bus, ret);
        r.pc = addr;
        6
    } else {
        3
    }
}

pub(super) fn ret(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    r.pc = r.pop_word(bus);
    4
}

pub(super) fn ret_cc<const CC: u8>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    if r.condition(CC) {
        r.pc = r.pop_word(bus);
        5
    } else {
        2
    }
}

/// RETI enables interrupts with no delay.
pub(super) fn reti(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    r.pc = r.pop_word(bus);
    r.ime = true;
    4
}

pub(super) fn rst<const VECTOR: u16>(r: &mut Registers, bus: &mut MemoryBus) -> u32 {
    let ret = r.pc;
    r.push_word(bus, ret);
    r.pc = VECTOR;
    4
}

// Interrupt control

pub(super) fn di(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    r.ime = false;
    r.ime_pending = false;
    1
}

pub(super) fn ei(r: &mut Registers, _: &mut MemoryBus) -> u32 {
    r.ime_pending = true;
    1
}
