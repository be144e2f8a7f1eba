//! Opcode dispatch tables.
//!
//! Both tables are built at compile time and indexed directly by opcode
//! byte. Cells that name no instruction hold `Unimplemented` with their own
//! opcode so a fetch of one is reported, never executed.

use super::alu::{op, shift};
use super::registers::Registers;
use super::{extended as cb, ops};
use crate::bus::MemoryBus;

/// Executes one decoded instruction; returns its cost in machine cycles.
pub type Handler = fn(&mut Registers, &mut MemoryBus) -> u32;

#[derive(Debug, Clone, Copy)]
pub enum Instruction {
    Implemented(Handler),
    /// 0xCB: fetch again and dispatch through [`EXTENDED`].
    Prefix,
    Unimplemented(u8),
}

/// Cost of fetching the 0xCB prefix, added to every extended instruction.
pub const PREFIX_CYCLES: u32 = 1;

use Instruction::Implemented as I;

/// Eight consecutive cells `f::<P, 0..8>` starting at `base`.
macro_rules! row {
    ($t:ident, $base:expr, $m:ident :: $f:ident, $p:expr) => {
        $t[$base] = I($m::$f::<{ $p }, 0>);
        $t[$base + 1] = I($m::$f::<{ $p }, 1>);
        $t[$base + 2] = I($m::$f::<{ $p }, 2>);
        $t[$base + 3] = I($m::$f::<{ $p }, 3>);
        $t[$base + 4] = I($m::$f::<{ $p }, 4>);
        $t[$base + 5] = I($m::$f::<{ $p }, 5>);
        $t[$base + 6] = I($m::$f::<{ $p }, 6>);
        $t[$base + 7] = I($m::$f::<{ $p }, 7>);
    };
}

/// Eight register-indexed cells `f::<0..8>` spaced 8 apart.
macro_rules! column8 {
    ($t:ident, $base:expr, $m:ident :: $f:ident) => {
        $t[$base] = I($m::$f::<0>);
        $t[$base + 0x08] = I($m::$f::<1>);
        $t[$base + 0x10] = I($m::$f::<2>);
        $t[$base + 0x18] = I($m::$f::<3>);
        $t[$base + 0x20] = I($m::$f::<4>);
        $t[$base + 0x28] = I($m::$f::<5>);
        $t[$base + 0x30] = I($m::$f::<6>);
        $t[$base + 0x38] = I($m::$f::<7>);
    };
}

/// Four pair-indexed cells `f::<0..4>` spaced 16 apart.
macro_rules! column4 {
    ($t:ident, $base:expr, $m:ident :: $f:ident) => {
        $t[$base] = I($m::$f::<0>);
        $t[$base + 0x10] = I($m::$f::<1>);
        $t[$base + 0x20] = I($m::$f::<2>);
        $t[$base + 0x30] = I($m::$f::<3>);
    };
}

/// Four condition-indexed cells `f::<0..4>` spaced 8 apart.
macro_rules! conditions {
    ($t:ident, $base:expr, $m:ident :: $f:ident) => {
        $t[$base] = I($m::$f::<0>);
        $t[$base + 0x08] = I($m::$f::<1>);
        $t[$base + 0x10] = I($m::$f::<2>);
        $t[$base + 0x18] = I($m::$f::<3>);
    };
}

const fn unimplemented_table() -> [Instruction; 256] {
    let mut t = [Instruction::Unimplemented(0); 256];
    let mut i = 0;
    while i < 256 {
        t[i] = Instruction::Unimplemented(i as u8);
        i += 1;
    }
    t
}

pub static PRIMARY: [Instruction; 256] = {
    let mut t = unimplemented_table();

    // 0x00-0x3F
    t[0x00] = I(ops::nop);
    t[0x10] = I(ops::stop);
    column4!(t, 0x01, ops::ld_rr_nn);
    column4!(t, 0x03, ops::inc_rr);
    column4!(t, 0x09, ops::add_hl_rr);
    column4!(t, 0x0B, ops::dec_rr);
    column8!(t, 0x04, ops::inc_r);
    column8!(t, 0x05, ops::dec_r);
    column8!(t, 0x06, ops::ld_r_n);
    t[0x02] = I(ops::ld_pair_a::<0>);
    t[0x12] = I(ops::ld_pair_a::<1>);
    t[0x22] = I(ops::ld_hl_step_a::<true>);
    t[0x32] = I(ops::ld_hl_step_a::<false>);
    t[0x0A] = I(ops::ld_a_pair::<0>);
    t[0x1A] = I(ops::ld_a_pair::<1>);
    t[0x2A] = I(ops::ld_a_hl_step::<true>);
    t[0x3A] = I(ops::ld_a_hl_step::<false>);
    t[0x07] = I(ops::rlca);
    t[0x0F] = I(ops::rrca);
    t[0x17] = I(ops::rla);
    t[0x1F] = I(ops::rra);
    t[0x27] = I(ops::daa);
    t[0x2F] = I(ops::cpl);
    t[0x37] = I(ops::scf);
    t[0x3F] = I(ops::ccf);
    t[0x08] = I(ops::ld_nn_sp);
    t[0x18] = I(ops::jr);
    conditions!(t, 0x20, ops::jr_cc);

    // 0x40-0x7F: LD r, r'
    row!(t, 0x40, ops::ld_r_r, 0);
    row!(t, 0x48, ops::ld_r_r, 1);
    row!(t, 0x50, ops::ld_r_r, 2);
    row!(t, 0x58, ops::ld_r_r, 3);
    row!(t, 0x60, ops::ld_r_r, 4);
    row!(t, 0x68, ops::ld_r_r, 5);
    row!(t, 0x70, ops::ld_r_r, 6);
    row!(t, 0x78, ops::ld_r_r, 7);
    t[0x76] = I(ops::halt);

    // 0x80-0xBF: ALU A, r
    row!(t, 0x80, ops::alu_r, op::ADD);
    row!(t, 0x88, ops::alu_r, op::ADC);
    row!(t, 0x90, ops::alu_r, op::SUB);
    row!(t, 0x98, ops::alu_r, op::SBC);
    row!(t, 0xA0, ops::alu_r, op::AND);
    row!(t, 0xA8, ops::alu_r, op::XOR);
    row!(t, 0xB0, ops::alu_r, op::OR);
    row!(t, 0xB8, ops::alu_r, op::CP);

    // 0xC0-0xFF
    conditions!(t, 0xC0, ops::ret_cc);
    conditions!(t, 0xC2, ops::jp_cc);
    conditions!(t, 0xC4, ops::call_cc);
    column4!(t, 0xC1, ops::pop);
    column4!(t, 0xC5, ops::push);
    t[0xC6] = I(ops::alu_n::<{ op::ADD }>);
    t[0xCE] = I(ops::alu_n::<{ op::ADC }>);
    t[0xD6] = I(ops::alu_n::<{ op::SUB }>);
    t[0xDE] = I(ops::alu_n::<{ op::SBC }>);
    t[0xE6] = I(ops::alu_n::<{ op::AND }>);
    t[0xEE] = I(ops::alu_n::<{ op::XOR }>);
    t[0xF6] = I(ops::alu_n::<{ op::OR }>);
    t[0xFE] = I(ops::alu_n::<{ op::CP }>);
    t[0xC7] = I(ops::rst::<0x00>);
    t[0xCF] = I(ops::rst::<0x08>);
    t[0xD7] = I(ops::rst::<0x10>);
    t[0xDF] = I(ops::rst::<0x18>);
    t[0xE7] = I(ops::rst::<0x20>);
    t[0xEF] = I(ops::rst::<0x28>);
    t[0xF7] = I(ops::rst::<0x30>);
    t[0xFF] = I(ops::rst::<0x38>);
    t[0xC3] = I(ops::jp);
    t[0xC9] = I(ops::ret);
    t[0xCB] = Instruction::Prefix;
    t[0xCD] = I(ops::call);
    t[0xD9] = I(ops::reti);
    t[0xE0] = I(ops::ldh_n_a);
    t[0xF0] = I(ops::ldh_a_n);
    t[0xE2] = I(ops::ldh_c_a);
    t[0xF2] = I(ops::ldh_a_c);
    t[0xE8] = I(ops::add_sp_e);
    t[0xF8] = I(ops::ld_hl_sp_e);
    t[0xE9] = I(ops::jp_hl);
    t[0xF9] = I(ops::ld_sp_hl);
    t[0xEA] = I(ops::ld_nn_a);
    t[0xFA] = I(ops::ld_a_nn);
    t[0xF3] = I(ops::di);
    t[0xFB] = I(ops::ei);

    t
};

pub static EXTENDED: [Instruction; 256] = {
    let mut t = unimplemented_table();

    row!(t, 0x00, cb::shift, shift::RLC);
    row!(t, 0x08, cb::shift, shift::RRC);
    row!(t, 0x10, cb::shift, shift::RL);
    row!(t, 0x18, cb::shift, shift::RR);
    row!(t, 0x20, cb::shift, shift::SLA);
    row!(t, 0x28, cb::shift, shift::SRA);
    row!(t, 0x30, cb::shift, shift::SWAP);
    row!(t, 0x38, cb::shift, shift::SRL);

    row!(t, 0x40, cb::bit, 0);
    row!(t, 0x48, cb::bit, 1);
    row!(t, 0x50, cb::bit, 2);
    row!(t, 0x58, cb::bit, 3);
    row!(t, 0x60, cb::bit, 4);
    row!(t, 0x68, cb::bit, 5);
    row!(t, 0x70, cb::bit, 6);
    row!(t, 0x78, cb::bit, 7);

    row!(t, 0x80, cb::res, 0);
    row!(t, 0x88, cb::res, 1);
    row!(t, 0x90, cb::res, 2);
    row!(t, 0x98, cb::res, 3);
    row!(t, 0xA0, cb::res, 4);
    row!(t, 0xA8, cb::res, 5);
    row!(t, 0xB0, cb::res, 6);
    row!(t, 0xB8, cb::res, 7);

    row!(t, 0xC0, cb::set, 0);
    row!(t, 0xC8, cb::set, 1);
    row!(t, 0xD0, cb::set, 2);
    row!(t, 0xD8, cb::set, 3);
    row!(t, 0xE0, cb::set, 4);
    row!(t, 0xE8, cb::set, 5);
    row!(t, 0xF0, cb::set, 6);
    row!(t, 0xF8, cb::set, 7);

    t
};

#[cfg(test)]
mod tests {
    use super::*;

    const UNDEFINED: [u8; 11] = [
        0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
    ];

    #[test]
    fn test_primary_table_coverage() {
        for (opcode, cell) in PRIMARY.iter().enumerate() {
            let opcode = opcode as u8;
            match *cell {
                Instruction::Implemented(_) => assert!(!UNDEFINED.contains(&opcode)),
                Instruction::Prefix => assert_eq!(opcode, 0xCB),
                Instruction::Unimplemented(tag) => {
                    assert_eq!(tag, opcode);
                    assert!(UNDEFINED.contains(&opcode), "{opcode:02X}");
                }
            }
        }
    }

    #[test]
    fn test_extended_table_complete() {
        assert!(
            EXTENDED
                .iter()
                .all(|cell| matches!(cell, Instruction::Implemented(_)))
        );
    }
}
