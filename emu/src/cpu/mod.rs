//! Sharp LR35902 instruction processor.
//!
//! Owns the register file and the memory bus. Each [`Cpu::step`] services a
//! pending interrupt, idles while halted, or fetches one opcode and runs it
//! through the primary table (and the CB table after a prefix). The cost is
//! returned in machine cycles, and the bus is then ticked by the same amount.

mod alu;
mod extended;
mod ops;
mod registers;
mod table;


use std::fmt;

pub use registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z, Registers};
pub use table::{EXTENDED, Handler, Instruction, PREFIX_CYCLES, PRIMARY};

use crate::bus::MemoryBus;
use crate::config::CoreConfig;
use crate::error::{LoadError, StepError};
use crate::log::LogCategory;
use crate::{log_error, log_info};

/// Machine cycles spent pushing PC and jumping to an interrupt vector.
pub const INTERRUPT_DISPATCH_CYCLES: u32 = 5;
/// Machine cycles reported per step while halted.
const HALT_IDLE_CYCLES: u32 = 1;

/// Debug state for CPU inspection.
pub struct CpuDebugState {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub f: u8,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub ime: bool,
    pub halted: bool,
    pub faulted: bool,
}

impl fmt::Display for CpuDebugState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PC={:04X} SP={:04X} A={:02X} F={:02X} BC={:04X} DE={:04X} HL={:04X} IME={} halt={}",
            self.pc, self.sp, self.a, self.f, self.bc, self.de, self.hl, self.ime, self.halted
        )?;
        if self.faulted {
            write!(f, " FAULT")?;
        }
        Ok(())
    }
}

pub struct Cpu {
    regs: Registers,
    bus: MemoryBus,
    /// First unimplemented-opcode fault; once set, every step returns it.
    fault: Option<StepError>,

    // Debug
    instruction_count: u64,
    trace_instructions: u64,
}

impl Cpu {
    pub fn new() -> Self {
        Self::with_config(&CoreConfig::default())
    }

    pub fn with_config(config: &CoreConfig) -> Self {
        Cpu {
            regs: Registers::new(),
            bus: MemoryBus::new(config.shades),
            fault: None,
            instruction_count: 0,
            trace_instructions: config.trace_instructions,
        }
    }

    /// Hand the program image to the cartridge. Fails without side effects.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), LoadError> {
        self.bus.load_cartridge(bytes)
    }

    /// Run one instruction (or interrupt dispatch, or one halted idle) and
    /// return the machine cycles it took.
    pub fn step(&mut self) -> Result<u32, StepError> {
        if let Some(fault) = self.fault {
            return Err(fault);
        }
        if !self.bus.cartridge().is_loaded() {
            return Err(StepError::NoCartridge);
        }

        let cycles = if let Some(cycles) = self.service_interrupt() {
            cycles
        } else if self.regs.halted {
            HALT_IDLE_CYCLES
        } else {
            // EI takes effect after the instruction that follows it
            let enable_after = self.regs.ime_pending;
            let cycles = match self.execute_next() {
                Ok(cycles) => cycles,
                Err(fault) => {
                    log_error!(LogCategory::Cpu, "{} ({})", fault, self.get_debug_state());
                    self.fault = Some(fault);
                    return Err(fault);
                }
            };
            if enable_after && self.regs.ime_pending {
                self.regs.ime = true;
                self.regs.ime_pending = false;
            }
            cycles
        };

        self.bus.tick(cycles);
        Ok(cycles)
    }

    /// Wake from HALT on any enabled request and, with IME set, dispatch the
    /// highest-priority one.
    fn service_interrupt(&mut self) -> Option<u32> {
        if !self.bus.interrupts().any_pending() {
            return None;
        }
        self.regs.halted = false;
        if !self.regs.ime {
            return None;
        }

        let interrupt = self.bus.interrupts().highest_pending()?;
        self.regs.ime = false;
        self.regs.ime_pending = false;
        self.bus.interrupts_mut().clear(interrupt);
        let pc = self.regs.pc;
        self.regs.push_word(&mut self.bus, pc);
        self.regs.pc = interrupt.vector();
        Some(INTERRUPT_DISPATCH_CYCLES)
    }

    fn execute_next(&mut self) -> Result<u32, StepError> {
        let address = self.regs.pc;
        let opcode = self.regs.fetch(&self.bus);

        if self.instruction_count < self.trace_instructions {
            let r = &self.regs;
            log_info!(
                LogCategory::Cpu,
                "#{:04x}: PC=0x{:04X} OP=0x{:02X} A={:02X} BC={:04X} DE={:04X} HL={:04X} SP={:04X}",
                self.instruction_count,
                address,
                opcode,
                r.a,
                r.bc(),
                r.de(),
                r.hl(),
                r.sp
            );
        }
        self.instruction_count += 1;

        match PRIMARY[opcode as usize] {
            Instruction::Implemented(handler) => Ok(handler(&mut self.regs, &mut self.bus)),
            Instruction::Prefix => {
                let extended = self.regs.fetch(&self.bus);
                match EXTENDED[extended as usize] {
                    Instruction::Implemented(handler) => {
                        Ok(PREFIX_CYCLES + handler(&mut self.regs, &mut self.bus))
                    }
                    Instruction::Prefix | Instruction::Unimplemented(_) => {
                        Err(StepError::UnimplementedExtended {
                            opcode: extended,
                            address,
                        })
                    }
                }
            }
            Instruction::Unimplemented(opcode) => {
                Err(StepError::UnimplementedOpcode { opcode, address })
            }
        }
    }

    #[inline]
    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    #[inline]
    pub fn bus(&self) -> &MemoryBus {
        &self.bus
    }

    #[inline]
    pub fn bus_mut(&mut self) -> &mut MemoryBus {
        &mut self.bus
    }

    #[inline]
    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    #[inline]
    pub fn fault(&self) -> Option<StepError> {
        self.fault
    }

    /// Get current CPU state for debugging.
    pub fn get_debug_state(&self) -> CpuDebugState {
        let r = &self.regs;
        CpuDebugState {
            pc: r.pc,
            sp: r.sp,
            a: r.a,
            f: r.f,
            bc: r.bc(),
            de: r.de(),
            hl: r.hl(),
            ime: r.ime,
            halted: r.halted,
            faulted: self.fault.is_some(),
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
