//! # Register file and mode banking
//!
//! ```text
//!          User/System   FIQ        IRQ        SVC        ABT        UND
//! R0-R7    ─────────────────────── shared by every mode ───────────────────
//! R8-R12   R8-R12        R8_fiq..   (shared)   (shared)   (shared)   (shared)
//! R13-R14  R13-R14       R13_fiq..  R13_irq..  R13_svc..  R13_abt..  R13_und..
//! R15      ─────────────────────── shared by every mode ───────────────────
//! SPSR     -             SPSR_fiq   SPSR_irq   SPSR_svc   SPSR_abt   SPSR_und
//! ```
//!
//! The sixteen active registers always hold the view of the current mode. The
//! values hidden by that view sit in [`BANK_SLOTS`] slots, and a mode switch
//! saves R8-R14 into whichever slot owns each of them under the outgoing
//! mode, then loads them back from the owners under the incoming mode.

use serde::{Deserialize, Serialize};

use crate::cpu::cpu_modes::{BANK_SLOTS, Mode};
use crate::cpu::psr::Psr;
use crate::error::{CoreError, CoreResult};

pub const REG_SP: usize = 13;
pub const REG_LR: usize = 14;
pub const REG_PROGRAM_COUNTER: usize = 15;

const FIRST_BANKED: usize = 8;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct BankSlot {
    /// R8-R14, only the part owned by the slot's mode is meaningful.
    registers: [u32; 7],
    spsr: Psr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSet {
    registers: [u32; 16],
    cpsr: Psr,
    /// SPSR of the current mode; unused in User and System.
    spsr: Psr,
    mode: Mode,
    banks: [BankSlot; BANK_SLOTS],
}

impl Default for RegisterSet {
    fn default() -> Self {
        Self::new(Mode::User)
    }
}

impl RegisterSet {
    /// All registers zeroed, CPSR holding only the mode bits.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            registers: [0; 16],
            cpsr: Psr::from(mode),
            spsr: Psr::default(),
            mode,
            banks: [BankSlot::default(); BANK_SLOTS],
        }
    }

    #[must_use]
    pub fn read(&self, index: usize) -> u32 {
        self.registers[index]
    }

    pub fn write(&mut self, index: usize, value: u32) {
        assert!(index <= REG_PROGRAM_COUNTER, "register index {index} out of range");
        self.registers[index] = value;
    }

    /// Copy of the sixteen registers visible in the current mode.
    #[must_use]
    pub const fn values(&self) -> [u32; 16] {
        self.registers
    }

    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.registers[REG_PROGRAM_COUNTER]
    }

    pub const fn set_pc(&mut self, value: u32) {
        self.registers[REG_PROGRAM_COUNTER] = value;
    }

    pub const fn advance_pc(&mut self, by: u32) {
        self.registers[REG_PROGRAM_COUNTER] = self.registers[REG_PROGRAM_COUNTER].wrapping_add(by);
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub const fn cpsr(&self) -> Psr {
        self.cpsr
    }

    /// Direct access for flag updates. The mode field must only change
    /// through [`switch_mode`](Self::switch_mode) or [`set_cpsr`](Self::set_cpsr).
    pub(crate) const fn cpsr_mut(&mut self) -> &mut Psr {
        &mut self.cpsr
    }

    /// Writes the whole CPSR, swapping register banks if the mode changes.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if `value` holds reserved mode bits.
    pub fn set_cpsr(&mut self, value: Psr) -> CoreResult<()> {
        let mode = value.mode()?;
        self.switch_mode(mode);
        self.cpsr = value;
        Ok(())
    }

    /// # Errors
    ///
    /// User and System mode have no SPSR.
    pub fn spsr(&self) -> CoreResult<Psr> {
        self.check_spsr()?;
        Ok(self.spsr)
    }

    /// # Errors
    ///
    /// User and System mode have no SPSR.
    pub fn set_spsr(&mut self, value: Psr) -> CoreResult<()> {
        self.check_spsr()?;
        self.spsr = value;
        Ok(())
    }

    /// Exception return: CPSR takes the value of the current mode's SPSR.
    ///
    /// # Errors
    ///
    /// Fails in User/System mode or when the SPSR holds reserved mode bits.
    pub fn restore_cpsr_from_spsr(&mut self) -> CoreResult<()> {
        let spsr = self.spsr()?;
        self.set_cpsr(spsr)
    }

    /// Swaps the banked part of the register file for the one of `new_mode`.
    ///
    /// Only R8-R14, the SPSR and the CPSR mode field change. The SPSR is
    /// banked together with the registers: entering a mode exposes whatever
    /// that mode's SPSR held when it was last left.
    pub fn switch_mode(&mut self, new_mode: Mode) {
        if new_mode == self.mode {
            return;
        }
        tracing::debug!("mode switch {:?} -> {new_mode:?}", self.mode);

        let outgoing = self.mode.bank_layout();
        for index in FIRST_BANKED..REG_PROGRAM_COUNTER {
            self.banks[outgoing.owner(index)].registers[index - FIRST_BANKED] =
                self.registers[index];
        }
        self.banks[outgoing.slot].spsr = self.spsr;

        let incoming = new_mode.bank_layout();
        for index in FIRST_BANKED..REG_PROGRAM_COUNTER {
            self.registers[index] =
                self.banks[incoming.owner(index)].registers[index - FIRST_BANKED];
        }
        self.spsr = self.banks[incoming.slot].spsr;

        self.mode = new_mode;
        self.cpsr.set_mode(new_mode);
    }

    const fn check_spsr(&self) -> CoreResult<()> {
        if self.mode.has_spsr() {
            Ok(())
        } else {
            Err(CoreError::NoSpsr { mode: self.mode })
        }
    }
}

impl std::fmt::Display for RegisterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (row, chunk) in self.registers.chunks(4).enumerate() {
            for (column, value) in chunk.iter().enumerate() {
                let index = row * 4 + column;
                let name = match index {
                    REG_SP => "SP".to_string(),
                    REG_LR => "LR".to_string(),
                    REG_PROGRAM_COUNTER => "PC".to_string(),
                    _ => format!("R{index}"),
                };
                write!(f, "{name:>3}: {value:08X}  ")?;
            }
            writeln!(f)?;
        }
        write!(f, "CPSR: {}", self.cpsr)?;
        if self.mode.has_spsr() {
            write!(f, "\nSPSR: {}", self.spsr)?;
        }
        Ok(())
    }
}
