//! # Exceptions
//!
//! ```text
//! Exception          Vector   Mode         LR
//! Reset              0x00     Supervisor   -
//! Undefined          0x04     Undefined    next instruction
//! SoftwareInterrupt  0x08     Supervisor   next instruction
//! PrefetchAbort      0x0C     Abort        aborted instruction + 4
//! DataAbort          0x10     Abort        aborted instruction + 8
//! Irq                0x18     Irq          next instruction + 4
//! Fiq                0x1C     Fiq          next instruction + 4
//! ```
//!
//! Vectors are relative to the base chosen by
//! [`CoreConfig::vector_base`](crate::config::CoreConfig::vector_base).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cpu::arm11::Arm11;
use crate::cpu::cpu_modes::Mode;
use crate::cpu::psr::ExecutionState;
use crate::cpu::register_set::REG_LR;
use crate::error::CoreResult;
use crate::memory::MemoryDevice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Exception {
    Reset,
    Undefined,
    SoftwareInterrupt,
    PrefetchAbort,
    DataAbort,
    Irq,
    Fiq,
}

impl Exception {
    #[must_use]
    pub const fn vector_offset(self) -> u32 {
        match self {
            Self::Reset => 0x00,
            Self::Undefined => 0x04,
            Self::SoftwareInterrupt => 0x08,
            Self::PrefetchAbort => 0x0C,
            Self::DataAbort => 0x10,
            Self::Irq => 0x18,
            Self::Fiq => 0x1C,
        }
    }

    #[must_use]
    pub const fn mode(self) -> Mode {
        match self {
            Self::Reset | Self::SoftwareInterrupt => Mode::Supervisor,
            Self::Undefined => Mode::Undefined,
            Self::PrefetchAbort | Self::DataAbort => Mode::Abort,
            Self::Irq => Mode::Irq,
            Self::Fiq => Mode::Fiq,
        }
    }

    /// Added to R15 (the next instruction while executing) to form LR.
    const fn return_offset(self) -> u32 {
        match self {
            Self::DataAbort | Self::Irq | Self::Fiq => 4,
            _ => 0,
        }
    }

    const fn masks_fiq(self) -> bool {
        matches!(self, Self::Reset | Self::Fiq)
    }

    const fn masks_abort(self) -> bool {
        !matches!(self, Self::Undefined | Self::SoftwareInterrupt)
    }
}

impl<M: MemoryDevice> Arm11<M> {
    /// Enters `exception`. Returns `false` when an IRQ or FIQ is refused
    /// because it is masked in the CPSR.
    ///
    /// # Errors
    ///
    /// Cannot fail for the exception modes, which all have an SPSR; the
    /// result is propagated from the SPSR write.
    pub fn raise_exception(&mut self, exception: Exception) -> CoreResult<bool> {
        let saved = self.registers.cpsr();
        let masked = match exception {
            Exception::Irq => saved.irq_disable(),
            Exception::Fiq => saved.fiq_disable(),
            _ => false,
        };
        if masked {
            warn!("{exception:?} refused, masked in CPSR {saved}");
            return Ok(false);
        }

        let return_address = self
            .registers
            .pc()
            .wrapping_add(exception.return_offset());

        self.registers.switch_mode(exception.mode());
        self.registers.set_spsr(saved)?;
        self.registers.write(REG_LR, return_address);

        let cpsr = self.registers.cpsr_mut();
        cpsr.set_execution_state(ExecutionState::Arm);
        cpsr.set_irq_disable(true);
        if exception.masks_fiq() {
            cpsr.set_fiq_disable(true);
        }
        if exception.masks_abort() {
            cpsr.set_abort_disable(true);
        }

        let vector = self
            .config
            .vector_base()
            .wrapping_add(exception.vector_offset());
        self.registers.set_pc(vector);
        debug!("{exception:?} taken, vector 0x{vector:08X}, return 0x{return_address:08X}");

        Ok(true)
    }
}
