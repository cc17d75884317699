//! Instructions of the `1111` condition space that need the core: `CPS`,
//! `SRS` and `RFE`.

use crate::cpu::arm::block_transfer::block_start_address;
use crate::cpu::arm11::Arm11;
use crate::cpu::cpu_modes::Mode;
use crate::cpu::flags::{Indexing, Offsetting};
use crate::cpu::psr::Psr;
use crate::cpu::register_set::{REG_LR, REG_SP};
use crate::error::CoreResult;
use crate::memory::MemoryDevice;

impl<M: MemoryDevice> Arm11<M> {
    /// `CPS`. Ignored in User mode.
    pub(crate) fn change_processor_state(
        &mut self,
        imod: u32,
        change_mode: bool,
        affect_a: bool,
        affect_i: bool,
        affect_f: bool,
        mode: u32,
    ) -> CoreResult<()> {
        if !self.registers.mode().is_privileged() {
            return Ok(());
        }

        // imod: 10 enables (clears the mask bits), 11 disables.
        if imod & 0b10 != 0 {
            let disable = imod & 0b01 != 0;
            let cpsr = self.registers.cpsr_mut();
            if affect_a {
                cpsr.set_abort_disable(disable);
            }
            if affect_i {
                cpsr.set_irq_disable(disable);
            }
            if affect_f {
                cpsr.set_fiq_disable(disable);
            }
        }

        if change_mode {
            let mode = Mode::try_from(mode)?;
            self.registers.switch_mode(mode);
        }
        Ok(())
    }

    /// `SRS`: pushes LR and SPSR of the current mode onto the stack of `mode`.
    pub(crate) fn save_return_state(
        &mut self,
        indexing: Indexing,
        offsetting: Offsetting,
        write_back: bool,
        mode: u32,
    ) -> CoreResult<()> {
        let target = Mode::try_from(mode)?;
        let link = self.registers.read(REG_LR);
        let spsr = self.registers.spsr()?;

        let current = self.registers.mode();
        self.registers.switch_mode(target);
        let stored = self.store_return_state(indexing, offsetting, write_back, link, spsr);
        self.registers.switch_mode(current);
        stored
    }

    /// Runs with the target mode's SP visible.
    fn store_return_state(
        &mut self,
        indexing: Indexing,
        offsetting: Offsetting,
        write_back: bool,
        link: u32,
        spsr: Psr,
    ) -> CoreResult<()> {
        let sp = self.registers.read(REG_SP);
        let address = block_start_address(sp, indexing, offsetting, 8) & !3;
        self.memory.write_word(address, link)?;
        self.memory.write_word(address.wrapping_add(4), spsr.into())?;
        if write_back {
            self.registers.write(REG_SP, offsetting.apply(sp, 8));
        }
        Ok(())
    }

    /// `RFE`: loads PC, then CPSR, from two words at Rn.
    pub(crate) fn return_from_exception(
        &mut self,
        indexing: Indexing,
        offsetting: Offsetting,
        write_back: bool,
        rn: usize,
    ) -> CoreResult<()> {
        let base = self.registers.read(rn);
        let address = block_start_address(base, indexing, offsetting, 8) & !3;
        let pc = self.memory.read_word(address)?;
        let cpsr = self.memory.read_word(address.wrapping_add(4))?;

        if write_back {
            self.registers.write(rn, offsetting.apply(base, 8));
        }
        self.registers.set_cpsr(Psr::from(cpsr))?;
        self.registers.set_pc(pc);
        Ok(())
    }
}
