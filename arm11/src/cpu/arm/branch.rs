use crate::cpu::arm11::Arm11;
use crate::cpu::psr::ExecutionState;
use crate::cpu::register_set::REG_LR;
use crate::memory::MemoryDevice;

impl<M: MemoryDevice> Arm11<M> {
    /// `B`/`BL`. `offset` is relative to the instruction address + 8.
    pub(crate) fn branch(&mut self, link: bool, offset: u32) {
        let next = self.registers.pc();
        if link {
            self.registers.write(REG_LR, next);
        }
        self.registers
            .set_pc(next.wrapping_add(4).wrapping_add(offset));
    }

    /// `BX`, `BXJ` and `BLX Rm`.
    pub(crate) fn branch_and_exchange(&mut self, link: bool, rm: usize) {
        // Read first: `BLX LR` jumps to the old LR.
        let target = self.operand(rm);
        if link {
            self.registers.write(REG_LR, self.registers.pc());
        }
        self.interwork(target);
    }

    /// `BLX #offset`, always switching to Thumb.
    pub(crate) fn branch_link_exchange_immediate(&mut self, offset: u32) {
        let next = self.registers.pc();
        self.registers.write(REG_LR, next);
        self.set_execution_state(ExecutionState::Thumb);
        self.registers
            .set_pc(next.wrapping_add(4).wrapping_add(offset));
    }
}
