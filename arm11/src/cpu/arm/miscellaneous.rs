use crate::cpu::alu::signed_saturate;
use crate::cpu::arm::instructions::{MsrOperand, PsrKind, SaturatingOp};
use crate::cpu::arm11::Arm11;
use crate::cpu::psr::{PRIVILEGED_MASK, STATE_MASK, USER_MASK};
use crate::error::CoreResult;
use crate::memory::MemoryDevice;

impl<M: MemoryDevice> Arm11<M> {
    /// `MRS`
    pub(crate) fn psr_read(&mut self, psr: PsrKind, rd: usize) -> CoreResult<()> {
        let value = match psr {
            PsrKind::Cpsr => self.registers.cpsr(),
            PsrKind::Spsr => self.registers.spsr()?,
        };
        self.registers.write(rd, value.into());
        Ok(())
    }

    /// `MSR`. `field_mask` selects whole bytes; the privilege masks then
    /// decide which bits of those bytes may change.
    pub(crate) fn psr_write(
        &mut self,
        psr: PsrKind,
        field_mask: u32,
        operand: MsrOperand,
    ) -> CoreResult<()> {
        let value = match operand {
            MsrOperand::Immediate(value) => value,
            MsrOperand::Register(rm) => self.registers.read(rm),
        };

        match psr {
            PsrKind::Cpsr => {
                let writable = if self.registers.mode().is_privileged() {
                    USER_MASK | PRIVILEGED_MASK
                } else {
                    USER_MASK
                };
                let updated = self.registers.cpsr().merged(value, field_mask & writable);
                self.registers.set_cpsr(updated)
            }
            PsrKind::Spsr => {
                let writable = USER_MASK | PRIVILEGED_MASK | STATE_MASK;
                let updated = self.registers.spsr()?.merged(value, field_mask & writable);
                self.registers.set_spsr(updated)
            }
        }
    }

    /// `CLZ`
    pub(crate) fn count_leading_zeros(&mut self, rd: usize, rm: usize) {
        let value = self.registers.read(rm);
        self.registers.write(rd, value.leading_zeros());
    }

    /// `QADD`, `QSUB`, `QDADD`, `QDSUB`. The doubling of Rn saturates on its
    /// own and also sets Q.
    pub(crate) fn saturating_arithmetic(
        &mut self,
        op: SaturatingOp,
        rd: usize,
        rn: usize,
        rm: usize,
    ) {
        let first = i64::from(self.registers.read(rm).cast_signed());
        let second = i64::from(self.registers.read(rn).cast_signed());

        let (second, doubling_saturated) = match op {
            SaturatingOp::DoubleAdd | SaturatingOp::DoubleSub => {
                let (doubled, saturated) = signed_saturate(second * 2);
                (i64::from(doubled.cast_signed()), saturated)
            }
            SaturatingOp::Add | SaturatingOp::Sub => (second, false),
        };

        let (result, saturated) = match op {
            SaturatingOp::Add | SaturatingOp::DoubleAdd => signed_saturate(first + second),
            SaturatingOp::Sub | SaturatingOp::DoubleSub => signed_saturate(first - second),
        };

        self.registers.write(rd, result);
        if saturated || doubling_saturated {
            self.registers.cpsr_mut().set_sticky_overflow(true);
        }
    }
}
