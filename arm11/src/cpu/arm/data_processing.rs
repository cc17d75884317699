use crate::cpu::alu::{
    AddResult, FlagResult, ShifterOperand, add_with_carry, rotated_immediate, shift_by_immediate,
    shift_by_register,
};
use crate::cpu::arm::alu_instruction::ArmModeAluInstruction;
use crate::cpu::arm::instructions::AluSecondOperandInfo;
use crate::cpu::arm11::Arm11;
use crate::cpu::register_set::REG_PROGRAM_COUNTER;
use crate::error::CoreResult;
use crate::memory::MemoryDevice;

/// Value and carry/overflow updates produced by one ALU operation.
struct AluOutput {
    value: u32,
    carry: FlagResult,
    overflow: FlagResult,
}

impl From<AddResult> for AluOutput {
    fn from(sum: AddResult) -> Self {
        Self {
            value: sum.value,
            carry: sum.carry.into(),
            overflow: sum.overflow.into(),
        }
    }
}

impl<M: MemoryDevice> Arm11<M> {
    /// Second operand and shifter carry-out.
    ///
    /// With a register-specified shift R15 reads one word further ahead than
    /// usual (instruction + 12), for Rn as well as Rm.
    fn shifter_operand(&self, op2: AluSecondOperandInfo) -> ShifterOperand {
        match op2 {
            AluSecondOperandInfo::Immediate { base, rotate } => rotated_immediate(base, rotate),
            AluSecondOperandInfo::ShiftByImmediate { rm, kind, amount } => shift_by_immediate(
                kind,
                self.operand(rm),
                amount,
                self.registers.cpsr().carry_flag(),
            ),
            AluSecondOperandInfo::ShiftByRegister { rm, kind, rs } => shift_by_register(
                kind,
                self.shifted_operand(rm),
                self.registers.read(rs),
            ),
        }
    }

    fn shifted_operand(&self, index: usize) -> u32 {
        if index == REG_PROGRAM_COUNTER {
            self.operand(index).wrapping_add(4)
        } else {
            self.registers.read(index)
        }
    }

    pub(crate) fn data_processing(
        &mut self,
        alu_instruction: ArmModeAluInstruction,
        set_conditions: bool,
        rn: usize,
        destination: usize,
        op2: AluSecondOperandInfo,
    ) -> CoreResult<()> {
        let op1 = if matches!(op2, AluSecondOperandInfo::ShiftByRegister { .. }) {
            self.shifted_operand(rn)
        } else {
            self.operand(rn)
        };
        let ShifterOperand {
            value: op2,
            carry: shifter_carry,
        } = self.shifter_operand(op2);
        let carry_in = self.registers.cpsr().carry_flag();

        let logical = |value| AluOutput {
            value,
            carry: shifter_carry,
            overflow: FlagResult::Pass,
        };

        use ArmModeAluInstruction::*;
        let output = match alu_instruction {
            And | Tst => logical(op1 & op2),
            Eor | Teq => logical(op1 ^ op2),
            Orr => logical(op1 | op2),
            Bic => logical(op1 & !op2),
            Mov => logical(op2),
            Mvn => logical(!op2),
            Add | Cmn => add_with_carry(op1, op2, false).into(),
            Adc => add_with_carry(op1, op2, carry_in).into(),
            Sub | Cmp => add_with_carry(op1, !op2, true).into(),
            Sbc => add_with_carry(op1, !op2, carry_in).into(),
            Rsb => add_with_carry(op2, !op1, true).into(),
            Rsc => add_with_carry(op2, !op1, carry_in).into(),
        };

        // S with PC as destination returns from an exception.
        let returns = set_conditions
            && destination == REG_PROGRAM_COUNTER
            && !alu_instruction.is_test();
        if returns {
            self.registers.spsr()?;
        }

        if !alu_instruction.is_test() {
            self.registers.write(destination, output.value);
        }

        if !set_conditions {
            return Ok(());
        }

        if returns {
            return self.registers.restore_cpsr_from_spsr();
        }

        let cpsr = self.registers.cpsr_mut();
        cpsr.set_nz(output.value);
        cpsr.apply_carry(output.carry);
        cpsr.apply_overflow(output.overflow);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::arm11::Arm11;
    use crate::cpu::cpu_modes::Mode;
    use crate::cpu::psr::Psr;
    use crate::error::CoreError;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn nzcv(cpu: &Arm11) -> [bool; 4] {
        let cpsr = cpu.registers.cpsr();
        [
            cpsr.sign_flag(),
            cpsr.zero_flag(),
            cpsr.carry_flag(),
            cpsr.overflow_flag(),
        ]
    }

    #[test]
    fn check_adds_wraps_to_zero() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(1, 0xFFFF_FFFF);
        cpu.registers.write(2, 1);
        // ADDS R0, R1, R2
        cpu.execute_at(0x100, 0xE091_0002).unwrap();
        assert_eq!(cpu.registers.read(0), 0);
        assert_eq!(nzcv(&cpu), [false, true, true, false]);
    }

    #[test]
    fn check_subs_borrows() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(1, 0);
        cpu.registers.write(2, 1);
        // SUBS R0, R1, R2
        cpu.execute_at(0x100, 0xE051_0002).unwrap();
        assert_eq!(cpu.registers.read(0), 0xFFFF_FFFF);
        assert_eq!(nzcv(&cpu), [true, false, false, false]);
    }

    #[test]
    fn check_signed_overflow() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(1, 0x7FFF_FFFF);
        // ADDS R0, R1, #1
        cpu.execute_at(0x100, 0xE291_0001).unwrap();
        assert_eq!(cpu.registers.read(0), 0x8000_0000);
        assert_eq!(nzcv(&cpu), [true, false, false, true]);

        // CMP R0, #1: 0x80000000 - 1 overflows the other way.
        cpu.execute_at(0x104, 0xE350_0001).unwrap();
        assert_eq!(nzcv(&cpu), [false, false, true, true]);
        assert_eq!(cpu.registers.read(0), 0x8000_0000);
    }

    #[test]
    fn add_then_sub_restores_register() {
        let mut rng = StdRng::seed_from_u64(0x0A11);
        let mut cpu = Arm11::for_tests();
        for _ in 0..256 {
            let start = rng.gen_range(0..=u32::MAX);
            let operand = rng.gen_range(0..=u32::MAX);
            cpu.registers.write(0, start);
            cpu.registers.write(1, operand);
            // ADD R0, R0, R1 then SUB R0, R0, R1
            cpu.execute_at(0x100, 0xE080_0001).unwrap();
            cpu.execute_at(0x104, 0xE040_0001).unwrap();
            assert_eq!(cpu.registers.read(0), start);
        }
    }

    #[test]
    fn carry_consuming_ops() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(1, 5);
        cpu.registers.write(2, 3);

        cpu.registers.cpsr_mut().set_carry_flag(false);
        // SBC R0, R1, R2
        cpu.execute_at(0x100, 0xE0C1_0002).unwrap();
        assert_eq!(cpu.registers.read(0), 1);

        cpu.registers.cpsr_mut().set_carry_flag(true);
        // ADC R0, R1, R2
        cpu.execute_at(0x100, 0xE0A1_0002).unwrap();
        assert_eq!(cpu.registers.read(0), 9);

        // RSB R0, R1, #0
        cpu.execute_at(0x100, 0xE261_0000).unwrap();
        assert_eq!(cpu.registers.read(0), (-5_i32).cast_unsigned());

        cpu.registers.cpsr_mut().set_carry_flag(false);
        // RSC R0, R2, R1
        cpu.execute_at(0x100, 0xE0E2_0001).unwrap();
        assert_eq!(cpu.registers.read(0), 1);
    }

    #[test]
    fn logical_ops_take_shifter_carry_and_keep_overflow() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.cpsr_mut().set_overflow_flag(true);
        cpu.registers.write(1, 0x8000_0001);
        // MOVS R0, R1, LSL #1
        cpu.execute_at(0x100, 0xE1B0_0081).unwrap();
        assert_eq!(cpu.registers.read(0), 2);
        assert_eq!(nzcv(&cpu), [false, false, true, true]);

        // BICS R0, R1, #1: immediate without rotation leaves C alone.
        cpu.execute_at(0x104, 0xE3D1_0001).unwrap();
        assert_eq!(cpu.registers.read(0), 0x8000_0000);
        assert_eq!(nzcv(&cpu), [true, false, true, true]);

        // MVNS R0, #0xFF000000 (rotated, so C takes bit 31).
        cpu.execute_at(0x108, 0xE3F0_04FF).unwrap();
        assert_eq!(cpu.registers.read(0), 0x00FF_FFFF);
        assert_eq!(nzcv(&cpu), [false, false, true, true]);
    }

    #[test]
    fn test_instructions_do_not_write() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(0, 2);
        // TST R0, #1
        cpu.execute_at(0x100, 0xE310_0001).unwrap();
        assert_eq!(cpu.registers.read(0), 2);
        assert!(cpu.registers.cpsr().zero_flag());

        // TEQ R0, #2
        cpu.execute_at(0x100, 0xE330_0002).unwrap();
        assert!(cpu.registers.cpsr().zero_flag());

        // CMN R0, #2
        cpu.execute_at(0x100, 0xE370_0002).unwrap();
        assert!(!cpu.registers.cpsr().zero_flag());
        assert_eq!(cpu.registers.read(0), 2);
    }

    #[test]
    fn pc_as_operand() {
        let mut cpu = Arm11::for_tests();
        // ADD R0, PC, #1 at 0x100: PC reads 0x108.
        cpu.execute_at(0x100, 0xE28F_0001).unwrap();
        assert_eq!(cpu.registers.read(0), 0x109);

        // ADD R2, R1, PC, LSL R3 at 0x100: PC reads 0x10C.
        cpu.registers.write(1, 0);
        cpu.registers.write(3, 0);
        cpu.execute_at(0x100, 0xE081_231F).unwrap();
        assert_eq!(cpu.registers.read(2), 0x10C);
    }

    #[test]
    fn register_shift_uses_low_byte_of_rs() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(1, 1);
        cpu.registers.write(3, 0x104);
        // MOV R0, R1, LSL R3
        cpu.execute_at(0x100, 0xE1A0_0311).unwrap();
        assert_eq!(cpu.registers.read(0), 0x10);
    }

    #[test]
    fn mov_to_pc_is_a_branch() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(0, 0x300);
        // MOV PC, R0
        cpu.execute_at(0x100, 0xE1A0_F000).unwrap();
        assert_eq!(cpu.registers.pc(), 0x300);
        assert_eq!(cpu.registers.mode(), Mode::Supervisor);
    }

    #[test]
    fn movs_pc_lr_returns_from_exception() {
        let mut cpu = Arm11::for_tests();
        let mut saved = Psr::from(Mode::User);
        saved.set_carry_flag(true);
        cpu.registers.set_spsr(saved).unwrap();
        cpu.registers.write(14, 0x200);
        // MOVS PC, LR
        cpu.execute_at(0x100, 0xE1B0_F00E).unwrap();
        assert_eq!(cpu.registers.pc(), 0x200);
        assert_eq!(cpu.registers.mode(), Mode::User);
        assert_eq!(cpu.registers.cpsr(), saved);
    }

    #[test]
    fn movs_pc_without_spsr_fails() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.switch_mode(Mode::System);
        cpu.registers.write(14, 0x200);
        assert_eq!(
            cpu.execute_at(0x100, 0xE1B0_F00E),
            Err(CoreError::NoSpsr { mode: Mode::System })
        );
        assert_eq!(cpu.registers.pc(), 0x104);
        assert_eq!(cpu.registers.mode(), Mode::System);
    }
}
