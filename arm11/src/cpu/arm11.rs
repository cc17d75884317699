use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::bitwise::Bits;
use crate::config::CoreConfig;
use crate::cpu::arm::instructions::ArmModeInstruction;
use crate::cpu::condition::Condition;
use crate::cpu::cpu_modes::Mode;
use crate::cpu::exception::Exception;
use crate::cpu::psr::ExecutionState;
use crate::cpu::register_set::{REG_PROGRAM_COUNTER, RegisterSet};
use crate::error::{CoreError, CoreResult};
use crate::memory::{MemoryDevice, Ram};

/// An ARMv6 core attached to its memory.
///
/// While an instruction executes, R15 already points at the next one; reads
/// of R15 as an operand go through [`Arm11::operand`] which adds the
/// remaining pipeline offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arm11<M = Ram> {
    pub(crate) registers: RegisterSet,
    pub(crate) memory: M,
    pub(crate) config: CoreConfig,
    retired: u64,
}

/// Serializable view of the architectural state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreSnapshot {
    pub registers: [u32; 16],
    pub cpsr: u32,
    pub spsr: Option<u32>,
    pub mode: Mode,
    pub execution_state: ExecutionState,
    pub retired: u64,
}

impl Default for Arm11 {
    fn default() -> Self {
        Self::with_config(CoreConfig::default())
    }
}

impl Arm11<Ram> {
    /// A core with zeroed RAM of `config.memory_size` bytes.
    #[must_use]
    pub fn with_config(config: CoreConfig) -> Self {
        let memory = Ram::new(config.memory_size);
        Self::new(config, memory)
    }
}

impl<M: MemoryDevice> Arm11<M> {
    #[must_use]
    pub fn new(config: CoreConfig, memory: M) -> Self {
        let mut core = Self {
            registers: RegisterSet::new(Mode::Supervisor),
            memory,
            config,
            retired: 0,
        };
        core.reset();
        core
    }

    /// Puts the core in its reset state: registers and banks zeroed,
    /// Supervisor mode, interrupts and aborts masked, ARM state.
    /// Memory is left untouched.
    pub fn reset(&mut self) {
        self.registers = RegisterSet::new(Mode::Supervisor);

        let cpsr = self.registers.cpsr_mut();
        cpsr.set_irq_disable(true);
        cpsr.set_fiq_disable(true);
        cpsr.set_abort_disable(true);
        cpsr.set_execution_state(ExecutionState::Arm);

        let pc = self
            .config
            .reset_pc
            .unwrap_or_else(|| self.config.vector_base());
        self.registers.set_pc(pc);
        self.retired = 0;

        info!("reset, pc 0x{pc:08X}");
    }

    /// Fetches and executes one instruction.
    ///
    /// A condition-failed instruction still counts as retired. A step that
    /// returns an error retires nothing, whether it failed in ARM or in Thumb
    /// state, so `retired` only counts instructions that completed.
    ///
    /// # Errors
    ///
    /// Fails on undefined or unimplemented encodings, out of bounds memory
    /// accesses, and on any fetch in Thumb state.
    pub fn step(&mut self) -> CoreResult<()> {
        let state = self.execution_state();
        let pc = state.align(self.registers.pc());
        self.registers.set_pc(pc);

        match state {
            ExecutionState::Arm => {
                let op_code = self.memory.read_word(pc)?;
                self.registers.advance_pc(state.instruction_width());
                trace!("0x{pc:08X}: 0x{op_code:08X}");
                self.execute_arm(op_code)?;
            }
            ExecutionState::Thumb => {
                let op_code = self.memory.read_half_word(pc)?;
                self.registers.advance_pc(state.instruction_width());
                return Err(CoreError::ThumbUnsupported {
                    instruction: op_code,
                });
            }
        }

        self.retired += 1;
        Ok(())
    }

    /// Steps until `max_steps` instructions retired or an instruction
    /// branches to itself, and returns how many were executed.
    ///
    /// # Errors
    ///
    /// Stops at the first failing [`step`](Self::step).
    pub fn run(&mut self, max_steps: u64) -> CoreResult<u64> {
        for executed in 1..=max_steps {
            let pc = self.registers.pc();
            self.step()?;
            if self.registers.pc() == pc {
                debug!("halted on a branch to self at 0x{pc:08X}");
                return Ok(executed);
            }
        }
        Ok(max_steps)
    }

    /// Executes an ARM instruction word. PC must already point past it.
    ///
    /// # Errors
    ///
    /// Propagates decode and execution failures.
    pub fn execute_arm(&mut self, op_code: u32) -> CoreResult<()> {
        let condition = Condition::of(op_code);
        if !condition.is_satisfied(self.registers.cpsr()) {
            return Ok(());
        }

        let instruction = ArmModeInstruction::try_from(op_code)?;
        trace!("{instruction} {condition}");

        use ArmModeInstruction::*;
        match instruction {
            DataProcessing {
                alu_instruction,
                set_conditions,
                rn,
                destination,
                op2,
            } => self.data_processing(alu_instruction, set_conditions, rn, destination, op2),
            Multiply {
                accumulate,
                set_conditions,
                rd,
                rn,
                rs,
                rm,
            } => {
                self.multiply(accumulate, set_conditions, rd, rn, rs, rm);
                Ok(())
            }
            MultiplyLong {
                signed,
                accumulate,
                set_conditions,
                rd_hi,
                rd_lo,
                rs,
                rm,
            } => {
                self.multiply_long(signed, accumulate, set_conditions, rd_hi, rd_lo, rs, rm);
                Ok(())
            }
            MultiplyDoubleAccumulate {
                rd_hi,
                rd_lo,
                rs,
                rm,
            } => {
                self.multiply_double_accumulate(rd_hi, rd_lo, rs, rm);
                Ok(())
            }
            SignedMultiplyHalfword {
                op,
                x_top,
                y_top,
                rd,
                rn,
                rs,
                rm,
            } => {
                self.signed_multiply_halfword(op, x_top, y_top, rd, rn, rs, rm);
                Ok(())
            }
            SingleDataSwap { width, rn, rd, rm } => self.single_data_swap(width, rn, rd, rm),
            SingleDataTransfer {
                load_store,
                indexing,
                offsetting,
                width,
                write_back,
                rn,
                rd,
                offset,
            } => self.single_data_transfer(
                load_store, indexing, offsetting, width, write_back, rn, rd, offset,
            ),
            HalfwordDataTransfer {
                load_store,
                indexing,
                offsetting,
                write_back,
                kind,
                rn,
                rd,
                offset,
            } => self.halfword_data_transfer(
                load_store, indexing, offsetting, write_back, kind, rn, rd, offset,
            ),
            BlockDataTransfer {
                load_store,
                indexing,
                offsetting,
                load_psr,
                write_back,
                rn,
                register_list,
            } => self.block_data_transfer(
                load_store,
                indexing,
                offsetting,
                load_psr,
                write_back,
                rn,
                register_list,
            ),
            Branch { link, offset } => {
                self.branch(link, offset);
                Ok(())
            }
            BranchAndExchange { link, rm } => {
                self.branch_and_exchange(link, rm);
                Ok(())
            }
            BranchLinkExchangeImmediate { offset } => {
                self.branch_link_exchange_immediate(offset);
                Ok(())
            }
            PsrRead { psr, rd } => self.psr_read(psr, rd),
            PsrWrite {
                psr,
                field_mask,
                operand,
            } => self.psr_write(psr, field_mask, operand),
            CountLeadingZeros { rd, rm } => {
                self.count_leading_zeros(rd, rm);
                Ok(())
            }
            SaturatingArithmetic { op, rd, rn, rm } => {
                self.saturating_arithmetic(op, rd, rn, rm);
                Ok(())
            }
            Breakpoint { comment } => {
                debug!("BKPT 0x{comment:04X}");
                self.raise_exception(Exception::PrefetchAbort).map(drop)
            }
            SoftwareInterrupt { comment } => {
                debug!("SWI 0x{comment:06X}");
                self.raise_exception(Exception::SoftwareInterrupt)
                    .map(drop)
            }
            ChangeProcessorState {
                imod,
                change_mode,
                affect_a,
                affect_i,
                affect_f,
                mode,
            } => self.change_processor_state(imod, change_mode, affect_a, affect_i, affect_f, mode),
            SetEndianness { big_endian } => {
                self.registers.cpsr_mut().set_big_endian(big_endian);
                Ok(())
            }
            Preload => Ok(()),
            SaveReturnState {
                indexing,
                offsetting,
                write_back,
                mode,
            } => self.save_return_state(indexing, offsetting, write_back, mode),
            ReturnFromException {
                indexing,
                offsetting,
                write_back,
                rn,
            } => self.return_from_exception(indexing, offsetting, write_back, rn),
            Coprocessor => Err(unimplemented(op_code, "coprocessor")),
            Media => Err(unimplemented(op_code, "media")),
            Exclusive => Err(unimplemented(op_code, "exclusive access")),
        }
    }

    /// Value of register `index` as an instruction operand: R15 reads as the
    /// address of the executing instruction plus 8.
    pub(crate) fn operand(&self, index: usize) -> u32 {
        let value = self.registers.read(index);
        if index == REG_PROGRAM_COUNTER {
            value.wrapping_add(4)
        } else {
            value
        }
    }

    /// Jumps to `target`, bit 0 selecting the Thumb state.
    pub(crate) fn interwork(&mut self, target: u32) {
        let state = ExecutionState::from(target.get_bit(0));
        self.set_execution_state(state);
        self.registers.set_pc(state.align(target));
    }

    pub fn set_execution_state(&mut self, state: ExecutionState) {
        if self.execution_state() != state {
            debug!("execution state {:?} -> {state:?}", self.execution_state());
        }
        self.registers.cpsr_mut().set_execution_state(state);
    }

    #[must_use]
    pub fn execution_state(&self) -> ExecutionState {
        self.registers.cpsr().execution_state()
    }

    #[must_use]
    pub fn snapshot(&self) -> CoreSnapshot {
        CoreSnapshot {
            registers: self.registers.values(),
            cpsr: self.registers.cpsr().into(),
            spsr: self.registers.spsr().ok().map(u32::from),
            mode: self.registers.mode(),
            execution_state: self.execution_state(),
            retired: self.retired,
        }
    }

    #[must_use]
    pub const fn registers(&self) -> &RegisterSet {
        &self.registers
    }

    pub const fn registers_mut(&mut self) -> &mut RegisterSet {
        &mut self.registers
    }

    #[must_use]
    pub const fn memory(&self) -> &M {
        &self.memory
    }

    pub const fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Instructions stepped since the last reset.
    #[must_use]
    pub const fn retired(&self) -> u64 {
        self.retired
    }
}

const fn unimplemented(instruction: u32, class: &'static str) -> CoreError {
    CoreError::Unimplemented { instruction, class }
}

#[cfg(test)]
impl Arm11 {
    /// 16 KiB core in Supervisor mode with PC at 0.
    pub(crate) fn for_tests() -> Self {
        Self::with_config(CoreConfig {
            memory_size: 0x4000,
            ..CoreConfig::default()
        })
    }

    /// Stores `words` from address 0 onwards.
    pub(crate) fn load_program(&mut self, words: &[u32]) {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.memory.load(0, &bytes).unwrap();
    }

    /// Executes `op_code` as if it had been fetched from `address`.
    pub(crate) fn execute_at(&mut self, address: u32, op_code: u32) -> CoreResult<()> {
        self.registers.set_pc(address.wrapping_add(4));
        self.execute_arm(op_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::register_set::REG_LR;
    use pretty_assertions::assert_eq;

    #[test]
    fn reset_state() {
        let cpu = Arm11::for_tests();
        let cpsr = cpu.registers().cpsr();
        assert_eq!(cpu.registers().mode(), Mode::Supervisor);
        assert!(cpsr.irq_disable());
        assert!(cpsr.fiq_disable());
        assert!(cpsr.abort_disable());
        assert_eq!(cpu.execution_state(), ExecutionState::Arm);
        assert_eq!(cpu.registers().pc(), 0);
        assert_eq!(cpu.retired(), 0);
    }

    #[test]
    fn reset_pc_override() {
        let cpu = Arm11::with_config(CoreConfig {
            memory_size: 0x100,
            high_vectors: true,
            reset_pc: Some(0x80),
        });
        assert_eq!(cpu.registers().pc(), 0x80);

        let cpu = Arm11::with_config(CoreConfig {
            memory_size: 0x100,
            high_vectors: true,
            reset_pc: None,
        });
        assert_eq!(cpu.registers().pc(), 0xFFFF_0000);
    }

    #[test]
    fn step_runs_a_small_program() {
        let mut cpu = Arm11::for_tests();
        cpu.load_program(&[
            0xE3A0_0005, // MOV R0, #5
            0xE3A0_1000, // MOV R1, #0
            0xE081_1000, // loop: ADD R1, R1, R0
            0xE250_0001, // SUBS R0, R0, #1
            0x1AFF_FFFC, // BNE loop
            0xEAFF_FFFE, // B .
        ]);

        let executed = cpu.run(100).unwrap();
        assert_eq!(cpu.registers().read(1), 15);
        assert_eq!(cpu.registers().read(0), 0);
        assert!(cpu.registers().cpsr().zero_flag());
        assert_eq!(cpu.registers().pc(), 0x14);
        // 2 setup + 5 * 3 loop + the final branch.
        assert_eq!(executed, 18);
        assert_eq!(cpu.retired(), 18);
    }

    #[test]
    fn condition_failed_instruction_still_advances() {
        let mut cpu = Arm11::for_tests();
        cpu.load_program(&[0x03A0_0001]); // MOVEQ R0, #1
        cpu.step().unwrap();
        assert_eq!(cpu.registers().read(0), 0);
        assert_eq!(cpu.registers().pc(), 4);
        assert_eq!(cpu.retired(), 1);
    }

    #[test]
    fn run_stops_at_max_steps() {
        let mut cpu = Arm11::for_tests();
        // Zeroed memory decodes as ANDEQ R0, R0, R0.
        assert_eq!(cpu.run(7).unwrap(), 7);
        assert_eq!(cpu.registers().pc(), 28);
    }

    #[test]
    fn errors_stop_the_loop() {
        let mut cpu = Arm11::for_tests();
        cpu.load_program(&[0xE3A0_0001, 0xE300_0000]);
        assert_eq!(
            cpu.run(10),
            Err(CoreError::Undefined {
                instruction: 0xE300_0000
            })
        );
        assert_eq!(cpu.retired(), 1);

        let mut cpu = Arm11::for_tests();
        cpu.load_program(&[0xEE01_0F10]);
        assert_eq!(
            cpu.step(),
            Err(CoreError::Unimplemented {
                instruction: 0xEE01_0F10,
                class: "coprocessor"
            })
        );
    }

    #[test]
    fn fetch_outside_memory() {
        let mut cpu = Arm11::for_tests();
        cpu.registers_mut().set_pc(0x4000);
        assert!(matches!(cpu.step(), Err(CoreError::OutOfBounds { .. })));
    }

    #[test]
    fn thumb_fetch_is_halfword_and_unsupported() {
        let mut cpu = Arm11::for_tests();
        cpu.memory_mut().load(0x100, &[0x01, 0x20]).unwrap();
        cpu.interwork(0x101);
        assert_eq!(cpu.registers().pc(), 0x100);
        assert_eq!(
            cpu.step(),
            Err(CoreError::ThumbUnsupported {
                instruction: 0x2001
            })
        );
        assert_eq!(cpu.registers().pc(), 0x102);
        assert_eq!(cpu.retired(), 0);
    }

    #[test]
    fn misaligned_pc_is_aligned_before_fetch() {
        let mut cpu = Arm11::for_tests();
        cpu.load_program(&[0xE3A0_0007]);
        cpu.registers_mut().set_pc(3);
        cpu.step().unwrap();
        assert_eq!(cpu.registers().read(0), 7);
        assert_eq!(cpu.registers().pc(), 4);
    }

    #[test]
    fn swi_through_step() {
        let mut cpu = Arm11::for_tests();
        cpu.load_program(&[0xE3A0_0000, 0xE3A0_0000, 0xE3A0_0000, 0xEF00_0042]);
        cpu.registers_mut().set_pc(0x0C);
        cpu.step().unwrap();
        assert_eq!(cpu.registers().pc(), 0x08);
        assert_eq!(cpu.registers().read(REG_LR), 0x10);
        assert_eq!(cpu.registers().mode(), Mode::Supervisor);
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut cpu = Arm11::for_tests();
        cpu.registers_mut().write(3, 0xDEAD_BEEF);
        let snapshot = cpu.snapshot();
        assert_eq!(snapshot.registers[3], 0xDEAD_BEEF);
        assert_eq!(snapshot.mode, Mode::Supervisor);
        assert_eq!(snapshot.spsr, Some(0));
        assert_eq!(snapshot.cpsr, 0x0000_01D3);
        assert_eq!(snapshot.execution_state, ExecutionState::Arm);

        cpu.registers_mut().switch_mode(Mode::System);
        assert_eq!(cpu.snapshot().spsr, None);
    }
}
