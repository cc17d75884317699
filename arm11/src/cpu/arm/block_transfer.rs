//! `LDM`/`STM`, plus the two-word addressing shared with `SRS`/`RFE`.

use crate::bitwise::Bits;
use crate::cpu::arm11::Arm11;
use crate::cpu::cpu_modes::Mode;
use crate::cpu::flags::{Indexing, LoadStoreKind, Offsetting};
use crate::cpu::register_set::REG_PROGRAM_COUNTER;
use crate::error::CoreResult;
use crate::memory::MemoryDevice;

/// Lowest address touched by a block transfer of `size` bytes from `base`.
///
/// Registers always go to ascending addresses, so a decrementing transfer
/// starts `size` bytes below the base.
pub(crate) const fn block_start_address(
    base: u32,
    indexing: Indexing,
    offsetting: Offsetting,
    size: u32,
) -> u32 {
    match (offsetting, indexing) {
        (Offsetting::Up, Indexing::Post) => base,
        (Offsetting::Up, Indexing::Pre) => base.wrapping_add(4),
        (Offsetting::Down, Indexing::Post) => base.wrapping_sub(size).wrapping_add(4),
        (Offsetting::Down, Indexing::Pre) => base.wrapping_sub(size),
    }
}

impl<M: MemoryDevice> Arm11<M> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn block_data_transfer(
        &mut self,
        load_store: LoadStoreKind,
        indexing: Indexing,
        offsetting: Offsetting,
        load_psr: bool,
        write_back: bool,
        rn: usize,
        register_list: u16,
    ) -> CoreResult<()> {
        let base = self.registers.read(rn);
        let size = register_list.count_ones() * 4;
        let start = block_start_address(base, indexing, offsetting, size) & !3;

        let loads_pc = load_store == LoadStoreKind::Load && register_list.get_bit(15);
        if loads_pc && load_psr {
            self.registers.spsr()?;
        }
        // S without PC in a load (or in any store) moves User registers.
        let user_bank = load_psr && !loads_pc;

        let mode = self.registers.mode();
        if user_bank {
            self.registers.switch_mode(Mode::User);
        }
        let transferred = self.transfer_registers(load_store, start, register_list);
        if user_bank {
            self.registers.switch_mode(mode);
        }
        transferred?;

        let loads_base = load_store == LoadStoreKind::Load && register_list.get_bit(rn as u8);
        if write_back && !loads_base {
            self.registers.write(rn, offsetting.apply(base, size));
        }

        if loads_pc {
            self.interwork(self.registers.pc());
            if load_psr {
                self.registers.restore_cpsr_from_spsr()?;
            }
        }

        Ok(())
    }

    /// Moves the listed registers from/to consecutive words at `address`,
    /// lowest register first.
    fn transfer_registers(
        &mut self,
        load_store: LoadStoreKind,
        mut address: u32,
        register_list: u16,
    ) -> CoreResult<()> {
        for index in (0..=REG_PROGRAM_COUNTER as u8).filter(|&r| register_list.get_bit(r)) {
            let index = usize::from(index);
            match load_store {
                LoadStoreKind::Store => {
                    let value = self.operand(index);
                    self.memory.write_word(address, value)?;
                }
                LoadStoreKind::Load => {
                    let value = self.memory.read_word(address)?;
                    self.registers.write(index, value);
                }
            }
            address = address.wrapping_add(4);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::arm11::Arm11;
    use crate::cpu::cpu_modes::Mode;
    use crate::cpu::psr::{ExecutionState, Psr};
    use crate::cpu::register_set::REG_SP;
    use crate::error::CoreError;
    use crate::memory::MemoryDevice;
    use pretty_assertions::assert_eq;

    fn word(cpu: &Arm11, address: u32) -> u32 {
        cpu.memory.read_word(address).unwrap()
    }

    #[test]
    fn stm_ascending_order() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(0, 0xA0);
        cpu.registers.write(3, 0xA3);
        cpu.registers.write(5, 0xA5);
        cpu.registers.write(1, 0x100);
        // STMIA R1, {R0, R3, R5}
        cpu.execute_at(0x0, 0xE881_0029).unwrap();
        assert_eq!(word(&cpu, 0x100), 0xA0);
        assert_eq!(word(&cpu, 0x104), 0xA3);
        assert_eq!(word(&cpu, 0x108), 0xA5);
        assert_eq!(cpu.registers.read(1), 0x100);
    }

    #[test]
    fn stmdb_push_with_writeback() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(0, 0xA0);
        cpu.registers.write(3, 0xA3);
        cpu.registers.write(5, 0xA5);
        cpu.registers.write(REG_SP, 0x200);
        // STMDB SP!, {R0, R3, R5}
        cpu.execute_at(0x0, 0xE92D_0029).unwrap();
        assert_eq!(word(&cpu, 0x1F4), 0xA0);
        assert_eq!(word(&cpu, 0x1F8), 0xA3);
        assert_eq!(word(&cpu, 0x1FC), 0xA5);
        assert_eq!(cpu.registers.read(REG_SP), 0x1F4);
    }

    #[test]
    fn addressing_modes_start_addresses() {
        let mut cpu = Arm11::for_tests();
        for (address, value) in [(0x100, 1), (0x104, 2), (0x108, 3), (0x10C, 4)] {
            cpu.memory.write_word(address, value).unwrap();
        }

        // LDMIB R0, {R1, R2}
        cpu.registers.write(0, 0x100);
        cpu.execute_at(0x0, 0xE990_0006).unwrap();
        assert_eq!((cpu.registers.read(1), cpu.registers.read(2)), (2, 3));

        // LDMDA R0, {R1, R2}
        cpu.registers.write(0, 0x108);
        cpu.execute_at(0x0, 0xE810_0006).unwrap();
        assert_eq!((cpu.registers.read(1), cpu.registers.read(2)), (2, 3));

        // LDMDB R0!, {R1, R2}
        cpu.registers.write(0, 0x110);
        cpu.execute_at(0x0, 0xE930_0006).unwrap();
        assert_eq!((cpu.registers.read(1), cpu.registers.read(2)), (3, 4));
        assert_eq!(cpu.registers.read(0), 0x108);

        // LDMIA R0!, {R1, R2}
        cpu.registers.write(0, 0x100);
        cpu.execute_at(0x0, 0xE8B0_0006).unwrap();
        assert_eq!((cpu.registers.read(1), cpu.registers.read(2)), (1, 2));
        assert_eq!(cpu.registers.read(0), 0x108);
    }

    #[test]
    fn loaded_base_wins_over_writeback() {
        let mut cpu = Arm11::for_tests();
        cpu.memory.write_word(0x100, 0x1234).unwrap();
        cpu.memory.write_word(0x104, 0x5678).unwrap();
        cpu.registers.write(0, 0x100);
        // LDMIA R0!, {R0, R1}
        cpu.execute_at(0x0, 0xE8B0_0003).unwrap();
        assert_eq!(cpu.registers.read(0), 0x1234);
        assert_eq!(cpu.registers.read(1), 0x5678);
    }

    #[test]
    fn stm_of_pc_stores_instruction_plus_eight() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(0, 0x200);
        // STMIA R0, {PC} at 0x100
        cpu.execute_at(0x100, 0xE880_8000).unwrap();
        assert_eq!(word(&cpu, 0x200), 0x108);
    }

    #[test]
    fn ldm_pc_interworks() {
        let mut cpu = Arm11::for_tests();
        cpu.memory.write_word(0x1F8, 0x44).unwrap();
        cpu.memory.write_word(0x1FC, 0x301).unwrap();
        cpu.registers.write(REG_SP, 0x1F8);
        // LDMIA SP!, {R4, PC}
        cpu.execute_at(0x0, 0xE8BD_8010).unwrap();
        assert_eq!(cpu.registers.read(4), 0x44);
        assert_eq!(cpu.registers.pc(), 0x300);
        assert_eq!(cpu.execution_state(), ExecutionState::Thumb);
        assert_eq!(cpu.registers.read(REG_SP), 0x200);
    }

    #[test]
    fn ldm_pc_with_s_restores_cpsr() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.set_spsr(Psr::from(Mode::User)).unwrap();
        cpu.memory.write_word(0x100, 0x400).unwrap();
        cpu.registers.write(0, 0x100);
        // LDMIA R0, {PC}^
        cpu.execute_at(0x0, 0xE8D0_8000).unwrap();
        assert_eq!(cpu.registers.pc(), 0x400);
        assert_eq!(cpu.registers.mode(), Mode::User);
    }

    #[test]
    fn ldm_pc_with_s_without_spsr_changes_nothing() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.switch_mode(Mode::System);
        cpu.memory.write_word(0x100, 0x400).unwrap();
        cpu.registers.write(0, 0x100);
        // LDMIA R0!, {R1, PC}^
        assert_eq!(
            cpu.execute_at(0x0, 0xE8F0_8002),
            Err(CoreError::NoSpsr { mode: Mode::System })
        );
        assert_eq!(cpu.registers.pc(), 0x4);
        assert_eq!(cpu.registers.read(0), 0x100);
        assert_eq!(cpu.registers.read(1), 0);
    }

    #[test]
    fn stm_with_s_uses_user_registers() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.switch_mode(Mode::User);
        cpu.registers.write(REG_SP, 0x2222);
        cpu.registers.switch_mode(Mode::Irq);
        cpu.registers.write(REG_SP, 0x1111);
        cpu.registers.write(0, 0x100);

        // STMIA R0, {SP}^
        cpu.execute_at(0x0, 0xE8C0_2000).unwrap();
        assert_eq!(word(&cpu, 0x100), 0x2222);
        assert_eq!(cpu.registers.mode(), Mode::Irq);
        assert_eq!(cpu.registers.read(REG_SP), 0x1111);

        // LDMIA R0, {SP}^ writes the User copy.
        cpu.memory.write_word(0x100, 0x3333).unwrap();
        cpu.execute_at(0x0, 0xE8D0_2000).unwrap();
        assert_eq!(cpu.registers.read(REG_SP), 0x1111);
        cpu.registers.switch_mode(Mode::User);
        assert_eq!(cpu.registers.read(REG_SP), 0x3333);
    }

    #[test]
    fn fault_leaves_mode_intact() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(0, 0x3FFC);
        // STMIA R0, {R1, R2}^ runs off the end of memory.
        assert!(cpu.execute_at(0x0, 0xE8C0_0006).is_err());
        assert_eq!(cpu.registers.mode(), Mode::Supervisor);
    }
}
