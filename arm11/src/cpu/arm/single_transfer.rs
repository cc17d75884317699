use crate::bitwise::Bits;
use crate::cpu::alu::shift_by_immediate;
use crate::cpu::arm::instructions::{
    HalfwordDataTransferOffset, HalfwordTransferKind, SingleDataTransferOffset,
};
use crate::cpu::arm11::Arm11;
use crate::cpu::flags::{Indexing, LoadStoreKind, Offsetting, ReadWriteKind};
use crate::cpu::register_set::REG_PROGRAM_COUNTER;
use crate::error::CoreResult;
use crate::memory::MemoryDevice;

/// Transfer address and the value written back to the base register.
const fn indexed_address(
    base: u32,
    indexing: Indexing,
    offsetting: Offsetting,
    offset: u32,
) -> (u32, u32) {
    let moved = offsetting.apply(base, offset);
    match indexing {
        Indexing::Pre => (moved, moved),
        Indexing::Post => (base, moved),
    }
}

impl<M: MemoryDevice> Arm11<M> {
    /// Word load with the ARMv6 legacy unaligned behaviour: the aligned word
    /// is rotated so the addressed byte ends up in the low byte.
    fn read_rotated_word(&self, address: u32) -> CoreResult<u32> {
        let word = self.memory.read_word(address & !3)?;
        Ok(word.rotate_right(8 * (address & 3)))
    }

    /// `LDR`, `STR`, `LDRB`, `STRB` (and their `T` forms).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn single_data_transfer(
        &mut self,
        load_store: LoadStoreKind,
        indexing: Indexing,
        offsetting: Offsetting,
        width: ReadWriteKind,
        write_back: bool,
        rn: usize,
        rd: usize,
        offset: SingleDataTransferOffset,
    ) -> CoreResult<()> {
        let offset = match offset {
            SingleDataTransferOffset::Immediate(value) => value,
            SingleDataTransferOffset::Register { rm, kind, amount } => {
                let carry = self.registers.cpsr().carry_flag();
                shift_by_immediate(kind, self.registers.read(rm), amount, carry).value
            }
        };
        let (address, written_back) =
            indexed_address(self.operand(rn), indexing, offsetting, offset);
        let writes_back = indexing == Indexing::Post || write_back;

        match load_store {
            LoadStoreKind::Store => {
                let value = self.operand(rd);
                match width {
                    ReadWriteKind::Word => self.memory.write_word(address & !3, value)?,
                    ReadWriteKind::Byte => self.memory.write_byte(address, value.get_byte(0))?,
                }
                if writes_back {
                    self.registers.write(rn, written_back);
                }
            }
            LoadStoreKind::Load => {
                let value = match width {
                    ReadWriteKind::Word => self.read_rotated_word(address)?,
                    ReadWriteKind::Byte => u32::from(self.memory.read_byte(address)?),
                };
                if writes_back {
                    self.registers.write(rn, written_back);
                }
                if rd == REG_PROGRAM_COUNTER {
                    self.interwork(value);
                } else {
                    self.registers.write(rd, value);
                }
            }
        }

        Ok(())
    }

    /// `LDRH`, `STRH`, `LDRSB`, `LDRSH`, `LDRD`, `STRD`.
    #[allow(clippy::too_many_arguments, clippy::cast_possible_truncation)]
    pub(crate) fn halfword_data_transfer(
        &mut self,
        load_store: LoadStoreKind,
        indexing: Indexing,
        offsetting: Offsetting,
        write_back: bool,
        kind: HalfwordTransferKind,
        rn: usize,
        rd: usize,
        offset: HalfwordDataTransferOffset,
    ) -> CoreResult<()> {
        let offset = match offset {
            HalfwordDataTransferOffset::Immediate(value) => value,
            HalfwordDataTransferOffset::Register(rm) => self.registers.read(rm),
        };
        let (address, written_back) =
            indexed_address(self.operand(rn), indexing, offsetting, offset);
        let writes_back = indexing == Indexing::Post || write_back;

        match (load_store, kind) {
            (LoadStoreKind::Store, HalfwordTransferKind::Doubleword) => {
                let (low, high) = (self.operand(rd), self.operand(rd + 1));
                self.memory.write_word(address, low)?;
                self.memory.write_word(address.wrapping_add(4), high)?;
            }
            (LoadStoreKind::Store, _) => {
                let value = self.operand(rd) as u16;
                self.memory.write_half_word(address & !1, value)?;
            }
            (LoadStoreKind::Load, HalfwordTransferKind::Doubleword) => {
                let low = self.memory.read_word(address)?;
                let high = self.memory.read_word(address.wrapping_add(4))?;
                if writes_back {
                    self.registers.write(rn, written_back);
                }
                self.registers.write(rd, low);
                self.registers.write(rd + 1, high);
                return Ok(());
            }
            (LoadStoreKind::Load, _) => {
                let value = match kind {
                    HalfwordTransferKind::SignedByte => {
                        u32::from(self.memory.read_byte(address)?).sign_extended(8)
                    }
                    HalfwordTransferKind::SignedHalfword => {
                        u32::from(self.memory.read_half_word(address & !1)?).sign_extended(16)
                    }
                    _ => u32::from(self.memory.read_half_word(address & !1)?),
                };
                if writes_back {
                    self.registers.write(rn, written_back);
                }
                self.registers.write(rd, value);
                return Ok(());
            }
        }

        if writes_back {
            self.registers.write(rn, written_back);
        }
        Ok(())
    }

    /// `SWP` / `SWPB`.
    pub(crate) fn single_data_swap(
        &mut self,
        width: ReadWriteKind,
        rn: usize,
        rd: usize,
        rm: usize,
    ) -> CoreResult<()> {
        let address = self.registers.read(rn);
        let source = self.registers.read(rm);

        let loaded = match width {
            ReadWriteKind::Word => {
                let loaded = self.read_rotated_word(address)?;
                self.memory.write_word(address & !3, source)?;
                loaded
            }
            ReadWriteKind::Byte => {
                let loaded = self.memory.read_byte(address)?;
                self.memory.write_byte(address, source.get_byte(0))?;
                u32::from(loaded)
            }
        };
        self.registers.write(rd, loaded);
        Ok(())
    }
}
