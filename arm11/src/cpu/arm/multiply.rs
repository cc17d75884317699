//! Multiplies. None of them touch C or V.

use crate::bitwise::Bits;
use crate::cpu::arm::instructions::SignedMultiplyOp;
use crate::cpu::arm11::Arm11;
use crate::memory::MemoryDevice;

/// Signed bottom (`false`) or top (`true`) halfword of `value`.
fn halfword(value: u32, top: bool) -> i32 {
    let half = if top { value >> 16 } else { value & 0xFFFF };
    half.sign_extended(16).cast_signed()
}

#[allow(clippy::cast_possible_truncation)]
const fn split(value: u64) -> (u32, u32) {
    ((value >> 32) as u32, value as u32)
}

impl<M: MemoryDevice> Arm11<M> {
    fn read_pair(&self, rd_hi: usize, rd_lo: usize) -> u64 {
        (u64::from(self.registers.read(rd_hi)) << 32) | u64::from(self.registers.read(rd_lo))
    }

    fn write_pair(&mut self, rd_hi: usize, rd_lo: usize, value: u64) {
        let (high, low) = split(value);
        self.registers.write(rd_lo, low);
        self.registers.write(rd_hi, high);
    }

    /// `MUL` / `MLA`
    pub(crate) fn multiply(
        &mut self,
        accumulate: bool,
        set_conditions: bool,
        rd: usize,
        rn: usize,
        rs: usize,
        rm: usize,
    ) {
        let mut result = self.registers.read(rm).wrapping_mul(self.registers.read(rs));
        if accumulate {
            result = result.wrapping_add(self.registers.read(rn));
        }
        self.registers.write(rd, result);

        if set_conditions {
            self.registers.cpsr_mut().set_nz(result);
        }
    }

    /// `UMULL` / `UMLAL` / `SMULL` / `SMLAL`
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn multiply_long(
        &mut self,
        signed: bool,
        accumulate: bool,
        set_conditions: bool,
        rd_hi: usize,
        rd_lo: usize,
        rs: usize,
        rm: usize,
    ) {
        let (m, s) = (self.registers.read(rm), self.registers.read(rs));
        let product = if signed {
            (i64::from(m.cast_signed()) * i64::from(s.cast_signed())).cast_unsigned()
        } else {
            u64::from(m) * u64::from(s)
        };
        let result = if accumulate {
            product.wrapping_add(self.read_pair(rd_hi, rd_lo))
        } else {
            product
        };
        self.write_pair(rd_hi, rd_lo, result);

        if set_conditions {
            let cpsr = self.registers.cpsr_mut();
            cpsr.set_sign_flag(result.get_bit(63));
            cpsr.set_zero_flag(result == 0);
        }
    }

    /// `UMAAL`: RdHi:RdLo = Rm * Rs + RdHi + RdLo, which cannot overflow.
    pub(crate) fn multiply_double_accumulate(
        &mut self,
        rd_hi: usize,
        rd_lo: usize,
        rs: usize,
        rm: usize,
    ) {
        let result = u64::from(self.registers.read(rm)) * u64::from(self.registers.read(rs))
            + u64::from(self.registers.read(rd_hi))
            + u64::from(self.registers.read(rd_lo));
        self.write_pair(rd_hi, rd_lo, result);
    }

    /// The 16-bit signed multiplies. Accumulating 32-bit forms set Q when the
    /// addition overflows; `SMLAL<x><y>` wraps silently.
    #[allow(clippy::too_many_arguments, clippy::cast_possible_truncation)]
    pub(crate) fn signed_multiply_halfword(
        &mut self,
        op: SignedMultiplyOp,
        x_top: bool,
        y_top: bool,
        rd: usize,
        rn: usize,
        rs: usize,
        rm: usize,
    ) {
        let (m, s) = (self.registers.read(rm), self.registers.read(rs));
        let accumulator = self.registers.read(rn).cast_signed();

        let (result, overflow) = match op {
            SignedMultiplyOp::Smul => (halfword(m, x_top) * halfword(s, y_top), false),
            SignedMultiplyOp::Smla => {
                (halfword(m, x_top) * halfword(s, y_top)).overflowing_add(accumulator)
            }
            SignedMultiplyOp::Smulw => (
                ((i64::from(m.cast_signed()) * i64::from(halfword(s, y_top))) >> 16) as i32,
                false,
            ),
            SignedMultiplyOp::Smlaw => {
                let product = (i64::from(m.cast_signed()) * i64::from(halfword(s, y_top))) >> 16;
                (product as i32).overflowing_add(accumulator)
            }
            SignedMultiplyOp::Smlal => {
                // Rd holds RdHi and Rn holds RdLo.
                let product = i64::from(halfword(m, x_top) * halfword(s, y_top));
                let sum = self.read_pair(rd, rn).wrapping_add(product.cast_unsigned());
                self.write_pair(rd, rn, sum);
                return;
            }
        };

        self.registers.write(rd, result.cast_unsigned());
        if overflow {
            self.registers.cpsr_mut().set_sticky_overflow(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::arm11::Arm11;
    use pretty_assertions::assert_eq;

    #[test]
    fn check_mul_and_mla() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(1, 6);
        cpu.registers.write(2, 7);
        // MUL R0, R1, R2
        cpu.execute_at(0x0, 0xE000_0291).unwrap();
        assert_eq!(cpu.registers.read(0), 42);

        cpu.registers.cpsr_mut().set_carry_flag(true);
        cpu.registers.write(4, (-42_i32).cast_unsigned());
        // MLAS R3, R1, R2, R4
        cpu.execute_at(0x0, 0xE033_4291).unwrap();
        assert_eq!(cpu.registers.read(3), 0);
        let cpsr = cpu.registers.cpsr();
        assert!(cpsr.zero_flag());
        assert!(!cpsr.sign_flag());
        assert!(cpsr.carry_flag());
    }

    #[test]
    fn check_long_multiplies() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(2, 0xFFFF_FFFF);
        cpu.registers.write(3, 2);
        // UMULL R0, R1, R2, R3
        cpu.execute_at(0x0, 0xE081_0392).unwrap();
        assert_eq!((cpu.registers.read(1), cpu.registers.read(0)), (1, 0xFFFF_FFFE));

        // SMULL R0, R1, R2, R3: -1 * 2
        cpu.execute_at(0x0, 0xE0C1_0392).unwrap();
        assert_eq!(
            (cpu.registers.read(1), cpu.registers.read(0)),
            (0xFFFF_FFFF, 0xFFFF_FFFE)
        );

        // UMLAL R0, R1, R2, R3 adds to the previous result.
        cpu.registers.write(0, 2);
        cpu.registers.write(1, 0);
        cpu.execute_at(0x0, 0xE0A1_0392).unwrap();
        assert_eq!((cpu.registers.read(1), cpu.registers.read(0)), (2, 0));

        // SMULLS sets N from bit 63.
        cpu.execute_at(0x0, 0xE0D1_0392).unwrap();
        assert!(cpu.registers.cpsr().sign_flag());
        assert!(!cpu.registers.cpsr().zero_flag());
    }

    #[test]
    fn check_umaal() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(0, 0xFFFF_FFFF);
        cpu.registers.write(1, 0xFFFF_FFFF);
        cpu.registers.write(2, 0xFFFF_FFFF);
        cpu.registers.write(3, 0xFFFF_FFFF);
        // UMAAL R0, R1, R2, R3
        cpu.execute_at(0x0, 0xE041_0392).unwrap();
        assert_eq!(
            (cpu.registers.read(1), cpu.registers.read(0)),
            (0xFFFF_FFFF, 0xFFFF_FFFF)
        );
    }

    #[test]
    fn check_halfword_multiplies() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(1, 0xFFFE_0003);
        cpu.registers.write(2, 0x0004_FFFB);

        // SMULBB R0, R1, R2: 3 * -5
        cpu.execute_at(0x0, 0xE160_0281).unwrap();
        assert_eq!(cpu.registers.read(0), (-15_i32).cast_unsigned());

        // SMULTT R0, R1, R2: -2 * 4
        cpu.execute_at(0x0, 0xE160_02E1).unwrap();
        assert_eq!(cpu.registers.read(0), (-8_i32).cast_unsigned());

        // SMULWB R0, R1, R2: (0xFFFE0003 * -5) >> 16
        cpu.execute_at(0x0, 0xE120_02A1).unwrap();
        assert_eq!(cpu.registers.read(0), 9);
    }

    #[test]
    fn smla_sets_q_on_overflow() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(1, 0x7FFF);
        cpu.registers.write(2, 0x7FFF);
        cpu.registers.write(3, 0x7FFF_FFFF);
        // SMLABB R0, R1, R2, R3
        cpu.execute_at(0x0, 0xE100_3281).unwrap();
        assert_eq!(cpu.registers.read(0), 0x7FFF_FFFF_u32.wrapping_add(0x3FFF_0001));
        assert!(cpu.registers.cpsr().sticky_overflow());
    }

    #[test]
    fn smlal_accumulates_64_bits() {
        let mut cpu = Arm11::for_tests();
        cpu.registers.write(0, 0xFFFF_FFFF);
        cpu.registers.write(1, 0);
        cpu.registers.write(2, 2);
        cpu.registers.write(3, 3);
        // SMLALBB R0, R1, R2, R3
        cpu.execute_at(0x0, 0xE141_0382).unwrap();
        assert_eq!((cpu.registers.read(1), cpu.registers.read(0)), (1, 5));
        assert!(!cpu.registers.cpsr().sticky_overflow());
    }
}
