//! # Conditional execution
//!
//! Bits 31-28 of every ARM instruction select a condition tested against the
//! N, Z, C and V flags of the CPSR before the instruction does anything.
//!
//! ```text
//! ┌──────┬────────┬──────────────────────────┬─────────────────────┐
//! │ Code │ Suffix │ Meaning                  │ Flags tested        │
//! ├──────┼────────┼──────────────────────────┼─────────────────────┤
//! │ 0000 │   EQ   │ Equal                    │ Z=1                 │
//! │ 0001 │   NE   │ Not equal                │ Z=0                 │
//! │ 0010 │  CS/HS │ Unsigned higher or same  │ C=1                 │
//! │ 0011 │  CC/LO │ Unsigned lower           │ C=0                 │
//! │ 0100 │   MI   │ Negative                 │ N=1                 │
//! │ 0101 │   PL   │ Positive or zero         │ N=0                 │
//! │ 0110 │   VS   │ Overflow                 │ V=1                 │
//! │ 0111 │   VC   │ No overflow              │ V=0                 │
//! │ 1000 │   HI   │ Unsigned higher          │ C=1 AND Z=0         │
//! │ 1001 │   LS   │ Unsigned lower or same   │ C=0 OR Z=1          │
//! │ 1010 │   GE   │ Signed >=                │ N=V                 │
//! │ 1011 │   LT   │ Signed <                 │ N≠V                 │
//! │ 1100 │   GT   │ Signed >                 │ Z=0 AND N=V         │
//! │ 1101 │   LE   │ Signed <=                │ Z=1 OR N≠V          │
//! │ 1110 │   AL   │ Always                   │ -                   │
//! │ 1111 │   NV   │ Unconditional space      │ -                   │
//! └──────┴────────┴──────────────────────────┴─────────────────────┘
//! ```
//!
//! On ARMv5 and later `1111` no longer means "never": it marks a separate
//! group of instructions (`BLX #imm`, `CPS`, `SRS`, `RFE`, `PLD`, ...) that
//! always execute. [`Condition::is_satisfied`] therefore returns `true` for
//! [`Condition::NV`] and the decoder routes those words elsewhere.

use serde::{Deserialize, Serialize};

use crate::cpu::psr::Psr;

#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum Condition {
    EQ = 0x0,
    NE = 0x1,
    /// Also known as HS.
    CS = 0x2,
    /// Also known as LO.
    CC = 0x3,
    MI = 0x4,
    PL = 0x5,
    VS = 0x6,
    VC = 0x7,
    HI = 0x8,
    LS = 0x9,
    GE = 0xA,
    LT = 0xB,
    GT = 0xC,
    LE = 0xD,
    AL = 0xE,
    /// Selects the unconditional instruction space.
    NV = 0xF,
}

impl Condition {
    /// Condition field of an ARM instruction word.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn of(instruction: u32) -> Self {
        Self::from((instruction >> 28) as u8)
    }

    /// Whether an instruction guarded by this condition runs given the flags in `psr`.
    #[must_use]
    pub fn is_satisfied(self, psr: Psr) -> bool {
        let (n, z, c, v) = (
            psr.sign_flag(),
            psr.zero_flag(),
            psr.carry_flag(),
            psr.overflow_flag(),
        );
        match self {
            Self::EQ => z,
            Self::NE => !z,
            Self::CS => c,
            Self::CC => !c,
            Self::MI => n,
            Self::PL => !n,
            Self::VS => v,
            Self::VC => !v,
            Self::HI => c && !z,
            Self::LS => !c || z,
            Self::GE => n == v,
            Self::LT => n != v,
            Self::GT => !z && n == v,
            Self::LE => z || n != v,
            Self::AL | Self::NV => true,
        }
    }
}

impl From<u8> for Condition {
    fn from(item: u8) -> Self {
        match item & 0xF {
            0x0 => Self::EQ,
            0x1 => Self::NE,
            0x2 => Self::CS,
            0x3 => Self::CC,
            0x4 => Self::MI,
            0x5 => Self::PL,
            0x6 => Self::VS,
            0x7 => Self::VC,
            0x8 => Self::HI,
            0x9 => Self::LS,
            0xA => Self::GE,
            0xB => Self::LT,
            0xC => Self::GT,
            0xD => Self::LE,
            0xE => Self::AL,
            _ => Self::NV,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AL => Ok(()),
            Self::NV => f.write_str("NV"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn flags(nzcv: u8) -> Psr {
        let mut psr = Psr::default();
        psr.set_sign_flag(nzcv & 0b1000 != 0);
        psr.set_zero_flag(nzcv & 0b0100 != 0);
        psr.set_carry_flag(nzcv & 0b0010 != 0);
        psr.set_overflow_flag(nzcv & 0b0001 != 0);
        psr
    }

    /// Reference truth table, indexed by raw condition code and NZCV nibble.
    fn expected(code: u8, nzcv: u8) -> bool {
        let n = nzcv & 0b1000 != 0;
        let z = nzcv & 0b0100 != 0;
        let c = nzcv & 0b0010 != 0;
        let v = nzcv & 0b0001 != 0;
        match code {
            0x0 => z,
            0x1 => !z,
            0x2 => c,
            0x3 => !c,
            0x4 => n,
            0x5 => !n,
            0x6 => v,
            0x7 => !v,
            0x8 => c && !z,
            0x9 => !c || z,
            0xA => n == v,
            0xB => n != v,
            0xC => !z && (n == v),
            0xD => z || (n != v),
            _ => true,
        }
    }

    #[test]
    fn full_truth_table() {
        for code in 0..16_u8 {
            for nzcv in 0..16_u8 {
                assert_eq!(
                    Condition::from(code).is_satisfied(flags(nzcv)),
                    expected(code, nzcv),
                    "condition {code:#X} with NZCV={nzcv:04b}"
                );
            }
        }
    }

    #[test]
    fn spot_checks() {
        // Z=1, N=0, V=0
        let equal = flags(0b0100);
        assert!(Condition::EQ.is_satisfied(equal));
        assert!(Condition::LE.is_satisfied(equal));
        assert!(!Condition::GT.is_satisfied(equal));

        // C=1, Z=0
        let higher = flags(0b0010);
        assert!(Condition::HI.is_satisfied(higher));
        assert!(!Condition::LS.is_satisfied(higher));

        // N=1, V=0
        let negative = flags(0b1000);
        assert!(Condition::LT.is_satisfied(negative));
        assert!(!Condition::GE.is_satisfied(negative));

        for nzcv in 0..16 {
            assert!(Condition::AL.is_satisfied(flags(nzcv)));
            assert!(Condition::NV.is_satisfied(flags(nzcv)));
        }
    }

    #[test]
    fn condition_from_instruction() {
        assert_eq!(Condition::of(0xE1A0_0000), Condition::AL);
        assert_eq!(Condition::of(0x0A00_0000), Condition::EQ);
        assert_eq!(Condition::of(0xFA00_0000), Condition::NV);
    }

    #[test]
    fn display() {
        assert_eq!(Condition::AL.to_string(), "");
        assert_eq!(Condition::GE.to_string(), "GE");
    }
}
