//! # Shifter and adder
//!
//! Pure helpers shared by every executor that needs a barrel-shifted operand
//! or a flag-producing addition. Nothing here touches the register set.
//!
//! ## Shifter carry-out
//!
//! ```text
//!            amount == 0     1..=31            32            > 32
//! LSL        C unchanged     bit[32-n]         bit[0]        0
//! LSR        C unchanged     bit[n-1]          bit[31]       0
//! ASR        C unchanged     bit[n-1]          bit[31]       bit[31]
//! ROR        C unchanged     bit[n-1]          bit[31]       as (n & 31)
//! ```
//!
//! Immediate shift amounts are 5 bits wide, so `LSR #0`, `ASR #0` and `ROR #0`
//! are re-purposed as `LSR #32`, `ASR #32` and `RRX`.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

/// How an operation wants a single flag updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagResult {
    Set,
    Unset,
    /// Leave the flag as it is.
    Pass,
}

impl FlagResult {
    #[must_use]
    pub const fn resolve(self, current: bool) -> bool {
        match self {
            Self::Set => true,
            Self::Unset => false,
            Self::Pass => current,
        }
    }
}

impl From<bool> for FlagResult {
    fn from(value: bool) -> Self {
        if value { Self::Set } else { Self::Unset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftKind {
    Lsl,
    Lsr,
    Asr,
    Ror,
}

impl From<u32> for ShiftKind {
    fn from(bits: u32) -> Self {
        match bits & 0b11 {
            0b00 => Self::Lsl,
            0b01 => Self::Lsr,
            0b10 => Self::Asr,
            _ => Self::Ror,
        }
    }
}

/// A barrel shifter output: the operand and the carry it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShifterOperand {
    pub value: u32,
    pub carry: FlagResult,
}

impl ShifterOperand {
    const fn new(value: u32, carry: bool) -> Self {
        Self {
            value,
            carry: if carry {
                FlagResult::Set
            } else {
                FlagResult::Unset
            },
        }
    }

    const fn unchanged(value: u32) -> Self {
        Self {
            value,
            carry: FlagResult::Pass,
        }
    }
}

/// `imm8` rotated right by `2 * rotate`.
#[must_use]
pub fn rotated_immediate(imm8: u32, rotate: u32) -> ShifterOperand {
    if rotate == 0 {
        return ShifterOperand::unchanged(imm8);
    }
    let value = imm8.rotate_right(rotate * 2);
    ShifterOperand::new(value, value.get_bit(31))
}

/// Shift by a register-specified amount. Only the low byte of `amount` is used.
#[must_use]
pub fn shift_by_register(kind: ShiftKind, value: u32, amount: u32) -> ShifterOperand {
    let amount = amount & 0xFF;
    if amount == 0 {
        return ShifterOperand::unchanged(value);
    }

    match kind {
        ShiftKind::Lsl => match amount {
            1..=31 => ShifterOperand::new(value << amount, value.get_bit((32 - amount) as u8)),
            32 => ShifterOperand::new(0, value.get_bit(0)),
            _ => ShifterOperand::new(0, false),
        },
        ShiftKind::Lsr => match amount {
            1..=31 => ShifterOperand::new(value >> amount, value.get_bit((amount - 1) as u8)),
            32 => ShifterOperand::new(0, value.get_bit(31)),
            _ => ShifterOperand::new(0, false),
        },
        ShiftKind::Asr => {
            if amount < 32 {
                let shifted = (value.cast_signed() >> amount).cast_unsigned();
                ShifterOperand::new(shifted, value.get_bit((amount - 1) as u8))
            } else {
                let fill = if value.get_bit(31) { u32::MAX } else { 0 };
                ShifterOperand::new(fill, value.get_bit(31))
            }
        }
        ShiftKind::Ror => {
            let effective = amount & 0x1F;
            if effective == 0 {
                ShifterOperand::new(value, value.get_bit(31))
            } else {
                ShifterOperand::new(
                    value.rotate_right(effective),
                    value.get_bit((effective - 1) as u8),
                )
            }
        }
    }
}

/// Shift by a 5-bit immediate, applying the `#0` re-encodings.
#[must_use]
pub fn shift_by_immediate(
    kind: ShiftKind,
    value: u32,
    amount: u32,
    carry_in: bool,
) -> ShifterOperand {
    let amount = amount & 0x1F;
    match (kind, amount) {
        (ShiftKind::Lsl, 0) => ShifterOperand::unchanged(value),
        (ShiftKind::Lsr | ShiftKind::Asr, 0) => shift_by_register(kind, value, 32),
        (ShiftKind::Ror, 0) => {
            // RRX: 33-bit rotation through the carry flag.
            ShifterOperand::new((u32::from(carry_in) << 31) | (value >> 1), value.get_bit(0))
        }
        _ => shift_by_register(kind, value, amount),
    }
}

/// Result of a 32-bit addition with carry-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddResult {
    pub value: u32,
    pub carry: bool,
    pub overflow: bool,
}

/// `true` when the unsigned sum of the operands does not fit in 32 bits.
#[must_use]
pub fn carry_from(first: u32, second: u32, carry_in: bool) -> bool {
    u64::from(first) + u64::from(second) + u64::from(carry_in) > u64::from(u32::MAX)
}

/// `true` when both operands share a sign that differs from the sign of `result`.
#[must_use]
pub const fn overflow_from(first: u32, second: u32, result: u32) -> bool {
    ((first ^ result) & (second ^ result)) >> 31 == 1
}

/// `first + second + carry_in`, reporting unsigned carry and signed overflow.
///
/// Subtraction goes through here as `first + !second + 1`, which makes the
/// carry an inverted borrow as the architecture expects.
#[must_use]
pub fn add_with_carry(first: u32, second: u32, carry_in: bool) -> AddResult {
    let value = first
        .wrapping_add(second)
        .wrapping_add(u32::from(carry_in));
    AddResult {
        value,
        carry: carry_from(first, second, carry_in),
        overflow: overflow_from(first, second, value),
    }
}

/// Clamps a wide signed value into `i32`, reporting whether clamping happened.
#[must_use]
pub fn signed_saturate(value: i64) -> (u32, bool) {
    i32::try_from(value).map_or_else(
        |_| {
            let clamped = if value < 0 { i32::MIN } else { i32::MAX };
            (clamped.cast_unsigned(), true)
        },
        |v| (v.cast_unsigned(), false),
    )
}
