//! # Program Status Registers (CPSR and SPSR)
//!
//! ```text
//! 31 30 29 28 27 26 25 24 23  20 19  16 15  10 9 8 7 6 5 4   0
//! ┌──┬──┬──┬──┬──┬─────┬──┬──────┬──────┬──────┬─┬─┬─┬─┬─┬─────┐
//! │N │Z │C │V │Q │ Res │J │ Res  │GE3:0 │ Res  │E│A│I│F│T│Mode │
//! └──┴──┴──┴──┴──┴─────┴──┴──────┴──────┴──────┴─┴─┴─┴─┴─┴─────┘
//! ```
//!
//! - **N Z C V**: condition flags, see [`condition`](super::condition)
//! - **Q**: sticky saturation flag, only cleared through `MSR`
//! - **J**, **T**: execution state (Jazelle is never entered here)
//! - **GE**: greater-or-equal flags of the SIMD media instructions
//! - **E**: data endianness, flipped by `SETEND`
//! - **A I F**: imprecise abort, IRQ and FIQ disable
//! - **Mode**: see [`cpu_modes`](super::cpu_modes)

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::alu::FlagResult;
use crate::cpu::cpu_modes::Mode;
use crate::error::CoreResult;

/// Flags, Q, GE and E: writable from any mode through `MSR`.
pub const USER_MASK: u32 = 0xF80F_0200;

/// A, I, F and the mode field: writable from privileged modes only.
pub const PRIVILEGED_MASK: u32 = 0x0000_01DF;

/// J and T: never written through `MSR CPSR`.
pub const STATE_MASK: u32 = 0x0100_0020;

const MODE_MASK: u32 = 0b1_1111;

/// Program Status Register (CPSR or SPSR).
///
/// Wraps the raw 32-bit value; the mode field is not validated here, see
/// [`Psr::mode`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Psr(u32);

impl Psr {
    /// N => Bit 31, (0=Not Signed, 1=Signed)
    #[must_use]
    pub fn sign_flag(self) -> bool {
        self.0.get_bit(31)
    }

    /// Z => Bit 30, (0=Not Zero, 1=Zero)
    #[must_use]
    pub fn zero_flag(self) -> bool {
        self.0.get_bit(30)
    }

    /// C => Bit 29, (0=Borrow/No Carry, 1=Carry/No Borrow)
    #[must_use]
    pub fn carry_flag(self) -> bool {
        self.0.get_bit(29)
    }

    /// V => Bit 28, (0=No Overflow, 1=Overflow)
    #[must_use]
    pub fn overflow_flag(self) -> bool {
        self.0.get_bit(28)
    }

    /// Q => Bit 27, (1=Sticky Overflow)
    #[must_use]
    pub fn sticky_overflow(self) -> bool {
        self.0.get_bit(27)
    }

    /// J => Bit 24
    #[must_use]
    pub fn jazelle_bit(self) -> bool {
        self.0.get_bit(24)
    }

    /// GE[3:0] => Bits 19-16
    #[must_use]
    pub fn greater_or_equal(self) -> u32 {
        self.0.get_bits(16..=19)
    }

    /// E => Bit 9, (0=Little-endian data, 1=Big-endian data)
    #[must_use]
    pub fn big_endian(self) -> bool {
        self.0.get_bit(9)
    }

    /// A => Bit 8, (0=Enable, 1=Disable)
    #[must_use]
    pub fn abort_disable(self) -> bool {
        self.0.get_bit(8)
    }

    /// I => Bit 7, (0=Enable, 1=Disable)
    #[must_use]
    pub fn irq_disable(self) -> bool {
        self.0.get_bit(7)
    }

    /// F => Bit 6, (0=Enable, 1=Disable)
    #[must_use]
    pub fn fiq_disable(self) -> bool {
        self.0.get_bit(6)
    }

    /// T => Bit 5, (0=ARM, 1=THUMB)
    #[must_use]
    pub fn state_bit(self) -> bool {
        self.0.get_bit(5)
    }

    /// M4-M0 => Bits 4-0
    ///
    /// # Errors
    ///
    /// An SPSR can hold any value, so the field is validated on every read.
    pub fn mode(self) -> CoreResult<Mode> {
        Mode::try_from(self.0 & MODE_MASK)
    }

    pub fn set_sign_flag(&mut self, value: bool) {
        self.0.set_bit(31, value);
    }

    pub fn set_zero_flag(&mut self, value: bool) {
        self.0.set_bit(30, value);
    }

    pub fn set_carry_flag(&mut self, value: bool) {
        self.0.set_bit(29, value);
    }

    pub fn set_overflow_flag(&mut self, value: bool) {
        self.0.set_bit(28, value);
    }

    /// Set by saturating arithmetic; only `MSR` clears it.
    pub fn set_sticky_overflow(&mut self, value: bool) {
        self.0.set_bit(27, value);
    }

    pub fn set_big_endian(&mut self, value: bool) {
        self.0.set_bit(9, value);
    }

    pub fn set_abort_disable(&mut self, value: bool) {
        self.0.set_bit(8, value);
    }

    pub fn set_irq_disable(&mut self, value: bool) {
        self.0.set_bit(7, value);
    }

    pub fn set_fiq_disable(&mut self, value: bool) {
        self.0.set_bit(6, value);
    }

    pub fn set_state_bit(&mut self, value: bool) {
        self.0.set_bit(5, value);
    }

    pub const fn set_mode(&mut self, m: Mode) {
        self.0 = (self.0 & !MODE_MASK) | m as u32;
    }

    /// N and Z from a result, the way every flag-setting instruction does it.
    pub fn set_nz(&mut self, result: u32) {
        self.set_sign_flag(result.get_bit(31));
        self.set_zero_flag(result == 0);
    }

    pub fn apply_carry(&mut self, carry: FlagResult) {
        let value = carry.resolve(self.carry_flag());
        self.set_carry_flag(value);
    }

    pub fn apply_overflow(&mut self, overflow: FlagResult) {
        let value = overflow.resolve(self.overflow_flag());
        self.set_overflow_flag(value);
    }

    /// Replaces the bits selected by `mask` with the ones from `value`.
    #[must_use]
    pub const fn merged(self, value: u32, mask: u32) -> Self {
        Self((self.0 & !mask) | (value & mask))
    }

    #[must_use]
    pub fn execution_state(self) -> ExecutionState {
        self.state_bit().into()
    }

    pub fn set_execution_state(&mut self, state: ExecutionState) {
        self.set_state_bit(state.into());
    }
}

impl From<Mode> for Psr {
    fn from(m: Mode) -> Self {
        let mut s = Self(0);
        s.set_mode(m);
        s
    }
}

impl From<u32> for Psr {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Psr> for u32 {
    fn from(p: Psr) -> Self {
        p.0
    }
}

impl std::fmt::Display for Psr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flag = |on: bool, c: char| if on { c } else { c.to_ascii_lowercase() };
        write!(
            f,
            "{:08X} [{}{}{}{}{} {}{}{}{}] ",
            self.0,
            flag(self.sign_flag(), 'N'),
            flag(self.zero_flag(), 'Z'),
            flag(self.carry_flag(), 'C'),
            flag(self.overflow_flag(), 'V'),
            flag(self.sticky_overflow(), 'Q'),
            flag(self.abort_disable(), 'A'),
            flag(self.irq_disable(), 'I'),
            flag(self.fiq_disable(), 'F'),
            flag(self.state_bit(), 'T'),
        )?;
        match self.mode() {
            Ok(mode) => write!(f, "{mode:?}"),
            Err(_) => write!(f, "mode 0b{:05b}", self.0 & MODE_MASK),
        }
    }
}

/// The instruction set the core is executing, selected by the T bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionState {
    /// 32-bit instructions.
    Arm,
    /// 16-bit instructions.
    Thumb,
}

impl ExecutionState {
    /// Bytes fetched per instruction.
    #[must_use]
    pub const fn instruction_width(self) -> u32 {
        match self {
            Self::Arm => 4,
            Self::Thumb => 2,
        }
    }

    /// Clears the low PC bits that cannot address an instruction in this state.
    #[must_use]
    pub const fn align(self, address: u32) -> u32 {
        address & !(self.instruction_width() - 1)
    }
}

impl From<ExecutionState> for bool {
    fn from(state: ExecutionState) -> Self {
        matches!(state, ExecutionState::Thumb)
    }
}

impl From<bool> for ExecutionState {
    fn from(state: bool) -> Self {
        if state { Self::Thumb } else { Self::Arm }
    }
}
