//! ARM (32-bit) instruction decoding.
//!
//! Decoding is a lookup in two ordered pattern tables, one for the normal
//! conditional space and one for words whose condition field is `1111`.
//! Each rule lists bits 27..0 as `0`, `1` or `x` (don't care); the first rule
//! whose fixed bits match selects the decoder for the word. Several encodings
//! overlap (multiplies and extra load/stores live inside the data-processing
//! space) so the order of the rules matters.

use std::fmt::Display;

use crate::bitwise::Bits;
use crate::cpu::alu::ShiftKind;
use crate::cpu::arm::alu_instruction::ArmModeAluInstruction;
use crate::cpu::condition::Condition;
use crate::cpu::flags::{Indexing, LoadStoreKind, Offsetting, ReadWriteKind};
use crate::error::{CoreError, CoreResult};

/// Second operand of a data-processing instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluSecondOperandInfo {
    Immediate { base: u32, rotate: u32 },
    ShiftByImmediate { rm: usize, kind: ShiftKind, amount: u32 },
    ShiftByRegister { rm: usize, kind: ShiftKind, rs: usize },
}

/// Offset of `LDR`/`STR`/`LDRB`/`STRB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleDataTransferOffset {
    Immediate(u32),
    Register { rm: usize, kind: ShiftKind, amount: u32 },
}

/// Offset of the halfword, signed and doubleword transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfwordDataTransferOffset {
    Immediate(u32),
    Register(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfwordTransferKind {
    /// `LDRH` / `STRH`
    UnsignedHalfword,
    /// `LDRSB`
    SignedByte,
    /// `LDRSH`
    SignedHalfword,
    /// `LDRD` / `STRD`
    Doubleword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsrKind {
    Cpsr,
    Spsr,
}

impl From<bool> for PsrKind {
    fn from(spsr: bool) -> Self {
        if spsr { Self::Spsr } else { Self::Cpsr }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsrOperand {
    Immediate(u32),
    Register(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaturatingOp {
    /// `QADD`
    Add,
    /// `QSUB`
    Sub,
    /// `QDADD`
    DoubleAdd,
    /// `QDSUB`
    DoubleSub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedMultiplyOp {
    /// `SMLA<x><y>`: Rd = Rm.x * Rs.y + Rn
    Smla,
    /// `SMLAW<y>`: Rd = (Rm * Rs.y) >> 16 + Rn
    Smlaw,
    /// `SMULW<y>`: Rd = (Rm * Rs.y) >> 16
    Smulw,
    /// `SMLAL<x><y>`: Rd:Rn += Rm.x * Rs.y
    Smlal,
    /// `SMUL<x><y>`: Rd = Rm.x * Rs.y
    Smul,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmModeInstruction {
    DataProcessing {
        alu_instruction: ArmModeAluInstruction,
        set_conditions: bool,
        rn: usize,
        destination: usize,
        op2: AluSecondOperandInfo,
    },
    /// `MUL` / `MLA`. Rd is bits 19-16, the accumulator Rn bits 15-12.
    Multiply {
        accumulate: bool,
        set_conditions: bool,
        rd: usize,
        rn: usize,
        rs: usize,
        rm: usize,
    },
    /// `UMULL` / `UMLAL` / `SMULL` / `SMLAL`
    MultiplyLong {
        signed: bool,
        accumulate: bool,
        set_conditions: bool,
        rd_hi: usize,
        rd_lo: usize,
        rs: usize,
        rm: usize,
    },
    /// `UMAAL`
    MultiplyDoubleAccumulate {
        rd_hi: usize,
        rd_lo: usize,
        rs: usize,
        rm: usize,
    },
    SingleDataSwap {
        width: ReadWriteKind,
        rn: usize,
        rd: usize,
        rm: usize,
    },
    /// `LDREX` / `STREX` and the ARMv6K variants.
    Exclusive,
    SingleDataTransfer {
        load_store: LoadStoreKind,
        indexing: Indexing,
        offsetting: Offsetting,
        width: ReadWriteKind,
        write_back: bool,
        rn: usize,
        rd: usize,
        offset: SingleDataTransferOffset,
    },
    HalfwordDataTransfer {
        load_store: LoadStoreKind,
        indexing: Indexing,
        offsetting: Offsetting,
        write_back: bool,
        kind: HalfwordTransferKind,
        rn: usize,
        rd: usize,
        offset: HalfwordDataTransferOffset,
    },
    BlockDataTransfer {
        load_store: LoadStoreKind,
        indexing: Indexing,
        offsetting: Offsetting,
        /// S bit: user bank transfer, or CPSR restore when R15 is loaded.
        load_psr: bool,
        write_back: bool,
        rn: usize,
        register_list: u16,
    },
    /// `B` / `BL`, `offset` already sign-extended and scaled to bytes.
    Branch { link: bool, offset: u32 },
    /// `BX` / `BXJ` / `BLX Rm`
    BranchAndExchange { link: bool, rm: usize },
    /// `BLX #imm`, `offset` includes the halfword bit.
    BranchLinkExchangeImmediate { offset: u32 },
    /// `MRS`
    PsrRead { psr: PsrKind, rd: usize },
    /// `MSR`, `field_mask` expanded to a byte mask.
    PsrWrite {
        psr: PsrKind,
        field_mask: u32,
        operand: MsrOperand,
    },
    CountLeadingZeros { rd: usize, rm: usize },
    SaturatingArithmetic {
        op: SaturatingOp,
        rd: usize,
        rn: usize,
        rm: usize,
    },
    /// Rd is bits 19-16 (RdHi for `SMLAL`), Rn bits 15-12 (RdLo for `SMLAL`).
    SignedMultiplyHalfword {
        op: SignedMultiplyOp,
        x_top: bool,
        y_top: bool,
        rd: usize,
        rn: usize,
        rs: usize,
        rm: usize,
    },
    Breakpoint { comment: u16 },
    SoftwareInterrupt { comment: u32 },
    Coprocessor,
    Media,
    /// `CPS`
    ChangeProcessorState {
        imod: u32,
        change_mode: bool,
        affect_a: bool,
        affect_i: bool,
        affect_f: bool,
        mode: u32,
    },
    SetEndianness { big_endian: bool },
    /// `PLD`
    Preload,
    /// `SRS`
    SaveReturnState {
        indexing: Indexing,
        offsetting: Offsetting,
        write_back: bool,
        mode: u32,
    },
    /// `RFE`
    ReturnFromException {
        indexing: Indexing,
        offsetting: Offsetting,
        write_back: bool,
        rn: usize,
    },
}

impl TryFrom<u32> for ArmModeInstruction {
    type Error = CoreError;

    fn try_from(op_code: u32) -> CoreResult<Self> {
        let table: &[Matcher] = if Condition::of(op_code) == Condition::NV {
            &UNCONDITIONAL
        } else {
            &CONDITIONAL
        };

        table
            .iter()
            .find(|rule| op_code & rule.mask == rule.expected)
            .map_or_else(|| undefined(op_code), |rule| (rule.decode)(op_code))
    }
}

/// Parses a rule for bits 27..0 into `(mask, expected)` at compile time.
/// `_` is a separator, anything other than `0` or `1` is a wildcard.
const fn pattern(text: &str) -> (u32, u32) {
    let bytes = text.as_bytes();
    let mut mask = 0;
    let mut expected = 0;
    let mut bit = 28;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'_' {
            bit -= 1;
            match bytes[i] {
                b'0' => mask |= 1 << bit,
                b'1' => {
                    mask |= 1 << bit;
                    expected |= 1 << bit;
                }
                _ => {}
            }
        }
        i += 1;
    }
    assert!(bit == 0, "a rule must cover exactly bits 27..0");
    (mask, expected)
}

struct Matcher {
    mask: u32,
    expected: u32,
    decode: fn(u32) -> CoreResult<ArmModeInstruction>,
}

macro_rules! rule {
    ($pattern:literal => $decode:expr) => {{
        const P: (u32, u32) = pattern($pattern);
        Matcher {
            mask: P.0,
            expected: P.1,
            decode: $decode,
        }
    }};
}

static CONDITIONAL: [Matcher; 17] = [
    rule!("0000_xxxx_xxxx_xxxx_xxxx_1001_xxxx" => decode_multiply),
    rule!("0001_xxxx_xxxx_xxxx_xxxx_1001_xxxx" => decode_swap),
    rule!("000x_xxxx_xxxx_xxxx_xxxx_1xx1_xxxx" => decode_halfword_transfer),
    rule!("0001_0xx0_xxxx_xxxx_xxxx_xxxx_xxxx" => decode_miscellaneous),
    rule!("000x_xxxx_xxxx_xxxx_xxxx_xxxx_xxxx" => decode_data_processing),
    rule!("0011_0x10_xxxx_xxxx_xxxx_xxxx_xxxx" => decode_msr_immediate),
    rule!("0011_0x00_xxxx_xxxx_xxxx_xxxx_xxxx" => undefined),
    rule!("001x_xxxx_xxxx_xxxx_xxxx_xxxx_xxxx" => decode_data_processing),
    rule!("010x_xxxx_xxxx_xxxx_xxxx_xxxx_xxxx" => decode_single_transfer),
    rule!("0111_1111_xxxx_xxxx_xxxx_1111_xxxx" => undefined),
    rule!("011x_xxxx_xxxx_xxxx_xxxx_xxx1_xxxx" => |_| Ok(ArmModeInstruction::Media)),
    rule!("011x_xxxx_xxxx_xxxx_xxxx_xxx0_xxxx" => decode_single_transfer),
    rule!("100x_xxxx_xxxx_xxxx_xxxx_xxxx_xxxx" => decode_block_transfer),
    rule!("101x_xxxx_xxxx_xxxx_xxxx_xxxx_xxxx" => decode_branch),
    rule!("110x_xxxx_xxxx_xxxx_xxxx_xxxx_xxxx" => |_| Ok(ArmModeInstruction::Coprocessor)),
    rule!("1111_xxxx_xxxx_xxxx_xxxx_xxxx_xxxx" => decode_software_interrupt),
    rule!("1110_xxxx_xxxx_xxxx_xxxx_xxxx_xxxx" => |_| Ok(ArmModeInstruction::Coprocessor)),
];

static UNCONDITIONAL: [Matcher; 7] = [
    rule!("0001_0000_xxx0_xxxx_xxxx_xx0x_xxxx" => decode_change_processor_state),
    rule!("0001_0000_0001_xxxx_xxxx_0000_xxxx" => decode_set_endianness),
    rule!("01x1_x101_xxxx_1111_xxxx_xxxx_xxxx" => |_| Ok(ArmModeInstruction::Preload)),
    rule!("100x_x1x0_1101_xxxx_xxxx_xxxx_xxxx" => decode_save_return_state),
    rule!("100x_x0x1_xxxx_xxxx_xxxx_xxxx_xxxx" => decode_return_from_exception),
    rule!("101x_xxxx_xxxx_xxxx_xxxx_xxxx_xxxx" => decode_branch_link_exchange),
    rule!("11xx_xxxx_xxxx_xxxx_xxxx_xxxx_xxxx" => |_| Ok(ArmModeInstruction::Coprocessor)),
];

const fn undefined(op_code: u32) -> CoreResult<ArmModeInstruction> {
    Err(CoreError::Undefined {
        instruction: op_code,
    })
}

/// Register number stored in bits `lsb+3..=lsb`.
fn reg(op_code: u32, lsb: u8) -> usize {
    op_code.get_bits(lsb..=lsb + 3) as usize
}

fn decode_multiply(op_code: u32) -> CoreResult<ArmModeInstruction> {
    let set_conditions = op_code.get_bit(20);
    let (rd, rn, rs, rm) = (
        reg(op_code, 16),
        reg(op_code, 12),
        reg(op_code, 8),
        reg(op_code, 0),
    );

    match op_code.get_bits(21..=23) {
        0b000 | 0b001 => Ok(ArmModeInstruction::Multiply {
            accumulate: op_code.get_bit(21),
            set_conditions,
            rd,
            rn,
            rs,
            rm,
        }),
        0b010 if !set_conditions => Ok(ArmModeInstruction::MultiplyDoubleAccumulate {
            rd_hi: rd,
            rd_lo: rn,
            rs,
            rm,
        }),
        0b100..=0b111 => Ok(ArmModeInstruction::MultiplyLong {
            signed: op_code.get_bit(22),
            accumulate: op_code.get_bit(21),
            set_conditions,
            rd_hi: rd,
            rd_lo: rn,
            rs,
            rm,
        }),
        _ => undefined(op_code),
    }
}

fn decode_swap(op_code: u32) -> CoreResult<ArmModeInstruction> {
    match op_code.get_bits(20..=23) {
        0b0000 | 0b0100 => Ok(ArmModeInstruction::SingleDataSwap {
            width: op_code.get_bit(22).into(),
            rn: reg(op_code, 16),
            rd: reg(op_code, 12),
            rm: reg(op_code, 0),
        }),
        0b1000..=0b1111 => Ok(ArmModeInstruction::Exclusive),
        _ => undefined(op_code),
    }
}

fn decode_halfword_transfer(op_code: u32) -> CoreResult<ArmModeInstruction> {
    let load = op_code.get_bit(20);
    let rd = reg(op_code, 12);
    let (load_store, kind) = match (load, op_code.get_bits(5..=6)) {
        (_, 0b01) => (load.into(), HalfwordTransferKind::UnsignedHalfword),
        (true, 0b10) => (LoadStoreKind::Load, HalfwordTransferKind::SignedByte),
        (true, _) => (LoadStoreKind::Load, HalfwordTransferKind::SignedHalfword),
        (false, 0b10) => (LoadStoreKind::Load, HalfwordTransferKind::Doubleword),
        (false, _) => (LoadStoreKind::Store, HalfwordTransferKind::Doubleword),
    };

    // LDRD/STRD pair Rd with Rd+1, which must not run into LR/PC.
    if kind == HalfwordTransferKind::Doubleword && (rd % 2 == 1 || rd == 14) {
        return undefined(op_code);
    }

    let offset = if op_code.get_bit(22) {
        HalfwordDataTransferOffset::Immediate(
            (op_code.get_bits(8..=11) << 4) | op_code.get_bits(0..=3),
        )
    } else {
        HalfwordDataTransferOffset::Register(reg(op_code, 0))
    };

    Ok(ArmModeInstruction::HalfwordDataTransfer {
        load_store,
        indexing: op_code.get_bit(24).into(),
        offsetting: op_code.get_bit(23).into(),
        write_back: op_code.get_bit(21),
        kind,
        rn: reg(op_code, 16),
        rd,
        offset,
    })
}

/// Expands the `c x s f` field selector of `MSR` to a byte mask.
fn field_mask(op_code: u32) -> u32 {
    (0..4_u8)
        .filter(|field| op_code.get_bit(16 + field))
        .fold(0, |mask, field| mask | (0xFF << (u32::from(field) * 8)))
}

fn decode_miscellaneous(op_code: u32) -> CoreResult<ArmModeInstruction> {
    let op = op_code.get_bits(21..=22);

    if op_code.get_bit(7) && !op_code.get_bit(4) {
        let x_top = op_code.get_bit(5);
        let op = match op {
            0b00 => SignedMultiplyOp::Smla,
            0b01 if x_top => SignedMultiplyOp::Smulw,
            0b01 => SignedMultiplyOp::Smlaw,
            0b10 => SignedMultiplyOp::Smlal,
            _ => SignedMultiplyOp::Smul,
        };
        return Ok(ArmModeInstruction::SignedMultiplyHalfword {
            op,
            x_top,
            y_top: op_code.get_bit(6),
            rd: reg(op_code, 16),
            rn: reg(op_code, 12),
            rs: reg(op_code, 8),
            rm: reg(op_code, 0),
        });
    }

    match (op_code.get_bits(4..=7), op) {
        (0b0000, _) if op_code.get_bit(21) => Ok(ArmModeInstruction::PsrWrite {
            psr: op_code.get_bit(22).into(),
            field_mask: field_mask(op_code),
            operand: MsrOperand::Register(reg(op_code, 0)),
        }),
        (0b0000, _) => Ok(ArmModeInstruction::PsrRead {
            psr: op_code.get_bit(22).into(),
            rd: reg(op_code, 12),
        }),
        (0b0001 | 0b0010, 0b01) => Ok(ArmModeInstruction::BranchAndExchange {
            link: false,
            rm: reg(op_code, 0),
        }),
        (0b0001, 0b11) => Ok(ArmModeInstruction::CountLeadingZeros {
            rd: reg(op_code, 12),
            rm: reg(op_code, 0),
        }),
        (0b0011, 0b01) => Ok(ArmModeInstruction::BranchAndExchange {
            link: true,
            rm: reg(op_code, 0),
        }),
        (0b0101, _) => Ok(ArmModeInstruction::SaturatingArithmetic {
            op: match op {
                0b00 => SaturatingOp::Add,
                0b01 => SaturatingOp::Sub,
                0b10 => SaturatingOp::DoubleAdd,
                _ => SaturatingOp::DoubleSub,
            },
            rd: reg(op_code, 12),
            rn: reg(op_code, 16),
            rm: reg(op_code, 0),
        }),
        (0b0111, 0b01) => Ok(ArmModeInstruction::Breakpoint {
            comment: u16::try_from((op_code.get_bits(8..=19) << 4) | op_code.get_bits(0..=3))
                .unwrap_or_default(),
        }),
        _ => undefined(op_code),
    }
}

fn decode_data_processing(op_code: u32) -> CoreResult<ArmModeInstruction> {
    let op2 = if op_code.get_bit(25) {
        AluSecondOperandInfo::Immediate {
            base: op_code.get_bits(0..=7),
            rotate: op_code.get_bits(8..=11),
        }
    } else if op_code.get_bit(4) {
        AluSecondOperandInfo::ShiftByRegister {
            rm: reg(op_code, 0),
            kind: op_code.get_bits(5..=6).into(),
            rs: reg(op_code, 8),
        }
    } else {
        AluSecondOperandInfo::ShiftByImmediate {
            rm: reg(op_code, 0),
            kind: op_code.get_bits(5..=6).into(),
            amount: op_code.get_bits(7..=11),
        }
    };

    Ok(ArmModeInstruction::DataProcessing {
        alu_instruction: op_code.get_bits(21..=24).into(),
        set_conditions: op_code.get_bit(20),
        rn: reg(op_code, 16),
        destination: reg(op_code, 12),
        op2,
    })
}

fn decode_msr_immediate(op_code: u32) -> CoreResult<ArmModeInstruction> {
    let value = op_code
        .get_bits(0..=7)
        .rotate_right(op_code.get_bits(8..=11) * 2);
    Ok(ArmModeInstruction::PsrWrite {
        psr: op_code.get_bit(22).into(),
        field_mask: field_mask(op_code),
        operand: MsrOperand::Immediate(value),
    })
}

fn decode_single_transfer(op_code: u32) -> CoreResult<ArmModeInstruction> {
    // For this class I=1 selects the register offset.
    let offset = if op_code.get_bit(25) {
        SingleDataTransferOffset::Register {
            rm: reg(op_code, 0),
            kind: op_code.get_bits(5..=6).into(),
            amount: op_code.get_bits(7..=11),
        }
    } else {
        SingleDataTransferOffset::Immediate(op_code.get_bits(0..=11))
    };

    Ok(ArmModeInstruction::SingleDataTransfer {
        load_store: op_code.get_bit(20).into(),
        indexing: op_code.get_bit(24).into(),
        offsetting: op_code.get_bit(23).into(),
        width: op_code.get_bit(22).into(),
        write_back: op_code.get_bit(21),
        rn: reg(op_code, 16),
        rd: reg(op_code, 12),
        offset,
    })
}

fn decode_block_transfer(op_code: u32) -> CoreResult<ArmModeInstruction> {
    let register_list = u16::try_from(op_code.get_bits(0..=15)).unwrap_or_default();
    if register_list == 0 {
        return undefined(op_code);
    }

    Ok(ArmModeInstruction::BlockDataTransfer {
        load_store: op_code.get_bit(20).into(),
        indexing: op_code.get_bit(24).into(),
        offsetting: op_code.get_bit(23).into(),
        load_psr: op_code.get_bit(22),
        write_back: op_code.get_bit(21),
        rn: reg(op_code, 16),
        register_list,
    })
}

fn decode_branch(op_code: u32) -> CoreResult<ArmModeInstruction> {
    Ok(ArmModeInstruction::Branch {
        link: op_code.get_bit(24),
        offset: op_code.get_bits(0..=23).sign_extended(24) << 2,
    })
}

fn decode_software_interrupt(op_code: u32) -> CoreResult<ArmModeInstruction> {
    Ok(ArmModeInstruction::SoftwareInterrupt {
        comment: op_code.get_bits(0..=23),
    })
}

fn decode_change_processor_state(op_code: u32) -> CoreResult<ArmModeInstruction> {
    Ok(ArmModeInstruction::ChangeProcessorState {
        imod: op_code.get_bits(18..=19),
        change_mode: op_code.get_bit(17),
        affect_a: op_code.get_bit(8),
        affect_i: op_code.get_bit(7),
        affect_f: op_code.get_bit(6),
        mode: op_code.get_bits(0..=4),
    })
}

fn decode_set_endianness(op_code: u32) -> CoreResult<ArmModeInstruction> {
    Ok(ArmModeInstruction::SetEndianness {
        big_endian: op_code.get_bit(9),
    })
}

fn decode_save_return_state(op_code: u32) -> CoreResult<ArmModeInstruction> {
    Ok(ArmModeInstruction::SaveReturnState {
        indexing: op_code.get_bit(24).into(),
        offsetting: op_code.get_bit(23).into(),
        write_back: op_code.get_bit(21),
        mode: op_code.get_bits(0..=4),
    })
}

fn decode_return_from_exception(op_code: u32) -> CoreResult<ArmModeInstruction> {
    Ok(ArmModeInstruction::ReturnFromException {
        indexing: op_code.get_bit(24).into(),
        offsetting: op_code.get_bit(23).into(),
        write_back: op_code.get_bit(21),
        rn: reg(op_code, 16),
    })
}

fn decode_branch_link_exchange(op_code: u32) -> CoreResult<ArmModeInstruction> {
    let offset = op_code.get_bits(0..=23).sign_extended(24) << 2;
    Ok(ArmModeInstruction::BranchLinkExchangeImmediate {
        offset: offset | (u32::from(op_code.get_bit(24)) << 1),
    })
}

fn register_list_text(list: u16) -> String {
    (0..16)
        .filter(|r| list.get_bit(*r))
        .map(|r| format!("R{r}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Display for ArmModeInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::DataProcessing {
                alu_instruction,
                set_conditions,
                rn,
                destination,
                op2,
            } => {
                let s = if set_conditions && !alu_instruction.is_test() { "S" } else { "" };
                let op2 = match op2 {
                    AluSecondOperandInfo::Immediate { base, rotate } => {
                        format!("#{}", base.rotate_right(rotate * 2))
                    }
                    AluSecondOperandInfo::ShiftByImmediate { rm, amount: 0, kind: ShiftKind::Lsl } => {
                        format!("R{rm}")
                    }
                    AluSecondOperandInfo::ShiftByImmediate { rm, kind, amount } => {
                        format!("R{rm}, {kind:?} #{amount}")
                    }
                    AluSecondOperandInfo::ShiftByRegister { rm, kind, rs } => {
                        format!("R{rm}, {kind:?} R{rs}")
                    }
                };
                if alu_instruction.is_test() {
                    write!(f, "{alu_instruction} R{rn}, {op2}")
                } else if alu_instruction.is_move() {
                    write!(f, "{alu_instruction}{s} R{destination}, {op2}")
                } else {
                    write!(f, "{alu_instruction}{s} R{destination}, R{rn}, {op2}")
                }
            }
            Self::Branch { link, offset } => {
                let l = if link { "L" } else { "" };
                write!(f, "B{l} #{}", offset.cast_signed())
            }
            Self::BranchAndExchange { link, rm } => {
                let l = if link { "L" } else { "" };
                write!(f, "B{l}X R{rm}")
            }
            Self::BlockDataTransfer {
                load_store,
                indexing,
                offsetting,
                write_back,
                rn,
                register_list,
                load_psr,
            } => {
                let op = if load_store == LoadStoreKind::Load { "LDM" } else { "STM" };
                let mode = match (offsetting, indexing) {
                    (Offsetting::Up, Indexing::Post) => "IA",
                    (Offsetting::Up, Indexing::Pre) => "IB",
                    (Offsetting::Down, Indexing::Post) => "DA",
                    (Offsetting::Down, Indexing::Pre) => "DB",
                };
                let w = if write_back { "!" } else { "" };
                let s = if load_psr { "^" } else { "" };
                write!(f, "{op}{mode} R{rn}{w}, {{{}}}{s}", register_list_text(register_list))
            }
            Self::SoftwareInterrupt { comment } => write!(f, "SWI #0x{comment:X}"),
            Self::Breakpoint { comment } => write!(f, "BKPT #0x{comment:X}"),
            Self::CountLeadingZeros { rd, rm } => write!(f, "CLZ R{rd}, R{rm}"),
            Self::PsrRead { psr, rd } => write!(f, "MRS R{rd}, {psr:?}"),
            other => {
                let debug = format!("{other:?}");
                let name = debug.split([' ', '{']).next().unwrap_or_default();
                f.write_str(name)
            }
        }
    }
}
