//! # ARM instruction set (32-bit)
//!
//! Every ARM instruction carries a condition in its top nibble; the `1111`
//! nibble selects a separate unconditional encoding space on ARMv6.
//!
//! ```text
//! 31-28   27-25   24-0
//! [Cond] [Class] [Instruction-specific]
//! ```
//!
//! ## Instruction classes
//!
//! | Bits 27-25 | Class                        | Examples                      |
//! |------------|------------------------------|-------------------------------|
//! | 00x        | Data processing              | AND, ADD, CMP, MOV            |
//! | 000        | Multiply, swap, extra ld/st  | MUL, UMULL, SWP, LDRH, LDRD   |
//! | 000 (misc) | PSR transfer, BX, CLZ, Q ops | MRS, MSR, BX, BLX, CLZ, QADD  |
//! | 01x        | Single data transfer         | LDR, STRB                     |
//! | 011 (b4=1) | Media                        | not executed                  |
//! | 100        | Block data transfer          | LDM, STM                      |
//! | 101        | Branch                       | B, BL                         |
//! | 11x        | Coprocessor                  | not executed                  |
//! | 1111       | Software interrupt           | SWI                           |
//!
//! With condition `1111`: CPS, SETEND, PLD, SRS, RFE and BLX (immediate).
//!
//! ## Submodules
//!
//! - [`instructions`] - decoding (`TryFrom<u32>`) and disassembly
//! - [`alu_instruction`] - the sixteen data-processing opcodes
//! - the remaining modules add executor methods to
//!   [`Arm11`](crate::cpu::Arm11)

pub mod alu_instruction;

#[allow(clippy::similar_names)]
mod block_transfer;
mod branch;

#[allow(clippy::cast_possible_truncation)]
mod data_processing;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::similar_names)]
pub mod instructions;
mod miscellaneous;

#[allow(clippy::similar_names)]
mod multiply;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::similar_names)]
mod single_transfer;
mod unconditional;
