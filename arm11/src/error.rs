use crate::cpu::Mode;

/// Everything that can stop the core.
///
/// None of these are transient: they describe an encoding the core does not
/// understand or an access the machine cannot satisfy, so the caller is
/// expected to stop stepping once one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("undefined instruction 0x{instruction:08X}")]
    Undefined { instruction: u32 },

    #[error("{class} instruction 0x{instruction:08X} is not implemented")]
    Unimplemented {
        instruction: u32,
        class: &'static str,
    },

    #[error("{width}-byte access at 0x{address:08X} is outside memory (capacity 0x{capacity:X})")]
    OutOfBounds {
        address: u32,
        width: u32,
        capacity: usize,
    },

    #[error("invalid mode bits 0b{bits:05b}")]
    InvalidMode { bits: u32 },

    #[error("{mode:?} mode has no SPSR")]
    NoSpsr { mode: Mode },

    #[error("thumb instruction 0x{instruction:04X} cannot be executed")]
    ThumbUnsupported { instruction: u16 },
}

pub type CoreResult<T> = Result<T, CoreError>;
