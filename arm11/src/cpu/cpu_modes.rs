use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Number of bank slots: one shared by User and System, one per exception mode.
pub const BANK_SLOTS: usize = 6;

/// Slot holding the User/System copy of R8-R14.
pub const SHARED_SLOT: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// The normal program execution mode.
    User = 0b10000,

    /// Fast interrupt, banks R8-R14.
    Fiq = 0b10001,

    /// General-purpose interrupt handling.
    Irq = 0b10010,

    /// Protected mode for the operating system, entered on reset and SWI.
    Supervisor = 0b10011,

    /// Entered after a data or instruction prefetch abort.
    Abort = 0b10111,

    /// Entered when an undefined instruction is executed.
    Undefined = 0b11011,

    /// Privileged mode sharing the User register view.
    System = 0b11111,
}

/// Which registers a mode keeps privately and where they live.
///
/// Registers `first..=14` are owned by `slot`; everything in R8-R14 below
/// `first` comes from [`SHARED_SLOT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankLayout {
    pub slot: usize,
    pub first: usize,
    pub count: usize,
}

impl BankLayout {
    /// Slot owning `index` (8..=14) while this layout is active.
    #[must_use]
    pub const fn owner(self, index: usize) -> usize {
        if index >= self.first && index < self.first + self.count {
            self.slot
        } else {
            SHARED_SLOT
        }
    }
}

impl Mode {
    #[must_use]
    pub const fn bank_layout(self) -> BankLayout {
        let (slot, first, count) = match self {
            Self::User | Self::System => (SHARED_SLOT, 8, 7),
            Self::Fiq => (1, 8, 7),
            Self::Irq => (2, 13, 2),
            Self::Supervisor => (3, 13, 2),
            Self::Abort => (4, 13, 2),
            Self::Undefined => (5, 13, 2),
        };
        BankLayout { slot, first, count }
    }

    #[must_use]
    pub const fn has_spsr(self) -> bool {
        !matches!(self, Self::User | Self::System)
    }

    #[must_use]
    pub const fn is_privileged(self) -> bool {
        !matches!(self, Self::User)
    }
}

impl From<Mode> for u32 {
    fn from(m: Mode) -> Self {
        m as Self
    }
}

impl TryFrom<u32> for Mode {
    type Error = CoreError;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        match n & 0b11111 {
            0b10000 => Ok(Self::User),
            0b10001 => Ok(Self::Fiq),
            0b10010 => Ok(Self::Irq),
            0b10011 => Ok(Self::Supervisor),
            0b10111 => Ok(Self::Abort),
            0b11011 => Ok(Self::Undefined),
            0b11111 => Ok(Self::System),
            bits => Err(CoreError::InvalidMode { bits }),
        }
    }
}
