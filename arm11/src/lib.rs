//! An ARM11 (ARMv6) core: registers, decoder, executors and exception entry,
//! driven one instruction at a time over a [`MemoryDevice`].
//!
//! ```no_run
//! use arm11::{Arm11, CoreConfig, MemoryDevice};
//!
//! let mut core = Arm11::with_config(CoreConfig::default());
//! // MOV R0, #42 ; B .
//! core.memory_mut().write_word(0x0, 0xE3A0_002A).unwrap();
//! core.memory_mut().write_word(0x4, 0xEAFF_FFFE).unwrap();
//! core.reset();
//! core.run(100).unwrap();
//! assert_eq!(core.registers().read(0), 42);
//! ```

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
pub mod bitwise;
pub mod config;
pub mod cpu;

#[allow(clippy::module_name_repetitions)]
pub mod error;

#[allow(clippy::cast_possible_truncation)]
pub mod memory;

pub use config::CoreConfig;
pub use cpu::{Arm11, CoreSnapshot, Exception, ExecutionState, Mode, Psr};
pub use error::{CoreError, CoreResult};
pub use memory::{MemoryDevice, Ram};
