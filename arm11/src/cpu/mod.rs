#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
pub mod alu;
pub mod arm;

#[allow(clippy::module_name_repetitions)]
pub mod arm11;
pub mod condition;
pub mod cpu_modes;
pub mod exception;
pub mod flags;
pub mod psr;
pub mod register_set;

pub use arm11::{Arm11, CoreSnapshot};
pub use cpu_modes::Mode;
pub use exception::Exception;
pub use psr::{ExecutionState, Psr};
