use serde::{Deserialize, Serialize};

/// Base address of the exception vector table when high vectors are enabled.
pub const HIGH_VECTORS_BASE: u32 = 0xFFFF_0000;

/// Static parameters for building an [`Arm11`](crate::cpu::Arm11).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Size of the flat RAM in bytes.
    pub memory_size: usize,

    /// Place the exception vectors at `0xFFFF0000` instead of `0x00000000`.
    pub high_vectors: bool,

    /// Program counter to use after reset instead of the reset vector.
    pub reset_pc: Option<u32>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            memory_size: 0x0010_0000,
            high_vectors: false,
            reset_pc: None,
        }
    }
}

impl CoreConfig {
    #[must_use]
    pub const fn vector_base(&self) -> u32 {
        if self.high_vectors {
            HIGH_VECTORS_BASE
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn vector_base_follows_high_vectors() {
        let mut config = CoreConfig::default();
        assert_eq!(config.vector_base(), 0);

        config.high_vectors = true;
        assert_eq!(config.vector_base(), HIGH_VECTORS_BASE);
    }
}
