//! Flat memory seen by the core.
//!
//! All accesses are little-endian and bounds-checked: an access that does not
//! fit entirely inside the device fails with [`CoreError::OutOfBounds`]
//! instead of touching anything.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A byte-addressable device the core can fetch from and load/store to.
///
/// Only the byte accessors and [`capacity`](Self::capacity) are required; the
/// wider accessors are composed from bytes in little-endian order. Devices
/// backed by contiguous storage should override them.
pub trait MemoryDevice {
    fn capacity(&self) -> usize;

    fn read_byte(&self, address: u32) -> CoreResult<u8>;

    fn write_byte(&mut self, address: u32, value: u8) -> CoreResult<()>;

    fn read_half_word(&self, address: u32) -> CoreResult<u16> {
        let low = self.read_byte(address)?;
        let high = self.read_byte(address.wrapping_add(1))?;
        Ok(u16::from_le_bytes([low, high]))
    }

    fn read_word(&self, address: u32) -> CoreResult<u32> {
        let low = self.read_half_word(address)?;
        let high = self.read_half_word(address.wrapping_add(2))?;
        Ok(u32::from(low) | (u32::from(high) << 16))
    }

    fn write_half_word(&mut self, address: u32, value: u16) -> CoreResult<()> {
        let [low, high] = value.to_le_bytes();
        self.write_byte(address, low)?;
        self.write_byte(address.wrapping_add(1), high)
    }

    fn write_word(&mut self, address: u32, value: u32) -> CoreResult<()> {
        for (offset, byte) in (0..).zip(value.to_le_bytes()) {
            self.write_byte(address.wrapping_add(offset), byte)?;
        }
        Ok(())
    }
}

/// Zero-initialized RAM of a fixed size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ram {
    data: Box<[u8]>,
}

impl Ram {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size].into_boxed_slice(),
        }
    }

    /// Copies `bytes` into RAM starting at `address`.
    ///
    /// # Errors
    ///
    /// Fails without writing anything if the image does not fit.
    pub fn load(&mut self, address: u32, bytes: &[u8]) -> CoreResult<()> {
        let range = self.range(address, bytes.len())?;
        self.data[range].copy_from_slice(bytes);
        Ok(())
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn range(&self, address: u32, width: usize) -> CoreResult<std::ops::Range<usize>> {
        let start = address as usize;
        start
            .checked_add(width)
            .filter(|end| *end <= self.data.len())
            .map(|end| start..end)
            .ok_or(CoreError::OutOfBounds {
                address,
                width: u32::try_from(width).unwrap_or(u32::MAX),
                capacity: self.data.len(),
            })
    }

    fn bytes<const N: usize>(&self, address: u32) -> CoreResult<[u8; N]> {
        let range = self.range(address, N)?;
        let mut out = [0; N];
        out.copy_from_slice(&self.data[range]);
        Ok(out)
    }

    fn put_bytes<const N: usize>(&mut self, address: u32, bytes: [u8; N]) -> CoreResult<()> {
        let range = self.range(address, N)?;
        self.data[range].copy_from_slice(&bytes);
        Ok(())
    }
}

impl MemoryDevice for Ram {
    fn capacity(&self) -> usize {
        self.data.len()
    }

    fn read_byte(&self, address: u32) -> CoreResult<u8> {
        self.bytes::<1>(address).map(|[b]| b)
    }

    fn write_byte(&mut self, address: u32, value: u8) -> CoreResult<()> {
        self.put_bytes(address, [value])
    }

    fn read_half_word(&self, address: u32) -> CoreResult<u16> {
        self.bytes(address).map(u16::from_le_bytes)
    }

    fn read_word(&self, address: u32) -> CoreResult<u32> {
        self.bytes(address).map(u32::from_le_bytes)
    }

    fn write_half_word(&mut self, address: u32, value: u16) -> CoreResult<()> {
        self.put_bytes(address, value.to_le_bytes())
    }

    fn write_word(&mut self, address: u32, value: u32) -> CoreResult<()> {
        self.put_bytes(address, value.to_le_bytes())
    }
}
