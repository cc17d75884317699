use std::ops::RangeInclusive;

/// Bit-level helpers used when pulling fields out of instruction words and
/// status registers. Bit indices go from lsb (0) to msb.
pub trait Bits: Copy {
    /// Width of the implementing type in bits.
    const WIDTH: u8;

    fn get_bit(self, bit_idx: u8) -> bool;

    fn set_bit(&mut self, bit_idx: u8, value: bool);

    /// Extracts `bits_range` (inclusive on both ends) and moves it down to bit 0.
    fn get_bits(self, bits_range: RangeInclusive<u8>) -> Self;

    fn get_byte(self, byte_nth: u8) -> u8;

    /// Interprets the low `number_of_bits` bits as a two's complement value
    /// and widens it to the full type.
    fn sign_extended(self, number_of_bits: u8) -> Self;
}

macro_rules! impl_bits {
    ($($ty:ty),*) => {$(
        impl Bits for $ty {
            const WIDTH: u8 = <$ty>::BITS as u8;

            fn get_bit(self, bit_idx: u8) -> bool {
                debug_assert!(bit_idx < Self::WIDTH);
                (self >> bit_idx) & 1 == 1
            }

            fn set_bit(&mut self, bit_idx: u8, value: bool) {
                debug_assert!(bit_idx < Self::WIDTH);
                if value {
                    *self |= 1 << bit_idx;
                } else {
                    *self &= !(1 << bit_idx);
                }
            }

            fn get_bits(self, bits_range: RangeInclusive<u8>) -> Self {
                let (start, end) = (*bits_range.start(), *bits_range.end());
                debug_assert!(start <= end && end < Self::WIDTH);
                let length = u32::from(end - start + 1);
                let mask = <$ty>::MAX.checked_shr(Self::BITS - length).unwrap_or(0);
                (self >> start) & mask
            }

            #[allow(clippy::cast_possible_truncation)]
            fn get_byte(self, byte_nth: u8) -> u8 {
                debug_assert!(byte_nth < Self::WIDTH / 8);
                (self >> (u32::from(byte_nth) * 8)) as u8
            }

            fn sign_extended(self, number_of_bits: u8) -> Self {
                debug_assert!(number_of_bits > 0 && number_of_bits <= Self::WIDTH);
                // Move the sign bit up to the msb, then let the arithmetic
                // shift drag it back down across the upper bits.
                let unused = u32::from(Self::WIDTH - number_of_bits);
                self.checked_shl(unused)
                    .map_or(self, |moved| (moved.cast_signed() >> unused).cast_unsigned())
            }
        }
    )*};
}

impl_bits!(u8, u16, u32, u64);
