//! Bit-level cursor operations over byte buffers and integers.
//!
//! Bits in a byte buffer are addressed LSB-first: bit `i` of a buffer is bit
//! `i % 8` of byte `i / 8`.  This is the addressing used by the key wire
//! format for packed correction bits and sub-byte range values.

use num::PrimInt;

/// Number of bytes needed to store `bits` bits.
pub const fn bits_to_bytes(bits: usize) -> usize {
    bits / 8 + (bits % 8 != 0) as usize
}

/// Return bit `i` of `x`, where the LSB is bit 0.
///
/// `T` must be an unsigned integer type.
pub fn get_bit<T: PrimInt>(x: T, i: u32) -> bool {
    debug_assert!((i as usize) < 8 * core::mem::size_of::<T>());
    x >> i as usize & T::one() == T::one()
}

/// Return a mask with the `n` lowest bits set.
///
/// `T` must be an unsigned integer type and `n` at most its width.
pub fn low_mask<T: PrimInt>(n: u32) -> T {
    let width = 8 * core::mem::size_of::<T>() as u32;
    assert!(n <= width);
    if n == 0 {
        T::zero()
    } else {
        T::max_value() >> (width - n) as usize
    }
}

/// Read `n <= 64` bits from `buf` starting at bit offset `offset`.
///
/// Bit `k` of the result is bit `offset + k` of the buffer.  The addressed
/// range must lie within the buffer.
pub fn read_bits(buf: &[u8], offset: usize, n: u32) -> u64 {
    assert!(n <= 64);
    assert!(offset + n as usize <= 8 * buf.len());
    let mut x = 0u64;
    for k in 0..n as usize {
        let i = offset + k;
        let bit = buf[i / 8] >> (i % 8) & 1;
        x |= (bit as u64) << k;
    }
    x
}

/// Write the `n <= 64` low bits of `value` into `buf` starting at bit offset
/// `offset`.
///
/// Bit `offset + k` of the buffer is set to bit `k` of `value`.  The
/// addressed range must lie within the buffer.
pub fn write_bits(buf: &mut [u8], offset: usize, value: u64, n: u32) {
    assert!(n <= 64);
    assert!(offset + n as usize <= 8 * buf.len());
    for k in 0..n as usize {
        let i = offset + k;
        let mask = 1u8 << (i % 8);
        if value >> k & 1 != 0 {
            buf[i / 8] |= mask;
        } else {
            buf[i / 8] &= !mask;
        }
    }
}
