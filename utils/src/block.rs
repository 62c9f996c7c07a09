//! The 128 bit block type used as a GGM tree node.

use core::ops::{BitXor, BitXorAssign};
use rand::distributions::{Distribution, Standard};
use rand::Rng;

const MSB: u128 = 1 << 127;

/// A 128 bit tree node.
///
/// The most significant bit doubles as the control bit of the node; the
/// remaining 127 bits are PRG seed material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct Block(u128);

impl Block {
    /// Size of a block in bytes.
    pub const BYTES: usize = 16;
    /// Size of a block in bits.
    pub const BITS: u32 = 128;

    /// Create a block from a 128 bit value.
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Return the block as a 128 bit value.
    pub const fn value(self) -> u128 {
        self.0
    }

    /// Return the most significant bit.
    pub const fn msb(self) -> bool {
        self.0 & MSB != 0
    }

    /// Return a copy of the block with the most significant bit set to `bit`.
    pub const fn with_msb(self, bit: bool) -> Self {
        Self(self.0 & !MSB | (bit as u128) << 127)
    }

    /// Return a copy of the block with the most significant bit inverted.
    pub const fn flip_msb(self) -> Self {
        Self(self.0 ^ MSB)
    }

    /// Convert the block into its little-endian byte representation.
    pub const fn to_le_bytes(self) -> [u8; Self::BYTES] {
        self.0.to_le_bytes()
    }

    /// Create a block from its little-endian byte representation.
    pub const fn from_le_bytes(bytes: [u8; Self::BYTES]) -> Self {
        Self(u128::from_le_bytes(bytes))
    }
}

impl BitXor for Block {
    type Output = Self;
    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl BitXorAssign for Block {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl Distribution<Block> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Block {
        Block(rng.gen())
    }
}
