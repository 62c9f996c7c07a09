//! Functionality for AES in fixed-key mode.

use crate::block::Block;
use aes::cipher::crypto_common::Block as AesBlock;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use rand::{thread_rng, Rng};

/// Fixed-key AES as a keyed random permutation over 128 bit blocks.
///
/// Implements the correlation robust hash function `pi(x) ^ x` from [Guo et
/// al. (ePrint 2019/074)](https://eprint.iacr.org/2019/074).  The expanded
/// round keys are immutable after construction, so an instance can be shared
/// across threads.
#[derive(Clone, Debug)]
pub struct FixedKeyAes {
    /// AES object including expanded key.
    aes: Aes128,
}

impl FixedKeyAes {
    /// The compiled-in key used by all scheme instances.  Both parties must
    /// run the same permutation, so this value is part of the wire format.
    const FIXED_KEY: [u8; 16] = 0x4247_1337_c0ff_eeee_d5c2_9a6b_0e83_f174_u128.to_le_bytes();

    /// Create a new instance with a given key.
    pub fn new(key: [u8; 16]) -> Self {
        Self {
            aes: Aes128::new_from_slice(&key).expect("does not fail since key has the right size"),
        }
    }

    /// Create a new instance with the compiled-in fixed key.
    pub fn with_fixed_key() -> Self {
        Self::new(Self::FIXED_KEY)
    }

    /// Create a new instance with a randomly sampled key.
    pub fn sample() -> Self {
        let key: [u8; 16] = thread_rng().gen();
        Self::new(key)
    }

    /// Random permutation `pi(x) = AES(k, x)`.
    #[inline(always)]
    pub fn pi(&self, x: u128) -> u128 {
        let mut block = AesBlock::<Aes128>::clone_from_slice(&x.to_le_bytes());
        self.aes.encrypt_block(&mut block);
        u128::from_le_bytes(
            block
                .as_slice()
                .try_into()
                .expect("does not fail since block is 16 bytes long"),
        )
    }

    /// The permutation applied to a tree node.
    #[inline(always)]
    pub fn permute(&self, x: Block) -> Block {
        Block::new(self.pi(x.value()))
    }

    /// MMO function `pi(x) ^ x`.
    #[inline(always)]
    pub fn hash_cr(&self, x: Block) -> Block {
        self.permute(x) ^ x
    }
}
