//! Utilities shared by the function secret sharing crates.

#![warn(missing_docs)]

pub mod bits;
pub mod block;
pub mod buffered_rng;
pub mod fixed_key_aes;
