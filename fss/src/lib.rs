//! Function secret sharing via two-party distributed point functions (DPFs).
//!
//! A point function is a function `f` that is specified by two values
//! `(alpha, beta)` such that `f(alpha) = beta` and `f(x) = 0` for all other
//! inputs `x`.
//!
//! A distributed point function scheme takes the description of a point
//! function and outputs two keys `k_0, k_1`.  Each key can be evaluated
//! independently at any input `x` to obtain an additive share of the
//! function's value: `eval(k_0, x) + eval(k_1, x) = f(x)` modulo
//! `2^range_bits` for all `x`, while neither key alone reveals `alpha` or
//! `beta`.  Applications include private information retrieval, secure
//! aggregation, and oblivious lookups.
//!
//! The scheme implemented here is the GGM-tree construction of Boyle,
//! Gilboa, and Ishai ([ePrint 2018/707](https://eprint.iacr.org/2018/707),
//! Figure 1), with range packing: several range values are packed into each
//! leaf, which shortens the tree and speeds up full-domain evaluation.

#![warn(missing_docs)]

pub mod bgi1;
mod codec;
pub mod error;
pub mod reduce;

pub use bgi1::{Bgi1, CorrectionWord, Key, PackEvalCache};
pub use error::Error;
pub use reduce::{eval_all_dot, eval_all_sum};
