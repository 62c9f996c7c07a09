//! Error type shared by key generation, evaluation, parsing, and reductions.

use core::fmt;

/// Errors reported by the DPF scheme.
///
/// All parameter validation happens eagerly, before any cryptographic
/// computation starts: an operation either fails with one of these errors up
/// front or runs to completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A parameter failed validation: a zero count, a mismatched buffer
    /// length, or keys with differing parameters in a batch.
    InvalidArgument,
    /// Reserved for blob-level consumers of the wire format; never produced
    /// by this crate.
    NullPointer,
    /// `domain_bits` is zero or exceeds the wire format bound of 255.
    InvalidDomain,
    /// `range_bits` is zero or exceeds the wire format bound of 255.
    InvalidRange,
    /// The parameters are representable in the wire format but not supported
    /// by this implementation (both widths must be at most 64).
    UnsupportedDomainAndRange,
    /// A domain value does not fit in `domain_bits` bits, or the domain is
    /// too large to enumerate in memory.
    DomainOverflow,
    /// A range value does not fit in `range_bits` bits, or an output buffer
    /// element is too narrow for `range_bits`.
    RangeOverflow,
    /// A key blob failed a header or length check during parsing.
    MalformedKey,
    /// An unclassified failure, e.g. a panicked reduction worker.
    UnknownError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InvalidArgument => "invalid argument",
            Self::NullPointer => "null pointer",
            Self::InvalidDomain => "invalid number of domain bits",
            Self::InvalidRange => "invalid number of range bits",
            Self::UnsupportedDomainAndRange => "unsupported domain and range combination",
            Self::DomainOverflow => "value does not fit in the domain",
            Self::RangeOverflow => "value does not fit in the range",
            Self::MalformedKey => "malformed key blob",
            Self::UnknownError => "unknown error",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for Error {}
