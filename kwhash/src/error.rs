//! Failures surfaced to the caller.
//!
//! Collisions that a single repair attempt cannot fix are not errors: they are counted and the
//! search carries on. Only configuration problems, allocation failures and duplicates the caller
//! refused to tolerate end up here.

use alloc::string::String;
use displaydoc::Display;
use thiserror::Error;

/// Malformed key-position list.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum KeyPositionsError {
    /// empty key-position list
    Empty,

    /// `{text}` is not a key position
    InvalidNumber {
        /// The offending piece of the list.
        text: String,
    },

    /// key position {position} is out of range, positions are 1 to 255
    OutOfRange {
        /// The rejected position.
        position: usize,
    },

    /// key-position range {start}-{end} is empty
    BadRange {
        /// First position of the range.
        start: usize,
        /// Last position of the range.
        end: usize,
    },
}

/// Fatal outcome of building a keyword list or searching for associated values.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// no keywords in the input
    NoKeywords,

    /// keyword #{position} is empty
    EmptyKeyword {
        /// Input position of the keyword, counting from zero.
        position: usize,
    },

    /// can't hash keyword {keyword:?} with the chosen key positions
    NoUsableCharacters {
        /// The keyword, lossily decoded.
        keyword: String,
    },

    /// keyword {keyword:?} contains byte {byte:#04x}, which is outside the 7-bit alphabet
    NonAsciiByte {
        /// The keyword, lossily decoded.
        keyword: String,
        /// The first byte above `0x7f`.
        byte: u8,
    },

    /// invalid key positions: {0}
    InvalidKeyPositions(#[from] KeyPositionsError),

    /// {count} input keys have identical hash inputs, e.g. {first:?} and {second:?} with key set {signature:?}; try different key positions or tolerate duplicates
    IdenticalSignatures {
        /// Number of keywords merged into another keyword's equivalence class.
        count: usize,
        /// Representative of the first offending class.
        first: String,
        /// Keyword merged into `first`.
        second: String,
        /// Their shared signature.
        signature: String,
    },

    /// hash range does not fit in `usize`; reduce the size multiple or the key positions
    HashRangeTooLarge,

    /// failed to allocate {what}
    Allocation {
        /// The structure that could not be allocated.
        what: &'static str,
    },

    /// duplicate hash value {hash} for {first:?} and {second:?} with key set {signature:?}; try a random search, different key positions or tolerate duplicates
    UnresolvedDuplicate {
        /// The shared hash value.
        hash: usize,
        /// The keyword that owned the hash value first.
        first: String,
        /// The keyword colliding with it.
        second: String,
        /// Key set of `second`.
        signature: String,
    },
}
