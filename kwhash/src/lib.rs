//! Associated-value search for keyword perfect hash functions.
//!
//! The hash of a keyword is the sum of one *associated value* per selected character, plus
//! optionally the keyword length:
//!
//! ```text
//! hash(keyword) = len(keyword) + asso[keyword[p1]] + asso[keyword[p2]] + ...
//! ```
//!
//! This crate searches for associated values under which a fixed set of keywords hashes without
//! collisions. The result is typically emitted as a lookup table by a code generator; emission is
//! left to the caller. Use [`generate`] for the whole pipeline, or the modules below to drive the
//! stages separately.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod error;
mod generator;
pub mod keyword;
pub mod list;
pub mod occurrence;
pub mod options;
pub mod ordering;
mod presence;
pub mod search;
mod seed;

pub use error::{Error, KeyPositionsError};
pub use generator::generate;
pub use options::{Options, SizeMultiple, TrialBudget};
pub use search::{AssociatedValues, SearchOutcome};
pub use seed::Seed;

#[cfg(test)]
mod tests;
