//! Keywords and the characters the hash function reads from them.
//!
//! A keyword is reduced to its *signature*: the sorted set of distinct bytes found at the chosen
//! [`KeyPositions`]. Signatures are computed once, when the keyword list is built, and never
//! change afterwards.

use super::error::KeyPositionsError;
use alloc::{
    borrow::Cow,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt;
use core::str::FromStr;

/// Largest position that can be named in a [`KeyPositions`] list.
pub const MAX_KEY_POSITION: usize = 255;

/// Number of distinct byte values, and hence the longest possible signature.
pub const MAX_SIGNATURE_LEN: usize = 256;

/// The character domain of the occurrence and associated-value tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum Alphabet {
    /// Bytes `0x00..=0x7f`.
    SevenBit,
    /// All bytes.
    #[default]
    EightBit,
}

impl Alphabet {
    /// Number of characters in the alphabet.
    #[inline]
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::SevenBit => 128,
            Self::EightBit => 256,
        }
    }

    /// Whether `byte` belongs to the alphabet.
    #[inline]
    #[must_use]
    pub const fn contains(self, byte: u8) -> bool {
        match self {
            Self::SevenBit => byte < 0x80,
            Self::EightBit => true,
        }
    }
}

/// Which characters of a keyword participate in the hash.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum KeyPositions {
    /// Every character of the keyword.
    All,
    /// A fixed selection of characters.
    Selected {
        /// 1-based positions, ascending and without repetitions. Positions past the end of a
        /// keyword are skipped for that keyword.
        positions: Vec<u8>,
        /// Whether the last character of the keyword is read too.
        last: bool,
    },
}

impl Default for KeyPositions {
    /// The first and the last character.
    #[inline]
    fn default() -> Self {
        Self::Selected {
            positions: alloc::vec![1],
            last: true,
        }
    }
}

impl KeyPositions {
    /// Compute the signature of `key`.
    #[inline]
    #[must_use]
    pub fn signature(&self, key: &[u8]) -> Signature {
        let mut chars: Vec<u8> = match self {
            Self::All => key.to_vec(),
            Self::Selected { positions, last } => positions
                .iter()
                .filter_map(|&position| {
                    let index = usize::from(position).checked_sub(1)?;
                    key.get(index).copied()
                })
                .chain(key.last().copied().filter(|_| *last))
                .collect(),
        };
        chars.sort_unstable();
        chars.dedup();
        Signature(chars)
    }
}

impl FromStr for KeyPositions {
    type Err = KeyPositionsError;

    /// Parse `*` or a comma-separated list of positions, `a-b` ranges and `$`.
    #[inline]
    fn from_str(text: &str) -> Result<Self, KeyPositionsError> {
        let text = text.trim();
        if text == "*" {
            return Ok(Self::All);
        }
        if text.is_empty() {
            return Err(KeyPositionsError::Empty);
        }

        let mut positions = Vec::new();
        let mut last = false;
        for piece in text.split(',').map(str::trim) {
            if piece == "$" {
                last = true;
            } else if let Some((start, end)) = piece.split_once('-') {
                let (start, end) = (parse_position(start)?, parse_position(end)?);
                if start > end {
                    return Err(KeyPositionsError::BadRange {
                        start: start.into(),
                        end: end.into(),
                    });
                }
                positions.extend(start..=end);
            } else {
                positions.push(parse_position(piece)?);
            }
        }
        positions.sort_unstable();
        positions.dedup();
        Ok(Self::Selected { positions, last })
    }
}

/// Parse a single 1-based position.
fn parse_position(text: &str) -> Result<u8, KeyPositionsError> {
    let text = text.trim();
    let position: usize = text.parse().map_err(|_| KeyPositionsError::InvalidNumber {
        text: text.to_string(),
    })?;
    match u8::try_from(position) {
        Ok(position) if position >= 1 => Ok(position),
        _ => Err(KeyPositionsError::OutOfRange { position }),
    }
}

impl fmt::Display for KeyPositions {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Selected { positions, last } => {
                let mut separator = "";
                for position in positions {
                    write!(f, "{separator}{position}")?;
                    separator = ",";
                }
                if *last {
                    write!(f, "{separator}$")?;
                }
                Ok(())
            }
        }
    }
}

/// The ordered, duplicate-free set of bytes a keyword exposes to the hash function.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// The bytes, ascending.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of distinct bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no byte of the keyword is read.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lossily decoded text, for diagnostics.
    #[inline]
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

/// One line of input: the keyword and whatever followed it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct Entry {
    /// The literal key.
    pub key: Vec<u8>,
    /// Payload after the first comma, passed through untouched.
    pub rest: String,
}

impl Entry {
    /// Create an entry without payload.
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            rest: String::new(),
        }
    }

    /// Split an input line into keyword and payload.
    ///
    /// Blank lines and `#` comments yield `None`. The keyword ends at the first comma.
    #[inline]
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || line.starts_with('#') {
            return None;
        }
        let (key, rest) = line.split_once(',').unwrap_or((line, ""));
        Some(Self {
            key: key.as_bytes().to_vec(),
            rest: rest.to_string(),
        })
    }
}

/// An input keyword with its precomputed signature.
#[derive(Clone, Debug)]
pub struct Keyword {
    /// The literal key.
    key: Vec<u8>,
    /// Opaque payload.
    rest: String,
    /// Bytes read by the hash function.
    signature: Signature,
    /// Position in the input, counting from zero.
    position: usize,
}

impl Keyword {
    /// Create a keyword, computing its signature from `key_positions`.
    #[inline]
    #[must_use]
    pub fn new(entry: Entry, key_positions: &KeyPositions, position: usize) -> Self {
        let signature = key_positions.signature(&entry.key);
        Self {
            key: entry.key,
            rest: entry.rest,
            signature,
            position,
        }
    }

    /// The literal key.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Lossily decoded key, for diagnostics and reports.
    #[inline]
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }

    /// Length of the key in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.key.len()
    }

    /// Whether the key is empty. Such keywords are rejected when building a list.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.key.is_empty()
    }

    /// The payload that followed the keyword in the input.
    #[inline]
    #[must_use]
    pub fn rest(&self) -> &str {
        &self.rest
    }

    /// The bytes read by the hash function.
    #[inline]
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Position in the input, counting from zero.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }
}
