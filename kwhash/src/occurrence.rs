//! Per-character occurrence counts.

use super::keyword::{Alphabet, Signature};
use alloc::{vec, vec::Vec};

/// How many signatures contain each character.
///
/// Computed once from every signature in the keyword list and read-only afterwards. Used to decide
/// which characters to perturb first when repairing a collision, and to order keywords.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Occurrences {
    /// Count per character. Has [`Alphabet::size`] entries.
    counts: Vec<usize>,
}

impl Occurrences {
    /// Count characters over `signatures`.
    ///
    /// # Panics
    ///
    /// Panics if a signature contains a character outside `alphabet`.
    #[inline]
    #[must_use]
    #[expect(
        clippy::arithmetic_side_effects,
        reason = "a count never exceeds the number of signatures"
    )]
    pub fn from_signatures<'a>(
        alphabet: Alphabet,
        signatures: impl IntoIterator<Item = &'a Signature>,
    ) -> Self {
        let mut counts = vec![0; alphabet.size()];
        for signature in signatures {
            for &c in signature.as_bytes() {
                counts[usize::from(c)] += 1;
            }
        }
        Self { counts }
    }

    /// Number of signatures containing `c`.
    #[inline]
    #[must_use]
    pub fn get(&self, c: u8) -> usize {
        self.counts.get(usize::from(c)).copied().unwrap_or(0)
    }

    /// Sum of the counts of a signature's characters.
    #[inline]
    #[must_use]
    pub fn score(&self, signature: &Signature) -> usize {
        signature.as_bytes().iter().map(|&c| self.get(c)).sum()
    }

    /// Characters that occur at least once, with their counts.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        (0..=u8::MAX)
            .zip(self.counts.iter().copied())
            .filter(|&(_, count)| count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyword::KeyPositions;
    use alloc::vec::Vec;

    #[test]
    fn counts_signatures_not_bytes() {
        let signatures: Vec<Signature> = [&b"banana"[..], b"bread", b"nab"]
            .iter()
            .map(|key| KeyPositions::All.signature(key))
            .collect();
        let occurrences = Occurrences::from_signatures(Alphabet::EightBit, &signatures);
        assert_eq!(occurrences.get(b'a'), 3);
        assert_eq!(occurrences.get(b'b'), 3);
        assert_eq!(occurrences.get(b'n'), 2);
        assert_eq!(occurrences.get(b'r'), 1);
        assert_eq!(occurrences.get(b'z'), 0);
        assert_eq!(occurrences.score(&signatures[2]), 8);
        assert_eq!(
            occurrences.iter().collect::<Vec<_>>(),
            [
                (b'a', 3),
                (b'b', 3),
                (b'd', 1),
                (b'e', 1),
                (b'n', 2),
                (b'r', 1),
            ]
        );
    }
}
