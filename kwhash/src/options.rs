//! Search configuration.

use super::{
    error::Error,
    keyword::{Alphabet, KeyPositions},
    seed::Seed,
};
use log::warn;

/// Jump used unless configured otherwise.
pub const DEFAULT_JUMP: usize = 5;

/// Everything that shapes a search.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
#[expect(
    clippy::struct_excessive_bools,
    reason = "independent switches, mirrored by command-line flags"
)]
pub struct Options {
    /// Characters of each keyword read by the hash function.
    pub key_positions: KeyPositions,

    /// Whether the keyword length is added to the hash.
    pub include_length: bool,

    /// Whether keywords with equal hash values are acceptable.
    ///
    /// If unset, keywords with identical signatures and collisions left after the search are
    /// fatal.
    pub allow_duplicates: bool,

    /// Whether to reorder keywords by occurrence before searching.
    pub reorder: bool,

    /// Whether to start from random associated values instead of [`initial_value`](Self::initial_value).
    pub random: bool,

    /// Seed for random associated values and random jumps.
    pub seed: Seed,

    /// Starting associated value of every character, masked into range.
    pub initial_value: usize,

    /// Step added to an associated value on every repair trial. Zero picks a random step per
    /// trial. Even values are bumped to the next odd one.
    pub jump: usize,

    /// Size of the associated-value range relative to the keyword count.
    pub size_multiple: SizeMultiple,

    /// Number of trials per character when repairing a collision.
    pub trial_budget: TrialBudget,

    /// Character domain.
    pub alphabet: Alphabet,
}

impl Default for Options {
    #[inline]
    fn default() -> Self {
        Self {
            key_positions: KeyPositions::default(),
            include_length: true,
            allow_duplicates: false,
            reorder: false,
            random: false,
            seed: Seed::default(),
            initial_value: 0,
            jump: DEFAULT_JUMP,
            size_multiple: SizeMultiple::default(),
            trial_budget: TrialBudget::default(),
            alphabet: Alphabet::default(),
        }
    }
}

impl Options {
    /// The jump actually used by the search.
    ///
    /// Adding an odd step modulo a power of two visits every residue before repeating one, so even
    /// jumps are rounded up.
    #[inline]
    #[must_use]
    pub fn effective_jump(&self) -> usize {
        if self.jump != 0 && self.jump.is_multiple_of(2) {
            let odd = self.jump | 1;
            warn!("jump {} must be odd, adjusting to {odd}", self.jump);
            odd
        } else {
            self.jump
        }
    }
}

/// Size of the associated-value range, `asso_max`, relative to the keyword count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum SizeMultiple {
    /// `n` times the keyword count; zero means exactly the keyword count.
    Times(usize),
    /// The keyword count divided by `n`.
    DividedBy(usize),
}

impl Default for SizeMultiple {
    #[inline]
    fn default() -> Self {
        Self::Times(1)
    }
}

impl SizeMultiple {
    /// Compute `asso_max` for `keyword_count` keywords: the scaled count rounded up to a power of
    /// two.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HashRangeTooLarge`] if the result overflows.
    #[inline]
    pub fn asso_max(self, keyword_count: usize) -> Result<usize, Error> {
        let scaled = match self {
            Self::Times(0) => Some(keyword_count),
            Self::Times(n) => keyword_count.checked_mul(n),
            Self::DividedBy(n) => keyword_count.checked_div(n.max(1)),
        };
        scaled
            .and_then(|scaled| scaled.max(1).checked_next_power_of_two())
            .ok_or(Error::HashRangeTooLarge)
    }
}

/// How many values to try per character when repairing a collision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum TrialBudget {
    /// Every associated value, `asso_max` trials.
    #[default]
    Full,
    /// A fixed number of trials. Zero means [`KeywordCount`](Self::KeywordCount).
    Iterations(usize),
    /// As many trials as there are keywords.
    KeywordCount,
}

impl TrialBudget {
    /// Resolve the number of trials.
    #[inline]
    #[must_use]
    pub const fn trials(self, asso_max: usize, keyword_count: usize) -> usize {
        match self {
            Self::Full => asso_max,
            Self::Iterations(0) | Self::KeywordCount => keyword_count,
            Self::Iterations(n) => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asso_max_is_a_power_of_two() {
        assert_eq!(SizeMultiple::Times(0).asso_max(100), Ok(128));
        assert_eq!(SizeMultiple::Times(1).asso_max(100), Ok(128));
        assert_eq!(SizeMultiple::Times(8).asso_max(100), Ok(1024));
        assert_eq!(SizeMultiple::Times(1).asso_max(64), Ok(64));
        assert_eq!(SizeMultiple::DividedBy(3).asso_max(100), Ok(64));
        assert_eq!(SizeMultiple::DividedBy(1000).asso_max(100), Ok(1));
        assert_eq!(SizeMultiple::Times(3).asso_max(1), Ok(4));
        assert_eq!(
            SizeMultiple::Times(usize::MAX).asso_max(2),
            Err(Error::HashRangeTooLarge)
        );
        for count in 1..300 {
            for multiple in [SizeMultiple::Times(2), SizeMultiple::DividedBy(2)] {
                assert!(multiple.asso_max(count).unwrap().is_power_of_two());
            }
        }
    }

    #[test]
    fn jump_is_forced_odd() {
        let mut options = Options::default();
        assert_eq!(options.effective_jump(), 5);
        options.jump = 4;
        assert_eq!(options.effective_jump(), 5);
        options.jump = 0;
        assert_eq!(options.effective_jump(), 0);
    }

    #[test]
    fn trial_budget() {
        assert_eq!(TrialBudget::Full.trials(64, 10), 64);
        assert_eq!(TrialBudget::Iterations(7).trials(64, 10), 7);
        assert_eq!(TrialBudget::Iterations(0).trials(64, 10), 10);
        assert_eq!(TrialBudget::KeywordCount.trials(64, 10), 10);
    }
}
