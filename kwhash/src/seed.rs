//! Seeds for the randomized parts of the search.

use rapidhash::RapidRng;

/// A random seed.
///
/// Random initialisation of associated values and random jumps both draw from a [`RapidRng`]
/// created from this seed, so a run is reproducible given its seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Seed(u64);

impl Default for Seed {
    #[inline]
    fn default() -> Self {
        // Hexadecimal digits of pi - 3
        Self(0x243f_6a88_85a3_08d3)
    }
}

impl Seed {
    /// Wrap a raw seed.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw seed.
    #[inline]
    #[must_use]
    pub const fn get_u64(self) -> u64 {
        self.0
    }

    /// Create the generator this seed stands for.
    #[inline]
    #[must_use]
    pub fn rng(self) -> RapidRng {
        RapidRng::new(self.0)
    }

    /// Iterate through pseudo-random seeds, starting after `self`.
    ///
    /// Meant for callers that retry a failed randomized search. The returned values are
    /// deterministic.
    #[inline]
    pub fn iter(self) -> impl Iterator<Item = Self> {
        let mut rng = self.rng();
        core::iter::repeat_with(move || Self(rng.next()))
    }
}
