//! Membership over a dense range of hash values with cheap resets.
//!
//! Each slot stores the generation in which it was last marked. A reset only bumps the current
//! generation, so every slot becomes logically unmarked at once. When the generation counter wraps
//! around, the slots are cleared for real and counting starts over.

use super::error::Error;
use alloc::vec::Vec;
use log::debug;

/// A set of values in `0..=max_value`, reset in amortized O(1).
#[derive(Clone, Debug)]
pub struct PresenceSet {
    /// Per-value generation of the last mark. Zero is never a live generation.
    generations: Vec<u8>,

    /// Generation of the current sweep. Never zero.
    current: u8,
}

impl PresenceSet {
    /// Allocate a set for values `0..=max_value`, all unmarked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the backing array cannot be allocated.
    #[inline]
    pub fn try_new(max_value: usize) -> Result<Self, Error> {
        let allocation_failed = Error::Allocation {
            what: "presence set",
        };
        let len = max_value
            .checked_add(1)
            .ok_or_else(|| allocation_failed.clone())?;
        let mut generations = Vec::new();
        generations
            .try_reserve_exact(len)
            .map_err(|_| allocation_failed)?;
        generations.resize(len, 0);
        Ok(Self {
            generations,
            current: 1,
        })
    }

    /// Largest value the set can hold.
    #[inline]
    #[must_use]
    pub const fn max_value(&self) -> usize {
        self.generations.len().saturating_sub(1)
    }

    /// Mark `value`, returning whether it was already marked since the last reset.
    ///
    /// # Panics
    ///
    /// Panics if `value > max_value()`.
    #[inline]
    pub fn find_and_mark(&mut self, value: usize) -> bool {
        let slot = &mut self.generations[value];
        if *slot == self.current {
            true
        } else {
            *slot = self.current;
            false
        }
    }

    /// Unmark every value.
    #[inline]
    pub fn reset(&mut self) {
        self.current = self.current.wrapping_add(1);
        if self.current == 0 {
            self.generations.fill(0);
            self.current = 1;
            debug!(
                "presence set generation wrapped, cleared {} slots",
                self.generations.len(),
            );
        }
    }
}
