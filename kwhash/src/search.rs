//! The associated-value search.
//!
//! Keywords are hashed one by one in list order. When a keyword collides with an earlier one, the
//! characters the two signatures don't share are perturbed, least frequent first, until a value is
//! found under which every keyword up to the current one hashes with no more collisions than the
//! best seen so far. A perturbation is thus an improvement rather than a fix: it may move a
//! collision further down the list, where the main loop will meet it again.
//!
//! There is no completeness guarantee. Collisions that no single-character change improves stay
//! behind as duplicates, which the final validation either counts or reports as fatal.

#![expect(
    clippy::arithmetic_side_effects,
    reason = "hash values are bounded by the checked hash range"
)]

use super::{
    error::Error,
    keyword::{Alphabet, Keyword, MAX_SIGNATURE_LEN},
    list::{KeywordList, Record},
    occurrence::Occurrences,
    options::{Options, TrialBudget},
    presence::PresenceSet,
    seed::Seed,
};
use alloc::{vec, vec::Vec};
use core::cmp::Ordering;
use core::mem::MaybeUninit;
use fixed_slice_vec::FixedSliceVec;
use log::{debug, info, warn};
use rapidhash::RapidRng;

/// Per-character contributions to the hash.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssociatedValues {
    /// Value per character. Has [`Alphabet::size`] entries, each below `asso_max`.
    values: Vec<usize>,

    /// Exclusive bound on the values. A power of two.
    asso_max: usize,
}

impl AssociatedValues {
    /// Set every character to `value`, masked into `0..asso_max`.
    ///
    /// # Panics
    ///
    /// Panics if `asso_max` is not a power of two.
    #[inline]
    #[must_use]
    pub fn constant(alphabet: Alphabet, asso_max: usize, value: usize) -> Self {
        assert!(
            asso_max.is_power_of_two(),
            "asso_max must be a power of two",
        );
        Self {
            values: vec![value & (asso_max - 1); alphabet.size()],
            asso_max,
        }
    }

    /// Set every character to an independent pseudo-random value in `0..asso_max`.
    ///
    /// # Panics
    ///
    /// Panics if `asso_max` is not a power of two.
    #[inline]
    #[must_use]
    pub fn random(alphabet: Alphabet, asso_max: usize, rng: &mut RapidRng) -> Self {
        assert!(
            asso_max.is_power_of_two(),
            "asso_max must be a power of two",
        );
        Self {
            values: (0..alphabet.size())
                .map(|_| masked(rng.next(), asso_max))
                .collect(),
            asso_max,
        }
    }

    /// Exclusive bound on the values.
    #[inline]
    #[must_use]
    pub const fn asso_max(&self) -> usize {
        self.asso_max
    }

    /// The value of character `c`.
    ///
    /// # Panics
    ///
    /// Panics if `c` is outside the alphabet.
    #[inline]
    #[must_use]
    pub fn get(&self, c: u8) -> usize {
        self.values[usize::from(c)]
    }

    /// Hash `keyword` under these values.
    ///
    /// # Panics
    ///
    /// Panics if the signature of `keyword` contains a byte outside the alphabet, e.g. a byte
    /// above `0x7f` when the values were built for [`Alphabet::SevenBit`].
    #[inline]
    #[must_use]
    pub fn hash(&self, keyword: &Keyword, include_length: bool) -> usize {
        let length = if include_length { keyword.len() } else { 0 };
        keyword
            .signature()
            .as_bytes()
            .iter()
            .fold(length, |sum, &c| sum + self.get(c))
    }

    /// Iterate over `(character, value)` pairs.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        (0..=u8::MAX).zip(self.values.iter().copied())
    }

    /// Overwrite the value of `c`.
    #[inline]
    fn set(&mut self, c: u8, value: usize) {
        self.values[usize::from(c)] = value;
    }
}

/// Reduce a pseudo-random number into `0..asso_max`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "only the bits below asso_max are kept"
)]
const fn masked(random: u64, asso_max: usize) -> usize {
    random as usize & (asso_max - 1)
}

/// How associated values start out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum InitialValues {
    /// The same value for every character.
    Constant(usize),
    /// Independent pseudo-random values.
    Random,
}

/// Parameters of a single search.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct SearchParams {
    /// Exclusive bound on associated values. Must be a power of two.
    pub asso_max: usize,

    /// Step added on each repair trial. Zero draws a random step per trial. Non-zero values must
    /// be odd for trials to cover the whole range; [`search`] bumps even values by one.
    pub jump: usize,

    /// Trials per character when repairing a collision.
    pub trial_budget: TrialBudget,

    /// Starting associated values.
    pub initial: InitialValues,

    /// Whether the keyword length is added to the hash.
    pub include_length: bool,

    /// Whether collisions left after the search are acceptable.
    pub allow_duplicates: bool,
}

impl SearchParams {
    /// Derive parameters for a list of `keyword_count` keywords.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HashRangeTooLarge`] if `asso_max` overflows.
    #[inline]
    pub fn from_options(options: &Options, keyword_count: usize) -> Result<Self, Error> {
        Ok(Self {
            asso_max: options.size_multiple.asso_max(keyword_count)?,
            jump: options.effective_jump(),
            trial_budget: options.trial_budget,
            initial: if options.random {
                InitialValues::Random
            } else {
                InitialValues::Constant(options.initial_value)
            },
            include_length: options.include_length,
            allow_duplicates: options.allow_duplicates,
        })
    }
}

/// Result of a successful search.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// Keywords sorted by hash value, with final hash values and indices.
    keywords: KeywordList,

    /// The associated values found.
    asso_values: AssociatedValues,

    /// Whether the keyword length is part of the hash.
    include_length: bool,

    /// Collisions the search could not resolve.
    unresolved: usize,

    /// Shortest keyword, duplicates included.
    min_key_len: usize,

    /// Longest keyword, duplicates included.
    max_key_len: usize,

    /// Longest signature.
    max_signature_len: usize,

    /// Largest hash value of any keyword.
    max_hash_value: usize,
}

impl SearchOutcome {
    /// Keywords in emission order.
    #[inline]
    #[must_use]
    pub const fn keywords(&self) -> &KeywordList {
        &self.keywords
    }

    /// The associated values found.
    #[inline]
    #[must_use]
    pub const fn asso_values(&self) -> &AssociatedValues {
        &self.asso_values
    }

    /// Hash an arbitrary keyword with the associated values found.
    ///
    /// # Panics
    ///
    /// Panics if the signature of `keyword` contains a byte outside the alphabet the keywords
    /// were read with.
    #[inline]
    #[must_use]
    pub fn hash(&self, keyword: &Keyword) -> usize {
        self.asso_values.hash(keyword, self.include_length)
    }

    /// Whether the keyword length is part of the hash.
    #[inline]
    #[must_use]
    pub const fn include_length(&self) -> bool {
        self.include_length
    }

    /// Number of collisions the search left unresolved.
    #[inline]
    #[must_use]
    pub const fn unresolved(&self) -> usize {
        self.unresolved
    }

    /// Number of keywords merged into another keyword's equivalence class before searching.
    #[inline]
    #[must_use]
    pub const fn linked_duplicates(&self) -> usize {
        self.keywords.linked_duplicates()
    }

    /// Number of keywords sharing their hash value with another keyword.
    #[inline]
    #[must_use]
    pub const fn total_duplicates(&self) -> usize {
        self.unresolved + self.keywords.linked_duplicates()
    }

    /// Length of the shortest keyword.
    #[inline]
    #[must_use]
    pub const fn min_key_len(&self) -> usize {
        self.min_key_len
    }

    /// Length of the longest keyword.
    #[inline]
    #[must_use]
    pub const fn max_key_len(&self) -> usize {
        self.max_key_len
    }

    /// Number of characters in the longest signature.
    #[inline]
    #[must_use]
    pub const fn max_signature_len(&self) -> usize {
        self.max_signature_len
    }

    /// Largest hash value of any keyword.
    #[inline]
    #[must_use]
    pub const fn max_hash_value(&self) -> usize {
        self.max_hash_value
    }
}

/// Search for associated values under which `list` hashes without collisions.
///
/// `seed` feeds random initial values and random jumps; it is unused otherwise. An even non-zero
/// [`jump`](SearchParams::jump) is bumped to the next odd number.
///
/// # Errors
///
/// Fails if the hash range does not fit in memory, or if collisions remain while
/// [`allow_duplicates`](SearchParams::allow_duplicates) is unset.
///
/// # Panics
///
/// Panics if `params.asso_max` is not a power of two.
#[inline]
pub fn search(
    list: KeywordList,
    params: &SearchParams,
    seed: Seed,
) -> Result<SearchOutcome, Error> {
    let mut context = SearchContext::new(list, params, seed)?;
    context.run();
    let unresolved = context.validate(params.allow_duplicates)?;
    Ok(context.finish(unresolved))
}

/// Mutable state of one search.
struct SearchContext {
    /// The keywords. Hash values are updated in place.
    list: KeywordList,

    /// Arena indices of the main sequence, in list order.
    order: Vec<usize>,

    /// The table being searched for.
    asso_values: AssociatedValues,

    /// Collision detector, sized for the largest possible hash value.
    presence: PresenceSet,

    /// Source of random steps.
    rng: RapidRng,

    /// Fixed step, or zero for random steps.
    jump: usize,

    /// Trials per character.
    trials: usize,

    /// Whether the keyword length is part of the hash.
    include_length: bool,

    /// Collisions a perturbation must stay under to be accepted.
    fewest_collisions: usize,

    /// Longest signature in the main sequence.
    max_signature_len: usize,
}

impl SearchContext {
    /// Prepare a search: initial associated values and a presence set covering every reachable
    /// hash value.
    fn new(list: KeywordList, params: &SearchParams, seed: Seed) -> Result<Self, Error> {
        let mut rng = seed.rng();
        let asso_values = match params.initial {
            InitialValues::Constant(value) => {
                AssociatedValues::constant(list.alphabet(), params.asso_max, value)
            }
            InitialValues::Random => {
                AssociatedValues::random(list.alphabet(), params.asso_max, &mut rng)
            }
        };

        let max_signature_len = list
            .iter()
            .map(|record| record.keyword().signature().len())
            .max()
            .unwrap_or(0);
        let max_length_term = if params.include_length {
            list.iter()
                .map(|record| record.keyword().len())
                .max()
                .unwrap_or(0)
        } else {
            0
        };
        let max_hash_value = (params.asso_max - 1)
            .checked_mul(max_signature_len)
            .and_then(|sum| sum.checked_add(max_length_term))
            .ok_or(Error::HashRangeTooLarge)?;
        let presence = PresenceSet::try_new(max_hash_value)?;
        debug!("hash values range over 0..={}", presence.max_value());

        let order = list.ids().collect();
        let trials = params.trial_budget.trials(params.asso_max, list.len());

        let mut jump = params.jump;
        if jump.is_multiple_of(2) && jump != 0 {
            jump |= 1;
            warn!("jump must be odd, using {jump}");
        }

        Ok(Self {
            list,
            order,
            asso_values,
            presence,
            rng,
            jump,
            trials,
            include_length: params.include_length,
            fewest_collisions: 0,
            max_signature_len,
        })
    }

    /// Recompute and store the hash value of record `id`.
    fn rehash(&mut self, id: usize) -> usize {
        let hash = self
            .asso_values
            .hash(self.list.record(id).keyword(), self.include_length);
        self.list.set_hash_value(id, hash);
        hash
    }

    /// Hash every keyword in order, repairing each collision with an earlier keyword as it is
    /// found.
    fn run(&mut self) {
        for position in 0..self.order.len() {
            let hash = self.rehash(self.order[position]);
            let prior = self.order[..position]
                .iter()
                .position(|&id| self.list.record(id).hash_value() == hash);
            if let Some(prior) = prior {
                self.change(prior, position);
            }
        }
    }

    /// Repair a collision between the keywords at `prior` and `curr` (positions in `order`).
    ///
    /// If no character change is accepted, the keywords up to `curr` are rehashed under the
    /// current values and the collision stays.
    fn change(&mut self, prior: usize, curr: usize) {
        let (prior_id, curr_id) = (self.order[prior], self.order[curr]);
        let prior_keyword = self.list.record(prior_id).keyword();
        let curr_keyword = self.list.record(curr_id).keyword();
        debug!(
            "collision on keyword #{}, prior = {:?}, curr = {:?}, hash = {}",
            curr + 1,
            prior_keyword.text(),
            curr_keyword.text(),
            self.list.record(curr_id).hash_value(),
        );

        let mut storage = [MaybeUninit::<u8>::uninit(); MAX_SIGNATURE_LEN];
        let mut candidates = symmetric_difference(
            prior_keyword.signature().as_bytes(),
            curr_keyword.signature().as_bytes(),
            &mut storage,
        );
        sort_by_occurrence(candidates.as_mut_slice(), self.list.occurrences());

        self.fewest_collisions += 1;

        for (rank, &c) in candidates.iter().enumerate() {
            if let Some(trials) = self.try_character(c, curr) {
                debug!(
                    "resolved after {trials} trials by changing asso_value[{:?}] (char #{}) to {}",
                    char::from(c),
                    rank + 1,
                    self.asso_values.get(c),
                );
                return;
            }
        }

        for position in 0..=curr {
            self.rehash(self.order[position]);
        }
        debug!(
            "collision not resolved after {} trials, {} duplicates remain, continuing",
            self.trials,
            self.fewest_collisions + self.list.linked_duplicates(),
        );
    }

    /// Step the associated value of `c` through up to `trials` values, looking for one under
    /// which the keywords up to `curr` collide less than `fewest_collisions` times.
    ///
    /// On success, keeps the value, lowers `fewest_collisions` and returns the number of trials
    /// used. Otherwise restores the original value.
    fn try_character(&mut self, c: u8, curr: usize) -> Option<usize> {
        let original = self.asso_values.get(c);
        let asso_max = self.asso_values.asso_max();

        'trials: for trial in 1..=self.trials {
            let step = if self.jump == 0 {
                masked(self.rng.next(), asso_max)
            } else {
                self.jump
            };
            let value = self.asso_values.get(c).wrapping_add(step) & (asso_max - 1);
            self.asso_values.set(c, value);

            self.presence.reset();
            let mut collisions = 0;
            for position in 0..=curr {
                let hash = self.rehash(self.order[position]);
                if self.presence.find_and_mark(hash) {
                    collisions += 1;
                    if collisions >= self.fewest_collisions {
                        continue 'trials;
                    }
                }
            }

            self.fewest_collisions = collisions;
            return Some(trial);
        }

        self.asso_values.set(c, original);
        None
    }

    /// Rehash every keyword and count those whose hash value is already taken.
    fn validate(&mut self, allow_duplicates: bool) -> Result<usize, Error> {
        self.presence.reset();
        let mut unresolved = 0;
        for position in 0..self.order.len() {
            let id = self.order[position];
            let hash = self.rehash(id);
            if !self.presence.find_and_mark(hash) {
                continue;
            }
            if !allow_duplicates {
                let first = self.order[..position]
                    .iter()
                    .map(|&other| self.list.record(other))
                    .find(|record| record.hash_value() == hash)
                    .map(|record| record.keyword().text().into_owned())
                    .unwrap_or_default();
                let second = self.list.record(id).keyword();
                return Err(Error::UnresolvedDuplicate {
                    hash,
                    first,
                    second: second.text().into_owned(),
                    signature: second.signature().text().into_owned(),
                });
            }
            unresolved += 1;
        }

        if unresolved > 0 {
            warn!("{unresolved} keywords share their hash value, examine output carefully");
        }
        Ok(unresolved)
    }

    /// Sort the keywords by hash value and collect the summary.
    fn finish(mut self, unresolved: usize) -> SearchOutcome {
        self.list.sort_by_hash();

        let lengths = || self.list.all().map(|record| record.keyword().len());
        let min_key_len = lengths().min().unwrap_or(0);
        let max_key_len = lengths().max().unwrap_or(0);
        let max_hash_value = self
            .list
            .iter()
            .map(Record::hash_value)
            .max()
            .unwrap_or(0);

        info!(
            "{} keywords, asso_max {}, max hash value {}, {} duplicates",
            self.list.len() + self.list.linked_duplicates(),
            self.asso_values.asso_max(),
            max_hash_value,
            unresolved + self.list.linked_duplicates(),
        );

        SearchOutcome {
            keywords: self.list,
            asso_values: self.asso_values,
            include_length: self.include_length,
            unresolved,
            min_key_len,
            max_key_len,
            max_signature_len: self.max_signature_len,
            max_hash_value,
        }
    }
}

/// Characters in exactly one of two ascending, duplicate-free byte sets, ascending.
///
/// The result lives in `storage`, which must have room for every distinct byte.
fn symmetric_difference<'storage>(
    a: &[u8],
    b: &[u8],
    storage: &'storage mut [MaybeUninit<u8>],
) -> FixedSliceVec<'storage, u8> {
    let mut difference = FixedSliceVec::new(storage);
    let mut push = |c: u8| {
        let pushed = difference.try_push(c);
        debug_assert!(pushed.is_ok(), "more distinct bytes than storage");
    };

    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                push(a[i]);
                i += 1;
            }
            Ordering::Greater => {
                push(b[j]);
                j += 1;
            }
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    a[i..].iter().chain(&b[j..]).for_each(|&c| push(c));

    difference
}

/// Stable insertion sort by ascending occurrence count. The input is expected to be short.
fn sort_by_occurrence(chars: &mut [u8], occurrences: &Occurrences) {
    for i in 1..chars.len() {
        let c = chars[i];
        let mut j = i;
        while j > 0 && occurrences.get(c) < occurrences.get(chars[j - 1]) {
            chars[j] = chars[j - 1];
            j -= 1;
        }
        chars[j] = c;
    }
}
