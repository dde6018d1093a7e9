//! Keyword reordering ahead of the search.
//!
//! Keywords made of frequent characters go first. After that, as soon as every character of a
//! later keyword has been seen in an earlier one, that keyword is pulled forward: its hash value
//! is fully determined by now, so a collision involving it is best found early, while few
//! associated values have been committed to.

use super::{keyword::MAX_SIGNATURE_LEN, list::KeywordList};
use alloc::vec::Vec;
use core::cmp::Reverse;

/// Reorder the main sequence of `list` by occurrence.
///
/// Applying this twice yields the same order as applying it once.
#[inline]
pub fn reorder(list: &mut KeywordList) {
    let sorted = by_occurrence(list);
    list.relink(&sorted);

    let Some(mut current) = list.head() else {
        return;
    };
    let mut determined = [false; MAX_SIGNATURE_LEN];

    while let Some(following) = list.next(current) {
        for &c in list.record(current).keyword().signature().as_bytes() {
            determined[usize::from(c)] = true;
        }

        if !is_determined(&determined, list, following) {
            // Move every determined keyword after `following` right behind `current`, keeping
            // their relative order.
            let mut trail = following;
            while let Some(run) = list.next(trail) {
                if is_determined(&determined, list, run) {
                    list.set_next(trail, list.next(run));
                    list.set_next(run, list.next(current));
                    list.set_next(current, Some(run));
                    current = run;
                } else {
                    trail = run;
                }
            }
        }

        match list.next(current) {
            Some(next) => current = next,
            None => break,
        }
    }
}

/// Whether every character of `id`'s signature is marked in `determined`.
fn is_determined(determined: &[bool; MAX_SIGNATURE_LEN], list: &KeywordList, id: usize) -> bool {
    list.record(id)
        .keyword()
        .signature()
        .as_bytes()
        .iter()
        .all(|&c| determined[usize::from(c)])
}

/// Arena indices of the main sequence, sorted by descending occurrence score.
///
/// Ties are broken by input position rather than by the current order, so the result does not
/// depend on earlier reorderings.
fn by_occurrence(list: &KeywordList) -> Vec<usize> {
    let occurrences = list.occurrences();
    let mut order: Vec<usize> = list.ids().collect();
    order.sort_by_cached_key(|&id| {
        let keyword = list.record(id).keyword();
        (Reverse(occurrences.score(keyword.signature())), keyword.position())
    });
    order
}
