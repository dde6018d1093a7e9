//! End-to-end pipeline from input entries to associated values.

use super::{
    error::Error,
    keyword::Entry,
    list::KeywordList,
    options::Options,
    ordering::reorder,
    search::{search, SearchOutcome, SearchParams},
};
use log::debug;

/// Build a keyword list from `entries`, optionally reorder it, and search for associated values.
///
/// # Errors
///
/// Any error of [`KeywordList::build`] or [`search`].
///
/// # Example
///
/// ```
/// use kwhash::{generate, keyword::{Entry, KeyPositions}, Options};
///
/// let mut options = Options::default();
/// options.key_positions = KeyPositions::All;
/// let outcome = generate(["if", "else", "while"].map(Entry::new), &options).unwrap();
/// assert_eq!(outcome.unresolved(), 0);
/// ```
#[inline]
pub fn generate(
    entries: impl IntoIterator<Item = Entry>,
    options: &Options,
) -> Result<SearchOutcome, Error> {
    let mut list = KeywordList::build(entries, options)?;
    if options.reorder {
        reorder(&mut list);
    }
    let params = SearchParams::from_options(options, list.len())?;
    debug!(
        "searching {} keywords with key positions {}, asso_max {}, jump {}",
        list.len(),
        options.key_positions,
        params.asso_max,
        params.jump,
    );
    search(list, &params, options.seed)
}
