//! The keyword list.
//!
//! Keywords live in a contiguous arena and are threaded into a singly linked sequence through
//! `next` indices. The order of that sequence is significant: it is the order in which collisions
//! are repaired, and after the search, the emission order. Keywords whose hash inputs are
//! identical are kept out of the sequence and chained to their representative through `link`
//! indices instead.

use super::{
    error::Error,
    keyword::{Alphabet, Entry, Keyword},
    occurrence::Occurrences,
    options::Options,
};
use alloc::{
    collections::{btree_map, BTreeMap},
    vec::Vec,
};
use log::{debug, warn};

/// A keyword together with its search state.
#[derive(Clone, Debug)]
pub struct Record {
    /// The keyword itself.
    keyword: Keyword,

    /// Hash value under the current associated values.
    hash_value: usize,

    /// Position in emission order, assigned once the search is done.
    index: usize,

    /// Next record of the main sequence.
    next: Option<usize>,

    /// Next record of the same equivalence class.
    link: Option<usize>,
}

impl Record {
    /// The keyword.
    #[inline]
    #[must_use]
    pub const fn keyword(&self) -> &Keyword {
        &self.keyword
    }

    /// The hash value last computed for this keyword.
    #[inline]
    #[must_use]
    pub const fn hash_value(&self) -> usize {
        self.hash_value
    }

    /// Position in emission order.
    ///
    /// Only meaningful after a search. Duplicates share the index of their representative.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

/// An ordered list of keywords.
#[derive(Clone, Debug)]
pub struct KeywordList {
    /// Arena of all records, in input order.
    records: Vec<Record>,

    /// First record of the main sequence.
    head: Option<usize>,

    /// Number of records in the main sequence.
    len: usize,

    /// Number of records chained to a representative instead of being in the main sequence.
    linked_duplicates: usize,

    /// Character counts over the signatures of the main sequence.
    occurrences: Occurrences,

    /// Character domain of the signatures.
    alphabet: Alphabet,
}

impl KeywordList {
    /// Build the list from input entries.
    ///
    /// Computes signatures with the configured key positions and merges keywords the hash
    /// function cannot tell apart (equal signatures, and equal lengths if the length is hashed)
    /// into one representative.
    ///
    /// # Errors
    ///
    /// Fails if there are no keywords, if a keyword is empty, if a signature byte is outside the
    /// alphabet, if a signature is empty while the length is not hashed, or if keywords had to be
    /// merged while duplicates are not allowed.
    #[inline]
    #[expect(
        clippy::arithmetic_side_effects,
        reason = "representatives are a subset of the records"
    )]
    pub fn build(
        entries: impl IntoIterator<Item = Entry>,
        options: &Options,
    ) -> Result<Self, Error> {
        let mut records: Vec<Record> = Vec::new();
        let mut representatives = Vec::new();
        let mut classes = BTreeMap::new();
        let mut first_link = None;

        for (position, entry) in entries.into_iter().enumerate() {
            if entry.key.is_empty() {
                return Err(Error::EmptyKeyword { position });
            }
            let keyword = Keyword::new(entry, &options.key_positions, position);
            let signature = keyword.signature();
            if let Some(&byte) = signature
                .as_bytes()
                .iter()
                .find(|&&byte| !options.alphabet.contains(byte))
            {
                return Err(Error::NonAsciiByte {
                    keyword: keyword.text().into_owned(),
                    byte,
                });
            }
            if signature.is_empty() && !options.include_length {
                return Err(Error::NoUsableCharacters {
                    keyword: keyword.text().into_owned(),
                });
            }

            let id = records.len();
            let mut record = Record {
                hash_value: 0,
                index: 0,
                next: None,
                link: None,
                keyword,
            };
            let class = (
                record.keyword.signature().clone(),
                options.include_length.then(|| record.keyword.len()),
            );
            match classes.entry(class) {
                btree_map::Entry::Occupied(slot) => {
                    let representative: usize = *slot.get();
                    record.link = records[representative].link.replace(id);
                    debug!(
                        "key link: {:?} = {:?}, with key set {:?}",
                        record.keyword.text(),
                        records[representative].keyword.text(),
                        record.keyword.signature().text(),
                    );
                    first_link.get_or_insert((representative, id));
                }
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(id);
                    representatives.push(id);
                }
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(Error::NoKeywords);
        }

        let linked_duplicates = records.len() - representatives.len();
        if let Some((first, second)) = first_link {
            if !options.allow_duplicates {
                return Err(Error::IdenticalSignatures {
                    count: linked_duplicates,
                    first: records[first].keyword.text().into_owned(),
                    second: records[second].keyword.text().into_owned(),
                    signature: records[second].keyword.signature().text().into_owned(),
                });
            }
            warn!(
                "{linked_duplicates} keys have identical hash inputs, examine output carefully",
            );
        }

        let occurrences = Occurrences::from_signatures(
            options.alphabet,
            representatives
                .iter()
                .map(|&id| records[id].keyword.signature()),
        );

        let mut list = Self {
            records,
            head: None,
            len: 0,
            linked_duplicates,
            occurrences,
            alphabet: options.alphabet,
        };
        list.relink(&representatives);
        Ok(list)
    }

    /// Number of keywords in the main sequence.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the main sequence is empty. Never true for a successfully built list.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of keywords merged into another keyword's equivalence class.
    #[inline]
    #[must_use]
    pub const fn linked_duplicates(&self) -> usize {
        self.linked_duplicates
    }

    /// Character counts over the main sequence.
    #[inline]
    #[must_use]
    pub const fn occurrences(&self) -> &Occurrences {
        &self.occurrences
    }

    /// Character domain of the signatures.
    #[inline]
    #[must_use]
    pub const fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// Iterate over the main sequence.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        self.ids().map(|id| &self.records[id])
    }

    /// Iterate over every record, duplicates included, in input order.
    #[inline]
    pub fn all(&self) -> impl Iterator<Item = &Record> + '_ {
        self.records.iter()
    }

    /// Iterate over the keywords merged into `record`'s equivalence class, not including
    /// `record` itself.
    #[inline]
    pub fn duplicates<'a>(&'a self, record: &'a Record) -> impl Iterator<Item = &'a Record> + 'a {
        core::iter::successors(record.link, |&id| self.records[id].link).map(|id| &self.records[id])
    }

    /// Iterate over arena indices of the main sequence.
    pub(crate) fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        core::iter::successors(self.head, |&id| self.records[id].next)
    }

    /// Access a record by arena index.
    #[inline]
    pub(crate) fn record(&self, id: usize) -> &Record {
        &self.records[id]
    }

    /// Arena index of the first record of the main sequence.
    #[inline]
    pub(crate) const fn head(&self) -> Option<usize> {
        self.head
    }

    /// Arena index of the record following `id` in the main sequence.
    #[inline]
    pub(crate) fn next(&self, id: usize) -> Option<usize> {
        self.records[id].next
    }

    /// Point `id` at `next` in the main sequence.
    #[inline]
    pub(crate) fn set_next(&mut self, id: usize, next: Option<usize>) {
        self.records[id].next = next;
    }

    /// Store the hash value of `id`.
    #[inline]
    pub(crate) fn set_hash_value(&mut self, id: usize, hash_value: usize) {
        self.records[id].hash_value = hash_value;
    }

    /// Rebuild the main sequence from a permutation of its arena indices.
    pub(crate) fn relink(&mut self, order: &[usize]) {
        let mut next = None;
        for &id in order.iter().rev() {
            self.records[id].next = next;
            next = Some(id);
        }
        self.head = next;
        self.len = order.len();
    }

    /// Sort the main sequence by ascending hash value, keeping the relative order of equal hash
    /// values, and number the records in that order.
    ///
    /// Duplicates inherit the hash value and index of their representative.
    pub(crate) fn sort_by_hash(&mut self) {
        let mut order: Vec<usize> = self.ids().collect();
        let records = &self.records;
        radsort::sort_by_key(&mut order, |&id| records[id].hash_value);
        self.relink(&order);

        for (index, &id) in order.iter().enumerate() {
            let hash_value = self.records[id].hash_value;
            let mut member = Some(id);
            while let Some(current) = member {
                let record = &mut self.records[current];
                record.hash_value = hash_value;
                record.index = index;
                member = record.link;
            }
        }
    }
}

impl core::fmt::Display for Record {
    /// Formats as `hash<TAB>keyword<TAB>rest`.
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}\t{}", self.hash_value, self.keyword.text())?;
        if !self.keyword.rest().is_empty() {
            write!(f, "\t{}", self.keyword.rest().trim())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyword::KeyPositions;
    use alloc::{borrow::Cow, string::ToString, vec, vec::Vec};

    fn entries(keys: &[&str]) -> Vec<Entry> {
        keys.iter().map(|key| Entry::new(*key)).collect()
    }

    fn texts(list: &KeywordList) -> Vec<Cow<'_, str>> {
        list.iter().map(|record| record.keyword().text()).collect()
    }

    fn all_characters() -> Options {
        Options {
            key_positions: KeyPositions::All,
            ..Options::default()
        }
    }

    #[test]
    fn keeps_input_order() {
        let options = all_characters();
        let list = KeywordList::build(entries(&["if", "else", "while"]), &options).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.linked_duplicates(), 0);
        assert_eq!(texts(&list), ["if", "else", "while"]);
        let positions: Vec<usize> = list.iter().map(|r| r.keyword().position()).collect();
        assert_eq!(positions, [0, 1, 2]);
        assert_eq!(list.occurrences().get(b'e'), 2);
        assert_eq!(list.occurrences().get(b'i'), 2);
    }

    #[test]
    fn rejects_bad_input() {
        let options = all_characters();
        assert_eq!(
            KeywordList::build(Vec::new(), &options).unwrap_err(),
            Error::NoKeywords
        );
        assert_eq!(
            KeywordList::build(entries(&["a", "", "b"]), &options).unwrap_err(),
            Error::EmptyKeyword { position: 1 }
        );

        let seven_bit = Options {
            alphabet: Alphabet::SevenBit,
            ..all_characters()
        };
        assert_eq!(
            KeywordList::build(vec![Entry::new(vec![b'a', 0xe9])], &seven_bit).unwrap_err(),
            Error::NonAsciiByte {
                keyword: "a\u{fffd}".into(),
                byte: 0xe9,
            }
        );

        let third_only = Options {
            key_positions: "3".parse().unwrap(),
            include_length: false,
            ..Options::default()
        };
        assert_eq!(
            KeywordList::build(entries(&["abc", "ab"]), &third_only).unwrap_err(),
            Error::NoUsableCharacters {
                keyword: "ab".into(),
            }
        );
    }

    #[test]
    fn literal_duplicates_are_fatal_by_default() {
        let options = all_characters();
        let error = KeywordList::build(entries(&["for", "do", "for"]), &options).unwrap_err();
        assert_eq!(
            error,
            Error::IdenticalSignatures {
                count: 1,
                first: "for".into(),
                second: "for".into(),
                signature: "for".into(),
            }
        );
    }

    #[test]
    fn merges_indistinguishable_keywords() {
        let options = Options {
            include_length: false,
            allow_duplicates: true,
            ..Options::default()
        };
        let list = KeywordList::build(entries(&["ab", "cd", "ba", "axxb"]), &options).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.linked_duplicates(), 2);
        assert_eq!(texts(&list), ["ab", "cd"]);

        let head = list.iter().next().unwrap();
        let linked: Vec<Cow<'_, str>> = list.duplicates(head).map(|r| r.keyword().text()).collect();
        assert_eq!(linked, ["axxb", "ba"]);
        // Only representatives are counted
        assert_eq!(list.occurrences().get(b'a'), 1);
    }

    #[test]
    fn length_separates_classes() {
        let options = Options {
            allow_duplicates: true,
            ..Options::default()
        };
        let list = KeywordList::build(entries(&["ab", "ba", "axxb"]), &options).unwrap();
        assert_eq!(texts(&list), ["ab", "axxb"]);
        assert_eq!(list.linked_duplicates(), 1);
    }

    #[test]
    fn relink_and_sort() {
        let options = all_characters();
        let mut list = KeywordList::build(entries(&["a", "b", "c", "d"]), &options).unwrap();
        for (id, hash_value) in [(0, 7), (1, 3), (2, 7), (3, 1)] {
            list.set_hash_value(id, hash_value);
        }
        list.sort_by_hash();
        assert_eq!(texts(&list), ["d", "b", "a", "c"]);
        let indices: Vec<usize> = list.iter().map(Record::index).collect();
        assert_eq!(indices, [0, 1, 2, 3]);
        assert_eq!(list.record(list.head().unwrap()).to_string(), "1\td");
    }
}
