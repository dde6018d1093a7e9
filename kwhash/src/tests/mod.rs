use super::{
    generate,
    keyword::{Entry, KeyPositions},
    list::Record,
    Error, Options, SearchOutcome, Seed, SizeMultiple,
};
use alloc::{
    collections::BTreeSet,
    string::{String, ToString},
    vec::Vec,
};
use rapidhash::RapidRng;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

fn entries(keys: &[&str]) -> Vec<Entry> {
    keys.iter().map(|key| Entry::new(*key)).collect()
}

fn all_characters() -> Options {
    Options {
        key_positions: KeyPositions::All,
        ..Options::default()
    }
}

/// Check every pair of representatives by brute force.
fn assert_perfect(outcome: &SearchOutcome) {
    let hashes: Vec<usize> = outcome
        .keywords()
        .iter()
        .map(|record| outcome.hash(record.keyword()))
        .collect();
    let mut rest = &hashes[..];
    while let Some((a, tail)) = rest.split_first() {
        for b in tail {
            assert_ne!(a, b, "hash collision in {hashes:?}");
        }
        rest = tail;
    }
    assert!(
        hashes.iter().all(|&hash| hash <= outcome.max_hash_value()),
        "max hash value is not an upper bound"
    );
}

/// 100 distinct lowercase keywords of length 8.
fn random_keywords(seed: u64) -> Vec<String> {
    let mut rng = RapidRng::new(seed);
    let mut seen = BTreeSet::new();
    let mut keys = Vec::new();
    while keys.len() < 100 {
        let key: String = core::iter::repeat_with(|| rng.next() % 26)
            .take(8)
            .map(|letter| char::from(LETTERS[usize::try_from(letter).unwrap()]))
            .collect();
        // Keywords with equal character sets are indistinguishable to the hash function
        let mut chars: Vec<char> = key.chars().collect();
        chars.sort_unstable();
        chars.dedup();
        if seen.insert(chars) {
            keys.push(key);
        }
    }
    keys
}

#[test]
fn three_letters() {
    let options = Options {
        size_multiple: SizeMultiple::Times(0),
        ..all_characters()
    };
    let outcome = generate(entries(&["a", "b", "c"]), &options).unwrap();
    assert_eq!(outcome.asso_values().asso_max(), 4);
    assert_eq!(outcome.unresolved(), 0);
    assert_perfect(&outcome);
    assert!(outcome
        .keywords()
        .iter()
        .all(|record| (1..=4).contains(&record.hash_value())));
}

#[test]
fn indistinguishable_keywords_are_linked() {
    // The first and last characters of "ab" and "ba" form the same set.
    let options = Options {
        key_positions: "1,$".parse().unwrap(),
        include_length: false,
        allow_duplicates: true,
        ..Options::default()
    };
    let outcome = generate(entries(&["ab", "ba"]), &options).unwrap();
    assert_eq!(outcome.keywords().len(), 1);
    assert_eq!(outcome.linked_duplicates(), 1);
    assert_eq!(outcome.unresolved(), 0);
    assert_eq!(outcome.total_duplicates(), 1);

    let keywords = outcome.keywords();
    let representative = keywords.iter().next().unwrap();
    let duplicate = keywords.duplicates(representative).next().unwrap();
    assert_eq!(duplicate.keyword().text(), "ba");
    assert_eq!(duplicate.hash_value(), representative.hash_value());
    assert_eq!(duplicate.index(), representative.index());

    let strict = Options {
        allow_duplicates: false,
        ..options
    };
    assert!(matches!(
        generate(entries(&["ab", "ba"]), &strict),
        Err(Error::IdenticalSignatures { count: 1, .. })
    ));
}

#[test]
fn hundred_random_keywords() {
    let keys = random_keywords(0x439f_2674_4da7_67e5);
    let options = Options {
        size_multiple: SizeMultiple::Times(8),
        ..all_characters()
    };
    let outcome = generate(keys.iter().map(|key| Entry::new(key.as_str())), &options).unwrap();
    assert_eq!(outcome.asso_values().asso_max(), 1024);
    assert_eq!(outcome.total_duplicates(), 0);
    assert_eq!(outcome.keywords().len(), 100);
    assert_perfect(&outcome);
    assert!(outcome.max_hash_value() <= 8 + 1023 * 8);

    // Emission order is by hash value
    let keywords = outcome.keywords();
    let hashes: Vec<usize> = keywords.iter().map(Record::hash_value).collect();
    assert!(hashes.windows(2).all(|pair| pair[0] < pair[1]));
    let indices: Vec<usize> = keywords.iter().map(Record::index).collect();
    assert_eq!(indices, (0..100).collect::<Vec<_>>());
}

#[test]
fn one_character_repair() {
    // Without the length, "ab" and "abc" start out equal and differ only in 'c'.
    let options = Options {
        include_length: false,
        ..all_characters()
    };
    let outcome = generate(entries(&["ab", "abc"]), &options).unwrap();
    assert_eq!(outcome.unresolved(), 0);
    let asso_values = outcome.asso_values();
    assert_eq!(asso_values.asso_max(), 2);
    assert_eq!(asso_values.get(b'a'), 0);
    assert_eq!(asso_values.get(b'b'), 0);
    assert_eq!(asso_values.get(b'c'), 1);
    assert_perfect(&outcome);
}

#[test]
fn deterministic() {
    let keys = random_keywords(7);
    let run = |options: &Options| {
        generate(keys.iter().map(|key| Entry::new(key.as_str())), options)
            .unwrap()
            .asso_values()
            .clone()
    };

    let options = Options {
        allow_duplicates: true,
        ..all_characters()
    };
    assert_eq!(run(&options), run(&options));

    let random = Options {
        random: true,
        jump: 0,
        seed: Seed::new(42),
        ..options
    };
    assert_eq!(run(&random), run(&random));
    let other_seed = Options {
        seed: Seed::new(43),
        ..random.clone()
    };
    assert_ne!(run(&random), run(&other_seed));
}

#[test]
fn c_keywords() {
    let keys = [
        "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
        "enum", "extern", "float", "for", "goto", "if", "int", "long", "register", "return",
        "short", "signed", "sizeof", "static", "struct", "switch", "typedef", "union", "unsigned",
        "void", "volatile", "while",
    ];
    for reorder in [false, true] {
        let options = Options {
            key_positions: "1,2,$".parse().unwrap(),
            size_multiple: SizeMultiple::Times(2),
            allow_duplicates: true,
            reorder,
            ..Options::default()
        };
        let outcome = generate(entries(&keys), &options).unwrap();
        assert_eq!(outcome.linked_duplicates(), 0);
        assert_eq!(outcome.min_key_len(), 2);
        assert_eq!(outcome.max_key_len(), 8);
        assert_eq!(outcome.max_signature_len(), 3);

        // Unresolved collisions are exactly the keywords whose hash value is already taken
        let mut seen = BTreeSet::new();
        let taken = outcome
            .keywords()
            .iter()
            .filter(|record| !seen.insert(record.hash_value()))
            .count();
        assert_eq!(taken, outcome.unresolved());
        if outcome.unresolved() == 0 {
            assert_perfect(&outcome);
        }

        let report: Vec<String> = outcome.keywords().iter().map(ToString::to_string).collect();
        assert_eq!(report.len(), keys.len());
    }
}

#[test]
fn unresolved_duplicates_are_fatal_unless_allowed() {
    // A single associated value can't separate anything
    let options = Options {
        include_length: false,
        size_multiple: SizeMultiple::DividedBy(8),
        ..all_characters()
    };
    let error = generate(entries(&["x", "y", "z"]), &options).unwrap_err();
    assert!(matches!(error, Error::UnresolvedDuplicate { hash: 0, .. }));
    assert!(error.to_string().starts_with("duplicate hash value 0"));

    let tolerant = Options {
        allow_duplicates: true,
        ..options
    };
    let outcome = generate(entries(&["x", "y", "z"]), &tolerant).unwrap();
    assert_eq!(outcome.unresolved(), 2);
    assert_eq!(outcome.max_hash_value(), 0);
}

#[test]
fn even_jump_is_adjusted() {
    let even = Options {
        jump: 4,
        allow_duplicates: true,
        ..all_characters()
    };
    let odd = Options {
        jump: 5,
        ..even.clone()
    };
    let keys = ["red", "green", "blue", "cyan", "magenta", "yellow"];
    assert_eq!(
        generate(entries(&keys), &even).unwrap().asso_values(),
        generate(entries(&keys), &odd).unwrap().asso_values()
    );
}
