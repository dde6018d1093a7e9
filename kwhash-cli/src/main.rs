//! Command-line front end: reads keywords, searches for associated values and prints the result.
//!
//! Input is one keyword per line. Anything after the first `,` is passed through to the report
//! untouched. Blank lines and lines starting with `#` are ignored.

use anyhow::Context;
use clap::Parser;
use kwhash::{
    generate,
    keyword::{Alphabet, Entry, KeyPositions},
    options::DEFAULT_JUMP,
    Error, Options, SearchOutcome, Seed, SizeMultiple, TrialBudget,
};
use log::info;
use std::{
    fs,
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

/// Find associated values for a keyword perfect hash function.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[expect(clippy::struct_excessive_bools, reason = "one field per switch")]
struct Args {
    /// Keyword file; standard input if omitted
    input: Option<PathBuf>,

    /// Characters read by the hash function: `*` for all, or positions like `1,3-5,$`
    #[arg(short, long, default_value = "1,$")]
    key_positions: KeyPositions,

    /// Don't add the keyword length to the hash
    #[arg(short = 'l', long)]
    no_length: bool,

    /// Tolerate keywords with equal hash values
    #[arg(short = 'D', long)]
    duplicates: bool,

    /// Reorder keywords by character frequency before searching
    #[arg(short, long)]
    occurrence_sort: bool,

    /// Start from random associated values
    #[arg(short, long)]
    random: bool,

    /// Seed for random values and random jumps
    #[arg(long)]
    seed: Option<u64>,

    /// Initial associated value of every character
    #[arg(short, long, default_value_t = 0)]
    initial_value: usize,

    /// Step between trial values, 0 for a random step
    #[arg(short, long, default_value_t = DEFAULT_JUMP)]
    jump: usize,

    /// Size of the associated-value range relative to the keyword count; negative values divide
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    size_multiple: i64,

    /// Try at most N values per character; the keyword count if N is omitted
    #[arg(short, long, value_name = "N", num_args = 0..=1, default_missing_value = "0")]
    fast: Option<usize>,

    /// Only accept 7-bit keywords
    #[arg(long)]
    seven_bit: bool,

    /// Retry a randomized search with fresh seeds while collisions remain
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    attempts: u64,

    /// Log every collision and repair
    #[arg(long)]
    debug: bool,
}

impl Args {
    /// Search options selected by the flags.
    fn options(&self) -> anyhow::Result<Options> {
        let multiple = usize::try_from(self.size_multiple.unsigned_abs())
            .context("size multiple is too large")?;

        let mut options = Options::default();
        options.key_positions = self.key_positions.clone();
        options.include_length = !self.no_length;
        options.allow_duplicates = self.duplicates;
        options.reorder = self.occurrence_sort;
        options.random = self.random;
        if let Some(seed) = self.seed {
            options.seed = Seed::new(seed);
        }
        options.initial_value = self.initial_value;
        options.jump = self.jump;
        options.size_multiple = if self.size_multiple < 0 {
            SizeMultiple::DividedBy(multiple)
        } else {
            SizeMultiple::Times(multiple)
        };
        options.trial_budget = self.fast.map_or(TrialBudget::Full, TrialBudget::Iterations);
        if self.seven_bit {
            options.alphabet = Alphabet::SevenBit;
        }
        Ok(options)
    }
}

/// Read and split the keyword file, or standard input.
fn read_entries(input: Option<&Path>) -> anyhow::Result<Vec<Entry>> {
    let text = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read standard input")?;
            text
        }
    };
    Ok(text.lines().filter_map(Entry::parse).collect())
}

/// Whether another seed might do better.
fn worth_retrying(result: &Result<SearchOutcome, Error>) -> bool {
    match result {
        Ok(outcome) => outcome.unresolved() > 0,
        Err(error) => matches!(error, Error::UnresolvedDuplicate { .. }),
    }
}

/// Run the search, retrying randomized searches with seeds derived from the configured one.
///
/// Returns the last result and the number of searches run, at most `attempts`. Deterministic
/// searches run once.
fn search(
    entries: &[Entry],
    options: &Options,
    attempts: u64,
) -> (Result<SearchOutcome, Error>, u64) {
    let mut result = generate(entries.iter().cloned(), options);
    let mut used = 1;
    if !options.random && options.jump != 0 {
        return (result, used);
    }

    for (attempt, seed) in (2..=attempts).zip(options.seed.iter()) {
        if !worth_retrying(&result) {
            break;
        }
        info!(
            "attempt {attempt}: retrying with seed {:#x}",
            seed.get_u64(),
        );
        let mut retry = options.clone();
        retry.seed = seed;
        result = generate(entries.iter().cloned(), &retry);
        used = attempt;
    }

    (result, used)
}

/// Print one line per keyword in emission order, then the associated values of every character
/// that occurs.
#[expect(
    clippy::arithmetic_side_effects,
    reason = "both counts are bounded by the input size"
)]
fn write_report(out: &mut impl Write, outcome: &SearchOutcome) -> io::Result<()> {
    let keywords = outcome.keywords();
    for record in keywords.iter() {
        writeln!(out, "{record}")?;
        for duplicate in keywords.duplicates(record) {
            writeln!(out, "{duplicate}")?;
        }
    }

    writeln!(out)?;
    writeln!(
        out,
        "# {} keywords, lengths {} to {}, asso_max {}, max hash value {}, {} duplicates",
        keywords.len() + keywords.linked_duplicates(),
        outcome.min_key_len(),
        outcome.max_key_len(),
        outcome.asso_values().asso_max(),
        outcome.max_hash_value(),
        outcome.total_duplicates(),
    )?;
    for (c, _) in keywords.occurrences().iter() {
        writeln!(
            out,
            "{}\t{}",
            c.escape_ascii(),
            outcome.asso_values().get(c)
        )?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let entries = read_entries(args.input.as_deref())?;
    let (result, attempts) = search(&entries, &args.options()?, args.attempts);
    let outcome = result.with_context(|| format!("search failed, attempts: {attempts}"))?;

    let mut out = BufWriter::new(io::stdout().lock());
    write_report(&mut out, &outcome).context("failed to write report")?;
    out.flush().context("failed to write report")?;
    Ok(())
}
