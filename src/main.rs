//! Command-line entry point for the comparative associative-array study
//! engine: parses the experiment configuration, drives the random,
//! single-text, or similarity protocol against all three structures, and
//! writes CSV rows — the same parse-then-run-then-report shape as the
//! teacher's `tree-dists` binary, with `rayon` farming out the
//! independent per-configuration work the way the teacher farms out
//! pairwise distance computation.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use dict_bench::corpus;
use dict_bench::error::{HarnessError, Result};
use dict_bench::harness::{self, ByMRow, RandomRow, SimilarityRow};
use dict_bench::output::{RunOutputManager, SimilarityOutputManager};

/// Alphabet sizes swept by the random experiment when none are given on
/// the command line.
const DEFAULT_ALPHABET_SIZES: &[usize] = &[2, 4, 8, 16, 26, 64];
/// Average word length fed to the word-length sampler.
const DEFAULT_MEAN_WORD_LENGTH: f64 = 4.0;
/// Size exponent reserved to mean "use the corpus's native word count"
/// for the single-text and similarity experiments.
const NATIVE_EXPONENT: u32 = 21;

/// Compares PATRICIA, ternary-search-tree, and hash-table associative
/// arrays across random, single-text, and cross-corpus similarity
/// protocols.
#[derive(Parser, Debug)]
#[command(name = "dict-bench", version, about = "Compare PATR/TERN/HASH associative arrays")]
struct Args {
    /// Which experiment protocol to run.
    #[arg(short = 'e', long = "experiment", value_enum, default_value_t = ExperimentArg::Random)]
    experiment: ExperimentArg,

    /// Directory to search for corpus files (single-text/similarity only).
    #[arg(long = "corpus-dir", default_value = "corpora")]
    corpus_dir: PathBuf,

    /// File extension (without the leading dot) identifying corpus files.
    #[arg(long = "corpus-ext", default_value = "txt")]
    corpus_ext: String,

    /// Directory the CSV sinks are created in.
    #[arg(short = 'o', long = "output-dir", default_value = "results")]
    output_dir: PathBuf,

    /// Alphabet sizes to sweep (random experiment only); comma-separated.
    #[arg(long = "alphabet-sizes", value_delimiter = ',')]
    alphabet_sizes: Vec<usize>,

    /// Word-count/corpus-size exponents to sweep (2^i words); comma
    /// separated. For single-text/similarity, 21 means "native size".
    /// Defaults to 10..=20 (random/single-text) or 10..=21 (similarity).
    #[arg(long = "size-exponents", value_delimiter = ',')]
    size_exponents: Vec<u32>,

    /// Reshuffles run per configuration.
    #[arg(long = "permutations", default_value_t = 3)]
    permutations: usize,

    /// Fresh sample redraws per configuration (random experiment only).
    #[arg(long = "repetitions", default_value_t = 1)]
    repetitions: usize,

    /// Deterministic PRNG seed; omitted means seed from entropy.
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Suppress per-phase progress lines.
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ExperimentArg {
    Random,
    SingleText,
    Similarity,
}

fn log_if(show: bool, msg: String) {
    if show {
        println!("{msg}");
    }
}

/// One PRNG per configuration rather than one shared across the `rayon`
/// fan-out: `salt` (derived from the configuration's own identity) keeps
/// runs reproducible under a fixed `--seed` without any structure being
/// touched from more than one thread.
fn make_rng(seed: Option<u64>, salt: u64) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s ^ salt),
        None => StdRng::from_entropy(),
    }
}

fn main() {
    let args = Args::parse();
    let result = match args.experiment {
        ExperimentArg::Random => run_random(&args),
        ExperimentArg::SingleText => run_single_text(&args),
        ExperimentArg::Similarity => run_similarity(&args),
    };

    if let Err(e) = result {
        eprintln!("fatal: {e}");
        let code = match e {
            HarnessError::Io(_) => 2,
            HarnessError::EmptyCorpus { .. } => 3,
            HarnessError::SampleExhausted { .. } => 4,
            HarnessError::Config(_) => 5,
        };
        std::process::exit(code);
    }
}

fn size_exponents_or_default(args: &Args, native_allowed: bool) -> Vec<u32> {
    if !args.size_exponents.is_empty() {
        return args.size_exponents.clone();
    }
    if native_allowed {
        (10..=NATIVE_EXPONENT).collect()
    } else {
        (10..=20).collect()
    }
}

fn alphabet_sizes_or_default(args: &Args) -> Vec<usize> {
    if !args.alphabet_sizes.is_empty() {
        args.alphabet_sizes.clone()
    } else {
        DEFAULT_ALPHABET_SIZES.to_vec()
    }
}

/// `experiment_type = 0`: synthetic alphabet words, no corpus needed.
fn run_random(args: &Args) -> Result<()> {
    let alphabet_sizes = alphabet_sizes_or_default(args);
    if alphabet_sizes.is_empty() {
        return Err(HarnessError::Config("alphabet_sizes must not be empty".into()));
    }
    std::fs::create_dir_all(&args.output_dir)?;
    let exponents = size_exponents_or_default(args, false);

    let configs: Vec<(usize, u32)> = alphabet_sizes
        .iter()
        .flat_map(|&a| exponents.iter().map(move |&i| (a, i)))
        .collect();

    log_if(!args.quiet, format!("random experiment: {} configurations", configs.len()));
    let t0 = Instant::now();

    let results: Vec<Result<(usize, u32, Vec<RandomRow>, Vec<ByMRow>)>> = configs
        .par_iter()
        .map(|&(alphabet_size, i)| {
            let mut rng = make_rng(args.seed, ((alphabet_size as u64) << 32) | i as u64);
            let word_count = 1usize << i;
            let (rows, by_m) = harness::run_random_experiment(
                &mut rng,
                b'a',
                alphabet_size as u8,
                word_count,
                DEFAULT_MEAN_WORD_LENGTH,
                args.repetitions,
                args.permutations,
            )?;
            Ok((alphabet_size, i, rows, by_m))
        })
        .collect();

    let mut sink = RunOutputManager::create(&args.output_dir, "random", &["alphabet", "log_size"])?;
    for res in results {
        let (alphabet_size, i, rows, by_m) = res?;
        for row in &rows {
            sink.write_row(&[alphabet_size.to_string(), i.to_string()], row)?;
        }
        for row in &by_m {
            sink.write_by_m_row(&[alphabet_size.to_string(), i.to_string()], row)?;
        }
    }
    sink.flush()?;

    log_if(
        !args.quiet,
        format!("random experiment finished in {:.3}s", t0.elapsed().as_secs_f64()),
    );
    Ok(())
}

/// `experiment_type = 1`: one real corpus, swept across target sizes.
fn run_single_text(args: &Args) -> Result<()> {
    std::fs::create_dir_all(&args.output_dir)?;
    let corpora = corpus::load_corpus_dir(&args.corpus_dir, &args.corpus_ext)?;
    if corpora.is_empty() {
        return Err(HarnessError::Config(format!(
            "no *.{} files found under {:?}",
            args.corpus_ext, args.corpus_dir
        )));
    }
    let exponents = size_exponents_or_default(args, true);

    log_if(
        !args.quiet,
        format!("single-text experiment: {} corpora x {} sizes", corpora.len(), exponents.len()),
    );
    let t0 = Instant::now();

    let configs: Vec<(String, Vec<Vec<u8>>, u32)> = corpora
        .iter()
        .flat_map(|(name, words)| exponents.iter().map(move |&i| (name.clone(), words.clone(), i)))
        .collect();

    let results: Vec<Result<(String, u32, Vec<RandomRow>, Vec<ByMRow>)>> = configs
        .into_par_iter()
        .map(|(name, words, i)| {
            let target_size = if i == NATIVE_EXPONENT { words.len() } else { 1usize << i };
            let mut rng = make_rng(args.seed, (i as u64) ^ (name.len() as u64));
            let (rows, by_m) =
                harness::run_single_text_experiment(&mut rng, &words, target_size, args.permutations)?;
            Ok((name, i, rows, by_m))
        })
        .collect();

    let mut sink = RunOutputManager::create(&args.output_dir, "single_text", &["corpus", "log_size"])?;
    for res in results {
        let (name, i, rows, by_m) = res?;
        for row in &rows {
            sink.write_row(&[name.clone(), i.to_string()], row)?;
        }
        for row in &by_m {
            sink.write_by_m_row(&[name.clone(), i.to_string()], row)?;
        }
    }
    sink.flush()?;

    log_if(
        !args.quiet,
        format!("single-text experiment finished in {:.3}s", t0.elapsed().as_secs_f64()),
    );
    Ok(())
}

/// `experiment_type = 2`: every pair of corpora, swept across sizes.
fn run_similarity(args: &Args) -> Result<()> {
    std::fs::create_dir_all(&args.output_dir)?;
    let corpora = corpus::load_corpus_dir(&args.corpus_dir, &args.corpus_ext)?;
    if corpora.len() < 2 {
        return Err(HarnessError::Config(
            "similarity experiment needs at least two corpus files".into(),
        ));
    }
    let exponents = size_exponents_or_default(args, true);
    let pairs: Vec<Vec<&(String, Vec<Vec<u8>>)>> = corpora.iter().combinations(2).collect();

    log_if(
        !args.quiet,
        format!("similarity experiment: {} pairs x {} sizes", pairs.len(), exponents.len()),
    );
    let t0 = Instant::now();

    let configs: Vec<(&(String, Vec<Vec<u8>>), &(String, Vec<Vec<u8>>), u32)> = pairs
        .iter()
        .flat_map(|p| {
            let a = p[0];
            let b = p[1];
            exponents.iter().map(move |&i| (a, b, i))
        })
        .collect();

    let all_rows: Vec<Vec<SimilarityRow>> = configs
        .into_par_iter()
        .map(|(a, b, i)| {
            let size = if i == NATIVE_EXPONENT {
                a.1.len().min(b.1.len())
            } else {
                1usize << i
            };
            let sample_a = corpus::match_word_count(&a.1, size);
            let sample_b = corpus::match_word_count(&b.1, size);
            harness::run_similarity_experiment(&a.0, &b.0, i, &sample_a, &sample_b)
        })
        .collect();

    let mut sink = SimilarityOutputManager::create(&args.output_dir, "similarity")?;
    for rows in all_rows {
        for row in rows {
            sink.write_row(&row)?;
        }
    }
    sink.flush()?;

    log_if(
        !args.quiet,
        format!("similarity experiment finished in {:.3}s", t0.elapsed().as_secs_f64()),
    );
    Ok(())
}
