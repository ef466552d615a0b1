//! Experiment harness (C7): builds word samples via [`crate::sampler`],
//! installs them into each of the three structures, and times
//! insert/hit-search/miss-search and similarity computation.
//!
//! Each experiment function takes its PRNG and output sink as explicit
//! parameters — nothing here is thread-local or `static` (see the
//! "Global state" design note this redesigns away).

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::Result;
use crate::sampler;
use crate::structure::{AssociativeArray, StructureKind};

/// One row of `<name>.csv`: aggregate timings for one structure under one
/// configuration, averaged over permutations.
pub struct RandomRow {
    pub alg: &'static str,
    pub insert_time_s: f64,
    pub avg_insert_ms: f64,
    pub search_time_s: f64,
    pub avg_search_ms: f64,
    pub miss_time_s: f64,
    pub avg_miss_ms: f64,
    pub size_bytes: usize,
    pub extra: f64,
    pub total_time_s: f64,
    pub avg_total_ms: f64,
}

/// One row of `<name>_by_m.csv`: timings bucketed by word length `m`.
pub struct ByMRow {
    pub alg: &'static str,
    pub search_time_ms: f64,
    pub avg_search_ms: f64,
    pub miss_time_ms: f64,
    pub avg_miss_ms: f64,
    pub m: usize,
}

/// One row of the similarity sink.
pub struct SimilarityRow {
    pub alg: &'static str,
    pub text1: String,
    pub text2: String,
    pub i: u32,
    pub insert_time_s: f64,
    pub avg_insert_ms: f64,
    pub search_time_s: f64,
    pub avg_search_ms: f64,
    pub size_bytes: usize,
    pub extra: f64,
    pub total_time: f64,
    pub similarity: f64,
}

/// Bucketed timing accumulator: total elapsed seconds and call count per
/// observed word length.
type Buckets = HashMap<usize, (f64, usize)>;

fn insert_all(structure: &mut StructureKind, words: &[Vec<u8>], stream: u8) -> f64 {
    let t0 = Instant::now();
    for (i, w) in words.iter().enumerate() {
        structure.insert(w, i, stream);
    }
    t0.elapsed().as_secs_f64()
}

fn search_all_bucketed(structure: &StructureKind, words: &[Vec<u8>], stream: u8) -> (f64, Buckets) {
    let mut buckets: Buckets = HashMap::new();
    let t0 = Instant::now();
    for w in words {
        let call_start = Instant::now();
        structure.search_report(w, stream, false);
        let dt = call_start.elapsed().as_secs_f64();
        let entry = buckets.entry(w.len()).or_insert((0.0, 0));
        entry.0 += dt;
        entry.1 += 1;
    }
    (t0.elapsed().as_secs_f64(), buckets)
}

fn merge_buckets(acc: &mut Buckets, incoming: &Buckets) {
    for (&len, &(time, count)) in incoming {
        let entry = acc.entry(len).or_insert((0.0, 0));
        entry.0 += time;
        entry.1 += count;
    }
}

/// Accumulates totals for one structure across permutations, then
/// produces its averaged [`RandomRow`] and per-length [`ByMRow`]s.
struct Accumulator {
    alg: &'static str,
    insert_time: f64,
    search_time: f64,
    miss_time: f64,
    size_bytes: usize,
    extra: f64,
    search_buckets: Buckets,
    miss_buckets: Buckets,
}

impl Accumulator {
    fn new(alg: &'static str) -> Self {
        Accumulator {
            alg,
            insert_time: 0.0,
            search_time: 0.0,
            miss_time: 0.0,
            size_bytes: 0,
            extra: 0.0,
            search_buckets: HashMap::new(),
            miss_buckets: HashMap::new(),
        }
    }

    fn into_rows(self, permutations: usize, n_hit: usize, n_miss: usize) -> (RandomRow, Vec<ByMRow>) {
        let p = permutations.max(1) as f64;
        let insert_time_s = self.insert_time / p;
        let search_time_s = self.search_time / p;
        let miss_time_s = self.miss_time / p;
        let total_time_s = insert_time_s + search_time_s + miss_time_s;
        let total_calls = (n_hit + n_miss).max(1) as f64;
        let row = RandomRow {
            alg: self.alg,
            insert_time_s,
            avg_insert_ms: insert_time_s * 1000.0 / n_hit.max(1) as f64,
            search_time_s,
            avg_search_ms: search_time_s * 1000.0 / n_hit.max(1) as f64,
            miss_time_s,
            avg_miss_ms: miss_time_s * 1000.0 / n_miss.max(1) as f64,
            size_bytes: self.size_bytes / permutations.max(1),
            extra: self.extra / p,
            total_time_s,
            avg_total_ms: total_time_s * 1000.0 / total_calls,
        };

        let mut lengths: Vec<usize> = self
            .search_buckets
            .keys()
            .chain(self.miss_buckets.keys())
            .copied()
            .collect();
        lengths.sort_unstable();
        lengths.dedup();

        let by_m = lengths
            .into_iter()
            .map(|m| {
                let (s_time, s_count) = self.search_buckets.get(&m).copied().unwrap_or((0.0, 0));
                let (mi_time, mi_count) = self.miss_buckets.get(&m).copied().unwrap_or((0.0, 0));
                ByMRow {
                    alg: self.alg,
                    search_time_ms: s_time / p * 1000.0,
                    avg_search_ms: if s_count > 0 { s_time * 1000.0 / s_count as f64 } else { 0.0 },
                    miss_time_ms: mi_time / p * 1000.0,
                    avg_miss_ms: if mi_count > 0 { mi_time * 1000.0 / mi_count as f64 } else { 0.0 },
                    m,
                }
            })
            .collect();

        (row, by_m)
    }
}

/// Runs the random-word experiment for one `(alphabet_size, word_count)`
/// configuration. Each of `repetitions` draws a fresh in-corpus sample and
/// a `ceil(n/10)` out-of-corpus miss sample; each repetition is then
/// exercised over `permutations` reshuffles, so the reported averages are
/// over `repetitions * permutations` runs in total.
pub fn run_random_experiment(
    rng: &mut impl Rng,
    alphabet_start: u8,
    alphabet_size: u8,
    word_count: usize,
    mean_word_length: f64,
    repetitions: usize,
    permutations: usize,
) -> Result<(Vec<RandomRow>, Vec<ByMRow>)> {
    let repetitions = repetitions.max(1);
    let permutations = permutations.max(1);

    let mut accs = vec![
        Accumulator::new("PATR"),
        Accumulator::new("TERN"),
        Accumulator::new("HASH"),
    ];
    let mut n_hit = 0;
    let mut n_miss = 0;

    for _ in 0..repetitions {
        let mut sample = sampler::random_words(rng, word_count, mean_word_length, alphabet_start, alphabet_size);
        sampler::sort_by_length_then_lex(&mut sample);

        let miss_count = word_count.div_ceil(10);
        let existing: HashSet<Vec<u8>> = sample.iter().cloned().collect();
        let mut miss_sample = sampler::words_not_in(
            rng,
            &existing,
            miss_count,
            (2.0 * mean_word_length) as usize,
            alphabet_start,
            alphabet_size,
        )?;
        sampler::sort_by_length_then_lex(&mut miss_sample);
        n_hit = sample.len();
        n_miss = miss_sample.len();

        for _ in 0..permutations {
            let mut shuffled = sample.clone();
            shuffled.shuffle(rng);

            for (acc, mut structure) in accs.iter_mut().zip(StructureKind::all_new()) {
                acc.insert_time += insert_all(&mut structure, &shuffled, 0);

                let (hit_total, hit_buckets) = search_all_bucketed(&structure, &sample, 0);
                acc.search_time += hit_total;
                merge_buckets(&mut acc.search_buckets, &hit_buckets);

                let (miss_total, miss_buckets) = search_all_bucketed(&structure, &miss_sample, 0);
                acc.miss_time += miss_total;
                merge_buckets(&mut acc.miss_buckets, &miss_buckets);

                acc.size_bytes += structure.structure_size();
                acc.extra += structure.extra_measurement();
            }
        }
    }

    let total_runs = repetitions * permutations;
    let mut rows = Vec::with_capacity(3);
    let mut by_m_rows = Vec::new();
    for acc in accs {
        let (row, by_m) = acc.into_rows(total_runs, n_hit, n_miss);
        rows.push(row);
        by_m_rows.extend(by_m);
    }
    Ok((rows, by_m_rows))
}

/// Builds the three word lists the single-text experiment needs: the
/// resized corpus to insert, the `ceil(target_size/10)` in-corpus hit
/// sample (drawn uniformly by index via [`sampler::words_in`]), and the
/// same-sized out-of-corpus miss sample (drawn by rejection, `max_len`
/// bounded by the longest corpus word).
fn build_single_text_samples(
    rng: &mut impl Rng,
    corpus: &[Vec<u8>],
    target_size: usize,
) -> Result<(Vec<Vec<u8>>, Vec<Vec<u8>>, Vec<Vec<u8>>)> {
    let mut sample = crate::corpus::match_word_count(corpus, target_size);
    sampler::sort_by_length_then_lex(&mut sample);

    let max_len = sample.iter().map(|w| w.len()).max().unwrap_or(1);
    let hit_count = target_size.div_ceil(10);
    let miss_count = target_size.div_ceil(10);
    let existing: HashSet<Vec<u8>> = sample.iter().cloned().collect();
    let mut hit_sample = sampler::words_in(rng, &sample, hit_count);
    sampler::sort_by_length_then_lex(&mut hit_sample);
    // Single-text out-of-corpus words are drawn over the printable ASCII
    // range rather than a narrow synthetic alphabet, since they must
    // plausibly avoid colliding with real corpus vocabulary.
    let mut miss_sample = sampler::words_not_in(rng, &existing, miss_count, max_len, b'a', 26)?;
    sampler::sort_by_length_then_lex(&mut miss_sample);

    Ok((sample, hit_sample, miss_sample))
}

/// Runs the single-text experiment: the corpus is tokenized and resized to
/// `target_size` (truncated or cyclically repeated) to build the corpus
/// that gets inserted. The hit sample is `ceil(target_size/10)` words drawn
/// uniformly by index from that resized corpus; the miss sample is the same
/// count, drawn by rejection with `max_len` bounded by the longest corpus
/// word.
pub fn run_single_text_experiment(
    rng: &mut impl Rng,
    corpus: &[Vec<u8>],
    target_size: usize,
    permutations: usize,
) -> Result<(Vec<RandomRow>, Vec<ByMRow>)> {
    let (sample, hit_sample, miss_sample) = build_single_text_samples(rng, corpus, target_size)?;

    let mut accs = vec![
        Accumulator::new("PATR"),
        Accumulator::new("TERN"),
        Accumulator::new("HASH"),
    ];

    for _ in 0..permutations.max(1) {
        let mut shuffled = sample.clone();
        shuffled.shuffle(rng);

        for (acc, mut structure) in accs.iter_mut().zip(StructureKind::all_new()) {
            acc.insert_time += insert_all(&mut structure, &shuffled, 0);

            let (hit_total, hit_buckets) = search_all_bucketed(&structure, &hit_sample, 0);
            acc.search_time += hit_total;
            merge_buckets(&mut acc.search_buckets, &hit_buckets);

            let (miss_total, miss_buckets) = search_all_bucketed(&structure, &miss_sample, 0);
            acc.miss_time += miss_total;
            merge_buckets(&mut acc.miss_buckets, &miss_buckets);

            acc.size_bytes += structure.structure_size();
            acc.extra += structure.extra_measurement();
        }
    }

    let n_hit = hit_sample.len();
    let n_miss = miss_sample.len();
    let mut rows = Vec::with_capacity(3);
    let mut by_m_rows = Vec::new();
    for acc in accs {
        let (row, by_m) = acc.into_rows(permutations, n_hit, n_miss);
        rows.push(row);
        by_m_rows.extend(by_m);
    }
    Ok((rows, by_m_rows))
}

/// `sim(A, B) = 1 - sum(|c0(w) - c1(w)|) / (|A| + |B|)` over the
/// deduplicated union vocabulary.
fn similarity_score(structure: &StructureKind, union: &[Vec<u8>], len_a: usize, len_b: usize) -> f64 {
    let diff: usize = union
        .iter()
        .map(|w| {
            let (c0, c1) = structure.occurrences(w);
            c0.abs_diff(c1)
        })
        .sum();
    1.0 - (diff as f64) / ((len_a + len_b) as f64)
}

/// Runs the similarity experiment: corpus `a` is inserted on stream 0,
/// `b` on stream 1, into the *same* structure instance, and the
/// similarity score is computed over their deduplicated union.
pub fn run_similarity_experiment(
    text1: &str,
    text2: &str,
    size_exponent: u32,
    a: &[Vec<u8>],
    b: &[Vec<u8>],
) -> Vec<SimilarityRow> {
    let mut union: Vec<Vec<u8>> = a.iter().chain(b.iter()).cloned().collect();
    union.sort();
    union.dedup();

    StructureKind::all_new()
        .into_iter()
        .map(|mut structure| {
            let t0 = Instant::now();
            for (i, w) in a.iter().enumerate() {
                structure.insert(w, i, 0);
            }
            for (i, w) in b.iter().enumerate() {
                structure.insert(w, i, 1);
            }
            let insert_time_s = t0.elapsed().as_secs_f64();

            let t1 = Instant::now();
            let similarity = similarity_score(&structure, &union, a.len(), b.len());
            let search_time_s = t1.elapsed().as_secs_f64();

            let n = (a.len() + b.len()).max(1) as f64;
            SimilarityRow {
                alg: structure.name(),
                text1: text1.to_string(),
                text2: text2.to_string(),
                i: size_exponent,
                insert_time_s,
                avg_insert_ms: insert_time_s * 1000.0 / n,
                search_time_s,
                avg_search_ms: search_time_s * 1000.0 / union.len().max(1) as f64,
                size_bytes: structure.structure_size(),
                extra: structure.extra_measurement(),
                total_time: insert_time_s + search_time_s,
                similarity,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn random_experiment_produces_one_row_per_structure() {
        let mut rng = StdRng::seed_from_u64(123);
        let (rows, _by_m) = run_random_experiment(&mut rng, b'a', 4, 64, 4.0, 1, 2).unwrap();
        assert_eq!(rows.len(), 3);
        let names: HashSet<&str> = rows.iter().map(|r| r.alg).collect();
        assert_eq!(names, HashSet::from(["PATR", "TERN", "HASH"]));
    }

    #[test]
    fn repetitions_redraw_fresh_samples_each_time() {
        // With repetitions > 1, the harness must not panic or lose rows;
        // the averaged bucket set should still cover the sampled lengths.
        let mut rng = StdRng::seed_from_u64(7);
        let (rows, by_m) = run_random_experiment(&mut rng, b'a', 2, 32, 3.0, 4, 2).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(!by_m.is_empty());
    }

    /// Spec §4.5's single-text experiment draws `ceil(target_size/10)`
    /// in-corpus words uniformly by index for the hit sample, not the full
    /// resized corpus: this pins that count down directly.
    #[test]
    fn single_text_hit_and_miss_samples_are_one_tenth_of_target_size() {
        let mut rng = StdRng::seed_from_u64(11);
        let corpus: Vec<Vec<u8>> = (0..40usize).map(|i| format!("word{i}").into_bytes()).collect();
        let target_size = 97usize;
        let (sample, hit_sample, miss_sample) =
            build_single_text_samples(&mut rng, &corpus, target_size).unwrap();

        assert_eq!(sample.len(), target_size);
        assert_eq!(hit_sample.len(), target_size.div_ceil(10));
        assert_eq!(miss_sample.len(), target_size.div_ceil(10));
        assert!(hit_sample.iter().all(|w| sample.contains(w)));
    }

    #[test]
    fn single_text_experiment_produces_one_row_per_structure() {
        let mut rng = StdRng::seed_from_u64(21);
        let corpus: Vec<Vec<u8>> = (0..30usize).map(|i| format!("tok{i}").into_bytes()).collect();
        let (rows, _by_m) = run_single_text_experiment(&mut rng, &corpus, 64, 2).unwrap();
        assert_eq!(rows.len(), 3);
        let names: HashSet<&str> = rows.iter().map(|r| r.alg).collect();
        assert_eq!(names, HashSet::from(["PATR", "TERN", "HASH"]));
    }

    /// Scenario S5 / testable property 4: every pair of `{PATR, TERN,
    /// HASH}` must agree on per-key occurrence counts for the same
    /// shuffled key multiset.
    #[test]
    fn scenario_s5_cross_structure_agreement_under_shared_shuffle() {
        use itertools::Itertools;

        let mut rng = StdRng::seed_from_u64(2024);
        let mut words = sampler::random_words(&mut rng, 256, 4.0, b'a', 2);
        words.shuffle(&mut rng);

        let mut structures = StructureKind::all_new();
        for s in structures.iter_mut() {
            for (i, w) in words.iter().enumerate() {
                s.insert(w, i, (i % 2) as u8);
            }
        }

        let unique: HashSet<&Vec<u8>> = words.iter().collect();
        for pair in structures.iter().combinations(2) {
            let (a, b) = (pair[0], pair[1]);
            for w in &unique {
                assert_eq!(
                    a.occurrences(w),
                    b.occurrences(w),
                    "{} and {} disagree on {:?}",
                    a.name(),
                    b.name(),
                    w
                );
            }
        }
    }

    #[test]
    fn similarity_identity_is_one() {
        let a: Vec<Vec<u8>> = vec![b"a".to_vec(), b"a".to_vec(), b"b".to_vec()];
        let rows = run_similarity_experiment("t", "t", 10, &a, &a.clone());
        for r in rows {
            assert!((r.similarity - 1.0).abs() < 1e-9, "{} gave {}", r.alg, r.similarity);
        }
    }

    #[test]
    fn similarity_disjoint_is_zero() {
        let a: Vec<Vec<u8>> = vec![b"a".to_vec(), b"a".to_vec()];
        let b: Vec<Vec<u8>> = vec![b"c".to_vec(), b"d".to_vec()];
        let rows = run_similarity_experiment("a", "b", 10, &a, &b);
        for r in rows {
            assert!((r.similarity - 0.0).abs() < 1e-9, "{} gave {}", r.alg, r.similarity);
        }
    }

    #[test]
    fn scenario_s4_similarity_value() {
        // A = [a,a,b] stream 0, B = [a,b,b] stream 1 -> sim = 2/3.
        let a: Vec<Vec<u8>> = vec![b"a".to_vec(), b"a".to_vec(), b"b".to_vec()];
        let b: Vec<Vec<u8>> = vec![b"a".to_vec(), b"b".to_vec(), b"b".to_vec()];
        let rows = run_similarity_experiment("A", "B", 10, &a, &b);
        for r in rows {
            assert!((r.similarity - (2.0 / 3.0)).abs() < 1e-9, "{} gave {}", r.alg, r.similarity);
        }
    }

    #[test]
    fn similarity_score_is_always_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(99);
        let a = sampler::random_words(&mut rng, 20, 3.0, b'a', 5);
        let b = sampler::random_words(&mut rng, 20, 3.0, b'a', 5);
        let rows = run_similarity_experiment("x", "y", 10, &a, &b);
        for r in rows {
            assert!((0.0..=1.0).contains(&r.similarity));
        }
    }
}
