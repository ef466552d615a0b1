//! Random word generation and in/out-of-corpus sampling for the harness.
//!
//! Generic over any `rand::Rng` so tests can drive it with a seeded
//! `StdRng` for reproducible fixtures while the binary seeds from entropy
//! (or an explicit `--seed`).

use rand::Rng;
use std::collections::HashSet;

use crate::error::{HarnessError, Result};

/// Ceiling on rejection-sampling attempts before giving up and reporting
/// `SampleExhausted`; avoids spinning forever on a saturated alphabet.
const MAX_REJECTION_ATTEMPTS: usize = 1_000_000;

/// Draws a word length from Binomial(n = ceil(mean / 0.5), p = 0.5),
/// rejecting zero so every generated word has at least one byte.
pub fn sample_word_length(rng: &mut impl Rng, mean: f64) -> usize {
    let n = (mean / 0.5).ceil() as u32;
    loop {
        let len = binomial(rng, n, 0.5);
        if len > 0 {
            return len;
        }
    }
}

/// n independent Bernoulli(p) trials, summed.
fn binomial(rng: &mut impl Rng, n: u32, p: f64) -> usize {
    (0..n).filter(|_| rng.gen_bool(p)).count()
}

/// Builds one random word of the given length, each byte drawn uniformly
/// from `[alphabet_start, alphabet_start + alphabet_size)`.
pub fn random_word(rng: &mut impl Rng, length: usize, alphabet_start: u8, alphabet_size: u8) -> Vec<u8> {
    (0..length)
        .map(|_| alphabet_start + rng.gen_range(0..alphabet_size))
        .collect()
}

/// Generates `count` random in-corpus words with lengths centered on
/// `mean_length`, over the given alphabet.
pub fn random_words(
    rng: &mut impl Rng,
    count: usize,
    mean_length: f64,
    alphabet_start: u8,
    alphabet_size: u8,
) -> Vec<Vec<u8>> {
    (0..count)
        .map(|_| {
            let len = sample_word_length(rng, mean_length);
            random_word(rng, len, alphabet_start, alphabet_size)
        })
        .collect()
}

/// Draws `count` words guaranteed absent from `existing`, with lengths
/// uniform in `[1, max_len]`, by rejection sampling over the alphabet.
pub fn words_not_in(
    rng: &mut impl Rng,
    existing: &HashSet<Vec<u8>>,
    count: usize,
    max_len: usize,
    alphabet_start: u8,
    alphabet_size: u8,
) -> Result<Vec<Vec<u8>>> {
    let max_len = max_len.max(1);
    let mut drawn = Vec::with_capacity(count);
    let mut attempts = 0usize;
    while drawn.len() < count {
        if attempts >= MAX_REJECTION_ATTEMPTS {
            return Err(HarnessError::SampleExhausted {
                target: count,
                drawn: drawn.len(),
            });
        }
        attempts += 1;
        let len = rng.gen_range(1..=max_len);
        let candidate = random_word(rng, len, alphabet_start, alphabet_size);
        if !existing.contains(&candidate) {
            drawn.push(candidate);
        }
    }
    Ok(drawn)
}

/// Draws `count` words uniformly (with replacement) from an existing
/// corpus/sample; every index is already present, so no rejection is
/// needed.
pub fn words_in(rng: &mut impl Rng, corpus: &[Vec<u8>], count: usize) -> Vec<Vec<u8>> {
    assert!(!corpus.is_empty(), "cannot sample from an empty corpus");
    (0..count)
        .map(|_| corpus[rng.gen_range(0..corpus.len())].clone())
        .collect()
}

/// Stably sorts words by `(length, lexicographic)` so per-length timing
/// buckets can be formed by a single linear scan afterward.
pub fn sort_by_length_then_lex(words: &mut [Vec<u8>]) {
    words.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn sampled_word_length_is_never_zero() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            assert!(sample_word_length(&mut rng, 4.0) > 0);
        }
    }

    #[test]
    fn random_word_respects_alphabet_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let word = random_word(&mut rng, 64, b'a', 5);
        assert!(word.iter().all(|&b| (b'a'..b'a' + 5).contains(&b)));
    }

    #[test]
    fn words_not_in_never_collides_with_existing() {
        let mut rng = StdRng::seed_from_u64(1);
        let existing: HashSet<Vec<u8>> = ["aa", "ab", "ba", "bb"]
            .iter()
            .map(|s| s.as_bytes().to_vec())
            .collect();
        let drawn = words_not_in(&mut rng, &existing, 10, 2, b'a', 2).unwrap();
        assert_eq!(drawn.len(), 10);
        assert!(drawn.iter().all(|w| !existing.contains(w)));
    }

    #[test]
    fn words_not_in_reports_exhaustion_on_impossible_request() {
        let mut rng = StdRng::seed_from_u64(3);
        // Alphabet of size 1 and max_len 1 has exactly one possible word,
        // which we mark as already existing: no word can ever be drawn.
        let existing: HashSet<Vec<u8>> = [vec![b'a']].into_iter().collect();
        let err = words_not_in(&mut rng, &existing, 1, 1, b'a', 1).unwrap_err();
        assert!(matches!(err, HarnessError::SampleExhausted { .. }));
    }

    #[test]
    fn words_in_only_draws_from_existing_entries() {
        let mut rng = StdRng::seed_from_u64(9);
        let corpus = vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()];
        let drawn = words_in(&mut rng, &corpus, 20);
        assert!(drawn.iter().all(|w| corpus.contains(w)));
    }

    #[test]
    fn sort_orders_by_length_then_lex() {
        let mut words = vec![b"bb".to_vec(), b"a".to_vec(), b"aa".to_vec(), b"c".to_vec()];
        sort_by_length_then_lex(&mut words);
        assert_eq!(words, vec![b"a".to_vec(), b"c".to_vec(), b"aa".to_vec(), b"bb".to_vec()]);
    }
}
