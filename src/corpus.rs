//! Corpus loading: turns a directory of text files into tokenized word
//! lists the harness can draw samples from.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HarnessError, Result};
use crate::text::words_from_bytes;

/// Reads and tokenizes every file under `dir` whose extension matches
/// `ext` (without the leading dot), sorted by file name for a
/// deterministic iteration order across runs.
pub fn load_corpus_dir(dir: &Path, ext: &str) -> Result<Vec<(String, Vec<Vec<u8>>)>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(ext))
        .collect();
    entries.sort();

    entries
        .into_iter()
        .map(|path| {
            let words = load_corpus_file(&path)?;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned());
            Ok((name, words))
        })
        .collect()
}

/// Reads and tokenizes a single corpus file.
pub fn load_corpus_file(path: &Path) -> Result<Vec<Vec<u8>>> {
    let bytes = fs::read(path)?;
    let words = words_from_bytes(&bytes);
    if words.is_empty() {
        return Err(HarnessError::EmptyCorpus { path: path.to_path_buf() });
    }
    Ok(words)
}

/// Truncates or cyclically repeats `words` until it has exactly
/// `target_size` entries, matching the single-text experiment's sizing
/// step. `words` must be non-empty.
pub fn match_word_count(words: &[Vec<u8>], target_size: usize) -> Vec<Vec<u8>> {
    assert!(!words.is_empty(), "cannot resize an empty corpus");
    (0..target_size).map(|i| words[i % words.len()].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_word_count_truncates() {
        let words = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];
        let out = match_word_count(&words, 2);
        assert_eq!(out, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn match_word_count_cyclically_repeats() {
        let words = vec![b"a".to_vec(), b"b".to_vec()];
        let out = match_word_count(&words, 5);
        assert_eq!(
            out,
            vec![b"a".to_vec(), b"b".to_vec(), b"a".to_vec(), b"b".to_vec(), b"a".to_vec()]
        );
    }
}
