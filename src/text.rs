//! Normalizes raw corpus bytes into word tokens.
//!
//! Cleaning is ASCII-only and byte-oriented: lowercase letters, fold
//! newlines/tabs to spaces, fold punctuation (apostrophe excepted) to
//! spaces, drop anything else that isn't alphanumeric, space, or `'`, then
//! split on space.

/// Cleans and tokenizes a raw byte blob.
pub fn words_from_bytes(input: &[u8]) -> Vec<Vec<u8>> {
    let cleaned = clean_bytes(input);
    split_on_space(&cleaned)
}

fn clean_bytes(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    for &b in input {
        match b {
            b'A'..=b'Z' => out.push(b.to_ascii_lowercase()),
            b'\n' | b'\t' => out.push(b' '),
            b'\'' => out.push(b),
            _ if is_ascii_punct(b) => out.push(b' '),
            _ if b.is_ascii_alphanumeric() || b == b' ' => out.push(b),
            _ => {} // drop: not alnum, space, or apostrophe
        }
    }
    out
}

fn is_ascii_punct(b: u8) -> bool {
    matches!(b, 0x21..=0x2F | 0x3A..=0x40 | 0x5B..=0x60 | 0x7B..=0x7E) && b != b'\''
}

fn split_on_space(cleaned: &[u8]) -> Vec<Vec<u8>> {
    cleaned
        .split(|&b| b == b' ')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words_str(input: &str) -> Vec<String> {
        words_from_bytes(input.as_bytes())
            .into_iter()
            .map(|w| String::from_utf8(w).unwrap())
            .collect()
    }

    #[test]
    fn lowercases_letters() {
        assert_eq!(words_str("HELLO World"), vec!["hello", "world"]);
    }

    #[test]
    fn folds_newlines_and_tabs_to_space() {
        assert_eq!(words_str("one\ntwo\tthree"), vec!["one", "two", "three"]);
    }

    #[test]
    fn keeps_apostrophes_inside_words() {
        assert_eq!(words_str("he's there"), vec!["he's", "there"]);
    }

    #[test]
    fn folds_other_punctuation_to_space() {
        assert_eq!(words_str("wait, no! really?"), vec!["wait", "no", "really"]);
    }

    #[test]
    fn drops_bytes_outside_alnum_space_apostrophe() {
        assert_eq!(words_str("caf\u{e9} test"), vec!["cafe", "test"]);
    }

    #[test]
    fn collapses_runs_of_space_without_empty_tokens() {
        assert_eq!(words_str("  a    b  "), vec!["a", "b"]);
    }

    #[test]
    fn empty_input_yields_no_words() {
        assert!(words_str("").is_empty());
    }
}
