//! Trigram-based fuzzy string similarity.
//!
//! Strings are lower-cased and split into words; each word is padded with two
//! leading and one trailing space before 3-character shingles are extracted
//! (the pg_trgm convention, so prefixes weigh more than interior substrings).
//! Similarity is the Jaccard coefficient over the two shingle sets.

use std::collections::HashSet;

/// Extract the padded trigram set of `text`.
fn trigrams(text: &str) -> HashSet<[char; 3]> {
  let mut set = HashSet::new();
  for word in text
    .split(|c: char| !c.is_alphanumeric())
    .filter(|w| !w.is_empty())
  {
    let mut padded: Vec<char> = vec![' ', ' '];
    padded.extend(word.chars().flat_map(char::to_lowercase));
    padded.push(' ');
    for window in padded.windows(3) {
      set.insert([window[0], window[1], window[2]]);
    }
  }
  set
}

/// Trigram similarity between two strings, in `[0, 1]`.
///
/// Empty (or punctuation-only) input on either side yields 0.0; identical
/// non-empty strings yield 1.0.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
  let ta = trigrams(a);
  let tb = trigrams(b);
  if ta.is_empty() || tb.is_empty() {
    return 0.0;
  }
  let shared = ta.intersection(&tb).count();
  let union = ta.len() + tb.len() - shared;
  shared as f64 / union as f64
}

/// Combined similarity of `query` against several fields forming one logical
/// signal (e.g. name sub-fields): the per-field scores are **summed**, not
/// averaged, so the result is intentionally unnormalized across fields.
/// Thresholds and weights applied downstream are calibrated to this scale.
pub fn similarity<'a>(
  fields: impl IntoIterator<Item = &'a str>,
  query: &str,
) -> f64 {
  fields
    .into_iter()
    .map(|field| trigram_similarity(field, query))
    .sum()
}
