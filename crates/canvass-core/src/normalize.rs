//! Query normalization for free-text search input.

/// Lower-case `input` and collapse every maximal run of non-alphanumeric
/// characters to a single space, trimming the ends.
pub fn normalize(input: &str) -> String {
  let lowered = input.to_lowercase();
  let mut out = String::with_capacity(lowered.len());
  for token in lowered
    .split(|c: char| !c.is_alphanumeric())
    .filter(|t| !t.is_empty())
  {
    if !out.is_empty() {
      out.push(' ');
    }
    out.push_str(token);
  }
  out
}

/// Normalize an optional query field.
///
/// `None` passes through unchanged: "no query" skips filtering on that field
/// entirely, while an empty string still participates in scoring (against an
/// empty target it scores zero). Callers must preserve that distinction.
pub fn normalize_query(query: Option<&str>) -> Option<String> {
  query.map(normalize)
}
