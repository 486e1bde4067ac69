//! Line-level merging of two recognized texts.
//!
//! Deduplication is by exact match of trimmed lines; near-duplicates that
//! differ by a character are kept as separate lines.

use std::collections::HashSet;

/// Trimmed, non-empty lines of `text` in order.
fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Concatenate the lines of `first` and `second`, dropping repeated lines and
/// keeping the first occurrence of each.
pub fn merge_lines(first: &str, second: &str) -> String {
    let mut seen = HashSet::new();
    let merged: Vec<&str> = lines(first)
        .chain(lines(second))
        .filter(|line| seen.insert(*line))
        .collect();
    merged.join("\n")
}

/// Keep `primary` as the base text and append the lines of `secondary` that
/// it does not already contain.
///
/// With `skip_ratio` set, a primary more than `skip_ratio` times longer than
/// the secondary is considered complete and returned unchanged.
pub fn supplement(primary: &str, secondary: &str, skip_ratio: Option<f64>) -> String {
    let base = primary.trim();

    if let Some(ratio) = skip_ratio {
        let primary_len = base.chars().count() as f64;
        let secondary_len = secondary.trim().chars().count() as f64;
        if primary_len > secondary_len * ratio {
            return base.to_string();
        }
    }

    let present: HashSet<&str> = lines(base).collect();
    let mut added = HashSet::new();
    let extra: Vec<&str> = lines(secondary)
        .filter(|line| !present.contains(line) && added.insert(*line))
        .collect();

    if extra.is_empty() {
        base.to_string()
    } else if base.is_empty() {
        extra.join("\n")
    } else {
        format!("{}\n{}", base, extra.join("\n"))
    }
}
