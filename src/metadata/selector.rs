//! Automatic selection of the best search candidate for a title.
//!
//! Titles are compared with a token-sort ratio: both sides are lower-cased,
//! split on anything that is not alphanumeric, sorted and re-joined with
//! single spaces, then scored with rapidfuzz's normalized indel similarity on
//! a 0-100 scale. Only a score strictly above [`MATCH_THRESHOLD`] is accepted.

use chrono::Datelike;
use rapidfuzz::distance::indel;

use super::provider::SearchCandidate;

/// Minimum score (exclusive) for a candidate to be auto-selected.
pub const MATCH_THRESHOLD: u8 = 85;

/// Why no candidate was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// No candidate survived the filters or none scored above the threshold.
    #[error("no data")]
    NoConfidentMatch,
}

/// Normalize a title for token-sort comparison.
fn token_sort_key(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Token-sort similarity between two titles, from 0 to 100.
///
/// # Examples
///
/// ```
/// use showkeeper::metadata::selector::token_sort_ratio;
///
/// assert_eq!(token_sort_ratio("Expanse, The", "the expanse"), 100);
/// assert!(token_sort_ratio("The Expanse", "Doctor Who") < 50);
/// ```
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    let a = token_sort_key(a);
    let b = token_sort_key(b);
    if a.is_empty() && b.is_empty() {
        return 100;
    }
    let similarity = indel::normalized_similarity(a.chars(), b.chars());
    (similarity * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Pick the candidate whose title best matches `title`.
///
/// With `year` set to a non-zero year, only candidates premiering in that
/// year are considered and candidates without a premiere date are dropped.
/// `Some(0)` means the year is unknown and filters nothing. On equal scores the
/// earliest candidate wins. Returns the chosen candidate and its score.
pub fn select_best<'a>(
    candidates: &'a [SearchCandidate],
    title: &str,
    year: Option<i32>,
) -> Result<(&'a SearchCandidate, u8), MatchError> {
    let mut best: Option<(&SearchCandidate, u8)> = None;

    let eligible = candidates.iter().filter(|c| match year {
        Some(y) if y != 0 => c.premiered.is_some_and(|p| p.year() == y),
        _ => true,
    });

    for candidate in eligible {
        let score = token_sort_ratio(&candidate.title, title);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }

    match best {
        Some((candidate, score)) if score > MATCH_THRESHOLD => Ok((candidate, score)),
        _ => Err(MatchError::NoConfidentMatch),
    }
}
