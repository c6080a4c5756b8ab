//! Season and episode number extraction from filenames.
//!
//! Two independent, case-insensitive patterns are applied to the filename:
//! one captures the digits between `s` and `e`, the other the digits after
//! `s<digits>e`. Both must match for a file to be identified; there is no
//! partial inference.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static SEASON_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)s(\d+)e").expect("season pattern is valid"));

static EPISODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)s\d+e(\d+)").expect("episode pattern is valid"));

fn capture_number(pattern: &Regex, filename: &str) -> Option<u32> {
    pattern
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .filter(|m| !m.as_str().is_empty())
        .and_then(|m| m.as_str().parse().ok())
}

/// Extract `(season, episode)` from a filename such as `Show.S02E05.mkv`.
///
/// Returns `None` unless both numbers can be found.
///
/// # Examples
///
/// ```
/// use showkeeper::scanner::identifier::extract_episode_numbers;
///
/// assert_eq!(extract_episode_numbers("Show.Name.S02E05.mkv"), Some((2, 5)));
/// assert_eq!(extract_episode_numbers("Show.Name.Episode5.mkv"), None);
/// ```
pub fn extract_episode_numbers(filename: &str) -> Option<(u32, u32)> {
    let season = capture_number(&SEASON_PATTERN, filename)?;
    let episode = capture_number(&EPISODE_PATTERN, filename)?;
    Some((season, episode))
}

/// Like [`extract_episode_numbers`], using only the final path component.
pub fn identify_path(path: &Path) -> Option<(u32, u32)> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(extract_episode_numbers)
}
