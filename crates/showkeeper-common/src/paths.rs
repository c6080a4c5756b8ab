//! Path utilities for detecting video files by extension.

use std::path::Path;

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "m2ts", "webm", "mov", "wmv", "flv", "mpg", "mpeg",
];

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use showkeeper_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("Show.S01E01.mkv")));
/// assert!(is_video_file(Path::new("/library/Show/Season 1/episode.MP4")));
/// assert!(!is_video_file(Path::new("Show.S01E01.srt")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
