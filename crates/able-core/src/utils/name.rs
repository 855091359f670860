//! Package name helpers.

/// Separator between package name segments
pub const SEGMENT_SEPARATOR: char = '.';

/// Turn a manifest name or directory name into a package segment
pub fn sanitize_segment(segment: &str) -> String {
    segment.trim().replace('-', "_")
}

/// Join segments into a dotted package name, skipping empty segments
pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a dotted package name into its non-empty segments
pub fn split_name(name: &str) -> Vec<String> {
    name.split(SEGMENT_SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
