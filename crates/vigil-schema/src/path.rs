//! Dotted path helpers. The root is the empty path; array indices are plain
//! segments, so the third element's `city` is `"addresses.2.city"`.

/// Appends a segment, without a leading dot at the root.
pub fn join(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{base}.{segment}")
    }
}

pub fn join_index(base: &str, index: usize) -> String {
    join(base, &index.to_string())
}

/// Parses an array index segment. Only plain ASCII digits qualify.
pub fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|segment| !segment.is_empty())
}

/// Splits off the last segment: `"a.b.c"` gives `("a.b", "c")`.
pub fn split_last(path: &str) -> (&str, &str) {
    match path.rfind('.') {
        Some(at) => (&path[..at], &path[at + 1..]),
        None => ("", path),
    }
}

/// Whether `path` equals `prefix` or lies below it. Everything is within the
/// root.
pub fn is_within(path: &str, prefix: &str) -> bool {
    prefix.is_empty()
        || path == prefix
        || (path.len() > prefix.len()
            && path.starts_with(prefix)
            && path.as_bytes()[prefix.len()] == b'.')
}
