//! Shared naming rules used by both convention-mode and context-mode page
//! discovery: the index filename convention, the dynamic-segment marker,
//! and the `-`/`_` → title-case title derivation.

/// A basename starting with this is a dynamic-segment matcher (and, for
/// directories, is also skipped for automatic recursion).
pub const DYNAMIC_MARKER: char = '_';

/// True if `stem` (a file/dir basename without extension) is the index
/// convention for `index_stem` (normally `"index"`, configurable via
/// `ServeConfig::index_file`).
pub fn is_index(stem: &str, index_stem: &str) -> bool {
    stem == index_stem
}

/// Splits a leading dynamic-segment marker off `stem`, returning whether
/// it was present and the remaining text used for title derivation.
pub fn strip_dynamic_marker(stem: &str) -> (bool, &str) {
    match stem.strip_prefix(DYNAMIC_MARKER) {
        Some(rest) if !rest.is_empty() => (true, rest),
        _ => (false, stem),
    }
}

/// `-`/`_` become spaces, then the result is title-cased.
pub fn title_from_stem(stem: &str) -> String {
    let spaced: String = stem.chars().map(|c| if c == '-' || c == '_' { ' ' } else { c }).collect();
    spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Joins a URL parent path with one segment, producing a path that
/// starts with `/` and has no trailing `/` (invariant I1), except for
/// the root itself.
pub fn join_url(parent: &str, segment: &str) -> String {
    if parent == "/" {
        format!("/{segment}")
    } else {
        format!("{parent}/{segment}")
    }
}

pub fn last_segment(url_path: &str) -> &str {
    url_path.rsplit('/').next().unwrap_or(url_path)
}
