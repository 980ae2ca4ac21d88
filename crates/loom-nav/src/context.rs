//! Context-mode page discovery: classifies a supplied include list into
//! pages and shared fragments, then augments it with an optional
//! `pages/` directory and shared fragments found beside the entry file.

use camino::{Utf8Path, Utf8PathBuf};

use crate::naming::{join_url, title_from_stem};

/// Directories never treated as implicit shared-fragment sources when
/// scanning the entry directory's immediate children.
const ASSET_DENY_LIST: &[&str] = &["assets", "static", "public", "node_modules", ".git"];

#[derive(Debug, Clone)]
pub struct ContextPage {
    pub url_path: String,
    pub file: Utf8PathBuf,
    pub title: String,
    pub linked_data_file: Option<Utf8PathBuf>,
}

/// Flexible-whitespace detection of a `{{define "content"}}` directive
/// in raw template source.
pub fn has_content_definition(source: &str) -> bool {
    let bytes = source.as_bytes();
    let needle = b"define";
    let mut i = 0;
    while i + needle.len() <= bytes.len() {
        if &bytes[i..i + needle.len()] == needle {
            let mut j = i + needle.len();
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if bytes[j..].starts_with(b"\"content\"") {
                return true;
            }
        }
        i += 1;
    }
    false
}

/// Classifies `includes` into (pages, shared). The entry file is always
/// shared even if it happens to contain a `content` definition.
pub fn classify(
    includes: &[(Utf8PathBuf, String)],
    entry_path: &Utf8Path,
) -> (Vec<ContextPage>, Vec<Utf8PathBuf>) {
    let mut pages = Vec::new();
    let mut shared = Vec::new();
    for (path, source) in includes {
        if path == entry_path {
            shared.push(path.clone());
            continue;
        }
        if has_content_definition(source) {
            pages.push(ContextPage {
                url_path: page_url_for(path),
                file: path.clone(),
                title: title_from_stem(path.file_stem().unwrap_or(path.as_str())),
                linked_data_file: None,
            });
        } else {
            shared.push(path.clone());
        }
    }
    (pages, shared)
}

fn page_url_for(path: &Utf8Path) -> String {
    let stem = path.file_stem().unwrap_or(path.as_str());
    if stem == "index" {
        "/".to_string()
    } else {
        join_url("/", stem)
    }
}

/// Searches the include list's directories, the entry file's own
/// sibling `pages/`, and the ancestors of included files up to the
/// entry file's directory, for a directory literally named `pages`.
pub fn discover_pages_dir(entry_path: &Utf8Path, include_paths: &[Utf8PathBuf]) -> Option<Utf8PathBuf> {
    let entry_dir = entry_path.parent()?;
    let sibling = entry_dir.join("pages");
    if sibling.is_dir() {
        return Some(sibling);
    }
    for inc in include_paths {
        let Some(mut dir) = inc.parent().map(Utf8Path::to_path_buf) else { continue };
        loop {
            let candidate = dir.join("pages");
            if candidate.is_dir() {
                return Some(candidate);
            }
            if dir == entry_dir {
                break;
            }
            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => break,
            }
        }
    }
    None
}

/// Walks `pages_dir` for additional files whose content defines
/// `content`; each becomes a context-page using the same index/segment
/// naming rules as convention mode (flattened — context mode does not
/// build a nested tree, only a flat page list).
pub fn walk_pages_dir(pages_dir: &Utf8Path, extension: &str) -> std::io::Result<Vec<ContextPage>> {
    let mut pages = Vec::new();
    walk_pages_dir_into(pages_dir, "/", extension, &mut pages)?;
    Ok(pages)
}

fn walk_pages_dir_into(
    dir: &Utf8Path,
    url_prefix: &str,
    extension: &str,
    out: &mut Vec<ContextPage>,
) -> std::io::Result<()> {
    let mut entries: Vec<Utf8PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) {
            entries.push(path);
        }
    }
    entries.sort();
    for path in entries {
        let name = path.file_name().unwrap_or_default();
        if name.starts_with('.') {
            continue;
        }
        if path.is_dir() {
            let sub_url = join_url(url_prefix, path.file_stem().unwrap_or(&name));
            walk_pages_dir_into(&path, &sub_url, extension, out)?;
            continue;
        }
        if path.extension() != Some(extension) {
            continue;
        }
        let source = std::fs::read_to_string(&path)?;
        if !has_content_definition(&source) {
            continue;
        }
        let stem = path.file_stem().unwrap_or(&name);
        let url_path = if stem == "index" {
            url_prefix.to_string()
        } else {
            join_url(url_prefix, stem)
        };
        out.push(ContextPage {
            url_path,
            title: title_from_stem(stem),
            file: path,
            linked_data_file: None,
        });
    }
    Ok(())
}

/// Scans the immediate subdirectories of the entry directory (excluding
/// the asset deny-list and a `pages/` root) for template files not
/// already in `known`, treating each as an additional shared fragment.
pub fn discover_extra_shared(
    entry_path: &Utf8Path,
    extension: &str,
    known: &std::collections::HashSet<Utf8PathBuf>,
) -> std::io::Result<Vec<Utf8PathBuf>> {
    let mut out = Vec::new();
    let Some(entry_dir) = entry_path.parent() else {
        return Ok(out);
    };
    for entry in std::fs::read_dir(entry_dir)? {
        let entry = entry?;
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else { continue };
        let name = path.file_name().unwrap_or_default().to_string();
        if path.is_dir() {
            if name.starts_with('.') || name == "pages" || ASSET_DENY_LIST.contains(&name.as_str()) {
                continue;
            }
            for inner in std::fs::read_dir(&path)? {
                let inner = inner?;
                let Ok(inner_path) = Utf8PathBuf::from_path_buf(inner.path()) else { continue };
                if inner_path.extension() == Some(extension) && !known.contains(&inner_path) {
                    out.push(inner_path);
                }
            }
        }
    }
    Ok(out)
}
