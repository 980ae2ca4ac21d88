pub mod context;
pub mod error;
pub mod model;
pub mod naming;
pub mod tree;

pub use context::ContextPage;
pub use error::{NavError, Result};
pub use model::{NavEntry, NavModel, PageMatch};
pub use tree::{NavTree, PageNode};

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};

/// Builds the convention-mode model by walking `pages_dir`.
pub fn build_convention(pages_dir: &Utf8Path, extension: &str, index_stem: &str) -> Result<NavModel> {
    let tree = tree::build_convention_tree(pages_dir, extension, index_stem)?;
    Ok(NavModel::Convention(tree))
}

/// Builds the context-mode model from the entry file and its include
/// list: classifies the include list, discovers an optional `pages/`
/// directory, and folds in extra shared fragments found beside the
/// entry file.
pub fn build_context(
    entry_path: &Utf8Path,
    includes: &[(Utf8PathBuf, String)],
    extension: &str,
) -> std::io::Result<(NavModel, Vec<Utf8PathBuf>)> {
    let (mut pages, mut shared) = context::classify(includes, entry_path);

    let include_paths: Vec<Utf8PathBuf> = includes.iter().map(|(p, _)| p.clone()).collect();
    if let Some(pages_dir) = context::discover_pages_dir(entry_path, &include_paths) {
        let discovered = context::walk_pages_dir(&pages_dir, extension)?;
        let existing: HashSet<String> = pages.iter().map(|p| p.url_path.clone()).collect();
        for page in discovered {
            if !existing.contains(&page.url_path) {
                pages.push(page);
            }
        }
    }

    let known: HashSet<Utf8PathBuf> = include_paths.into_iter().collect();
    let extra = context::discover_extra_shared(entry_path, extension, &known)?;
    shared.extend(extra);

    pages.sort_by(|a, b| a.url_path.cmp(&b.url_path));
    Ok((NavModel::Context(pages), shared))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn utf8(p: std::path::PathBuf) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(p).unwrap()
    }

    #[test]
    fn convention_tree_routes_index_and_nested_pages() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(dir.path().to_path_buf());
        fs::write(root.join("index.html"), "home").unwrap();
        fs::create_dir(root.join("blog")).unwrap();
        fs::write(root.join("blog").join("index.html"), "blog home").unwrap();
        fs::write(root.join("blog").join("_slug.html"), "post").unwrap();

        let model = build_convention(&root, "html", "index").unwrap();
        let home = model.find_page("/").unwrap();
        assert!(home.file.is_some());

        let blog = model.find_page("/blog").unwrap();
        assert!(blog.file.is_some());

        let post = model.find_page("/blog/my-first-post").unwrap();
        assert_eq!(post.slug.as_deref(), Some("my-first-post"));
    }

    #[test]
    fn sibling_json_overrides_title_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(dir.path().to_path_buf());
        fs::write(root.join("index.html"), "home").unwrap();
        fs::write(root.join("about.html"), "about").unwrap();
        fs::write(root.join("about.json"), r#"{"title": "About Us", "order": 5}"#).unwrap();

        let model = build_convention(&root, "html", "index").unwrap();
        let about = model.find_page("/about").unwrap();
        assert_eq!(about.title, "About Us");
    }

    #[test]
    fn context_mode_classifies_pages_and_shared() {
        let entry = Utf8PathBuf::from("/workspace/layout.html");
        let includes = vec![
            (entry.clone(), r#"{{template "content" .}}"#.to_string()),
            (
                Utf8PathBuf::from("/workspace/index.html"),
                r#"{{define "content"}}hi{{end}}"#.to_string(),
            ),
        ];
        let (pages, shared) = context::classify(&includes, &entry);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].url_path, "/");
        assert_eq!(shared, vec![entry]);
    }

    #[test]
    fn nav_data_marks_current_page_active() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(dir.path().to_path_buf());
        fs::write(root.join("index.html"), "home").unwrap();
        fs::write(root.join("about.html"), "about").unwrap();

        let model = build_convention(&root, "html", "index").unwrap();
        let entries = model.build_nav_data("/about");
        let about = entries.iter().find(|e| e.path == "/about").unwrap();
        assert!(about.active);
        let home = entries.iter().find(|e| e.path == "/").unwrap();
        assert!(!home.active);
    }
}
