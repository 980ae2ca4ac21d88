pub mod error;
pub mod resolve;
pub mod types;

pub use error::{FixtureError, Result};
pub use resolve::{load_fixtures, resolve_fixture, sanitize_path};
pub use types::{Fixture, TemplateContext};

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn fixture(path: &str, text: &str) -> Fixture {
        Fixture::from_json(Utf8PathBuf::from(path), text).unwrap()
    }

    #[test]
    fn sanitize_replaces_separators() {
        assert_eq!(sanitize_path("blog/post.html"), "blog--post.html");
        assert_eq!(sanitize_path("a\\b/c.html"), "a--b--c.html");
    }

    #[test]
    fn metadata_entry_file_match_wins() {
        let f1 = fixture(
            "fixtures/a.json",
            r#"{"_templateContext": {"entryFile": "post.html", "includedFiles": [], "lastSaved": null}, "title": "via metadata"}"#,
        );
        let f2 = fixture("fixtures/blog--post.json", r#"{"title": "via filename"}"#);
        let fixtures = vec![f2, f1];

        let resolved = resolve_fixture("blog/post.html", &fixtures).unwrap();
        assert_eq!(resolved.data.get("title").unwrap(), "via metadata");
    }

    #[test]
    fn metadata_included_files_match() {
        let f = fixture(
            "fixtures/shared.json",
            r#"{"_templateContext": {"entryFile": null, "includedFiles": ["partial.html"], "lastSaved": null}, "title": "shared"}"#,
        );
        let fixtures = vec![f];
        let resolved = resolve_fixture("includes/partial.html", &fixtures).unwrap();
        assert_eq!(resolved.data.get("title").unwrap(), "shared");
    }

    #[test]
    fn legacy_sanitised_filename_fallback() {
        let f = fixture("fixtures/blog--post.json", r#"{"title": "legacy"}"#);
        let fixtures = vec![f];
        let resolved = resolve_fixture("blog/post.html", &fixtures).unwrap();
        assert_eq!(resolved.data.get("title").unwrap(), "legacy");
    }

    #[test]
    fn basename_only_metadata_match_can_cross_directories() {
        // Two pages share a base name ("post.html") in different directories;
        // basename-only matching resolves the same fixture for both, which
        // is the documented open-question tradeoff rather than a bug.
        let f = fixture(
            "fixtures/a.json",
            r#"{"_templateContext": {"entryFile": "post.html", "includedFiles": [], "lastSaved": null}, "title": "blog post"}"#,
        );
        let fixtures = vec![f];
        let resolved = resolve_fixture("news/post.html", &fixtures);
        assert!(resolved.is_some());
        assert_eq!(resolved.unwrap().data.get("title").unwrap(), "blog post");
    }
}
