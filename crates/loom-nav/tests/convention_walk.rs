//! Integration test for the convention-mode navigation walk, exercised
//! entirely through `loom_nav`'s public API.

use camino::Utf8PathBuf;

fn utf8(p: std::path::PathBuf) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(p).unwrap()
}

#[test]
fn discovers_nested_dynamic_and_dotfile_exclusion() {
    let dir = tempfile::tempdir().unwrap();
    let root = utf8(dir.path().to_path_buf());

    std::fs::write(root.join("index.html"), "home").unwrap();
    std::fs::create_dir(root.join("docs")).unwrap();
    std::fs::write(root.join("docs").join("index.html"), "docs home").unwrap();
    std::fs::write(root.join("docs").join("_slug.html"), "doc page").unwrap();
    std::fs::create_dir(root.join(".hidden")).unwrap();
    std::fs::write(root.join(".hidden").join("page.html"), "should not appear").unwrap();

    let model = loom_nav::build_convention(&root, "html", "index").unwrap();

    assert!(model.find_page("/").is_some());
    assert!(model.find_page("/docs").is_some());

    let doc = model.find_page("/docs/getting-started").unwrap();
    assert_eq!(doc.slug.as_deref(), Some("getting-started"));

    assert!(model.find_page("/.hidden/page").is_none());

    let nav = model.build_nav_data("/docs");
    assert!(nav.iter().any(|e| e.path == "/docs" && e.active));
    assert!(nav.iter().any(|e| e.path == "/" && !e.active));
}
