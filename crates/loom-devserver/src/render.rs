//! Page rendering for both navigation modes.

use camino::{Utf8Path, Utf8PathBuf};
use loom_fixture::Fixture;
use loom_nav::PageMatch;
use loom_template::{IncludeFile, Value};
use serde_json::Map;

use crate::state::AppState;

/// Shallow merge: keys from `overlay` win over `base`. Non-object values
/// on either side are simply replaced by the overlay as a whole.
pub fn merge_objects(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut b), Value::Object(o)) => {
            for (k, v) in o {
                b.insert(k, v);
            }
            Value::Object(b)
        }
        (_, overlay) => overlay,
    }
}

fn read_template(path: &Utf8Path) -> std::io::Result<String> {
    std::fs::read_to_string(path)
}

/// Every file directly inside `dir` with the configured extension,
/// loaded as an `IncludeFile` (used for the partials directory, which is
/// shared across every render regardless of mode).
fn load_dir_includes(dir: &Utf8Path, extension: &str) -> Vec<IncludeFile> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return out;
    };
    for entry in entries.flatten() {
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
            continue;
        };
        if path.extension() != Some(extension) {
            continue;
        }
        if let Ok(source) = std::fs::read_to_string(&path) {
            out.push(IncludeFile { path, source });
        }
    }
    out
}

fn env_map(prefix: &str) -> Value {
    let mut map = Map::new();
    for (key, value) in std::env::vars() {
        if let Some(stripped) = key.strip_prefix(prefix) {
            map.insert(stripped.to_string(), Value::String(value));
        }
    }
    Value::Object(map)
}

fn site_data(state: &AppState) -> Value {
    match &state.config.data_file {
        Some(path) => std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_else(|| Value::Object(Map::new())),
        None => Value::Object(Map::new()),
    }
}

/// Loads every fixture in the configured data directory, if any.
fn load_fixtures(state: &AppState) -> Vec<Fixture> {
    match &state.config.data_dir {
        Some(dir) => loom_fixture::load_fixtures(dir).unwrap_or_default(),
        None => Vec::new(),
    }
}

fn fixture_data_for(fixtures: &[Fixture], relative_path: &str) -> Value {
    loom_fixture::resolve_fixture(relative_path, fixtures)
        .map(|f| f.data.clone())
        .unwrap_or_else(|| Value::Object(Map::new()))
}

fn relative_to(path: &Utf8Path, root: &Utf8Path) -> String {
    path.strip_prefix(root).unwrap_or(path).to_string()
}

pub enum RenderOutcome {
    Ok(String),
    NotFound,
    Error(String),
}

/// Convention-mode render: resolve the URL via the navigation model (or a
/// direct filesystem fallback), overlay dynamic-slug data, execute the
/// layout over the page, falling back to the bare page template if the
/// layout fails to execute.
pub fn render_convention(state: &AppState, nav: &loom_nav::NavModel, url: &str) -> RenderOutcome {
    let matched = nav.find_page(url).or_else(|| direct_resolve(state, url));
    let Some(page) = matched else {
        return RenderOutcome::NotFound;
    };
    let Some(file) = &page.file else {
        return RenderOutcome::NotFound;
    };
    let source = match read_template(file) {
        Ok(s) => s,
        Err(e) => return RenderOutcome::Error(e.to_string()),
    };

    let fixtures = load_fixtures(state);
    let relative = relative_to(file, &state.config.pages_dir);
    let mut data = fixture_data_for(&fixtures, &relative);

    let mut title = page.title.clone();
    if let Some(slug) = &page.slug {
        if let Some(overlay) = load_slug_data(file, slug) {
            if let Some(t) = overlay.get("title").and_then(|v| v.as_str()) {
                title = t.to_string();
            }
            data = merge_objects(data, overlay);
        }
    }

    let mut page_obj = Map::new();
    page_obj.insert("Title".to_string(), Value::String(title));
    page_obj.insert("Path".to_string(), Value::String(page.url_path.clone()));

    let mut root = Map::new();
    root.insert("Page".to_string(), Value::Object(page_obj));
    root.insert("Site".to_string(), site_data(state));
    root.insert("Env".to_string(), env_map(&state.config.env_prefix));
    root.insert("Dev".to_string(), Value::Bool(true));
    root.insert("Slug".to_string(), page.slug.clone().map(Value::String).unwrap_or(Value::Null));
    root.insert("Path".to_string(), Value::String(page.url_path.clone()));
    root.insert("Data".to_string(), data);
    let render_data = Value::Object(root);

    let layout_path = state.config.layouts_dir.join(&state.config.layout_file);
    let Ok(layout_source) = read_template(&layout_path) else {
        return match loom_template::render(file, &source, &[], render_data, None) {
            Ok(html) => RenderOutcome::Ok(html),
            Err(e) => RenderOutcome::Error(e.to_string()),
        };
    };

    let mut includes = load_dir_includes(&state.config.partials_dir, "html");
    includes.push(IncludeFile {
        path: file.clone(),
        source: source.clone(),
    });

    match loom_template::render(&layout_path, &layout_source, &includes, render_data.clone(), None) {
        Ok(html) => RenderOutcome::Ok(html),
        Err(_) => match loom_template::render(file, &source, &[], render_data, None) {
            Ok(html) => RenderOutcome::Ok(html),
            Err(e) => RenderOutcome::Error(e.to_string()),
        },
    }
}

fn load_slug_data(file: &Utf8Path, slug: &str) -> Option<Value> {
    let dir = file.parent()?;
    let candidates = [dir.join("data").join(format!("{slug}.json")), dir.join(format!("{slug}.json"))];
    for candidate in candidates {
        if let Ok(text) = std::fs::read_to_string(&candidate) {
            if let Ok(value) = serde_json::from_str(&text) {
                return Some(value);
            }
        }
    }
    None
}

/// Direct filesystem resolution when the navigation model has no match
/// for `url`: exact file, nested `index`, or a dynamic-segment file in
/// the parent directory.
fn direct_resolve(state: &AppState, url: &str) -> Option<PageMatch> {
    let ext = "html";
    let segments: Vec<&str> = url.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();
    let mut dir = state.config.pages_dir.clone();
    for seg in &segments {
        dir = dir.join(seg);
    }

    let exact = dir.with_extension(ext);
    if exact.is_file() {
        return Some(PageMatch {
            url_path: url.to_string(),
            file: Some(exact),
            title: loom_nav::naming::title_from_stem(segments.last().copied().unwrap_or("")),
            data: Value::Object(Map::new()),
            slug: None,
        });
    }
    let nested_index = dir.join("index").with_extension(ext);
    if nested_index.is_file() {
        return Some(PageMatch {
            url_path: url.to_string(),
            file: Some(nested_index),
            title: loom_nav::naming::title_from_stem(segments.last().copied().unwrap_or("")),
            data: Value::Object(Map::new()),
            slug: None,
        });
    }

    let (parent_segments, last) = segments.split_at(segments.len().saturating_sub(1));
    let last = last.first().copied()?;
    let mut parent_dir = state.config.pages_dir.clone();
    for seg in parent_segments {
        parent_dir = parent_dir.join(seg);
    }
    let entries = std::fs::read_dir(&parent_dir).ok()?;
    for entry in entries.flatten() {
        let path = Utf8PathBuf::from_path_buf(entry.path()).ok()?;
        let name = path.file_name().unwrap_or_default();
        if name.starts_with(loom_nav::naming::DYNAMIC_MARKER) && path.extension() == Some(ext) {
            return Some(PageMatch {
                url_path: url.to_string(),
                file: Some(path),
                title: loom_nav::naming::title_from_stem(last),
                data: Value::Object(Map::new()),
                slug: Some(last.to_string()),
            });
        }
    }
    None
}

/// Context-mode render: find a context page (falling back to the root
/// page when `url` is `/`), load shared files plus the page template,
/// layer the entry file's linked fixture data under the page's own
/// fixture data, and execute the entry file's template by its base name.
pub fn render_context(state: &AppState, model: &loom_nav::NavModel, shared: &[Utf8PathBuf], url: &str) -> RenderOutcome {
    let page = match model.find_page(url) {
        Some(p) => p,
        None if url == "/" => match model.first_context_page() {
            Some(p) => loom_nav::PageMatch {
                url_path: p.url_path.clone(),
                file: Some(p.file.clone()),
                title: p.title.clone(),
                data: Value::Object(Map::new()),
                slug: None,
            },
            None => return RenderOutcome::NotFound,
        },
        None => return RenderOutcome::NotFound,
    };
    let Some(page_file) = &page.file else {
        return RenderOutcome::NotFound;
    };
    let Ok(page_source) = read_template(page_file) else {
        return RenderOutcome::NotFound;
    };

    let Some(entry_path) = &state.config.entry_file else {
        return RenderOutcome::Error("no entry file configured for context mode".to_string());
    };
    let Ok(entry_source) = read_template(entry_path) else {
        return RenderOutcome::Error(format!("{entry_path}: entry file not found"));
    };

    let fixtures = load_fixtures(state);
    let root = &state.workspace_root;
    let context_data = fixture_data_for(&fixtures, &relative_to(entry_path, root));
    let page_data = fixture_data_for(&fixtures, &relative_to(page_file, root));
    let data = merge_objects(context_data, page_data);

    let nav_data = model.build_nav_data(&page.url_path);
    let pages_list: Vec<Value> = nav_data
        .iter()
        .map(|e| {
            let mut m = Map::new();
            m.insert("Path".to_string(), Value::String(e.path.clone()));
            m.insert("Title".to_string(), Value::String(e.title.clone()));
            m.insert("Active".to_string(), Value::Bool(e.active));
            Value::Object(m)
        })
        .collect();

    let mut merged = match data {
        Value::Object(m) => m,
        _ => Map::new(),
    };
    merged.insert("_pages".to_string(), Value::Array(pages_list));
    merged.insert("_currentPath".to_string(), Value::String(page.url_path.clone()));
    let render_data = Value::Object(merged);

    let mut includes: Vec<IncludeFile> = shared
        .iter()
        .filter(|p| p.as_path() != entry_path.as_path())
        .filter_map(|p| std::fs::read_to_string(p).ok().map(|source| IncludeFile { path: p.clone(), source }))
        .collect();
    includes.push(IncludeFile {
        path: page_file.clone(),
        source: page_source,
    });

    match loom_template::render(entry_path, &entry_source, &includes, render_data, None) {
        Ok(html) => RenderOutcome::Ok(html),
        Err(e) => RenderOutcome::Error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_config::ServeConfig;

    #[test]
    fn overlay_wins_on_key_collision() {
        let base = serde_json::json!({"a": 1, "b": 2});
        let overlay = serde_json::json!({"b": 3, "c": 4});
        let merged = merge_objects(base, overlay);
        assert_eq!(merged, serde_json::json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn non_object_overlay_replaces_base_entirely() {
        let base = serde_json::json!({"a": 1});
        let overlay = serde_json::json!("replacement");
        assert_eq!(merge_objects(base, overlay), serde_json::json!("replacement"));
    }

    fn state_for(dir: &Utf8Path) -> AppState {
        let config = ServeConfig {
            pages_dir: dir.join("pages"),
            layouts_dir: dir.join("layouts"),
            partials_dir: dir.join("partials"),
            static_dir: dir.join("static"),
            layout_file: "base.html".to_string(),
            index_file: "index".to_string(),
            port: 3000,
            context_files: None,
            entry_file: None,
            data_file: None,
            data_dir: None,
            content_root: None,
            env_prefix: "LOOM_".to_string(),
        };
        AppState {
            workspace_root: dir.to_path_buf(),
            state: tokio::sync::RwLock::new(crate::state::Rebuildable {
                nav: loom_nav::NavModel::Convention(loom_nav::NavTree { nodes: Vec::new(), root: 0 }),
                shared_files: Vec::new(),
            }),
            config,
            subscribers: crate::reload::Subscribers::new(),
        }
    }

    #[test]
    fn convention_render_applies_layout_over_page() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        std::fs::create_dir_all(root.join("pages")).unwrap();
        std::fs::create_dir_all(root.join("layouts")).unwrap();
        std::fs::create_dir_all(root.join("partials")).unwrap();
        std::fs::write(root.join("pages/about.html"), "About body").unwrap();
        std::fs::write(root.join("layouts/base.html"), r#"<html>{{template "about.html" .}}</html>"#).unwrap();

        let state = state_for(root);
        let nav = loom_nav::build_convention(&state.config.pages_dir, "html", "index").unwrap();

        match render_convention(&state, &nav, "/about") {
            RenderOutcome::Ok(html) => {
                assert!(html.contains("About body"));
                assert!(html.starts_with("<html>"));
            }
            RenderOutcome::NotFound => panic!("expected a match for /about"),
            RenderOutcome::Error(e) => panic!("render failed: {e}"),
        }
    }

    #[test]
    fn convention_render_falls_back_to_bare_page_when_layout_missing() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        std::fs::create_dir_all(root.join("pages")).unwrap();
        std::fs::create_dir_all(root.join("layouts")).unwrap();
        std::fs::create_dir_all(root.join("partials")).unwrap();
        std::fs::write(root.join("pages/index.html"), "Home body").unwrap();

        let state = state_for(root);
        let nav = loom_nav::build_convention(&state.config.pages_dir, "html", "index").unwrap();

        match render_convention(&state, &nav, "/") {
            RenderOutcome::Ok(html) => assert_eq!(html, "Home body"),
            RenderOutcome::NotFound => panic!("expected a match for /"),
            RenderOutcome::Error(e) => panic!("render failed: {e}"),
        }
    }

    #[test]
    fn convention_render_reports_not_found_for_unknown_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        std::fs::create_dir_all(root.join("pages")).unwrap();
        std::fs::create_dir_all(root.join("layouts")).unwrap();
        std::fs::create_dir_all(root.join("partials")).unwrap();

        let state = state_for(root);
        let nav = loom_nav::build_convention(&state.config.pages_dir, "html", "index").unwrap();

        assert!(matches!(render_convention(&state, &nav, "/missing"), RenderOutcome::NotFound));
    }
}
