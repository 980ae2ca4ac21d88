//! Convention-mode page discovery: walks a pages directory into an
//! arena-indexed page tree.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{NavError, Result};
use crate::naming::{is_index, join_url, strip_dynamic_marker, title_from_stem};

#[derive(Debug, Clone)]
pub struct PageNode {
    pub url_path: String,
    pub file: Option<Utf8PathBuf>,
    pub title: String,
    pub order: i64,
    pub hidden: bool,
    pub nav_override: Option<Value>,
    pub dynamic: bool,
    pub children: Vec<usize>,
    pub data: Value,
}

/// The page tree itself: a flat arena, children addressed by index,
/// never `Rc<RefCell<_>>` or boxed parent/child links.
#[derive(Debug, Clone)]
pub struct NavTree {
    pub nodes: Vec<PageNode>,
    pub root: usize,
}

#[derive(Debug, Default, Deserialize)]
struct PageOverride {
    title: Option<String>,
    order: Option<i64>,
    hidden: Option<bool>,
    nav: Option<Value>,
    data: Option<Value>,
}

fn read_override(path: &Utf8Path) -> Result<PageOverride> {
    let text = std::fs::read_to_string(path).map_err(|e| NavError::Io {
        path: path.to_string(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| NavError::Json {
        path: path.to_string(),
        source: e,
    })
}

fn maybe_override(sidecar: &Utf8Path) -> Result<Option<PageOverride>> {
    if sidecar.is_file() {
        Ok(Some(read_override(sidecar)?))
    } else {
        Ok(None)
    }
}

struct Builder<'a> {
    nodes: Vec<PageNode>,
    extension: &'a str,
    index_stem: &'a str,
}

impl<'a> Builder<'a> {
    fn build_dir(&mut self, dir: &Utf8Path, url_path: &str, sidecar: Option<&Utf8Path>) -> Result<usize> {
        let stem = dir.file_stem().unwrap_or(dir.as_str());
        let default_title = title_from_stem(stem);
        let over = match sidecar {
            Some(s) => maybe_override(s)?,
            None => None,
        };

        let node = PageNode {
            url_path: url_path.to_string(),
            file: None,
            title: over.as_ref().and_then(|o| o.title.clone()).unwrap_or(default_title),
            order: over.as_ref().and_then(|o| o.order).unwrap_or(0),
            hidden: over.as_ref().and_then(|o| o.hidden).unwrap_or(false),
            nav_override: over.as_ref().and_then(|o| o.nav.clone()),
            dynamic: false,
            children: Vec::new(),
            data: over.and_then(|o| o.data).unwrap_or_else(|| Value::Object(serde_json::Map::new())),
        };
        let idx = self.nodes.len();
        self.nodes.push(node);

        let mut index_file: Option<Utf8PathBuf> = None;
        let mut entries: Vec<Utf8PathBuf> = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| NavError::Io {
            path: dir.to_string(),
            source: e,
        })? {
            let entry = entry.map_err(|e| NavError::Io {
                path: dir.to_string(),
                source: e,
            })?;
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else { continue };
            let name = path.file_name().unwrap_or_default();
            if name.starts_with('.') {
                continue;
            }
            if path.extension() == Some("json") {
                continue; // sidecar override files are consulted, not listed
            }
            entries.push(path);
        }
        entries.sort();

        for path in &entries {
            let name = path.file_name().unwrap_or_default().to_string();
            let is_dir = path.is_dir();
            let stem = path.file_stem().unwrap_or(&name).to_string();

            if is_dir {
                if name.starts_with(crate::naming::DYNAMIC_MARKER) {
                    // skipped for recursion, but registers a dynamic segment
                    let (_, title_src) = strip_dynamic_marker(&stem);
                    let child_url = join_url(url_path, &stem);
                    let child = PageNode {
                        url_path: child_url,
                        file: None,
                        title: title_from_stem(title_src),
                        order: 0,
                        hidden: false,
                        nav_override: None,
                        dynamic: true,
                        children: Vec::new(),
                        data: Value::Object(serde_json::Map::new()),
                    };
                    let child_idx = self.nodes.len();
                    self.nodes.push(child);
                    self.nodes[idx].children.push(child_idx);
                    continue;
                }
                let child_url = join_url(url_path, &stem);
                let sidecar = path.with_extension("json");
                let sidecar = sidecar.is_file().then_some(sidecar);
                let child_idx = self.build_dir(path, &child_url, sidecar.as_deref())?;
                self.nodes[idx].children.push(child_idx);
                continue;
            }

            if path.extension() != Some(self.extension) {
                continue;
            }
            if name.starts_with(crate::naming::DYNAMIC_MARKER) {
                let (_, title_src) = strip_dynamic_marker(&stem);
                let sidecar = path.with_extension("json");
                let over = maybe_override(&sidecar)?;
                let child = PageNode {
                    url_path: join_url(url_path, &stem),
                    file: Some(path.clone()),
                    title: over.as_ref().and_then(|o| o.title.clone()).unwrap_or_else(|| title_from_stem(title_src)),
                    order: over.as_ref().and_then(|o| o.order).unwrap_or(0),
                    hidden: over.as_ref().and_then(|o| o.hidden).unwrap_or(false),
                    nav_override: over.as_ref().and_then(|o| o.nav.clone()),
                    dynamic: true,
                    children: Vec::new(),
                    data: over.and_then(|o| o.data).unwrap_or_else(|| Value::Object(serde_json::Map::new())),
                };
                let child_idx = self.nodes.len();
                self.nodes.push(child);
                self.nodes[idx].children.push(child_idx);
                continue;
            }
            if is_index(&stem, self.index_stem) {
                index_file = Some(path.clone());
                continue;
            }
            let sidecar = path.with_extension("json");
            let over = maybe_override(&sidecar)?;
            let child = PageNode {
                url_path: join_url(url_path, &stem),
                file: Some(path.clone()),
                title: over.as_ref().and_then(|o| o.title.clone()).unwrap_or_else(|| title_from_stem(&stem)),
                order: over.as_ref().and_then(|o| o.order).unwrap_or(0),
                hidden: over.as_ref().and_then(|o| o.hidden).unwrap_or(false),
                nav_override: over.as_ref().and_then(|o| o.nav.clone()),
                dynamic: false,
                children: Vec::new(),
                data: over.and_then(|o| o.data).unwrap_or_else(|| Value::Object(serde_json::Map::new())),
            };
            let child_idx = self.nodes.len();
            self.nodes.push(child);
            self.nodes[idx].children.push(child_idx);
        }

        if let Some(index) = index_file {
            self.nodes[idx].file = Some(index);
        }

        let mut children = std::mem::take(&mut self.nodes[idx].children);
        children.sort_by(|&a, &b| {
            let na = &self.nodes[a];
            let nb = &self.nodes[b];
            (na.order, &na.title).cmp(&(nb.order, &nb.title))
        });
        self.nodes[idx].children = children;

        Ok(idx)
    }
}

/// Walks `pages_dir` into an arena-indexed `NavTree`. `extension` is the
/// recognised template file extension (without the dot); `index_stem`
/// is the configured index-file basename (without extension, normally
/// `"index"`).
pub fn build_convention_tree(pages_dir: &Utf8Path, extension: &str, index_stem: &str) -> Result<NavTree> {
    let mut builder = Builder {
        nodes: Vec::new(),
        extension,
        index_stem,
    };
    let root = builder.build_dir(pages_dir, "/", None)?;
    Ok(NavTree {
        nodes: builder.nodes,
        root,
    })
}
