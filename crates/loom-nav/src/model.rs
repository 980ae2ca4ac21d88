use camino::Utf8PathBuf;
use serde_json::Value;

use crate::context::ContextPage;
use crate::naming::last_segment;
use crate::tree::{NavTree, PageNode};

#[derive(Debug, Clone)]
pub struct PageMatch {
    pub url_path: String,
    pub file: Option<Utf8PathBuf>,
    pub title: String,
    pub data: Value,
    /// The literal URL segment captured by a dynamic-segment match.
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavEntry {
    pub path: String,
    pub title: String,
    pub active: bool,
}

impl From<(&PageNode, Option<String>)> for PageMatch {
    fn from((node, slug): (&PageNode, Option<String>)) -> Self {
        PageMatch {
            url_path: node.url_path.clone(),
            file: node.file.clone(),
            title: node.title.clone(),
            data: node.data.clone(),
            slug,
        }
    }
}

/// Either a convention-mode page tree or a context-mode flat page list,
/// exposing the same `find_page`/`build_nav_data` operations over both.
pub enum NavModel {
    Convention(NavTree),
    Context(Vec<ContextPage>),
}

impl NavModel {
    pub fn find_page(&self, url: &str) -> Option<PageMatch> {
        match self {
            NavModel::Convention(tree) => find_in_tree(tree, url),
            NavModel::Context(pages) => find_in_context(pages, url),
        }
    }

    pub fn build_nav_data(&self, current_url: &str) -> Vec<NavEntry> {
        match self {
            NavModel::Convention(tree) => {
                let mut out = Vec::new();
                walk_nav(tree, tree.root, current_url, &mut out);
                out
            }
            NavModel::Context(pages) => pages
                .iter()
                .map(|p| NavEntry {
                    path: p.url_path.clone(),
                    title: p.title.clone(),
                    active: p.url_path == current_url,
                })
                .collect(),
        }
    }

    /// The context-mode `/` fallback when no page matches exactly: the
    /// first known root page, or else the first discovered page in sort
    /// order.
    pub fn first_context_page(&self) -> Option<&ContextPage> {
        match self {
            NavModel::Context(pages) => pages
                .iter()
                .find(|p| p.url_path == "/")
                .or_else(|| pages.first()),
            NavModel::Convention(_) => None,
        }
    }
}

fn walk_nav(tree: &NavTree, idx: usize, current_url: &str, out: &mut Vec<NavEntry>) {
    let node = &tree.nodes[idx];
    if !node.hidden {
        out.push(NavEntry {
            path: node.url_path.clone(),
            title: node.title.clone(),
            active: node.url_path == current_url,
        });
    }
    for &child in &node.children {
        walk_nav(tree, child, current_url, out);
    }
}

fn find_in_tree(tree: &NavTree, url: &str) -> Option<PageMatch> {
    let segments: Vec<&str> = url.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Some(PageMatch::from((&tree.nodes[tree.root], None)));
    }
    let mut current = tree.root;
    let mut slug = None;
    for (i, seg) in segments.iter().enumerate() {
        let children = &tree.nodes[current].children;
        if let Some(&child) = children.iter().find(|&&c| last_segment(&tree.nodes[c].url_path) == *seg) {
            current = child;
            continue;
        }
        let is_last = i == segments.len() - 1;
        if is_last {
            if let Some(&child) = children.iter().find(|&&c| tree.nodes[c].dynamic) {
                current = child;
                slug = Some(seg.to_string());
                continue;
            }
        }
        return None;
    }
    Some(PageMatch::from((&tree.nodes[current], slug)))
}

fn find_in_context(pages: &[ContextPage], url: &str) -> Option<PageMatch> {
    let page = pages.iter().find(|p| p.url_path == url)?;
    Some(PageMatch {
        url_path: page.url_path.clone(),
        file: Some(page.file.clone()),
        title: page.title.clone(),
        data: Value::Object(serde_json::Map::new()),
        slug: None,
    })
}
