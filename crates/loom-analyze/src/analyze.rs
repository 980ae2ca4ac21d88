use std::collections::{HashMap, HashSet};

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;

use crate::extract;
use crate::types::{AnalysisResult, HtmxInfo, TemplateInfo, VariableDescriptor};

/// Directory names skipped during the workspace-wide walk, mirroring the
/// dev server's own asset discovery deny-list.
const WALK_DENY_LIST: &[&str] = &["node_modules", "target", ".git", "dist", ".cache"];

const RECOGNISED_EXTENSIONS: &[&str] = &["html", "htm", "tmpl", "gohtml"];

/// Priority table used when the same variable path shows up with
/// different inferred contexts across files: higher wins.
fn context_priority(context: &str) -> u8 {
    match context {
        "eq-number" | "gt-number" => 10,
        "eq-string" => 9,
        "range-collection" => 8,
        "range" => 5,
        "if" | "with" => 3,
        "template" => 2,
        "chain" => 1,
        _ => 0,
    }
}

/// One file's contribution before aggregation: its parsed definitions plus
/// everything C2/C3 extracted from each.
struct FileAnalysis {
    path: Utf8PathBuf,
    source: String,
    parsed: loom_template::ParsedFile,
}

fn analyze_file(path: &Utf8Path, source: &str, warnings: &mut Vec<String>) -> Option<FileAnalysis> {
    let base_name = loom_template::base_name_of(path);
    match loom_template::parser::parse_file(source, path.as_str(), &base_name) {
        Ok(parsed) => Some(FileAnalysis {
            path: path.to_owned(),
            source: source.to_string(),
            parsed,
        }),
        Err(e) => {
            warnings.push(format!("{}: {}", path, e));
            None
        }
    }
}

/// C4: analyses `entry` plus every file in `includes` (or, if `includes`
/// is empty, every recognised-extension file under `workspace_root`),
/// aggregates their C2/C3 results, and applies the dedup/pruning rules.
/// Per-file parse failures are collected into `warnings` rather than
/// failing the whole analysis.
pub fn analyze(
    entry_path: &Utf8Path,
    entry_source: &str,
    includes: &[(Utf8PathBuf, String)],
    workspace_root: Option<&Utf8Path>,
    warnings: &mut Vec<String>,
) -> AnalysisResult {
    let mut files = Vec::new();
    if let Some(fa) = analyze_file(entry_path, entry_source, warnings) {
        files.push(fa);
    }

    if !includes.is_empty() {
        for (path, source) in includes {
            if let Some(fa) = analyze_file(path, source, warnings) {
                files.push(fa);
            }
        }
    } else if let Some(root) = workspace_root {
        for (path, source) in walk_workspace_files(root, warnings) {
            if path == entry_path {
                continue;
            }
            if let Some(fa) = analyze_file(&path, &source, warnings) {
                files.push(fa);
            }
        }
    }

    let mut templates: HashMap<String, TemplateInfo> = HashMap::new();
    let mut defined_names: HashSet<String> = HashSet::new();
    let mut all_vars: Vec<VariableDescriptor> = Vec::new();
    let mut all_deps: HashMap<String, crate::types::DependencyDescriptor> = HashMap::new();
    let mut hx_descriptors = Vec::new();
    let mut hx_version = None;
    let mut hx_detected = false;

    for file in &files {
        for def in &file.parsed.definitions {
            defined_names.insert(def.name.clone());
            templates.insert(
                def.name.clone(),
                TemplateInfo {
                    name: def.name.clone(),
                    file_path: file.path.to_string(),
                    is_block: def.is_block,
                    calls: def.calls.clone(),
                },
            );
            all_vars.extend(extract::extract_variables(&def.body, file.path.as_str()));
            for dep in extract::extract_dependencies(&def.body) {
                all_deps
                    .entry(dep.name.clone())
                    .and_modify(|existing| existing.required = existing.required || dep.required)
                    .or_insert(dep);
            }
        }
        let (descriptors, version) = extract::extract_hypermedia(&file.source, file.path.as_str());
        if extract::detect_htmx(&file.source) {
            hx_detected = true;
        }
        if version.is_some() {
            hx_version = version;
        }
        hx_descriptors.extend(descriptors);
    }

    for dep in all_deps.values_mut() {
        dep.satisfied = defined_names.contains(&dep.name);
        if dep.satisfied {
            dep.file_path = templates.get(&dep.name).map(|t| t.file_path.clone());
        }
    }

    let variables = reconcile_variables(all_vars);
    let mut dependencies: Vec<_> = all_deps.into_values().collect();
    dependencies.sort_by(|a, b| a.name.cmp(&b.name));

    let htmx = if hx_detected || !hx_descriptors.is_empty() {
        Some(HtmxInfo {
            detected: hx_detected,
            version: hx_version,
            dependencies: hx_descriptors,
        })
    } else {
        None
    };

    AnalysisResult {
        entry_file: entry_path.to_string(),
        templates,
        variables,
        dependencies,
        htmx,
    }
}

/// Dedups variable descriptors by `path` (keeping the highest-priority
/// context), recomputes suggested values, and prunes redundant
/// descriptors, over the full set gathered from every analysed file.
fn reconcile_variables(vars: Vec<VariableDescriptor>) -> Vec<VariableDescriptor> {
    let mut by_path: HashMap<String, VariableDescriptor> = HashMap::new();
    for v in vars {
        match by_path.get(&v.path) {
            Some(existing) if context_priority(&existing.context) >= context_priority(&v.context) => {}
            _ => {
                by_path.insert(v.path.clone(), v);
            }
        }
    }
    let mut descriptors: Vec<VariableDescriptor> = by_path.into_values().collect();

    let item_prefixes: HashSet<String> = descriptors
        .iter()
        .filter_map(|d| d.path.split_once("[0].").map(|(p, _)| p.to_string()))
        .collect();
    for d in &mut descriptors {
        if d.ty == crate::types::VarType::Array && item_prefixes.contains(&d.path) {
            d.suggested = Some(loom_template::Value::Array(vec![loom_template::Value::Object(
                serde_json::Map::new(),
            )]));
        }
    }

    // field names that appear as a `[0].<suffix>` somewhere: a top-level
    // descriptor whose path equals such a suffix is a spurious shadow of
    // that array-item field.
    let shadowed_fields: HashSet<String> = descriptors
        .iter()
        .filter_map(|d| d.path.split_once("[0].").map(|(_, suffix)| suffix.to_string()))
        .collect();

    descriptors.retain(|d| {
        let is_top_level = !d.path.contains('.') && !d.path.contains('[');
        if is_top_level && shadowed_fields.contains(&d.path) {
            return false;
        }
        if is_top_level && d.ty == crate::types::VarType::Array && !item_prefixes.contains(&d.path) {
            // a top-level array with no known item fields is dropped as
            // spurious, unless it carries a literal-sweep-derived list of
            // plain scalars, which is a legitimate result on its own.
            let is_scalar_sweep = matches!(
                &d.suggested,
                Some(loom_template::Value::Array(items)) if !items.is_empty() && items.iter().all(|i| !i.is_object())
            );
            return is_scalar_sweep;
        }
        true
    });

    descriptors.sort_by(|a, b| a.path.cmp(&b.path));
    descriptors
}

/// Walks every recognised-extension file under `root`, skipping hidden
/// directories, gitignored paths, and [`WALK_DENY_LIST`] entries. Shared
/// by the analyser's own workspace fallback and by the render CLI, which
/// needs the same file set when no explicit include list is given.
pub fn walk_workspace_files(root: &Utf8Path, warnings: &mut Vec<String>) -> Vec<(Utf8PathBuf, String)> {
    let mut out = Vec::new();
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !WALK_DENY_LIST.contains(&name.as_ref())
        })
        .build();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warnings.push(format!("workspace walk error: {e}"));
                continue;
            }
        };
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.path().to_path_buf()) else {
            continue;
        };
        let Some(ext) = path.extension() else { continue };
        if !RECOGNISED_EXTENSIONS.contains(&ext) {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(source) => out.push((path, source)),
            Err(e) => warnings.push(format!("{path}: {e}")),
        }
    }
    out
}
