//! C2 (variable & literal extraction) and C3 (dependency & hypermedia
//! extraction), operating over a single parsed `Definition`'s body or a
//! file's raw text.

use std::collections::{HashMap, HashSet};

use loom_template::ast::{Arg, Definition, Node, NodeKind, Pipeline};
use loom_template::Value;

use crate::types::{DependencyDescriptor, DependencyKind, HttpMethod, HypermediaDescriptor, VarType, VariableDescriptor};

const COMPARISON_FNS: &[&str] = &["eq", "ne", "lt", "le", "gt", "ge"];

/// The scope tracked while walking a definition body.
#[derive(Debug, Clone)]
enum Scope {
    Empty,
    With,
    /// `range:<path>` when the ranged collection's path is known, `range`
    /// (no path) otherwise.
    Range(Option<String>),
}

/// Which kind of pipeline site a field/chain argument was found in; drives
/// the inferred context label (`eq-number`, `range-collection`, ...).
#[derive(Debug, Clone, Copy, PartialEq)]
enum Site {
    Action,
    IfCond,
    WithCond,
    RangeCollection,
    Template,
}

struct Extractor<'a> {
    file_path: &'a str,
    out: Vec<VariableDescriptor>,
    /// array-path -> distinct string literals seen in eq/ne comparisons
    /// inside that array's range body (the "literal sweep").
    sweep: HashMap<String, Vec<String>>,
}

/// Extracts every variable descriptor referenced in `body`, with suggested
/// values already filled in using the local, per-definition rule.
pub fn extract_variables(body: &[Node], file_path: &str) -> Vec<VariableDescriptor> {
    let mut ex = Extractor {
        file_path,
        out: Vec::new(),
        sweep: HashMap::new(),
    };
    ex.walk(body, &Scope::Empty);
    ex.finalize()
}

impl<'a> Extractor<'a> {
    fn walk(&mut self, nodes: &[Node], scope: &Scope) {
        for node in nodes {
            match &node.kind {
                NodeKind::Text(_) => {}
                NodeKind::Action => {
                    if let Some(p) = &node.pipeline {
                        self.extract_pipeline(p, Site::Action, scope);
                    }
                }
                NodeKind::If => {
                    if let Some(p) = &node.pipeline {
                        self.extract_pipeline(p, Site::IfCond, scope);
                    }
                    self.walk(&node.children, scope);
                }
                NodeKind::With => {
                    if let Some(p) = &node.pipeline {
                        self.extract_pipeline(p, Site::WithCond, scope);
                    }
                    self.walk(&node.children, &Scope::With);
                }
                NodeKind::Range => {
                    let array_path = node.pipeline.as_ref().and_then(|p| first_field_path(p));
                    if let Some(p) = &node.pipeline {
                        self.extract_pipeline(p, Site::RangeCollection, scope);
                    }
                    let body_scope = Scope::Range(array_path);
                    self.walk(&node.children, &body_scope);
                }
                NodeKind::TemplateCall { .. } => {
                    if let Some(p) = &node.pipeline {
                        self.extract_pipeline(p, Site::Template, scope);
                    }
                }
                NodeKind::Block { .. } => {
                    // The block's own body is analysed separately as its
                    // own named Definition; only its call-site pipeline
                    // (the data argument) belongs to this walk.
                    if let Some(p) = &node.pipeline {
                        self.extract_pipeline(p, Site::Template, scope);
                    }
                }
                NodeKind::Branch => self.walk(&node.children, scope),
            }
        }
    }

    fn extract_pipeline(&mut self, pipeline: &Pipeline, site: Site, scope: &Scope) {
        for cmd in &pipeline.commands {
            self.extract_command(cmd.args.as_slice(), site, scope);
        }
    }

    fn extract_command(&mut self, args: &[Arg], site: Site, scope: &Scope) {
        if let Some(Arg::Identifier { name }) = args.first() {
            if COMPARISON_FNS.contains(&name.as_str()) {
                let rest = &args[1..];
                let literals: Vec<&Arg> = rest
                    .iter()
                    .filter(|a| matches!(a, Arg::StringLiteral { .. } | Arg::NumberLiteral { .. }))
                    .collect();
                if literals.len() == 1 {
                    self.extract_comparison(name, rest, literals[0], scope);
                    return;
                }
            }
        }
        for arg in args {
            self.extract_arg(arg, site, scope);
        }
    }

    fn extract_comparison(&mut self, op: &str, rest: &[Arg], literal: &Arg, scope: &Scope) {
        let (context, ty, suggested) = match (op, literal) {
            ("eq" | "ne", Arg::StringLiteral { value }) => ("eq-string", VarType::String, Value::String(value.clone())),
            ("eq" | "ne", Arg::NumberLiteral { value, .. }) => {
                ("eq-number", VarType::Number, Value::from(value.round() as i64))
            }
            (_, Arg::NumberLiteral { value, .. }) => ("gt-number", VarType::Number, Value::from(*value)),
            _ => return,
        };
        let is_range_string_sweep = op == "eq" || op == "ne";
        let start = self.out.len();
        for arg in rest {
            match arg {
                Arg::StringLiteral { .. } | Arg::NumberLiteral { .. } => {}
                Arg::Field { path } => {
                    if let Some((p, _)) = scoped_path(path, scope) {
                        self.push(p, ty, context);
                    }
                }
                Arg::Chain { path } => {
                    let p = chain_path(path);
                    self.push(p, ty, context);
                }
                _ => {}
            }
        }
        for d in &mut self.out[start..] {
            d.suggested = Some(suggested.clone());
        }
        if is_range_string_sweep {
            if let (Scope::Range(Some(array_path)), Arg::StringLiteral { value }) = (scope, literal) {
                let entry = self.sweep.entry(array_path.clone()).or_default();
                if !entry.contains(value) {
                    entry.push(value.clone());
                }
            }
        }
    }

    fn extract_arg(&mut self, arg: &Arg, site: Site, scope: &Scope) {
        match arg {
            Arg::Field { path } => self.extract_field(path, site, scope),
            Arg::Chain { path } => {
                let p = chain_path(path);
                self.push(p, VarType::String, "chain");
            }
            Arg::Nested { pipeline } => self.extract_pipeline(pipeline, site, scope),
            _ => {}
        }
    }

    fn extract_field(&mut self, path: &[String], site: Site, scope: &Scope) {
        let Some((full_path, nested)) = scoped_path(path, scope) else {
            return;
        };
        let (context, ty) = match site {
            Site::IfCond => ("if", VarType::String),
            Site::WithCond => ("with", VarType::String),
            Site::RangeCollection => ("range-collection", VarType::Array),
            Site::Template => (
                "template",
                if path.len() <= 1 { VarType::Object } else { VarType::String },
            ),
            Site::Action => match scope {
                Scope::Range(_) => ("range", if nested { VarType::Object } else { VarType::String }),
                Scope::With => ("with", VarType::String),
                Scope::Empty => ("", VarType::String),
            },
        };
        self.push(full_path, ty, context);
    }

    fn push(&mut self, path: String, ty: VarType, context: &str) {
        self.out.push(VariableDescriptor {
            path,
            ty,
            context: context.to_string(),
            file_path: self.file_path.to_string(),
            suggested: None,
        });
    }

    fn finalize(mut self) -> Vec<VariableDescriptor> {
        let array_item_prefixes: HashSet<String> = self
            .out
            .iter()
            .filter_map(|d| d.path.split_once("[0].").map(|(prefix, _)| prefix.to_string()))
            .collect();
        for d in &mut self.out {
            if d.suggested.is_some() {
                continue;
            }
            d.suggested = Some(match d.ty {
                VarType::String => Value::String(String::new()),
                VarType::Number => Value::from(0),
                VarType::Bool => Value::Bool(false),
                VarType::Object => Value::Object(serde_json::Map::new()),
                VarType::Array => {
                    if array_item_prefixes.contains(&d.path) {
                        Value::Array(vec![Value::Object(serde_json::Map::new())])
                    } else if let Some(literals) = self.sweep.get(&d.path) {
                        Value::Array(literals.iter().cloned().map(Value::String).collect())
                    } else {
                        Value::Array(vec![Value::Object(serde_json::Map::new())])
                    }
                }
            });
        }
        self.out
    }
}

fn chain_path(path: &[String]) -> String {
    if path.is_empty() {
        ".".to_string()
    } else {
        path.join(".")
    }
}

/// Builds the scope-prefixed path for a `Field` argument. Returns `None`
/// when the field must be discarded (scope `range` with no known array
/// path). The `bool` reports whether the resulting path has further dots
/// past any `[0].` segment (drives the `range` context's type row).
fn scoped_path(path: &[String], scope: &Scope) -> Option<(String, bool)> {
    match scope {
        Scope::Empty | Scope::With => Some((path.join("."), path.len() > 1)),
        Scope::Range(Some(array_path)) => {
            if path.is_empty() {
                Some((format!("{array_path}[0]"), false))
            } else {
                Some((format!("{array_path}[0].{}", path.join(".")), path.len() > 1))
            }
        }
        Scope::Range(None) => None,
    }
}

/// The array path a `range` pipeline iterates over, when its first command's
/// first argument is a plain field access.
fn first_field_path(pipeline: &Pipeline) -> Option<String> {
    let cmd = pipeline.commands.first()?;
    match cmd.args.first()? {
        Arg::Field { path } if !path.is_empty() => Some(path.join(".")),
        _ => None,
    }
}

/// C3: one dependency descriptor per distinct `template`-call name found
/// directly inside `body` (not transitive). Does not descend into a
/// `Block` node's own children — those belong to that block's separately
/// registered `Definition` and are walked on their own.
pub fn extract_dependencies(body: &[Node]) -> Vec<DependencyDescriptor> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    collect_template_calls(body, &mut seen, &mut out);
    out
}

fn collect_template_calls(nodes: &[Node], seen: &mut HashSet<String>, out: &mut Vec<DependencyDescriptor>) {
    for node in nodes {
        match &node.kind {
            NodeKind::TemplateCall { name } => {
                if seen.insert(name.clone()) {
                    out.push(DependencyDescriptor {
                        name: name.clone(),
                        kind: DependencyKind::Template,
                        required: true,
                        file_path: None,
                        satisfied: false,
                    });
                }
            }
            NodeKind::Block { .. } => {}
            _ => collect_template_calls(&node.children, seen, out),
        }
    }
}

/// Re-exported for C4's entry-point convenience.
pub fn definition_calls(def: &Definition) -> &[String] {
    &def.calls
}

const HX_ATTRS: &[(&str, HttpMethod)] = &[
    ("hx-get", HttpMethod::Get),
    ("hx-post", HttpMethod::Post),
    ("hx-put", HttpMethod::Put),
    ("hx-delete", HttpMethod::Delete),
    ("hx-patch", HttpMethod::Patch),
];

fn quoted_value(line: &str, attr: &str) -> Option<String> {
    let idx = line.find(attr)?;
    let after = &line[idx + attr.len()..];
    let eq_pos = after.find('=')?;
    let mut rest = after[eq_pos + 1..].trim_start();
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    rest = &rest[1..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}

/// C3's raw-text scan for hypermedia attributes, run once per file over
/// its literal source (not the parsed tree).
pub fn extract_hypermedia(source: &str, file_path: &str) -> (Vec<HypermediaDescriptor>, Option<String>) {
    let lines: Vec<&str> = source.lines().collect();
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        for (attr, method) in HX_ATTRS {
            let Some(url) = quoted_value(line, attr) else { continue };
            let window_start = i.saturating_sub(3);
            let window_end = (i + 5).min(lines.len());
            let window = &lines[window_start..window_end];
            let target = window.iter().find_map(|l| quoted_value(l, "hx-target"));
            let swap = window.iter().find_map(|l| quoted_value(l, "hx-swap"));
            let trigger = window.iter().find_map(|l| quoted_value(l, "hx-trigger"));
            let context: String = line.trim().chars().take(100).collect();
            out.push(HypermediaDescriptor {
                method: *method,
                url,
                target,
                swap,
                trigger,
                file_path: file_path.to_string(),
                line: i + 1,
                context,
            });
        }
    }
    let version = find_htmx_version(source);
    (out, version)
}

fn find_htmx_version(source: &str) -> Option<String> {
    for line in source.lines() {
        if !line.contains("<script") || !line.to_ascii_lowercase().contains("htmx") {
            continue;
        }
        if let Some(at) = line.find('@') {
            let after = &line[at + 1..];
            let version: String = after
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            if version.matches('.').count() == 2 {
                return Some(version);
            }
        }
    }
    None
}

pub fn detect_htmx(source: &str) -> bool {
    source.to_ascii_lowercase().contains("htmx")
}
