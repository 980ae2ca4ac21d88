use std::collections::HashMap;

use crate::ast::{Arg, Definition, NodeKind, Pipeline};
use crate::error::{SourceLocation, SourceSpan, TemplateError, TemplateSource};
use crate::helpers;
use crate::parser;
use crate::value::{Value, ValueExt, unwrap_safe};

struct DefEntry {
    definition: Definition,
    source: TemplateSource,
}

/// A fresh, namespace-empty set of parsed definitions, built up by loading
/// files one at a time. Holds no state between renders; a new one is
/// created for every analyse/render call.
#[derive(Default)]
pub struct TemplateSet {
    definitions: HashMap<String, DefEntry>,
    /// Preserves load order so C4 can report "which file provided this
    /// dependency" using the last file that defined a given name.
    load_order: Vec<String>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `source_text` (displayed as `file_name` in errors) and
    /// registers every definition it contains, keyed by name. A later
    /// call with a colliding name overwrites the earlier one, per the
    /// data model's "last one loaded wins" rule.
    pub fn load_file(&mut self, source_text: &str, file_name: &str, base_name: &str) -> Result<(), TemplateError> {
        let parsed = parser::parse_file(source_text, file_name, base_name).map_err(|e| TemplateError::FileParse {
            file: file_name.to_string(),
            source: Box::new(e),
        })?;
        let source = TemplateSource::new(file_name, source_text);
        for def in parsed.definitions {
            let name = def.name.clone();
            self.load_order.push(name.clone());
            self.definitions.insert(
                name,
                DefEntry {
                    definition: def,
                    source: source.clone(),
                },
            );
        }
        Ok(())
    }

    pub fn has_definition(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// The file that most recently defined `name`, if any is loaded.
    pub fn provider_of(&self, name: &str) -> Option<&str> {
        self.definitions.get(name).map(|e| e.source.name.as_str())
    }

    pub fn execute(&self, name: &str, data: Value) -> Result<String, TemplateError> {
        let entry = self
            .definitions
            .get(name)
            .ok_or_else(|| TemplateError::TemplateNotFound(name.to_string()))?;
        let mut ctx = EvalCtx {
            engine: self,
            source: entry.source.clone(),
            root: data.clone(),
            dot: data,
            vars: HashMap::new(),
        };
        let mut out = String::new();
        render_nodes(&entry.definition.body, &mut ctx, &mut out)?;
        Ok(out)
    }
}

struct EvalCtx<'a> {
    engine: &'a TemplateSet,
    source: TemplateSource,
    root: Value,
    dot: Value,
    vars: HashMap<String, Value>,
}

impl<'a> EvalCtx<'a> {
    fn loc(&self, span: SourceSpan) -> SourceLocation {
        SourceLocation::new(span, self.source.clone())
    }
}

fn split_branch(
    children: &[crate::ast::Node],
) -> (&[crate::ast::Node], Option<&crate::ast::Node>) {
    match children.last() {
        Some(last) if matches!(last.kind, NodeKind::Branch) => (&children[..children.len() - 1], Some(last)),
        _ => (children, None),
    }
}

fn resolve_field(base: &Value, path: &[String], loc: &SourceLocation) -> Result<Value, TemplateError> {
    let mut cur = base.clone();
    for segment in path {
        cur = match &cur {
            Value::Object(map) => map.get(segment).cloned().unwrap_or(Value::Null),
            Value::Array(items) => match segment.parse::<usize>() {
                Ok(idx) => items.get(idx).cloned().unwrap_or(Value::Null),
                Err(_) => {
                    return Err(TemplateError::UnknownField {
                        loc: loc.clone(),
                        field: segment.clone(),
                        found: "array",
                    });
                }
            },
            Value::Null => Value::Null,
            other => {
                return Err(TemplateError::UnknownField {
                    loc: loc.clone(),
                    field: segment.clone(),
                    found: other.type_name(),
                });
            }
        };
    }
    Ok(cur)
}

fn eval_arg(arg: &Arg, span: SourceSpan, ctx: &EvalCtx) -> Result<Value, TemplateError> {
    match arg {
        Arg::Field { path } => resolve_field(&ctx.dot, path, &ctx.loc(span)),
        Arg::Chain { path } => resolve_field(&ctx.root, path, &ctx.loc(span)),
        Arg::Variable { name } => ctx.vars.get(name).cloned().ok_or_else(|| TemplateError::Undefined {
            loc: ctx.loc(span),
            name: name.clone(),
        }),
        Arg::Identifier { name } => match name.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "nil" => Ok(Value::Null),
            other => helpers::call(other, &[], &ctx.loc(span)),
        },
        Arg::StringLiteral { value } => Ok(Value::String(value.clone())),
        Arg::NumberLiteral { value, .. } => Ok(Value::from(*value)),
        Arg::Nested { pipeline } => eval_pipeline(pipeline, ctx),
    }
}

fn eval_command(cmd: &crate::ast::Command, ctx: &EvalCtx, piped: Option<Value>) -> Result<Value, TemplateError> {
    let Some(first) = cmd.args.first() else {
        return Err(TemplateError::Syntax {
            loc: ctx.loc(cmd.span),
            message: "empty command".into(),
        });
    };
    if let Arg::Identifier { name } = first {
        let mut evaluated = Vec::with_capacity(cmd.args.len());
        for arg in &cmd.args[1..] {
            evaluated.push(eval_arg(arg, cmd.span, ctx)?);
        }
        if let Some(p) = piped {
            evaluated.push(p);
        }
        return helpers::call(name, &evaluated, &ctx.loc(cmd.span));
    }
    if cmd.args.len() > 1 {
        return Err(TemplateError::Type {
            loc: ctx.loc(cmd.span),
            message: "cannot give arguments to a non-function value".into(),
        });
    }
    eval_arg(first, cmd.span, ctx)
}

fn eval_pipeline(pipeline: &Pipeline, ctx: &EvalCtx) -> Result<Value, TemplateError> {
    let mut result: Option<Value> = None;
    for cmd in &pipeline.commands {
        result = Some(eval_command(cmd, ctx, result)?);
    }
    result.ok_or_else(|| TemplateError::Syntax {
        loc: ctx.loc(pipeline.span),
        message: "empty pipeline".into(),
    })
}

fn html_escape(raw: &str, out: &mut String) {
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
}

fn print_value(v: &Value, out: &mut String) {
    if let Some(safe) = unwrap_safe(v) {
        out.push_str(safe);
    } else {
        html_escape(&v.render_to_string(), out);
    }
}

fn render_nodes(nodes: &[crate::ast::Node], ctx: &mut EvalCtx, out: &mut String) -> Result<(), TemplateError> {
    for node in nodes {
        render_node(node, ctx, out)?;
    }
    Ok(())
}

fn render_node(node: &crate::ast::Node, ctx: &mut EvalCtx, out: &mut String) -> Result<(), TemplateError> {
    match &node.kind {
        NodeKind::Text(s) => {
            out.push_str(s);
            Ok(())
        }
        NodeKind::Action => {
            let pipeline = node.pipeline.as_ref().expect("action node always carries a pipeline");
            let value = eval_pipeline(pipeline, ctx)?;
            print_value(&value, out);
            Ok(())
        }
        NodeKind::If => {
            let pipeline = node.pipeline.as_ref().expect("if node always carries a pipeline");
            let value = eval_pipeline(pipeline, ctx)?;
            let (body, branch) = split_branch(&node.children);
            if value.is_truthy() {
                render_nodes(body, ctx, out)
            } else if let Some(branch) = branch {
                render_nodes(&branch.children, ctx, out)
            } else {
                Ok(())
            }
        }
        NodeKind::Range => {
            let pipeline = node.pipeline.as_ref().expect("range node always carries a pipeline");
            let value = eval_pipeline(pipeline, ctx)?;
            let (body, branch) = split_branch(&node.children);
            let items = match value {
                Value::Array(items) => items,
                Value::Null => Vec::new(),
                other => vec![other],
            };
            if items.is_empty() {
                if let Some(branch) = branch {
                    return render_nodes(&branch.children, ctx, out);
                }
                return Ok(());
            }
            let saved_dot = ctx.dot.clone();
            for item in items {
                ctx.dot = item;
                render_nodes(body, ctx, out)?;
            }
            ctx.dot = saved_dot;
            Ok(())
        }
        NodeKind::With => {
            let pipeline = node.pipeline.as_ref().expect("with node always carries a pipeline");
            let value = eval_pipeline(pipeline, ctx)?;
            if !value.is_truthy() {
                return Ok(());
            }
            let saved_dot = ctx.dot.clone();
            ctx.dot = value;
            let result = render_nodes(&node.children, ctx, out);
            ctx.dot = saved_dot;
            result
        }
        NodeKind::TemplateCall { name } | NodeKind::Block { name } => {
            let data = match &node.pipeline {
                Some(p) => eval_pipeline(p, ctx)?,
                None => ctx.dot.clone(),
            };
            let rendered = ctx.engine.execute(name, data)?;
            out.push_str(&rendered);
            Ok(())
        }
        NodeKind::Branch => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn template_call_composes_layout_and_page() {
        let mut set = TemplateSet::new();
        set.load_file(
            r#"{{define "content"}}Hi {{.Name}}{{end}}"#,
            "page.html",
            "page.html",
        )
        .unwrap();
        set.load_file(r#"{{template "content" .}}"#, "layout.html", "layout.html")
            .unwrap();
        let out = set.execute("layout.html", json!({"Name": "Ada"})).unwrap();
        assert_eq!(out, "Hi Ada");
    }

    #[test]
    fn if_with_flexible_number_comparison() {
        let mut set = TemplateSet::new();
        set.load_file(
            "{{if gt .Count 10}}many{{end}}",
            "count.html",
            "count.html",
        )
        .unwrap();
        let out = set.execute("count.html", json!({"Count": 12.0})).unwrap();
        assert_eq!(out, "many");
    }

    #[test]
    fn range_over_tags_with_eq_string() {
        let mut set = TemplateSet::new();
        set.load_file(
            r#"{{range .Tags}}{{if eq . "featured"}}*{{end}}{{end}}"#,
            "tags.html",
            "tags.html",
        )
        .unwrap();
        let out = set
            .execute("tags.html", json!({"Tags": ["featured", "other"]}))
            .unwrap();
        assert_eq!(out, "*");
    }

    #[test]
    fn safe_html_is_not_escaped() {
        let mut set = TemplateSet::new();
        set.load_file("{{.Body | safeHTML}}", "raw.html", "raw.html").unwrap();
        let out = set.execute("raw.html", json!({"Body": "<b>hi</b>"})).unwrap();
        assert_eq!(out, "<b>hi</b>");
    }

    #[test]
    fn plain_text_is_escaped() {
        let mut set = TemplateSet::new();
        set.load_file("{{.Body}}", "raw.html", "raw.html").unwrap();
        let out = set.execute("raw.html", json!({"Body": "<b>hi</b>"})).unwrap();
        assert_eq!(out, "&lt;b&gt;hi&lt;/b&gt;");
    }

    #[test]
    fn missing_template_call_is_a_render_error() {
        let mut set = TemplateSet::new();
        set.load_file(r#"{{template "missing" .}}"#, "a.html", "a.html").unwrap();
        let err = set.execute("a.html", json!({})).unwrap_err();
        assert!(matches!(err, TemplateError::TemplateNotFound(_)));
    }
}
