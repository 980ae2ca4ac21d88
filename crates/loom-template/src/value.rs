/// The dynamic value type threaded through analysis and rendering.
///
/// Fixtures are JSON on disk, so `serde_json::Value` is the value type
/// throughout rather than a bespoke enum: no conversion layer is needed
/// between what a fixture file parses into and what the renderer walks.
pub type Value = serde_json::Value;

/// Behaviour the renderer needs from `Value` beyond what `serde_json`
/// already provides.
pub trait ValueExt {
    fn is_truthy(&self) -> bool;
    fn type_name(&self) -> &'static str;
    fn render_to_string(&self) -> String;
}

impl ValueExt for Value {
    fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    fn render_to_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        }
    }
}

/// Marks a rendered string as pre-escaped so the renderer does not
/// HTML-escape it a second time. Produced by the `safeHTML`/`safeJS`/
/// `safeCSS`/`safeURL`/`safeAttr` helpers.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeValue(pub String);

const SAFE_MARKER_KEY: &str = "__loom_safe__";

/// Wraps a string produced by a `safe*` helper so it survives being passed
/// through the rest of a pipeline as an ordinary `Value`, while still being
/// recognisable at print time so the renderer skips HTML-escaping it.
pub fn wrap_safe(s: String) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(SAFE_MARKER_KEY.to_string(), Value::String(s));
    Value::Object(map)
}

pub fn unwrap_safe(v: &Value) -> Option<&str> {
    v.as_object()
        .filter(|m| m.len() == 1)
        .and_then(|m| m.get(SAFE_MARKER_KEY))
        .and_then(|inner| inner.as_str())
}
