use crate::compare;
use crate::error::{SourceLocation, TemplateError};
use crate::value::{Value, ValueExt, wrap_safe};

/// Names accepted as no-op functions so that user templates calling common
/// helpers the renderer does not implement still render (producing `null`
/// rather than an unknown-function error).
pub const NOOP_HELPER_NAMES: &[&str] = &[
    "dateFormat",
    "truncate",
    "pluralize",
    "markdown",
    "stripTags",
    "urlEncode",
    "urlDecode",
    "jsonEncode",
    "base64Encode",
    "base64Decode",
    "md5",
    "sha1",
    "sha256",
    "slugify",
    "humanize",
    "commafy",
    "currency",
    "percent",
    "round",
    "floor",
    "ceil",
    "abs",
    "min",
    "max",
    "sum",
    "avg",
    "first",
    "last",
    "reverse",
    "sort",
    "sortBy",
    "groupBy",
    "uniq",
    "keys",
    "values",
    "has",
    "merge",
    "pick",
    "omit",
    "now",
    "year",
    "relativeTime",
    "wordCount",
    "readingTime",
    "excerpt",
    "absURL",
    "relURL",
];

fn num(v: &Value) -> f64 {
    v.as_f64().unwrap_or(0.0)
}

fn str_of(v: &Value) -> String {
    v.render_to_string()
}

fn arity_error(loc: &SourceLocation, name: &str, expected: &str) -> TemplateError {
    TemplateError::Type {
        loc: loc.clone(),
        message: format!("{name}: expected {expected} argument(s)"),
    }
}

pub fn call(name: &str, args: &[Value], loc: &SourceLocation) -> Result<Value, TemplateError> {
    match name {
        "add" => Ok(Value::from(args.iter().map(num).sum::<f64>())),
        "sub" => {
            if args.is_empty() {
                return Ok(Value::from(0.0));
            }
            let mut it = args.iter();
            let mut acc = num(it.next().unwrap());
            for rest in it {
                acc -= num(rest);
            }
            Ok(Value::from(acc))
        }
        "mul" => Ok(Value::from(args.iter().map(num).product::<f64>())),
        "div" => {
            if args.len() != 2 {
                return Err(arity_error(loc, "div", "2"));
            }
            let denom = num(&args[1]);
            if denom == 0.0 {
                return Err(TemplateError::Type {
                    loc: loc.clone(),
                    message: "div: division by zero".into(),
                });
            }
            Ok(Value::from(num(&args[0]) / denom))
        }
        "mod" => {
            if args.len() != 2 {
                return Err(arity_error(loc, "mod", "2"));
            }
            let denom = num(&args[1]);
            if denom == 0.0 {
                return Err(TemplateError::Type {
                    loc: loc.clone(),
                    message: "mod: division by zero".into(),
                });
            }
            Ok(Value::from(num(&args[0]).rem_euclid(denom)))
        }
        "upper" => Ok(Value::String(str_of(args.first().unwrap_or(&Value::Null)).to_uppercase())),
        "lower" => Ok(Value::String(str_of(args.first().unwrap_or(&Value::Null)).to_lowercase())),
        "title" => Ok(Value::String(title_case(&str_of(args.first().unwrap_or(&Value::Null))))),
        "trim" => Ok(Value::String(str_of(args.first().unwrap_or(&Value::Null)).trim().to_string())),
        "contains" => {
            let (haystack, needle) = two_strings(args, loc, "contains")?;
            Ok(Value::Bool(haystack.contains(&needle)))
        }
        "hasPrefix" => {
            let (haystack, needle) = two_strings(args, loc, "hasPrefix")?;
            Ok(Value::Bool(haystack.starts_with(&needle)))
        }
        "hasSuffix" => {
            let (haystack, needle) = two_strings(args, loc, "hasSuffix")?;
            Ok(Value::Bool(haystack.ends_with(&needle)))
        }
        "replace" => {
            if args.len() != 3 {
                return Err(arity_error(loc, "replace", "3"));
            }
            Ok(Value::String(str_of(&args[0]).replace(&str_of(&args[1]), &str_of(&args[2]))))
        }
        "split" => {
            let (s, sep) = two_strings(args, loc, "split")?;
            Ok(Value::Array(s.split(&sep as &str).map(|p| Value::String(p.to_string())).collect()))
        }
        "join" => {
            if args.len() != 2 {
                return Err(arity_error(loc, "join", "2"));
            }
            let sep = str_of(&args[1]);
            let items = args[0]
                .as_array()
                .map(|a| a.iter().map(str_of).collect::<Vec<_>>())
                .unwrap_or_default();
            Ok(Value::String(items.join(&sep)))
        }
        "isLast" => {
            if args.len() != 2 {
                return Err(arity_error(loc, "isLast", "2 (index, slice)"));
            }
            let idx = num(&args[0]) as i64;
            let len = args[1].as_array().map(|a| a.len() as i64).unwrap_or(0);
            Ok(Value::Bool(idx == len - 1))
        }
        "isFirst" => {
            if args.is_empty() {
                return Err(arity_error(loc, "isFirst", "1 (index)"));
            }
            Ok(Value::Bool(num(&args[0]) == 0.0))
        }
        "len" => Ok(Value::from(value_len(args.first().unwrap_or(&Value::Null)) as i64)),
        "seq" => {
            if args.len() != 2 {
                return Err(arity_error(loc, "seq", "2 (start, end)"));
            }
            let start = num(&args[0]) as i64;
            let end = num(&args[1]) as i64;
            Ok(Value::Array((start..=end).map(|n| Value::from(n)).collect()))
        }
        "slice" => {
            if args.len() < 2 {
                return Err(arity_error(loc, "slice", "2 or 3 (collection, start, end?)"));
            }
            let items = args[0].as_array().cloned().unwrap_or_default();
            let start = num(&args[1]).max(0.0) as usize;
            let end = if args.len() > 2 {
                (num(&args[2]) as usize).min(items.len())
            } else {
                items.len()
            };
            Ok(Value::Array(items.get(start.min(end)..end).unwrap_or(&[]).to_vec()))
        }
        "safeHTML" | "safeJS" | "safeCSS" | "safeURL" | "safeAttr" => {
            Ok(wrap_safe(str_of(args.first().unwrap_or(&Value::Null))))
        }
        "dict" => {
            if args.len() % 2 != 0 {
                return Err(TemplateError::Type {
                    loc: loc.clone(),
                    message: "dict: expected an even number of key/value arguments".into(),
                });
            }
            let mut map = serde_json::Map::new();
            for pair in args.chunks(2) {
                map.insert(str_of(&pair[0]), pair[1].clone());
            }
            Ok(Value::Object(map))
        }
        "default" => {
            if args.len() != 2 {
                return Err(arity_error(loc, "default", "2 (defaultVal, val)"));
            }
            if args[1].is_truthy() {
                Ok(args[1].clone())
            } else {
                Ok(args[0].clone())
            }
        }
        "ternary" => {
            if args.len() != 3 {
                return Err(arity_error(loc, "ternary", "3 (cond, a, b)"));
            }
            Ok(if args[0].is_truthy() { args[1].clone() } else { args[2].clone() })
        }
        "eq" => Ok(Value::Bool(all_pairs(args, compare::eq))),
        "ne" => Ok(Value::Bool(args.len() >= 2 && compare::ne(&args[0], &args[1]))),
        "lt" => Ok(Value::Bool(pair(args, compare::lt))),
        "le" => Ok(Value::Bool(pair(args, compare::le))),
        "gt" => Ok(Value::Bool(pair(args, compare::gt))),
        "ge" => Ok(Value::Bool(pair(args, compare::ge))),
        "isActive" => {
            let (cur, target) = two_strings(args, loc, "isActive")?;
            Ok(Value::Bool(cur == target))
        }
        "isActivePrefix" => {
            let (cur, target) = two_strings(args, loc, "isActivePrefix")?;
            Ok(Value::Bool(cur.starts_with(&target)))
        }
        other if NOOP_HELPER_NAMES.contains(&other) => Ok(Value::Null),
        other => Err(TemplateError::UnknownFunction {
            loc: loc.clone(),
            name: other.to_string(),
        }),
    }
}

fn two_strings(args: &[Value], loc: &SourceLocation, name: &str) -> Result<(String, String), TemplateError> {
    if args.len() != 2 {
        return Err(arity_error(loc, name, "2"));
    }
    Ok((str_of(&args[0]), str_of(&args[1])))
}

fn pair(args: &[Value], f: fn(&Value, &Value) -> bool) -> bool {
    args.len() >= 2 && f(&args[0], &args[1])
}

fn all_pairs(args: &[Value], f: fn(&Value, &Value) -> bool) -> bool {
    if args.len() < 2 {
        return false;
    }
    args[1..].iter().any(|b| f(&args[0], b))
}

fn value_len(v: &Value) -> usize {
    match v {
        Value::Array(a) => a.len(),
        Value::Object(o) => o.len(),
        Value::String(s) => s.chars().count(),
        _ => 0,
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
