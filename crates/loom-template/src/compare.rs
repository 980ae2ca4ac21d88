use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    Less,
    Equal,
    Greater,
    Incomparable,
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Value-flexible ordering: numeric-vs-numeric compares as f64,
/// string-vs-string compares lexicographically, anything else is
/// `Incomparable` (the ordering predicates then report `false`).
fn order(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return if x < y {
            Ordering::Less
        } else if x > y {
            Ordering::Greater
        } else {
            Ordering::Equal
        };
    }
    if let (Value::String(x), Value::String(y)) = (a, b) {
        return match x.cmp(y) {
            std::cmp::Ordering::Less => Ordering::Less,
            std::cmp::Ordering::Equal => Ordering::Equal,
            std::cmp::Ordering::Greater => Ordering::Greater,
        };
    }
    Ordering::Incomparable
}

pub fn eq(a: &Value, b: &Value) -> bool {
    match order(a, b) {
        Ordering::Equal => true,
        Ordering::Less | Ordering::Greater => false,
        Ordering::Incomparable => a == b,
    }
}

pub fn ne(a: &Value, b: &Value) -> bool {
    !eq(a, b)
}

pub fn lt(a: &Value, b: &Value) -> bool {
    order(a, b) == Ordering::Less
}

pub fn le(a: &Value, b: &Value) -> bool {
    matches!(order(a, b), Ordering::Less | Ordering::Equal)
}

pub fn gt(a: &Value, b: &Value) -> bool {
    order(a, b) == Ordering::Greater
}

pub fn ge(a: &Value, b: &Value) -> bool {
    matches!(order(a, b), Ordering::Greater | Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_compare_across_representations() {
        assert!(eq(&json!(1), &json!(1.0)));
        assert!(lt(&json!(1), &json!(2)));
    }

    #[test]
    fn strings_compare_lexicographically() {
        assert!(lt(&json!("a"), &json!("b")));
    }

    #[test]
    fn incomparable_types_are_not_ordered() {
        assert!(!gt(&json!(2), &json!("x")));
        assert!(!lt(&json!(2), &json!("x")));
    }

    #[test]
    fn structural_equality_fallback() {
        assert!(eq(&json!({"a": 1}), &json!({"a": 1})));
        assert!(!eq(&json!({"a": 1}), &json!({"a": 2})));
    }
}
