use serde_json::{Map, Value};

/// The closed set of recognized answer value shapes. Form builders send the
/// same logical answer as a plain string, a name pair, a phone object or a
/// date object depending on the question widget; everything else is
/// unrecognized and decodes to `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Name {
        first: Option<String>,
        last: Option<String>,
    },
    Phone(String),
    Date {
        year: String,
        month: String,
        day: String,
    },
}

impl Answer {
    /// Classify a submission value. One level of `{name, value|answer|text}`
    /// question wrapper is unwrapped before classification.
    pub fn decode(value: &Value) -> Option<Answer> {
        match unwrap_question(value) {
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    Some(Answer::Text(s.to_string()))
                }
            }
            Value::Number(n) => Some(Answer::Text(n.to_string())),
            Value::Object(obj) => decode_object(obj),
            _ => None,
        }
    }

    /// Collapse the shape to a single normalized scalar.
    pub fn into_scalar(self) -> String {
        match self {
            Answer::Text(s) => s,
            Answer::Phone(p) => p,
            Answer::Name { first, last } => {
                let mut parts = Vec::new();
                if let Some(f) = first {
                    parts.push(f);
                }
                if let Some(l) = last {
                    parts.push(l);
                }
                parts.join(" ")
            }
            Answer::Date { year, month, day } => format!("{year}-{month}-{day}"),
        }
    }
}

fn decode_object(obj: &Map<String, Value>) -> Option<Answer> {
    if obj.contains_key("first") || obj.contains_key("last") {
        let first = scalar_field(obj, "first");
        let last = scalar_field(obj, "last");
        if first.is_none() && last.is_none() {
            return None;
        }
        return Some(Answer::Name { first, last });
    }

    for key in ["full", "phone", "number"] {
        if let Some(p) = scalar_field(obj, key) {
            return Some(Answer::Phone(p));
        }
    }

    if let (Some(year), Some(month), Some(day)) = (
        scalar_field(obj, "year"),
        scalar_field(obj, "month"),
        scalar_field(obj, "day"),
    ) {
        return Some(Answer::Date { year, month, day });
    }

    None
}

/// Unwrap one level of per-question wrapper: `{name, value|answer|text}`.
/// Returns the value itself when it is not wrapped.
pub fn unwrap_question(value: &Value) -> &Value {
    if let Value::Object(obj) = value {
        if obj.get("name").is_some_and(Value::is_string) {
            for inner in ["value", "answer", "text"] {
                if let Some(v) = obj.get(inner) {
                    return v;
                }
            }
        }
    }
    value
}

/// The wrapper's own field name, when the value is a question wrapper.
/// Used by the generic scan as a better key hint than the outer map key.
pub fn question_name(value: &Value) -> Option<&str> {
    match value {
        Value::Object(obj) => obj.get("name").and_then(Value::as_str),
        _ => None,
    }
}

fn scalar_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
