use serde_json::Value;

/// Best-effort numeric coercion for provider fields.
///
/// Numbers pass through, strings are trimmed and parsed, anything else
/// (missing, null, `"None"`, bools, nested values) becomes `0.0`. Non-finite
/// results are also mapped to `0.0` so callers can rely on finite output.
pub fn to_float(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => parse_f64_or_zero(s),
        _ => 0.0,
    };
    finite_or_zero(parsed)
}

pub fn parse_f64_or_zero(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    finite_or_zero(t.parse::<f64>().unwrap_or(0.0))
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
