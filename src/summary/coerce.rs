//! Loose string/JSON to number coercion.
//!
//! Upstream rows and query tokens are not trusted to be well typed. Both go
//! through the same rules: surrounding whitespace is ignored, an empty string
//! is zero, `0x`/`0o`/`0b` prefixes select a radix, anything else must be a
//! plain decimal or exponent literal.

use serde_json::Value;

/// Coerce a string to a number. `None` means "not a number".
pub fn number_from_str(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(0.0);
    }

    if let Some(n) = radix_literal(s) {
        return Some(n);
    }

    // Rust also accepts "inf"/"nan" spellings; callers filter on finiteness.
    if !s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return match s {
            "Infinity" | "+Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        };
    }

    s.parse::<f64>().ok()
}

fn radix_literal(s: &str) -> Option<f64> {
    let lower = s.get(..2)?.to_ascii_lowercase();
    let radix = match lower.as_str() {
        "0x" => 16,
        "0o" => 8,
        "0b" => 2,
        _ => return None,
    };
    let digits = &s[2..];
    if digits.is_empty() {
        return None;
    }
    u128::from_str_radix(digits, radix).ok().map(|n| n as f64)
}

/// Coerce a JSON value to a finite number, falling back to zero.
///
/// Missing, `null`, non-numeric strings, objects and non-finite results all
/// collapse to `0.0`.
pub fn number_or_zero(value: Option<&Value>) -> f64 {
    let n = match value {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => number_from_str(s).unwrap_or(0.0),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Array(_)) | Some(Value::Object(_)) => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}
