use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

static NULL: Value = Value::Null;

/// Field access that treats a missing key as JSON null.
pub fn field<'a>(row: &'a Value, key: &str) -> &'a Value {
    row.get(key).unwrap_or(&NULL)
}

/// The gateway encodes booleans as `"TRUE"`, `"Y"`, or a native bool.
/// Everything else, including lowercase variants, is false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "TRUE" || s == "Y",
        _ => false,
    }
}

/// List fields arrive as JSON arrays, JSON-encoded array strings, or
/// comma-joined strings. Malformed JSON degrades to the comma split.
pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(item_string).collect(),
        Value::String(s) if s.is_empty() => Vec::new(),
        Value::String(s) => {
            if s.starts_with('[') {
                if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(s) {
                    return items.iter().filter_map(item_string).collect();
                }
            }
            s.split(',').map(|part| part.trim().to_string()).collect()
        }
        _ => Vec::new(),
    }
}

/// Avatar fields sometimes arrive as a JSON object string wrapping the
/// actual link under a `Url`/`url` key.
pub fn avatar_url(value: &Value) -> String {
    let raw = match value.as_str() {
        Some(s) => s,
        None => return String::new(),
    };
    if raw.starts_with('{') {
        if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
            if let Some(url) = parsed
                .get("Url")
                .or_else(|| parsed.get("url"))
                .and_then(Value::as_str)
            {
                return url.to_string();
            }
        }
    }
    raw.to_string()
}

/// First non-empty value among the named keys, else the default. Numeric
/// ids are stringified so numeric sheet columns still resolve.
pub fn str_field(row: &Value, keys: &[&str], default: &str) -> String {
    for key in keys {
        match row.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => return s.clone(),
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    default.to_string()
}

/// Numeric coercion with a zero fallback, accepting numbers and numeric
/// strings.
pub fn num_field(row: &Value, key: &str) -> f64 {
    coerce_f64(field(row, key)).unwrap_or(0.0)
}

/// Integer variant of [`num_field`]; fractional values truncate.
pub fn int_field(row: &Value, key: &str) -> i64 {
    coerce_f64(field(row, key)).map(|n| n as i64).unwrap_or(0)
}

/// `None` when the value is absent, empty, or not numeric.
pub fn opt_num_field(row: &Value, key: &str) -> Option<f64> {
    coerce_f64(field(row, key))
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// First parseable date among the named keys. Accepts RFC 3339, a bare
/// datetime, a bare date, and the sheet's m/d/Y form.
pub fn date_field(row: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    for key in keys {
        if let Some(parsed) = field(row, key).as_str().and_then(parse_date) {
            return Some(parsed);
        }
    }
    None
}

/// Tolerant date parsing; anything unrecognized is `None`, never an error.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
        return d.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }
    None
}

fn item_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
