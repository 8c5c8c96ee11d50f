use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use thiserror::Error;

/// Row timestamps come back as `2024-01-02T15:04:05.000 -0700`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f %z";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("cannot scan {got} as {wanted}")]
    TypeMismatch { wanted: &'static str, got: String },
}

fn mismatch(wanted: &'static str, value: &Value) -> ScanError {
    ScanError::TypeMismatch {
        wanted,
        got: value.to_string(),
    }
}

/// Nullable boolean as Snowflake emits it: sometimes a native boolean,
/// sometimes the strings `"true"`/`"false"`, and sometimes the literal
/// string `"null"` standing in for SQL NULL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlBool {
    valid: bool,
    value: bool,
}

impl SqlBool {
    pub fn scan(value: &Value) -> Result<Self, ScanError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Bool(b) => Ok(Self {
                valid: true,
                value: *b,
            }),
            Value::String(s) => match s.as_str() {
                "null" => Ok(Self::default()),
                "true" | "TRUE" => Ok(Self {
                    valid: true,
                    value: true,
                }),
                "false" | "FALSE" => Ok(Self {
                    valid: true,
                    value: false,
                }),
                _ => Err(mismatch("bool", value)),
            },
            _ => Err(mismatch("bool", value)),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The underlying value; false when invalid.
    pub fn bool_value(&self) -> bool {
        self.valid && self.value
    }
}

/// Nullable string. The literal `"null"` counts as NULL; numbers pass
/// through the driver's default conversion to text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlString {
    value: Option<String>,
}

impl SqlString {
    pub fn scan(value: &Value) -> Result<Self, ScanError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::String(s) if s == "null" => Ok(Self::default()),
            Value::String(s) => Ok(Self {
                value: Some(s.clone()),
            }),
            Value::Number(n) => Ok(Self {
                value: Some(n.to_string()),
            }),
            Value::Bool(b) => Ok(Self {
                value: Some(b.to_string()),
            }),
            _ => Err(mismatch("string", value)),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }

    pub fn string_value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn into_value(self) -> Option<String> {
        self.value
    }
}

/// Nullable integer; numeric strings parse, as the driver would.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlInt {
    value: Option<i64>,
}

impl SqlInt {
    pub fn scan(value: &Value) -> Result<Self, ScanError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::String(s) if s == "null" => Ok(Self::default()),
            Value::Number(n) => n
                .as_i64()
                .map(|v| Self { value: Some(v) })
                .ok_or_else(|| mismatch("i64", value)),
            Value::String(s) => s
                .parse::<i64>()
                .map(|v| Self { value: Some(v) })
                .map_err(|_| mismatch("i64", value)),
            _ => Err(mismatch("i64", value)),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }

    pub fn int_value(&self) -> Option<i64> {
        self.value
    }
}

/// Parse a timestamp cell in the fixed SHOW/DESCRIBE output format.
pub fn scan_timestamp(value: &Value) -> Result<Option<DateTime<FixedOffset>>, ScanError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s == "null" => Ok(None),
        Value::String(s) => DateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .map(Some)
            .map_err(|_| mismatch("timestamp", value)),
        _ => Err(mismatch("timestamp", value)),
    }
}

/// Split a list-valued SHOW column: comma-separated inside `[ ]`, each
/// element trimmed. An empty list renders as `[]`.
pub fn scan_string_list(raw: &str) -> Vec<String> {
    let inner = raw
        .trim()
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .unwrap_or(raw)
        .trim();
    if inner.is_empty() {
        return Vec::new();
    }
    inner.split(',').map(|e| e.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bool_null_string_is_invalid_without_error() {
        let b = SqlBool::scan(&json!("null")).unwrap();
        assert!(!b.is_valid());
        assert!(!b.bool_value());
    }

    #[test]
    fn bool_nil_is_invalid_without_error() {
        let b = SqlBool::scan(&Value::Null).unwrap();
        assert!(!b.is_valid());
        assert!(!b.bool_value());
    }

    #[test]
    fn bool_parses_native_and_string_forms() {
        for v in [json!(true), json!("true")] {
            let b = SqlBool::scan(&v).unwrap();
            assert!(b.is_valid());
            assert!(b.bool_value());
        }
        let b = SqlBool::scan(&json!("false")).unwrap();
        assert!(b.is_valid());
        assert!(!b.bool_value());
    }

    #[test]
    fn bool_rejects_garbage() {
        assert!(SqlBool::scan(&json!("xyz")).is_err());
        assert!(SqlBool::scan(&json!(3)).is_err());
    }

    #[test]
    fn string_scans() {
        assert_eq!(
            SqlString::scan(&json!("wh")).unwrap().string_value(),
            Some("wh")
        );
        assert!(!SqlString::scan(&json!("null")).unwrap().is_valid());
        assert_eq!(
            SqlString::scan(&json!(5)).unwrap().string_value(),
            Some("5")
        );
    }

    #[test]
    fn int_scans() {
        assert_eq!(SqlInt::scan(&json!(7)).unwrap().int_value(), Some(7));
        assert_eq!(SqlInt::scan(&json!("42")).unwrap().int_value(), Some(42));
        assert!(!SqlInt::scan(&Value::Null).unwrap().is_valid());
        assert!(SqlInt::scan(&json!("4x")).is_err());
    }

    #[test]
    fn timestamp_scans_fixed_format() {
        let ts = scan_timestamp(&json!("2024-01-02T15:04:05.000 -0700"))
            .unwrap()
            .unwrap();
        assert_eq!(ts.timezone().local_minus_utc(), -7 * 3600);
        assert!(scan_timestamp(&json!("not a time")).is_err());
        assert!(scan_timestamp(&Value::Null).unwrap().is_none());
    }

    #[test]
    fn string_lists_split_and_trim() {
        assert_eq!(
            scan_string_list("[A, B ,C]"),
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );
        assert!(scan_string_list("[]").is_empty());
        assert_eq!(scan_string_list("A,B"), vec!["A", "B"]);
    }
}
