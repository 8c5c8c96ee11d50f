use std::any::type_name;

use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::scan::{ScanError, SqlBool, SqlInt, SqlString, scan_string_list, scan_timestamp};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("expected result value to be an array of rows, got: {0}")]
    NotAnArray(&'static str),

    #[error("expected row {row} to be an array, got: {got}")]
    RowNotAnArray { row: usize, got: &'static str },

    #[error("column not in result: {0}")]
    UnknownColumn(String),

    #[error("column {col} (index {idx}) missing in row {row}")]
    MissingCell { col: String, idx: usize, row: usize },

    #[error("failed to parse column {col} in row {row} (raw value {raw}): {source}")]
    ScanCell {
        col: String,
        row: usize,
        raw: String,
        #[source]
        source: ScanError,
    },

    #[error("failed to parse column {col} in row {row} as type {type}: {source}")]
    DeserializeCell {
        col: String,
        r#type: String,
        row: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("column {col} in row {row} is null")]
    NullCell { col: String, row: usize },

    #[error("column {col} in row {row} holds no valid {what}: {raw}")]
    InvalidEnum {
        col: String,
        row: usize,
        what: &'static str,
        raw: String,
    },
}

/// Helper because serde_json::Value doesn't expose a simple "kind()".
fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// An owned result set: column names plus row-major cells.
///
/// Built from a `snowflake_api::JsonResult` by the session, or assembled
/// directly in tests.
#[derive(Debug, Clone, Default)]
pub struct JsonTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl JsonTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn from_json_result(result: &snowflake_api::JsonResult) -> Result<Self, DecodeError> {
        let columns = result.schema.iter().map(|c| c.name.clone()).collect();
        let raw_rows = result
            .value
            .as_array()
            .ok_or(DecodeError::NotAnArray(json_kind(&result.value)))?;
        let mut rows = Vec::with_capacity(raw_rows.len());
        for (idx, row) in raw_rows.iter().enumerate() {
            let cells = row.as_array().ok_or(DecodeError::RowNotAnArray {
                row: idx,
                got: json_kind(row),
            })?;
            rows.push(cells.clone());
        }
        Ok(Self { columns, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn records(&self) -> impl Iterator<Item = RecordRef<'_>> {
        self.rows.iter().enumerate().map(|(row_idx, row)| RecordRef {
            columns: &self.columns,
            row,
            row_idx,
        })
    }

    /// Decode every row into `T`.
    pub fn decode<T: FromRecord>(&self) -> Result<Vec<T>, DecodeError> {
        self.records().map(|rec| T::from_record(&rec)).collect()
    }
}

/// A row type that knows how to decode itself from a result record.
pub trait FromRecord: Sized {
    fn from_record(record: &RecordRef<'_>) -> Result<Self, DecodeError>;
}

/// View over one row of a [`JsonTable`].
pub struct RecordRef<'a> {
    columns: &'a [String],
    row: &'a [Value],
    row_idx: usize,
}

impl<'a> RecordRef<'a> {
    fn col_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        let idx = self.col_index(name)?;
        self.row.get(idx)
    }

    /// Like get(), but errors if the column is not present.
    pub fn require(&self, name: &str) -> Result<&'a Value, DecodeError> {
        let idx = self
            .col_index(name)
            .ok_or_else(|| DecodeError::UnknownColumn(name.to_string()))?;
        self.row.get(idx).ok_or_else(|| DecodeError::MissingCell {
            col: name.to_string(),
            idx,
            row: self.row_idx,
        })
    }

    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, DecodeError> {
        let Some(v) = self.get(name) else {
            return Ok(None);
        };
        Ok(Some(T::deserialize(v).map_err(|e| {
            DecodeError::DeserializeCell {
                r#type: type_name::<T>().to_string(),
                col: name.to_string(),
                row: self.row_idx,
                source: e,
            }
        })?))
    }

    pub fn require_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, DecodeError> {
        let v = self.require(name)?;
        serde_json::from_value(v.clone()).map_err(|e| DecodeError::DeserializeCell {
            r#type: type_name::<T>().to_string(),
            col: name.to_string(),
            row: self.row_idx,
            source: e,
        })
    }

    fn scan_cell<T>(
        &self,
        name: &str,
        scan: impl FnOnce(&Value) -> Result<T, ScanError>,
    ) -> Result<T, DecodeError> {
        let v = self.require(name)?;
        scan(v).map_err(|e| DecodeError::ScanCell {
            col: name.to_string(),
            row: self.row_idx,
            raw: v.to_string(),
            source: e,
        })
    }

    /// Nullable string; empty and `"null"` come back as None.
    pub fn get_string(&self, name: &str) -> Result<Option<String>, DecodeError> {
        let s = self.scan_cell(name, SqlString::scan)?;
        Ok(s.into_value().filter(|s| !s.is_empty()))
    }

    pub fn require_string(&self, name: &str) -> Result<String, DecodeError> {
        self.scan_cell(name, SqlString::scan)?
            .into_value()
            .ok_or_else(|| DecodeError::NullCell {
                col: name.to_string(),
                row: self.row_idx,
            })
    }

    pub fn get_bool(&self, name: &str) -> Result<SqlBool, DecodeError> {
        self.scan_cell(name, SqlBool::scan)
    }

    pub fn require_bool(&self, name: &str) -> Result<bool, DecodeError> {
        let b = self.scan_cell(name, SqlBool::scan)?;
        if b.is_valid() {
            Ok(b.bool_value())
        } else {
            Err(DecodeError::NullCell {
                col: name.to_string(),
                row: self.row_idx,
            })
        }
    }

    pub fn get_i64(&self, name: &str) -> Result<Option<i64>, DecodeError> {
        Ok(self.scan_cell(name, SqlInt::scan)?.int_value())
    }

    pub fn get_timestamp(&self, name: &str) -> Result<Option<DateTime<FixedOffset>>, DecodeError> {
        self.scan_cell(name, scan_timestamp)
    }

    /// Raw timestamp text, for rows that carry the server's formatting
    /// through unchanged.
    pub fn get_timestamp_text(&self, name: &str) -> Result<Option<String>, DecodeError> {
        self.get_string(name)
    }

    /// Error for a cell whose text failed a dialect-enum parse.
    pub fn invalid_enum(&self, col: &str, what: &'static str, raw: &str) -> DecodeError {
        DecodeError::InvalidEnum {
            col: col.to_string(),
            row: self.row_idx,
            what,
            raw: raw.to_string(),
        }
    }

    /// List-valued column: `[a, b, c]`.
    pub fn get_list(&self, name: &str) -> Result<Vec<String>, DecodeError> {
        Ok(match self.get_string(name)? {
            Some(raw) => scan_string_list(&raw),
            None => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> JsonTable {
        JsonTable::new(
            vec!["name".into(), "is_default".into(), "rows".into(), "tags".into()],
            vec![
                vec![json!("WH1"), json!("true"), json!(10), json!("[A, B]")],
                vec![json!("WH2"), json!("null"), json!("null"), json!("[]")],
            ],
        )
    }

    #[test]
    fn typed_getters() {
        let t = table();
        let recs: Vec<_> = t.records().collect();
        assert_eq!(recs[0].require_string("name").unwrap(), "WH1");
        assert!(recs[0].require_bool("is_default").unwrap());
        assert_eq!(recs[0].get_i64("rows").unwrap(), Some(10));
        assert_eq!(recs[0].get_list("tags").unwrap(), vec!["A", "B"]);

        assert!(!recs[1].get_bool("is_default").unwrap().is_valid());
        assert_eq!(recs[1].get_i64("rows").unwrap(), None);
        assert!(recs[1].get_list("tags").unwrap().is_empty());
    }

    #[test]
    fn unknown_column_is_an_error() {
        let t = table();
        let rec = t.records().next().unwrap();
        assert!(matches!(
            rec.require_string("nope").unwrap_err(),
            DecodeError::UnknownColumn(_)
        ));
        assert!(rec.get("nope").is_none());
    }

    #[test]
    fn scan_errors_carry_column_and_raw_value() {
        let t = JsonTable::new(
            vec!["flag".into()],
            vec![vec![json!("definitely-not-a-bool")]],
        );
        let rec = t.records().next().unwrap();
        let err = rec.require_bool("flag").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("flag"));
        assert!(msg.contains("definitely-not-a-bool"));
    }

    #[test]
    fn decode_via_from_record() {
        struct Row {
            name: String,
        }
        impl FromRecord for Row {
            fn from_record(record: &RecordRef<'_>) -> Result<Self, DecodeError> {
                Ok(Row {
                    name: record.require_string("name")?,
                })
            }
        }
        let rows: Vec<Row> = table().decode().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "WH1");
    }
}
