use serde_json::Value;
use thiserror::Error;

use crate::identifier::IdentifierError;
use crate::sql::{ExtendedIn, Like, LimitFrom, RequestError, StartsWith};

/// Errors translating a host-engine attribute bag into filter clauses.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("invalid `{attribute}` filter: {message}")]
    Invalid {
        attribute: &'static str,
        message: String,
    },

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Request(#[from] RequestError),
}

fn invalid(attribute: &'static str, message: impl Into<String>) -> FilterError {
    FilterError::Invalid {
        attribute,
        message: message.into(),
    }
}

/// `like = "pattern"` → `Like` clause.
pub fn handle_like(config: &Value) -> Result<Option<Like>, FilterError> {
    match config.get("like") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(pattern)) if !pattern.is_empty() => Ok(Some(Like::new(pattern))),
        Some(other) => Err(invalid("like", format!("expected a string, got {other}"))),
    }
}

/// `in = { account | database | schema | application | application_package }`
/// → `ExtendedIn`. Passing more than one scope is rejected; the legacy
/// behavior of letting later scopes overwrite earlier ones is gone.
pub fn handle_extended_in(config: &Value) -> Result<Option<ExtendedIn>, FilterError> {
    let Some(in_value) = config.get("in") else {
        return Ok(None);
    };
    if in_value.is_null() {
        return Ok(None);
    }
    let obj = in_value
        .as_object()
        .ok_or_else(|| invalid("in", format!("expected an object, got {in_value}")))?;

    let mut result = ExtendedIn::default();
    for (key, value) in obj {
        if value.is_null() {
            continue;
        }
        match key.as_str() {
            "account" => {
                result.account = value
                    .as_bool()
                    .ok_or_else(|| invalid("in", format!("account: expected a bool, got {value}")))?;
            }
            "database" => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| invalid("in", format!("database: expected a string, got {value}")))?;
                result.database = Some(raw.parse()?);
            }
            "schema" => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| invalid("in", format!("schema: expected a string, got {value}")))?;
                result.schema = Some(raw.parse()?);
            }
            "application" => {
                let raw = value.as_str().ok_or_else(|| {
                    invalid("in", format!("application: expected a string, got {value}"))
                })?;
                result.application = Some(raw.parse()?);
            }
            "application_package" => {
                let raw = value.as_str().ok_or_else(|| {
                    invalid(
                        "in",
                        format!("application_package: expected a string, got {value}"),
                    )
                })?;
                result.application_package = Some(raw.parse()?);
            }
            other => return Err(invalid("in", format!("unknown scope `{other}`"))),
        }
    }
    result.validate()?;
    Ok(Some(result))
}

/// `limit = { rows, from? }` → `LimitFrom`.
pub fn handle_limit_from(config: &Value) -> Result<Option<LimitFrom>, FilterError> {
    let Some(limit) = config.get("limit") else {
        return Ok(None);
    };
    if limit.is_null() {
        return Ok(None);
    }
    let obj = limit
        .as_object()
        .ok_or_else(|| invalid("limit", format!("expected an object, got {limit}")))?;
    let rows = obj
        .get("rows")
        .and_then(Value::as_u64)
        .ok_or_else(|| invalid("limit", "rows: expected a positive integer"))?;
    let rows = u32::try_from(rows).map_err(|_| invalid("limit", "rows: out of range"))?;
    let from = match obj.get("from") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => return Err(invalid("limit", format!("from: expected a string, got {other}"))),
    };
    Ok(Some(LimitFrom { rows, from }))
}

/// `starts_with = "prefix"` → `StartsWith` clause.
pub fn handle_starts_with(config: &Value) -> Result<Option<StartsWith>, FilterError> {
    match config.get("starts_with") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(prefix)) if !prefix.is_empty() => Ok(Some(StartsWith(prefix.clone()))),
        Some(other) => Err(invalid(
            "starts_with",
            format!("expected a string, got {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn like_decodes() {
        let like = handle_like(&json!({"like": "PREF%"})).unwrap().unwrap();
        assert_eq!(like.pattern, "PREF%");
        assert!(handle_like(&json!({})).unwrap().is_none());
        assert!(handle_like(&json!({"like": 3})).is_err());
    }

    #[test]
    fn extended_in_decodes_single_scope() {
        let scope = handle_extended_in(&json!({"in": {"database": "db1"}}))
            .unwrap()
            .unwrap();
        assert_eq!(
            scope.database.unwrap().fully_qualified_name(),
            "\"DB1\"" // unquoted input folds to upper case
        );

        let scope = handle_extended_in(&json!({"in": {"schema": "\"db\".\"sch\""}}))
            .unwrap()
            .unwrap();
        assert_eq!(
            scope.schema.unwrap().fully_qualified_name(),
            "\"db\".\"sch\""
        );
    }

    #[test]
    fn extended_in_rejects_combinations() {
        let err = handle_extended_in(&json!({"in": {"account": true, "database": "db1"}}))
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::Request(RequestError::ExactlyOneOf(_))
        ));
    }

    #[test]
    fn extended_in_rejects_empty_object() {
        assert!(handle_extended_in(&json!({"in": {}})).is_err());
        assert!(handle_extended_in(&json!({})).unwrap().is_none());
    }

    #[test]
    fn limit_from_decodes() {
        let limit = handle_limit_from(&json!({"limit": {"rows": 1, "from": "PREF1"}}))
            .unwrap()
            .unwrap();
        assert_eq!(limit.rows, 1);
        assert_eq!(limit.from.as_deref(), Some("PREF1"));
        assert!(handle_limit_from(&json!({"limit": {"from": "x"}})).is_err());
    }

    #[test]
    fn starts_with_decodes() {
        let sw = handle_starts_with(&json!({"starts_with": "PRE"}))
            .unwrap()
            .unwrap();
        assert_eq!(sw.0, "PRE");
    }
}
