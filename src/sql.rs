use std::fmt;

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::identifier::{
    AccountObjectIdentifier, DatabaseObjectIdentifier, SchemaObjectIdentifier,
};

/// Render-time request validation failures. Raised before any statement is
/// issued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("mutually exclusive options: {0} and {1}")]
    MutuallyExclusive(&'static str, &'static str),

    #[error("exactly one of {0} must be set")]
    ExactlyOneOf(&'static str),
}

/// Single-quote a string literal, doubling embedded quotes.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

pub fn sql_bool(b: bool) -> &'static str {
    if b { "TRUE" } else { "FALSE" }
}

/// Binary values render as hex literals.
pub fn hex_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 3);
    out.push_str("X'");
    for b in bytes {
        out.push_str(&format!("{b:02X}"));
    }
    out.push('\'');
    out
}

/// Timestamps in statements use one fixed pattern.
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    quote_literal(&ts.format(crate::scan::TIMESTAMP_FORMAT).to_string())
}

/// Function and procedure bodies are dollar-quoted so embedded single
/// quotes survive verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DollarQuoted(pub String);

impl fmt::Display for DollarQuoted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$${}$$", self.0)
    }
}

/// `LIKE 'pattern'` filter clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Like {
    pub pattern: String,
}

impl Like {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub(crate) fn write_sql(&self, sql: &mut String) {
        sql.push_str(" LIKE ");
        sql.push_str(&quote_literal(&self.pattern));
    }
}

/// `IN <scope>` filter clause. Exactly one scope must be set; the renderer
/// rejects combinations rather than silently preferring one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedIn {
    pub account: bool,
    pub database: Option<AccountObjectIdentifier>,
    pub schema: Option<DatabaseObjectIdentifier>,
    pub application: Option<AccountObjectIdentifier>,
    pub application_package: Option<AccountObjectIdentifier>,
    /// `IN CLASS <class>` — the class is an identifier, not a keyword.
    pub class: Option<SchemaObjectIdentifier>,
}

impl ExtendedIn {
    pub fn account() -> Self {
        Self {
            account: true,
            ..Default::default()
        }
    }

    pub fn database(id: AccountObjectIdentifier) -> Self {
        Self {
            database: Some(id),
            ..Default::default()
        }
    }

    pub fn schema(id: DatabaseObjectIdentifier) -> Self {
        Self {
            schema: Some(id),
            ..Default::default()
        }
    }

    pub fn application(id: AccountObjectIdentifier) -> Self {
        Self {
            application: Some(id),
            ..Default::default()
        }
    }

    pub fn application_package(id: AccountObjectIdentifier) -> Self {
        Self {
            application_package: Some(id),
            ..Default::default()
        }
    }

    pub fn class(id: SchemaObjectIdentifier) -> Self {
        Self {
            class: Some(id),
            ..Default::default()
        }
    }

    fn set_scopes(&self) -> usize {
        usize::from(self.account)
            + usize::from(self.database.is_some())
            + usize::from(self.schema.is_some())
            + usize::from(self.application.is_some())
            + usize::from(self.application_package.is_some())
            + usize::from(self.class.is_some())
    }

    pub(crate) fn validate(&self) -> Result<(), RequestError> {
        match self.set_scopes() {
            1 => Ok(()),
            _ => Err(RequestError::ExactlyOneOf(
                "in.account, in.database, in.schema, in.application, in.application_package, in.class",
            )),
        }
    }

    pub(crate) fn write_sql(&self, sql: &mut String) -> Result<(), RequestError> {
        self.validate()?;
        sql.push_str(" IN");
        if self.account {
            sql.push_str(" ACCOUNT");
        } else if let Some(db) = &self.database {
            sql.push_str(" DATABASE ");
            sql.push_str(&db.fully_qualified_name());
        } else if let Some(schema) = &self.schema {
            sql.push_str(" SCHEMA ");
            sql.push_str(&schema.fully_qualified_name());
        } else if let Some(app) = &self.application {
            sql.push_str(" APPLICATION ");
            sql.push_str(&app.fully_qualified_name());
        } else if let Some(pkg) = &self.application_package {
            sql.push_str(" APPLICATION PACKAGE ");
            sql.push_str(&pkg.fully_qualified_name());
        } else if let Some(class) = &self.class {
            sql.push_str(" CLASS ");
            sql.push_str(&class.fully_qualified_name());
        }
        Ok(())
    }
}

/// `LIMIT n [FROM 'name']` pagination clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitFrom {
    pub rows: u32,
    pub from: Option<String>,
}

impl LimitFrom {
    pub fn new(rows: u32) -> Self {
        Self { rows, from: None }
    }

    pub fn from(rows: u32, from: impl Into<String>) -> Self {
        Self {
            rows,
            from: Some(from.into()),
        }
    }

    pub(crate) fn write_sql(&self, sql: &mut String) {
        sql.push_str(&format!(" LIMIT {}", self.rows));
        if let Some(from) = &self.from {
            sql.push_str(" FROM ");
            sql.push_str(&quote_literal(from));
        }
    }
}

/// `STARTS WITH 'prefix'` filter clause. Case-sensitive, unlike LIKE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartsWith(pub String);

impl StartsWith {
    pub(crate) fn write_sql(&self, sql: &mut String) {
        sql.push_str(" STARTS WITH ");
        sql.push_str(&quote_literal(&self.0));
    }
}

/// `property = 'value'` assignment used throughout SET clauses.
pub(crate) fn push_string_property(props: &mut Vec<String>, name: &str, value: &Option<String>) {
    if let Some(value) = value {
        props.push(format!("{name} = {}", quote_literal(value)));
    }
}

pub(crate) fn push_bool_property(props: &mut Vec<String>, name: &str, value: &Option<bool>) {
    if let Some(value) = value {
        props.push(format!("{name} = {}", sql_bool(*value)));
    }
}

pub(crate) fn push_int_property(props: &mut Vec<String>, name: &str, value: &Option<i64>) {
    if let Some(value) = value {
        props.push(format!("{name} = {value}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_double_single_quotes() {
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_literal(""), "''");
    }

    #[test]
    fn hex_literals() {
        assert_eq!(hex_literal(&[0x1A, 0x2B]), "X'1A2B'");
    }

    #[test]
    fn dollar_quoting() {
        assert_eq!(
            DollarQuoted("select 'a'".to_string()).to_string(),
            "$$select 'a'$$"
        );
    }

    #[test]
    fn timestamps_render_in_fixed_pattern() {
        let ts = DateTime::parse_from_rfc3339("2024-01-02T15:04:05.000-07:00").unwrap();
        assert_eq!(format_timestamp(&ts), "'2024-01-02T15:04:05.000 -0700'");
    }

    #[test]
    fn extended_in_requires_exactly_one_scope() {
        let mut sql = String::new();
        assert!(ExtendedIn::default().write_sql(&mut sql).is_err());

        let mut both = ExtendedIn::account();
        both.database = Some(AccountObjectIdentifier::new("DB"));
        assert!(both.validate().is_err());

        let mut sql = String::new();
        ExtendedIn::database(AccountObjectIdentifier::new("db1"))
            .write_sql(&mut sql)
            .unwrap();
        assert_eq!(sql, " IN DATABASE \"db1\"");
    }

    #[test]
    fn in_class_renders_identifier() {
        let mut sql = String::new();
        ExtendedIn::class(SchemaObjectIdentifier::new("SNOWFLAKE", "ML", "FORECAST"))
            .write_sql(&mut sql)
            .unwrap();
        assert_eq!(sql, " IN CLASS \"SNOWFLAKE\".\"ML\".\"FORECAST\"");
    }

    #[test]
    fn limit_from_clause() {
        let mut sql = String::new();
        LimitFrom::from(1, "PREF1").write_sql(&mut sql);
        assert_eq!(sql, " LIMIT 1 FROM 'PREF1'");

        let mut sql = String::new();
        LimitFrom::new(25).write_sql(&mut sql);
        assert_eq!(sql, " LIMIT 25");
    }
}
