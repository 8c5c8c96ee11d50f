use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::datatype::{DataType, parse_data_type};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("wrong number of parts in identifier: expected {expected}, got {got}")]
    WrongNumberOfParts { expected: usize, got: usize },

    #[error("empty identifier component")]
    EmptyComponent,
}

/// Quote one identifier part, doubling any embedded double quotes.
pub(crate) fn quote_part(part: &str) -> String {
    format!("\"{}\"", part.replace('"', "\"\""))
}

/// Split a raw identifier on unquoted dots.
///
/// Quoted parts keep their content verbatim (embedded `""` collapses to
/// `"`); unquoted parts fold to upper case. A quote anywhere but at a part
/// boundary is malformed.
pub(crate) fn parse_parts(raw: &str) -> Result<Vec<String>, IdentifierError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quoted_part = false;
    let mut chars = raw.chars().peekable();

    loop {
        match chars.next() {
            Some('"') => {
                if !current.is_empty() || quoted_part {
                    return Err(IdentifierError::InvalidIdentifier(raw.to_string()));
                }
                quoted_part = true;
                loop {
                    match chars.next() {
                        Some('"') => {
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                current.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(c) => current.push(c),
                        None => return Err(IdentifierError::InvalidIdentifier(raw.to_string())),
                    }
                }
                match chars.peek() {
                    Some('.') | None => {}
                    Some(_) => return Err(IdentifierError::InvalidIdentifier(raw.to_string())),
                }
            }
            Some('.') => {
                if current.is_empty() {
                    return Err(IdentifierError::EmptyComponent);
                }
                parts.push(if quoted_part {
                    std::mem::take(&mut current)
                } else {
                    std::mem::take(&mut current).to_uppercase()
                });
                quoted_part = false;
            }
            Some(c) => {
                if quoted_part {
                    return Err(IdentifierError::InvalidIdentifier(raw.to_string()));
                }
                current.push(c);
            }
            None => {
                if current.is_empty() {
                    return Err(IdentifierError::EmptyComponent);
                }
                parts.push(if quoted_part {
                    current.to_string()
                } else {
                    current.to_uppercase()
                });
                return Ok(parts);
            }
        }
    }
}

fn parse_exact(raw: &str, expected: usize) -> Result<Vec<String>, IdentifierError> {
    let parts = parse_parts(raw)?;
    if parts.len() != expected {
        return Err(IdentifierError::WrongNumberOfParts {
            expected,
            got: parts.len(),
        });
    }
    Ok(parts)
}

/// Identifier of an account-level object (warehouse, database, role, user, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountObjectIdentifier {
    name: String,
}

impl AccountObjectIdentifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fully_qualified_name(&self) -> String {
        quote_part(&self.name)
    }
}

impl FromStr for AccountObjectIdentifier {
    type Err = IdentifierError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = parse_exact(raw, 1)?;
        Ok(Self {
            name: parts.remove(0),
        })
    }
}

impl fmt::Display for AccountObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fully_qualified_name())
    }
}

/// Identifier of an object that lives directly under a database (schema,
/// database role).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabaseObjectIdentifier {
    database: String,
    name: String,
}

impl DatabaseObjectIdentifier {
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database_id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.database)
    }

    pub fn fully_qualified_name(&self) -> String {
        format!("{}.{}", quote_part(&self.database), quote_part(&self.name))
    }
}

impl FromStr for DatabaseObjectIdentifier {
    type Err = IdentifierError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = parse_exact(raw, 2)?;
        let name = parts.pop().unwrap();
        let database = parts.pop().unwrap();
        Ok(Self { database, name })
    }
}

impl fmt::Display for DatabaseObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fully_qualified_name())
    }
}

/// Identifier of an object that lives in a schema (table, stream, task,
/// policy, secret, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaObjectIdentifier {
    database: String,
    schema: String,
    name: String,
}

impl SchemaObjectIdentifier {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            name: name.into(),
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database_id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.database)
    }

    pub fn schema_id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new(&self.database, &self.schema)
    }

    pub fn fully_qualified_name(&self) -> String {
        format!(
            "{}.{}.{}",
            quote_part(&self.database),
            quote_part(&self.schema),
            quote_part(&self.name)
        )
    }
}

impl FromStr for SchemaObjectIdentifier {
    type Err = IdentifierError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = parse_exact(raw, 3)?;
        let name = parts.pop().unwrap();
        let schema = parts.pop().unwrap();
        let database = parts.pop().unwrap();
        Ok(Self {
            database,
            schema,
            name,
        })
    }
}

impl fmt::Display for SchemaObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fully_qualified_name())
    }
}

/// Schema object identifier carrying argument types, as used by functions
/// and procedures: `"DB"."SCHEMA"."FN"(NUMBER, VARCHAR)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaObjectIdentifierWithArguments {
    id: SchemaObjectIdentifier,
    arguments: Vec<DataType>,
}

impl SchemaObjectIdentifierWithArguments {
    pub fn new(id: SchemaObjectIdentifier, arguments: Vec<DataType>) -> Self {
        Self { id, arguments }
    }

    pub fn schema_object_id(&self) -> &SchemaObjectIdentifier {
        &self.id
    }

    pub fn database_name(&self) -> &str {
        self.id.database_name()
    }

    pub fn schema_name(&self) -> &str {
        self.id.schema_name()
    }

    pub fn name(&self) -> &str {
        self.id.name()
    }

    pub fn arguments(&self) -> &[DataType] {
        &self.arguments
    }

    pub fn database_id(&self) -> AccountObjectIdentifier {
        self.id.database_id()
    }

    pub fn schema_id(&self) -> DatabaseObjectIdentifier {
        self.id.schema_id()
    }

    /// Argument types render in their legacy short form, which is how the
    /// server spells them back in SHOW output.
    pub fn fully_qualified_name(&self) -> String {
        let args: Vec<String> = self
            .arguments
            .iter()
            .map(|t| t.to_legacy_sql())
            .collect();
        format!("{}({})", self.id.fully_qualified_name(), args.join(", "))
    }
}

impl FromStr for SchemaObjectIdentifierWithArguments {
    type Err = IdentifierError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let open = find_unquoted(raw, '(')
            .ok_or_else(|| IdentifierError::InvalidIdentifier(raw.to_string()))?;
        if !raw.ends_with(')') {
            return Err(IdentifierError::InvalidIdentifier(raw.to_string()));
        }
        let id: SchemaObjectIdentifier = raw[..open].parse()?;
        let args_raw = &raw[open + 1..raw.len() - 1];
        let mut arguments = Vec::new();
        if !args_raw.trim().is_empty() {
            for arg in split_top_level(args_raw) {
                let data_type = parse_data_type(arg.trim())
                    .map_err(|_| IdentifierError::InvalidIdentifier(raw.to_string()))?;
                arguments.push(data_type);
            }
        }
        Ok(Self { id, arguments })
    }
}

impl fmt::Display for SchemaObjectIdentifierWithArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fully_qualified_name())
    }
}

/// First unquoted occurrence of `needle` in `raw`.
fn find_unquoted(raw: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    for (i, c) in raw.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c == needle && !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split on commas that sit outside parentheses, so `NUMBER(10, 2)` stays
/// one element.
fn split_top_level(raw: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in raw.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&raw[start..]);
    out
}

/// Identifier of an account: `"ORG"."ACCOUNT"`, or a legacy single-part
/// account locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountIdentifier {
    organization: Option<String>,
    account: String,
}

impl AccountIdentifier {
    pub fn new(organization: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            organization: Some(organization.into()),
            account: account.into(),
        }
    }

    pub fn from_locator(locator: impl Into<String>) -> Self {
        Self {
            organization: None,
            account: locator.into(),
        }
    }

    pub fn organization_name(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    pub fn account_name(&self) -> &str {
        &self.account
    }

    pub fn fully_qualified_name(&self) -> String {
        match &self.organization {
            Some(org) => format!("{}.{}", quote_part(org), quote_part(&self.account)),
            None => quote_part(&self.account),
        }
    }
}

impl FromStr for AccountIdentifier {
    type Err = IdentifierError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = parse_parts(raw)?;
        match parts.len() {
            1 => Ok(Self {
                organization: None,
                account: parts.remove(0),
            }),
            2 => {
                let account = parts.pop().unwrap();
                let organization = parts.pop().unwrap();
                Ok(Self {
                    organization: Some(organization),
                    account,
                })
            }
            got => Err(IdentifierError::WrongNumberOfParts { expected: 2, got }),
        }
    }
}

impl fmt::Display for AccountIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fully_qualified_name())
    }
}

/// Identifier of an object in another account, as used by shares and
/// failover: between one and four dotted parts, the leading parts naming
/// the organization and account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalObjectIdentifier {
    parts: Vec<String>,
}

impl ExternalObjectIdentifier {
    pub fn new(parts: Vec<String>) -> Result<Self, IdentifierError> {
        if parts.is_empty() || parts.len() > 4 {
            return Err(IdentifierError::WrongNumberOfParts {
                expected: 4,
                got: parts.len(),
            });
        }
        if parts.iter().any(|p| p.is_empty()) {
            return Err(IdentifierError::EmptyComponent);
        }
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn fully_qualified_name(&self) -> String {
        self.parts
            .iter()
            .map(|p| quote_part(p))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl FromStr for ExternalObjectIdentifier {
    type Err = IdentifierError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::new(parse_parts(raw)?)
    }
}

impl fmt::Display for ExternalObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fully_qualified_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquoted_parts_fold_to_upper_case() {
        let id: SchemaObjectIdentifier = "mydb.public.foo".parse().unwrap();
        assert_eq!(id.database_name(), "MYDB");
        assert_eq!(id.schema_name(), "PUBLIC");
        assert_eq!(id.name(), "FOO");
        assert_eq!(id.fully_qualified_name(), "\"MYDB\".\"PUBLIC\".\"FOO\"");
    }

    #[test]
    fn quoted_parts_stay_verbatim() {
        let id: SchemaObjectIdentifier = "\"a\".\"b\".\"c\"".parse().unwrap();
        assert_eq!(id.database_name(), "a");
        assert_eq!(id.schema_name(), "b");
        assert_eq!(id.name(), "c");
        assert_eq!(id.database_id().fully_qualified_name(), "\"a\"");
        assert_eq!(id.schema_id().fully_qualified_name(), "\"a\".\"b\"");
    }

    #[test]
    fn quoted_dot_is_one_part() {
        let id: AccountObjectIdentifier = "\"A.B\"".parse().unwrap();
        assert_eq!(id.name(), "A.B");
        assert_eq!(id.fully_qualified_name(), "\"A.B\"");
    }

    #[test]
    fn embedded_quotes_round_trip() {
        let id = AccountObjectIdentifier::new("wei\"rd");
        assert_eq!(id.fully_qualified_name(), "\"wei\"\"rd\"");
        let back: AccountObjectIdentifier = id.fully_qualified_name().parse().unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn parse_round_trips_through_fqn() {
        for raw in ["\"MYDB\"", "\"MYDB\".\"PUBLIC\"", "\"My Db\".\"s1\""] {
            let parts = parse_parts(raw).unwrap();
            let rendered = parts
                .iter()
                .map(|p| quote_part(p))
                .collect::<Vec<_>>()
                .join(".");
            assert_eq!(rendered, raw);
        }
    }

    #[test]
    fn empty_and_dot_fail() {
        assert_eq!(
            "".parse::<AccountObjectIdentifier>().unwrap_err(),
            IdentifierError::EmptyComponent
        );
        assert_eq!(
            ".".parse::<AccountObjectIdentifier>().unwrap_err(),
            IdentifierError::EmptyComponent
        );
        assert_eq!(
            "a..b".parse::<SchemaObjectIdentifier>().unwrap_err(),
            IdentifierError::EmptyComponent
        );
    }

    #[test]
    fn wrong_arity_is_rejected() {
        assert_eq!(
            "a.b".parse::<SchemaObjectIdentifier>().unwrap_err(),
            IdentifierError::WrongNumberOfParts {
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn malformed_quoting_is_rejected() {
        assert!(matches!(
            "\"a\"b".parse::<AccountObjectIdentifier>().unwrap_err(),
            IdentifierError::InvalidIdentifier(_)
        ));
        assert!(matches!(
            "a\"b\"".parse::<AccountObjectIdentifier>().unwrap_err(),
            IdentifierError::InvalidIdentifier(_)
        ));
        assert!(matches!(
            "\"unterminated".parse::<AccountObjectIdentifier>().unwrap_err(),
            IdentifierError::InvalidIdentifier(_)
        ));
    }

    #[test]
    fn identifier_with_arguments_round_trips() {
        let id: SchemaObjectIdentifierWithArguments =
            "\"DB\".\"SCH\".\"FOO\"(NUMBER, VARCHAR)".parse().unwrap();
        assert_eq!(id.name(), "FOO");
        assert_eq!(id.arguments().len(), 2);
        assert_eq!(
            id.fully_qualified_name(),
            "\"DB\".\"SCH\".\"FOO\"(NUMBER, VARCHAR)"
        );
    }

    #[test]
    fn identifier_with_empty_arguments() {
        let id: SchemaObjectIdentifierWithArguments = "\"DB\".\"SCH\".\"FOO\"()".parse().unwrap();
        assert!(id.arguments().is_empty());
        assert_eq!(id.fully_qualified_name(), "\"DB\".\"SCH\".\"FOO\"()");
    }

    #[test]
    fn account_identifier_forms() {
        let id: AccountIdentifier = "\"ORG\".\"ACC\"".parse().unwrap();
        assert_eq!(id.organization_name(), Some("ORG"));
        assert_eq!(id.fully_qualified_name(), "\"ORG\".\"ACC\"");

        let locator: AccountIdentifier = "XY12345".parse().unwrap();
        assert_eq!(locator.organization_name(), None);
        assert_eq!(locator.fully_qualified_name(), "\"XY12345\"");
    }

    #[test]
    fn external_object_identifier_bounds() {
        let id: ExternalObjectIdentifier = "\"ORG\".\"ACC\".\"DB\".\"X\"".parse().unwrap();
        assert_eq!(id.parts().len(), 4);
        assert!("a.b.c.d.e".parse::<ExternalObjectIdentifier>().is_err());
    }
}
