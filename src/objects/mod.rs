//! Per-object-kind façades over the execution client.
//!
//! Each module owns its request structs, its SHOW/DESCRIBE row types, and a
//! stateless client exposing the operations that kind supports.

use std::fmt;
use std::str::FromStr;

use crate::identifier::SchemaObjectIdentifier;
use crate::sql::quote_literal;

pub mod database_roles;
pub mod databases;
pub mod dynamic_tables;
pub mod functions;
pub mod grants;
pub mod masking_policies;
pub mod network_policies;
pub mod procedures;
pub mod roles;
pub mod row_access_policies;
pub mod schemas;
pub mod secrets;
pub mod security_integrations;
pub mod show_objects;
pub mod streams;
pub mod tags;
pub mod tasks;
pub mod users;
pub mod warehouses;

/// The closed set of object kinds the uniform metadata operations range
/// over. `Display` is the singular SQL spelling; [`ObjectType::plural`] is
/// what SHOW wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Account,
    Database,
    DatabaseRole,
    DynamicTable,
    ExternalTable,
    Function,
    Integration,
    MaskingPolicy,
    NetworkPolicy,
    Pipe,
    Procedure,
    Role,
    RowAccessPolicy,
    Schema,
    Secret,
    Stage,
    Stream,
    Table,
    Tag,
    Task,
    User,
    View,
    Warehouse,
}

impl ObjectType {
    pub fn plural(&self) -> &'static str {
        match self {
            ObjectType::Account => "ACCOUNTS",
            ObjectType::Database => "DATABASES",
            ObjectType::DatabaseRole => "DATABASE ROLES",
            ObjectType::DynamicTable => "DYNAMIC TABLES",
            ObjectType::ExternalTable => "EXTERNAL TABLES",
            ObjectType::Function => "FUNCTIONS",
            ObjectType::Integration => "INTEGRATIONS",
            ObjectType::MaskingPolicy => "MASKING POLICIES",
            ObjectType::NetworkPolicy => "NETWORK POLICIES",
            ObjectType::Pipe => "PIPES",
            ObjectType::Procedure => "PROCEDURES",
            ObjectType::Role => "ROLES",
            ObjectType::RowAccessPolicy => "ROW ACCESS POLICIES",
            ObjectType::Schema => "SCHEMAS",
            ObjectType::Secret => "SECRETS",
            ObjectType::Stage => "STAGES",
            ObjectType::Stream => "STREAMS",
            ObjectType::Table => "TABLES",
            ObjectType::Tag => "TAGS",
            ObjectType::Task => "TASKS",
            ObjectType::User => "USERS",
            ObjectType::View => "VIEWS",
            ObjectType::Warehouse => "WAREHOUSES",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectType::Account => "ACCOUNT",
            ObjectType::Database => "DATABASE",
            ObjectType::DatabaseRole => "DATABASE ROLE",
            ObjectType::DynamicTable => "DYNAMIC TABLE",
            ObjectType::ExternalTable => "EXTERNAL TABLE",
            ObjectType::Function => "FUNCTION",
            ObjectType::Integration => "INTEGRATION",
            ObjectType::MaskingPolicy => "MASKING POLICY",
            ObjectType::NetworkPolicy => "NETWORK POLICY",
            ObjectType::Pipe => "PIPE",
            ObjectType::Procedure => "PROCEDURE",
            ObjectType::Role => "ROLE",
            ObjectType::RowAccessPolicy => "ROW ACCESS POLICY",
            ObjectType::Schema => "SCHEMA",
            ObjectType::Secret => "SECRET",
            ObjectType::Stage => "STAGE",
            ObjectType::Stream => "STREAM",
            ObjectType::Table => "TABLE",
            ObjectType::Tag => "TAG",
            ObjectType::Task => "TASK",
            ObjectType::User => "USER",
            ObjectType::View => "VIEW",
            ObjectType::Warehouse => "WAREHOUSE",
        };
        f.write_str(s)
    }
}

impl FromStr for ObjectType {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = raw.trim().to_uppercase().replace('_', " ");
        let object_type = match normalized.as_str() {
            "ACCOUNT" => ObjectType::Account,
            "DATABASE" => ObjectType::Database,
            "DATABASE ROLE" => ObjectType::DatabaseRole,
            "DYNAMIC TABLE" => ObjectType::DynamicTable,
            "EXTERNAL TABLE" => ObjectType::ExternalTable,
            "FUNCTION" => ObjectType::Function,
            "INTEGRATION" => ObjectType::Integration,
            "MASKING POLICY" => ObjectType::MaskingPolicy,
            "NETWORK POLICY" => ObjectType::NetworkPolicy,
            "PIPE" => ObjectType::Pipe,
            "PROCEDURE" => ObjectType::Procedure,
            "ROLE" => ObjectType::Role,
            "ROW ACCESS POLICY" => ObjectType::RowAccessPolicy,
            "SCHEMA" => ObjectType::Schema,
            "SECRET" => ObjectType::Secret,
            "STAGE" => ObjectType::Stage,
            "STREAM" => ObjectType::Stream,
            "TABLE" => ObjectType::Table,
            "TAG" => ObjectType::Tag,
            "TASK" => ObjectType::Task,
            "USER" => ObjectType::User,
            "VIEW" => ObjectType::View,
            "WAREHOUSE" => ObjectType::Warehouse,
            _ => return Err(format!("unknown object type: {raw}")),
        };
        Ok(object_type)
    }
}

/// One argument of a policy or function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureArgument {
    pub name: String,
    pub data_type: crate::datatype::DataType,
}

impl SignatureArgument {
    pub fn new(name: impl Into<String>, data_type: crate::datatype::DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Render `(A VARCHAR, B NUMBER(10, 2))`.
pub(crate) fn write_signature(sql: &mut String, arguments: &[SignatureArgument]) {
    let rendered: Vec<String> = arguments
        .iter()
        .map(|a| format!("{} {}", a.name, a.data_type.to_sql()))
        .collect();
    sql.push('(');
    sql.push_str(&rendered.join(", "));
    sql.push(')');
}

/// Parse a server-formatted signature like `(VAL VARCHAR, N NUMBER)` back
/// through the typed data-type parser.
pub(crate) fn parse_signature(raw: &str) -> Result<Vec<SignatureArgument>, crate::datatype::DataTypeError> {
    let inner = raw
        .trim()
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or(raw)
        .trim();
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    let mut arguments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut pieces = Vec::new();
    for (i, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&inner[start..]);
    for piece in pieces {
        let piece = piece.trim();
        match piece.split_once(char::is_whitespace) {
            Some((name, type_raw)) => arguments.push(SignatureArgument {
                name: name.to_string(),
                data_type: crate::datatype::parse_data_type(type_raw.trim())?,
            }),
            None => arguments.push(SignatureArgument {
                // Unnamed argument positions appear in SHOW output.
                name: String::new(),
                data_type: crate::datatype::parse_data_type(piece)?,
            }),
        }
    }
    Ok(arguments)
}

/// One `tag = 'value'` association as attached by CREATE ... WITH TAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAssociation {
    pub name: SchemaObjectIdentifier,
    pub value: String,
}

impl TagAssociation {
    pub fn new(name: SchemaObjectIdentifier, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Render `WITH TAG (tag = 'value', ...)`; empty associations elide the
/// clause entirely.
pub(crate) fn write_tag_clause(sql: &mut String, tags: &[TagAssociation]) {
    if tags.is_empty() {
        return;
    }
    let rendered: Vec<String> = tags
        .iter()
        .map(|t| format!("{} = {}", t.name.fully_qualified_name(), quote_literal(&t.value)))
        .collect();
    sql.push_str(" WITH TAG (");
    sql.push_str(&rendered.join(", "));
    sql.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_type_round_trips() {
        for (raw, t) in [
            ("ROLE", ObjectType::Role),
            ("MASKING POLICY", ObjectType::MaskingPolicy),
            ("DATABASE_ROLE", ObjectType::DatabaseRole),
        ] {
            assert_eq!(raw.parse::<ObjectType>().unwrap(), t);
        }
        assert_eq!(ObjectType::RowAccessPolicy.plural(), "ROW ACCESS POLICIES");
        assert!("GIZMO".parse::<ObjectType>().is_err());
    }

    #[test]
    fn tag_clause_renders() {
        let mut sql = String::new();
        write_tag_clause(
            &mut sql,
            &[TagAssociation::new(
                SchemaObjectIdentifier::new("DB", "SCH", "COST_CENTER"),
                "finance",
            )],
        );
        assert_eq!(
            sql,
            " WITH TAG (\"DB\".\"SCH\".\"COST_CENTER\" = 'finance')"
        );

        let mut empty = String::new();
        write_tag_clause(&mut empty, &[]);
        assert!(empty.is_empty());
    }
}
