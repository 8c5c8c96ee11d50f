use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::datatype::{DataType, DataTypeError, parse_data_type};
use crate::error::{Error, Result};
use crate::identifier::{SchemaObjectIdentifier, SchemaObjectIdentifierWithArguments};
use crate::objects::{SignatureArgument, write_signature};
use crate::record::{DecodeError, FromRecord, JsonTable, RecordRef};
use crate::sql::{DollarQuoted, ExtendedIn, Like, RequestError, quote_literal};

/// Decode the server-formatted arguments column of SHOW FUNCTIONS /
/// SHOW PROCEDURES: `FOO(NUMBER, VARCHAR) RETURN NUMBER`. Argument and
/// return types both go through the typed data-type parser.
pub(crate) fn parse_arguments_column(
    raw: &str,
) -> std::result::Result<(Vec<DataType>, Option<DataType>), DataTypeError> {
    let trimmed = raw.trim();
    let open = trimmed.find('(').ok_or_else(|| DataTypeError::InvalidSyntax {
        raw: raw.to_string(),
        expected: "NAME(TYPE, ...) RETURN TYPE".to_string(),
    })?;
    let close = trimmed.rfind(')').ok_or_else(|| DataTypeError::InvalidSyntax {
        raw: raw.to_string(),
        expected: "NAME(TYPE, ...) RETURN TYPE".to_string(),
    })?;
    // The return clause sits after the closing paren; older accounts spell
    // it RETURN, newer ones RETURNS.
    let tail = trimmed[close + 1..].trim();
    let return_type = tail
        .strip_prefix("RETURNS")
        .or_else(|| tail.strip_prefix("RETURN"))
        .map(|t| parse_data_type(t.trim()))
        .transpose()?;

    let inner = trimmed[open + 1..close].trim();
    let mut arguments = Vec::new();
    if !inner.is_empty() {
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
            // DEFAULT markers decorate optional arguments.
            let piece = piece.trim().trim_start_matches("DEFAULT ").trim();
            arguments.push(parse_data_type(piece)?);
        }
    }
    Ok((arguments, return_type))
}

#[derive(Debug, Clone)]
pub struct CreateFunctionRequest {
    name: SchemaObjectIdentifier,
    or_replace: bool,
    secure: bool,
    arguments: Vec<SignatureArgument>,
    returns: DataType,
    language: Option<String>,
    runtime_version: Option<String>,
    handler: Option<String>,
    comment: Option<String>,
    body: String,
}

impl CreateFunctionRequest {
    pub fn new(
        name: SchemaObjectIdentifier,
        arguments: Vec<SignatureArgument>,
        returns: DataType,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name,
            or_replace: false,
            secure: false,
            arguments,
            returns,
            language: None,
            runtime_version: None,
            handler: None,
            comment: None,
            body: body.into(),
        }
    }

    pub fn with_or_replace(mut self) -> Self {
        self.or_replace = true;
        self
    }

    pub fn with_secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// `SQL`, `JAVASCRIPT`, `PYTHON`, ... Elided for plain SQL functions.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_runtime_version(mut self, version: impl Into<String>) -> Self {
        self.runtime_version = Some(version.into());
        self
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        if self.body.is_empty() {
            return Err(RequestError::MissingField("body"));
        }
        let mut sql = String::from("CREATE ");
        if self.or_replace {
            sql.push_str("OR REPLACE ");
        }
        if self.secure {
            sql.push_str("SECURE ");
        }
        sql.push_str("FUNCTION ");
        sql.push_str(&self.name.fully_qualified_name());
        write_signature(&mut sql, &self.arguments);
        sql.push_str(" RETURNS ");
        sql.push_str(&self.returns.to_sql());
        if let Some(language) = &self.language {
            sql.push_str(" LANGUAGE ");
            sql.push_str(language);
        }
        if let Some(version) = &self.runtime_version {
            sql.push_str(" RUNTIME_VERSION = ");
            sql.push_str(&quote_literal(version));
        }
        if let Some(handler) = &self.handler {
            sql.push_str(" HANDLER = ");
            sql.push_str(&quote_literal(handler));
        }
        if let Some(comment) = &self.comment {
            sql.push_str(" COMMENT = ");
            sql.push_str(&quote_literal(comment));
        }
        sql.push_str(" AS ");
        sql.push_str(&DollarQuoted(self.body.clone()).to_string());
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct DropFunctionRequest {
    name: SchemaObjectIdentifierWithArguments,
    if_exists: bool,
}

impl DropFunctionRequest {
    pub fn new(name: SchemaObjectIdentifierWithArguments) -> Self {
        Self {
            name,
            if_exists: false,
        }
    }

    pub fn with_if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let mut sql = String::from("DROP FUNCTION ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowFunctionsRequest {
    like: Option<Like>,
    in_scope: Option<ExtendedIn>,
}

impl ShowFunctionsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_like(mut self, like: Like) -> Self {
        self.like = Some(like);
        self
    }

    pub fn with_in(mut self, in_scope: ExtendedIn) -> Self {
        self.in_scope = Some(in_scope);
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let mut sql = String::from("SHOW USER FUNCTIONS");
        if let Some(like) = &self.like {
            like.write_sql(&mut sql);
        }
        if let Some(in_scope) = &self.in_scope {
            in_scope.write_sql(&mut sql)?;
        }
        Ok(sql)
    }
}

/// One row of `SHOW USER FUNCTIONS` output. The `arguments` column is
/// decoded into typed argument and return types.
#[derive(Debug, Clone)]
pub struct FunctionRow {
    pub created_on: Option<String>,
    pub name: String,
    pub schema_name: String,
    pub catalog_name: String,
    pub arguments: Vec<DataType>,
    pub return_type: Option<DataType>,
    pub is_table_function: bool,
    pub is_secure: bool,
    pub language: Option<String>,
    pub description: Option<String>,
}

impl FunctionRow {
    pub fn id(&self) -> SchemaObjectIdentifierWithArguments {
        SchemaObjectIdentifierWithArguments::new(
            SchemaObjectIdentifier::new(&self.catalog_name, &self.schema_name, &self.name),
            self.arguments.clone(),
        )
    }
}

impl FromRecord for FunctionRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        let arguments_raw = record.require_string("arguments")?;
        let (arguments, return_type) = parse_arguments_column(&arguments_raw)
            .map_err(|_| record.invalid_enum("arguments", "function signature", &arguments_raw))?;
        Ok(FunctionRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            schema_name: record.require_string("schema_name")?,
            catalog_name: record.require_string("catalog_name")?,
            arguments,
            return_type,
            is_table_function: record.get_bool("is_table_function")?.bool_value(),
            is_secure: record.get_bool("is_secure")?.bool_value(),
            language: record.get_string("language")?,
            description: record.get_string("description")?,
        })
    }
}

/// Aggregated `DESCRIBE FUNCTION` property rows.
#[derive(Debug, Clone, Default)]
pub struct FunctionDetails {
    pub signature: Option<String>,
    pub returns: Option<String>,
    pub language: Option<String>,
    pub body: Option<String>,
}

impl FunctionDetails {
    pub fn from_table(table: &JsonTable) -> std::result::Result<Self, DecodeError> {
        let mut details = FunctionDetails::default();
        for record in table.records() {
            let property = record.require_string("property")?;
            let value = record.get_string("value")?;
            match property.as_str() {
                "signature" => details.signature = value,
                "returns" => details.returns = value,
                "language" => details.language = value,
                "body" => details.body = value,
                _ => {}
            }
        }
        Ok(details)
    }
}

pub struct FunctionsClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> FunctionsClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateFunctionRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE FUNCTION", &request.name))
    }

    pub async fn drop(&self, request: &DropFunctionRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP FUNCTION", &request.name))
    }

    pub async fn show(&self, request: &ShowFunctionsRequest) -> Result<Vec<FunctionRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(
        &self,
        id: &SchemaObjectIdentifierWithArguments,
    ) -> Result<FunctionRow> {
        let request = ShowFunctionsRequest::new()
            .with_like(Like::new(id.name()))
            .with_in(ExtendedIn::schema(id.schema_id()));
        let rows = self.show(&request).await?;
        rows.into_iter()
            .find(|row| {
                row.name == id.name()
                    && row.arguments.len() == id.arguments().len()
                    && row
                        .arguments
                        .iter()
                        .zip(id.arguments())
                        .all(|(a, b)| crate::datatype::are_the_same(a, b))
            })
            .ok_or(Error::NotFound)
    }

    pub async fn describe(
        &self,
        id: &SchemaObjectIdentifierWithArguments,
    ) -> Result<FunctionDetails> {
        let sql = format!("DESCRIBE FUNCTION {}", id.fully_qualified_name());
        let table = self
            .executor
            .query_table(&sql)
            .await
            .map_err(|e| e.with_operation("DESCRIBE FUNCTION", id))?;
        if table.is_empty() {
            return Err(Error::NotFound);
        }
        Ok(FunctionDetails::from_table(&table)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_column_parses_through_type_parser() {
        let (args, ret) = parse_arguments_column("FOO(NUMBER, VARCHAR) RETURN NUMBER").unwrap();
        assert_eq!(args.len(), 2);
        assert!(matches!(args[0], DataType::Number { .. }));
        assert!(matches!(args[1], DataType::Text { .. }));
        assert!(matches!(ret, Some(DataType::Number { .. })));

        let (args, ret) = parse_arguments_column("BAR() RETURN VARCHAR(10)").unwrap();
        assert!(args.is_empty());
        assert!(matches!(ret, Some(DataType::Text { length: Some(10), .. })));

        assert!(parse_arguments_column("garbage").is_err());
    }

    #[test]
    fn arguments_with_inner_parens_stay_whole() {
        let (args, _) =
            parse_arguments_column("F(NUMBER(10, 2), VECTOR(INT, 3)) RETURN BOOLEAN").unwrap();
        assert_eq!(args.len(), 2);
        assert!(matches!(args[1], DataType::Vector { dimension: 3, .. }));
    }

    #[test]
    fn create_function_dollar_quotes_body() {
        let sql = CreateFunctionRequest::new(
            SchemaObjectIdentifier::new("D", "S", "ADD1"),
            vec![SignatureArgument::new("X", parse_data_type("NUMBER").unwrap())],
            parse_data_type("NUMBER").unwrap(),
            "x + 1",
        )
        .with_or_replace()
        .with_language("SQL")
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "CREATE OR REPLACE FUNCTION \"D\".\"S\".\"ADD1\"(X NUMBER) RETURNS NUMBER LANGUAGE SQL AS $$x + 1$$"
        );
    }

    #[test]
    fn drop_uses_legacy_argument_types() {
        let id: SchemaObjectIdentifierWithArguments =
            "\"D\".\"S\".\"F\"(VARCHAR(10), NUMBER)".parse().unwrap();
        let sql = DropFunctionRequest::new(id).with_if_exists().build().unwrap();
        assert_eq!(
            sql,
            "DROP FUNCTION IF EXISTS \"D\".\"S\".\"F\"(VARCHAR, NUMBER)"
        );
    }
}
