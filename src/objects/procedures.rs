use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::datatype::DataType;
use crate::error::{Error, Result};
use crate::identifier::{SchemaObjectIdentifier, SchemaObjectIdentifierWithArguments};
use crate::objects::functions::parse_arguments_column;
use crate::objects::{SignatureArgument, write_signature};
use crate::record::{DecodeError, FromRecord, JsonTable, RecordRef};
use crate::sql::{DollarQuoted, ExtendedIn, Like, RequestError, quote_literal};

/// Who a procedure runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteAs {
    Caller,
    Owner,
}

#[derive(Debug, Clone)]
pub struct CreateProcedureRequest {
    name: SchemaObjectIdentifier,
    or_replace: bool,
    secure: bool,
    arguments: Vec<SignatureArgument>,
    returns: DataType,
    language: Option<String>,
    runtime_version: Option<String>,
    handler: Option<String>,
    execute_as: Option<ExecuteAs>,
    comment: Option<String>,
    body: String,
}

impl CreateProcedureRequest {
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
            execute_as: None,
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

    pub fn with_execute_as(mut self, execute_as: ExecuteAs) -> Self {
        self.execute_as = Some(execute_as);
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
        sql.push_str("PROCEDURE ");
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
        if let Some(execute_as) = self.execute_as {
            sql.push_str(match execute_as {
                ExecuteAs::Caller => " EXECUTE AS CALLER",
                ExecuteAs::Owner => " EXECUTE AS OWNER",
            });
        }
        sql.push_str(" AS ");
        sql.push_str(&DollarQuoted(self.body.clone()).to_string());
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct DropProcedureRequest {
    name: SchemaObjectIdentifierWithArguments,
    if_exists: bool,
}

impl DropProcedureRequest {
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
        let mut sql = String::from("DROP PROCEDURE ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowProceduresRequest {
    like: Option<Like>,
    in_scope: Option<ExtendedIn>,
}

impl ShowProceduresRequest {
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
        let mut sql = String::from("SHOW PROCEDURES");
        if let Some(like) = &self.like {
            like.write_sql(&mut sql);
        }
        if let Some(in_scope) = &self.in_scope {
            in_scope.write_sql(&mut sql)?;
        }
        Ok(sql)
    }
}

/// One row of `SHOW PROCEDURES` output; the arguments column decodes the
/// same way as for functions.
#[derive(Debug, Clone)]
pub struct ProcedureRow {
    pub created_on: Option<String>,
    pub name: String,
    pub schema_name: String,
    pub catalog_name: String,
    pub arguments: Vec<DataType>,
    pub return_type: Option<DataType>,
    pub is_table_function: bool,
    pub is_secure: bool,
    pub description: Option<String>,
}

impl ProcedureRow {
    pub fn id(&self) -> SchemaObjectIdentifierWithArguments {
        SchemaObjectIdentifierWithArguments::new(
            SchemaObjectIdentifier::new(&self.catalog_name, &self.schema_name, &self.name),
            self.arguments.clone(),
        )
    }
}

impl FromRecord for ProcedureRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        let arguments_raw = record.require_string("arguments")?;
        let (arguments, return_type) = parse_arguments_column(&arguments_raw)
            .map_err(|_| record.invalid_enum("arguments", "procedure signature", &arguments_raw))?;
        Ok(ProcedureRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            schema_name: record.require_string("schema_name")?,
            catalog_name: record.require_string("catalog_name")?,
            arguments,
            return_type,
            is_table_function: record.get_bool("is_table_function")?.bool_value(),
            is_secure: record.get_bool("is_secure")?.bool_value(),
            description: record.get_string("description")?,
        })
    }
}

/// Aggregated `DESCRIBE PROCEDURE` property rows.
#[derive(Debug, Clone, Default)]
pub struct ProcedureDetails {
    pub signature: Option<String>,
    pub returns: Option<String>,
    pub language: Option<String>,
    pub execute_as: Option<String>,
    pub body: Option<String>,
}

impl ProcedureDetails {
    pub fn from_table(table: &JsonTable) -> std::result::Result<Self, DecodeError> {
        let mut details = ProcedureDetails::default();
        for record in table.records() {
            let property = record.require_string("property")?;
            let value = record.get_string("value")?;
            match property.as_str() {
                "signature" => details.signature = value,
                "returns" => details.returns = value,
                "language" => details.language = value,
                "execute as" => details.execute_as = value,
                "body" => details.body = value,
                _ => {}
            }
        }
        Ok(details)
    }
}

pub struct ProceduresClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> ProceduresClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateProcedureRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE PROCEDURE", &request.name))
    }

    pub async fn drop(&self, request: &DropProcedureRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP PROCEDURE", &request.name))
    }

    pub async fn show(&self, request: &ShowProceduresRequest) -> Result<Vec<ProcedureRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(
        &self,
        id: &SchemaObjectIdentifierWithArguments,
    ) -> Result<ProcedureRow> {
        let request = ShowProceduresRequest::new()
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
    ) -> Result<ProcedureDetails> {
        let sql = format!("DESCRIBE PROCEDURE {}", id.fully_qualified_name());
        let table = self
            .executor
            .query_table(&sql)
            .await
            .map_err(|e| e.with_operation("DESCRIBE PROCEDURE", id))?;
        if table.is_empty() {
            return Err(Error::NotFound);
        }
        Ok(ProcedureDetails::from_table(&table)?)
    }

    /// `CALL` a procedure with pre-rendered argument literals.
    pub async fn call(
        &self,
        id: &SchemaObjectIdentifier,
        arguments: &[String],
    ) -> Result<()> {
        let sql = format!(
            "CALL {}({})",
            id.fully_qualified_name(),
            arguments.join(", ")
        );
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CALL", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::parse_data_type;

    #[test]
    fn create_procedure_with_execute_as() {
        let sql = CreateProcedureRequest::new(
            SchemaObjectIdentifier::new("D", "S", "CLEANUP"),
            vec![SignatureArgument::new(
                "DAYS",
                parse_data_type("NUMBER").unwrap(),
            )],
            parse_data_type("VARCHAR").unwrap(),
            "BEGIN\n  DELETE FROM t WHERE age > :DAYS;\nEND;",
        )
        .with_language("SQL")
        .with_execute_as(ExecuteAs::Owner)
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "CREATE PROCEDURE \"D\".\"S\".\"CLEANUP\"(DAYS NUMBER) RETURNS VARCHAR LANGUAGE SQL EXECUTE AS OWNER AS $$BEGIN\n  DELETE FROM t WHERE age > :DAYS;\nEND;$$"
        );
    }

    #[test]
    fn show_request_renders() {
        let sql = ShowProceduresRequest::new()
            .with_like(Like::new("CLEAN%"))
            .build()
            .unwrap();
        assert_eq!(sql, "SHOW PROCEDURES LIKE 'CLEAN%'");
    }
}
