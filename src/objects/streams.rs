use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::error::{Error, Result};
use crate::identifier::SchemaObjectIdentifier;
use crate::record::{DecodeError, FromRecord, RecordRef};
use crate::sql::{ExtendedIn, Like, LimitFrom, RequestError, StartsWith, push_string_property, sql_bool};

/// What a stream tracks. The variant picks the `ON ...` branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSource {
    Table {
        table: SchemaObjectIdentifier,
        append_only: Option<bool>,
        show_initial_rows: Option<bool>,
    },
    ExternalTable {
        external_table: SchemaObjectIdentifier,
        insert_only: Option<bool>,
    },
    /// Directory table on a stage.
    Stage {
        stage: SchemaObjectIdentifier,
    },
    View {
        view: SchemaObjectIdentifier,
        append_only: Option<bool>,
        show_initial_rows: Option<bool>,
    },
}

impl StreamSource {
    fn write_sql(&self, sql: &mut String) {
        match self {
            StreamSource::Table {
                table,
                append_only,
                show_initial_rows,
            } => {
                sql.push_str(" ON TABLE ");
                sql.push_str(&table.fully_qualified_name());
                if let Some(append_only) = append_only {
                    sql.push_str(&format!(" APPEND_ONLY = {}", sql_bool(*append_only)));
                }
                if let Some(initial) = show_initial_rows {
                    sql.push_str(&format!(" SHOW_INITIAL_ROWS = {}", sql_bool(*initial)));
                }
            }
            StreamSource::ExternalTable {
                external_table,
                insert_only,
            } => {
                sql.push_str(" ON EXTERNAL TABLE ");
                sql.push_str(&external_table.fully_qualified_name());
                if let Some(insert_only) = insert_only {
                    sql.push_str(&format!(" INSERT_ONLY = {}", sql_bool(*insert_only)));
                }
            }
            StreamSource::Stage { stage } => {
                sql.push_str(" ON STAGE ");
                sql.push_str(&stage.fully_qualified_name());
            }
            StreamSource::View {
                view,
                append_only,
                show_initial_rows,
            } => {
                sql.push_str(" ON VIEW ");
                sql.push_str(&view.fully_qualified_name());
                if let Some(append_only) = append_only {
                    sql.push_str(&format!(" APPEND_ONLY = {}", sql_bool(*append_only)));
                }
                if let Some(initial) = show_initial_rows {
                    sql.push_str(&format!(" SHOW_INITIAL_ROWS = {}", sql_bool(*initial)));
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateStreamRequest {
    name: SchemaObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    copy_grants: bool,
    source: StreamSource,
    comment: Option<String>,
}

impl CreateStreamRequest {
    pub fn new(name: SchemaObjectIdentifier, source: StreamSource) -> Self {
        Self {
            name,
            or_replace: false,
            if_not_exists: false,
            copy_grants: false,
            source,
            comment: None,
        }
    }

    pub fn with_or_replace(mut self) -> Self {
        self.or_replace = true;
        self
    }

    pub fn with_if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn with_copy_grants(mut self) -> Self {
        self.copy_grants = true;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        if self.or_replace && self.if_not_exists {
            return Err(RequestError::MutuallyExclusive(
                "or_replace",
                "if_not_exists",
            ));
        }
        let mut sql = String::from("CREATE ");
        if self.or_replace {
            sql.push_str("OR REPLACE ");
        }
        sql.push_str("STREAM ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if self.copy_grants {
            sql.push_str(" COPY GRANTS");
        }
        self.source.write_sql(&mut sql);
        let mut props = Vec::new();
        push_string_property(&mut props, "COMMENT", &self.comment);
        if !props.is_empty() {
            sql.push(' ');
            sql.push_str(&props.join(" "));
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct AlterStreamRequest {
    name: SchemaObjectIdentifier,
    if_exists: bool,
    set_comment: Option<Option<String>>,
}

impl AlterStreamRequest {
    pub fn new(name: SchemaObjectIdentifier) -> Self {
        Self {
            name,
            if_exists: false,
            set_comment: None,
        }
    }

    pub fn with_if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    /// `Some(text)` sets the comment, `None` unsets it.
    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.set_comment = Some(comment);
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let Some(comment) = &self.set_comment else {
            return Err(RequestError::MissingField("alter action"));
        };
        let mut sql = String::from("ALTER STREAM ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        match comment {
            Some(text) => {
                sql.push_str(" SET COMMENT = ");
                sql.push_str(&crate::sql::quote_literal(text));
            }
            None => sql.push_str(" UNSET COMMENT"),
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct DropStreamRequest {
    name: SchemaObjectIdentifier,
    if_exists: bool,
}

impl DropStreamRequest {
    pub fn new(name: SchemaObjectIdentifier) -> Self {
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
        let mut sql = String::from("DROP STREAM ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowStreamsRequest {
    like: Option<Like>,
    in_scope: Option<ExtendedIn>,
    starts_with: Option<StartsWith>,
    limit: Option<LimitFrom>,
}

impl ShowStreamsRequest {
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

    pub fn with_starts_with(mut self, starts_with: StartsWith) -> Self {
        self.starts_with = Some(starts_with);
        self
    }

    pub fn with_limit(mut self, limit: LimitFrom) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let mut sql = String::from("SHOW STREAMS");
        if let Some(like) = &self.like {
            like.write_sql(&mut sql);
        }
        if let Some(in_scope) = &self.in_scope {
            in_scope.write_sql(&mut sql)?;
        }
        if let Some(starts_with) = &self.starts_with {
            starts_with.write_sql(&mut sql);
        }
        if let Some(limit) = &self.limit {
            limit.write_sql(&mut sql);
        }
        Ok(sql)
    }
}

/// One row of `SHOW STREAMS` output. `DESCRIBE STREAM` answers with the
/// same columns, so the row type covers both.
#[derive(Debug, Clone)]
pub struct StreamRow {
    pub created_on: Option<String>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub owner: Option<String>,
    pub table_name: Option<String>,
    pub source_type: Option<String>,
    pub base_tables: Vec<String>,
    pub stream_type: Option<String>,
    pub stale: bool,
    pub mode: Option<String>,
    pub comment: Option<String>,
}

impl StreamRow {
    pub fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }
}

impl FromRecord for StreamRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(StreamRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            database_name: record.require_string("database_name")?,
            schema_name: record.require_string("schema_name")?,
            owner: record.get_string("owner")?,
            table_name: record.get_string("table_name")?,
            source_type: record.get_string("source_type")?,
            base_tables: record.get_list("base_tables")?,
            stream_type: record.get_string("type")?,
            stale: record.get_bool("stale")?.bool_value(),
            mode: record.get_string("mode")?,
            comment: record.get_string("comment")?,
        })
    }
}

pub struct StreamsClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> StreamsClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateStreamRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE STREAM", &request.name))
    }

    pub async fn alter(&self, request: &AlterStreamRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("ALTER STREAM", &request.name))
    }

    pub async fn drop(&self, request: &DropStreamRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP STREAM", &request.name))
    }

    pub async fn show(&self, request: &ShowStreamsRequest) -> Result<Vec<StreamRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> Result<StreamRow> {
        let request = ShowStreamsRequest::new()
            .with_like(Like::new(id.name()))
            .with_in(ExtendedIn::schema(id.schema_id()));
        let rows = self.show(&request).await?;
        rows.into_iter()
            .find(|row| row.name == id.name())
            .ok_or(Error::NotFound)
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> Result<StreamRow> {
        let sql = format!("DESCRIBE STREAM {}", id.fully_qualified_name());
        self.executor
            .query_one(&sql)
            .await
            .map_err(|e| e.with_operation("DESCRIBE STREAM", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(name: &str) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("D", "S", name)
    }

    #[test]
    fn create_on_table_with_options() {
        let sql = CreateStreamRequest::new(
            stream("STR"),
            StreamSource::Table {
                table: SchemaObjectIdentifier::new("D", "S", "T"),
                append_only: Some(true),
                show_initial_rows: None,
            },
        )
        .with_or_replace()
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "CREATE OR REPLACE STREAM \"D\".\"S\".\"STR\" ON TABLE \"D\".\"S\".\"T\" APPEND_ONLY = TRUE"
        );
    }

    #[test]
    fn create_on_stage_and_view() {
        let sql = CreateStreamRequest::new(
            stream("STR"),
            StreamSource::Stage {
                stage: SchemaObjectIdentifier::new("D", "S", "STG"),
            },
        )
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "CREATE STREAM \"D\".\"S\".\"STR\" ON STAGE \"D\".\"S\".\"STG\""
        );

        let sql = CreateStreamRequest::new(
            stream("STR"),
            StreamSource::View {
                view: SchemaObjectIdentifier::new("D", "S", "V"),
                append_only: None,
                show_initial_rows: Some(false),
            },
        )
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "CREATE STREAM \"D\".\"S\".\"STR\" ON VIEW \"D\".\"S\".\"V\" SHOW_INITIAL_ROWS = FALSE"
        );
    }
}
