use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::error::{Error, Result};
use crate::identifier::DatabaseObjectIdentifier;
use crate::objects::{TagAssociation, write_tag_clause};
use crate::record::{DecodeError, FromRecord, RecordRef};
use crate::sql::{
    ExtendedIn, Like, LimitFrom, RequestError, StartsWith, push_int_property, push_string_property,
};

#[derive(Debug, Clone)]
pub struct CreateSchemaRequest {
    name: DatabaseObjectIdentifier,
    or_replace: bool,
    transient: bool,
    if_not_exists: bool,
    with_managed_access: bool,
    clone_from: Option<DatabaseObjectIdentifier>,
    data_retention_time_in_days: Option<i64>,
    comment: Option<String>,
    tags: Vec<TagAssociation>,
}

impl CreateSchemaRequest {
    pub fn new(name: DatabaseObjectIdentifier) -> Self {
        Self {
            name,
            or_replace: false,
            transient: false,
            if_not_exists: false,
            with_managed_access: false,
            clone_from: None,
            data_retention_time_in_days: None,
            comment: None,
            tags: Vec::new(),
        }
    }

    pub fn with_or_replace(mut self) -> Self {
        self.or_replace = true;
        self
    }

    pub fn with_transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn with_if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn with_managed_access(mut self) -> Self {
        self.with_managed_access = true;
        self
    }

    pub fn with_clone_from(mut self, source: DatabaseObjectIdentifier) -> Self {
        self.clone_from = Some(source);
        self
    }

    pub fn with_data_retention_time_in_days(mut self, days: i64) -> Self {
        self.data_retention_time_in_days = Some(days);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_tag(mut self, tag: TagAssociation) -> Self {
        self.tags.push(tag);
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
        if self.transient {
            sql.push_str("TRANSIENT ");
        }
        sql.push_str("SCHEMA ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if let Some(source) = &self.clone_from {
            sql.push_str(" CLONE ");
            sql.push_str(&source.fully_qualified_name());
        }
        if self.with_managed_access {
            sql.push_str(" WITH MANAGED ACCESS");
        }
        let mut props = Vec::new();
        push_int_property(
            &mut props,
            "DATA_RETENTION_TIME_IN_DAYS",
            &self.data_retention_time_in_days,
        );
        push_string_property(&mut props, "COMMENT", &self.comment);
        if !props.is_empty() {
            sql.push(' ');
            sql.push_str(&props.join(" "));
        }
        write_tag_clause(&mut sql, &self.tags);
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct AlterSchemaRequest {
    name: DatabaseObjectIdentifier,
    if_exists: bool,
    rename_to: Option<DatabaseObjectIdentifier>,
    swap_with: Option<DatabaseObjectIdentifier>,
    enable_managed_access: Option<bool>,
    set_comment: Option<Option<String>>,
}

impl AlterSchemaRequest {
    pub fn new(name: DatabaseObjectIdentifier) -> Self {
        Self {
            name,
            if_exists: false,
            rename_to: None,
            swap_with: None,
            enable_managed_access: None,
            set_comment: None,
        }
    }

    pub fn with_if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn with_rename_to(mut self, new_name: DatabaseObjectIdentifier) -> Self {
        self.rename_to = Some(new_name);
        self
    }

    pub fn with_swap_with(mut self, other: DatabaseObjectIdentifier) -> Self {
        self.swap_with = Some(other);
        self
    }

    pub fn with_managed_access(mut self, enable: bool) -> Self {
        self.enable_managed_access = Some(enable);
        self
    }

    /// `Some(text)` sets the comment, `None` unsets it.
    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.set_comment = Some(comment);
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let actions = [
            self.rename_to.is_some(),
            self.swap_with.is_some(),
            self.enable_managed_access.is_some(),
            self.set_comment.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count();
        if actions == 0 {
            return Err(RequestError::MissingField("alter action"));
        }
        if actions > 1 {
            return Err(RequestError::MutuallyExclusive(
                "rename_to/swap_with",
                "managed_access/comment",
            ));
        }

        let mut sql = String::from("ALTER SCHEMA ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if let Some(new_name) = &self.rename_to {
            sql.push_str(" RENAME TO ");
            sql.push_str(&new_name.fully_qualified_name());
        } else if let Some(other) = &self.swap_with {
            sql.push_str(" SWAP WITH ");
            sql.push_str(&other.fully_qualified_name());
        } else if let Some(enable) = self.enable_managed_access {
            sql.push_str(if enable {
                " ENABLE MANAGED ACCESS"
            } else {
                " DISABLE MANAGED ACCESS"
            });
        } else if let Some(comment) = &self.set_comment {
            match comment {
                Some(text) => {
                    sql.push_str(" SET COMMENT = ");
                    sql.push_str(&crate::sql::quote_literal(text));
                }
                None => sql.push_str(" UNSET COMMENT"),
            }
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct DropSchemaRequest {
    name: DatabaseObjectIdentifier,
    if_exists: bool,
    cascade: bool,
}

impl DropSchemaRequest {
    pub fn new(name: DatabaseObjectIdentifier) -> Self {
        Self {
            name,
            if_exists: false,
            cascade: false,
        }
    }

    pub fn with_if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn with_cascade(mut self) -> Self {
        self.cascade = true;
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let mut sql = String::from("DROP SCHEMA ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if self.cascade {
            sql.push_str(" CASCADE");
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowSchemasRequest {
    like: Option<Like>,
    in_scope: Option<ExtendedIn>,
    starts_with: Option<StartsWith>,
    limit: Option<LimitFrom>,
}

impl ShowSchemasRequest {
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
        let mut sql = String::from("SHOW SCHEMAS");
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

/// One row of `SHOW SCHEMAS` output.
#[derive(Debug, Clone)]
pub struct SchemaRow {
    pub created_on: Option<String>,
    pub name: String,
    pub database_name: String,
    pub is_default: bool,
    pub is_current: bool,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub options: Option<String>,
}

impl SchemaRow {
    pub fn id(&self) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new(&self.database_name, &self.name)
    }

    pub fn is_managed_access(&self) -> bool {
        self.options
            .as_deref()
            .is_some_and(|o| o.contains("MANAGED ACCESS"))
    }
}

impl FromRecord for SchemaRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(SchemaRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            database_name: record.require_string("database_name")?,
            is_default: record.get_bool("is_default")?.bool_value(),
            is_current: record.get_bool("is_current")?.bool_value(),
            owner: record.get_string("owner")?,
            comment: record.get_string("comment")?,
            options: record.get_string("options")?,
        })
    }
}

pub struct SchemasClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> SchemasClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateSchemaRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE SCHEMA", &request.name))
    }

    pub async fn alter(&self, request: &AlterSchemaRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("ALTER SCHEMA", &request.name))
    }

    pub async fn drop(&self, request: &DropSchemaRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP SCHEMA", &request.name))
    }

    pub async fn show(&self, request: &ShowSchemasRequest) -> Result<Vec<SchemaRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(&self, id: &DatabaseObjectIdentifier) -> Result<SchemaRow> {
        let request = ShowSchemasRequest::new()
            .with_like(Like::new(id.name()))
            .with_in(ExtendedIn::database(id.database_id()));
        let rows = self.show(&request).await?;
        rows.into_iter()
            .find(|row| row.name == id.name())
            .ok_or(Error::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::AccountObjectIdentifier;

    fn sch(db: &str, name: &str) -> DatabaseObjectIdentifier {
        DatabaseObjectIdentifier::new(db, name)
    }

    #[test]
    fn create_renders_managed_access() {
        let sql = CreateSchemaRequest::new(sch("D1", "S1"))
            .with_managed_access()
            .with_comment("models")
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE SCHEMA \"D1\".\"S1\" WITH MANAGED ACCESS COMMENT = 'models'"
        );
    }

    #[test]
    fn alter_comment_set_and_unset() {
        let sql = AlterSchemaRequest::new(sch("D1", "S1"))
            .with_comment(Some("x".into()))
            .build()
            .unwrap();
        assert_eq!(sql, "ALTER SCHEMA \"D1\".\"S1\" SET COMMENT = 'x'");

        let sql = AlterSchemaRequest::new(sch("D1", "S1"))
            .with_comment(None)
            .build()
            .unwrap();
        assert_eq!(sql, "ALTER SCHEMA \"D1\".\"S1\" UNSET COMMENT");
    }

    #[test]
    fn show_in_database() {
        let sql = ShowSchemasRequest::new()
            .with_like(Like::new("S%"))
            .with_in(ExtendedIn::database(AccountObjectIdentifier::new("D1")))
            .build()
            .unwrap();
        assert_eq!(sql, "SHOW SCHEMAS LIKE 'S%' IN DATABASE \"D1\"");
    }
}
