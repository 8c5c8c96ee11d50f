use std::fmt;

use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::error::{Error, Result};
use crate::identifier::{AccountObjectIdentifier, SchemaObjectIdentifier};
use crate::record::{DecodeError, FromRecord, RecordRef};
use crate::sql::{ExtendedIn, Like, LimitFrom, RequestError, StartsWith, quote_literal};

/// Refresh freshness target: either a duration lag or downstream-driven.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetLag {
    /// e.g. `'20 minutes'`.
    Duration(String),
    Downstream,
}

impl fmt::Display for TargetLag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetLag::Duration(lag) => f.write_str(&quote_literal(lag)),
            TargetLag::Downstream => f.write_str("DOWNSTREAM"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateDynamicTableRequest {
    name: SchemaObjectIdentifier,
    or_replace: bool,
    target_lag: TargetLag,
    warehouse: AccountObjectIdentifier,
    query: String,
    refresh_mode: Option<String>,
    initialize: Option<String>,
    comment: Option<String>,
}

impl CreateDynamicTableRequest {
    pub fn new(
        name: SchemaObjectIdentifier,
        target_lag: TargetLag,
        warehouse: AccountObjectIdentifier,
        query: impl Into<String>,
    ) -> Self {
        Self {
            name,
            or_replace: false,
            target_lag,
            warehouse,
            query: query.into(),
            refresh_mode: None,
            initialize: None,
            comment: None,
        }
    }

    pub fn with_or_replace(mut self) -> Self {
        self.or_replace = true;
        self
    }

    /// `AUTO`, `FULL`, or `INCREMENTAL`.
    pub fn with_refresh_mode(mut self, mode: impl Into<String>) -> Self {
        self.refresh_mode = Some(mode.into());
        self
    }

    /// `ON_CREATE` or `ON_SCHEDULE`.
    pub fn with_initialize(mut self, initialize: impl Into<String>) -> Self {
        self.initialize = Some(initialize.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        if self.query.is_empty() {
            return Err(RequestError::MissingField("query"));
        }
        let mut sql = String::from("CREATE ");
        if self.or_replace {
            sql.push_str("OR REPLACE ");
        }
        sql.push_str("DYNAMIC TABLE ");
        sql.push_str(&self.name.fully_qualified_name());
        sql.push_str(&format!(" TARGET_LAG = {}", self.target_lag));
        sql.push_str(&format!(
            " WAREHOUSE = {}",
            self.warehouse.fully_qualified_name()
        ));
        if let Some(mode) = &self.refresh_mode {
            sql.push_str(&format!(" REFRESH_MODE = {mode}"));
        }
        if let Some(initialize) = &self.initialize {
            sql.push_str(&format!(" INITIALIZE = {initialize}"));
        }
        if let Some(comment) = &self.comment {
            sql.push_str(" COMMENT = ");
            sql.push_str(&quote_literal(comment));
        }
        sql.push_str(" AS ");
        sql.push_str(&self.query);
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DynamicTableSet {
    pub target_lag: Option<TargetLag>,
    pub warehouse: Option<AccountObjectIdentifier>,
    pub comment: Option<String>,
}

impl DynamicTableSet {
    fn is_empty(&self) -> bool {
        self.target_lag.is_none() && self.warehouse.is_none() && self.comment.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct AlterDynamicTableRequest {
    name: SchemaObjectIdentifier,
    suspend: bool,
    resume: bool,
    refresh: bool,
    set: Option<DynamicTableSet>,
}

impl AlterDynamicTableRequest {
    pub fn new(name: SchemaObjectIdentifier) -> Self {
        Self {
            name,
            suspend: false,
            resume: false,
            refresh: false,
            set: None,
        }
    }

    pub fn with_suspend(mut self) -> Self {
        self.suspend = true;
        self
    }

    pub fn with_resume(mut self) -> Self {
        self.resume = true;
        self
    }

    pub fn with_refresh(mut self) -> Self {
        self.refresh = true;
        self
    }

    pub fn with_set(mut self, set: DynamicTableSet) -> Self {
        self.set = Some(set);
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let set = self.set.as_ref().filter(|s| !s.is_empty());
        let actions = [self.suspend, self.resume, self.refresh, set.is_some()]
            .iter()
            .filter(|b| **b)
            .count();
        if actions == 0 {
            return Err(RequestError::MissingField("alter action"));
        }
        if actions > 1 {
            return Err(RequestError::MutuallyExclusive(
                "suspend/resume/refresh",
                "set",
            ));
        }
        let mut sql = String::from("ALTER DYNAMIC TABLE ");
        sql.push_str(&self.name.fully_qualified_name());
        if self.suspend {
            sql.push_str(" SUSPEND");
        } else if self.resume {
            sql.push_str(" RESUME");
        } else if self.refresh {
            sql.push_str(" REFRESH");
        } else if let Some(set) = set {
            let mut props = Vec::new();
            if let Some(lag) = &set.target_lag {
                props.push(format!("TARGET_LAG = {lag}"));
            }
            if let Some(warehouse) = &set.warehouse {
                props.push(format!("WAREHOUSE = {}", warehouse.fully_qualified_name()));
            }
            if let Some(comment) = &set.comment {
                props.push(format!("COMMENT = {}", quote_literal(comment)));
            }
            sql.push_str(" SET ");
            sql.push_str(&props.join(" "));
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct DropDynamicTableRequest {
    name: SchemaObjectIdentifier,
    if_exists: bool,
}

impl DropDynamicTableRequest {
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
        let mut sql = String::from("DROP DYNAMIC TABLE ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowDynamicTablesRequest {
    like: Option<Like>,
    in_scope: Option<ExtendedIn>,
    starts_with: Option<StartsWith>,
    limit: Option<LimitFrom>,
}

impl ShowDynamicTablesRequest {
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
        let mut sql = String::from("SHOW DYNAMIC TABLES");
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

/// One row of `SHOW DYNAMIC TABLES` output; `DESCRIBE DYNAMIC TABLE`
/// shares the shape.
#[derive(Debug, Clone)]
pub struct DynamicTableRow {
    pub created_on: Option<String>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub rows: Option<i64>,
    pub target_lag: Option<String>,
    pub refresh_mode: Option<String>,
    pub warehouse: Option<String>,
    pub scheduling_state: Option<String>,
    pub last_suspended_on: Option<String>,
    pub text: Option<String>,
    pub comment: Option<String>,
}

impl DynamicTableRow {
    pub fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }
}

impl FromRecord for DynamicTableRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(DynamicTableRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            database_name: record.require_string("database_name")?,
            schema_name: record.require_string("schema_name")?,
            rows: record.get_i64("rows")?,
            target_lag: record.get_string("target_lag")?,
            refresh_mode: record.get_string("refresh_mode")?,
            warehouse: record.get_string("warehouse")?,
            scheduling_state: record.get_string("scheduling_state")?,
            last_suspended_on: record.get_timestamp_text("last_suspended_on")?,
            text: record.get_string("text")?,
            comment: record.get_string("comment")?,
        })
    }
}

pub struct DynamicTablesClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> DynamicTablesClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateDynamicTableRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE DYNAMIC TABLE", &request.name))
    }

    pub async fn alter(&self, request: &AlterDynamicTableRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("ALTER DYNAMIC TABLE", &request.name))
    }

    pub async fn drop(&self, request: &DropDynamicTableRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP DYNAMIC TABLE", &request.name))
    }

    pub async fn show(&self, request: &ShowDynamicTablesRequest) -> Result<Vec<DynamicTableRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> Result<DynamicTableRow> {
        let request = ShowDynamicTablesRequest::new()
            .with_like(Like::new(id.name()))
            .with_in(ExtendedIn::schema(id.schema_id()));
        let rows = self.show(&request).await?;
        rows.into_iter()
            .find(|row| row.name == id.name())
            .ok_or(Error::NotFound)
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> Result<DynamicTableRow> {
        let sql = format!("DESCRIBE DYNAMIC TABLE {}", id.fully_qualified_name());
        self.executor
            .query_one(&sql)
            .await
            .map_err(|e| e.with_operation("DESCRIBE DYNAMIC TABLE", id))
    }

    pub async fn refresh(&self, id: &SchemaObjectIdentifier) -> Result<()> {
        self.alter(&AlterDynamicTableRequest::new(id.clone()).with_refresh())
            .await
    }

    pub async fn suspend(&self, id: &SchemaObjectIdentifier) -> Result<()> {
        self.alter(&AlterDynamicTableRequest::new(id.clone()).with_suspend())
            .await
    }

    pub async fn resume(&self, id: &SchemaObjectIdentifier) -> Result<()> {
        self.alter(&AlterDynamicTableRequest::new(id.clone()).with_resume())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(name: &str) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("D", "S", name)
    }

    #[test]
    fn create_renders_target_lag_forms() {
        let sql = CreateDynamicTableRequest::new(
            dt("DT"),
            TargetLag::Duration("20 minutes".into()),
            AccountObjectIdentifier::new("WH"),
            "SELECT * FROM src",
        )
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "CREATE DYNAMIC TABLE \"D\".\"S\".\"DT\" TARGET_LAG = '20 minutes' WAREHOUSE = \"WH\" AS SELECT * FROM src"
        );

        let sql = CreateDynamicTableRequest::new(
            dt("DT"),
            TargetLag::Downstream,
            AccountObjectIdentifier::new("WH"),
            "SELECT 1",
        )
        .with_refresh_mode("INCREMENTAL")
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "CREATE DYNAMIC TABLE \"D\".\"S\".\"DT\" TARGET_LAG = DOWNSTREAM WAREHOUSE = \"WH\" REFRESH_MODE = INCREMENTAL AS SELECT 1"
        );
    }

    #[test]
    fn alter_actions_are_exclusive() {
        let err = AlterDynamicTableRequest::new(dt("DT"))
            .with_suspend()
            .with_refresh()
            .build()
            .unwrap_err();
        assert!(matches!(err, RequestError::MutuallyExclusive(_, _)));

        let sql = AlterDynamicTableRequest::new(dt("DT"))
            .with_set(DynamicTableSet {
                target_lag: Some(TargetLag::Downstream),
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "ALTER DYNAMIC TABLE \"D\".\"S\".\"DT\" SET TARGET_LAG = DOWNSTREAM"
        );
    }
}
