use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::error::{Error, Result};
use crate::identifier::AccountObjectIdentifier;
use crate::objects::{TagAssociation, write_tag_clause};
use crate::record::{DecodeError, FromRecord, RecordRef};
use crate::sql::{Like, LimitFrom, RequestError, StartsWith, push_int_property, push_string_property};

#[derive(Debug, Clone)]
pub struct CreateDatabaseRequest {
    name: AccountObjectIdentifier,
    or_replace: bool,
    transient: bool,
    if_not_exists: bool,
    clone_from: Option<AccountObjectIdentifier>,
    data_retention_time_in_days: Option<i64>,
    max_data_extension_time_in_days: Option<i64>,
    comment: Option<String>,
    tags: Vec<TagAssociation>,
}

impl CreateDatabaseRequest {
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            name,
            or_replace: false,
            transient: false,
            if_not_exists: false,
            clone_from: None,
            data_retention_time_in_days: None,
            max_data_extension_time_in_days: None,
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

    pub fn with_clone_from(mut self, source: AccountObjectIdentifier) -> Self {
        self.clone_from = Some(source);
        self
    }

    pub fn with_data_retention_time_in_days(mut self, days: i64) -> Self {
        self.data_retention_time_in_days = Some(days);
        self
    }

    pub fn with_max_data_extension_time_in_days(mut self, days: i64) -> Self {
        self.max_data_extension_time_in_days = Some(days);
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
        sql.push_str("DATABASE ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if let Some(source) = &self.clone_from {
            sql.push_str(" CLONE ");
            sql.push_str(&source.fully_qualified_name());
        }
        let mut props = Vec::new();
        push_int_property(
            &mut props,
            "DATA_RETENTION_TIME_IN_DAYS",
            &self.data_retention_time_in_days,
        );
        push_int_property(
            &mut props,
            "MAX_DATA_EXTENSION_TIME_IN_DAYS",
            &self.max_data_extension_time_in_days,
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

#[derive(Debug, Clone, Default)]
pub struct DatabaseSet {
    pub data_retention_time_in_days: Option<i64>,
    pub max_data_extension_time_in_days: Option<i64>,
    pub comment: Option<String>,
}

impl DatabaseSet {
    fn is_empty(&self) -> bool {
        self.data_retention_time_in_days.is_none()
            && self.max_data_extension_time_in_days.is_none()
            && self.comment.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DatabaseUnset {
    pub data_retention_time_in_days: bool,
    pub max_data_extension_time_in_days: bool,
    pub comment: bool,
}

impl DatabaseUnset {
    fn is_empty(&self) -> bool {
        !(self.data_retention_time_in_days
            || self.max_data_extension_time_in_days
            || self.comment)
    }
}

#[derive(Debug, Clone)]
pub struct AlterDatabaseRequest {
    name: AccountObjectIdentifier,
    if_exists: bool,
    rename_to: Option<AccountObjectIdentifier>,
    swap_with: Option<AccountObjectIdentifier>,
    set: Option<DatabaseSet>,
    unset: Option<DatabaseUnset>,
}

impl AlterDatabaseRequest {
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            name,
            if_exists: false,
            rename_to: None,
            swap_with: None,
            set: None,
            unset: None,
        }
    }

    pub fn with_if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn with_rename_to(mut self, new_name: AccountObjectIdentifier) -> Self {
        self.rename_to = Some(new_name);
        self
    }

    pub fn with_swap_with(mut self, other: AccountObjectIdentifier) -> Self {
        self.swap_with = Some(other);
        self
    }

    pub fn with_set(mut self, set: DatabaseSet) -> Self {
        self.set = Some(set);
        self
    }

    pub fn with_unset(mut self, unset: DatabaseUnset) -> Self {
        self.unset = Some(unset);
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let set = self.set.as_ref().filter(|s| !s.is_empty());
        let unset = self.unset.as_ref().filter(|u| !u.is_empty());
        let actions = [
            self.rename_to.is_some(),
            self.swap_with.is_some(),
            set.is_some(),
            unset.is_some(),
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
                "set/unset",
            ));
        }

        let mut sql = String::from("ALTER DATABASE ");
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
        } else if let Some(set) = set {
            let mut props = Vec::new();
            push_int_property(
                &mut props,
                "DATA_RETENTION_TIME_IN_DAYS",
                &set.data_retention_time_in_days,
            );
            push_int_property(
                &mut props,
                "MAX_DATA_EXTENSION_TIME_IN_DAYS",
                &set.max_data_extension_time_in_days,
            );
            push_string_property(&mut props, "COMMENT", &set.comment);
            sql.push_str(" SET ");
            sql.push_str(&props.join(" "));
        } else if let Some(unset) = unset {
            let mut props = Vec::new();
            if unset.data_retention_time_in_days {
                props.push("DATA_RETENTION_TIME_IN_DAYS");
            }
            if unset.max_data_extension_time_in_days {
                props.push("MAX_DATA_EXTENSION_TIME_IN_DAYS");
            }
            if unset.comment {
                props.push("COMMENT");
            }
            sql.push_str(" UNSET ");
            sql.push_str(&props.join(", "));
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct DropDatabaseRequest {
    name: AccountObjectIdentifier,
    if_exists: bool,
    cascade: bool,
}

impl DropDatabaseRequest {
    pub fn new(name: AccountObjectIdentifier) -> Self {
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
        let mut sql = String::from("DROP DATABASE ");
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
pub struct ShowDatabasesRequest {
    like: Option<Like>,
    starts_with: Option<StartsWith>,
    limit: Option<LimitFrom>,
}

impl ShowDatabasesRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_like(mut self, like: Like) -> Self {
        self.like = Some(like);
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
        let mut sql = String::from("SHOW DATABASES");
        if let Some(like) = &self.like {
            like.write_sql(&mut sql);
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

/// One row of `SHOW DATABASES` output.
#[derive(Debug, Clone)]
pub struct DatabaseRow {
    pub created_on: Option<String>,
    pub name: String,
    pub kind: String,
    pub is_default: bool,
    pub is_current: bool,
    pub origin: Option<String>,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub retention_time: Option<i64>,
}

impl DatabaseRow {
    pub fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }

    /// Imported and shared databases show up alongside standard ones.
    pub fn is_standard(&self) -> bool {
        self.kind == "STANDARD"
    }
}

impl FromRecord for DatabaseRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(DatabaseRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            kind: record.get_string("kind")?.unwrap_or_default(),
            is_default: record.get_bool("is_default")?.bool_value(),
            is_current: record.get_bool("is_current")?.bool_value(),
            origin: record.get_string("origin")?,
            owner: record.get_string("owner")?,
            comment: record.get_string("comment")?,
            retention_time: record.get_i64("retention_time")?,
        })
    }
}

/// One row of `DESCRIBE DATABASE` output: the schemas the database holds.
#[derive(Debug, Clone)]
pub struct DatabaseDetailsRow {
    pub created_on: Option<String>,
    pub name: String,
    pub kind: String,
}

impl FromRecord for DatabaseDetailsRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(DatabaseDetailsRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            kind: record.require_string("kind")?,
        })
    }
}

pub struct DatabasesClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> DatabasesClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateDatabaseRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE DATABASE", &request.name))
    }

    pub async fn alter(&self, request: &AlterDatabaseRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("ALTER DATABASE", &request.name))
    }

    pub async fn drop(&self, request: &DropDatabaseRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP DATABASE", &request.name))
    }

    pub async fn show(&self, request: &ShowDatabasesRequest) -> Result<Vec<DatabaseRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> Result<DatabaseRow> {
        let request = ShowDatabasesRequest::new().with_like(Like::new(id.name()));
        let rows = self.show(&request).await?;
        rows.into_iter()
            .find(|row| row.name == id.name())
            .ok_or(Error::NotFound)
    }

    pub async fn describe(&self, id: &AccountObjectIdentifier) -> Result<Vec<DatabaseDetailsRow>> {
        let sql = format!("DESCRIBE DATABASE {}", id.fully_qualified_name());
        self.executor
            .query(&sql)
            .await
            .map_err(|e| e.with_operation("DESCRIBE DATABASE", id))
    }

    /// `USE DATABASE` for the current session.
    pub async fn use_database(&self, id: &AccountObjectIdentifier) -> Result<()> {
        let sql = format!("USE DATABASE {}", id.fully_qualified_name());
        self.executor.exec(&sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::RecordingExecutor;
    use crate::record::JsonTable;
    use serde_json::json;

    fn db(name: &str) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(name)
    }

    #[test]
    fn create_with_clone_and_props() {
        let sql = CreateDatabaseRequest::new(db("D2"))
            .with_transient()
            .with_clone_from(db("D1"))
            .with_data_retention_time_in_days(7)
            .with_comment("scratch")
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TRANSIENT DATABASE \"D2\" CLONE \"D1\" DATA_RETENTION_TIME_IN_DAYS = 7 COMMENT = 'scratch'"
        );
    }

    #[test]
    fn alter_branches_are_exclusive() {
        let err = AlterDatabaseRequest::new(db("D1"))
            .with_rename_to(db("D2"))
            .with_set(DatabaseSet {
                comment: Some("x".into()),
                ..Default::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, RequestError::MutuallyExclusive(_, _)));

        let sql = AlterDatabaseRequest::new(db("D1"))
            .with_swap_with(db("D2"))
            .build()
            .unwrap();
        assert_eq!(sql, "ALTER DATABASE \"D1\" SWAP WITH \"D2\"");
    }

    #[test]
    fn drop_with_if_exists_and_cascade() {
        let sql = DropDatabaseRequest::new(db("D1"))
            .with_if_exists()
            .with_cascade()
            .build()
            .unwrap();
        assert_eq!(sql, "DROP DATABASE IF EXISTS \"D1\" CASCADE");
    }

    #[test]
    fn show_filters_render_in_order() {
        let sql = ShowDatabasesRequest::new()
            .with_like(Like::new("D%"))
            .with_starts_with(StartsWith("D".into()))
            .with_limit(LimitFrom::from(10, "D1"))
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SHOW DATABASES LIKE 'D%' STARTS WITH 'D' LIMIT 10 FROM 'D1'"
        );
    }

    #[tokio::test]
    async fn show_decodes_kind_filter() {
        let table = JsonTable::new(
            vec![
                "created_on".into(),
                "name".into(),
                "kind".into(),
                "is_default".into(),
                "is_current".into(),
                "origin".into(),
                "owner".into(),
                "comment".into(),
                "retention_time".into(),
            ],
            vec![
                vec![
                    json!("2024-01-02T15:04:05.000 -0700"),
                    json!("D1"),
                    json!("STANDARD"),
                    json!("false"),
                    json!("true"),
                    json!(""),
                    json!("SYSADMIN"),
                    json!(""),
                    json!(1),
                ],
                vec![
                    json!("2024-01-02T15:04:05.000 -0700"),
                    json!("SHARED"),
                    json!("IMPORTED DATABASE"),
                    json!("false"),
                    json!("false"),
                    json!("ORG.ACC.SHARE"),
                    json!("SYSADMIN"),
                    json!(""),
                    json!("null"),
                ],
            ],
        );
        let executor = RecordingExecutor::with_table(table);
        let client = DatabasesClient::new(&executor);
        let rows = client.show(&ShowDatabasesRequest::new()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_standard());
        assert!(!rows[1].is_standard());
        assert_eq!(rows[1].retention_time, None);
    }
}
