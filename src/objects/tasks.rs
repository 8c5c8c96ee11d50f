use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::error::{Error, Result};
use crate::identifier::{AccountObjectIdentifier, SchemaObjectIdentifier};
use crate::record::{DecodeError, FromRecord, RecordRef};
use crate::sql::{
    ExtendedIn, Like, LimitFrom, RequestError, StartsWith, push_int_property, push_string_property,
    quote_literal,
};

#[derive(Debug, Clone)]
pub struct CreateTaskRequest {
    name: SchemaObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    warehouse: Option<AccountObjectIdentifier>,
    schedule: Option<String>,
    allow_overlapping_execution: Option<bool>,
    user_task_timeout_ms: Option<i64>,
    after: Vec<SchemaObjectIdentifier>,
    when_condition: Option<String>,
    comment: Option<String>,
    sql_statement: String,
}

impl CreateTaskRequest {
    pub fn new(name: SchemaObjectIdentifier, sql_statement: impl Into<String>) -> Self {
        Self {
            name,
            or_replace: false,
            if_not_exists: false,
            warehouse: None,
            schedule: None,
            allow_overlapping_execution: None,
            user_task_timeout_ms: None,
            after: Vec::new(),
            when_condition: None,
            comment: None,
            sql_statement: sql_statement.into(),
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

    pub fn with_warehouse(mut self, warehouse: AccountObjectIdentifier) -> Self {
        self.warehouse = Some(warehouse);
        self
    }

    /// Cron or interval schedule, e.g. `USING CRON 0 9 * * * UTC` or
    /// `60 MINUTE`.
    pub fn with_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = Some(schedule.into());
        self
    }

    pub fn with_allow_overlapping_execution(mut self, allow: bool) -> Self {
        self.allow_overlapping_execution = Some(allow);
        self
    }

    pub fn with_user_task_timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.user_task_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_after(mut self, predecessor: SchemaObjectIdentifier) -> Self {
        self.after.push(predecessor);
        self
    }

    pub fn with_when(mut self, condition: impl Into<String>) -> Self {
        self.when_condition = Some(condition.into());
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
        if self.schedule.is_some() && !self.after.is_empty() {
            return Err(RequestError::MutuallyExclusive("schedule", "after"));
        }
        if self.sql_statement.is_empty() {
            return Err(RequestError::MissingField("sql_statement"));
        }
        let mut sql = String::from("CREATE ");
        if self.or_replace {
            sql.push_str("OR REPLACE ");
        }
        sql.push_str("TASK ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if let Some(warehouse) = &self.warehouse {
            sql.push_str(" WAREHOUSE = ");
            sql.push_str(&warehouse.fully_qualified_name());
        }
        if let Some(schedule) = &self.schedule {
            sql.push_str(" SCHEDULE = ");
            sql.push_str(&quote_literal(schedule));
        }
        let mut props = Vec::new();
        if let Some(allow) = self.allow_overlapping_execution {
            props.push(format!(
                "ALLOW_OVERLAPPING_EXECUTION = {}",
                crate::sql::sql_bool(allow)
            ));
        }
        push_int_property(
            &mut props,
            "USER_TASK_TIMEOUT_MS",
            &self.user_task_timeout_ms,
        );
        push_string_property(&mut props, "COMMENT", &self.comment);
        if !props.is_empty() {
            sql.push(' ');
            sql.push_str(&props.join(" "));
        }
        if !self.after.is_empty() {
            let rendered: Vec<String> = self
                .after
                .iter()
                .map(|t| t.fully_qualified_name())
                .collect();
            sql.push_str(" AFTER ");
            sql.push_str(&rendered.join(", "));
        }
        if let Some(condition) = &self.when_condition {
            sql.push_str(" WHEN ");
            sql.push_str(condition);
        }
        sql.push_str(" AS ");
        sql.push_str(&self.sql_statement);
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskSet {
    pub warehouse: Option<AccountObjectIdentifier>,
    pub schedule: Option<String>,
    pub allow_overlapping_execution: Option<bool>,
    pub user_task_timeout_ms: Option<i64>,
    pub comment: Option<String>,
}

impl TaskSet {
    fn is_empty(&self) -> bool {
        self.warehouse.is_none()
            && self.schedule.is_none()
            && self.allow_overlapping_execution.is_none()
            && self.user_task_timeout_ms.is_none()
            && self.comment.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskUnset {
    pub warehouse: bool,
    pub schedule: bool,
    pub allow_overlapping_execution: bool,
    pub user_task_timeout_ms: bool,
    pub comment: bool,
}

impl TaskUnset {
    fn render(&self) -> Vec<&'static str> {
        let mut props = Vec::new();
        if self.warehouse {
            props.push("WAREHOUSE");
        }
        if self.schedule {
            props.push("SCHEDULE");
        }
        if self.allow_overlapping_execution {
            props.push("ALLOW_OVERLAPPING_EXECUTION");
        }
        if self.user_task_timeout_ms {
            props.push("USER_TASK_TIMEOUT_MS");
        }
        if self.comment {
            props.push("COMMENT");
        }
        props
    }
}

#[derive(Debug, Clone)]
pub struct AlterTaskRequest {
    name: SchemaObjectIdentifier,
    if_exists: bool,
    suspend: bool,
    resume: bool,
    set: Option<TaskSet>,
    unset: Option<TaskUnset>,
    modify_as: Option<String>,
}

impl AlterTaskRequest {
    pub fn new(name: SchemaObjectIdentifier) -> Self {
        Self {
            name,
            if_exists: false,
            suspend: false,
            resume: false,
            set: None,
            unset: None,
            modify_as: None,
        }
    }

    pub fn with_if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn with_suspend(mut self) -> Self {
        self.suspend = true;
        self
    }

    pub fn with_resume(mut self) -> Self {
        self.resume = true;
        self
    }

    pub fn with_set(mut self, set: TaskSet) -> Self {
        self.set = Some(set);
        self
    }

    pub fn with_unset(mut self, unset: TaskUnset) -> Self {
        self.unset = Some(unset);
        self
    }

    pub fn with_modify_as(mut self, sql_statement: impl Into<String>) -> Self {
        self.modify_as = Some(sql_statement.into());
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let set = self.set.as_ref().filter(|s| !s.is_empty());
        let unset = self.unset.as_ref().filter(|u| !u.render().is_empty());
        let actions = [
            self.suspend,
            self.resume,
            set.is_some(),
            unset.is_some(),
            self.modify_as.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count();
        if actions == 0 {
            return Err(RequestError::MissingField("alter action"));
        }
        if actions > 1 {
            return Err(RequestError::MutuallyExclusive(
                "suspend/resume/modify",
                "set/unset",
            ));
        }
        let mut sql = String::from("ALTER TASK ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if self.suspend {
            sql.push_str(" SUSPEND");
        } else if self.resume {
            sql.push_str(" RESUME");
        } else if let Some(set) = set {
            let mut props = Vec::new();
            if let Some(warehouse) = &set.warehouse {
                props.push(format!("WAREHOUSE = {}", warehouse.fully_qualified_name()));
            }
            push_string_property(&mut props, "SCHEDULE", &set.schedule);
            if let Some(allow) = set.allow_overlapping_execution {
                props.push(format!(
                    "ALLOW_OVERLAPPING_EXECUTION = {}",
                    crate::sql::sql_bool(allow)
                ));
            }
            push_int_property(&mut props, "USER_TASK_TIMEOUT_MS", &set.user_task_timeout_ms);
            push_string_property(&mut props, "COMMENT", &set.comment);
            sql.push_str(" SET ");
            sql.push_str(&props.join(" "));
        } else if let Some(unset) = unset {
            sql.push_str(" UNSET ");
            sql.push_str(&unset.render().join(", "));
        } else if let Some(statement) = &self.modify_as {
            sql.push_str(" MODIFY AS ");
            sql.push_str(statement);
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct DropTaskRequest {
    name: SchemaObjectIdentifier,
    if_exists: bool,
}

impl DropTaskRequest {
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
        let mut sql = String::from("DROP TASK ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowTasksRequest {
    like: Option<Like>,
    in_scope: Option<ExtendedIn>,
    starts_with: Option<StartsWith>,
    root_only: bool,
    limit: Option<LimitFrom>,
}

impl ShowTasksRequest {
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

    pub fn with_root_only(mut self) -> Self {
        self.root_only = true;
        self
    }

    pub fn with_limit(mut self, limit: LimitFrom) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let mut sql = String::from("SHOW TASKS");
        if let Some(like) = &self.like {
            like.write_sql(&mut sql);
        }
        if let Some(in_scope) = &self.in_scope {
            in_scope.write_sql(&mut sql)?;
        }
        if let Some(starts_with) = &self.starts_with {
            starts_with.write_sql(&mut sql);
        }
        if self.root_only {
            sql.push_str(" ROOT ONLY");
        }
        if let Some(limit) = &self.limit {
            limit.write_sql(&mut sql);
        }
        Ok(sql)
    }
}

/// One row of `SHOW TASKS` output; `DESCRIBE TASK` shares the shape.
#[derive(Debug, Clone)]
pub struct TaskRow {
    pub created_on: Option<String>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub owner: Option<String>,
    pub warehouse: Option<String>,
    pub schedule: Option<String>,
    pub predecessors: Vec<String>,
    pub state: String,
    pub definition: Option<String>,
    pub condition: Option<String>,
    pub allow_overlapping_execution: bool,
    pub comment: Option<String>,
}

impl TaskRow {
    pub fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }

    pub fn is_started(&self) -> bool {
        self.state == "started"
    }
}

impl FromRecord for TaskRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(TaskRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            database_name: record.require_string("database_name")?,
            schema_name: record.require_string("schema_name")?,
            owner: record.get_string("owner")?,
            warehouse: record.get_string("warehouse")?,
            schedule: record.get_string("schedule")?,
            predecessors: record.get_list("predecessors")?,
            state: record.require_string("state")?,
            definition: record.get_string("definition")?,
            condition: record.get_string("condition")?,
            allow_overlapping_execution: record
                .get_bool("allow_overlapping_execution")?
                .bool_value(),
            comment: record.get_string("comment")?,
        })
    }
}

pub struct TasksClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> TasksClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateTaskRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE TASK", &request.name))
    }

    pub async fn alter(&self, request: &AlterTaskRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("ALTER TASK", &request.name))
    }

    pub async fn drop(&self, request: &DropTaskRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP TASK", &request.name))
    }

    pub async fn show(&self, request: &ShowTasksRequest) -> Result<Vec<TaskRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> Result<TaskRow> {
        let request = ShowTasksRequest::new()
            .with_like(Like::new(id.name()))
            .with_in(ExtendedIn::schema(id.schema_id()));
        let rows = self.show(&request).await?;
        rows.into_iter()
            .find(|row| row.name == id.name())
            .ok_or(Error::NotFound)
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> Result<TaskRow> {
        let sql = format!("DESCRIBE TASK {}", id.fully_qualified_name());
        self.executor
            .query_one(&sql)
            .await
            .map_err(|e| e.with_operation("DESCRIBE TASK", id))
    }

    /// Trigger a single run outside the schedule.
    pub async fn execute(&self, id: &SchemaObjectIdentifier, retry_last: bool) -> Result<()> {
        let mut sql = format!("EXECUTE TASK {}", id.fully_qualified_name());
        if retry_last {
            sql.push_str(" RETRY LAST");
        }
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("EXECUTE TASK", id))
    }

    pub async fn suspend(&self, id: &SchemaObjectIdentifier) -> Result<()> {
        self.alter(&AlterTaskRequest::new(id.clone()).with_suspend())
            .await
    }

    pub async fn resume(&self, id: &SchemaObjectIdentifier) -> Result<()> {
        self.alter(&AlterTaskRequest::new(id.clone()).with_resume())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::RecordingExecutor;

    fn task(name: &str) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("D", "S", name)
    }

    #[test]
    fn create_scheduled_task() {
        let sql = CreateTaskRequest::new(task("T1"), "SELECT 1")
            .with_warehouse(AccountObjectIdentifier::new("WH"))
            .with_schedule("60 MINUTE")
            .with_comment("hourly")
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TASK \"D\".\"S\".\"T1\" WAREHOUSE = \"WH\" SCHEDULE = '60 MINUTE' COMMENT = 'hourly' AS SELECT 1"
        );
    }

    #[test]
    fn create_chained_task() {
        let sql = CreateTaskRequest::new(task("T2"), "SELECT 1")
            .with_after(task("T1"))
            .with_when("SYSTEM$STREAM_HAS_DATA('STR')")
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TASK \"D\".\"S\".\"T2\" AFTER \"D\".\"S\".\"T1\" WHEN SYSTEM$STREAM_HAS_DATA('STR') AS SELECT 1"
        );
    }

    #[test]
    fn schedule_and_after_are_exclusive() {
        let err = CreateTaskRequest::new(task("T"), "SELECT 1")
            .with_schedule("60 MINUTE")
            .with_after(task("T0"))
            .build()
            .unwrap_err();
        assert_eq!(err, RequestError::MutuallyExclusive("schedule", "after"));
    }

    #[tokio::test]
    async fn execute_renders_retry() {
        let executor = RecordingExecutor::new();
        let client = TasksClient::new(&executor);
        client.execute(&task("T1"), true).await.unwrap();
        assert_eq!(
            executor.executed(),
            vec!["EXECUTE TASK \"D\".\"S\".\"T1\" RETRY LAST"]
        );
    }
}
