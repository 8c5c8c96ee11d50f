use std::fmt;
use std::str::FromStr;

use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::error::{Error, Result};
use crate::identifier::AccountObjectIdentifier;
use crate::objects::{TagAssociation, write_tag_clause};
use crate::record::{DecodeError, FromRecord, RecordRef};
use crate::sql::{
    Like, RequestError, push_bool_property, push_int_property, push_string_property,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarehouseSize {
    XSmall,
    Small,
    Medium,
    Large,
    XLarge,
    XxLarge,
    XxxLarge,
    X4Large,
    X5Large,
    X6Large,
}

impl fmt::Display for WarehouseSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WarehouseSize::XSmall => "XSMALL",
            WarehouseSize::Small => "SMALL",
            WarehouseSize::Medium => "MEDIUM",
            WarehouseSize::Large => "LARGE",
            WarehouseSize::XLarge => "XLARGE",
            WarehouseSize::XxLarge => "XXLARGE",
            WarehouseSize::XxxLarge => "XXXLARGE",
            WarehouseSize::X4Large => "X4LARGE",
            WarehouseSize::X5Large => "X5LARGE",
            WarehouseSize::X6Large => "X6LARGE",
        };
        f.write_str(s)
    }
}

impl FromStr for WarehouseSize {
    type Err = String;

    /// Accepts both the statement spellings (`XSMALL`) and the SHOW output
    /// spellings (`X-Small`, `4X-Large`).
    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = raw.trim().to_uppercase().replace('-', "");
        let size = match normalized.as_str() {
            "XSMALL" => WarehouseSize::XSmall,
            "SMALL" => WarehouseSize::Small,
            "MEDIUM" => WarehouseSize::Medium,
            "LARGE" => WarehouseSize::Large,
            "XLARGE" => WarehouseSize::XLarge,
            "XXLARGE" | "2XLARGE" | "X2LARGE" => WarehouseSize::XxLarge,
            "XXXLARGE" | "3XLARGE" | "X3LARGE" => WarehouseSize::XxxLarge,
            "X4LARGE" | "4XLARGE" => WarehouseSize::X4Large,
            "X5LARGE" | "5XLARGE" => WarehouseSize::X5Large,
            "X6LARGE" | "6XLARGE" => WarehouseSize::X6Large,
            _ => return Err(format!("unknown warehouse size: {raw}")),
        };
        Ok(size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingPolicy {
    Standard,
    Economy,
}

impl fmt::Display for ScalingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalingPolicy::Standard => f.write_str("STANDARD"),
            ScalingPolicy::Economy => f.write_str("ECONOMY"),
        }
    }
}

impl FromStr for ScalingPolicy {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_uppercase().as_str() {
            "STANDARD" => Ok(ScalingPolicy::Standard),
            "ECONOMY" => Ok(ScalingPolicy::Economy),
            _ => Err(format!("unknown scaling policy: {raw}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateWarehouseRequest {
    name: AccountObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    warehouse_size: Option<WarehouseSize>,
    scaling_policy: Option<ScalingPolicy>,
    auto_suspend: Option<i64>,
    auto_resume: Option<bool>,
    initially_suspended: Option<bool>,
    min_cluster_count: Option<i64>,
    max_cluster_count: Option<i64>,
    comment: Option<String>,
    tags: Vec<TagAssociation>,
}

impl CreateWarehouseRequest {
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            name,
            or_replace: false,
            if_not_exists: false,
            warehouse_size: None,
            scaling_policy: None,
            auto_suspend: None,
            auto_resume: None,
            initially_suspended: None,
            min_cluster_count: None,
            max_cluster_count: None,
            comment: None,
            tags: Vec::new(),
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

    pub fn with_warehouse_size(mut self, size: WarehouseSize) -> Self {
        self.warehouse_size = Some(size);
        self
    }

    pub fn with_scaling_policy(mut self, policy: ScalingPolicy) -> Self {
        self.scaling_policy = Some(policy);
        self
    }

    pub fn with_auto_suspend(mut self, seconds: i64) -> Self {
        self.auto_suspend = Some(seconds);
        self
    }

    pub fn with_auto_resume(mut self, auto_resume: bool) -> Self {
        self.auto_resume = Some(auto_resume);
        self
    }

    pub fn with_initially_suspended(mut self, suspended: bool) -> Self {
        self.initially_suspended = Some(suspended);
        self
    }

    pub fn with_cluster_counts(mut self, min: i64, max: i64) -> Self {
        self.min_cluster_count = Some(min);
        self.max_cluster_count = Some(max);
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
        sql.push_str("WAREHOUSE ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());

        let mut props = Vec::new();
        if let Some(size) = &self.warehouse_size {
            props.push(format!("WAREHOUSE_SIZE = {size}"));
        }
        if let Some(policy) = &self.scaling_policy {
            props.push(format!("SCALING_POLICY = {policy}"));
        }
        push_int_property(&mut props, "AUTO_SUSPEND", &self.auto_suspend);
        push_bool_property(&mut props, "AUTO_RESUME", &self.auto_resume);
        push_bool_property(&mut props, "INITIALLY_SUSPENDED", &self.initially_suspended);
        push_int_property(&mut props, "MIN_CLUSTER_COUNT", &self.min_cluster_count);
        push_int_property(&mut props, "MAX_CLUSTER_COUNT", &self.max_cluster_count);
        push_string_property(&mut props, "COMMENT", &self.comment);
        if !props.is_empty() {
            sql.push(' ');
            sql.push_str(&props.join(" "));
        }
        write_tag_clause(&mut sql, &self.tags);
        Ok(sql)
    }
}

/// Properties settable through `ALTER WAREHOUSE ... SET`.
#[derive(Debug, Clone, Default)]
pub struct WarehouseSet {
    pub warehouse_size: Option<WarehouseSize>,
    pub scaling_policy: Option<ScalingPolicy>,
    pub auto_suspend: Option<i64>,
    pub auto_resume: Option<bool>,
    pub min_cluster_count: Option<i64>,
    pub max_cluster_count: Option<i64>,
    pub resource_monitor: Option<AccountObjectIdentifier>,
    pub comment: Option<String>,
}

impl WarehouseSet {
    fn is_empty(&self) -> bool {
        self.warehouse_size.is_none()
            && self.scaling_policy.is_none()
            && self.auto_suspend.is_none()
            && self.auto_resume.is_none()
            && self.min_cluster_count.is_none()
            && self.max_cluster_count.is_none()
            && self.resource_monitor.is_none()
            && self.comment.is_none()
    }

    fn write_sql(&self, sql: &mut String) {
        let mut props = Vec::new();
        if let Some(size) = &self.warehouse_size {
            props.push(format!("WAREHOUSE_SIZE = {size}"));
        }
        if let Some(policy) = &self.scaling_policy {
            props.push(format!("SCALING_POLICY = {policy}"));
        }
        push_int_property(&mut props, "AUTO_SUSPEND", &self.auto_suspend);
        push_bool_property(&mut props, "AUTO_RESUME", &self.auto_resume);
        push_int_property(&mut props, "MIN_CLUSTER_COUNT", &self.min_cluster_count);
        push_int_property(&mut props, "MAX_CLUSTER_COUNT", &self.max_cluster_count);
        if let Some(monitor) = &self.resource_monitor {
            props.push(format!("RESOURCE_MONITOR = {}", monitor.fully_qualified_name()));
        }
        push_string_property(&mut props, "COMMENT", &self.comment);
        sql.push_str(" SET ");
        sql.push_str(&props.join(" "));
    }
}

/// Properties clearable through `ALTER WAREHOUSE ... UNSET`.
#[derive(Debug, Clone, Default)]
pub struct WarehouseUnset {
    pub warehouse_size: bool,
    pub scaling_policy: bool,
    pub auto_suspend: bool,
    pub auto_resume: bool,
    pub resource_monitor: bool,
    pub comment: bool,
}

impl WarehouseUnset {
    fn is_empty(&self) -> bool {
        !(self.warehouse_size
            || self.scaling_policy
            || self.auto_suspend
            || self.auto_resume
            || self.resource_monitor
            || self.comment)
    }

    fn write_sql(&self, sql: &mut String) {
        let mut props = Vec::new();
        if self.warehouse_size {
            props.push("WAREHOUSE_SIZE");
        }
        if self.scaling_policy {
            props.push("SCALING_POLICY");
        }
        if self.auto_suspend {
            props.push("AUTO_SUSPEND");
        }
        if self.auto_resume {
            props.push("AUTO_RESUME");
        }
        if self.resource_monitor {
            props.push("RESOURCE_MONITOR");
        }
        if self.comment {
            props.push("COMMENT");
        }
        sql.push_str(" UNSET ");
        sql.push_str(&props.join(", "));
    }
}

#[derive(Debug, Clone)]
pub struct AlterWarehouseRequest {
    name: AccountObjectIdentifier,
    if_exists: bool,
    suspend: bool,
    resume: bool,
    abort_all_queries: bool,
    rename_to: Option<AccountObjectIdentifier>,
    set: Option<WarehouseSet>,
    unset: Option<WarehouseUnset>,
}

impl AlterWarehouseRequest {
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            name,
            if_exists: false,
            suspend: false,
            resume: false,
            abort_all_queries: false,
            rename_to: None,
            set: None,
            unset: None,
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

    pub fn with_abort_all_queries(mut self) -> Self {
        self.abort_all_queries = true;
        self
    }

    pub fn with_rename_to(mut self, new_name: AccountObjectIdentifier) -> Self {
        self.rename_to = Some(new_name);
        self
    }

    pub fn with_set(mut self, set: WarehouseSet) -> Self {
        self.set = Some(set);
        self
    }

    pub fn with_unset(mut self, unset: WarehouseUnset) -> Self {
        self.unset = Some(unset);
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let set = self.set.as_ref().filter(|s| !s.is_empty());
        let unset = self.unset.as_ref().filter(|u| !u.is_empty());

        if let (Some(set), Some(unset)) = (set, unset) {
            if set.warehouse_size.is_some() && unset.warehouse_size {
                return Err(RequestError::MutuallyExclusive("set.size", "unset.size"));
            }
            return Err(RequestError::MutuallyExclusive("set", "unset"));
        }

        let actions = [
            self.suspend,
            self.resume,
            self.abort_all_queries,
            self.rename_to.is_some(),
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
                "suspend/resume/abort/rename",
                "set/unset",
            ));
        }

        let mut sql = String::from("ALTER WAREHOUSE ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());

        if self.suspend {
            sql.push_str(" SUSPEND");
        } else if self.resume {
            sql.push_str(" RESUME IF SUSPENDED");
        } else if self.abort_all_queries {
            sql.push_str(" ABORT ALL QUERIES");
        } else if let Some(new_name) = &self.rename_to {
            sql.push_str(" RENAME TO ");
            sql.push_str(&new_name.fully_qualified_name());
        } else if let Some(set) = set {
            set.write_sql(&mut sql);
        } else if let Some(unset) = unset {
            unset.write_sql(&mut sql);
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct DropWarehouseRequest {
    name: AccountObjectIdentifier,
    if_exists: bool,
}

impl DropWarehouseRequest {
    pub fn new(name: AccountObjectIdentifier) -> Self {
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
        let mut sql = String::from("DROP WAREHOUSE ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowWarehousesRequest {
    like: Option<Like>,
}

impl ShowWarehousesRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_like(mut self, like: Like) -> Self {
        self.like = Some(like);
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let mut sql = String::from("SHOW WAREHOUSES");
        if let Some(like) = &self.like {
            like.write_sql(&mut sql);
        }
        Ok(sql)
    }
}

/// One row of `SHOW WAREHOUSES` output.
#[derive(Debug, Clone)]
pub struct WarehouseRow {
    pub created_on: Option<String>,
    pub name: String,
    pub state: String,
    pub size: Option<WarehouseSize>,
    pub scaling_policy: Option<ScalingPolicy>,
    pub min_cluster_count: Option<i64>,
    pub max_cluster_count: Option<i64>,
    pub auto_suspend: Option<i64>,
    pub auto_resume: bool,
    pub is_default: bool,
    pub is_current: bool,
    pub resource_monitor: Option<String>,
    pub comment: Option<String>,
}

impl WarehouseRow {
    pub fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }
}

impl FromRecord for WarehouseRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        let size = match record.get_string("size")? {
            Some(raw) => Some(
                raw.parse::<WarehouseSize>()
                    .map_err(|_| record.invalid_enum("size", "warehouse size", &raw))?,
            ),
            None => None,
        };
        let scaling_policy = match record.get_string("scaling_policy")? {
            Some(raw) => Some(
                raw.parse::<ScalingPolicy>()
                    .map_err(|_| record.invalid_enum("scaling_policy", "scaling policy", &raw))?,
            ),
            None => None,
        };
        Ok(WarehouseRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            state: record.require_string("state")?,
            size,
            scaling_policy,
            min_cluster_count: record.get_i64("min_cluster_count")?,
            max_cluster_count: record.get_i64("max_cluster_count")?,
            auto_suspend: record.get_i64("auto_suspend")?,
            auto_resume: record.get_bool("auto_resume")?.bool_value(),
            is_default: record.get_bool("is_default")?.bool_value(),
            is_current: record.get_bool("is_current")?.bool_value(),
            resource_monitor: record
                .get_string("resource_monitor")?
                .filter(|m| m != "null"),
            comment: record.get_string("comment")?,
        })
    }
}

/// One row of `DESCRIBE WAREHOUSE` output.
#[derive(Debug, Clone)]
pub struct WarehouseDetailsRow {
    pub created_on: Option<String>,
    pub name: String,
    pub kind: String,
}

impl FromRecord for WarehouseDetailsRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(WarehouseDetailsRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            kind: record.require_string("kind")?,
        })
    }
}

pub struct WarehousesClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> WarehousesClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateWarehouseRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE WAREHOUSE", &request.name))
    }

    pub async fn alter(&self, request: &AlterWarehouseRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("ALTER WAREHOUSE", &request.name))
    }

    pub async fn drop(&self, request: &DropWarehouseRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP WAREHOUSE", &request.name))
    }

    pub async fn show(&self, request: &ShowWarehousesRequest) -> Result<Vec<WarehouseRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> Result<WarehouseRow> {
        let request = ShowWarehousesRequest::new().with_like(Like::new(id.name()));
        let rows = self.show(&request).await?;
        rows.into_iter()
            .find(|row| row.name == id.name())
            .ok_or(Error::NotFound)
    }

    pub async fn describe(&self, id: &AccountObjectIdentifier) -> Result<WarehouseDetailsRow> {
        let sql = format!("DESCRIBE WAREHOUSE {}", id.fully_qualified_name());
        self.executor
            .query_one(&sql)
            .await
            .map_err(|e| e.with_operation("DESCRIBE WAREHOUSE", id))
    }

    /// `USE WAREHOUSE` for the current session.
    pub async fn use_warehouse(&self, id: &AccountObjectIdentifier) -> Result<()> {
        let sql = format!("USE WAREHOUSE {}", id.fully_qualified_name());
        self.executor.exec(&sql).await
    }

    pub async fn suspend(&self, id: &AccountObjectIdentifier) -> Result<()> {
        self.alter(&AlterWarehouseRequest::new(id.clone()).with_suspend())
            .await
    }

    pub async fn resume(&self, id: &AccountObjectIdentifier) -> Result<()> {
        self.alter(&AlterWarehouseRequest::new(id.clone()).with_resume())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::RecordingExecutor;
    use crate::record::JsonTable;
    use serde_json::json;

    fn wh(name: &str) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(name)
    }

    #[test]
    fn create_renders_in_fixed_order() {
        let sql = CreateWarehouseRequest::new(wh("WH"))
            .with_or_replace()
            .with_warehouse_size(WarehouseSize::Large)
            .with_auto_suspend(600)
            .with_auto_resume(true)
            .with_comment("it's primary")
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE OR REPLACE WAREHOUSE \"WH\" WAREHOUSE_SIZE = LARGE AUTO_SUSPEND = 600 AUTO_RESUME = TRUE COMMENT = 'it''s primary'"
        );
    }

    #[test]
    fn create_rejects_or_replace_with_if_not_exists() {
        let err = CreateWarehouseRequest::new(wh("WH"))
            .with_or_replace()
            .with_if_not_exists()
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RequestError::MutuallyExclusive("or_replace", "if_not_exists")
        );
    }

    #[test]
    fn alter_set_and_unset_size_conflict() {
        let err = AlterWarehouseRequest::new(wh("WH"))
            .with_set(WarehouseSet {
                warehouse_size: Some(WarehouseSize::Large),
                ..Default::default()
            })
            .with_unset(WarehouseUnset {
                warehouse_size: true,
                ..Default::default()
            })
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "mutually exclusive options: set.size and unset.size"
        );
    }

    #[test]
    fn alter_requires_an_action() {
        let err = AlterWarehouseRequest::new(wh("WH")).build().unwrap_err();
        assert_eq!(err, RequestError::MissingField("alter action"));
    }

    #[test]
    fn alter_renders_single_branch() {
        let sql = AlterWarehouseRequest::new(wh("WH"))
            .with_if_exists()
            .with_set(WarehouseSet {
                warehouse_size: Some(WarehouseSize::XxLarge),
                auto_suspend: Some(300),
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "ALTER WAREHOUSE IF EXISTS \"WH\" SET WAREHOUSE_SIZE = XXLARGE AUTO_SUSPEND = 300"
        );

        let sql = AlterWarehouseRequest::new(wh("WH"))
            .with_unset(WarehouseUnset {
                auto_suspend: true,
                comment: true,
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(sql, "ALTER WAREHOUSE \"WH\" UNSET AUTO_SUSPEND, COMMENT");

        let sql = AlterWarehouseRequest::new(wh("WH"))
            .with_suspend()
            .build()
            .unwrap();
        assert_eq!(sql, "ALTER WAREHOUSE \"WH\" SUSPEND");
    }

    #[test]
    fn warehouse_size_parses_show_spellings() {
        assert_eq!("X-Small".parse::<WarehouseSize>().unwrap(), WarehouseSize::XSmall);
        assert_eq!("4X-Large".parse::<WarehouseSize>().unwrap(), WarehouseSize::X4Large);
        assert!("Gigantic".parse::<WarehouseSize>().is_err());
    }

    fn show_table() -> JsonTable {
        JsonTable::new(
            vec![
                "created_on".into(),
                "name".into(),
                "state".into(),
                "size".into(),
                "scaling_policy".into(),
                "min_cluster_count".into(),
                "max_cluster_count".into(),
                "auto_suspend".into(),
                "auto_resume".into(),
                "is_default".into(),
                "is_current".into(),
                "resource_monitor".into(),
                "comment".into(),
            ],
            vec![vec![
                json!("2024-01-02T15:04:05.000 -0700"),
                json!("WH1"),
                json!("STARTED"),
                json!("X-Small"),
                json!("STANDARD"),
                json!(1),
                json!(3),
                json!(600),
                json!("true"),
                json!("false"),
                json!("true"),
                json!("null"),
                json!(""),
            ]],
        )
    }

    #[tokio::test]
    async fn show_by_id_decodes_row() {
        let executor = RecordingExecutor::with_table(show_table());
        let client = WarehousesClient::new(&executor);
        let row = client.show_by_id(&wh("WH1")).await.unwrap();
        assert_eq!(row.size, Some(WarehouseSize::XSmall));
        assert_eq!(row.auto_suspend, Some(600));
        assert!(row.auto_resume);
        assert!(!row.is_default);
        assert!(row.resource_monitor.is_none());
        assert_eq!(executor.executed(), vec!["SHOW WAREHOUSES LIKE 'WH1'"]);
    }

    #[tokio::test]
    async fn show_by_id_misses_with_not_found() {
        let executor = RecordingExecutor::with_table(show_table());
        let client = WarehousesClient::new(&executor);
        let err = client.show_by_id(&wh("OTHER")).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
