use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;

use snowflake_ddl::client::{SqlExecutor, SqlExecutorExt};
use snowflake_ddl::datatype::{DataType, TypeComparison, compare_types, parse_data_type};
use snowflake_ddl::error::{Error, Result};
use snowflake_ddl::identifier::{AccountObjectIdentifier, SchemaObjectIdentifier};
use snowflake_ddl::objects::database_roles::ShowDatabaseRolesRequest;
use snowflake_ddl::objects::grants::GrantRow;
use snowflake_ddl::objects::warehouses::{
    AlterWarehouseRequest, WarehouseSet, WarehouseSize, WarehouseUnset, WarehousesClient,
};
use snowflake_ddl::record::JsonTable;
use snowflake_ddl::sql::{ExtendedIn, Like, LimitFrom};

/// Minimal stand-in for a live session: replays canned tables.
struct StubExecutor {
    tables: Mutex<Vec<JsonTable>>,
}

impl StubExecutor {
    fn new(tables: Vec<JsonTable>) -> Self {
        Self {
            tables: Mutex::new(tables),
        }
    }
}

#[async_trait]
impl SqlExecutor for StubExecutor {
    async fn exec(&self, _sql: &str) -> Result<()> {
        Ok(())
    }

    async fn query_table(&self, _sql: &str) -> Result<JsonTable> {
        let mut tables = self.tables.lock().unwrap();
        if tables.is_empty() {
            Ok(JsonTable::default())
        } else {
            Ok(tables.remove(0))
        }
    }

    async fn select_scalar(&self, _sql: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

#[test]
fn show_database_roles_with_all_filters() {
    let sql = ShowDatabaseRolesRequest::new()
        .with_like(Like::new("PREF%"))
        .with_in(ExtendedIn::database(AccountObjectIdentifier::new("db1")))
        .with_limit(LimitFrom::from(1, "PREF1"))
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "SHOW DATABASE ROLES LIKE 'PREF%' IN DATABASE \"db1\" LIMIT 1 FROM 'PREF1'"
    );
}

#[test]
fn grant_row_stream_decodes_quirky_booleans() {
    let table = JsonTable::new(
        vec![
            "created_on".into(),
            "privilege".into(),
            "granted_on".into(),
            "name".into(),
            "granted_to".into(),
            "grantee_name".into(),
            "grant_option".into(),
            "granted_by".into(),
        ],
        vec![vec![
            json!("2024-03-01T09:30:00.000 +0000"),
            json!("USAGE"),
            json!("DATABASE"),
            json!("DB1"),
            json!("ROLE"),
            json!("ANALYST"),
            json!("true"),
            json!("SYSADMIN"),
        ]],
    );
    let rows: Vec<GrantRow> = table.decode().unwrap();
    assert!(rows[0].grant_option);
    assert_eq!(rows[0].privilege, "USAGE");
}

#[test]
fn timestamp_ltz_projections() {
    let t = parse_data_type("TIMESTAMP WITH LOCAL TIME ZONE(6)").unwrap();
    assert!(matches!(
        t,
        DataType::TimestampLtz {
            precision: Some(6),
            ..
        }
    ));
    assert_eq!(t.to_legacy_sql(), "TIMESTAMP_LTZ");
    assert_eq!(t.canonical(), "TIMESTAMP_LTZ(6)");
    assert_eq!(t.to_sql(), "TIMESTAMP WITH LOCAL TIME ZONE(6)");
}

#[test]
fn schema_object_identifier_projections() {
    let id: SchemaObjectIdentifier = "\"a\".\"b\".\"c\"".parse().unwrap();
    assert_eq!(id.database_name(), "a");
    assert_eq!(id.schema_name(), "b");
    assert_eq!(id.name(), "c");
    assert_eq!(id.database_id().fully_qualified_name(), "\"a\"");
    assert_eq!(id.schema_id().fully_qualified_name(), "\"a\".\"b\"");
}

#[test]
fn warehouse_set_and_unset_size_is_rejected() {
    let err = AlterWarehouseRequest::new(AccountObjectIdentifier::new("WH"))
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

#[tokio::test]
async fn show_by_id_miss_returns_the_sentinel() {
    let executor = StubExecutor::new(vec![]);
    let client = WarehousesClient::new(&executor);
    let err = client
        .show_by_id(&AccountObjectIdentifier::new("MISSING"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, Error::NotFound));
}

#[tokio::test]
async fn query_one_on_empty_result_is_not_found() {
    let executor = StubExecutor::new(vec![]);
    let result: Result<GrantRow> = executor.query_one("SHOW GRANTS").await;
    assert!(result.unwrap_err().is_not_found());
}

#[test]
fn text_length_ambiguity_is_undetermined() {
    let implicit = parse_data_type("VARCHAR").unwrap();
    let explicit = parse_data_type("VARCHAR(16777216)").unwrap();
    assert_eq!(
        compare_types(&implicit, &explicit),
        TypeComparison::Undetermined
    );
    assert_eq!(
        compare_types(
            &parse_data_type("VARCHAR(10)").unwrap(),
            &parse_data_type("VARCHAR(20)").unwrap()
        ),
        TypeComparison::Different
    );
}

/// Rendered DDL must re-parse under the Snowflake dialect.
#[test]
fn rendered_statements_reparse_under_snowflake_dialect() {
    use snowflake_ddl::objects::databases::{CreateDatabaseRequest, DropDatabaseRequest};
    use snowflake_ddl::objects::roles::{CreateRoleRequest, DropRoleRequest};
    use snowflake_ddl::objects::schemas::{CreateSchemaRequest, DropSchemaRequest};
    use sqlparser::dialect::SnowflakeDialect;
    use sqlparser::parser::Parser;

    let statements = vec![
        CreateDatabaseRequest::new(AccountObjectIdentifier::new("D1"))
            .build()
            .unwrap(),
        CreateSchemaRequest::new(snowflake_ddl::DatabaseObjectIdentifier::new("D1", "S1"))
            .build()
            .unwrap(),
        CreateRoleRequest::new(AccountObjectIdentifier::new("ANALYST"))
            .build()
            .unwrap(),
        DropSchemaRequest::new(snowflake_ddl::DatabaseObjectIdentifier::new("D1", "S1"))
            .with_if_exists()
            .with_cascade()
            .build()
            .unwrap(),
        DropDatabaseRequest::new(AccountObjectIdentifier::new("D1"))
            .with_if_exists()
            .build()
            .unwrap(),
        DropRoleRequest::new(AccountObjectIdentifier::new("ANALYST"))
            .with_if_exists()
            .build()
            .unwrap(),
    ];

    for statement in statements {
        let parsed = Parser::parse_sql(&SnowflakeDialect, &statement);
        assert!(parsed.is_ok(), "failed to re-parse: {statement}");
    }
}
