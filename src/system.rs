use crate::client::SqlExecutor;
use crate::error::Result;
use crate::identifier::SchemaObjectIdentifier;
use crate::objects::ObjectType;
use crate::sql::quote_literal;

/// Scalar `SYSTEM$...` and context functions. These ride the SELECT path,
/// which the server answers in Arrow.
pub struct SystemFunctions<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> SystemFunctions<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// `SYSTEM$GET_TAG`: the tag value attached to an object, or None when
    /// the tag is not set there.
    pub async fn get_tag(
        &self,
        tag: &SchemaObjectIdentifier,
        object_name: &str,
        object_type: ObjectType,
    ) -> Result<Option<String>> {
        let sql = format!(
            "SELECT SYSTEM$GET_TAG({}, {}, {})",
            quote_literal(&tag.fully_qualified_name()),
            quote_literal(object_name),
            quote_literal(&object_type.to_string()),
        );
        let value = self.executor.select_scalar(&sql).await?;
        Ok(value.filter(|v| !v.is_empty() && v != "null"))
    }

    pub async fn current_account(&self) -> Result<Option<String>> {
        self.executor.select_scalar("SELECT CURRENT_ACCOUNT()").await
    }

    pub async fn current_role(&self) -> Result<Option<String>> {
        self.executor.select_scalar("SELECT CURRENT_ROLE()").await
    }

    pub async fn current_region(&self) -> Result<Option<String>> {
        self.executor.select_scalar("SELECT CURRENT_REGION()").await
    }

    /// `GET_DDL` for an object. The server returns the object's DDL
    /// recursively; only the first statement is the object's own.
    pub async fn get_ddl(
        &self,
        object_type: ObjectType,
        name: &str,
    ) -> Result<Option<String>> {
        let sql = format!(
            "SELECT GET_DDL({}, {})",
            quote_literal(&object_type.to_string()),
            quote_literal(name),
        );
        let Some(ddl) = self.executor.select_scalar(&sql).await? else {
            return Ok(None);
        };
        let mut first_statement = ddl
            .split(';')
            .next()
            .unwrap_or_default()
            .to_string();
        first_statement.push_str(";\n");
        Ok(Some(first_statement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::RecordingExecutor;
    use crate::record::JsonTable;
    use serde_json::json;

    fn scalar_table(value: &str) -> JsonTable {
        JsonTable::new(vec!["value".into()], vec![vec![json!(value)]])
    }

    #[tokio::test]
    async fn get_tag_quotes_every_argument() {
        let executor = RecordingExecutor::with_table(scalar_table("finance"));
        let system = SystemFunctions::new(&executor);
        let value = system
            .get_tag(
                &SchemaObjectIdentifier::new("D", "S", "COST_CENTER"),
                "\"WH\"",
                ObjectType::Warehouse,
            )
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("finance"));
        assert_eq!(
            executor.executed(),
            vec![
                "SELECT SYSTEM$GET_TAG('\"D\".\"S\".\"COST_CENTER\"', '\"WH\"', 'WAREHOUSE')"
            ]
        );
    }

    #[tokio::test]
    async fn get_ddl_truncates_to_first_statement() {
        let executor = RecordingExecutor::with_table(scalar_table(
            "create or replace database D;\ncreate schema D.S;",
        ));
        let system = SystemFunctions::new(&executor);
        let ddl = system
            .get_ddl(ObjectType::Database, "D")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ddl, "create or replace database D;\n");
    }
}
