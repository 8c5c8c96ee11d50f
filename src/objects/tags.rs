use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::error::{Error, Result};
use crate::identifier::SchemaObjectIdentifier;
use crate::sql::{ExtendedIn, Like, RequestError, quote_literal};
use crate::record::{DecodeError, FromRecord, RecordRef};
use crate::scan::scan_string_list;

fn allowed_values_list(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| quote_literal(v)).collect();
    quoted.join(", ")
}

#[derive(Debug, Clone)]
pub struct CreateTagRequest {
    name: SchemaObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    allowed_values: Option<Vec<String>>,
    comment: Option<String>,
}

impl CreateTagRequest {
    pub fn new(name: SchemaObjectIdentifier) -> Self {
        Self {
            name,
            or_replace: false,
            if_not_exists: false,
            allowed_values: None,
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

    pub fn with_allowed_values(mut self, values: Vec<String>) -> Self {
        self.allowed_values = Some(values);
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
        sql.push_str("TAG ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if let Some(values) = &self.allowed_values {
            sql.push_str(" ALLOWED_VALUES ");
            sql.push_str(&allowed_values_list(values));
        }
        if let Some(comment) = &self.comment {
            sql.push_str(" COMMENT = ");
            sql.push_str(&quote_literal(comment));
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct AlterTagRequest {
    name: SchemaObjectIdentifier,
    if_exists: bool,
    rename_to: Option<SchemaObjectIdentifier>,
    add_allowed_values: Option<Vec<String>>,
    drop_allowed_values: Option<Vec<String>>,
    unset_allowed_values: bool,
    set_comment: Option<Option<String>>,
}

impl AlterTagRequest {
    pub fn new(name: SchemaObjectIdentifier) -> Self {
        Self {
            name,
            if_exists: false,
            rename_to: None,
            add_allowed_values: None,
            drop_allowed_values: None,
            unset_allowed_values: false,
            set_comment: None,
        }
    }

    pub fn with_if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn with_rename_to(mut self, new_name: SchemaObjectIdentifier) -> Self {
        self.rename_to = Some(new_name);
        self
    }

    pub fn with_add_allowed_values(mut self, values: Vec<String>) -> Self {
        self.add_allowed_values = Some(values);
        self
    }

    pub fn with_drop_allowed_values(mut self, values: Vec<String>) -> Self {
        self.drop_allowed_values = Some(values);
        self
    }

    pub fn with_unset_allowed_values(mut self) -> Self {
        self.unset_allowed_values = true;
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
            self.add_allowed_values.is_some(),
            self.drop_allowed_values.is_some(),
            self.unset_allowed_values,
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
                "rename_to/allowed_values",
                "comment",
            ));
        }
        let mut sql = String::from("ALTER TAG ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if let Some(new_name) = &self.rename_to {
            sql.push_str(" RENAME TO ");
            sql.push_str(&new_name.fully_qualified_name());
        } else if let Some(values) = &self.add_allowed_values {
            sql.push_str(" ADD ALLOWED_VALUES ");
            sql.push_str(&allowed_values_list(values));
        } else if let Some(values) = &self.drop_allowed_values {
            sql.push_str(" DROP ALLOWED_VALUES ");
            sql.push_str(&allowed_values_list(values));
        } else if self.unset_allowed_values {
            sql.push_str(" UNSET ALLOWED_VALUES");
        } else if let Some(comment) = &self.set_comment {
            match comment {
                Some(text) => {
                    sql.push_str(" SET COMMENT = ");
                    sql.push_str(&quote_literal(text));
                }
                None => sql.push_str(" UNSET COMMENT"),
            }
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct DropTagRequest {
    name: SchemaObjectIdentifier,
    if_exists: bool,
}

impl DropTagRequest {
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
        let mut sql = String::from("DROP TAG ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowTagsRequest {
    like: Option<Like>,
    in_scope: Option<ExtendedIn>,
}

impl ShowTagsRequest {
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
        let mut sql = String::from("SHOW TAGS");
        if let Some(like) = &self.like {
            like.write_sql(&mut sql);
        }
        if let Some(in_scope) = &self.in_scope {
            in_scope.write_sql(&mut sql)?;
        }
        Ok(sql)
    }
}

/// One row of `SHOW TAGS` output. `allowed_values` is a bracketed list
/// column.
#[derive(Debug, Clone)]
pub struct TagRow {
    pub created_on: Option<String>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub allowed_values: Vec<String>,
}

impl TagRow {
    pub fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }
}

impl FromRecord for TagRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        let allowed_values = match record.get_string("allowed_values")? {
            Some(raw) => scan_string_list(&raw)
                .into_iter()
                .map(|v| v.trim_matches('"').to_string())
                .collect(),
            None => Vec::new(),
        };
        Ok(TagRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            database_name: record.require_string("database_name")?,
            schema_name: record.require_string("schema_name")?,
            owner: record.get_string("owner")?,
            comment: record.get_string("comment")?,
            allowed_values,
        })
    }
}

pub struct TagsClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> TagsClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateTagRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE TAG", &request.name))
    }

    pub async fn alter(&self, request: &AlterTagRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("ALTER TAG", &request.name))
    }

    pub async fn drop(&self, request: &DropTagRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP TAG", &request.name))
    }

    pub async fn show(&self, request: &ShowTagsRequest) -> Result<Vec<TagRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> Result<TagRow> {
        let request = ShowTagsRequest::new()
            .with_like(Like::new(id.name()))
            .with_in(ExtendedIn::schema(id.schema_id()));
        let rows = self.show(&request).await?;
        rows.into_iter()
            .find(|row| row.name == id.name())
            .ok_or(Error::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::JsonTable;
    use serde_json::json;

    fn tag(name: &str) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("D", "S", name)
    }

    #[test]
    fn create_with_allowed_values() {
        let sql = CreateTagRequest::new(tag("COST_CENTER"))
            .with_allowed_values(vec!["finance".into(), "engineering".into()])
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TAG \"D\".\"S\".\"COST_CENTER\" ALLOWED_VALUES 'finance', 'engineering'"
        );
    }

    #[test]
    fn alter_allowed_values_branches() {
        let sql = AlterTagRequest::new(tag("T"))
            .with_add_allowed_values(vec!["x".into()])
            .build()
            .unwrap();
        assert_eq!(sql, "ALTER TAG \"D\".\"S\".\"T\" ADD ALLOWED_VALUES 'x'");

        let sql = AlterTagRequest::new(tag("T"))
            .with_unset_allowed_values()
            .build()
            .unwrap();
        assert_eq!(sql, "ALTER TAG \"D\".\"S\".\"T\" UNSET ALLOWED_VALUES");

        assert!(AlterTagRequest::new(tag("T"))
            .with_add_allowed_values(vec!["x".into()])
            .with_comment(None)
            .build()
            .is_err());
    }

    #[test]
    fn tag_row_decodes_allowed_values_list() {
        let table = JsonTable::new(
            vec![
                "created_on".into(),
                "name".into(),
                "database_name".into(),
                "schema_name".into(),
                "owner".into(),
                "comment".into(),
                "allowed_values".into(),
            ],
            vec![vec![
                json!("2024-01-02T15:04:05.000 -0700"),
                json!("COST_CENTER"),
                json!("D"),
                json!("S"),
                json!("SYSADMIN"),
                json!(""),
                json!("[\"finance\", \"engineering\"]"),
            ]],
        );
        let rows: Vec<TagRow> = table.decode().unwrap();
        assert_eq!(rows[0].allowed_values, vec!["finance", "engineering"]);
        assert_eq!(
            rows[0].id().fully_qualified_name(),
            "\"D\".\"S\".\"COST_CENTER\""
        );
    }
}
