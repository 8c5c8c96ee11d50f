use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::datatype::DataType;
use crate::error::{Error, Result};
use crate::identifier::SchemaObjectIdentifier;
use crate::objects::{SignatureArgument, parse_signature, write_signature};
use crate::record::{DecodeError, FromRecord, RecordRef};
use crate::sql::{ExtendedIn, Like, LimitFrom, RequestError, quote_literal};

/// Row access policies always return BOOLEAN; only the signature and body
/// vary.
#[derive(Debug, Clone)]
pub struct CreateRowAccessPolicyRequest {
    name: SchemaObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    signature: Vec<SignatureArgument>,
    body: String,
    comment: Option<String>,
}

impl CreateRowAccessPolicyRequest {
    pub fn new(
        name: SchemaObjectIdentifier,
        signature: Vec<SignatureArgument>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name,
            or_replace: false,
            if_not_exists: false,
            signature,
            body: body.into(),
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
        if self.signature.is_empty() {
            return Err(RequestError::MissingField("signature"));
        }
        if self.body.is_empty() {
            return Err(RequestError::MissingField("body"));
        }
        let mut sql = String::from("CREATE ");
        if self.or_replace {
            sql.push_str("OR REPLACE ");
        }
        sql.push_str("ROW ACCESS POLICY ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        sql.push_str(" AS ");
        write_signature(&mut sql, &self.signature);
        sql.push_str(" RETURNS BOOLEAN -> ");
        sql.push_str(&self.body);
        if let Some(comment) = &self.comment {
            sql.push_str(" COMMENT = ");
            sql.push_str(&quote_literal(comment));
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct AlterRowAccessPolicyRequest {
    name: SchemaObjectIdentifier,
    if_exists: bool,
    rename_to: Option<SchemaObjectIdentifier>,
    set_body: Option<String>,
    set_comment: Option<Option<String>>,
}

impl AlterRowAccessPolicyRequest {
    pub fn new(name: SchemaObjectIdentifier) -> Self {
        Self {
            name,
            if_exists: false,
            rename_to: None,
            set_body: None,
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

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.set_body = Some(body.into());
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
            self.set_body.is_some(),
            self.set_comment.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count();
        if actions == 0 {
            return Err(RequestError::MissingField("alter action"));
        }
        if actions > 1 {
            return Err(RequestError::MutuallyExclusive("rename_to/body", "comment"));
        }
        let mut sql = String::from("ALTER ROW ACCESS POLICY ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if let Some(new_name) = &self.rename_to {
            sql.push_str(" RENAME TO ");
            sql.push_str(&new_name.fully_qualified_name());
        } else if let Some(body) = &self.set_body {
            sql.push_str(" SET BODY -> ");
            sql.push_str(body);
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
pub struct DropRowAccessPolicyRequest {
    name: SchemaObjectIdentifier,
    if_exists: bool,
}

impl DropRowAccessPolicyRequest {
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
        let mut sql = String::from("DROP ROW ACCESS POLICY ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowRowAccessPoliciesRequest {
    like: Option<Like>,
    in_scope: Option<ExtendedIn>,
    limit: Option<LimitFrom>,
}

impl ShowRowAccessPoliciesRequest {
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

    pub fn with_limit(mut self, limit: LimitFrom) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let mut sql = String::from("SHOW ROW ACCESS POLICIES");
        if let Some(like) = &self.like {
            like.write_sql(&mut sql);
        }
        if let Some(in_scope) = &self.in_scope {
            in_scope.write_sql(&mut sql)?;
        }
        if let Some(limit) = &self.limit {
            limit.write_sql(&mut sql);
        }
        Ok(sql)
    }
}

/// One row of `SHOW ROW ACCESS POLICIES` output.
#[derive(Debug, Clone)]
pub struct RowAccessPolicyRow {
    pub created_on: Option<String>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub kind: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
}

impl RowAccessPolicyRow {
    pub fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }
}

impl FromRecord for RowAccessPolicyRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(RowAccessPolicyRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            database_name: record.require_string("database_name")?,
            schema_name: record.require_string("schema_name")?,
            kind: record.get_string("kind")?.unwrap_or_default(),
            owner: record.get_string("owner")?,
            comment: record.get_string("comment")?,
        })
    }
}

/// `DESCRIBE ROW ACCESS POLICY` output with the signature decoded through
/// the typed data-type parser.
#[derive(Debug, Clone)]
pub struct RowAccessPolicyDetails {
    pub name: String,
    pub signature: Vec<SignatureArgument>,
    pub return_type: DataType,
    pub body: String,
}

impl FromRecord for RowAccessPolicyDetails {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        let signature_raw = record.require_string("signature")?;
        let signature = parse_signature(&signature_raw)
            .map_err(|_| record.invalid_enum("signature", "policy signature", &signature_raw))?;
        let return_raw = record.require_string("return_type")?;
        let return_type = crate::datatype::parse_data_type(&return_raw)
            .map_err(|_| record.invalid_enum("return_type", "data type", &return_raw))?;
        Ok(RowAccessPolicyDetails {
            name: record.require_string("name")?,
            signature,
            return_type,
            body: record.require_string("body")?,
        })
    }
}

pub struct RowAccessPoliciesClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> RowAccessPoliciesClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateRowAccessPolicyRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE ROW ACCESS POLICY", &request.name))
    }

    pub async fn alter(&self, request: &AlterRowAccessPolicyRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("ALTER ROW ACCESS POLICY", &request.name))
    }

    pub async fn drop(&self, request: &DropRowAccessPolicyRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP ROW ACCESS POLICY", &request.name))
    }

    pub async fn show(
        &self,
        request: &ShowRowAccessPoliciesRequest,
    ) -> Result<Vec<RowAccessPolicyRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> Result<RowAccessPolicyRow> {
        let request = ShowRowAccessPoliciesRequest::new()
            .with_like(Like::new(id.name()))
            .with_in(ExtendedIn::schema(id.schema_id()));
        let rows = self.show(&request).await?;
        rows.into_iter()
            .find(|row| row.name == id.name())
            .ok_or(Error::NotFound)
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> Result<RowAccessPolicyDetails> {
        let sql = format!("DESCRIBE ROW ACCESS POLICY {}", id.fully_qualified_name());
        self.executor
            .query_one(&sql)
            .await
            .map_err(|e| e.with_operation("DESCRIBE ROW ACCESS POLICY", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::parse_data_type;

    #[test]
    fn create_renders_boolean_return() {
        let sql = CreateRowAccessPolicyRequest::new(
            SchemaObjectIdentifier::new("D", "S", "RAP"),
            vec![SignatureArgument::new(
                "REGION",
                parse_data_type("VARCHAR").unwrap(),
            )],
            "REGION = CURRENT_REGION()",
        )
        .with_or_replace()
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "CREATE OR REPLACE ROW ACCESS POLICY \"D\".\"S\".\"RAP\" AS (REGION VARCHAR) RETURNS BOOLEAN -> REGION = CURRENT_REGION()"
        );
    }
}
