use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::datatype::DataType;
use crate::error::{Error, Result};
use crate::identifier::SchemaObjectIdentifier;
use crate::objects::{SignatureArgument, parse_signature, write_signature};
use crate::record::{DecodeError, FromRecord, RecordRef};
use crate::sql::{ExtendedIn, Like, LimitFrom, RequestError, quote_literal, sql_bool};

#[derive(Debug, Clone)]
pub struct CreateMaskingPolicyRequest {
    name: SchemaObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    signature: Vec<SignatureArgument>,
    returns: DataType,
    body: String,
    exempt_other_policies: Option<bool>,
    comment: Option<String>,
}

impl CreateMaskingPolicyRequest {
    pub fn new(
        name: SchemaObjectIdentifier,
        signature: Vec<SignatureArgument>,
        returns: DataType,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name,
            or_replace: false,
            if_not_exists: false,
            signature,
            returns,
            body: body.into(),
            exempt_other_policies: None,
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

    pub fn with_exempt_other_policies(mut self, exempt: bool) -> Self {
        self.exempt_other_policies = Some(exempt);
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
        sql.push_str("MASKING POLICY ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        sql.push_str(" AS ");
        write_signature(&mut sql, &self.signature);
        sql.push_str(" RETURNS ");
        sql.push_str(&self.returns.to_sql());
        sql.push_str(" -> ");
        sql.push_str(&self.body);
        if let Some(exempt) = self.exempt_other_policies {
            sql.push_str(&format!(" EXEMPT_OTHER_POLICIES = {}", sql_bool(exempt)));
        }
        if let Some(comment) = &self.comment {
            sql.push_str(" COMMENT = ");
            sql.push_str(&quote_literal(comment));
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct AlterMaskingPolicyRequest {
    name: SchemaObjectIdentifier,
    if_exists: bool,
    rename_to: Option<SchemaObjectIdentifier>,
    set_body: Option<String>,
    set_comment: Option<Option<String>>,
}

impl AlterMaskingPolicyRequest {
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
        let mut sql = String::from("ALTER MASKING POLICY ");
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
pub struct DropMaskingPolicyRequest {
    name: SchemaObjectIdentifier,
    if_exists: bool,
}

impl DropMaskingPolicyRequest {
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
        let mut sql = String::from("DROP MASKING POLICY ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowMaskingPoliciesRequest {
    like: Option<Like>,
    in_scope: Option<ExtendedIn>,
    limit: Option<LimitFrom>,
}

impl ShowMaskingPoliciesRequest {
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
        let mut sql = String::from("SHOW MASKING POLICIES");
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

/// One row of `SHOW MASKING POLICIES` output.
#[derive(Debug, Clone)]
pub struct MaskingPolicyRow {
    pub created_on: Option<String>,
    pub name: String,
    pub database_name: String,
    pub schema_name: String,
    pub kind: String,
    pub owner: Option<String>,
    pub exempt_other_policies: bool,
    pub comment: Option<String>,
}

impl MaskingPolicyRow {
    pub fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }
}

impl FromRecord for MaskingPolicyRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(MaskingPolicyRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            database_name: record.require_string("database_name")?,
            schema_name: record.require_string("schema_name")?,
            kind: record.get_string("kind")?.unwrap_or_default(),
            owner: record.get_string("owner")?,
            exempt_other_policies: record.get_bool("exempt_other_policies")?.bool_value(),
            comment: record.get_string("comment")?,
        })
    }
}

/// `DESCRIBE MASKING POLICY` output: the signature comes back as one
/// formatted string and is decoded through the typed data-type parser.
#[derive(Debug, Clone)]
pub struct MaskingPolicyDetails {
    pub name: String,
    pub signature: Vec<SignatureArgument>,
    pub return_type: DataType,
    pub body: String,
}

impl FromRecord for MaskingPolicyDetails {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        let signature_raw = record.require_string("signature")?;
        let signature = parse_signature(&signature_raw)
            .map_err(|_| record.invalid_enum("signature", "policy signature", &signature_raw))?;
        let return_raw = record.require_string("return_type")?;
        let return_type = crate::datatype::parse_data_type(&return_raw)
            .map_err(|_| record.invalid_enum("return_type", "data type", &return_raw))?;
        Ok(MaskingPolicyDetails {
            name: record.require_string("name")?,
            signature,
            return_type,
            body: record.require_string("body")?,
        })
    }
}

pub struct MaskingPoliciesClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> MaskingPoliciesClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateMaskingPolicyRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE MASKING POLICY", &request.name))
    }

    pub async fn alter(&self, request: &AlterMaskingPolicyRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("ALTER MASKING POLICY", &request.name))
    }

    pub async fn drop(&self, request: &DropMaskingPolicyRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP MASKING POLICY", &request.name))
    }

    pub async fn show(&self, request: &ShowMaskingPoliciesRequest) -> Result<Vec<MaskingPolicyRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> Result<MaskingPolicyRow> {
        let request = ShowMaskingPoliciesRequest::new()
            .with_like(Like::new(id.name()))
            .with_in(ExtendedIn::schema(id.schema_id()));
        let rows = self.show(&request).await?;
        rows.into_iter()
            .find(|row| row.name == id.name())
            .ok_or(Error::NotFound)
    }

    pub async fn describe(&self, id: &SchemaObjectIdentifier) -> Result<MaskingPolicyDetails> {
        let sql = format!("DESCRIBE MASKING POLICY {}", id.fully_qualified_name());
        self.executor
            .query_one(&sql)
            .await
            .map_err(|e| e.with_operation("DESCRIBE MASKING POLICY", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::RecordingExecutor;
    use crate::datatype::parse_data_type;
    use crate::record::JsonTable;
    use serde_json::json;

    fn policy(name: &str) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("D", "S", name)
    }

    #[test]
    fn create_renders_signature_and_body() {
        let sql = CreateMaskingPolicyRequest::new(
            policy("MASK_EMAIL"),
            vec![SignatureArgument::new(
                "VAL",
                parse_data_type("VARCHAR").unwrap(),
            )],
            parse_data_type("VARCHAR").unwrap(),
            "CASE WHEN CURRENT_ROLE() = 'ANALYST' THEN VAL ELSE '***' END",
        )
        .with_exempt_other_policies(true)
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "CREATE MASKING POLICY \"D\".\"S\".\"MASK_EMAIL\" AS (VAL VARCHAR) RETURNS VARCHAR -> CASE WHEN CURRENT_ROLE() = 'ANALYST' THEN VAL ELSE '***' END EXEMPT_OTHER_POLICIES = TRUE"
        );
    }

    #[test]
    fn create_requires_signature() {
        let err = CreateMaskingPolicyRequest::new(
            policy("P"),
            Vec::new(),
            parse_data_type("VARCHAR").unwrap(),
            "VAL",
        )
        .build()
        .unwrap_err();
        assert_eq!(err, RequestError::MissingField("signature"));
    }

    #[tokio::test]
    async fn describe_routes_signature_through_type_parser() {
        let table = JsonTable::new(
            vec![
                "name".into(),
                "signature".into(),
                "return_type".into(),
                "body".into(),
            ],
            vec![vec![
                json!("MASK_EMAIL"),
                json!("(VAL VARCHAR, N NUMBER)"),
                json!("VARCHAR(16777216)"),
                json!("'***'"),
            ]],
        );
        let executor = RecordingExecutor::with_table(table);
        let client = MaskingPoliciesClient::new(&executor);
        let details = client.describe(&policy("MASK_EMAIL")).await.unwrap();
        assert_eq!(details.signature.len(), 2);
        assert_eq!(details.signature[0].name, "VAL");
        assert!(crate::datatype::are_the_same(
            &details.signature[1].data_type,
            &parse_data_type("NUMBER(38, 0)").unwrap()
        ));
        assert_eq!(details.return_type.to_legacy_sql(), "VARCHAR");
    }
}
