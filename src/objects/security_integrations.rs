use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::error::{Error, Result};
use crate::identifier::AccountObjectIdentifier;
use crate::record::{DecodeError, FromRecord, JsonTable, RecordRef};
use crate::sql::{Like, RequestError, push_bool_property, push_string_property, quote_literal};

/// The integration kinds this client can create. Each variant renders its
/// own `TYPE =` branch with the properties that kind understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityIntegrationVariant {
    /// `TYPE = API_AUTHENTICATION AUTH_TYPE = OAUTH2` with client
    /// credentials flow.
    ApiAuthenticationClientCredentials {
        oauth_token_endpoint: String,
        oauth_client_id: String,
        oauth_client_secret: String,
        oauth_allowed_scopes: Vec<String>,
    },
    /// `TYPE = EXTERNAL_OAUTH` trust of an external identity provider.
    ExternalOauth {
        external_oauth_type: String,
        external_oauth_issuer: String,
        external_oauth_token_user_mapping_claim: Vec<String>,
        external_oauth_snowflake_user_mapping_attribute: String,
    },
    /// `TYPE = SAML2`.
    Saml2 {
        saml2_issuer: String,
        saml2_sso_url: String,
        saml2_provider: String,
        saml2_x509_cert: String,
    },
}

impl SecurityIntegrationVariant {
    fn write_sql(&self, sql: &mut String) {
        match self {
            SecurityIntegrationVariant::ApiAuthenticationClientCredentials {
                oauth_token_endpoint,
                oauth_client_id,
                oauth_client_secret,
                oauth_allowed_scopes,
            } => {
                sql.push_str(" TYPE = API_AUTHENTICATION AUTH_TYPE = OAUTH2");
                sql.push_str(" OAUTH_GRANT = CLIENT_CREDENTIALS OAUTH_TOKEN_ENDPOINT = ");
                sql.push_str(&quote_literal(oauth_token_endpoint));
                sql.push_str(" OAUTH_CLIENT_ID = ");
                sql.push_str(&quote_literal(oauth_client_id));
                sql.push_str(" OAUTH_CLIENT_SECRET = ");
                sql.push_str(&quote_literal(oauth_client_secret));
                if !oauth_allowed_scopes.is_empty() {
                    let quoted: Vec<String> = oauth_allowed_scopes
                        .iter()
                        .map(|s| quote_literal(s))
                        .collect();
                    sql.push_str(&format!(" OAUTH_ALLOWED_SCOPES = ({})", quoted.join(", ")));
                }
            }
            SecurityIntegrationVariant::ExternalOauth {
                external_oauth_type,
                external_oauth_issuer,
                external_oauth_token_user_mapping_claim,
                external_oauth_snowflake_user_mapping_attribute,
            } => {
                sql.push_str(" TYPE = EXTERNAL_OAUTH EXTERNAL_OAUTH_TYPE = ");
                sql.push_str(external_oauth_type);
                sql.push_str(" EXTERNAL_OAUTH_ISSUER = ");
                sql.push_str(&quote_literal(external_oauth_issuer));
                let quoted: Vec<String> = external_oauth_token_user_mapping_claim
                    .iter()
                    .map(|c| quote_literal(c))
                    .collect();
                sql.push_str(&format!(
                    " EXTERNAL_OAUTH_TOKEN_USER_MAPPING_CLAIM = ({})",
                    quoted.join(", ")
                ));
                sql.push_str(" EXTERNAL_OAUTH_SNOWFLAKE_USER_MAPPING_ATTRIBUTE = ");
                sql.push_str(&quote_literal(external_oauth_snowflake_user_mapping_attribute));
            }
            SecurityIntegrationVariant::Saml2 {
                saml2_issuer,
                saml2_sso_url,
                saml2_provider,
                saml2_x509_cert,
            } => {
                sql.push_str(" TYPE = SAML2 SAML2_ISSUER = ");
                sql.push_str(&quote_literal(saml2_issuer));
                sql.push_str(" SAML2_SSO_URL = ");
                sql.push_str(&quote_literal(saml2_sso_url));
                sql.push_str(" SAML2_PROVIDER = ");
                sql.push_str(&quote_literal(saml2_provider));
                sql.push_str(" SAML2_X509_CERT = ");
                sql.push_str(&quote_literal(saml2_x509_cert));
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateSecurityIntegrationRequest {
    name: AccountObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    variant: SecurityIntegrationVariant,
    enabled: Option<bool>,
    comment: Option<String>,
}

impl CreateSecurityIntegrationRequest {
    pub fn new(name: AccountObjectIdentifier, variant: SecurityIntegrationVariant) -> Self {
        Self {
            name,
            or_replace: false,
            if_not_exists: false,
            variant,
            enabled: None,
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

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
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
        sql.push_str("SECURITY INTEGRATION ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        self.variant.write_sql(&mut sql);
        let mut props = Vec::new();
        push_bool_property(&mut props, "ENABLED", &self.enabled);
        push_string_property(&mut props, "COMMENT", &self.comment);
        if !props.is_empty() {
            sql.push(' ');
            sql.push_str(&props.join(" "));
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct AlterSecurityIntegrationRequest {
    name: AccountObjectIdentifier,
    if_exists: bool,
    set_enabled: Option<bool>,
    set_comment: Option<String>,
    unset_comment: bool,
}

impl AlterSecurityIntegrationRequest {
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            name,
            if_exists: false,
            set_enabled: None,
            set_comment: None,
            unset_comment: false,
        }
    }

    pub fn with_if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn with_set_enabled(mut self, enabled: bool) -> Self {
        self.set_enabled = Some(enabled);
        self
    }

    pub fn with_set_comment(mut self, comment: impl Into<String>) -> Self {
        self.set_comment = Some(comment.into());
        self
    }

    pub fn with_unset_comment(mut self) -> Self {
        self.unset_comment = true;
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        if self.set_comment.is_some() && self.unset_comment {
            return Err(RequestError::MutuallyExclusive(
                "set.comment",
                "unset.comment",
            ));
        }
        if self.set_enabled.is_none() && self.set_comment.is_none() && !self.unset_comment {
            return Err(RequestError::MissingField("alter action"));
        }
        let mut sql = String::from("ALTER SECURITY INTEGRATION ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if self.unset_comment {
            sql.push_str(" UNSET COMMENT");
        } else {
            let mut props = Vec::new();
            push_bool_property(&mut props, "ENABLED", &self.set_enabled);
            push_string_property(&mut props, "COMMENT", &self.set_comment);
            sql.push_str(" SET ");
            sql.push_str(&props.join(" "));
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct DropSecurityIntegrationRequest {
    name: AccountObjectIdentifier,
    if_exists: bool,
}

impl DropSecurityIntegrationRequest {
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
        let mut sql = String::from("DROP SECURITY INTEGRATION ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowSecurityIntegrationsRequest {
    like: Option<Like>,
}

impl ShowSecurityIntegrationsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_like(mut self, like: Like) -> Self {
        self.like = Some(like);
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let mut sql = String::from("SHOW SECURITY INTEGRATIONS");
        if let Some(like) = &self.like {
            like.write_sql(&mut sql);
        }
        Ok(sql)
    }
}

/// One row of `SHOW SECURITY INTEGRATIONS` output.
#[derive(Debug, Clone)]
pub struct SecurityIntegrationRow {
    pub created_on: Option<String>,
    pub name: String,
    pub integration_type: String,
    pub category: Option<String>,
    pub enabled: bool,
    pub comment: Option<String>,
}

impl SecurityIntegrationRow {
    pub fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }
}

impl FromRecord for SecurityIntegrationRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(SecurityIntegrationRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            integration_type: record.require_string("type")?,
            category: record.get_string("category")?,
            enabled: record.get_bool("enabled")?.bool_value(),
            comment: record.get_string("comment")?,
        })
    }
}

/// `DESCRIBE SECURITY INTEGRATION` property rows, kept as raw
/// property/value pairs; the attribute set varies per integration type.
#[derive(Debug, Clone)]
pub struct SecurityIntegrationProperty {
    pub property: String,
    pub property_type: Option<String>,
    pub property_value: Option<String>,
    pub property_default: Option<String>,
}

impl SecurityIntegrationProperty {
    pub fn from_table(table: &JsonTable) -> std::result::Result<Vec<Self>, DecodeError> {
        table
            .records()
            .map(|record| {
                Ok(SecurityIntegrationProperty {
                    property: record.require_string("property")?,
                    property_type: record.get_string("property_type")?,
                    property_value: record.get_string("property_value")?,
                    property_default: record.get_string("property_default")?,
                })
            })
            .collect()
    }
}

pub struct SecurityIntegrationsClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> SecurityIntegrationsClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateSecurityIntegrationRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE SECURITY INTEGRATION", &request.name))
    }

    pub async fn alter(&self, request: &AlterSecurityIntegrationRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("ALTER SECURITY INTEGRATION", &request.name))
    }

    pub async fn drop(&self, request: &DropSecurityIntegrationRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP SECURITY INTEGRATION", &request.name))
    }

    pub async fn show(
        &self,
        request: &ShowSecurityIntegrationsRequest,
    ) -> Result<Vec<SecurityIntegrationRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(
        &self,
        id: &AccountObjectIdentifier,
    ) -> Result<SecurityIntegrationRow> {
        let request = ShowSecurityIntegrationsRequest::new().with_like(Like::new(id.name()));
        let rows = self.show(&request).await?;
        rows.into_iter()
            .find(|row| row.name == id.name())
            .ok_or(Error::NotFound)
    }

    pub async fn describe(
        &self,
        id: &AccountObjectIdentifier,
    ) -> Result<Vec<SecurityIntegrationProperty>> {
        let sql = format!(
            "DESCRIBE SECURITY INTEGRATION {}",
            id.fully_qualified_name()
        );
        let table = self
            .executor
            .query_table(&sql)
            .await
            .map_err(|e| e.with_operation("DESCRIBE SECURITY INTEGRATION", id))?;
        if table.is_empty() {
            return Err(Error::NotFound);
        }
        Ok(SecurityIntegrationProperty::from_table(&table)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_api_authentication_integration() {
        let sql = CreateSecurityIntegrationRequest::new(
            AccountObjectIdentifier::new("INT1"),
            SecurityIntegrationVariant::ApiAuthenticationClientCredentials {
                oauth_token_endpoint: "https://idp/token".into(),
                oauth_client_id: "cid".into(),
                oauth_client_secret: "sec".into(),
                oauth_allowed_scopes: vec!["read".into()],
            },
        )
        .with_enabled(true)
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "CREATE SECURITY INTEGRATION \"INT1\" TYPE = API_AUTHENTICATION AUTH_TYPE = OAUTH2 OAUTH_GRANT = CLIENT_CREDENTIALS OAUTH_TOKEN_ENDPOINT = 'https://idp/token' OAUTH_CLIENT_ID = 'cid' OAUTH_CLIENT_SECRET = 'sec' OAUTH_ALLOWED_SCOPES = ('read') ENABLED = TRUE"
        );
    }

    #[test]
    fn alter_set_comment_conflicts_with_unset() {
        let err = AlterSecurityIntegrationRequest::new(AccountObjectIdentifier::new("INT1"))
            .with_set_comment("x")
            .with_unset_comment()
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RequestError::MutuallyExclusive("set.comment", "unset.comment")
        );
    }
}
