use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::error::{Error, Result};
use crate::identifier::{AccountObjectIdentifier, SchemaObjectIdentifier};
use crate::record::{DecodeError, FromRecord, RecordRef};
use crate::scan::scan_string_list;
use crate::sql::{ExtendedIn, Like, RequestError, push_string_property, quote_literal};

fn scopes_list(scopes: &[String]) -> String {
    let quoted: Vec<String> = scopes.iter().map(|s| quote_literal(s)).collect();
    format!("({})", quoted.join(", "))
}

/// The create forms a secret supports; the variant picks the `TYPE =`
/// branch the renderer emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretVariant {
    GenericString {
        secret_string: String,
    },
    BasicAuthentication {
        username: String,
        password: String,
    },
    OAuthClientCredentials {
        api_authentication: AccountObjectIdentifier,
        oauth_scopes: Vec<String>,
    },
}

impl SecretVariant {
    fn write_sql(&self, sql: &mut String) {
        match self {
            SecretVariant::GenericString { secret_string } => {
                sql.push_str(" TYPE = GENERIC_STRING SECRET_STRING = ");
                sql.push_str(&quote_literal(secret_string));
            }
            SecretVariant::BasicAuthentication { username, password } => {
                sql.push_str(" TYPE = PASSWORD USERNAME = ");
                sql.push_str(&quote_literal(username));
                sql.push_str(" PASSWORD = ");
                sql.push_str(&quote_literal(password));
            }
            SecretVariant::OAuthClientCredentials {
                api_authentication,
                oauth_scopes,
            } => {
                sql.push_str(" TYPE = OAUTH2 API_AUTHENTICATION = ");
                sql.push_str(&api_authentication.fully_qualified_name());
                if !oauth_scopes.is_empty() {
                    sql.push_str(" OAUTH_SCOPES = ");
                    sql.push_str(&scopes_list(oauth_scopes));
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateSecretRequest {
    name: SchemaObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    variant: SecretVariant,
    comment: Option<String>,
}

impl CreateSecretRequest {
    pub fn new(name: SchemaObjectIdentifier, variant: SecretVariant) -> Self {
        Self {
            name,
            or_replace: false,
            if_not_exists: false,
            variant,
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
        let mut sql = String::from("CREATE ");
        if self.or_replace {
            sql.push_str("OR REPLACE ");
        }
        sql.push_str("SECRET ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        self.variant.write_sql(&mut sql);
        let mut props = Vec::new();
        push_string_property(&mut props, "COMMENT", &self.comment);
        if !props.is_empty() {
            sql.push(' ');
            sql.push_str(&props.join(" "));
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SecretSet {
    pub secret_string: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub oauth_scopes: Option<Vec<String>>,
    pub comment: Option<String>,
}

impl SecretSet {
    fn is_empty(&self) -> bool {
        self.secret_string.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.oauth_scopes.is_none()
            && self.comment.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct AlterSecretRequest {
    name: SchemaObjectIdentifier,
    if_exists: bool,
    set: Option<SecretSet>,
    unset_comment: bool,
}

impl AlterSecretRequest {
    pub fn new(name: SchemaObjectIdentifier) -> Self {
        Self {
            name,
            if_exists: false,
            set: None,
            unset_comment: false,
        }
    }

    pub fn with_if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn with_set(mut self, set: SecretSet) -> Self {
        self.set = Some(set);
        self
    }

    pub fn with_unset_comment(mut self) -> Self {
        self.unset_comment = true;
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let set = self.set.as_ref().filter(|s| !s.is_empty());
        match (set, self.unset_comment) {
            (Some(_), true) => {
                return Err(RequestError::MutuallyExclusive("set", "unset"));
            }
            (None, false) => return Err(RequestError::MissingField("alter action")),
            _ => {}
        }
        let mut sql = String::from("ALTER SECRET ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if let Some(set) = set {
            let mut props = Vec::new();
            push_string_property(&mut props, "SECRET_STRING", &set.secret_string);
            push_string_property(&mut props, "USERNAME", &set.username);
            push_string_property(&mut props, "PASSWORD", &set.password);
            if let Some(scopes) = &set.oauth_scopes {
                props.push(format!("OAUTH_SCOPES = {}", scopes_list(scopes)));
            }
            push_string_property(&mut props, "COMMENT", &set.comment);
            sql.push_str(" SET ");
            sql.push_str(&props.join(" "));
        } else {
            sql.push_str(" UNSET COMMENT");
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct DropSecretRequest {
    name: SchemaObjectIdentifier,
    if_exists: bool,
}

impl DropSecretRequest {
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
        let mut sql = String::from("DROP SECRET ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowSecretsRequest {
    like: Option<Like>,
    in_scope: Option<ExtendedIn>,
}

impl ShowSecretsRequest {
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
        let mut sql = String::from("SHOW SECRETS");
        if let Some(like) = &self.like {
            like.write_sql(&mut sql);
        }
        if let Some(in_scope) = &self.in_scope {
            in_scope.write_sql(&mut sql)?;
        }
        Ok(sql)
    }
}

/// One row of `SHOW SECRETS` output.
#[derive(Debug, Clone)]
pub struct SecretRow {
    pub created_on: Option<String>,
    pub name: String,
    pub schema_name: String,
    pub database_name: String,
    pub owner: Option<String>,
    pub secret_type: String,
    pub oauth_scopes: Vec<String>,
    pub comment: Option<String>,
}

impl SecretRow {
    pub fn id(&self) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new(&self.database_name, &self.schema_name, &self.name)
    }
}

impl FromRecord for SecretRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        let oauth_scopes = match record.get_string("oauth_scopes")? {
            Some(raw) => scan_string_list(&raw),
            None => Vec::new(),
        };
        Ok(SecretRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            schema_name: record.require_string("schema_name")?,
            database_name: record.require_string("database_name")?,
            owner: record.get_string("owner")?,
            secret_type: record.require_string("secret_type")?,
            oauth_scopes,
            comment: record.get_string("comment")?,
        })
    }
}

pub struct SecretsClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> SecretsClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateSecretRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE SECRET", &request.name))
    }

    pub async fn alter(&self, request: &AlterSecretRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("ALTER SECRET", &request.name))
    }

    pub async fn drop(&self, request: &DropSecretRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP SECRET", &request.name))
    }

    pub async fn show(&self, request: &ShowSecretsRequest) -> Result<Vec<SecretRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(&self, id: &SchemaObjectIdentifier) -> Result<SecretRow> {
        let request = ShowSecretsRequest::new()
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

    fn secret(name: &str) -> SchemaObjectIdentifier {
        SchemaObjectIdentifier::new("D", "S", name)
    }

    #[test]
    fn create_variants_pick_one_branch() {
        let sql = CreateSecretRequest::new(
            secret("SEC1"),
            SecretVariant::GenericString {
                secret_string: "tok'en".into(),
            },
        )
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "CREATE SECRET \"D\".\"S\".\"SEC1\" TYPE = GENERIC_STRING SECRET_STRING = 'tok''en'"
        );

        let sql = CreateSecretRequest::new(
            secret("SEC2"),
            SecretVariant::BasicAuthentication {
                username: "svc".into(),
                password: "pw".into(),
            },
        )
        .with_comment("ci")
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "CREATE SECRET \"D\".\"S\".\"SEC2\" TYPE = PASSWORD USERNAME = 'svc' PASSWORD = 'pw' COMMENT = 'ci'"
        );

        let sql = CreateSecretRequest::new(
            secret("SEC3"),
            SecretVariant::OAuthClientCredentials {
                api_authentication: AccountObjectIdentifier::new("INT1"),
                oauth_scopes: vec!["read".into(), "write".into()],
            },
        )
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "CREATE SECRET \"D\".\"S\".\"SEC3\" TYPE = OAUTH2 API_AUTHENTICATION = \"INT1\" OAUTH_SCOPES = ('read', 'write')"
        );
    }

    #[test]
    fn alter_set_or_unset() {
        let sql = AlterSecretRequest::new(secret("SEC1"))
            .with_set(SecretSet {
                secret_string: Some("new".into()),
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "ALTER SECRET \"D\".\"S\".\"SEC1\" SET SECRET_STRING = 'new'"
        );

        assert!(AlterSecretRequest::new(secret("SEC1"))
            .with_set(SecretSet {
                comment: Some("x".into()),
                ..Default::default()
            })
            .with_unset_comment()
            .build()
            .is_err());
    }
}
