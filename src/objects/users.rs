use indexmap::IndexSet;

use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::error::{Error, Result};
use crate::identifier::AccountObjectIdentifier;
use crate::record::{DecodeError, FromRecord, JsonTable, RecordRef};
use crate::sql::{
    Like, LimitFrom, RequestError, StartsWith, push_bool_property, push_string_property,
    quote_literal,
};

/// `DEFAULT_SECONDARY_ROLES` accepts the markers ALL and NONE, or an
/// explicit role list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecondaryRoles {
    All,
    None,
    Roles(IndexSet<String>),
}

impl SecondaryRoles {
    fn write_sql(&self, props: &mut Vec<String>) {
        let rendered = match self {
            SecondaryRoles::All => "('ALL')".to_string(),
            SecondaryRoles::None => "('NONE')".to_string(),
            SecondaryRoles::Roles(roles) => {
                let quoted: Vec<String> = roles.iter().map(|r| quote_literal(r)).collect();
                format!("({})", quoted.join(", "))
            }
        };
        props.push(format!("DEFAULT_SECONDARY_ROLES = {rendered}"));
    }
}

/// Property bag shared by `CREATE USER` and `ALTER USER ... SET`.
#[derive(Debug, Clone, Default)]
pub struct UserProperties {
    pub login_name: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub must_change_password: Option<bool>,
    pub default_warehouse: Option<AccountObjectIdentifier>,
    /// Database or database.schema; rendered as given.
    pub default_namespace: Option<String>,
    pub default_role: Option<AccountObjectIdentifier>,
    pub default_secondary_roles: Option<SecondaryRoles>,
    pub disabled: Option<bool>,
    pub rsa_public_key: Option<String>,
    pub rsa_public_key_2: Option<String>,
    pub comment: Option<String>,
}

impl UserProperties {
    fn is_empty(&self) -> bool {
        self.render().is_empty()
    }

    fn render(&self) -> Vec<String> {
        let mut props = Vec::new();
        push_string_property(&mut props, "LOGIN_NAME", &self.login_name);
        push_string_property(&mut props, "DISPLAY_NAME", &self.display_name);
        push_string_property(&mut props, "FIRST_NAME", &self.first_name);
        push_string_property(&mut props, "LAST_NAME", &self.last_name);
        push_string_property(&mut props, "EMAIL", &self.email);
        push_string_property(&mut props, "PASSWORD", &self.password);
        push_bool_property(&mut props, "MUST_CHANGE_PASSWORD", &self.must_change_password);
        if let Some(warehouse) = &self.default_warehouse {
            props.push(format!(
                "DEFAULT_WAREHOUSE = {}",
                warehouse.fully_qualified_name()
            ));
        }
        if let Some(namespace) = &self.default_namespace {
            props.push(format!("DEFAULT_NAMESPACE = {namespace}"));
        }
        if let Some(role) = &self.default_role {
            props.push(format!("DEFAULT_ROLE = {}", role.fully_qualified_name()));
        }
        if let Some(secondary) = &self.default_secondary_roles {
            secondary.write_sql(&mut props);
        }
        push_bool_property(&mut props, "DISABLED", &self.disabled);
        push_string_property(&mut props, "RSA_PUBLIC_KEY", &self.rsa_public_key);
        push_string_property(&mut props, "RSA_PUBLIC_KEY_2", &self.rsa_public_key_2);
        push_string_property(&mut props, "COMMENT", &self.comment);
        props
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    name: AccountObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    properties: UserProperties,
}

impl CreateUserRequest {
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            name,
            or_replace: false,
            if_not_exists: false,
            properties: UserProperties::default(),
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

    pub fn with_properties(mut self, properties: UserProperties) -> Self {
        self.properties = properties;
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
        sql.push_str("USER ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        let props = self.properties.render();
        if !props.is_empty() {
            sql.push(' ');
            sql.push_str(&props.join(" "));
        }
        Ok(sql)
    }
}

/// Properties clearable through `ALTER USER ... UNSET`.
#[derive(Debug, Clone, Default)]
pub struct UserUnset {
    pub login_name: bool,
    pub display_name: bool,
    pub first_name: bool,
    pub last_name: bool,
    pub email: bool,
    pub password: bool,
    pub default_warehouse: bool,
    pub default_namespace: bool,
    pub default_role: bool,
    pub default_secondary_roles: bool,
    pub disabled: bool,
    pub rsa_public_key: bool,
    pub rsa_public_key_2: bool,
    pub comment: bool,
}

impl UserUnset {
    fn render(&self) -> Vec<&'static str> {
        let mut props = Vec::new();
        let fields: [(bool, &'static str); 14] = [
            (self.login_name, "LOGIN_NAME"),
            (self.display_name, "DISPLAY_NAME"),
            (self.first_name, "FIRST_NAME"),
            (self.last_name, "LAST_NAME"),
            (self.email, "EMAIL"),
            (self.password, "PASSWORD"),
            (self.default_warehouse, "DEFAULT_WAREHOUSE"),
            (self.default_namespace, "DEFAULT_NAMESPACE"),
            (self.default_role, "DEFAULT_ROLE"),
            (self.default_secondary_roles, "DEFAULT_SECONDARY_ROLES"),
            (self.disabled, "DISABLED"),
            (self.rsa_public_key, "RSA_PUBLIC_KEY"),
            (self.rsa_public_key_2, "RSA_PUBLIC_KEY_2"),
            (self.comment, "COMMENT"),
        ];
        for (set, name) in fields {
            if set {
                props.push(name);
            }
        }
        props
    }
}

#[derive(Debug, Clone)]
pub struct AlterUserRequest {
    name: AccountObjectIdentifier,
    if_exists: bool,
    rename_to: Option<AccountObjectIdentifier>,
    set: Option<UserProperties>,
    unset: Option<UserUnset>,
}

impl AlterUserRequest {
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            name,
            if_exists: false,
            rename_to: None,
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

    pub fn with_set(mut self, set: UserProperties) -> Self {
        self.set = Some(set);
        self
    }

    pub fn with_unset(mut self, unset: UserUnset) -> Self {
        self.unset = Some(unset);
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let set = self.set.as_ref().filter(|s| !s.is_empty());
        let unset = self.unset.as_ref().filter(|u| !u.render().is_empty());
        let actions = [self.rename_to.is_some(), set.is_some(), unset.is_some()]
            .iter()
            .filter(|b| **b)
            .count();
        if actions == 0 {
            return Err(RequestError::MissingField("alter action"));
        }
        if actions > 1 {
            return Err(RequestError::MutuallyExclusive("rename_to/set", "unset"));
        }
        let mut sql = String::from("ALTER USER ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if let Some(new_name) = &self.rename_to {
            sql.push_str(" RENAME TO ");
            sql.push_str(&new_name.fully_qualified_name());
        } else if let Some(set) = set {
            sql.push_str(" SET ");
            sql.push_str(&set.render().join(" "));
        } else if let Some(unset) = unset {
            sql.push_str(" UNSET ");
            sql.push_str(&unset.render().join(", "));
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct DropUserRequest {
    name: AccountObjectIdentifier,
    if_exists: bool,
}

impl DropUserRequest {
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
        let mut sql = String::from("DROP USER ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowUsersRequest {
    like: Option<Like>,
    starts_with: Option<StartsWith>,
    limit: Option<LimitFrom>,
}

impl ShowUsersRequest {
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
        let mut sql = String::from("SHOW USERS");
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

/// One row of `SHOW USERS` output.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub created_on: Option<String>,
    pub name: String,
    pub login_name: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub disabled: bool,
    pub must_change_password: bool,
    pub default_warehouse: Option<String>,
    pub default_namespace: Option<String>,
    pub default_role: Option<String>,
    pub default_secondary_roles: Option<String>,
    pub has_password: bool,
    pub has_rsa_public_key: bool,
    pub comment: Option<String>,
}

impl UserRow {
    pub fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }
}

impl FromRecord for UserRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(UserRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            login_name: record.get_string("login_name")?,
            display_name: record.get_string("display_name")?,
            first_name: record.get_string("first_name")?,
            last_name: record.get_string("last_name")?,
            email: record.get_string("email")?,
            disabled: record.get_bool("disabled")?.bool_value(),
            must_change_password: record.get_bool("must_change_password")?.bool_value(),
            default_warehouse: record.get_string("default_warehouse")?,
            default_namespace: record.get_string("default_namespace")?,
            default_role: record.get_string("default_role")?,
            default_secondary_roles: record.get_string("default_secondary_roles")?,
            has_password: record.get_bool("has_password")?.bool_value(),
            has_rsa_public_key: record.get_bool("has_rsa_public_key")?.bool_value(),
            comment: record.get_string("comment")?,
        })
    }
}

/// Aggregated `DESCRIBE USER` output. The server answers with one
/// property/value row per attribute; empty and `"null"` values read as
/// unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDetails {
    pub login_name: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub default_warehouse: Option<String>,
    pub default_namespace: Option<String>,
    pub default_role: Option<String>,
    pub default_secondary_roles: Option<String>,
    pub disabled: bool,
    pub rsa_public_key: Option<String>,
    pub rsa_public_key_2: Option<String>,
    pub comment: Option<String>,
}

impl UserDetails {
    pub fn from_table(table: &JsonTable) -> std::result::Result<Self, DecodeError> {
        let mut details = UserDetails::default();
        for record in table.records() {
            let property = record.require_string("property")?;
            let value = record.get_string("value")?;
            match property.as_str() {
                "LOGIN_NAME" => details.login_name = value,
                "DISPLAY_NAME" => details.display_name = value,
                "FIRST_NAME" => details.first_name = value,
                "LAST_NAME" => details.last_name = value,
                "EMAIL" => details.email = value,
                "DEFAULT_WAREHOUSE" => details.default_warehouse = value,
                "DEFAULT_NAMESPACE" => details.default_namespace = value,
                "DEFAULT_ROLE" => details.default_role = value,
                "DEFAULT_SECONDARY_ROLES" => details.default_secondary_roles = value,
                "DISABLED" => details.disabled = value.as_deref() == Some("true"),
                "RSA_PUBLIC_KEY" => details.rsa_public_key = value,
                "RSA_PUBLIC_KEY_2" => details.rsa_public_key_2 = value,
                "COMMENT" => details.comment = value,
                _ => {}
            }
        }
        Ok(details)
    }
}

pub struct UsersClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> UsersClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateUserRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE USER", &request.name))
    }

    pub async fn alter(&self, request: &AlterUserRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("ALTER USER", &request.name))
    }

    pub async fn drop(&self, request: &DropUserRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP USER", &request.name))
    }

    pub async fn show(&self, request: &ShowUsersRequest) -> Result<Vec<UserRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> Result<UserRow> {
        let request = ShowUsersRequest::new().with_like(Like::new(id.name()));
        let rows = self.show(&request).await?;
        rows.into_iter()
            .find(|row| row.name == id.name())
            .ok_or(Error::NotFound)
    }

    pub async fn describe(&self, id: &AccountObjectIdentifier) -> Result<UserDetails> {
        let sql = format!("DESCRIBE USER {}", id.fully_qualified_name());
        let table = self
            .executor
            .query_table(&sql)
            .await
            .map_err(|e| e.with_operation("DESCRIBE USER", id))?;
        if table.is_empty() {
            return Err(Error::NotFound);
        }
        Ok(UserDetails::from_table(&table)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::RecordingExecutor;
    use serde_json::json;

    fn user(name: &str) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(name)
    }

    #[test]
    fn create_user_renders_properties_in_order() {
        let sql = CreateUserRequest::new(user("U1"))
            .with_properties(UserProperties {
                login_name: Some("u1@corp".into()),
                default_warehouse: Some(user("WH")),
                default_secondary_roles: Some(SecondaryRoles::All),
                disabled: Some(true),
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE USER \"U1\" LOGIN_NAME = 'u1@corp' DEFAULT_WAREHOUSE = \"WH\" DEFAULT_SECONDARY_ROLES = ('ALL') DISABLED = TRUE"
        );
    }

    #[test]
    fn secondary_role_lists_quote_each_role() {
        let mut props = Vec::new();
        SecondaryRoles::Roles(IndexSet::from(["R1".to_string(), "R2".to_string()]))
            .write_sql(&mut props);
        assert_eq!(props, vec!["DEFAULT_SECONDARY_ROLES = ('R1', 'R2')"]);
    }

    #[test]
    fn alter_user_set_and_unset_are_exclusive() {
        let err = AlterUserRequest::new(user("U1"))
            .with_set(UserProperties {
                email: Some("a@b".into()),
                ..Default::default()
            })
            .with_unset(UserUnset {
                email: true,
                ..Default::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, RequestError::MutuallyExclusive(_, _)));

        let sql = AlterUserRequest::new(user("U1"))
            .with_unset(UserUnset {
                default_role: true,
                comment: true,
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(sql, "ALTER USER \"U1\" UNSET DEFAULT_ROLE, COMMENT");
    }

    #[tokio::test]
    async fn describe_aggregates_property_rows() {
        let table = JsonTable::new(
            vec!["property".into(), "value".into()],
            vec![
                vec![json!("LOGIN_NAME"), json!("u1@corp")],
                vec![json!("DISABLED"), json!("false")],
                vec![json!("DEFAULT_ROLE"), json!("null")],
                vec![json!("EMAIL"), json!("")],
                vec![json!("COMMENT"), json!("hi")],
            ],
        );
        let executor = RecordingExecutor::with_table(table);
        let client = UsersClient::new(&executor);
        let details = client.describe(&user("U1")).await.unwrap();
        assert_eq!(details.login_name.as_deref(), Some("u1@corp"));
        assert!(!details.disabled);
        assert!(details.default_role.is_none());
        assert!(details.email.is_none());
        assert_eq!(details.comment.as_deref(), Some("hi"));
        assert_eq!(executor.executed(), vec!["DESCRIBE USER \"U1\""]);
    }

    #[tokio::test]
    async fn describe_missing_user_is_not_found() {
        let executor = RecordingExecutor::new();
        let client = UsersClient::new(&executor);
        let err = client.describe(&user("NOPE")).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
