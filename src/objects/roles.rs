use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::error::{Error, Result};
use crate::identifier::AccountObjectIdentifier;
use crate::objects::{TagAssociation, write_tag_clause};
use crate::record::{DecodeError, FromRecord, RecordRef};
use crate::sql::{Like, LimitFrom, RequestError, StartsWith, push_string_property, quote_literal};

#[derive(Debug, Clone)]
pub struct CreateRoleRequest {
    name: AccountObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    comment: Option<String>,
    tags: Vec<TagAssociation>,
}

impl CreateRoleRequest {
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            name,
            or_replace: false,
            if_not_exists: false,
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
        sql.push_str("ROLE ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        let mut props = Vec::new();
        push_string_property(&mut props, "COMMENT", &self.comment);
        if !props.is_empty() {
            sql.push(' ');
            sql.push_str(&props.join(" "));
        }
        write_tag_clause(&mut sql, &self.tags);
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct AlterRoleRequest {
    name: AccountObjectIdentifier,
    if_exists: bool,
    rename_to: Option<AccountObjectIdentifier>,
    set_comment: Option<Option<String>>,
}

impl AlterRoleRequest {
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            name,
            if_exists: false,
            rename_to: None,
            set_comment: None,
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

    /// `Some(text)` sets the comment, `None` unsets it.
    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.set_comment = Some(comment);
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        match (&self.rename_to, &self.set_comment) {
            (Some(_), Some(_)) => {
                return Err(RequestError::MutuallyExclusive("rename_to", "comment"));
            }
            (None, None) => return Err(RequestError::MissingField("alter action")),
            _ => {}
        }
        let mut sql = String::from("ALTER ROLE ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if let Some(new_name) = &self.rename_to {
            sql.push_str(" RENAME TO ");
            sql.push_str(&new_name.fully_qualified_name());
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
pub struct DropRoleRequest {
    name: AccountObjectIdentifier,
    if_exists: bool,
}

impl DropRoleRequest {
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
        let mut sql = String::from("DROP ROLE ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowRolesRequest {
    like: Option<Like>,
    starts_with: Option<StartsWith>,
    limit: Option<LimitFrom>,
}

impl ShowRolesRequest {
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
        let mut sql = String::from("SHOW ROLES");
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

/// The two kinds of grantee a role can be granted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleGrantee {
    User(AccountObjectIdentifier),
    Role(AccountObjectIdentifier),
}

impl RoleGrantee {
    fn write_sql(&self, sql: &mut String) {
        match self {
            RoleGrantee::User(user) => {
                sql.push_str("USER ");
                sql.push_str(&user.fully_qualified_name());
            }
            RoleGrantee::Role(role) => {
                sql.push_str("ROLE ");
                sql.push_str(&role.fully_qualified_name());
            }
        }
    }
}

/// One row of `SHOW ROLES` output.
#[derive(Debug, Clone)]
pub struct RoleRow {
    pub created_on: Option<String>,
    pub name: String,
    pub is_default: bool,
    pub is_current: bool,
    pub is_inherited: bool,
    pub assigned_to_users: Option<i64>,
    pub granted_to_roles: Option<i64>,
    pub granted_roles: Option<i64>,
    pub owner: Option<String>,
    pub comment: Option<String>,
}

impl RoleRow {
    pub fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }
}

impl FromRecord for RoleRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(RoleRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            is_default: record.get_bool("is_default")?.bool_value(),
            is_current: record.get_bool("is_current")?.bool_value(),
            is_inherited: record.get_bool("is_inherited")?.bool_value(),
            assigned_to_users: record.get_i64("assigned_to_users")?,
            granted_to_roles: record.get_i64("granted_to_roles")?,
            granted_roles: record.get_i64("granted_roles")?,
            owner: record.get_string("owner")?,
            comment: record.get_string("comment")?,
        })
    }
}

pub struct RolesClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> RolesClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateRoleRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE ROLE", &request.name))
    }

    pub async fn alter(&self, request: &AlterRoleRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("ALTER ROLE", &request.name))
    }

    pub async fn drop(&self, request: &DropRoleRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP ROLE", &request.name))
    }

    pub async fn show(&self, request: &ShowRolesRequest) -> Result<Vec<RoleRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> Result<RoleRow> {
        let request = ShowRolesRequest::new().with_like(Like::new(id.name()));
        let rows = self.show(&request).await?;
        rows.into_iter()
            .find(|row| row.name == id.name())
            .ok_or(Error::NotFound)
    }

    /// `GRANT ROLE <role> TO {USER|ROLE} <grantee>`.
    pub async fn grant_role(
        &self,
        role: &AccountObjectIdentifier,
        grantee: &RoleGrantee,
    ) -> Result<()> {
        let mut sql = format!("GRANT ROLE {} TO ", role.fully_qualified_name());
        grantee.write_sql(&mut sql);
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("GRANT ROLE", role))
    }

    /// `REVOKE ROLE <role> FROM {USER|ROLE} <grantee>`.
    pub async fn revoke_role(
        &self,
        role: &AccountObjectIdentifier,
        grantee: &RoleGrantee,
    ) -> Result<()> {
        let mut sql = format!("REVOKE ROLE {} FROM ", role.fully_qualified_name());
        grantee.write_sql(&mut sql);
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("REVOKE ROLE", role))
    }

    /// `USE ROLE` for the current session.
    pub async fn use_role(&self, id: &AccountObjectIdentifier) -> Result<()> {
        let sql = format!("USE ROLE {}", id.fully_qualified_name());
        self.executor.exec(&sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::RecordingExecutor;

    fn role(name: &str) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(name)
    }

    #[test]
    fn create_role_with_comment() {
        let sql = CreateRoleRequest::new(role("ANALYST"))
            .with_comment("read only")
            .build()
            .unwrap();
        assert_eq!(sql, "CREATE ROLE \"ANALYST\" COMMENT = 'read only'");
    }

    #[test]
    fn alter_role_comment_branches() {
        let sql = AlterRoleRequest::new(role("ANALYST"))
            .with_comment(Some("x".into()))
            .build()
            .unwrap();
        assert_eq!(sql, "ALTER ROLE \"ANALYST\" SET COMMENT = 'x'");

        let sql = AlterRoleRequest::new(role("ANALYST"))
            .with_comment(None)
            .build()
            .unwrap();
        assert_eq!(sql, "ALTER ROLE \"ANALYST\" UNSET COMMENT");

        assert!(AlterRoleRequest::new(role("ANALYST")).build().is_err());
    }

    #[tokio::test]
    async fn grant_and_revoke_role() {
        let executor = RecordingExecutor::new();
        let client = RolesClient::new(&executor);
        client
            .grant_role(&role("ANALYST"), &RoleGrantee::User(role("U1")))
            .await
            .unwrap();
        client
            .revoke_role(&role("ANALYST"), &RoleGrantee::Role(role("PARENT")))
            .await
            .unwrap();
        assert_eq!(
            executor.executed(),
            vec![
                "GRANT ROLE \"ANALYST\" TO USER \"U1\"",
                "REVOKE ROLE \"ANALYST\" FROM ROLE \"PARENT\"",
            ]
        );
    }
}
