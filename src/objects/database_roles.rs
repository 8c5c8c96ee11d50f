use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::error::{Error, Result};
use crate::identifier::DatabaseObjectIdentifier;
use crate::record::{DecodeError, FromRecord, RecordRef};
use crate::sql::{ExtendedIn, Like, LimitFrom, RequestError, push_string_property, quote_literal};

#[derive(Debug, Clone)]
pub struct CreateDatabaseRoleRequest {
    name: DatabaseObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    comment: Option<String>,
}

impl CreateDatabaseRoleRequest {
    pub fn new(name: DatabaseObjectIdentifier) -> Self {
        Self {
            name,
            or_replace: false,
            if_not_exists: false,
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
        sql.push_str("DATABASE ROLE ");
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
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct AlterDatabaseRoleRequest {
    name: DatabaseObjectIdentifier,
    if_exists: bool,
    rename_to: Option<DatabaseObjectIdentifier>,
    set_comment: Option<Option<String>>,
}

impl AlterDatabaseRoleRequest {
    pub fn new(name: DatabaseObjectIdentifier) -> Self {
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

    pub fn with_rename_to(mut self, new_name: DatabaseObjectIdentifier) -> Self {
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
        let mut sql = String::from("ALTER DATABASE ROLE ");
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
pub struct DropDatabaseRoleRequest {
    name: DatabaseObjectIdentifier,
    if_exists: bool,
}

impl DropDatabaseRoleRequest {
    pub fn new(name: DatabaseObjectIdentifier) -> Self {
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
        let mut sql = String::from("DROP DATABASE ROLE ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        Ok(sql)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowDatabaseRolesRequest {
    like: Option<Like>,
    in_scope: Option<ExtendedIn>,
    limit: Option<LimitFrom>,
}

impl ShowDatabaseRolesRequest {
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
        let mut sql = String::from("SHOW DATABASE ROLES");
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

/// One row of `SHOW DATABASE ROLES` output.
#[derive(Debug, Clone)]
pub struct DatabaseRoleRow {
    pub created_on: Option<String>,
    pub name: String,
    pub is_default: bool,
    pub is_current: bool,
    pub is_inherited: bool,
    pub granted_to_roles: Option<i64>,
    pub granted_to_database_roles: Option<i64>,
    pub granted_database_roles: Option<i64>,
    pub owner: Option<String>,
    pub comment: Option<String>,
}

impl FromRecord for DatabaseRoleRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(DatabaseRoleRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            is_default: record.get_bool("is_default")?.bool_value(),
            is_current: record.get_bool("is_current")?.bool_value(),
            is_inherited: record.get_bool("is_inherited")?.bool_value(),
            granted_to_roles: record.get_i64("granted_to_roles")?,
            granted_to_database_roles: record.get_i64("granted_to_database_roles")?,
            granted_database_roles: record.get_i64("granted_database_roles")?,
            owner: record.get_string("owner")?,
            comment: record.get_string("comment")?,
        })
    }
}

pub struct DatabaseRolesClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> DatabaseRolesClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateDatabaseRoleRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE DATABASE ROLE", &request.name))
    }

    pub async fn alter(&self, request: &AlterDatabaseRoleRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("ALTER DATABASE ROLE", &request.name))
    }

    pub async fn drop(&self, request: &DropDatabaseRoleRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP DATABASE ROLE", &request.name))
    }

    pub async fn show(&self, request: &ShowDatabaseRolesRequest) -> Result<Vec<DatabaseRoleRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn show_by_id(&self, id: &DatabaseObjectIdentifier) -> Result<DatabaseRoleRow> {
        let request = ShowDatabaseRolesRequest::new()
            .with_like(Like::new(id.name()))
            .with_in(ExtendedIn::database(id.database_id()));
        let rows = self.show(&request).await?;
        rows.into_iter()
            .find(|row| row.name == id.name())
            .ok_or(Error::NotFound)
    }

    /// `GRANT DATABASE ROLE <role> TO {ROLE|DATABASE ROLE} <grantee>`.
    pub async fn grant_database_role(
        &self,
        role: &DatabaseObjectIdentifier,
        grantee: &DatabaseRoleGrantee,
    ) -> Result<()> {
        let mut sql = format!("GRANT DATABASE ROLE {} TO ", role.fully_qualified_name());
        grantee.write_sql(&mut sql);
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("GRANT DATABASE ROLE", role))
    }

    /// `REVOKE DATABASE ROLE <role> FROM {ROLE|DATABASE ROLE} <grantee>`.
    pub async fn revoke_database_role(
        &self,
        role: &DatabaseObjectIdentifier,
        grantee: &DatabaseRoleGrantee,
    ) -> Result<()> {
        let mut sql = format!("REVOKE DATABASE ROLE {} FROM ", role.fully_qualified_name());
        grantee.write_sql(&mut sql);
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("REVOKE DATABASE ROLE", role))
    }
}

/// Grantees of a database role: account roles or other database roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseRoleGrantee {
    Role(crate::identifier::AccountObjectIdentifier),
    DatabaseRole(DatabaseObjectIdentifier),
}

impl DatabaseRoleGrantee {
    fn write_sql(&self, sql: &mut String) {
        match self {
            DatabaseRoleGrantee::Role(role) => {
                sql.push_str("ROLE ");
                sql.push_str(&role.fully_qualified_name());
            }
            DatabaseRoleGrantee::DatabaseRole(role) => {
                sql.push_str("DATABASE ROLE ");
                sql.push_str(&role.fully_qualified_name());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::AccountObjectIdentifier;

    #[test]
    fn show_with_all_filters() {
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
    fn create_and_drop() {
        let id = DatabaseObjectIdentifier::new("D1", "DR1");
        let sql = CreateDatabaseRoleRequest::new(id.clone())
            .with_if_not_exists()
            .build()
            .unwrap();
        assert_eq!(sql, "CREATE DATABASE ROLE IF NOT EXISTS \"D1\".\"DR1\"");

        let sql = DropDatabaseRoleRequest::new(id).with_if_exists().build().unwrap();
        assert_eq!(sql, "DROP DATABASE ROLE IF EXISTS \"D1\".\"DR1\"");
    }
}
