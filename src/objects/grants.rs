use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::error::{Error, Result};
use crate::identifier::{
    AccountObjectIdentifier, DatabaseObjectIdentifier, SchemaObjectIdentifier,
};
use crate::objects::ObjectType;
use crate::record::{DecodeError, FromRecord, RecordRef};
use crate::sql::RequestError;

/// A grant target name at any level of the identifier hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectName {
    AccountLevel(AccountObjectIdentifier),
    DatabaseLevel(DatabaseObjectIdentifier),
    SchemaLevel(SchemaObjectIdentifier),
}

impl ObjectName {
    pub fn fully_qualified_name(&self) -> String {
        match self {
            ObjectName::AccountLevel(id) => id.fully_qualified_name(),
            ObjectName::DatabaseLevel(id) => id.fully_qualified_name(),
            ObjectName::SchemaLevel(id) => id.fully_qualified_name(),
        }
    }
}

/// `SHOW GRANTS ON ...` branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowGrantsOn {
    Account,
    Object {
        object_type: ObjectType,
        name: ObjectName,
    },
}

/// `SHOW GRANTS TO ...` branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowGrantsTo {
    Role(AccountObjectIdentifier),
    User(AccountObjectIdentifier),
    Share(AccountObjectIdentifier),
    DatabaseRole(DatabaseObjectIdentifier),
}

/// `SHOW GRANTS OF ...` branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowGrantsOf {
    Role(AccountObjectIdentifier),
    Share(AccountObjectIdentifier),
    DatabaseRole(DatabaseObjectIdentifier),
}

/// `SHOW FUTURE GRANTS IN ...` branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowFutureGrantsIn {
    Database(AccountObjectIdentifier),
    Schema(DatabaseObjectIdentifier),
}

/// `SHOW FUTURE GRANTS TO ...` branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowFutureGrantsTo {
    Role(AccountObjectIdentifier),
    DatabaseRole(DatabaseObjectIdentifier),
}

/// One request covers every SHOW GRANTS variant; the renderer emits the
/// single branch that is set, and plain `SHOW GRANTS` when none is.
#[derive(Debug, Clone, Default)]
pub struct ShowGrantsRequest {
    on: Option<ShowGrantsOn>,
    to: Option<ShowGrantsTo>,
    of: Option<ShowGrantsOf>,
    future_in: Option<ShowFutureGrantsIn>,
    future_to: Option<ShowFutureGrantsTo>,
}

impl ShowGrantsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_on(mut self, on: ShowGrantsOn) -> Self {
        self.on = Some(on);
        self
    }

    pub fn with_to(mut self, to: ShowGrantsTo) -> Self {
        self.to = Some(to);
        self
    }

    pub fn with_of(mut self, of: ShowGrantsOf) -> Self {
        self.of = Some(of);
        self
    }

    pub fn with_future_in(mut self, future_in: ShowFutureGrantsIn) -> Self {
        self.future_in = Some(future_in);
        self
    }

    pub fn with_future_to(mut self, future_to: ShowFutureGrantsTo) -> Self {
        self.future_to = Some(future_to);
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let branches = [
            self.on.is_some(),
            self.to.is_some(),
            self.of.is_some(),
            self.future_in.is_some(),
            self.future_to.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count();
        if branches > 1 {
            return Err(RequestError::ExactlyOneOf(
                "on, to, of, future_in, future_to",
            ));
        }

        let mut sql = String::from("SHOW ");
        if self.future_in.is_some() || self.future_to.is_some() {
            sql.push_str("FUTURE ");
        }
        sql.push_str("GRANTS");
        if let Some(on) = &self.on {
            match on {
                ShowGrantsOn::Account => sql.push_str(" ON ACCOUNT"),
                ShowGrantsOn::Object { object_type, name } => {
                    sql.push_str(&format!(
                        " ON {object_type} {}",
                        name.fully_qualified_name()
                    ));
                }
            }
        } else if let Some(to) = &self.to {
            match to {
                ShowGrantsTo::Role(role) => {
                    sql.push_str(&format!(" TO ROLE {}", role.fully_qualified_name()));
                }
                ShowGrantsTo::User(user) => {
                    sql.push_str(&format!(" TO USER {}", user.fully_qualified_name()));
                }
                ShowGrantsTo::Share(share) => {
                    sql.push_str(&format!(" TO SHARE {}", share.fully_qualified_name()));
                }
                ShowGrantsTo::DatabaseRole(role) => {
                    sql.push_str(&format!(" TO DATABASE ROLE {}", role.fully_qualified_name()));
                }
            }
        } else if let Some(of) = &self.of {
            match of {
                ShowGrantsOf::Role(role) => {
                    sql.push_str(&format!(" OF ROLE {}", role.fully_qualified_name()));
                }
                ShowGrantsOf::Share(share) => {
                    sql.push_str(&format!(" OF SHARE {}", share.fully_qualified_name()));
                }
                ShowGrantsOf::DatabaseRole(role) => {
                    sql.push_str(&format!(" OF DATABASE ROLE {}", role.fully_qualified_name()));
                }
            }
        } else if let Some(future_in) = &self.future_in {
            match future_in {
                ShowFutureGrantsIn::Database(db) => {
                    sql.push_str(&format!(" IN DATABASE {}", db.fully_qualified_name()));
                }
                ShowFutureGrantsIn::Schema(schema) => {
                    sql.push_str(&format!(" IN SCHEMA {}", schema.fully_qualified_name()));
                }
            }
        } else if let Some(future_to) = &self.future_to {
            match future_to {
                ShowFutureGrantsTo::Role(role) => {
                    sql.push_str(&format!(" TO ROLE {}", role.fully_qualified_name()));
                }
                ShowFutureGrantsTo::DatabaseRole(role) => {
                    sql.push_str(&format!(" TO DATABASE ROLE {}", role.fully_qualified_name()));
                }
            }
        }
        Ok(sql)
    }
}

/// One decoded grant row. `grant_option` arrives as the strings
/// `"true"`/`"false"` and is coerced through the bool scanner.
#[derive(Debug, Clone)]
pub struct GrantRow {
    pub created_on: Option<String>,
    pub privilege: String,
    pub granted_on: ObjectType,
    pub name: String,
    pub granted_to: String,
    pub grantee_name: String,
    pub grant_option: bool,
    pub granted_by: Option<String>,
}

impl FromRecord for GrantRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        let granted_on_raw = record.require_string("granted_on")?;
        let granted_on = granted_on_raw
            .parse::<ObjectType>()
            .map_err(|_| record.invalid_enum("granted_on", "object type", &granted_on_raw))?;
        Ok(GrantRow {
            created_on: record.get_timestamp_text("created_on")?,
            privilege: record.require_string("privilege")?,
            granted_on,
            name: record.require_string("name")?,
            granted_to: record.require_string("granted_to")?,
            grantee_name: record.require_string("grantee_name")?,
            grant_option: record.require_bool("grant_option")?,
            granted_by: record.get_string("granted_by")?,
        })
    }
}

/// What a privilege grant applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOn {
    Account,
    Object {
        object_type: ObjectType,
        name: ObjectName,
    },
    Database(AccountObjectIdentifier),
    Schema(DatabaseObjectIdentifier),
    /// `FUTURE <plural> IN DATABASE|SCHEMA ...`.
    Future {
        object_type: ObjectType,
        scope: ShowFutureGrantsIn,
    },
}

impl GrantOn {
    fn write_sql(&self, sql: &mut String) {
        match self {
            GrantOn::Account => sql.push_str("ACCOUNT"),
            GrantOn::Object { object_type, name } => {
                sql.push_str(&format!("{object_type} {}", name.fully_qualified_name()));
            }
            GrantOn::Database(db) => {
                sql.push_str(&format!("DATABASE {}", db.fully_qualified_name()));
            }
            GrantOn::Schema(schema) => {
                sql.push_str(&format!("SCHEMA {}", schema.fully_qualified_name()));
            }
            GrantOn::Future { object_type, scope } => {
                sql.push_str(&format!("FUTURE {} IN ", object_type.plural()));
                match scope {
                    ShowFutureGrantsIn::Database(db) => {
                        sql.push_str(&format!("DATABASE {}", db.fully_qualified_name()));
                    }
                    ShowFutureGrantsIn::Schema(schema) => {
                        sql.push_str(&format!("SCHEMA {}", schema.fully_qualified_name()));
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct GrantPrivilegesToAccountRoleRequest {
    privileges: Vec<String>,
    on: GrantOn,
    role: AccountObjectIdentifier,
    with_grant_option: bool,
}

impl GrantPrivilegesToAccountRoleRequest {
    pub fn new(privileges: Vec<String>, on: GrantOn, role: AccountObjectIdentifier) -> Self {
        Self {
            privileges,
            on,
            role,
            with_grant_option: false,
        }
    }

    pub fn with_grant_option(mut self) -> Self {
        self.with_grant_option = true;
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        if self.privileges.is_empty() {
            return Err(RequestError::MissingField("privileges"));
        }
        let mut sql = String::from("GRANT ");
        sql.push_str(&self.privileges.join(", "));
        sql.push_str(" ON ");
        self.on.write_sql(&mut sql);
        sql.push_str(&format!(" TO ROLE {}", self.role.fully_qualified_name()));
        if self.with_grant_option {
            sql.push_str(" WITH GRANT OPTION");
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct RevokePrivilegesFromAccountRoleRequest {
    privileges: Vec<String>,
    on: GrantOn,
    role: AccountObjectIdentifier,
    cascade: bool,
}

impl RevokePrivilegesFromAccountRoleRequest {
    pub fn new(privileges: Vec<String>, on: GrantOn, role: AccountObjectIdentifier) -> Self {
        Self {
            privileges,
            on,
            role,
            cascade: false,
        }
    }

    pub fn with_cascade(mut self) -> Self {
        self.cascade = true;
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        if self.privileges.is_empty() {
            return Err(RequestError::MissingField("privileges"));
        }
        let mut sql = String::from("REVOKE ");
        sql.push_str(&self.privileges.join(", "));
        sql.push_str(" ON ");
        self.on.write_sql(&mut sql);
        sql.push_str(&format!(" FROM ROLE {}", self.role.fully_qualified_name()));
        if self.cascade {
            sql.push_str(" CASCADE");
        }
        Ok(sql)
    }
}

pub struct GrantsClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> GrantsClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn show(&self, request: &ShowGrantsRequest) -> Result<Vec<GrantRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }

    pub async fn grant_privileges_to_account_role(
        &self,
        request: &GrantPrivilegesToAccountRoleRequest,
    ) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("GRANT", &request.role))
    }

    pub async fn revoke_privileges_from_account_role(
        &self,
        request: &RevokePrivilegesFromAccountRoleRequest,
    ) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("REVOKE", &request.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::RecordingExecutor;
    use crate::record::JsonTable;
    use serde_json::json;

    fn role(name: &str) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(name)
    }

    #[test]
    fn show_grants_branches() {
        assert_eq!(ShowGrantsRequest::new().build().unwrap(), "SHOW GRANTS");
        assert_eq!(
            ShowGrantsRequest::new()
                .with_on(ShowGrantsOn::Account)
                .build()
                .unwrap(),
            "SHOW GRANTS ON ACCOUNT"
        );
        assert_eq!(
            ShowGrantsRequest::new()
                .with_on(ShowGrantsOn::Object {
                    object_type: ObjectType::Warehouse,
                    name: ObjectName::AccountLevel(role("WH")),
                })
                .build()
                .unwrap(),
            "SHOW GRANTS ON WAREHOUSE \"WH\""
        );
        assert_eq!(
            ShowGrantsRequest::new()
                .with_to(ShowGrantsTo::User(role("U1")))
                .build()
                .unwrap(),
            "SHOW GRANTS TO USER \"U1\""
        );
        assert_eq!(
            ShowGrantsRequest::new()
                .with_of(ShowGrantsOf::Share(role("SH")))
                .build()
                .unwrap(),
            "SHOW GRANTS OF SHARE \"SH\""
        );
        assert_eq!(
            ShowGrantsRequest::new()
                .with_future_in(ShowFutureGrantsIn::Schema(DatabaseObjectIdentifier::new(
                    "D", "S"
                )))
                .build()
                .unwrap(),
            "SHOW FUTURE GRANTS IN SCHEMA \"D\".\"S\""
        );
        assert_eq!(
            ShowGrantsRequest::new()
                .with_future_to(ShowFutureGrantsTo::Role(role("R")))
                .build()
                .unwrap(),
            "SHOW FUTURE GRANTS TO ROLE \"R\""
        );
    }

    #[test]
    fn show_grants_rejects_two_branches() {
        let err = ShowGrantsRequest::new()
            .with_on(ShowGrantsOn::Account)
            .with_to(ShowGrantsTo::Role(role("R")))
            .build()
            .unwrap_err();
        assert!(matches!(err, RequestError::ExactlyOneOf(_)));
    }

    #[test]
    fn grant_and_revoke_render() {
        let sql = GrantPrivilegesToAccountRoleRequest::new(
            vec!["USAGE".into(), "MONITOR".into()],
            GrantOn::Database(role("D1")),
            role("ANALYST"),
        )
        .with_grant_option()
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "GRANT USAGE, MONITOR ON DATABASE \"D1\" TO ROLE \"ANALYST\" WITH GRANT OPTION"
        );

        let sql = RevokePrivilegesFromAccountRoleRequest::new(
            vec!["SELECT".into()],
            GrantOn::Future {
                object_type: ObjectType::Table,
                scope: ShowFutureGrantsIn::Database(role("D1")),
            },
            role("ANALYST"),
        )
        .build()
        .unwrap();
        assert_eq!(
            sql,
            "REVOKE SELECT ON FUTURE TABLES IN DATABASE \"D1\" FROM ROLE \"ANALYST\""
        );
    }

    #[tokio::test]
    async fn grant_rows_coerce_grant_option_strings() {
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
                json!("2024-01-02T15:04:05.000 -0700"),
                json!("USAGE"),
                json!("ROLE"),
                json!("ANALYST"),
                json!("USER"),
                json!("U1"),
                json!("true"),
                json!("SECURITYADMIN"),
            ]],
        );
        let executor = RecordingExecutor::with_table(table);
        let client = GrantsClient::new(&executor);
        let rows = client
            .show(&ShowGrantsRequest::new().with_to(ShowGrantsTo::User(role("U1"))))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].grant_option);
        assert_eq!(rows[0].granted_on, ObjectType::Role);
        assert_eq!(rows[0].privilege, "USAGE");
    }
}
