use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::error::{Error, Result};
use crate::identifier::{AccountObjectIdentifier, SchemaObjectIdentifier};
use crate::record::{DecodeError, FromRecord, JsonTable, RecordRef};
use crate::sql::{RequestError, push_string_property, quote_literal};

fn ip_list(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| quote_literal(v)).collect();
    format!("({})", quoted.join(", "))
}

fn rule_list(rules: &[SchemaObjectIdentifier]) -> String {
    let rendered: Vec<String> = rules.iter().map(|r| r.fully_qualified_name()).collect();
    format!("({})", rendered.join(", "))
}

#[derive(Debug, Clone)]
pub struct CreateNetworkPolicyRequest {
    name: AccountObjectIdentifier,
    or_replace: bool,
    if_not_exists: bool,
    allowed_network_rules: Vec<SchemaObjectIdentifier>,
    blocked_network_rules: Vec<SchemaObjectIdentifier>,
    allowed_ips: Vec<String>,
    blocked_ips: Vec<String>,
    comment: Option<String>,
}

impl CreateNetworkPolicyRequest {
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            name,
            or_replace: false,
            if_not_exists: false,
            allowed_network_rules: Vec::new(),
            blocked_network_rules: Vec::new(),
            allowed_ips: Vec::new(),
            blocked_ips: Vec::new(),
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

    pub fn with_allowed_network_rules(mut self, rules: Vec<SchemaObjectIdentifier>) -> Self {
        self.allowed_network_rules = rules;
        self
    }

    pub fn with_blocked_network_rules(mut self, rules: Vec<SchemaObjectIdentifier>) -> Self {
        self.blocked_network_rules = rules;
        self
    }

    pub fn with_allowed_ips(mut self, ips: Vec<String>) -> Self {
        self.allowed_ips = ips;
        self
    }

    pub fn with_blocked_ips(mut self, ips: Vec<String>) -> Self {
        self.blocked_ips = ips;
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
        sql.push_str("NETWORK POLICY ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if !self.allowed_network_rules.is_empty() {
            sql.push_str(" ALLOWED_NETWORK_RULE_LIST = ");
            sql.push_str(&rule_list(&self.allowed_network_rules));
        }
        if !self.blocked_network_rules.is_empty() {
            sql.push_str(" BLOCKED_NETWORK_RULE_LIST = ");
            sql.push_str(&rule_list(&self.blocked_network_rules));
        }
        if !self.allowed_ips.is_empty() {
            sql.push_str(" ALLOWED_IP_LIST = ");
            sql.push_str(&ip_list(&self.allowed_ips));
        }
        if !self.blocked_ips.is_empty() {
            sql.push_str(" BLOCKED_IP_LIST = ");
            sql.push_str(&ip_list(&self.blocked_ips));
        }
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
pub struct NetworkPolicySet {
    pub allowed_network_rules: Option<Vec<SchemaObjectIdentifier>>,
    pub blocked_network_rules: Option<Vec<SchemaObjectIdentifier>>,
    pub allowed_ips: Option<Vec<String>>,
    pub blocked_ips: Option<Vec<String>>,
    pub comment: Option<String>,
}

impl NetworkPolicySet {
    fn is_empty(&self) -> bool {
        self.allowed_network_rules.is_none()
            && self.blocked_network_rules.is_none()
            && self.allowed_ips.is_none()
            && self.blocked_ips.is_none()
            && self.comment.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct AlterNetworkPolicyRequest {
    name: AccountObjectIdentifier,
    if_exists: bool,
    rename_to: Option<AccountObjectIdentifier>,
    set: Option<NetworkPolicySet>,
    unset_comment: bool,
}

impl AlterNetworkPolicyRequest {
    pub fn new(name: AccountObjectIdentifier) -> Self {
        Self {
            name,
            if_exists: false,
            rename_to: None,
            set: None,
            unset_comment: false,
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

    pub fn with_set(mut self, set: NetworkPolicySet) -> Self {
        self.set = Some(set);
        self
    }

    pub fn with_unset_comment(mut self) -> Self {
        self.unset_comment = true;
        self
    }

    pub fn build(&self) -> std::result::Result<String, RequestError> {
        let set = self.set.as_ref().filter(|s| !s.is_empty());
        let actions = [self.rename_to.is_some(), set.is_some(), self.unset_comment]
            .iter()
            .filter(|b| **b)
            .count();
        if actions == 0 {
            return Err(RequestError::MissingField("alter action"));
        }
        if actions > 1 {
            return Err(RequestError::MutuallyExclusive("rename_to/set", "unset"));
        }
        let mut sql = String::from("ALTER NETWORK POLICY ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        if let Some(new_name) = &self.rename_to {
            sql.push_str(" RENAME TO ");
            sql.push_str(&new_name.fully_qualified_name());
        } else if let Some(set) = set {
            let mut props = Vec::new();
            if let Some(rules) = &set.allowed_network_rules {
                props.push(format!("ALLOWED_NETWORK_RULE_LIST = {}", rule_list(rules)));
            }
            if let Some(rules) = &set.blocked_network_rules {
                props.push(format!("BLOCKED_NETWORK_RULE_LIST = {}", rule_list(rules)));
            }
            if let Some(ips) = &set.allowed_ips {
                props.push(format!("ALLOWED_IP_LIST = {}", ip_list(ips)));
            }
            if let Some(ips) = &set.blocked_ips {
                props.push(format!("BLOCKED_IP_LIST = {}", ip_list(ips)));
            }
            push_string_property(&mut props, "COMMENT", &set.comment);
            sql.push_str(" SET ");
            sql.push_str(&props.join(" "));
        } else if self.unset_comment {
            sql.push_str(" UNSET COMMENT");
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone)]
pub struct DropNetworkPolicyRequest {
    name: AccountObjectIdentifier,
    if_exists: bool,
}

impl DropNetworkPolicyRequest {
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
        let mut sql = String::from("DROP NETWORK POLICY ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name.fully_qualified_name());
        Ok(sql)
    }
}

/// One row of `SHOW NETWORK POLICIES` output. The listing takes no
/// filters; `show_by_id` narrows client-side.
#[derive(Debug, Clone)]
pub struct NetworkPolicyRow {
    pub created_on: Option<String>,
    pub name: String,
    pub comment: Option<String>,
    pub entries_in_allowed_ip_list: Option<i64>,
    pub entries_in_blocked_ip_list: Option<i64>,
    pub entries_in_allowed_network_rules: Option<i64>,
    pub entries_in_blocked_network_rules: Option<i64>,
}

impl NetworkPolicyRow {
    pub fn id(&self) -> AccountObjectIdentifier {
        AccountObjectIdentifier::new(&self.name)
    }
}

impl FromRecord for NetworkPolicyRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(NetworkPolicyRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            comment: record.get_string("comment")?,
            entries_in_allowed_ip_list: record.get_i64("entries_in_allowed_ip_list")?,
            entries_in_blocked_ip_list: record.get_i64("entries_in_blocked_ip_list")?,
            entries_in_allowed_network_rules: record.get_i64("entries_in_allowed_network_rules")?,
            entries_in_blocked_network_rules: record.get_i64("entries_in_blocked_network_rules")?,
        })
    }
}

/// Aggregated `DESCRIBE NETWORK POLICY` output: one name/value row per
/// populated list.
#[derive(Debug, Clone, Default)]
pub struct NetworkPolicyDetails {
    pub allowed_ip_list: Vec<String>,
    pub blocked_ip_list: Vec<String>,
    pub allowed_network_rule_list: Vec<String>,
    pub blocked_network_rule_list: Vec<String>,
}

impl NetworkPolicyDetails {
    pub fn from_table(table: &JsonTable) -> std::result::Result<Self, DecodeError> {
        let mut details = NetworkPolicyDetails::default();
        for record in table.records() {
            let name = record.require_string("name")?;
            let value = record.get_string("value")?.unwrap_or_default();
            let entries: Vec<String> = value
                .split(',')
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect();
            match name.as_str() {
                "ALLOWED_IP_LIST" => details.allowed_ip_list = entries,
                "BLOCKED_IP_LIST" => details.blocked_ip_list = entries,
                "ALLOWED_NETWORK_RULE_LIST" => details.allowed_network_rule_list = entries,
                "BLOCKED_NETWORK_RULE_LIST" => details.blocked_network_rule_list = entries,
                _ => {}
            }
        }
        Ok(details)
    }
}

pub struct NetworkPoliciesClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> NetworkPoliciesClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, request: &CreateNetworkPolicyRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("CREATE NETWORK POLICY", &request.name))
    }

    pub async fn alter(&self, request: &AlterNetworkPolicyRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("ALTER NETWORK POLICY", &request.name))
    }

    pub async fn drop(&self, request: &DropNetworkPolicyRequest) -> Result<()> {
        let sql = request.build().map_err(Error::from)?;
        self.executor
            .exec(&sql)
            .await
            .map_err(|e| e.with_operation("DROP NETWORK POLICY", &request.name))
    }

    pub async fn show(&self) -> Result<Vec<NetworkPolicyRow>> {
        self.executor.query("SHOW NETWORK POLICIES").await
    }

    pub async fn show_by_id(&self, id: &AccountObjectIdentifier) -> Result<NetworkPolicyRow> {
        let rows = self.show().await?;
        rows.into_iter()
            .find(|row| row.name == id.name())
            .ok_or(Error::NotFound)
    }

    pub async fn describe(&self, id: &AccountObjectIdentifier) -> Result<NetworkPolicyDetails> {
        let sql = format!("DESCRIBE NETWORK POLICY {}", id.fully_qualified_name());
        let table = self
            .executor
            .query_table(&sql)
            .await
            .map_err(|e| e.with_operation("DESCRIBE NETWORK POLICY", id))?;
        if table.is_empty() {
            return Err(Error::NotFound);
        }
        Ok(NetworkPolicyDetails::from_table(&table)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_renders_rule_and_ip_lists() {
        let sql = CreateNetworkPolicyRequest::new(AccountObjectIdentifier::new("NP"))
            .with_allowed_network_rules(vec![SchemaObjectIdentifier::new("D", "S", "R1")])
            .with_allowed_ips(vec!["192.168.0.0/24".into(), "10.0.0.1".into()])
            .with_comment("office")
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE NETWORK POLICY \"NP\" ALLOWED_NETWORK_RULE_LIST = (\"D\".\"S\".\"R1\") ALLOWED_IP_LIST = ('192.168.0.0/24', '10.0.0.1') COMMENT = 'office'"
        );
    }

    #[test]
    fn describe_splits_comma_lists() {
        let table = JsonTable::new(
            vec!["name".into(), "value".into()],
            vec![
                vec![
                    serde_json::json!("ALLOWED_IP_LIST"),
                    serde_json::json!("1.2.3.4, 5.6.7.8"),
                ],
                vec![
                    serde_json::json!("BLOCKED_IP_LIST"),
                    serde_json::json!(""),
                ],
            ],
        );
        let details = NetworkPolicyDetails::from_table(&table).unwrap();
        assert_eq!(details.allowed_ip_list, vec!["1.2.3.4", "5.6.7.8"]);
        assert!(details.blocked_ip_list.is_empty());
    }
}
