use crate::client::{SqlExecutor, SqlExecutorExt};
use crate::error::{Error, Result};
use crate::objects::ObjectType;
use crate::record::{DecodeError, FromRecord, RecordRef};
use crate::sql::{ExtendedIn, Like, LimitFrom, RequestError, StartsWith};

/// Object-type-parameterised SHOW: one request shape serves every kind
/// that supports the uniform listing, including `IN CLASS <class>` where
/// the class is a typed identifier, never a spliced string.
#[derive(Debug, Clone)]
pub struct ShowObjectsRequest {
    object_type: ObjectType,
    terse: bool,
    like: Option<Like>,
    in_scope: Option<ExtendedIn>,
    starts_with: Option<StartsWith>,
    limit: Option<LimitFrom>,
}

impl ShowObjectsRequest {
    pub fn new(object_type: ObjectType) -> Self {
        Self {
            object_type,
            terse: false,
            like: None,
            in_scope: None,
            starts_with: None,
            limit: None,
        }
    }

    pub fn with_terse(mut self) -> Self {
        self.terse = true;
        self
    }

    pub fn with_like(mut self, like: Like) -> Self {
        self.like = Some(like);
        self
    }

    pub fn with_in(mut self, in_scope: ExtendedIn) -> Self {
        self.in_scope = Some(in_scope);
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
        let mut sql = String::from("SHOW ");
        if self.terse {
            sql.push_str("TERSE ");
        }
        sql.push_str(self.object_type.plural());
        if let Some(like) = &self.like {
            like.write_sql(&mut sql);
        }
        if let Some(in_scope) = &self.in_scope {
            in_scope.write_sql(&mut sql)?;
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

/// The columns every SHOW output shares.
#[derive(Debug, Clone)]
pub struct ObjectRow {
    pub created_on: Option<String>,
    pub name: String,
    pub kind: Option<String>,
    pub database_name: Option<String>,
    pub schema_name: Option<String>,
}

impl FromRecord for ObjectRow {
    fn from_record(record: &RecordRef<'_>) -> std::result::Result<Self, DecodeError> {
        Ok(ObjectRow {
            created_on: record.get_timestamp_text("created_on")?,
            name: record.require_string("name")?,
            kind: record.get_string("kind")?,
            database_name: record.get_string("database_name")?,
            schema_name: record.get_string("schema_name")?,
        })
    }
}

pub struct ShowObjectsClient<'a, E: SqlExecutor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> ShowObjectsClient<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub async fn show(&self, request: &ShowObjectsRequest) -> Result<Vec<ObjectRow>> {
        let sql = request.build().map_err(Error::from)?;
        self.executor.query(&sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::SchemaObjectIdentifier;

    #[test]
    fn show_in_class_renders_typed_identifier() {
        let sql = ShowObjectsRequest::new(ObjectType::Database)
            .with_in(ExtendedIn::class(SchemaObjectIdentifier::new(
                "SNOWFLAKE",
                "ML",
                "FORECAST",
            )))
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SHOW DATABASES IN CLASS \"SNOWFLAKE\".\"ML\".\"FORECAST\""
        );
    }

    #[test]
    fn terse_and_filters_keep_order() {
        let sql = ShowObjectsRequest::new(ObjectType::Stream)
            .with_terse()
            .with_like(Like::new("S%"))
            .with_limit(LimitFrom::new(5))
            .build()
            .unwrap();
        assert_eq!(sql, "SHOW TERSE STREAMS LIKE 'S%' LIMIT 5");
    }
}
