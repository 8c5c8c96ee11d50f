use std::sync::Arc;

use async_trait::async_trait;
use snowflake_api::{QueryResult, SnowflakeApi};

use crate::error::{Error, Result};
use crate::record::{FromRecord, JsonTable};

/// The seam between the object-kind clients and the wire. `Session` is the
/// production implementation; tests substitute a recording executor.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Issue a statement with no row output.
    async fn exec(&self, sql: &str) -> Result<()>;

    /// Issue a statement and collect its JSON result set.
    async fn query_table(&self, sql: &str) -> Result<JsonTable>;

    /// First column of the first row of a `SELECT`, which the server
    /// delivers on the Arrow path.
    async fn select_scalar(&self, sql: &str) -> Result<Option<String>>;
}

/// Typed decoding on top of [`SqlExecutor`].
#[async_trait]
pub trait SqlExecutorExt: SqlExecutor {
    async fn query<T>(&self, sql: &str) -> Result<Vec<T>>
    where
        T: FromRecord + Send,
    {
        let table = self.query_table(sql).await?;
        Ok(table.decode()?)
    }

    /// First decoded row, or the `NotFound` sentinel.
    async fn query_one<T>(&self, sql: &str) -> Result<T>
    where
        T: FromRecord + Send,
    {
        let table = self.query_table(sql).await?;
        match table.records().next() {
            Some(record) => Ok(T::from_record(&record)?),
            None => Err(Error::NotFound),
        }
    }
}

#[async_trait]
impl<E: SqlExecutor + ?Sized> SqlExecutorExt for E {}

/// Shared handle on an authenticated Snowflake connection. Safe for
/// concurrent use; every call rides the driver's pooled connection. No
/// retries, no caching, no transactions — admin statements auto-commit
/// server-side.
pub struct Session {
    api: Arc<SnowflakeApi>,
}

impl Session {
    pub fn new(api: Arc<SnowflakeApi>) -> Self {
        Self { api }
    }

    async fn run(&self, sql: &str) -> Result<QueryResult> {
        tracing::debug!(sql, "executing");
        self.api.exec(sql).await.map_err(|e| classify(sql, e))
    }
}

#[async_trait]
impl SqlExecutor for Session {
    async fn exec(&self, sql: &str) -> Result<()> {
        self.run(sql).await?;
        Ok(())
    }

    async fn query_table(&self, sql: &str) -> Result<JsonTable> {
        match self.run(sql).await? {
            QueryResult::Json(json) => Ok(JsonTable::from_json_result(&json)?),
            QueryResult::Empty => Ok(JsonTable::default()),
            QueryResult::Arrow(_) => Err(Error::UnexpectedArrowResult),
        }
    }

    async fn select_scalar(&self, sql: &str) -> Result<Option<String>> {
        match self.run(sql).await? {
            QueryResult::Arrow(batches) => {
                let Some(batch) = batches.first() else {
                    return Ok(None);
                };
                if batch.num_columns() == 0 || batch.num_rows() == 0 {
                    return Ok(None);
                }
                let column: arrow::array::StringArray = batch.column(0).to_data().into();
                Ok(Some(column.value(0).to_string()))
            }
            QueryResult::Json(json) => {
                // Scalar SELECTs have a single synthetic column; take the
                // first cell whatever the server called it.
                let value = json
                    .value
                    .as_array()
                    .and_then(|rows| rows.first())
                    .and_then(|row| row.as_array())
                    .and_then(|cells| cells.first());
                Ok(value.and_then(|v| v.as_str()).map(|s| s.to_string()))
            }
            QueryResult::Empty => Ok(None),
        }
    }
}

/// Classify a driver error by message, the only signal the wire gives us.
/// "does not exist or not authorized" is the server's uniform answer for
/// missing objects.
fn classify(sql: &str, error: snowflake_api::SnowflakeApiError) -> Error {
    let message = error.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("does not exist") {
        return Error::NotFound;
    }
    if ["timed out", "timeout", "connection", "network", "transport"]
        .iter()
        .any(|needle| lowered.contains(needle))
    {
        return Error::Transient {
            sql: sql.to_string(),
            message,
        };
    }
    Error::Sql {
        sql: sql.to_string(),
        message,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Records every statement and replays canned result tables.
    pub(crate) struct RecordingExecutor {
        pub statements: Mutex<Vec<String>>,
        tables: Mutex<VecDeque<JsonTable>>,
    }

    impl RecordingExecutor {
        pub fn new() -> Self {
            Self {
                statements: Mutex::new(Vec::new()),
                tables: Mutex::new(VecDeque::new()),
            }
        }

        pub fn with_table(table: JsonTable) -> Self {
            let exec = Self::new();
            exec.tables.lock().unwrap().push_back(table);
            exec
        }

        pub fn push_table(&self, table: JsonTable) {
            self.tables.lock().unwrap().push_back(table);
        }

        pub fn executed(&self) -> Vec<String> {
            self.statements.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SqlExecutor for RecordingExecutor {
        async fn exec(&self, sql: &str) -> Result<()> {
            self.statements.lock().unwrap().push(sql.to_string());
            Ok(())
        }

        async fn query_table(&self, sql: &str) -> Result<JsonTable> {
            self.statements.lock().unwrap().push(sql.to_string());
            Ok(self
                .tables
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default())
        }

        async fn select_scalar(&self, sql: &str) -> Result<Option<String>> {
            self.statements.lock().unwrap().push(sql.to_string());
            let table = self.tables.lock().unwrap().pop_front().unwrap_or_default();
            let scalar = table
                .records()
                .next()
                .and_then(|r| r.get("value").and_then(|v| v.as_str().map(String::from)));
            Ok(scalar)
        }
    }
}
