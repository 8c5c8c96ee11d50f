use thiserror::Error;

use crate::datatype::DataTypeError;
use crate::filters::FilterError;
use crate::identifier::IdentifierError;
use crate::record::DecodeError;
use crate::scan::ScanError;
use crate::sql::RequestError;

/// Errors surfaced by the execution client and the object-kind clients.
///
/// `NotFound` is a sentinel: `show_by_id` and `describe` return it bare,
/// never wrapped, so callers can match on it directly.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    DataType(#[from] DataTypeError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("object does not exist or not authorized")]
    NotFound,

    #[error("SQL error executing `{sql}`: {message}")]
    Sql { sql: String, message: String },

    /// Connection-level failures. Callers may retry; this crate never does.
    #[error("transient error executing `{sql}`: {message}")]
    Transient { sql: String, message: String },

    #[error("We were expecting a JSON result, but got Arrow")]
    UnexpectedArrowResult,

    #[error("We were expecting a result, but got an empty one")]
    UnexpectedEmptyResult,

    #[error("{operation} {target}: {source}")]
    Operation {
        operation: &'static str,
        target: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }

    /// Attach the operation name and target identifier on the way up.
    /// `NotFound` passes through untouched so the sentinel stays matchable.
    pub fn with_operation(self, operation: &'static str, target: impl ToString) -> Error {
        match self {
            Error::NotFound => Error::NotFound,
            other => Error::Operation {
                operation,
                target: target.to_string(),
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_survives_operation_context() {
        let err = Error::NotFound.with_operation("SHOW WAREHOUSES", "\"WH\"");
        assert!(err.is_not_found());
    }

    #[test]
    fn sql_errors_gain_operation_context() {
        let err = Error::Sql {
            sql: "DROP USER \"U1\"".into(),
            message: "insufficient privileges".into(),
        }
        .with_operation("DROP USER", "\"U1\"");
        assert!(!err.is_not_found());
        let rendered = err.to_string();
        assert!(rendered.starts_with("DROP USER \"U1\""));
    }
}
