//! Typed SQL DSL and execution client for administering Snowflake
//! accounts.
//!
//! The crate builds, executes, and decodes the administrative commands of
//! a Snowflake account: SHOW, DESCRIBE, CREATE, ALTER, DROP, GRANT,
//! REVOKE, and the scalar `SYSTEM$...` helpers. Declarative
//! infrastructure tooling sits on top of the per-kind clients in
//! [`objects`]; everything below them is pure request building and row
//! decoding.

pub mod client;
pub mod config;
pub mod datatype;
pub mod error;
pub mod filters;
pub mod identifier;
pub mod objects;
pub mod record;
pub mod scan;
pub mod sql;
pub mod system;

pub use client::{Session, SqlExecutor, SqlExecutorExt};
pub use config::Config;
pub use datatype::{DataType, TypeComparison, are_the_same, compare_types, parse_data_type};
pub use error::{Error, Result};
pub use identifier::{
    AccountIdentifier, AccountObjectIdentifier, DatabaseObjectIdentifier,
    ExternalObjectIdentifier, SchemaObjectIdentifier, SchemaObjectIdentifierWithArguments,
};
pub use objects::ObjectType;
