use std::env;
use std::sync::Arc;

use anyhow::{Context, Error};
use base64::prelude::*;
use snowflake_api::SnowflakeApi;

use crate::client::Session;

/// Connection configuration, loaded from the environment by the caller at
/// the process boundary. The DSL layer itself never reads the environment.
#[derive(Clone)]
pub struct Config {
    pub account: String,
    pub user: String,
    pub role: String,
    pub warehouse: String,
    pub private_key: String,
}

impl Config {
    /// Read `SF_ACCOUNT`, `SF_USER`, `SF_ROLE`, `SF_WAREHOUSE`, and exactly
    /// one of `SF_PRIVATE_KEY_BASE64` / `SF_PRIVATE_KEY_PATH`.
    pub fn from_env() -> Result<Self, Error> {
        let account = env::var("SF_ACCOUNT").context("SF_ACCOUNT env var not set!")?;
        let user = env::var("SF_USER").context("SF_USER env var not set!")?;
        let role = env::var("SF_ROLE").context("SF_ROLE env var not set!")?;
        let warehouse = env::var("SF_WAREHOUSE").context("SF_WAREHOUSE env var not set!")?;
        let private_key_base64 = env::var("SF_PRIVATE_KEY_BASE64");
        let private_key_path = env::var("SF_PRIVATE_KEY_PATH");

        let private_key = match (private_key_base64, private_key_path) {
            (Ok(_), Ok(_)) => Err(Error::msg(
                "Ambiguous: Only one of SF_PRIVATE_KEY_BASE64 and SF_PRIVATE_KEY_PATH can be set!",
            )),
            (Ok(private_key_base64), Err(_)) => {
                let private_key = BASE64_STANDARD
                    .decode(private_key_base64)
                    .context("Failed to decode SF_PRIVATE_KEY_BASE64")?;
                Ok(String::from_utf8(private_key).context("SF_PRIVATE_KEY_BASE64 is not valid UTF-8")?)
            }
            (Err(_), Ok(private_key_path)) => std::fs::read_to_string(&private_key_path)
                .with_context(|| format!("Failed to read private key from {}", private_key_path)),
            (Err(_), Err(_)) => Err(Error::msg(
                "SF_PRIVATE_KEY_BASE64 or SF_PRIVATE_KEY_PATH not set!",
            )),
        }?;

        Ok(Config {
            account,
            user,
            role,
            warehouse,
            private_key,
        })
    }

    /// Open an authenticated session with certificate auth, optionally
    /// scoped to a database and schema.
    pub fn connect(
        &self,
        database: Option<&str>,
        schema: Option<&str>,
    ) -> Result<Session, Error> {
        let api = SnowflakeApi::with_certificate_auth(
            &self.account,
            Some(&self.warehouse),
            database,
            schema,
            &self.user,
            Some(&self.role),
            &self.private_key,
        )?;
        Ok(Session::new(Arc::new(api)))
    }
}
