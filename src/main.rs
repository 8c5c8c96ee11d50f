use snowflake_ddl::config::Config;
use snowflake_ddl::objects::databases::{DatabasesClient, ShowDatabasesRequest};
use snowflake_ddl::objects::warehouses::{ShowWarehousesRequest, WarehousesClient};
use tracing_subscriber::EnvFilter;

/// Diagnostic entry point: connect from SF_* environment configuration and
/// list the account's warehouses and standard databases.
#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    let session = config.connect(None, None)?;

    let warehouses = WarehousesClient::new(&session)
        .show(&ShowWarehousesRequest::new())
        .await?;
    for warehouse in &warehouses {
        tracing::info!(name = %warehouse.name, state = %warehouse.state, "warehouse");
        println!("warehouse: {}", warehouse.name);
    }

    let databases = DatabasesClient::new(&session)
        .show(&ShowDatabasesRequest::new())
        .await?;
    for database in databases.iter().filter(|d| d.is_standard()) {
        println!("database: {}", database.name);
    }

    Ok(())
}
