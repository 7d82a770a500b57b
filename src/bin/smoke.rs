//! Snowflake connectivity smoke test.
//!
//! Takes no flags. Reads the seven `SNOWFLAKE_*` variables (from `.env` if
//! present), connects, and prints `(version, user, role, warehouse)`.

use snowpane::config::WarehouseConfig;
use snowpane::db::SnowflakeConnector;
use snowpane::error::Result;
use snowpane::{logging, smoke};
use tracing::error;

#[tokio::main]
async fn main() {
    logging::init_stderr_logging();

    match run().await {
        Ok(line) => println!("{line}"),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<String> {
    let _ = dotenvy::dotenv();
    let config = WarehouseConfig::from_env()?;
    smoke::run(&SnowflakeConnector::new(), &config).await
}
