//! Snowpane - run SQL against a Snowflake warehouse from the terminal.

use std::sync::Arc;

use snowpane::cli::Cli;
use snowpane::config::{Config, WarehouseConfig};
use snowpane::connection::SessionManager;
use snowpane::db::{Connector, MockConnector, SnowflakeConnector};
use snowpane::error::{Result, SnowpaneError};
use snowpane::query::QueryRunner;
use snowpane::tui::headless::{self, HeadlessConfig};
use snowpane::{logging, tui};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    // RUST_LOG may come from .env.
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    if cli.is_headless() {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    if dotenv_loaded {
        info!("Loaded environment from .env");
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        eprintln!("{}: {}", e.category(), e);
        if let Some(diagnostic) = e.diagnostic() {
            eprintln!("  {diagnostic}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    cli.validate().map_err(SnowpaneError::config)?;

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let settings = Config::load_from_file(&config_path)?;

    let (connector, warehouse): (Arc<dyn Connector>, WarehouseConfig) = if cli.mock_db {
        info!("Using the in-memory demo warehouse");
        (Arc::new(MockConnector::new()), demo_warehouse_config())
    } else {
        // Fails before any network attempt when a credential is missing.
        (Arc::new(SnowflakeConnector::new()), WarehouseConfig::from_env()?)
    };

    let connection_info = warehouse.display_string();
    info!("Connection: {}", connection_info);

    let sessions = Arc::new(SessionManager::new(connector, warehouse));
    let runner = Arc::new(QueryRunner::from_config(Arc::clone(&sessions), &settings));

    let result = if cli.is_headless() {
        let headless_config = HeadlessConfig::from_cli(&cli, &settings)?;
        headless::run(&runner, &settings, &headless_config, &connection_info).await
    } else {
        tui::run(Arc::clone(&runner), &settings).await
    };

    if let Err(e) = sessions.close().await {
        warn!("Error closing session: {}", e);
    }

    result
}

/// Session target shown when running against the demo warehouse.
///
/// Real values from the environment are used when present.
fn demo_warehouse_config() -> WarehouseConfig {
    let var = |key: &str, fallback: &str| {
        std::env::var(key)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };

    WarehouseConfig {
        account: var("SNOWFLAKE_ACCOUNT", "demo"),
        user: var("SNOWFLAKE_USER", "DEMO_USER"),
        password: String::new(),
        warehouse: var("SNOWFLAKE_WAREHOUSE", "COMPUTE_WH"),
        database: var("SNOWFLAKE_DATABASE", "TASTY_BYTES"),
        schema: var("SNOWFLAKE_SCHEMA", "RAW_POS"),
        role: var("SNOWFLAKE_ROLE", "SYSADMIN"),
        host: None,
    }
}
