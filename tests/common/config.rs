//! Test configuration helpers for wiring the pipeline to a mock catalog and a throwaway database

use catalog_sync::{CatalogSync, Config, Database, HttpCatalogClient};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

/// Markets endpoint path served by the mock catalog
pub const MARKETS_PATH: &str = "/api/v3/coins/markets";

/// Entry-list endpoint path served by the mock catalog
pub const LIST_PATH: &str = "/api/v3/coins/list";

/// API key the mock catalog expects
pub const API_KEY: &str = "integration-key";

/// Configuration pointing at `server`, with delays shrunk for tests
pub fn test_config(server: &MockServer, temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.catalog.markets_url = format!(
        "{}{}?vs_currency=usd&sparkline=true",
        server.uri(),
        MARKETS_PATH
    );
    config.catalog.list_url = format!("{}{}?include_platform=true", server.uri(), LIST_PATH);
    config.catalog.api_key = API_KEY.to_string();
    config.catalog.request_timeout = Duration::from_secs(5);
    config.fetch.pacing_delay = Duration::from_millis(1);
    config.fetch.throttle_cooldown = Duration::from_millis(10);
    config.store.database_path = temp_dir.path().join("catalog.db");
    config.store.write_pacing_delay = Duration::from_millis(1);
    config
}

/// Open the database and build a sync runner over the real HTTP client
pub async fn create_sync(config: &Config) -> catalog_sync::Result<(CatalogSync, Arc<Database>)> {
    config.validate()?;
    let db = Arc::new(Database::new(&config.store.database_path).await?);
    let client = Arc::new(HttpCatalogClient::new(&config.catalog)?);
    let sync = CatalogSync::new(config, client, db.clone());
    Ok((sync, db))
}
