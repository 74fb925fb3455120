//! Store health checks.

use crate::client::StoreClient;
use crate::schema::all_tables;
use engine_core::{Error, Result};
use tracing::{debug, error};

/// Check store connection health.
pub async fn check_connection(client: &StoreClient) -> bool {
    match client.inner().query("SELECT 1").fetch_one::<u8>().await {
        Ok(_) => {
            debug!("Store connection healthy");
            true
        }
        Err(e) => {
            error!("Store health check failed: {}", e);
            false
        }
    }
}

/// Initialize database schema.
///
/// Creates the database and all tables if they don't exist.
pub async fn init_schema(client: &StoreClient) -> Result<()> {
    for ddl in all_tables() {
        client
            .inner()
            .query(ddl)
            .execute()
            .await
            .map_err(|e| Error::store(format!("Schema init error: {}", e)))?;
    }

    debug!("Store schema initialized");
    Ok(())
}
