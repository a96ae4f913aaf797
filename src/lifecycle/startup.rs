//! Startup orchestration.
//!
//! # Responsibilities
//! - Create the upload directory
//! - Bind the listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last, so traffic only arrives when ready

use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::storage::UploadStore;

/// Prepare the file system and bind the configured address.
pub async fn prepare(config: &GatewayConfig) -> std::io::Result<TcpListener> {
    let store = UploadStore::new(&config.uploads);
    if store.ensure_dir().await? {
        tracing::info!(dir = %store.dir().display(), "Created upload directory");
    }

    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    Ok(listener)
}
