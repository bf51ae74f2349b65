mod config;
mod payloads;
mod routes;
mod upload;

use anyhow::{Context, Result};
use config::ServerConfig;
use docqa_rag::{DocumentIndex, GeminiService};
use routes::AppState;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::init();

    let config = ServerConfig::from_env()?;
    log::info!("Starting with {:?}", config);

    let generator = Arc::new(GeminiService::new()?);
    let state = Arc::new(AppState::new(config.clone(), generator));

    // An index saved by docqa-index can be served without re-uploading.
    if let Ok(path) = std::env::var("INDEX_PATH") {
        let index = DocumentIndex::load_index(&PathBuf::from(&path))?;
        log::info!("Loaded {} documents from {}", index.documents.len(), path);
        state.set_index(index).await;
    }

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
