mod config;
mod errors;
mod llm_client;
mod plan;
mod render;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::build_provider;
use crate::plan::schema::PlanGuard;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PlanStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (errors on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Diet Plan API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM provider
    let llm = build_provider(&config)?;
    info!(
        "LLM provider initialized: {} (model: {})",
        llm.name(),
        llm.model()
    );

    // Compile the diet-plan output schema
    let guard = Arc::new(PlanGuard::new()?);
    info!("Plan schema compiled");

    // Initialize the PDF output directory
    let store = PlanStore::new(&config.pdf_dir)?;
    info!("Plan store ready at {}", config.pdf_dir.display());

    // Build app state
    let state = AppState { llm, guard, store };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
