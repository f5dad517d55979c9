// This is the entry point of the insight deck service.
//
// **Architecture Overview:**
// - `core/` = Business logic (the fetch -> render -> upload pipeline, platform-agnostic)
// - `infra/` = Implementations of core traits (analytics API, pptx writer, Google Drive)
// - `http/` = HTTP-specific adapters (routes, handlers)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Build the router and serve it

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "http/http_layer.rs"]
mod http;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::{Config, CredentialSource};
use crate::core::report::ReportPipeline;
use crate::http::{routes, AppState};
use crate::infra::analytics::AnalyticsClient;
use crate::infra::google_drive::{DriveUploader, ServiceAccountAuth};
use crate::infra::pptx::PptxRenderer;
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = Config::from_env()?;
    tracing::info!(
        analytics_url = %cfg.analytics_url,
        credentials = ?cfg.credentials,
        "Starting insight deck service"
    );

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    // The service account key is read once; every job shares the authenticator.
    let auth = match &cfg.credentials {
        CredentialSource::File(path) => ServiceAccountAuth::from_file(path, cfg.drive_timeout)
            .await
            .with_context(|| format!("Failed to load service account key {}", path.display()))?,
        CredentialSource::Inline(json) => ServiceAccountAuth::from_json(json, cfg.drive_timeout)
            .context("Failed to parse GOOGLE_SERVICE_ACCOUNT_JSON")?,
    };
    tracing::info!("Uploading to Google Drive as {}", auth.client_email());

    let insights = AnalyticsClient::new(cfg.analytics_url.clone(), cfg.analytics_timeout)
        .context("Failed to create analytics client")?;
    let uploader = DriveUploader::new(
        Arc::new(auth),
        cfg.drive_api_base.clone(),
        cfg.drive_timeout,
    )
    .context("Failed to create Google Drive client")?;

    let pipeline = ReportPipeline::new(
        Arc::new(insights),
        Arc::new(PptxRenderer::default()),
        Arc::new(uploader),
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    // ========================================================================
    // SERVER
    // ========================================================================

    let app = routes::create_routes().with_state(state);

    let addr = cfg.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
