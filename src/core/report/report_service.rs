// The report pipeline: fetch insights -> render deck -> upload deck.
//
// A job is started from the HTTP layer and runs detached from the request that
// triggered it. Nobody waits on the outcome, so the log line written at the end
// of `run_and_log` is the only record of whether a deck made it to Drive.

use super::report_collaborators::{
    AnalyticsError, DeckRenderer, DeckStore, InsightsSource, RenderError, UploadError,
};
use super::report_models::{GenerationRequest, UploadedFile};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Which stage of a job failed, and why.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Error calling analytics API: {0}")]
    Fetch(#[from] AnalyticsError),

    #[error("Error creating PowerPoint: {0}")]
    Render(#[from] RenderError),

    #[error("Error uploading file to Google Drive: {0}")]
    Upload(#[from] UploadError),
}

pub struct ReportPipeline {
    insights: Arc<dyn InsightsSource>,
    renderer: Arc<dyn DeckRenderer>,
    store: Arc<dyn DeckStore>,
}

impl ReportPipeline {
    pub fn new(
        insights: Arc<dyn InsightsSource>,
        renderer: Arc<dyn DeckRenderer>,
        store: Arc<dyn DeckStore>,
    ) -> Self {
        Self {
            insights,
            renderer,
            store,
        }
    }

    /// Runs the three stages in order. The first failure stops the job.
    pub async fn run(&self, request: &GenerationRequest) -> Result<UploadedFile, PipelineError> {
        let content = self
            .insights
            .fetch_insights(&request.quarter_no, &request.year_no)
            .await?;
        tracing::debug!(slides = content.len(), "Fetched insights");

        let deck = self.renderer.render(&content)?;
        tracing::debug!(
            slides = deck.slide_count,
            bytes = deck.bytes.len(),
            "Rendered deck"
        );

        let uploaded = self.store.store_deck(&request.folder_token, deck).await?;
        Ok(uploaded)
    }

    /// Runs the job and reports the outcome to the log. Never fails.
    pub async fn run_and_log(&self, request: GenerationRequest) {
        tracing::info!(
            quarter_no = %request.quarter_no,
            year_no = %request.year_no,
            folder = %request.folder_token,
            "Starting report job"
        );

        match self.run(&request).await {
            Ok(file) => tracing::info!(
                file_id = %file.id,
                link = %file.web_link(),
                "File successfully uploaded with ID: {}",
                file.id
            ),
            Err(e) => tracing::error!(
                quarter_no = %request.quarter_no,
                year_no = %request.year_no,
                "{}",
                e
            ),
        }
    }

    /// Starts a detached job. The handle is only useful to tests; callers in
    /// production drop it.
    pub fn spawn(self: &Arc<Self>, request: GenerationRequest) -> JoinHandle<()> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            pipeline.run_and_log(request).await;
        })
    }
}
