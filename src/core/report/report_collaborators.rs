// The three things a report job needs from the outside world.
// The core only knows these traits; infra provides the real implementations
// (HTTP analytics client, pptx writer, Google Drive) and tests provide stubs.

use super::report_models::{RenderedDeck, SlideContentMap, UploadedFile};
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("analytics API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed insights response: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("zip error: {0}")]
    Zip(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("Google Drive API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("upload session URL missing from Drive response")]
    MissingSessionUrl,
}

// ============================================================================
// PORTS
// ============================================================================

/// Where slide content comes from.
#[async_trait]
pub trait InsightsSource: Send + Sync {
    async fn fetch_insights(
        &self,
        quarter_no: &str,
        year_no: &str,
    ) -> Result<SlideContentMap, AnalyticsError>;
}

/// Turns slide content into a presentation file.
pub trait DeckRenderer: Send + Sync {
    fn render(&self, content: &SlideContentMap) -> Result<RenderedDeck, RenderError>;
}

/// Files a rendered deck under a folder.
#[async_trait]
pub trait DeckStore: Send + Sync {
    async fn store_deck(
        &self,
        folder_token: &str,
        deck: RenderedDeck,
    ) -> Result<UploadedFile, UploadError>;
}
