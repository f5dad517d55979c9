use super::service_account::ServiceAccountAuth;
use crate::core::report::{DeckStore, RenderedDeck, UploadError, UploadedFile};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const PPTX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

pub const REPORT_FILE_NAME: &str = "GeneratedReport.pptx";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata<'a> {
    name: &'a str,
    parents: [&'a str; 1],
    mime_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// Uploads decks to Google Drive (v3, resumable upload protocol).
///
/// Step one creates an upload session carrying the file metadata; step two
/// sends the bytes to the session URL and gets the created file back.
pub struct DriveUploader {
    client: Client,
    auth: Arc<ServiceAccountAuth>,
    api_base: String,
}

impl DriveUploader {
    pub fn new(
        auth: Arc<ServiceAccountAuth>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::Request(e.to_string()))?;

        Ok(Self {
            client,
            auth,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    async fn start_session(
        &self,
        token: &str,
        folder_token: &str,
        length: usize,
    ) -> Result<String, UploadError> {
        let url = format!(
            "{}/upload/drive/v3/files?uploadType=resumable&supportsAllDrives=true",
            self.api_base
        );
        let metadata = FileMetadata {
            name: REPORT_FILE_NAME,
            parents: [folder_token],
            mime_type: PPTX_MIME_TYPE,
        };

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header("X-Upload-Content-Type", PPTX_MIME_TYPE)
            .header("X-Upload-Content-Length", length.to_string())
            .json(&metadata)
            .send()
            .await
            .map_err(|e| UploadError::Request(e.to_string()))?;
        let response = check_status(response).await?;

        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or(UploadError::MissingSessionUrl)
    }

    async fn send_content(
        &self,
        token: &str,
        session_url: &str,
        bytes: Vec<u8>,
    ) -> Result<CreatedFile, UploadError> {
        let response = self
            .client
            .put(session_url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(CONTENT_TYPE, PPTX_MIME_TYPE)
            .body(bytes)
            .send()
            .await
            .map_err(|e| UploadError::Request(e.to_string()))?;

        check_status(response)
            .await?
            .json::<CreatedFile>()
            .await
            .map_err(|e| UploadError::Request(format!("unexpected Drive response: {}", e)))
    }
}

async fn check_status(response: Response) -> Result<Response, UploadError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(UploadError::Api {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl DeckStore for DriveUploader {
    async fn store_deck(
        &self,
        folder_token: &str,
        deck: RenderedDeck,
    ) -> Result<UploadedFile, UploadError> {
        let token = self.auth.get_access_token().await?;

        let session_url = self
            .start_session(&token, folder_token, deck.bytes.len())
            .await?;
        tracing::debug!("Opened Drive upload session for folder {}", folder_token);

        let created = self.send_content(&token, &session_url, deck.bytes).await?;
        Ok(UploadedFile { id: created.id })
    }
}
