use crate::core::report::{AnalyticsError, InsightsSource, PeriodQuery, SlideContentMap};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Client for the demand-gen insights service.
///
/// One POST per job: the period goes in, a JSON object keyed by slide number
/// comes back.
pub struct AnalyticsClient {
    client: Client,
    endpoint: String,
}

impl AnalyticsClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AnalyticsError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalyticsError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl InsightsSource for AnalyticsClient {
    async fn fetch_insights(
        &self,
        quarter_no: &str,
        year_no: &str,
    ) -> Result<SlideContentMap, AnalyticsError> {
        let query = PeriodQuery {
            quarter_no,
            year_no,
        };

        tracing::debug!(
            "Requesting insights for {} {} from {}",
            quarter_no,
            year_no,
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&query)
            .send()
            .await
            .map_err(|e| AnalyticsError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnalyticsError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(AnalyticsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| AnalyticsError::Parse(e.to_string()))
    }
}
