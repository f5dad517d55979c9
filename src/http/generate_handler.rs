use super::api_response::ResponseBuilder;
use super::AppState;
use crate::core::report::GenerationRequest;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Response,
    Json,
};

/// `POST /generate`: accept the job, start it in the background, answer 202.
///
/// The caller gets no handle on the job. Whether the deck reached Drive only
/// shows up in the service log.
pub async fn generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let message = rejection.body_text();
            tracing::warn!("Rejected generate request: {}", message);
            return ResponseBuilder::error(StatusCode::BAD_REQUEST, message);
        }
    };

    if !request.has_required_fields() {
        tracing::warn!("Rejected generate request with blank fields");
        return ResponseBuilder::error(
            StatusCode::BAD_REQUEST,
            "quarter_no, year_no and file_id are required",
        );
    }

    // Detached: the handle is dropped, the job outlives this request.
    let _job = state.pipeline.spawn(request);

    ResponseBuilder::accepted("Processing")
}

#[cfg(test)]
mod tests {
    use super::super::{routes::create_routes, AppState};
    use crate::core::report::{
        AnalyticsError, DeckRenderer, DeckStore, InsightsSource, RenderError, RenderedDeck,
        ReportPipeline, SlideContentMap, UploadError, UploadedFile,
    };
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    /// Blocks every fetch until released, so tests can prove the response does
    /// not wait for the job.
    struct GatedInsights {
        started: AtomicUsize,
        release: Notify,
    }

    #[async_trait]
    impl InsightsSource for GatedInsights {
        async fn fetch_insights(
            &self,
            _quarter_no: &str,
            _year_no: &str,
        ) -> Result<SlideContentMap, AnalyticsError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(SlideContentMap::new())
        }
    }

    struct EmptyRenderer;

    impl DeckRenderer for EmptyRenderer {
        fn render(&self, _content: &SlideContentMap) -> Result<RenderedDeck, RenderError> {
            Ok(RenderedDeck {
                bytes: Vec::new(),
                slide_count: 0,
            })
        }
    }

    struct CountingStore {
        uploads: AtomicUsize,
    }

    #[async_trait]
    impl DeckStore for CountingStore {
        async fn store_deck(
            &self,
            _folder_token: &str,
            _deck: RenderedDeck,
        ) -> Result<UploadedFile, UploadError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(UploadedFile {
                id: "uploaded".to_string(),
            })
        }
    }

    struct TestApp {
        router: Router,
        insights: Arc<GatedInsights>,
        store: Arc<CountingStore>,
    }

    fn app() -> TestApp {
        let insights = Arc::new(GatedInsights {
            started: AtomicUsize::new(0),
            release: Notify::new(),
        });
        let store = Arc::new(CountingStore {
            uploads: AtomicUsize::new(0),
        });
        let pipeline = ReportPipeline::new(insights.clone(), Arc::new(EmptyRenderer), store.clone());
        let state = AppState {
            pipeline: Arc::new(pipeline),
        };

        TestApp {
            router: create_routes().with_state(state),
            insights,
            store,
        }
    }

    fn generate(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn wait_for(counter: &AtomicUsize, expected: usize) {
        for _ in 0..100 {
            if counter.load(Ordering::SeqCst) == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "counter stuck at {}, expected {}",
            counter.load(Ordering::SeqCst),
            expected
        );
    }

    #[tokio::test]
    async fn test_valid_request_is_accepted_before_job_finishes() {
        let app = app();

        let response = app
            .router
            .clone()
            .oneshot(generate(
                r#"{"quarter_no": "Q4", "year_no": "2024", "file_id": "folder-1"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"status": "Processing"})
        );

        // The job is still parked in the fetch stage.
        wait_for(&app.insights.started, 1).await;
        assert_eq!(app.store.uploads.load(Ordering::SeqCst), 0);

        app.insights.release.notify_one();
        wait_for(&app.store.uploads, 1).await;
    }

    #[tokio::test]
    async fn test_missing_field_is_rejected_without_starting_a_job() {
        let app = app();

        let response = app
            .router
            .clone()
            .oneshot(generate(r#"{"quarter_no": "Q4", "year_no": "2024"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("file_id"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(app.insights.started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wrongly_typed_field_is_rejected() {
        let app = app();

        let response = app
            .router
            .clone()
            .oneshot(generate(
                r#"{"quarter_no": 4, "year_no": "2024", "file_id": "folder-1"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(app.insights.started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_json_is_rejected() {
        let app = app();

        let response = app
            .router
            .clone()
            .oneshot(generate("{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_rejected() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/generate")
            .body(Body::from(
                r#"{"quarter_no": "Q4", "year_no": "2024", "file_id": "folder-1"}"#,
            ))
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blank_fields_are_rejected() {
        let app = app();

        let response = app
            .router
            .clone()
            .oneshot(generate(
                r#"{"quarter_no": "", "year_no": "2024", "file_id": "folder-1"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"error": "quarter_no, year_no and file_id are required"})
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(app.insights.started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = app();

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }
}
