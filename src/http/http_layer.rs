// HTTP layer - routes and handlers. Turns requests into core calls and core
// results into responses; no business logic lives here.

use crate::core::report::ReportPipeline;
use std::sync::Arc;

#[path = "api_response.rs"]
pub mod api_response;

#[path = "generate_handler.rs"]
pub mod generate_handler;

#[path = "routes.rs"]
pub mod routes;

/// Shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ReportPipeline>,
}
