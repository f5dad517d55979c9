pub mod report_collaborators;
pub mod report_models;
pub mod report_service;

pub use report_collaborators::{
    AnalyticsError, DeckRenderer, DeckStore, InsightsSource, RenderError, UploadError,
};
pub use report_models::{
    GenerationRequest, PeriodQuery, RenderedDeck, SlideContent, SlideContentMap, UploadedFile,
};
pub use report_service::ReportPipeline;
