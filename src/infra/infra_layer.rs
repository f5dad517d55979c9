// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "analytics/mod.rs"]
pub mod analytics;

#[path = "pptx/mod.rs"]
pub mod pptx;

#[path = "google_drive/mod.rs"]
pub mod google_drive;
