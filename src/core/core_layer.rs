// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "report/mod.rs"]
pub mod report;
