// =============================================================================
// GOOGLE DRIVE MODULE
// =============================================================================
//
// Files generated decks into a Drive folder. Lives in the infra layer because
// it is all external I/O; the core only sees `DeckStore`.
//
// Authentication is a service account (see `service_account.rs`). The folder the
// deck goes into must be shared with the service account's email.

pub mod drive_uploader;
pub mod service_account;

pub use drive_uploader::DriveUploader;
pub use service_account::ServiceAccountAuth;
