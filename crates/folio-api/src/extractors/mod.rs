//! Axum extractors for request handling
//!
//! Custom extractors for authentication, validation, and path ids.

mod auth;
mod path;
mod validated;

pub use auth::Caller;
pub use path::IdPath;
pub use validated::{ValidatedJson, ValidatedQuery};
