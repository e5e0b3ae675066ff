//! Custom extractors for Axum handlers.
//!
//! Both reject with the shared `ErrorResponse` body and a 400 status.

pub mod id_path;
pub mod validated_json;

pub use id_path::IdPath;
pub use validated_json::ValidatedJson;
