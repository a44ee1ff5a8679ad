//! Tubely API Library
//!
//! HTTP handlers, authentication, the ingestion service and application setup.

mod api_doc;
pub mod auth;
pub mod error;
mod handlers;
pub mod services;
pub mod setup;
pub mod state;
mod telemetry;

pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
