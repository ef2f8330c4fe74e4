//! Taskhive API Library
//!
//! HTTP handlers, middleware and application setup.

mod api_doc;
pub mod constants;
mod handlers;
mod middleware;
pub mod setup;
mod telemetry;

pub mod auth;
pub mod error;
pub mod state;

pub use api_doc::{get_openapi_spec, ApiDoc};
pub use error::ErrorResponse;
pub use state::{AppState, DbState};
