//! Data models for the application
//!
//! Each sub-module covers one persisted entity plus the request/response shapes
//! that travel with it.

mod insight;
mod note;
mod organization;
mod password_reset;
mod project;
mod task;
mod user;

pub use insight::*;
pub use note::*;
pub use organization::*;
pub use password_reset::*;
pub use project::*;
pub use task::*;
pub use user::*;
