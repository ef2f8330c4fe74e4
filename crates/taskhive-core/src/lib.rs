//! Taskhive Core Library
//!
//! Domain models, error types, configuration and the pure rule engines
//! (authorization, hierarchy, risk, quota) shared by the other crates.

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod models;
pub mod policy;
pub mod quota;
pub mod risk;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use policy::{Actor, Denial, DenialKind, OperationClass};
