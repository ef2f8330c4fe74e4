//! Taskhive Services Layer
//!
//! External collaborators the API talks to through traits: outbound mail, the
//! insight (LLM) provider with its deterministic fallbacks, and credential
//! primitives (password hashing, reset tokens, temporary passwords). Handlers
//! depend on the traits so tests can inject failing implementations.

pub mod credentials;
pub mod insights;
pub mod mail;

pub use credentials::{
    generate_reset_token, generate_temporary_password, hash_password, verify_decoy, verify_password,
};
#[cfg(feature = "llm")]
pub use insights::ChatCompletionsClient;
pub use insights::{InsightProvider, InsightRequest, InsightSummarizer};
pub use mail::{mailer_from_config, LogMailer, MailMessage, Mailer};
#[cfg(feature = "smtp")]
pub use mail::SmtpMailer;
