//! Service initialization and application state setup

use crate::state::AppState;
use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use taskhive_core::Config;
use taskhive_services::{mailer_from_config, InsightSummarizer};

/// Build the mailer and insight summarizer from config and assemble the state
pub fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let mailer = mailer_from_config(config);
    let summarizer = InsightSummarizer::from_config(config);

    tracing::info!(
        llm_enabled = summarizer.has_provider(),
        smtp_configured = config.smtp_host().is_some(),
        note_quota_bytes = config.note_quota_bytes(),
        "Services initialized"
    );

    Ok(Arc::new(AppState::new(
        config.clone(),
        pool,
        mailer,
        summarizer,
    )))
}
