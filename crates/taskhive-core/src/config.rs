//! Configuration module
//!
//! Environment-driven configuration for the API server: database, authentication,
//! mail delivery, the insight provider and note storage limits.

use std::env;
use std::time::Duration;

use crate::quota::DEFAULT_NOTE_QUOTA_BYTES as NOTE_QUOTA_BYTES;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRES_IN: &str = "7d";
const BCRYPT_COST: u32 = 10;
const LLM_API_BASE: &str = "https://api.groq.com/openai/v1";
const LLM_MODEL: &str = "llama-3.1-8b-instant";
const LLM_TIMEOUT_SECS: u64 = 15;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Server, database and authentication settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expires_in: Duration,
    pub bcrypt_cost: u32,
    pub environment: String,
    pub log_format: String,
    pub http_concurrency_limit: usize,
    pub max_request_body_bytes: usize,
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    pub base: BaseConfig,
    /// Public base URL of the web client, used in emailed links
    pub app_url: String,
    // Email
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
    // Insight provider (OpenAI-compatible chat completions)
    pub llm_api_key: Option<String>,
    pub llm_api_base: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    /// Per-user cap on note text plus attachment bytes
    pub note_quota_bytes: i64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<TrackerConfig>);

impl Config {
    fn inner(&self) -> &TrackerConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.inner().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = TrackerConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn database_url(&self) -> &str {
        &self.inner().base.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn jwt_expires_in(&self) -> Duration {
        self.inner().base.jwt_expires_in
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.inner().base.bcrypt_cost
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.inner().base.http_concurrency_limit
    }

    pub fn max_request_body_bytes(&self) -> usize {
        self.inner().base.max_request_body_bytes
    }

    pub fn app_url(&self) -> &str {
        &self.inner().app_url
    }

    pub fn smtp_host(&self) -> Option<&str> {
        self.inner().smtp_host.as_deref()
    }

    pub fn smtp_port(&self) -> Option<u16> {
        self.inner().smtp_port
    }

    pub fn smtp_user(&self) -> Option<&str> {
        self.inner().smtp_user.as_deref()
    }

    pub fn smtp_password(&self) -> Option<&str> {
        self.inner().smtp_password.as_deref()
    }

    pub fn smtp_from(&self) -> Option<&str> {
        self.inner().smtp_from.as_deref()
    }

    pub fn smtp_tls(&self) -> bool {
        self.inner().smtp_tls
    }

    pub fn llm_api_key(&self) -> Option<&str> {
        self.inner().llm_api_key.as_deref()
    }

    pub fn llm_api_base(&self) -> &str {
        &self.inner().llm_api_base
    }

    pub fn llm_model(&self) -> &str {
        &self.inner().llm_model
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().llm_timeout_secs)
    }

    pub fn note_quota_bytes(&self) -> i64 {
        self.inner().note_quota_bytes
    }
}

fn is_production_name(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

/// Parse a token lifetime such as `7d`, `12h`, `30m`, `45s` or a bare number of seconds.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let (digits, unit) = match value.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => value.split_at(idx),
        None => (value, "s"),
    };
    let amount: u64 = digits.parse().ok()?;
    let multiplier = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        _ => return None,
    };
    let secs = amount.checked_mul(multiplier)?;
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_name(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let expires_raw = env::var("JWT_EXPIRES_IN").unwrap_or_else(|_| JWT_EXPIRES_IN.to_string());
        let jwt_expires_in = parse_duration(&expires_raw).ok_or_else(|| {
            anyhow::anyhow!("JWT_EXPIRES_IN must look like 7d, 12h, 30m or a number of seconds")
        })?;

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_expires_in,
            bcrypt_cost: env_or("BCRYPT_COST", BCRYPT_COST),
            environment,
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
            http_concurrency_limit: env_or("HTTP_CONCURRENCY_LIMIT", HTTP_CONCURRENCY_LIMIT).max(1),
            max_request_body_bytes: env_or("MAX_REQUEST_BODY_BYTES", MAX_REQUEST_BODY_BYTES),
        };

        let config = TrackerConfig {
            base,
            app_url: env::var("APP_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            smtp_host: env::var("SMTP_HOST").ok().filter(|s| !s.is_empty()),
            smtp_port: env::var("SMTP_PORT").ok().and_then(|s| s.parse().ok()),
            smtp_user: env::var("SMTP_USER").ok().filter(|s| !s.is_empty()),
            smtp_password: env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty()),
            smtp_from: env::var("SMTP_FROM").ok().filter(|s| !s.is_empty()),
            smtp_tls: env_or("SMTP_TLS", true),
            llm_api_key: env::var("LLM_API_KEY")
                .or_else(|_| env::var("GROQ_API_KEY"))
                .ok()
                .filter(|s| !s.is_empty()),
            llm_api_base: env::var("LLM_API_BASE")
                .unwrap_or_else(|_| LLM_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| LLM_MODEL.to_string()),
            llm_timeout_secs: env_or("LLM_TIMEOUT_SECS", LLM_TIMEOUT_SECS).max(1),
            note_quota_bytes: env_or("NOTE_QUOTA_BYTES", NOTE_QUOTA_BYTES),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !(self.base.database_url.starts_with("postgresql://")
            || self.base.database_url.starts_with("postgres://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.smtp_host.is_some() && self.smtp_from.is_none() {
            return Err(anyhow::anyhow!("SMTP_HOST requires SMTP_FROM to be set"));
        }

        if !(4..=31).contains(&self.base.bcrypt_cost) {
            return Err(anyhow::anyhow!("BCRYPT_COST must be between 4 and 31"));
        }

        if self.note_quota_bytes <= 0 {
            return Err(anyhow::anyhow!("NOTE_QUOTA_BYTES must be positive"));
        }

        Ok(())
    }
}
