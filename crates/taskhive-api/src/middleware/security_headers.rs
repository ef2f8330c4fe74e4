use axum::http::HeaderValue;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Path prefix of the API explorer, which loads its script from a CDN
const DOCS_PREFIX: &str = "/docs";

/// Script host the API explorer page pulls RapiDoc from
const DOCS_SCRIPT_HOST: &str = "https://unpkg.com";

/// Security headers configuration
#[derive(Clone)]
pub struct SecurityHeadersConfig {
    pub is_production: bool,
}

impl SecurityHeadersConfig {
    pub fn new(is_production: bool) -> Self {
        Self { is_production }
    }

    /// Content-Security-Policy value. JSON responses need nothing; the docs page
    /// needs its script host.
    fn build_csp(&self, docs: bool) -> String {
        if docs {
            [
                "default-src 'self'".to_string(),
                format!("script-src 'self' {}", DOCS_SCRIPT_HOST),
                "style-src 'self' 'unsafe-inline'".to_string(),
                "img-src 'self' data:".to_string(),
                "connect-src 'self'".to_string(),
                "frame-ancestors 'none'".to_string(),
            ]
            .join("; ")
        } else {
            "default-src 'none'; frame-ancestors 'none'".to_string()
        }
    }
}

/// Adds security headers to all HTTP responses
pub async fn security_headers_middleware(
    State(config): State<Arc<SecurityHeadersConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let docs = request.uri().path().starts_with(DOCS_PREFIX);
    let mut response = next.run(request).await;

    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // Only meaningful behind HTTPS
    if config.is_production {
        headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    if let Ok(header_value) = HeaderValue::from_str(&config.build_csp(docs)) {
        headers.insert("Content-Security-Policy", header_value);
    }

    headers.insert(
        "Permissions-Policy",
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );

    // Responses are per-user; never let shared caches keep them
    headers.insert(
        "Cache-Control",
        HeaderValue::from_static("no-store, private"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_csp_denies_everything() {
        let config = SecurityHeadersConfig::new(false);
        assert_eq!(
            config.build_csp(false),
            "default-src 'none'; frame-ancestors 'none'"
        );
    }

    #[test]
    fn docs_csp_allows_script_host() {
        let csp = SecurityHeadersConfig::new(true).build_csp(true);
        assert!(csp.contains("script-src 'self' https://unpkg.com"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }
}
