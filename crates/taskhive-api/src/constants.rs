/// API route prefix
pub const API_PREFIX: &str = "/api";

/// Name of the session cookie set on login
pub const SESSION_COOKIE: &str = "token";

/// Client-facing message for any failed login
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 6;
