//! Session token issue and verification (HS256).

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use taskhive_core::models::{Role, User};
use taskhive_core::AppError;
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub organization_id: Option<Uuid>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expires_in_secs: i64,
}

impl JwtService {
    pub fn new(secret: &str, expires_in: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expires_in_secs: i64::try_from(expires_in.as_secs()).unwrap_or(i64::MAX),
        }
    }

    pub fn expires_in_secs(&self) -> i64 {
        self.expires_in_secs
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            organization_id: user.organization_id,
            iat: now,
            exp: now.saturating_add(self.expires_in_secs),
        };
        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Check signature and expiry. Every failure maps to [`AppError::InvalidToken`].
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "lead@acme.io".to_string(),
            name: Some("Bob".to_string()),
            role: Role::TeamLead,
            password_hash: String::new(),
            organization_id: Some(Uuid::new_v4()),
            team_lead_id: None,
            tl_id_within_org: Some(1),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let jwt = JwtService::new(SECRET, Duration::from_secs(3600));
        let user = user();
        let claims = jwt.verify(&jwt.issue(&user).unwrap()).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::TeamLead);
        assert_eq!(claims.organization_id, user.organization_id);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = JwtService::new(SECRET, Duration::from_secs(3600));
        let verifier = JwtService::new("another-secret-another-secret-xx", Duration::from_secs(3600));
        let err = verifier.verify(&issuer.issue(&user()).unwrap()).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = JwtService::new(SECRET, Duration::from_secs(3600));
        let user = user();
        let past = Utc::now().timestamp() - 7200;
        let token = jwt
            .encode(&Claims {
                sub: user.id,
                email: user.email,
                role: user.role,
                organization_id: None,
                iat: past - 3600,
                exp: past,
            })
            .unwrap();
        assert!(matches!(jwt.verify(&token), Err(AppError::InvalidToken(_))));
    }

    #[test]
    fn malformed_token_is_rejected() {
        let jwt = JwtService::new(SECRET, Duration::from_secs(60));
        assert!(matches!(jwt.verify("not.a.jwt"), Err(AppError::InvalidToken(_))));
    }
}
