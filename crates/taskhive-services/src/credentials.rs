//! Credential primitives: bcrypt password hashing, password-reset tokens and
//! temporary passwords for invited team leads.
//!
//! Hashing is CPU bound, so both hash and verify run on the blocking pool.

use rand::Rng;
use taskhive_core::AppError;
use tokio::sync::OnceCell;

/// Characters used for temporary passwords. Visually ambiguous glyphs (I, O, l, 0, 1) are left out.
const TEMP_PASSWORD_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";
pub const TEMP_PASSWORD_LEN: usize = 8;
const RESET_TOKEN_BYTES: usize = 32;

/// Hash of a throwaway password, created on first use
static DECOY_HASH: OnceCell<String> = OnceCell::const_new();

/// Hash a password with bcrypt at the given cost.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Compare a password against a stored bcrypt hash.
///
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?;

    match outcome {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash could not be parsed");
            Ok(false)
        }
    }
}

/// Spend one bcrypt verification on a throwaway hash. Login calls this for unknown
/// emails so they take as long as a wrong password.
pub async fn verify_decoy(password: &str, cost: u32) -> Result<(), AppError> {
    let hash = DECOY_HASH
        .get_or_try_init(|| async move { hash_password(&generate_temporary_password(), cost).await })
        .await?;
    verify_password(password, hash).await?;
    Ok(())
}

/// 32 random bytes, hex encoded (64 characters).
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

pub fn generate_temporary_password() -> String {
    let mut rng = rand::rng();
    (0..TEMP_PASSWORD_LEN)
        .map(|_| {
            let idx = rng.random_range(0..TEMP_PASSWORD_ALPHABET.len());
            TEMP_PASSWORD_ALPHABET[idx] as char
        })
        .collect()
}
