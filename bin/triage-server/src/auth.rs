//! Password hashing and bearer-token issuing.
//!
//! Passwords are stored as Argon2id PHC strings.  Sessions are stateless
//! HS256 JWTs carrying the user id, email and role; revocation is by expiry
//! only.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::entities::UserRecord;
use crate::error::ServerError;

/// Claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    /// `"USER"` or `"ADMIN"`.
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == "ADMIN"
    }
}

/// HS256 key pair plus validation rules, derived once from the configured
/// secret and shared via [`crate::state::AppState`].
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_hours: i64,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        write!(f, "TokenKeys(ttl = {}h)", self.ttl_hours)
    }
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl_hours,
        }
    }

    /// Sign a fresh access token for `user`.
    pub fn issue(&self, user: &UserRecord) -> Result<String, ServerError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.ttl_hours)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServerError::Internal(format!("token signing failed: {e}")))
    }

    /// Decode and verify a bearer token.  Any failure (bad signature, wrong
    /// algorithm, expired) is reported as plain `Unauthorized`.
    pub fn validate(&self, token: &str) -> Result<Claims, ServerError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| ServerError::Unauthorized)
    }
}

pub fn hash_password(password: &str) -> Result<String, ServerError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ServerError::Internal(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// `Ok(false)` means the password does not match; `Err` means the stored hash
/// itself is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ServerError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ServerError::Internal(format!("stored password hash is invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    fn user(role: &str) -> UserRecord {
        UserRecord {
            id: "u-1".to_string(),
            email: "analyst@example.com".to_string(),
            name: None,
            password_hash: String::new(),
            role: role.to_string(),
            is_active: true,
            group_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trips_and_carries_the_role() {
        let keys = TokenKeys::new("test-secret", 24);
        let token = keys.issue(&user("ADMIN")).unwrap();
        let claims = keys.validate(&token).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.email, "analyst@example.com");
        assert!(claims.is_admin());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let keys = TokenKeys::new("test-secret", 24);
        let other = TokenKeys::new("other-secret", 24);
        let token = other.issue(&user("USER")).unwrap();
        assert!(matches!(
            keys.validate(&token),
            Err(ServerError::Unauthorized)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::new("test-secret", -2);
        let token = keys.issue(&user("USER")).unwrap();
        assert!(matches!(
            keys.validate(&token),
            Err(ServerError::Unauthorized)
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let keys = TokenKeys::new("test-secret", 24);
        assert!(matches!(
            keys.validate("not-a-jwt"),
            Err(ServerError::Unauthorized)
        ));
    }

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret!", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn unreadable_stored_hash_is_an_error() {
        assert!(verify_password("anything", "plaintext-left-over").is_err());
    }
}
