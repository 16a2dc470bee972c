//! JWT authentication module.
//!
//! Bearer token verification and the acting user.
//!
//! ```text
//! Authorization: Bearer <jwt>
//!       │
//!       ▼
//! authenticate (middleware on every /api route)
//!       │  HS256 signature + expiry, sub = user id
//!       │  user must exist and be active
//!       ▼
//! request extensions ◄── ActingUser(Some(id))
//!       │
//!       ▼
//! handler: movements default their user_id to the acting user
//! ```
//!
//! With `auth.required = false` a missing header passes as
//! `ActingUser(None)`; a header that is present must still be valid.

use std::convert::Infallible;

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, ApiError> {
        self.sub
            .parse()
            .map_err(|_| ApiError::Unauthorized("Token subject is not a user id".to_string()))
    }
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    access_lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, access_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            access_lifetime_secs,
        }
    }

    /// Generate an access token for `user_id`.
    pub fn generate_access_token(&self, user_id: i64) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_lifetime_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Hashes a password for storage (argon2id, random salt).
///
/// Runs on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Password hashing task failed: {}", e)))?
    .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

// =============================================================================
// Acting user
// =============================================================================

/// The user a request acts as, if it carried a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActingUser(pub Option<i64>);

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<ActingUser>().copied().unwrap_or_default())
    }
}

/// Middleware resolving the bearer token into an [`ActingUser`].
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Owned, so no borrow of the request is held across the lookup
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default().to_string());

    let acting = match header {
        Some(header) => {
            let token = extract_bearer_token(&header).ok_or_else(|| {
                ApiError::Unauthorized("Expected a Bearer token".to_string())
            })?;
            Some(resolve_user(&state, token).await?)
        }
        None if state.config.auth.required => {
            return Err(ApiError::Unauthorized("Missing bearer token".to_string()));
        }
        None => None,
    };

    request.extensions_mut().insert(ActingUser(acting));
    Ok(next.run(request).await)
}

async fn resolve_user(state: &AppState, token: &str) -> Result<i64, ApiError> {
    let user_id = state.jwt.validate_token(token)?.user_id()?;

    let user = state
        .db
        .users()
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    if !user.active {
        return Err(ApiError::Unauthorized("User is inactive".to_string()));
    }

    debug!(user_id, "Request authenticated");
    Ok(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);

        let token = manager.generate_access_token(42).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_id().unwrap(), 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = JwtManager::new("one-secret".to_string(), 3600);
        let verifier = JwtManager::new("another-secret".to_string(), 3600);

        let token = issuer.generate_access_token(1).unwrap();
        assert!(matches!(
            verifier.validate_token(&token),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let manager = JwtManager::new("test-secret".to_string(), -3600);
        let token = manager.generate_access_token(1).unwrap();
        assert!(manager.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic dXNlcg=="), None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_hash_password_verifies() {
        let hash = hash_password("bodega".to_string()).await.unwrap();
        assert!(hash.starts_with("$argon2"));

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"bodega", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong", &parsed)
            .is_err());
    }
}
