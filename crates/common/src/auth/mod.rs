//! Sign-in tokens and the signed-in user extractor
//!
//! Provides:
//! - Guest sign-in tokens (HS256 JWT, subject = opaque user id)
//! - Token validation
//! - `UserContext` extraction for routes that need a signed-in user

use crate::errors::{AppError, Result};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// The signed-in user, available to handlers
#[derive(Debug, Clone)]
pub struct UserContext {
    /// Opaque user id (the token subject)
    pub user_id: String,

    /// Display name chosen at sign-in
    pub display_name: Option<String>,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// An issued sign-in token
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: i64::try_from(expiration_secs).unwrap_or(i64::MAX / 2),
        }
    }

    /// Sign in a guest: mint a fresh user id and a token for it
    pub fn issue_guest(&self, display_name: Option<String>) -> Result<IssuedToken> {
        self.generate_token(&Uuid::new_v4().to_string(), display_name)
    }

    /// Generate a token for an existing user id
    pub fn generate_token(&self, user_id: &str, display_name: Option<String>) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            name: display_name,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            AppError::Internal {
                message: format!("Failed to generate token: {}", e),
            }
        })?;

        Ok(IssuedToken {
            token,
            user_id: claims.sub,
            expires_at,
        })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::Unauthorized {
                    message: "Invalid sign-in token".to_string(),
                },
            })
    }
}

/// Token manager as seen by the extractor; `None` when no secret is configured
#[derive(Clone, Default)]
pub struct AuthState(pub Option<Arc<JwtManager>>);

impl AuthState {
    /// Build from an optional secret
    pub fn from_secret(secret: Option<&str>, expiration_secs: u64) -> Self {
        Self(
            secret
                .filter(|s| !s.is_empty())
                .map(|s| Arc::new(JwtManager::new(s, expiration_secs))),
        )
    }

    /// The token manager, or a configuration error when sign-in is disabled
    pub fn manager(&self) -> Result<&JwtManager> {
        self.0.as_deref().ok_or_else(|| AppError::Configuration {
            message: "Sign-in is not configured (auth.jwt_secret is missing)".to_string(),
        })
    }

    /// Whether a secret is configured
    pub fn is_enabled(&self) -> bool {
        self.0.is_some()
    }
}

/// Extract the bearer token from an Authorization header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Axum extractor for the signed-in user
impl<S> FromRequestParts<S> for UserContext
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let auth = AuthState::from_ref(state);
        let manager = auth.manager()?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "You must be signed in".to_string(),
            })?;

        let token = extract_bearer(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Expected a Bearer token".to_string(),
        })?;

        let claims = manager.validate_token(token)?;

        Ok(UserContext {
            user_id: claims.sub,
            display_name: claims.name,
        })
    }
}
