//! Session verification and request authentication
//!
//! The identity provider issues session JWTs; this module verifies them and
//! exposes an extractor that hands handlers an [`AuthContext`] with the
//! opaque user id. Services never read ambient auth state: the requester id
//! is passed explicitly into every operation.

use crate::errors::{AppError, Result};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Claims carried by a provider-issued session token
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the opaque user id
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
}

/// Verifies session tokens issued by the identity provider
#[derive(Clone)]
pub struct SessionVerifier {
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
}

impl SessionVerifier {
    /// Create a verifier for HS256 tokens signed with the given secret
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Validation::default(),
        }
    }

    /// Validate a session token and return the authenticated user id
    pub fn verify(&self, token: &str) -> Result<String> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredSessionToken,
                _ => AppError::InvalidSessionToken,
            })
    }
}

/// Extracted authentication context available to handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Opaque identity-provider user id
    pub user_id: String,

    /// Request ID for tracing
    pub request_id: String,
}

/// Extract a bearer token from an Authorization header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
    SessionVerifier: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = extract_bearer(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Authorization header is not a bearer token".to_string(),
        })?;

        let verifier = SessionVerifier::from_ref(state);
        let user_id = verifier.verify(token)?;

        Ok(AuthContext {
            user_id,
            request_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn make_token(secret: &str, sub: &str, exp_offset_secs: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: sub.to_string(),
            exp: now + exp_offset_secs,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_round_trip() {
        let verifier = SessionVerifier::new("test_secret");
        let token = make_token("test_secret", "user_abc", 3600);
        assert_eq!(verifier.verify(&token).unwrap(), "user_abc");
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = SessionVerifier::new("test_secret");
        let token = make_token("test_secret", "user_abc", -3600);
        assert!(matches!(
            verifier.verify(&token),
            Err(AppError::ExpiredSessionToken)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = SessionVerifier::new("test_secret");
        let token = make_token("other_secret", "user_abc", 3600);
        assert!(matches!(
            verifier.verify(&token),
            Err(AppError::InvalidSessionToken)
        ));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer("abc123"), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }
}
