//! Authentication middleware for JWT token validation
//!
//! Tokens are issued by the external auth provider and signed with a shared
//! HS256 secret. The middleware verifies them and stores the caller as an
//! [`AuthUser`] in the request extensions.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// JWT claims issued by the auth provider
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    pub email: Option<String>,
    /// Provider-level role (e.g. "authenticated")
    pub role: Option<String>,
    /// Expiration time
    pub exp: u64,
    #[serde(default)]
    pub user_metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub app_metadata: Option<AppMetadata>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Application role (e.g. "seller")
    pub role: Option<String>,
}

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.app_metadata.and_then(|m| m.role),
        }
    }
}

/// Verifies access tokens against the shared secret
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
}

impl JwtVerifier {
    /// Create a verifier; an empty `audience` disables the `aud` check
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        if audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&[audience]);
        }

        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation,
        }
    }

    /// Validate a token and return the caller
    pub fn verify(&self, token: &str) -> Result<AuthUser, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims.into())
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    debug!("Verifying JWT for request: {}", req.uri());

    if !req
        .headers()
        .contains_key(axum::http::header::AUTHORIZATION)
    {
        return Err(ApiError::Unauthorized(
            "Missing Authorization header".to_string(),
        ));
    }

    let Authorization(bearer) = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

    let user = state.jwt_verifier.verify(bearer.token()).map_err(|e| {
        warn!("Failed to validate token: {}", e);
        ApiError::Unauthorized("Unauthorized".to_string())
    })?;

    debug!(
        user_id = %user.id,
        email = ?user.email,
        role = ?user.role,
        "Authenticated request"
    );
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    pub const SECRET: &str = "test-secret";

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    pub fn token_for(user_id: Uuid) -> String {
        sign(json!({
            "sub": user_id,
            "email": "bee@example.com",
            "aud": "authenticated",
            "role": "authenticated",
            "exp": now() + 3600,
            "app_metadata": { "role": "seller" },
            "user_metadata": { "name": "Bee" },
        }))
    }

    pub fn sign(claims: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_valid_token() {
        let id = Uuid::new_v4();
        let verifier = JwtVerifier::new(SECRET, "authenticated");

        let user = verifier.verify(&token_for(id)).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email.as_deref(), Some("bee@example.com"));
        assert_eq!(user.role.as_deref(), Some("seller"));
    }

    #[test]
    fn test_reject_wrong_secret() {
        let verifier = JwtVerifier::new("another-secret", "authenticated");
        assert!(verifier.verify(&token_for(Uuid::new_v4())).is_err());
    }

    #[test]
    fn test_reject_expired_token() {
        let verifier = JwtVerifier::new(SECRET, "authenticated");
        let token = sign(json!({
            "sub": Uuid::new_v4(),
            "aud": "authenticated",
            "exp": now() - 3600,
        }));
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_audience_check() {
        let token = sign(json!({
            "sub": Uuid::new_v4(),
            "aud": "anon",
            "exp": now() + 3600,
        }));

        assert!(JwtVerifier::new(SECRET, "authenticated").verify(&token).is_err());
        assert!(JwtVerifier::new(SECRET, "").verify(&token).is_ok());
    }

    #[test]
    fn test_reject_non_uuid_subject() {
        let verifier = JwtVerifier::new(SECRET, "authenticated");
        let token = sign(json!({
            "sub": "not-a-uuid",
            "aud": "authenticated",
            "exp": now() + 3600,
        }));
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_missing_metadata_gives_no_role() {
        let verifier = JwtVerifier::new(SECRET, "authenticated");
        let token = sign(json!({
            "sub": Uuid::new_v4(),
            "aud": "authenticated",
            "exp": now() + 3600,
        }));
        let user = verifier.verify(&token).unwrap();
        assert!(user.role.is_none());
        assert!(user.email.is_none());
    }
}
