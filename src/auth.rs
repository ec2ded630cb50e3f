/// Authentication extractors and utilities
use crate::{context::AppContext, error::ShareError};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

/// Authenticated caller - the `sub` claim of a verified bearer JWT
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub uid: String,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = ShareError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| ShareError::Authentication("Missing authorization header".to_string()))?;

        let token_data = verify_jwt_token(&token, &state.config.authentication.jwt_secret)?;

        let uid = token_data
            .claims
            .get("sub")
            .and_then(|v| v.as_str())
            .filter(|sub| !sub.is_empty())
            .ok_or_else(|| ShareError::Authentication("Invalid JWT: missing 'sub' claim".to_string()))?
            .to_string();

        tracing::debug!("Authenticated request for user {}", uid);

        Ok(AuthContext { uid })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Verify a JWT token with full validation
///
/// This performs:
/// 1. JWT signature verification
/// 2. Expiration checking
/// 3. Claims validation
pub fn verify_jwt_token(
    token: &str,
    jwt_secret: &str,
) -> Result<jsonwebtoken::TokenData<serde_json::Value>, ShareError> {
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    // Allow some clock skew (5 minutes)
    validation.leeway = 300;

    decode::<serde_json::Value>(token, &decoding_key, &validation).map_err(|e| {
        tracing::warn!("JWT verification failed: {}", e);
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ShareError::Authentication("Token has expired".to_string())
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ShareError::Authentication("Invalid token signature".to_string())
            }
            _ => ShareError::Authentication(format!("Invalid token: {}", e)),
        }
    })
}
