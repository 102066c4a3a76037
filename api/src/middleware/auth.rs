//! Bearer token authentication

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::services::tokens::{Claims, TokenKind};
use crate::ApiState;

/// Verified access-token claims of the caller
#[derive(Debug, Clone)]
pub struct AuthClaims(pub Claims);

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for AuthClaims {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<ApiState>) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;

        let claims = state.tokens.verify(token, TokenKind::Access)?;
        Ok(Self(claims))
    }
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
