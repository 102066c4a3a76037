//! JWT issuing, verification and revocation

use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::services::users::User;
use crate::settings::AuthSettings;

/// Access or refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub role: String,
    pub kind: TokenKind,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Issued token pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("token has been revoked")]
    Revoked,
    #[error("expected a {expected:?} token")]
    WrongKind { expected: TokenKind },
}

/// HS256 token service with an in-memory revocation list
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    /// Revoked jti -> expiry (unix seconds)
    revoked: DashMap<Uuid, i64>,
}

impl TokenService {
    pub fn new(auth: &AuthSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[auth.jwt_issuer.as_str()]);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
            validation,
            issuer: auth.jwt_issuer.clone(),
            access_ttl: Duration::minutes(auth.access_token_expire_minutes),
            refresh_ttl: Duration::days(auth.refresh_token_expire_days),
            revoked: DashMap::new(),
        }
    }

    /// Issue an access/refresh pair for `user`
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue(user, TokenKind::Access)?,
            refresh_token: self.issue(user, TokenKind::Refresh)?,
            token_type: "bearer".into(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    fn issue(&self, user: &User, kind: TokenKind) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user.id,
            tenant_id: user.tenant_id,
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: self.issuer.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Encode)
    }

    /// Decode and check signature, expiry, issuer, kind and revocation
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?
            .claims;

        if claims.kind != expected {
            return Err(TokenError::WrongKind { expected });
        }
        if self.revoked.contains_key(&claims.jti) {
            return Err(TokenError::Revoked);
        }
        Ok(claims)
    }

    /// Revoke a token until it would have expired anyway.
    /// Fails if the token was already revoked.
    pub fn revoke(&self, claims: &Claims) -> Result<(), TokenError> {
        self.purge_expired();
        if self.revoked.insert(claims.jti, claims.exp).is_some() {
            return Err(TokenError::Revoked);
        }
        Ok(())
    }

    /// Consume a refresh token, returning its claims. A refresh token can be
    /// rotated once.
    pub fn rotate(&self, refresh_token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(refresh_token, TokenKind::Refresh)?;
        self.revoke(&claims)?;
        Ok(claims)
    }

    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }

    fn purge_expired(&self) {
        let now = Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::settings::Settings;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            name: "Ada".into(),
            role: UserRole::Admin,
            password_hash: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let service = TokenService::new(&Settings::default().auth);
        let user = user();
        let pair = service.issue_pair(&user).unwrap();
        assert_eq!(pair.token_type, "bearer");
        assert_eq!(pair.expires_in, 30 * 60);

        let claims = service.verify(&pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.tenant_id, user.tenant_id);
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.iss, "platform-api");

        assert!(matches!(
            service.verify(&pair.access_token, TokenKind::Refresh),
            Err(TokenError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let service = TokenService::new(&Settings::default().auth);
        let mut other = Settings::default().auth;
        other.jwt_secret = "another-secret-another-secret-xx".into();
        let foreign = TokenService::new(&other).issue_pair(&user()).unwrap();

        assert!(matches!(
            service.verify(&foreign.access_token, TokenKind::Access),
            Err(TokenError::Invalid)
        ));
        assert!(matches!(service.verify("garbage", TokenKind::Access), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_revocation() {
        let service = TokenService::new(&Settings::default().auth);
        let pair = service.issue_pair(&user()).unwrap();
        let claims = service.verify(&pair.access_token, TokenKind::Access).unwrap();

        service.revoke(&claims).unwrap();
        assert!(matches!(
            service.verify(&pair.access_token, TokenKind::Access),
            Err(TokenError::Revoked)
        ));
        assert_eq!(service.revoked_count(), 1);
    }

    #[test]
    fn test_refresh_rotates_once() {
        let service = TokenService::new(&Settings::default().auth);
        let pair = service.issue_pair(&user()).unwrap();

        service.rotate(&pair.refresh_token).unwrap();
        assert!(matches!(service.rotate(&pair.refresh_token), Err(TokenError::Revoked)));
    }
}
