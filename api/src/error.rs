//! API error type and its HTTP mapping

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use platform_tenant::{RegistryError, TenantError};
use thiserror::Error;

use crate::models::ApiResponse;
use crate::services::tokens::TokenError;
use crate::services::users::UserStoreError;

/// Result type for handlers
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// API error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    QuotaExceeded(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::QuotaExceeded(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Validation(_) => "validation_error",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::QuotaExceeded(_) => "quota_exceeded",
            Self::NotFound(_) => "not_found",
            Self::Conflict { code, .. } => *code,
            Self::RateLimited { .. } => "rate_limited",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (status, Json(ApiResponse::<()>::error(self.code(), &message))).into_response();
        if let Self::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

impl From<TenantError> for ApiError {
    fn from(err: TenantError) -> Self {
        let code = match err {
            TenantError::InvalidStateTransition { .. } => "invalid_state_transition",
            TenantError::AlreadyArchived => "already_archived",
        };
        Self::Conflict {
            code,
            message: err.to_string(),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => Self::NotFound(err.to_string()),
            RegistryError::SlugTaken(_) => Self::Conflict {
                code: "slug_taken",
                message: err.to_string(),
            },
            RegistryError::InvalidSlug => Self::Validation(err.to_string()),
            RegistryError::CapacityReached(_) => Self::Conflict {
                code: "tenant_limit_reached",
                message: err.to_string(),
            },
            RegistryError::Tenant(inner) => inner.into(),
        }
    }
}

impl From<UserStoreError> for ApiError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::EmailTaken(_) => Self::Conflict {
                code: "email_taken",
                message: err.to_string(),
            },
            UserStoreError::QuotaExceeded { .. } => Self::QuotaExceeded(err.to_string()),
            UserStoreError::NotFound(_) => Self::NotFound(err.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encode(_) => Self::Internal(err.to_string()),
            _ => Self::Unauthorized(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_tenant::{TenantOperation, TenantStatus};

    #[test]
    fn test_lifecycle_errors_map_to_conflict() {
        let err: ApiError = TenantError::InvalidStateTransition {
            current: TenantStatus::Pending,
            operation: TenantOperation::Suspend,
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "invalid_state_transition");

        let err: ApiError = RegistryError::Tenant(TenantError::AlreadyArchived).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "already_archived");
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited { retry_after_secs: 7 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "7");
    }

    #[test]
    fn test_registry_not_found() {
        let err: ApiError = RegistryError::NotFound(uuid::Uuid::new_v4()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
