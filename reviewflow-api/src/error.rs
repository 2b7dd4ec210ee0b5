/// Error handling for the API server
///
/// All handlers return `Result<T, ApiError>`, which converts to an HTTP
/// response with the body:
///
/// ```json
/// { "error": { "code": "NOT_FOUND", "message": "pull request not found" } }
/// ```
///
/// # Example
///
/// ```
/// use reviewflow_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler(found: bool) -> ApiResult<Json<serde_json::Value>> {
///     if !found {
///         return Err(ApiError::BadRequest("team_name is required".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use reviewflow_shared::error::{BusinessRule, DomainError, Entity};
use serde::{Deserialize, Serialize};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Error raised by the review engine
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Malformed body or missing parameter (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Well-formed request with invalid field values (400)
    #[error("Validation failed: {} errors", .0.len())]
    ValidationError(Vec<ValidationErrorDetail>),

    /// Too many requests (429)
    #[error("Rate limit exceeded: retry after {retry_after}s")]
    RateLimitExceeded { retry_after: u64 },
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code (e.g. "PR_EXISTS")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Per-field validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// HTTP status and error code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Domain(err) => match err {
                DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                DomainError::AlreadyExists(Entity::Team) => (StatusCode::BAD_REQUEST, "TEAM_EXISTS"),
                DomainError::AlreadyExists(_) => (StatusCode::CONFLICT, "PR_EXISTS"),
                DomainError::BusinessLogic(rule) => (
                    StatusCode::CONFLICT,
                    match rule {
                        BusinessRule::PullRequestMerged => "PR_MERGED",
                        BusinessRule::ReviewerNotAssigned => "NOT_ASSIGNED",
                        BusinessRule::NoCandidate => "NO_CANDIDATE",
                    },
                ),
                DomainError::Infrastructure(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::RateLimitExceeded { .. } => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let retry_after = match &self {
            ApiError::RateLimitExceeded { retry_after } => Some(*retry_after),
            _ => None,
        };

        let (message, details) = match self {
            ApiError::Domain(DomainError::Infrastructure(err)) => {
                // Log internal errors but don't expose details to clients
                tracing::error!(error = %err, "Internal error");
                ("An internal error occurred".to_string(), None)
            }
            ApiError::ValidationError(errors) => {
                ("Request validation failed".to_string(), Some(errors))
            }
            ApiError::BadRequest(message) => (message, None),
            ApiError::RateLimitExceeded { retry_after } => (
                format!("Rate limit exceeded. Try again in {} seconds", retry_after),
                None,
            ),
            other => (other.to_string(), None),
        };

        let body = Json(ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        });

        let mut response = (status, body).into_response();
        if let Some(retry_after) = retry_after {
            response
                .headers_mut()
                .insert("Retry-After", HeaderValue::from(retry_after));
        }
        response
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected request body");
        ApiError::BadRequest("invalid request body".to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(err: ApiError) -> (StatusCode, &'static str) {
        err.status_and_code()
    }

    #[test]
    fn test_domain_error_mapping() {
        assert_eq!(
            code(DomainError::NotFound(Entity::User).into()),
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        );
        assert_eq!(
            code(DomainError::AlreadyExists(Entity::PullRequest).into()),
            (StatusCode::CONFLICT, "PR_EXISTS")
        );
        assert_eq!(
            code(DomainError::AlreadyExists(Entity::Team).into()),
            (StatusCode::BAD_REQUEST, "TEAM_EXISTS")
        );
        assert_eq!(
            code(DomainError::from(BusinessRule::PullRequestMerged).into()),
            (StatusCode::CONFLICT, "PR_MERGED")
        );
        assert_eq!(
            code(DomainError::from(BusinessRule::ReviewerNotAssigned).into()),
            (StatusCode::CONFLICT, "NOT_ASSIGNED")
        );
        assert_eq!(
            code(DomainError::from(BusinessRule::NoCandidate).into()),
            (StatusCode::CONFLICT, "NO_CANDIDATE")
        );
        assert_eq!(
            code(DomainError::Infrastructure(sqlx::Error::PoolTimedOut).into()),
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        );
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("team_name is required".to_string());
        assert_eq!(err.to_string(), "Bad request: team_name is required");

        let err: ApiError = DomainError::NotFound(Entity::PullRequest).into();
        assert_eq!(err.to_string(), "pull request not found");
    }

    #[test]
    fn test_validation_error() {
        let errors = vec![
            ValidationErrorDetail {
                field: "team_name".to_string(),
                message: "must not be empty".to_string(),
            },
            ValidationErrorDetail {
                field: "members".to_string(),
                message: "invalid member".to_string(),
            },
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
        assert_eq!(err.status_and_code().1, "VALIDATION_ERROR");
    }

    #[test]
    fn test_rate_limit_response_has_retry_after() {
        let response = ApiError::RateLimitExceeded { retry_after: 3 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["Retry-After"], "3");
    }

    #[test]
    fn test_internal_error_hides_details() {
        let response =
            ApiError::from(DomainError::Infrastructure(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
