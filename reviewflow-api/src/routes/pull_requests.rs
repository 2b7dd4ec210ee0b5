/// Pull request endpoints
///
/// # Endpoints
///
/// - `POST /pullRequest/create` - Create a pull request with random reviewers
/// - `POST /pullRequest/merge` - Merge (idempotent)
/// - `POST /pullRequest/reassign` - Replace one reviewer

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use reviewflow_shared::models::PullRequest;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Create pull request request
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePullRequestRequest {
    #[validate(length(min = 1, message = "pull_request_id is required"))]
    pub pull_request_id: String,

    #[validate(length(min = 1, message = "pull_request_name is required"))]
    pub pull_request_name: String,

    #[validate(length(min = 1, message = "author_id is required"))]
    pub author_id: String,
}

/// Merge pull request request
#[derive(Debug, Deserialize, Validate)]
pub struct MergePullRequestRequest {
    #[validate(length(min = 1, message = "pull_request_id is required"))]
    pub pull_request_id: String,
}

/// Reassign reviewer request
#[derive(Debug, Deserialize, Validate)]
pub struct ReassignReviewerRequest {
    #[validate(length(min = 1, message = "pull_request_id is required"))]
    pub pull_request_id: String,

    /// Reviewer to replace
    #[validate(length(min = 1, message = "old_user_id is required"))]
    pub old_user_id: String,
}

/// Full pull request representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,

    /// "OPEN" or "MERGED"
    pub status: String,

    pub assigned_reviewers: Vec<String>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "mergedAt", skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl From<PullRequest> for PullRequestResponse {
    fn from(pr: PullRequest) -> Self {
        Self {
            status: pr.status.as_str().to_string(),
            pull_request_id: pr.pull_request_id,
            pull_request_name: pr.title,
            author_id: pr.author_id,
            assigned_reviewers: pr.reviewers,
            created_at: pr.created_at,
            merged_at: pr.merged_at,
        }
    }
}

/// Pull request summary used in review listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestShortResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: String,
}

impl From<PullRequest> for PullRequestShortResponse {
    fn from(pr: PullRequest) -> Self {
        Self {
            status: pr.status.as_str().to_string(),
            pull_request_id: pr.pull_request_id,
            pull_request_name: pr.title,
            author_id: pr.author_id,
        }
    }
}

/// `{"pr": ...}` envelope for create and merge
#[derive(Debug, Serialize, Deserialize)]
pub struct PullRequestEnvelope {
    pub pr: PullRequestResponse,
}

/// Reassign response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReassignResponse {
    pub pr: PullRequestResponse,

    /// Reviewer that took over
    pub replaced_by: String,
}

/// Create a pull request
///
/// Up to two active teammates of the author are assigned at random.
///
/// # Endpoint
///
/// ```text
/// POST /pullRequest/create
/// Content-Type: application/json
///
/// {
///   "pull_request_id": "pr-1001",
///   "pull_request_name": "Add search",
///   "author_id": "u1"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "pr": {
///     "pull_request_id": "pr-1001",
///     "pull_request_name": "Add search",
///     "author_id": "u1",
///     "status": "OPEN",
///     "assigned_reviewers": ["u2", "u3"],
///     "createdAt": "2025-01-01T12:00:00Z"
///   }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or missing fields
/// - `404 Not Found`: Unknown author
/// - `409 Conflict` (`PR_EXISTS`): ID already taken
pub async fn create_pull_request(
    State(state): State<AppState>,
    req: Result<Json<CreatePullRequestRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PullRequestEnvelope>)> {
    let Json(req) = req?;
    req.validate()?;

    let pr = state
        .engine
        .create_pull_request(&req.pull_request_id, &req.pull_request_name, &req.author_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PullRequestEnvelope { pr: pr.into() }),
    ))
}

/// Merge a pull request
///
/// Merging an already merged pull request returns it unchanged.
///
/// # Endpoint
///
/// ```text
/// POST /pullRequest/merge
/// Content-Type: application/json
///
/// { "pull_request_id": "pr-1001" }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Unknown pull request
pub async fn merge_pull_request(
    State(state): State<AppState>,
    req: Result<Json<MergePullRequestRequest>, JsonRejection>,
) -> ApiResult<Json<PullRequestEnvelope>> {
    let Json(req) = req?;
    req.validate()?;

    let pr = state.engine.merge_pull_request(&req.pull_request_id).await?;

    Ok(Json(PullRequestEnvelope { pr: pr.into() }))
}

/// Replace a reviewer with a random active teammate of theirs
///
/// # Endpoint
///
/// ```text
/// POST /pullRequest/reassign
/// Content-Type: application/json
///
/// { "pull_request_id": "pr-1001", "old_user_id": "u2" }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Unknown pull request or user
/// - `409 Conflict`: `PR_MERGED`, `NOT_ASSIGNED` or `NO_CANDIDATE`
pub async fn reassign_reviewer(
    State(state): State<AppState>,
    req: Result<Json<ReassignReviewerRequest>, JsonRejection>,
) -> ApiResult<Json<ReassignResponse>> {
    let Json(req) = req?;
    req.validate()?;

    let result = state
        .engine
        .reassign_reviewer(&req.pull_request_id, &req.old_user_id)
        .await?;

    Ok(Json(ReassignResponse {
        pr: result.pull_request.into(),
        replaced_by: result.replaced_by,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewflow_shared::models::PullRequestStatus;

    fn pr(status: PullRequestStatus) -> PullRequest {
        PullRequest {
            pull_request_id: "pr-1".to_string(),
            title: "Add search".to_string(),
            author_id: "u1".to_string(),
            status,
            reviewers: vec!["u2".to_string()],
            created_at: Utc::now(),
            merged_at: (status == PullRequestStatus::Merged).then(Utc::now),
        }
    }

    #[test]
    fn test_response_field_names() {
        let json = serde_json::to_value(PullRequestResponse::from(pr(PullRequestStatus::Open)))
            .unwrap();

        assert_eq!(json["pull_request_name"], "Add search");
        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["assigned_reviewers"][0], "u2");
        assert!(json["createdAt"].is_string());
        assert!(json.get("mergedAt").is_none());
    }

    #[test]
    fn test_merged_response_has_merged_at() {
        let json = serde_json::to_value(PullRequestResponse::from(pr(PullRequestStatus::Merged)))
            .unwrap();
        assert_eq!(json["status"], "MERGED");
        assert!(json["mergedAt"].is_string());
    }

    #[test]
    fn test_create_request_validation() {
        let req = CreatePullRequestRequest {
            pull_request_id: String::new(),
            pull_request_name: "x".to_string(),
            author_id: "u1".to_string(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("pull_request_id"));
    }
}
