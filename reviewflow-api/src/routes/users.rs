/// User endpoints
///
/// # Endpoints
///
/// - `POST /users/setIsActive` - Toggle a user's activity flag
/// - `GET /users/getReview?user_id=` - Pull requests a user reviews

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::pull_requests::PullRequestShortResponse,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use reviewflow_shared::engine::UserMembership;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Set activity request
#[derive(Debug, Deserialize, Validate)]
pub struct SetIsActiveRequest {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,

    pub is_active: bool,
}

/// User with team name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,

    /// Empty when the user has no team
    pub team_name: String,

    pub is_active: bool,
}

impl From<UserMembership> for UserResponse {
    fn from(membership: UserMembership) -> Self {
        Self {
            user_id: membership.user.user_id,
            username: membership.user.username,
            team_name: membership.team_name.unwrap_or_default(),
            is_active: membership.user.is_active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: String,
}

/// Reviews of one user
#[derive(Debug, Serialize, Deserialize)]
pub struct GetReviewResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShortResponse>,
}

/// Set a user's activity flag
///
/// Inactive users are skipped by future reviewer draws; existing
/// assignments stay as they are.
///
/// # Endpoint
///
/// ```text
/// POST /users/setIsActive
/// Content-Type: application/json
///
/// { "user_id": "u2", "is_active": false }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Unknown user
pub async fn set_is_active(
    State(state): State<AppState>,
    req: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> ApiResult<Json<UserEnvelope>> {
    let Json(req) = req?;
    req.validate()?;

    let membership = state
        .engine
        .set_user_active(&req.user_id, req.is_active)
        .await?;

    Ok(Json(UserEnvelope {
        user: membership.into(),
    }))
}

/// List every pull request the user reviews, in any state
///
/// Unknown users get an empty list.
///
/// # Endpoint
///
/// ```text
/// GET /users/getReview?user_id=u2
/// ```
pub async fn get_review(
    State(state): State<AppState>,
    query: Result<Query<UserIdQuery>, QueryRejection>,
) -> ApiResult<Json<GetReviewResponse>> {
    let Query(query) = query?;
    if query.user_id.is_empty() {
        return Err(ApiError::BadRequest("user_id is required".to_string()));
    }

    let reviews = state.engine.list_user_reviews(&query.user_id).await?;

    Ok(Json(GetReviewResponse {
        user_id: query.user_id,
        pull_requests: reviews.into_iter().map(Into::into).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewflow_shared::models::User;

    #[test]
    fn test_user_response_without_team() {
        let response = UserResponse::from(UserMembership {
            user: User {
                user_id: "u1".to_string(),
                username: "Alice".to_string(),
                team_id: None,
                is_active: false,
            },
            team_name: None,
        });

        assert_eq!(response.team_name, "");
        assert!(!response.is_active);
    }

    #[test]
    fn test_missing_is_active_is_rejected() {
        let parsed = serde_json::from_str::<SetIsActiveRequest>(r#"{"user_id":"u1"}"#);
        assert!(parsed.is_err());
    }
}
