/// Team endpoints
///
/// # Endpoints
///
/// - `POST /team/add` - Create a team and upsert its members
/// - `GET /team/get?team_name=` - Team with all members
/// - `POST /team/deactivateMembers` - Deactivate a team and prune its reviews

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use reviewflow_shared::engine::{TeamMember, TeamRoster};
use reviewflow_shared::models::User;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use validator::{Validate, ValidationError};

/// Team member as sent and returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMemberDto {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

impl From<User> for TeamMemberDto {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            is_active: user.is_active,
        }
    }
}

impl From<TeamMemberDto> for TeamMember {
    fn from(dto: TeamMemberDto) -> Self {
        Self {
            user_id: dto.user_id,
            username: dto.username,
            is_active: dto.is_active,
        }
    }
}

/// Create team request
#[derive(Debug, Deserialize, Validate)]
pub struct AddTeamRequest {
    #[validate(length(min = 1, max = 255, message = "team_name must be 1-255 characters"))]
    pub team_name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_members"))]
    pub members: Vec<TeamMemberDto>,
}

/// Every member needs an ID, and IDs must not repeat
fn validate_members(members: &[TeamMemberDto]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for member in members {
        if member.user_id.trim().is_empty() {
            return Err(member_error("every member needs a user_id"));
        }
        if !seen.insert(member.user_id.as_str()) {
            return Err(member_error("duplicate user_id in members"));
        }
    }
    Ok(())
}

fn member_error(message: &'static str) -> ValidationError {
    let mut error = ValidationError::new("members");
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Team with members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamResponse {
    pub team_name: String,
    pub members: Vec<TeamMemberDto>,
}

impl From<TeamRoster> for TeamResponse {
    fn from(roster: TeamRoster) -> Self {
        Self {
            team_name: roster.team.name,
            members: roster.members.into_iter().map(Into::into).collect(),
        }
    }
}

/// `{"team": ...}` envelope returned on creation
#[derive(Debug, Serialize, Deserialize)]
pub struct TeamEnvelope {
    pub team: TeamResponse,
}

#[derive(Debug, Deserialize)]
pub struct TeamNameQuery {
    pub team_name: String,
}

/// Deactivate team request
#[derive(Debug, Deserialize, Validate)]
pub struct DeactivateTeamRequest {
    #[validate(length(min = 1, message = "team_name is required"))]
    pub team_name: String,
}

/// Deactivate team response
#[derive(Debug, Serialize, Deserialize)]
pub struct DeactivateTeamResponse {
    pub team_name: String,

    /// Open pull requests that lost at least one reviewer
    pub reassigned_prs_count: u64,
}

/// Create a team
///
/// Existing users listed as members move into the new team.
///
/// # Endpoint
///
/// ```text
/// POST /team/add
/// Content-Type: application/json
///
/// {
///   "team_name": "backend",
///   "members": [
///     { "user_id": "u1", "username": "Alice", "is_active": true },
///     { "user_id": "u2", "username": "Bob", "is_active": true }
///   ]
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request` (`TEAM_EXISTS`): Name already taken
/// - `400 Bad Request` (`VALIDATION_ERROR`): Empty name or bad members
pub async fn add_team(
    State(state): State<AppState>,
    req: Result<Json<AddTeamRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TeamEnvelope>)> {
    let Json(req) = req?;
    req.validate()?;

    let members = req.members.into_iter().map(Into::into).collect();
    let roster = state
        .engine
        .create_team_with_members(&req.team_name, members)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TeamEnvelope {
            team: roster.into(),
        }),
    ))
}

/// Get a team and all of its members
///
/// # Endpoint
///
/// ```text
/// GET /team/get?team_name=backend
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing `team_name`
/// - `404 Not Found`: Unknown team
pub async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamNameQuery>, QueryRejection>,
) -> ApiResult<Json<TeamResponse>> {
    let Query(query) = query?;
    if query.team_name.is_empty() {
        return Err(ApiError::BadRequest("team_name is required".to_string()));
    }

    let roster = state.engine.get_team(&query.team_name).await?;
    Ok(Json(roster.into()))
}

/// Deactivate every active member and drop them from open reviews
///
/// # Endpoint
///
/// ```text
/// POST /team/deactivateMembers
/// Content-Type: application/json
///
/// { "team_name": "backend" }
/// ```
///
/// # Response
///
/// ```json
/// { "team_name": "backend", "reassigned_prs_count": 3 }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Unknown team
pub async fn deactivate_members(
    State(state): State<AppState>,
    req: Result<Json<DeactivateTeamRequest>, JsonRejection>,
) -> ApiResult<Json<DeactivateTeamResponse>> {
    let Json(req) = req?;
    req.validate()?;

    let count = state
        .engine
        .deactivate_team_and_reassign(&req.team_name)
        .await?;

    Ok(Json(DeactivateTeamResponse {
        team_name: req.team_name,
        reassigned_prs_count: count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(id: &str) -> TeamMemberDto {
        TeamMemberDto {
            user_id: id.to_string(),
            username: id.to_uppercase(),
            is_active: true,
        }
    }

    #[test]
    fn test_members_validation() {
        assert!(validate_members(&[dto("u1"), dto("u2")]).is_ok());
        assert!(validate_members(&[]).is_ok());
        assert!(validate_members(&[dto("u1"), dto("u1")]).is_err());
        assert!(validate_members(&[dto(" ")]).is_err());
    }

    #[test]
    fn test_add_team_request_validation() {
        let req = AddTeamRequest {
            team_name: String::new(),
            members: vec![dto("u1")],
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("team_name"));

        let req = AddTeamRequest {
            team_name: "backend".to_string(),
            members: vec![dto("u1"), dto("u1")],
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("members"));
    }

    #[test]
    fn test_members_default_to_empty() {
        let req: AddTeamRequest = serde_json::from_str(r#"{"team_name":"solo"}"#).unwrap();
        assert!(req.members.is_empty());
        assert!(req.validate().is_ok());
    }
}
