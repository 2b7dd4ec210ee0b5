/// Assignment statistics endpoint
///
/// ```text
/// GET /stats
/// ```
///
/// ```json
/// {
///   "by_user": [{ "user_id": "u2", "assignments": 3 }],
///   "per_pr": [{ "pull_request_id": "pr-1", "reviewers_count": 2 }]
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use reviewflow_shared::models::{PullRequestReviewersStat, Stats, UserAssignmentStat};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub by_user: Vec<UserAssignmentStat>,
    pub per_pr: Vec<PullRequestReviewersStat>,
}

impl From<Stats> for StatsResponse {
    fn from(stats: Stats) -> Self {
        Self {
            by_user: stats.by_user,
            per_pr: stats.per_pull_request,
        }
    }
}

pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let stats = state.engine.get_stats().await?;
    Ok(Json(stats.into()))
}
