/// Read-only assignment statistics
///
/// Counts are computed straight from `pull_requests.reviewers`; merged pull
/// requests are included in the per-user totals.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// How many pull requests list a user as reviewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserAssignmentStat {
    pub user_id: String,
    pub assignments: i64,
}

/// How many reviewers a pull request currently has
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PullRequestReviewersStat {
    pub pull_request_id: String,
    pub reviewers_count: i64,
}

/// Both projections, each ordered by ID
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub by_user: Vec<UserAssignmentStat>,
    pub per_pull_request: Vec<PullRequestReviewersStat>,
}

impl UserAssignmentStat {
    pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserAssignmentStat>(
            r#"
            SELECT user_id, COUNT(*) AS assignments
            FROM (
                SELECT unnest(reviewers) AS user_id
                FROM pull_requests
            ) t
            GROUP BY user_id
            ORDER BY user_id
            "#,
        )
        .fetch_all(pool)
        .await
    }
}

impl PullRequestReviewersStat {
    pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PullRequestReviewersStat>(
            r#"
            SELECT pull_request_id, COALESCE(cardinality(reviewers), 0)::BIGINT AS reviewers_count
            FROM pull_requests
            ORDER BY pull_request_id
            "#,
        )
        .fetch_all(pool)
        .await
    }
}
