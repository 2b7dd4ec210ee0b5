/// Pull request model and database operations
///
/// A pull request carries its reviewer ids inline as a `TEXT[]`. Every
/// statement that changes the reviewer set is a single conditional UPDATE,
/// so concurrent writers either serialize on the row or see zero affected
/// rows.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE pull_request_status AS ENUM ('OPEN', 'MERGED');
///
/// CREATE TABLE pull_requests (
///     id BIGSERIAL PRIMARY KEY,
///     pull_request_id TEXT NOT NULL UNIQUE,
///     title TEXT NOT NULL,
///     author_id TEXT NOT NULL REFERENCES users(user_id),
///     status pull_request_status NOT NULL DEFAULT 'OPEN',
///     reviewers TEXT[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     merged_at TIMESTAMPTZ,
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # States
///
/// ```text
/// OPEN ──merge──> MERGED   (terminal; merging again is a no-op)
///  │
///  └─ reassign / prune (reviewer set changes, OPEN only)
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

/// Most reviewers a pull request is created with
pub const MAX_REVIEWERS: usize = 2;

/// Pull request lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "pull_request_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    /// Accepting reviewer changes
    Open,

    /// Terminal; reviewers and merge time are frozen
    Merged,
}

impl PullRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestStatus::Open => "OPEN",
            PullRequestStatus::Merged => "MERGED",
        }
    }
}

/// A pull request and its current reviewers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PullRequest {
    /// External identifier, unique across the system
    pub pull_request_id: String,

    /// Pull request title
    pub title: String,

    /// User ID of the author
    pub author_id: String,

    /// Current lifecycle state
    pub status: PullRequestStatus,

    /// Assigned reviewer IDs (no duplicates, never the author)
    pub reviewers: Vec<String>,

    /// When the pull request was created
    pub created_at: DateTime<Utc>,

    /// When the pull request was merged (None while open)
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }

    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.reviewers.iter().any(|r| r == user_id)
    }

    /// OPEN → MERGED at `at`
    ///
    /// # Returns
    ///
    /// False if the pull request was already merged
    pub fn mark_merged(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_merged() {
            return false;
        }
        self.status = PullRequestStatus::Merged;
        self.merged_at = Some(at);
        true
    }

    /// Removes the given reviewers in place
    ///
    /// # Returns
    ///
    /// True if the set shrank
    pub fn prune_reviewers(&mut self, user_ids: &[String]) -> bool {
        let before = self.reviewers.len();
        self.reviewers.retain(|r| !user_ids.contains(r));
        self.reviewers.len() < before
    }
}

/// Input for creating a pull request (always created OPEN)
///
/// Reviewers that are unknown or inactive when the row is written are
/// dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPullRequest {
    pub pull_request_id: String,
    pub title: String,
    pub author_id: String,
    pub reviewers: Vec<String>,
}

/// Optional filters for listing pull requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestFilter {
    pub status: Option<PullRequestStatus>,

    /// Only pull requests this user reviews
    pub reviewer_id: Option<String>,

    /// Only pull requests reviewed by at least one of these users
    pub reviewers_overlap: Option<Vec<String>>,
}

impl PullRequestFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: PullRequestStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn reviewer(mut self, user_id: impl Into<String>) -> Self {
        self.reviewer_id = Some(user_id.into());
        self
    }

    pub fn reviewers_overlap(mut self, user_ids: Vec<String>) -> Self {
        self.reviewers_overlap = Some(user_ids);
        self
    }

    pub fn matches(&self, pr: &PullRequest) -> bool {
        if let Some(status) = self.status {
            if pr.status != status {
                return false;
            }
        }
        if let Some(reviewer_id) = &self.reviewer_id {
            if !pr.has_reviewer(reviewer_id) {
                return false;
            }
        }
        if let Some(ids) = &self.reviewers_overlap {
            if !ids.iter().any(|id| pr.has_reviewer(id)) {
                return false;
            }
        }
        true
    }
}

impl PullRequest {
    /// Inserts a new OPEN pull request
    ///
    /// Only reviewers that are active at write time are stored. Their user
    /// rows are share-locked, so a concurrent deactivation either commits
    /// first (and the reviewer is dropped) or waits for this insert (and
    /// then sees the pull request to prune).
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation if the ID is taken
    pub async fn create(pool: &PgPool, data: NewPullRequest) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PullRequest>(
            r#"
            WITH active AS (
                SELECT user_id
                FROM users
                WHERE user_id = ANY($4) AND is_active
                FOR SHARE
            )
            INSERT INTO pull_requests (pull_request_id, title, author_id, status, reviewers)
            VALUES (
                $1, $2, $3, 'OPEN',
                ARRAY(
                    SELECT r
                    FROM unnest($4::TEXT[]) WITH ORDINALITY AS t(r, ord)
                    WHERE r IN (SELECT user_id FROM active)
                    ORDER BY ord
                )
            )
            RETURNING pull_request_id, title, author_id, status, reviewers, created_at, merged_at
            "#,
        )
        .bind(data.pull_request_id)
        .bind(data.title)
        .bind(data.author_id)
        .bind(data.reviewers)
        .fetch_one(pool)
        .await
    }

    /// Finds a pull request by external ID
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PullRequest>(
            r#"
            SELECT pull_request_id, title, author_id, status, reviewers, created_at, merged_at
            FROM pull_requests
            WHERE pull_request_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Marks an OPEN pull request MERGED
    ///
    /// # Returns
    ///
    /// The updated row, or None if the ID is unknown or already merged
    pub async fn merge(
        pool: &PgPool,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PullRequest>(
            r#"
            UPDATE pull_requests
            SET status = 'MERGED', merged_at = $2, updated_at = NOW()
            WHERE pull_request_id = $1 AND status = 'OPEN'
            RETURNING pull_request_id, title, author_id, status, reviewers, created_at, merged_at
            "#,
        )
        .bind(id)
        .bind(at)
        .fetch_optional(pool)
        .await
    }

    /// Swaps one reviewer for another in a single guarded statement
    ///
    /// The row only changes while it is OPEN, still lists `old_reviewer`
    /// and does not already list `new_reviewer`, and while `new_reviewer`
    /// is an active user (share-locked for the statement).
    pub async fn replace_reviewer(
        pool: &PgPool,
        id: &str,
        old_reviewer: &str,
        new_reviewer: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PullRequest>(
            r#"
            UPDATE pull_requests
            SET reviewers = array_append(array_remove(reviewers, $2), $3), updated_at = NOW()
            WHERE pull_request_id = $1
              AND status = 'OPEN'
              AND $2 = ANY(reviewers)
              AND NOT ($3 = ANY(reviewers))
              AND EXISTS (
                  SELECT 1 FROM users
                  WHERE user_id = $3 AND is_active
                  FOR SHARE
              )
            RETURNING pull_request_id, title, author_id, status, reviewers, created_at, merged_at
            "#,
        )
        .bind(id)
        .bind(old_reviewer)
        .bind(new_reviewer)
        .fetch_optional(pool)
        .await
    }

    /// Removes the given reviewers from an OPEN pull request
    ///
    /// # Returns
    ///
    /// The updated row if at least one reviewer was removed, None otherwise
    pub async fn remove_reviewers(
        pool: &PgPool,
        id: &str,
        user_ids: &[String],
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PullRequest>(
            r#"
            UPDATE pull_requests
            SET reviewers = ARRAY(
                SELECT r
                FROM unnest(reviewers) WITH ORDINALITY AS t(r, ord)
                WHERE NOT (r = ANY($2))
                ORDER BY ord
            ),
            updated_at = NOW()
            WHERE pull_request_id = $1
              AND status = 'OPEN'
              AND reviewers && $2
            RETURNING pull_request_id, title, author_id, status, reviewers, created_at, merged_at
            "#,
        )
        .bind(id)
        .bind(user_ids.to_vec())
        .fetch_optional(pool)
        .await
    }

    /// Lists pull requests matching the filter, oldest first
    pub async fn list(pool: &PgPool, filter: &PullRequestFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT pull_request_id, title, author_id, status, reviewers, created_at, merged_at \
             FROM pull_requests WHERE TRUE",
        );

        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(reviewer_id) = &filter.reviewer_id {
            builder
                .push(" AND ")
                .push_bind(reviewer_id.clone())
                .push(" = ANY(reviewers)");
        }
        if let Some(ids) = &filter.reviewers_overlap {
            builder.push(" AND reviewers && ").push_bind(ids.clone());
        }

        builder.push(" ORDER BY created_at, pull_request_id");

        builder.build_query_as::<PullRequest>().fetch_all(pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_pr(reviewers: &[&str]) -> PullRequest {
        PullRequest {
            pull_request_id: "pr-1".to_string(),
            title: "Add search".to_string(),
            author_id: "u1".to_string(),
            status: PullRequestStatus::Open,
            reviewers: reviewers.iter().map(|r| r.to_string()).collect(),
            created_at: Utc::now(),
            merged_at: None,
        }
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(PullRequestStatus::Open.as_str(), "OPEN");
        assert_eq!(PullRequestStatus::Merged.as_str(), "MERGED");
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&PullRequestStatus::Merged).unwrap();
        assert_eq!(json, "\"MERGED\"");
    }

    #[test]
    fn test_prune_reviewers() {
        let mut pr = open_pr(&["u2", "u3"]);
        assert!(pr.prune_reviewers(&["u3".to_string(), "u9".to_string()]));
        assert_eq!(pr.reviewers, vec!["u2".to_string()]);
        assert!(!pr.prune_reviewers(&["u9".to_string()]));
    }

    #[test]
    fn test_mark_merged_once() {
        let mut pr = open_pr(&["u2"]);
        let at = Utc::now();

        assert!(pr.mark_merged(at));
        assert!(pr.is_merged());
        assert_eq!(pr.merged_at, Some(at));
        assert_eq!(pr.reviewers, vec!["u2".to_string()]);

        assert!(!pr.mark_merged(Utc::now()));
        assert_eq!(pr.merged_at, Some(at));
    }

    #[test]
    fn test_filter_matches() {
        let pr = open_pr(&["u2", "u3"]);

        assert!(PullRequestFilter::new().matches(&pr));
        assert!(PullRequestFilter::new().reviewer("u2").matches(&pr));
        assert!(!PullRequestFilter::new().reviewer("u1").matches(&pr));
        assert!(!PullRequestFilter::new()
            .status(PullRequestStatus::Merged)
            .matches(&pr));
        assert!(PullRequestFilter::new()
            .status(PullRequestStatus::Open)
            .reviewers_overlap(vec!["u9".to_string(), "u3".to_string()])
            .matches(&pr));
        assert!(!PullRequestFilter::new()
            .reviewers_overlap(vec!["u9".to_string()])
            .matches(&pr));
    }
}
