/// PostgreSQL-backed [`Directory`]
///
/// Every method is a single statement, except team creation which runs in
/// one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;

use super::Directory;
use crate::db::pool::health_check;
use crate::error::{is_unique_violation, DomainError, DomainResult, Entity};
use crate::models::{
    NewPullRequest, PullRequest, PullRequestFilter, PullRequestReviewersStat, Team,
    TeamMember, User, UserAssignmentStat, UserFilter,
};

/// Directory over a sqlx connection pool
///
/// Cloning is cheap; the pool is reference counted.
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps an insert failure, turning unique violations into `AlreadyExists`
fn map_insert_error(err: sqlx::Error, entity: Entity) -> DomainError {
    if is_unique_violation(&err) {
        DomainError::AlreadyExists(entity)
    } else {
        warn!(error = %err, %entity, "Insert failed");
        DomainError::Infrastructure(err)
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn ping(&self) -> DomainResult<()> {
        Ok(health_check(&self.pool).await?)
    }

    async fn get_user_by_id(&self, user_id: &str) -> DomainResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, user_id).await?)
    }

    async fn list_users(&self, filter: &UserFilter) -> DomainResult<Vec<User>> {
        Ok(User::list(&self.pool, filter).await?)
    }

    async fn set_user_active(
        &self,
        user_id: &str,
        is_active: bool,
    ) -> DomainResult<Option<User>> {
        Ok(User::set_active(&self.pool, user_id, is_active).await?)
    }

    async fn deactivate_all_active_in_team(&self, team_id: i64) -> DomainResult<Vec<String>> {
        Ok(User::deactivate_active_in_team(&self.pool, team_id).await?)
    }

    async fn get_team_by_name(&self, name: &str) -> DomainResult<Option<Team>> {
        Ok(Team::find_by_name(&self.pool, name).await?)
    }

    async fn get_team_by_id(&self, team_id: i64) -> DomainResult<Option<Team>> {
        Ok(Team::find_by_id(&self.pool, team_id).await?)
    }

    async fn create_team_with_members(
        &self,
        name: &str,
        members: Vec<TeamMember>,
    ) -> DomainResult<(Team, Vec<User>)> {
        Team::create_with_members(&self.pool, name, members)
            .await
            .map_err(|e| map_insert_error(e, Entity::Team))
    }

    async fn get_pull_request_by_id(&self, pr_id: &str) -> DomainResult<Option<PullRequest>> {
        Ok(PullRequest::find_by_id(&self.pool, pr_id).await?)
    }

    async fn create_pull_request(&self, pr: NewPullRequest) -> DomainResult<PullRequest> {
        PullRequest::create(&self.pool, pr)
            .await
            .map_err(|e| map_insert_error(e, Entity::PullRequest))
    }

    async fn merge_pull_request(
        &self,
        pr_id: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<Option<PullRequest>> {
        Ok(PullRequest::merge(&self.pool, pr_id, at).await?)
    }

    async fn replace_reviewer(
        &self,
        pr_id: &str,
        old_reviewer: &str,
        new_reviewer: &str,
    ) -> DomainResult<Option<PullRequest>> {
        Ok(PullRequest::replace_reviewer(&self.pool, pr_id, old_reviewer, new_reviewer).await?)
    }

    async fn remove_reviewers(
        &self,
        pr_id: &str,
        user_ids: &[String],
    ) -> DomainResult<Option<PullRequest>> {
        Ok(PullRequest::remove_reviewers(&self.pool, pr_id, user_ids).await?)
    }

    async fn list_pull_requests(
        &self,
        filter: &PullRequestFilter,
    ) -> DomainResult<Vec<PullRequest>> {
        Ok(PullRequest::list(&self.pool, filter).await?)
    }

    async fn stats_assignments_by_user(&self) -> DomainResult<Vec<UserAssignmentStat>> {
        Ok(UserAssignmentStat::fetch_all(&self.pool).await?)
    }

    async fn stats_reviewers_per_pull_request(
        &self,
    ) -> DomainResult<Vec<PullRequestReviewersStat>> {
        Ok(PullRequestReviewersStat::fetch_all(&self.pool).await?)
    }
}
