/// Storage abstraction for users, teams and pull requests
///
/// The engine never talks to a database directly; it goes through the
/// [`Directory`] trait. Each method is one atomic unit against the backing
/// store, so the engine itself needs no locks.
///
/// # Implementations
///
/// - [`PgDirectory`]: PostgreSQL via sqlx (production)
/// - [`InMemoryDirectory`]: a single `RwLock`-protected map (tests, local runs)
///
/// # Conventions
///
/// - Lookups return `Ok(None)` for absent entities; the engine decides
///   which `NotFound` to raise.
/// - Guarded updates return `Ok(None)` when no row matched the guard.
/// - Creates fail with `DomainError::AlreadyExists` on id / name collisions.

mod memory;
mod postgres;

pub use memory::InMemoryDirectory;
pub use postgres::PgDirectory;

use async_trait::async_trait;

use chrono::{DateTime, Utc};

use crate::error::DomainResult;
use crate::models::{
    NewPullRequest, PullRequest, PullRequestFilter, PullRequestReviewersStat, Team,
    TeamMember, User, UserAssignmentStat, UserFilter,
};

#[async_trait]
pub trait Directory: Send + Sync {
    /// Verifies the store is reachable
    async fn ping(&self) -> DomainResult<()>;

    async fn get_user_by_id(&self, user_id: &str) -> DomainResult<Option<User>>;

    async fn list_users(&self, filter: &UserFilter) -> DomainResult<Vec<User>>;

    /// Sets the activity flag; returns None if the user does not exist
    async fn set_user_active(&self, user_id: &str, is_active: bool)
        -> DomainResult<Option<User>>;

    /// Flips every active member of the team to inactive in one step
    ///
    /// Returns the IDs that actually changed.
    async fn deactivate_all_active_in_team(&self, team_id: i64) -> DomainResult<Vec<String>>;

    async fn get_team_by_name(&self, name: &str) -> DomainResult<Option<Team>>;

    async fn get_team_by_id(&self, team_id: i64) -> DomainResult<Option<Team>>;

    /// Creates the team and upserts every member into it as one unit
    ///
    /// Fails with `AlreadyExists(Team)` if the name is taken, in which case
    /// no user is touched.
    async fn create_team_with_members(
        &self,
        name: &str,
        members: Vec<TeamMember>,
    ) -> DomainResult<(Team, Vec<User>)>;

    async fn get_pull_request_by_id(&self, pr_id: &str) -> DomainResult<Option<PullRequest>>;

    /// Inserts an OPEN pull request
    ///
    /// Reviewers that are unknown or inactive at write time are dropped, so
    /// a concurrent deactivation can never leave them assigned. Fails with
    /// `AlreadyExists(PullRequest)` if the ID is taken.
    async fn create_pull_request(&self, pr: NewPullRequest) -> DomainResult<PullRequest>;

    /// OPEN → MERGED at `at`
    ///
    /// Returns None if the ID is unknown or the pull request is already
    /// merged.
    async fn merge_pull_request(
        &self,
        pr_id: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<Option<PullRequest>>;

    /// Replaces `old_reviewer` with `new_reviewer`
    ///
    /// Applies only while the pull request is OPEN, lists `old_reviewer`,
    /// does not list `new_reviewer` and `new_reviewer` is an active user;
    /// otherwise returns None.
    async fn replace_reviewer(
        &self,
        pr_id: &str,
        old_reviewer: &str,
        new_reviewer: &str,
    ) -> DomainResult<Option<PullRequest>>;

    /// Removes `user_ids` from an OPEN pull request's reviewers
    ///
    /// Returns the updated pull request only if the set shrank.
    async fn remove_reviewers(
        &self,
        pr_id: &str,
        user_ids: &[String],
    ) -> DomainResult<Option<PullRequest>>;

    async fn list_pull_requests(&self, filter: &PullRequestFilter)
        -> DomainResult<Vec<PullRequest>>;

    async fn stats_assignments_by_user(&self) -> DomainResult<Vec<UserAssignmentStat>>;

    async fn stats_reviewers_per_pull_request(&self)
        -> DomainResult<Vec<PullRequestReviewersStat>>;
}
