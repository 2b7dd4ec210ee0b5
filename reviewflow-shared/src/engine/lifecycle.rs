/// Pull request lifecycle: create, merge, reassign, get

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::selector::{eligible_roster, select_initial_reviewers, select_replacement};
use super::ReviewEngine;
use crate::error::{BusinessRule, DomainError, DomainResult, Entity};
use crate::models::{NewPullRequest, PullRequest, User, UserFilter};

/// Result of a successful reassignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reassignment {
    pub pull_request: PullRequest,

    /// The reviewer that took over
    pub replaced_by: String,
}

impl ReviewEngine {
    /// Creates an OPEN pull request with up to two reviewers from the author's team
    ///
    /// A chosen reviewer deactivated before the write lands is dropped
    /// rather than stored.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists(PullRequest)` if the ID is taken
    /// - `NotFound(User)` if the author is unknown
    pub async fn create_pull_request(
        &self,
        pr_id: &str,
        title: &str,
        author_id: &str,
    ) -> DomainResult<PullRequest> {
        if self.directory.get_pull_request_by_id(pr_id).await?.is_some() {
            return Err(DomainError::AlreadyExists(Entity::PullRequest));
        }

        let author = self
            .directory
            .get_user_by_id(author_id)
            .await?
            .ok_or(DomainError::NotFound(Entity::User))?;

        let members = self.active_members(author.team_id).await?;
        let reviewers = {
            let roster = eligible_roster(&members, &[author_id]);
            select_initial_reviewers(&roster, &mut self.rng())
        };

        let pr = self
            .directory
            .create_pull_request(NewPullRequest {
                pull_request_id: pr_id.to_string(),
                title: title.to_string(),
                author_id: author_id.to_string(),
                reviewers,
            })
            .await?;

        info!(
            pull_request_id = %pr.pull_request_id,
            author_id = %pr.author_id,
            reviewers = ?pr.reviewers,
            "Pull request created"
        );
        Ok(pr)
    }

    /// Marks a pull request MERGED; merging again returns the stored record
    ///
    /// # Errors
    ///
    /// `NotFound(PullRequest)` if the ID is unknown
    pub async fn merge_pull_request(&self, pr_id: &str) -> DomainResult<PullRequest> {
        let current = self.get_pull_request(pr_id).await?;
        if current.is_merged() {
            debug!(pull_request_id = %pr_id, "Pull request already merged");
            return Ok(current);
        }

        if let Some(merged) = self
            .directory
            .merge_pull_request(pr_id, Utc::now())
            .await?
        {
            info!(pull_request_id = %pr_id, "Pull request merged");
            return Ok(merged);
        }

        // Lost a race with another merge
        match self.directory.get_pull_request_by_id(pr_id).await? {
            Some(pr) if pr.is_merged() => Ok(pr),
            _ => Err(DomainError::NotFound(Entity::PullRequest)),
        }
    }

    /// Swaps `old_reviewer_id` for a random active teammate of theirs
    ///
    /// The replacement is never the author, the old reviewer or anyone
    /// already assigned.
    ///
    /// # Errors
    ///
    /// - `NotFound(PullRequest)` if the ID is unknown
    /// - `BusinessLogic(PullRequestMerged)` if the pull request is merged
    /// - `BusinessLogic(ReviewerNotAssigned)` if the old reviewer is not assigned
    /// - `NotFound(User)` if the old reviewer is unknown
    /// - `BusinessLogic(NoCandidate)` if nobody can take over
    pub async fn reassign_reviewer(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
    ) -> DomainResult<Reassignment> {
        let pr = self.get_pull_request(pr_id).await?;
        if pr.is_merged() {
            return Err(BusinessRule::PullRequestMerged.into());
        }
        if !pr.has_reviewer(old_reviewer_id) {
            return Err(BusinessRule::ReviewerNotAssigned.into());
        }

        let old_reviewer = self
            .directory
            .get_user_by_id(old_reviewer_id)
            .await?
            .ok_or(DomainError::NotFound(Entity::User))?;

        let members = self.active_members(old_reviewer.team_id).await?;
        let replacement = {
            let mut excluded: Vec<&str> = pr.reviewers.iter().map(String::as_str).collect();
            excluded.push(old_reviewer_id);
            excluded.push(pr.author_id.as_str());

            let roster = eligible_roster(&members, &excluded);
            select_replacement(&roster, &mut self.rng())?
        };

        let updated = self
            .directory
            .replace_reviewer(pr_id, old_reviewer_id, &replacement)
            .await?;

        let Some(updated) = updated else {
            let err = self.classify_reassign_conflict(pr_id, old_reviewer_id).await?;
            warn!(
                pull_request_id = %pr_id,
                reviewer_id = %old_reviewer_id,
                error = %err,
                "Reassignment lost a concurrent update"
            );
            return Err(err);
        };

        info!(
            pull_request_id = %pr_id,
            old_reviewer_id = %old_reviewer_id,
            new_reviewer_id = %replacement,
            "Reviewer reassigned"
        );

        Ok(Reassignment {
            pull_request: updated,
            replaced_by: replacement,
        })
    }

    /// Returns the pull request or `NotFound(PullRequest)`
    pub async fn get_pull_request(&self, pr_id: &str) -> DomainResult<PullRequest> {
        self.directory
            .get_pull_request_by_id(pr_id)
            .await?
            .ok_or(DomainError::NotFound(Entity::PullRequest))
    }

    /// Active members of a team; no team means nobody
    pub(crate) async fn active_members(&self, team_id: Option<i64>) -> DomainResult<Vec<User>> {
        match team_id {
            Some(team_id) => {
                self.directory
                    .list_users(&UserFilter::new().team(team_id).active(true))
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Works out why a guarded reviewer swap matched no row
    async fn classify_reassign_conflict(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
    ) -> DomainResult<DomainError> {
        Ok(match self.directory.get_pull_request_by_id(pr_id).await? {
            None => DomainError::NotFound(Entity::PullRequest),
            Some(pr) if pr.is_merged() => BusinessRule::PullRequestMerged.into(),
            Some(pr) if !pr.has_reviewer(old_reviewer_id) => {
                BusinessRule::ReviewerNotAssigned.into()
            }
            // The drawn replacement was assigned or deactivated concurrently
            Some(_) => BusinessRule::NoCandidate.into(),
        })
    }
}
