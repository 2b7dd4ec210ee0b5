/// Team deactivation cascade

use tracing::{debug, info};

use super::ReviewEngine;
use crate::error::{DomainError, DomainResult, Entity};
use crate::models::{PullRequestFilter, PullRequestStatus};

impl ReviewEngine {
    /// Deactivates every active member of a team and prunes them from open pull requests
    ///
    /// Removed reviewers are not replaced. Merged pull requests are left
    /// untouched.
    ///
    /// # Returns
    ///
    /// Number of open pull requests whose reviewer set shrank
    ///
    /// # Errors
    ///
    /// `NotFound(Team)` if the team is unknown
    pub async fn deactivate_team_and_reassign(&self, team_name: &str) -> DomainResult<u64> {
        let team = self
            .directory
            .get_team_by_name(team_name)
            .await?
            .ok_or(DomainError::NotFound(Entity::Team))?;

        let deactivated = self.directory.deactivate_all_active_in_team(team.id).await?;
        if deactivated.is_empty() {
            debug!(team_name = %team_name, "No active members to deactivate");
            return Ok(0);
        }

        let affected = self
            .directory
            .list_pull_requests(
                &PullRequestFilter::new()
                    .status(PullRequestStatus::Open)
                    .reviewers_overlap(deactivated.clone()),
            )
            .await?;

        let mut modified = 0u64;
        for pr in &affected {
            if self
                .directory
                .remove_reviewers(&pr.pull_request_id, &deactivated)
                .await?
                .is_some()
            {
                modified += 1;
            }
        }

        info!(
            team_name = %team_name,
            deactivated = deactivated.len(),
            modified_pull_requests = modified,
            "Team deactivated"
        );
        Ok(modified)
    }
}
