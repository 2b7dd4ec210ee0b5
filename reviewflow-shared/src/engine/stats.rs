use super::ReviewEngine;
use crate::error::DomainResult;
use crate::models::Stats;

impl ReviewEngine {
    /// Per-user assignment totals (merged pull requests included) and
    /// per-pull-request reviewer counts, each ordered by ID
    pub async fn get_stats(&self) -> DomainResult<Stats> {
        let by_user = self.directory.stats_assignments_by_user().await?;
        let per_pull_request = self.directory.stats_reviewers_per_pull_request().await?;

        Ok(Stats {
            by_user,
            per_pull_request,
        })
    }
}
