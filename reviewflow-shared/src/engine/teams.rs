/// Team and user administration

use serde::{Deserialize, Serialize};
use tracing::info;

use super::ReviewEngine;
use crate::error::{DomainError, DomainResult, Entity};
use crate::models::{PullRequest, PullRequestFilter, Team, TeamMember, User, UserFilter};

/// A team with all of its members, active or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub team: Team,
    pub members: Vec<User>,
}

/// A user together with the name of their team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMembership {
    pub user: User,
    pub team_name: Option<String>,
}

impl ReviewEngine {
    /// Creates a team and upserts each member into it
    ///
    /// Existing users are moved into the new team and take the given name
    /// and activity. The team and its members are written as one unit.
    ///
    /// # Errors
    ///
    /// `AlreadyExists(Team)` if the name is taken
    pub async fn create_team_with_members(
        &self,
        team_name: &str,
        members: Vec<TeamMember>,
    ) -> DomainResult<TeamRoster> {
        let (team, members) = self
            .directory
            .create_team_with_members(team_name, members)
            .await?;

        info!(team_name = %team.name, members = members.len(), "Team created");
        Ok(TeamRoster { team, members })
    }

    /// Returns the team and every member, ordered by user ID
    ///
    /// # Errors
    ///
    /// `NotFound(Team)` if the team is unknown
    pub async fn get_team(&self, team_name: &str) -> DomainResult<TeamRoster> {
        let team = self
            .directory
            .get_team_by_name(team_name)
            .await?
            .ok_or(DomainError::NotFound(Entity::Team))?;

        let members = self
            .directory
            .list_users(&UserFilter::new().team(team.id))
            .await?;

        Ok(TeamRoster { team, members })
    }

    /// Sets a user's activity flag
    ///
    /// Does not touch pull requests the user already reviews.
    ///
    /// # Errors
    ///
    /// `NotFound(User)` if the user is unknown
    pub async fn set_user_active(
        &self,
        user_id: &str,
        is_active: bool,
    ) -> DomainResult<UserMembership> {
        let user = self
            .directory
            .set_user_active(user_id, is_active)
            .await?
            .ok_or(DomainError::NotFound(Entity::User))?;

        let team_name = match user.team_id {
            Some(team_id) => self
                .directory
                .get_team_by_id(team_id)
                .await?
                .map(|t| t.name),
            None => None,
        };

        info!(user_id = %user_id, is_active, "User activity updated");
        Ok(UserMembership { user, team_name })
    }

    /// Every pull request, in any state, that lists the user as reviewer
    ///
    /// Unknown users simply have no reviews.
    pub async fn list_user_reviews(&self, user_id: &str) -> DomainResult<Vec<PullRequest>> {
        self.directory
            .list_pull_requests(&PullRequestFilter::new().reviewer(user_id))
            .await
    }
}
