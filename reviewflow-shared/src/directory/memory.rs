/// In-memory implementation of [`Directory`]
///
/// All state sits behind one `RwLock`, so every method is atomic with
/// respect to every other. State is lost on restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::Directory;
use crate::error::{DomainError, DomainResult, Entity};
use crate::models::{
    NewPullRequest, PullRequest, PullRequestFilter, PullRequestReviewersStat,
    PullRequestStatus, Team, TeamMember, User, UserAssignmentStat, UserFilter,
};

#[derive(Default)]
struct State {
    users: BTreeMap<String, User>,
    /// Keyed by team id
    teams: BTreeMap<i64, Team>,
    pull_requests: BTreeMap<String, PullRequest>,
    next_team_id: i64,
}

impl State {
    fn is_active(&self, user_id: &str) -> bool {
        self.users.get(user_id).is_some_and(|u| u.is_active)
    }
}

/// In-memory directory
///
/// Users and pull requests are kept in `BTreeMap`s so listings come out in
/// ID order without extra sorting.
pub struct InMemoryDirectory {
    state: RwLock<State>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                next_team_id: 1,
                ..Default::default()
            }),
        }
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn ping(&self) -> DomainResult<()> {
        Ok(())
    }

    async fn get_user_by_id(&self, user_id: &str) -> DomainResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(user_id).cloned())
    }

    async fn list_users(&self, filter: &UserFilter) -> DomainResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect())
    }

    async fn set_user_active(
        &self,
        user_id: &str,
        is_active: bool,
    ) -> DomainResult<Option<User>> {
        let mut state = self.state.write().await;
        Ok(state.users.get_mut(user_id).map(|user| {
            user.is_active = is_active;
            user.clone()
        }))
    }

    async fn deactivate_all_active_in_team(&self, team_id: i64) -> DomainResult<Vec<String>> {
        let mut state = self.state.write().await;
        let mut flipped = Vec::new();
        for user in state.users.values_mut() {
            if user.team_id == Some(team_id) && user.is_active {
                user.is_active = false;
                flipped.push(user.user_id.clone());
            }
        }
        Ok(flipped)
    }

    async fn get_team_by_name(&self, name: &str) -> DomainResult<Option<Team>> {
        let state = self.state.read().await;
        Ok(state.teams.values().find(|t| t.name == name).cloned())
    }

    async fn get_team_by_id(&self, team_id: i64) -> DomainResult<Option<Team>> {
        let state = self.state.read().await;
        Ok(state.teams.get(&team_id).cloned())
    }

    async fn create_team_with_members(
        &self,
        name: &str,
        members: Vec<TeamMember>,
    ) -> DomainResult<(Team, Vec<User>)> {
        let mut state = self.state.write().await;
        if state.teams.values().any(|t| t.name == name) {
            return Err(DomainError::AlreadyExists(Entity::Team));
        }

        let team = Team {
            id: state.next_team_id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.next_team_id += 1;
        state.teams.insert(team.id, team.clone());

        let mut stored = Vec::with_capacity(members.len());
        for member in members {
            let user = User::from(member.into_new_user(team.id));
            state.users.insert(user.user_id.clone(), user.clone());
            stored.push(user);
        }
        Ok((team, stored))
    }

    async fn get_pull_request_by_id(&self, pr_id: &str) -> DomainResult<Option<PullRequest>> {
        let state = self.state.read().await;
        Ok(state.pull_requests.get(pr_id).cloned())
    }

    async fn create_pull_request(&self, pr: NewPullRequest) -> DomainResult<PullRequest> {
        let mut state = self.state.write().await;
        if state.pull_requests.contains_key(&pr.pull_request_id) {
            return Err(DomainError::AlreadyExists(Entity::PullRequest));
        }

        let reviewers = pr
            .reviewers
            .into_iter()
            .filter(|r| state.is_active(r))
            .collect();

        let stored = PullRequest {
            pull_request_id: pr.pull_request_id,
            title: pr.title,
            author_id: pr.author_id,
            status: PullRequestStatus::Open,
            reviewers,
            created_at: Utc::now(),
            merged_at: None,
        };
        state
            .pull_requests
            .insert(stored.pull_request_id.clone(), stored.clone());
        Ok(stored)
    }

    async fn merge_pull_request(
        &self,
        pr_id: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<Option<PullRequest>> {
        let mut state = self.state.write().await;
        let Some(pr) = state.pull_requests.get_mut(pr_id) else {
            return Ok(None);
        };
        Ok(pr.mark_merged(at).then(|| pr.clone()))
    }

    async fn replace_reviewer(
        &self,
        pr_id: &str,
        old_reviewer: &str,
        new_reviewer: &str,
    ) -> DomainResult<Option<PullRequest>> {
        let mut state = self.state.write().await;
        let replacement_active = state.is_active(new_reviewer);
        let Some(pr) = state.pull_requests.get_mut(pr_id) else {
            return Ok(None);
        };

        if !replacement_active
            || pr.is_merged()
            || !pr.has_reviewer(old_reviewer)
            || pr.has_reviewer(new_reviewer)
        {
            return Ok(None);
        }

        pr.reviewers.retain(|r| r != old_reviewer);
        pr.reviewers.push(new_reviewer.to_string());
        Ok(Some(pr.clone()))
    }

    async fn remove_reviewers(
        &self,
        pr_id: &str,
        user_ids: &[String],
    ) -> DomainResult<Option<PullRequest>> {
        let mut state = self.state.write().await;
        let Some(pr) = state.pull_requests.get_mut(pr_id) else {
            return Ok(None);
        };

        if pr.is_merged() || !pr.prune_reviewers(user_ids) {
            return Ok(None);
        }
        Ok(Some(pr.clone()))
    }

    async fn list_pull_requests(
        &self,
        filter: &PullRequestFilter,
    ) -> DomainResult<Vec<PullRequest>> {
        let state = self.state.read().await;
        let mut prs: Vec<PullRequest> = state
            .pull_requests
            .values()
            .filter(|pr| filter.matches(pr))
            .cloned()
            .collect();
        prs.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.pull_request_id.cmp(&b.pull_request_id))
        });
        Ok(prs)
    }

    async fn stats_assignments_by_user(&self) -> DomainResult<Vec<UserAssignmentStat>> {
        let state = self.state.read().await;
        let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
        for reviewer in state.pull_requests.values().flat_map(|pr| &pr.reviewers) {
            *counts.entry(reviewer.as_str()).or_default() += 1;
        }

        Ok(counts
            .into_iter()
            .map(|(user_id, assignments)| UserAssignmentStat {
                user_id: user_id.to_string(),
                assignments,
            })
            .collect())
    }

    async fn stats_reviewers_per_pull_request(
        &self,
    ) -> DomainResult<Vec<PullRequestReviewersStat>> {
        let state = self.state.read().await;
        Ok(state
            .pull_requests
            .values()
            .map(|pr| PullRequestReviewersStat {
                pull_request_id: pr.pull_request_id.clone(),
                reviewers_count: pr.reviewers.len() as i64,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, is_active: bool) -> TeamMember {
        TeamMember {
            user_id: id.to_string(),
            username: id.to_uppercase(),
            is_active,
        }
    }

    fn new_pr(id: &str, author: &str, reviewers: &[&str]) -> NewPullRequest {
        NewPullRequest {
            pull_request_id: id.to_string(),
            title: format!("Title {id}"),
            author_id: author.to_string(),
            reviewers: reviewers.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Directory with team 1 holding active u1..u5
    async fn seeded() -> InMemoryDirectory {
        let dir = InMemoryDirectory::new();
        let members = ["u1", "u2", "u3", "u4", "u5"]
            .iter()
            .map(|id| member(id, true))
            .collect();
        dir.create_team_with_members("backend", members)
            .await
            .unwrap();
        dir
    }

    #[tokio::test]
    async fn test_create_team_rejects_duplicate_name() {
        let dir = InMemoryDirectory::new();
        let (first, _) = dir
            .create_team_with_members("backend", vec![member("u1", true)])
            .await
            .unwrap();
        let (second, _) = dir
            .create_team_with_members("frontend", vec![])
            .await
            .unwrap();
        assert_ne!(first.id, second.id);

        let err = dir
            .create_team_with_members("backend", vec![member("u1", false), member("u2", true)])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyExists(Entity::Team)));

        // The rejected call touched no user
        assert!(dir.get_user_by_id("u1").await.unwrap().unwrap().is_active);
        assert!(dir.get_user_by_id("u2").await.unwrap().is_none());
        assert_eq!(
            dir.get_team_by_name("backend").await.unwrap().unwrap().id,
            first.id
        );
    }

    #[tokio::test]
    async fn test_create_team_moves_members() {
        let dir = InMemoryDirectory::new();
        let (backend, _) = dir
            .create_team_with_members("backend", vec![member("u1", true)])
            .await
            .unwrap();
        let (platform, users) = dir
            .create_team_with_members("platform", vec![member("u1", false)])
            .await
            .unwrap();

        assert_eq!(users[0].team_id, Some(platform.id));
        assert!(dir
            .list_users(&UserFilter::new().team(backend.id))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_list_users_filter() {
        let dir = InMemoryDirectory::new();
        dir.create_team_with_members(
            "backend",
            vec![
                member("u1", true),
                member("u2", false),
                member("u3", true),
                member("u4", true),
            ],
        )
        .await
        .unwrap();
        dir.create_team_with_members("frontend", vec![member("u9", true)])
            .await
            .unwrap();

        let active = dir
            .list_users(&UserFilter::new().team(1).active(true))
            .await
            .unwrap();
        let ids: Vec<_> = active.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, ["u1", "u3", "u4"]);
    }

    #[tokio::test]
    async fn test_set_user_active() {
        let dir = seeded().await;

        let user = dir.set_user_active("u2", false).await.unwrap().unwrap();
        assert!(!user.is_active);
        assert!(dir.set_user_active("nobody", false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deactivate_returns_only_flipped_ids() {
        let dir = InMemoryDirectory::new();
        dir.create_team_with_members("backend", vec![member("u1", true), member("u2", false)])
            .await
            .unwrap();
        dir.create_team_with_members("frontend", vec![member("u3", true)])
            .await
            .unwrap();

        assert_eq!(dir.deactivate_all_active_in_team(1).await.unwrap(), ["u1"]);
        assert!(dir.deactivate_all_active_in_team(1).await.unwrap().is_empty());
        assert!(dir.get_user_by_id("u3").await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_create_pull_request_rejects_duplicate_id() {
        let dir = seeded().await;
        dir.create_pull_request(new_pr("pr-1", "u1", &["u2"]))
            .await
            .unwrap();

        let err = dir
            .create_pull_request(new_pr("pr-1", "u3", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyExists(Entity::PullRequest)));

        let stored = dir.get_pull_request_by_id("pr-1").await.unwrap().unwrap();
        assert_eq!(stored.author_id, "u1");
        assert_eq!(stored.reviewers, ["u2"]);
    }

    #[tokio::test]
    async fn test_create_pull_request_drops_inactive_reviewers() {
        let dir = seeded().await;
        dir.set_user_active("u2", false).await.unwrap();

        let stored = dir
            .create_pull_request(new_pr("pr-1", "u1", &["u2", "ghost", "u3"]))
            .await
            .unwrap();
        assert_eq!(stored.reviewers, ["u3"]);
    }

    #[tokio::test]
    async fn test_guarded_merge_only_applies_once() {
        let dir = seeded().await;
        dir.create_pull_request(new_pr("pr-1", "u1", &[]))
            .await
            .unwrap();

        let at = Utc::now();
        let merged = dir.merge_pull_request("pr-1", at).await.unwrap().unwrap();
        assert_eq!(merged.merged_at, Some(at));

        let again = dir.merge_pull_request("pr-1", Utc::now()).await.unwrap();
        assert!(again.is_none());
        assert!(dir.merge_pull_request("missing", at).await.unwrap().is_none());

        let stored = dir.get_pull_request_by_id("pr-1").await.unwrap().unwrap();
        assert_eq!(stored.merged_at, Some(at));
    }

    #[tokio::test]
    async fn test_replace_reviewer_guards() {
        let dir = seeded().await;
        dir.create_pull_request(new_pr("pr-1", "u1", &["u2", "u3"]))
            .await
            .unwrap();

        // new reviewer already assigned
        assert!(dir
            .replace_reviewer("pr-1", "u2", "u3")
            .await
            .unwrap()
            .is_none());
        // old reviewer not assigned
        assert!(dir
            .replace_reviewer("pr-1", "u4", "u5")
            .await
            .unwrap()
            .is_none());
        // new reviewer inactive or unknown
        dir.set_user_active("u5", false).await.unwrap();
        assert!(dir
            .replace_reviewer("pr-1", "u2", "u5")
            .await
            .unwrap()
            .is_none());
        assert!(dir
            .replace_reviewer("pr-1", "u2", "ghost")
            .await
            .unwrap()
            .is_none());

        let updated = dir
            .replace_reviewer("pr-1", "u2", "u4")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.reviewers, ["u3", "u4"]);

        dir.merge_pull_request("pr-1", Utc::now()).await.unwrap();
        dir.set_user_active("u5", true).await.unwrap();
        assert!(dir
            .replace_reviewer("pr-1", "u3", "u5")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_remove_reviewers_reports_shrink_only() {
        let dir = seeded().await;
        dir.create_pull_request(new_pr("pr-1", "u1", &["u2", "u3"]))
            .await
            .unwrap();

        let ids = vec!["u9".to_string()];
        assert!(dir.remove_reviewers("pr-1", &ids).await.unwrap().is_none());

        let ids = vec!["u2".to_string(), "u9".to_string()];
        let pruned = dir.remove_reviewers("pr-1", &ids).await.unwrap().unwrap();
        assert_eq!(pruned.reviewers, ["u3"]);
    }

    #[tokio::test]
    async fn test_stats_count_every_pull_request() {
        let dir = seeded().await;
        dir.create_pull_request(new_pr("pr-1", "u1", &["u2", "u3"]))
            .await
            .unwrap();
        dir.create_pull_request(new_pr("pr-2", "u1", &["u2"]))
            .await
            .unwrap();
        dir.create_pull_request(new_pr("pr-3", "u2", &[]))
            .await
            .unwrap();
        dir.merge_pull_request("pr-2", Utc::now()).await.unwrap();

        let by_user = dir.stats_assignments_by_user().await.unwrap();
        assert_eq!(
            by_user,
            vec![
                UserAssignmentStat {
                    user_id: "u2".to_string(),
                    assignments: 2
                },
                UserAssignmentStat {
                    user_id: "u3".to_string(),
                    assignments: 1
                },
            ]
        );

        let per_pr = dir.stats_reviewers_per_pull_request().await.unwrap();
        let counts: Vec<_> = per_pr.iter().map(|s| s.reviewers_count).collect();
        assert_eq!(counts, [2, 1, 0]);
    }
}
