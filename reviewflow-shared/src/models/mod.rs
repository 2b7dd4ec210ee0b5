/// Data model for ReviewFlow
///
/// Each module defines a stored entity and its PostgreSQL queries.
///
/// - `user`: users and their team membership / activity
/// - `team`: teams (members reference the team, not the other way round)
/// - `pull_request`: pull requests with inline reviewer sets
/// - `stats`: read-only assignment projections

pub mod pull_request;
pub mod stats;
pub mod team;
pub mod user;

pub use pull_request::{
    NewPullRequest, PullRequest, PullRequestFilter, PullRequestStatus, MAX_REVIEWERS,
};
pub use stats::{PullRequestReviewersStat, Stats, UserAssignmentStat};
pub use team::{Team, TeamMember};
pub use user::{NewUser, User, UserFilter};
