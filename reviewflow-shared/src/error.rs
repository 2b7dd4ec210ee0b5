/// Domain error taxonomy
///
/// Every engine and directory operation returns [`DomainResult`]. The kinds
/// are deliberately coarse so the HTTP layer can map them without looking at
/// message text:
///
/// - [`DomainError::NotFound`]: a referenced entity is absent
/// - [`DomainError::AlreadyExists`]: unique id / name collision
/// - [`DomainError::BusinessLogic`]: a state-machine rule was violated
/// - [`DomainError::Infrastructure`]: storage failure, propagated untouched
use std::fmt;

/// Result alias used across the engine and directory layers
pub type DomainResult<T> = Result<T, DomainError>;

/// Kind of stored entity an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Team,
    PullRequest,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::User => "user",
            Entity::Team => "team",
            Entity::PullRequest => "pull request",
        };
        f.write_str(name)
    }
}

/// Pull request state-machine rules that can reject an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BusinessRule {
    /// Reviewers of a merged pull request are frozen
    #[error("cannot reassign on merged PR")]
    PullRequestMerged,

    /// The reviewer being replaced is not on the pull request
    #[error("reviewer is not assigned to this PR")]
    ReviewerNotAssigned,

    /// Nobody in the team can take over the review
    #[error("no active replacement candidate in team")]
    NoCandidate,
}

/// Unified domain error
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("{0} already exists")]
    AlreadyExists(Entity),

    #[error(transparent)]
    BusinessLogic(#[from] BusinessRule),

    #[error("storage failure: {0}")]
    Infrastructure(#[from] sqlx::Error),
}

impl DomainError {
    /// True for the "referenced entity is absent" kind
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound(_))
    }

    /// Returns the violated rule for business-logic failures
    pub fn business_rule(&self) -> Option<BusinessRule> {
        match self {
            DomainError::BusinessLogic(rule) => Some(*rule),
            _ => None,
        }
    }
}

/// Checks whether a sqlx error is a PostgreSQL unique-constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DomainError::NotFound(Entity::PullRequest).to_string(),
            "pull request not found"
        );
        assert_eq!(
            DomainError::AlreadyExists(Entity::Team).to_string(),
            "team already exists"
        );
        assert_eq!(
            DomainError::from(BusinessRule::NoCandidate).to_string(),
            "no active replacement candidate in team"
        );
    }

    #[test]
    fn test_business_rule_accessor() {
        let err = DomainError::from(BusinessRule::PullRequestMerged);
        assert_eq!(err.business_rule(), Some(BusinessRule::PullRequestMerged));
        assert!(!err.is_not_found());

        let err = DomainError::NotFound(Entity::User);
        assert!(err.business_rule().is_none());
        assert!(err.is_not_found());
    }

    #[test]
    fn test_row_not_found_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
