/// Reviewer selection policies
///
/// Pure functions over a roster of users. The random source is passed in
/// so callers decide how it is seeded.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{BusinessRule, DomainResult};
use crate::models::{User, MAX_REVIEWERS};

/// IDs of active users in `members` that are not listed in `excluded`
pub fn eligible_roster<'a>(members: &'a [User], excluded: &[&str]) -> Vec<&'a str> {
    members
        .iter()
        .filter(|u| u.is_active && !excluded.contains(&u.user_id.as_str()))
        .map(|u| u.user_id.as_str())
        .collect()
}

/// Picks up to [`MAX_REVIEWERS`] distinct candidates uniformly at random
///
/// Returns every candidate when there are fewer than that; an empty roster
/// yields an empty selection.
pub fn select_initial_reviewers<R: Rng + ?Sized>(candidates: &[&str], rng: &mut R) -> Vec<String> {
    candidates
        .choose_multiple(rng, MAX_REVIEWERS)
        .map(|id| id.to_string())
        .collect()
}

/// Picks exactly one replacement uniformly at random
///
/// # Errors
///
/// `BusinessLogic(NoCandidate)` when the roster is empty
pub fn select_replacement<R: Rng + ?Sized>(candidates: &[&str], rng: &mut R) -> DomainResult<String> {
    candidates
        .choose(rng)
        .map(|id| id.to_string())
        .ok_or_else(|| BusinessRule::NoCandidate.into())
}
