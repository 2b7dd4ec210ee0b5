/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `teams`: Team creation, lookup and deactivation
/// - `users`: Activity toggle and review listing
/// - `pull_requests`: Create, merge and reassign
/// - `stats`: Assignment statistics

pub mod health;
pub mod pull_requests;
pub mod stats;
pub mod teams;
pub mod users;
