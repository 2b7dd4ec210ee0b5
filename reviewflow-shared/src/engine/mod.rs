/// Reviewer-assignment engine
///
/// [`ReviewEngine`] owns no mutable state. Everything lives behind the
/// [`Directory`]; the engine only holds a factory for random generators so
/// each operation draws from a fresh one.
///
/// - `selector`: pure candidate selection
/// - `lifecycle`: create, merge, reassign and get pull requests
/// - `cascade`: team deactivation with reviewer pruning
/// - `stats`: read-only assignment counts
/// - `teams`: team and user administration
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use reviewflow_shared::directory::InMemoryDirectory;
/// use reviewflow_shared::engine::ReviewEngine;
///
/// # async fn example() -> Result<(), reviewflow_shared::error::DomainError> {
/// let engine = ReviewEngine::new(Arc::new(InMemoryDirectory::new()));
/// let pr = engine.create_pull_request("pr-1", "Add search", "u1").await?;
/// println!("reviewers: {:?}", pr.reviewers);
/// # Ok(())
/// # }
/// ```

pub mod selector;

mod cascade;
mod lifecycle;
mod stats;
mod teams;

pub use lifecycle::Reassignment;
pub use crate::models::TeamMember;
pub use teams::{TeamRoster, UserMembership};

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::directory::Directory;

/// Produces a fresh random generator for each selection
pub type RngFactory = Arc<dyn Fn() -> StdRng + Send + Sync>;

/// Reviewer-assignment and consistency engine
#[derive(Clone)]
pub struct ReviewEngine {
    directory: Arc<dyn Directory>,
    rng: RngFactory,
}

impl ReviewEngine {
    /// Engine drawing from OS entropy
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self::with_rng(directory, Arc::new(StdRng::from_entropy))
    }

    /// Engine with a caller-provided generator factory
    pub fn with_rng(directory: Arc<dyn Directory>, rng: RngFactory) -> Self {
        Self { directory, rng }
    }

    /// Engine whose every operation starts from the same seed
    pub fn seeded(directory: Arc<dyn Directory>, seed: u64) -> Self {
        Self::with_rng(directory, Arc::new(move || StdRng::seed_from_u64(seed)))
    }

    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    fn rng(&self) -> StdRng {
        (self.rng)()
    }
}
