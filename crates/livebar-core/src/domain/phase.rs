//! Destination task state machine.

use serde::{Deserialize, Serialize};

/// Where a destination task currently is in its cycle.
///
/// State transitions:
/// - Idle -> Fetching -> RenderingSidebar -> PublishingSidebar
///   -> RenderingWiki -> PublishingWiki -> Sleeping -> Idle
/// - any -> Stopped (shutdown requested)
/// - any -> Aborted (credentials rejected)
///
/// A rejected publish jumps straight to Sleeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskPhase {
    Idle,
    Fetching,
    RenderingSidebar,
    PublishingSidebar,
    RenderingWiki,
    PublishingWiki,
    Sleeping,
    Stopped,
    Aborted,
}

impl TaskPhase {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskPhase::Stopped | TaskPhase::Aborted)
    }
}
