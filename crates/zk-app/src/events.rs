use std::time::Duration;

use zk_core::error::GenerationError;
use zk_core::session::SubmissionId;
use zk_core::AssetReference;

/// Everything that can move a live generation session forward
#[derive(Debug, Clone)]
pub enum GenEvent {
    /// The request client answered for `id`
    Resolved {
        id: SubmissionId,
        outcome: Result<AssetReference, GenerationError>,
    },
    /// Time since submission, for the advisory estimate
    Tick(Duration),
    CancelRequested,
}
