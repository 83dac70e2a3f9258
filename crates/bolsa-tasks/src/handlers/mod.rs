//! Task handlers for each task type.

mod dispatch_proposal;
mod purge;
mod regenerate;

pub use dispatch_proposal::DispatchProposalHandler;
pub use purge::PurgeExpiredMatchesHandler;
pub use regenerate::{RegenerateCandidateMatchesHandler, RegenerateJobMatchesHandler};
