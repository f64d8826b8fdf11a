//! Async collaborators around the synchronous engine: parent services, the
//! blocking bridge the tick calls through, and the event chronicle.

pub mod bridge;
pub mod chronicle;
pub mod parent;

pub use bridge::BlockingAdvisor;
pub use chronicle::{Chronicle, Narration};
pub use parent::{CannedParentService, HttpParentService, ParentService};
