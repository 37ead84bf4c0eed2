pub mod document;
pub mod plan;
pub mod request;

pub use document::{ConfigDocument, OutputTarget, Section};
pub use plan::{JobPlan, DEFAULT_JOBS};
pub use request::{block_size_for, Direction, JobRequest, Pattern, SubJobKey};
