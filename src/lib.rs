pub mod batch;
pub mod condition;
pub mod error;
pub mod logging;
pub mod options;
pub mod project;
pub mod report;
pub mod rules;
pub mod select;

pub use batch::{BatchSummary, FileOutcome};
pub use error::ProjectError;
pub use options::{LinkSettings, Options, TestFramework};
pub use project::{Block, Project};
pub use report::{Change, Outcome, Report};
pub use rules::Dialect;
