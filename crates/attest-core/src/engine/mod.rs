pub mod prompt;
pub mod runner;

pub use runner::{RunArtifacts, RunOutcome, RunRequest, RunSettings, Runner};
