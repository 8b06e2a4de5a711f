use crate::model::{EvalResult, NewRun, RunSummary, TestCase};

pub mod schema;
pub mod store;

pub use store::Store;

/// Persistence seen by the run orchestrator.
pub trait EvalStore: Send + Sync {
    /// Active test cases ordered by id.
    fn active_test_cases(&self) -> anyhow::Result<Vec<TestCase>>;
    fn create_run(&self, run: &NewRun) -> anyhow::Result<i64>;
    fn insert_result(&self, result: &EvalResult) -> anyhow::Result<i64>;
    /// Attaches the summary and marks the run completed. Fails if the run is
    /// missing or was already completed.
    fn complete_run(&self, run_id: i64, summary: &RunSummary) -> anyhow::Result<()>;
}
