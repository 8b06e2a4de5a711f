use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("ConfigError: {0}")]
pub struct ConfigError(pub String);

/// Why a single test case produced no scores.
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation failed: {0:#}")]
    Generation(anyhow::Error),

    #[error("generation returned no letter text")]
    EmptyResponse,
}
