use rand::distr::weighted::Error as WeightedError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid draw history: {0}")]
    History(String),

    #[error("weighted sampling failed: {0}")]
    Sampling(#[from] WeightedError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

pub(crate) fn config_error(msg: impl Into<String>) -> EngineError {
    EngineError::Config(msg.into())
}
