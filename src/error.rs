use thiserror::Error;

use crate::crypto::ZkProofError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreVotingError {
    #[error("Group parameters are not initialized")]
    GroupUninitialized,
    #[error("Invalid point: {0}")]
    InvalidPoint(String),
    #[error("Index {index} is out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Argument mismatch: {0}")]
    ArgumentMismatch(String),
    #[error("Invalid score range [{min}, {max}]")]
    InvalidRange { min: i64, max: i64 },
    #[error("Score {score} is outside [{min}, {max}]")]
    ScoreOutOfRange { score: i64, min: i64, max: i64 },
    #[error("Encoding error: {0}")]
    EncodingError(String),
    #[error("Tally is outside the searched range [{min}, {max}]")]
    TallyOutOfBounds { min: i64, max: i64 },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Proof error: {0}")]
    Proof(#[from] ZkProofError),
}
