use std::env::var;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::ScoreVotingError;

pub const MIN_SCORE: i64 = 0;
pub const MAX_SCORE: i64 = 5;

pub const ENV_MIN_SCORE: &str = "SCORE_VOTING_MIN_SCORE";
pub const ENV_MAX_SCORE: &str = "SCORE_VOTING_MAX_SCORE";
pub const ENV_PARALLEL_PROOFS: &str = "SCORE_VOTING_PARALLEL_PROOFS";

/// Inclusive bounds a single score must lie in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min_score: i64,
    pub max_score: i64,
}

impl Default for ScoreRange {
    fn default() -> Self {
        ScoreRange {
            min_score: MIN_SCORE,
            max_score: MAX_SCORE,
        }
    }
}

impl ScoreRange {
    pub fn new(min_score: i64, max_score: i64) -> Result<Self, ScoreVotingError> {
        let range = ScoreRange { min_score, max_score };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), ScoreVotingError> {
        if self.min_score > self.max_score {
            return Err(ScoreVotingError::InvalidRange {
                min: self.min_score,
                max: self.max_score,
            });
        }
        Ok(())
    }

    /// Number of branches a range proof carries.
    pub fn len(&self) -> usize {
        if self.min_score > self.max_score {
            return 0;
        }
        (self.max_score.abs_diff(self.min_score) as usize).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, score: i64) -> bool {
        self.scores().contains(&score)
    }

    pub fn scores(&self) -> RangeInclusive<i64> {
        self.min_score..=self.max_score
    }

    pub fn check_score(&self, score: i64) -> Result<(), ScoreVotingError> {
        if !self.contains(score) {
            return Err(ScoreVotingError::ScoreOutOfRange {
                score,
                min: self.min_score,
                max: self.max_score,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectionConfig {
    pub min_score: i64,
    pub max_score: i64,
    /// Build per-candidate range proofs on the rayon pool.
    pub parallel_proofs: bool,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        ElectionConfig {
            min_score: MIN_SCORE,
            max_score: MAX_SCORE,
            parallel_proofs: false,
        }
    }
}

impl ElectionConfig {
    pub fn from_json(json: &str) -> Result<Self, ScoreVotingError> {
        let config: ElectionConfig =
            serde_json::from_str(json).map_err(|e| ScoreVotingError::ConfigError(e.to_string()))?;
        config.score_range()?;
        Ok(config)
    }

    /// Reads `SCORE_VOTING_*` variables; unset ones keep their defaults.
    pub fn from_env() -> Result<Self, ScoreVotingError> {
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScoreVotingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ElectionConfig::default();
        let config = ElectionConfig {
            min_score: parse_var(&lookup, ENV_MIN_SCORE)?.unwrap_or(defaults.min_score),
            max_score: parse_var(&lookup, ENV_MAX_SCORE)?.unwrap_or(defaults.max_score),
            parallel_proofs: parse_var(&lookup, ENV_PARALLEL_PROOFS)?.unwrap_or(defaults.parallel_proofs),
        };
        config.score_range()?;
        Ok(config)
    }

    pub fn score_range(&self) -> Result<ScoreRange, ScoreVotingError> {
        ScoreRange::new(self.min_score, self.max_score)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ScoreVotingError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ScoreVotingError::ConfigError(format!("{} has a malformed value: {:?}", key, val))),
        None => Ok(None),
    }
}
