use std::fmt;

pub mod group;
pub mod toy_curve;
pub mod transcript;
pub mod keys;
pub mod aggregate_key;
pub mod commitment;
pub mod nizk_score_range;
pub mod nizk_randomness_sum;
pub mod nizk_decryption_share;
pub mod tally;
pub mod vote;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ZkProofError {
    InvalidInstance,
    InvalidChallenge,
    InvalidChallengeSplit,
    InvalidBranch(usize),
    InvalidBinding,
    InvalidResponse,
    InvalidCommitmentSum,
}

impl fmt::Display for ZkProofError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZkProofError::InvalidInstance => write!(f, "Invalid instance data"),
            ZkProofError::InvalidChallenge => write!(f, "Fiat-Shamir challenge does not match the transcript"),
            ZkProofError::InvalidChallengeSplit => write!(f, "Branch challenges do not sum to the challenge"),
            ZkProofError::InvalidBranch(k) => write!(f, "Branch {} does not verify", k),
            ZkProofError::InvalidBinding => write!(f, "Identity binding does not verify"),
            ZkProofError::InvalidResponse => write!(f, "Response does not verify"),
            ZkProofError::InvalidCommitmentSum => write!(f, "Commitment sums do not match the commitments"),
        }
    }
}

impl std::error::Error for ZkProofError {}
