//! Library entry point for the score_voting crate.
//
// Self-tallying score voting: commitments, range proofs, aggregate proofs and the tally.

pub mod config;
pub mod crypto;
pub mod error;
pub mod serde_types;

pub use config::{ElectionConfig, ScoreRange};
pub use crypto::group::GroupContext;
pub use crypto::keys::{generate_key_pair, KeyPair};
pub use crypto::vote::{
    build_commit_args, build_commit_args_parallel, build_commit_args_with_config, verify_commit_args, CommitArgs,
};
pub use error::ScoreVotingError;

/// The production curve.
pub type Secp256k1 = ark_secp256k1::Config;
