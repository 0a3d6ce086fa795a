use ark_ec::short_weierstrass::SWCurveConfig;
use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRng, RngCore, SeedableRng};
use rayon::prelude::*;

use crate::config::{ElectionConfig, ScoreRange};
use crate::crypto::aggregate_key::compute_aggregate_key;
use crate::crypto::commitment::{build_commitments, Commitment, CommitmentSet};
use crate::crypto::group::{GroupContext, Point, Scalar};
use crate::crypto::nizk_randomness_sum::{
    prove_nizk_randomness_sum, verify_nizk_randomness_knowledge, AggregateProof, ZkInstanceRandomnessSum,
    ZkWitnessRandomnessSum,
};
use crate::crypto::nizk_score_range::{
    prove_nizk_score_range, verify_nizk_score_range, RangeProofBundle, ZkInstanceScoreRange, ZkWitnessScoreRange,
};
use crate::crypto::ZkProofError;
use crate::error::ScoreVotingError;

const LOG_TARGET: &str = "score_voting::crypto::vote";

/// Everything a voter submits for one round.
#[derive(Debug, PartialEq, Eq)]
pub struct CommitArgs<C: SWCurveConfig> {
    pub xis: Vec<Point<C>>,
    pub nus: Vec<Point<C>>,
    pub proof1: Vec<RangeProofBundle<C>>,
    pub proof2: AggregateProof<C>,
    pub w_i: Point<C>,
}

impl<C: SWCurveConfig> Clone for CommitArgs<C> {
    fn clone(&self) -> Self {
        CommitArgs {
            xis: self.xis.clone(),
            nus: self.nus.clone(),
            proof1: self.proof1.clone(),
            proof2: self.proof2.clone(),
            w_i: self.w_i,
        }
    }
}

impl<C: SWCurveConfig> CommitArgs<C> {
    pub fn num_candidates(&self) -> usize {
        self.xis.len()
    }

    pub fn commitments(&self) -> Vec<Commitment<C>> {
        self.xis
            .iter()
            .zip(&self.nus)
            .map(|(xi, nu)| Commitment { xi: *xi, nu: *nu })
            .collect()
    }
}

fn check_scores(scores: &[i64], num_candidates: usize, range: &ScoreRange) -> Result<(), ScoreVotingError> {
    range.validate()?;
    if scores.len() != num_candidates {
        return Err(ScoreVotingError::ArgumentMismatch(format!(
            "expected {} scores, got {}",
            num_candidates,
            scores.len()
        )));
    }
    scores.iter().try_for_each(|score| range.check_score(*score))
}

fn lookup_voter_key<C: SWCurveConfig>(peer_keys: &[Point<C>], my_index: usize) -> Result<Point<C>, ScoreVotingError> {
    peer_keys
        .get(my_index)
        .copied()
        .ok_or(ScoreVotingError::IndexOutOfRange {
            index: my_index,
            len: peer_keys.len(),
        })
}

#[allow(clippy::too_many_arguments)]
fn prove_candidate<C, R>(
    ctx: &GroupContext<C>,
    set: &CommitmentSet<C>,
    voter_key: Point<C>,
    private_key: &Scalar<C>,
    range: ScoreRange,
    candidate: usize,
    score: i64,
    rng: &mut R,
) -> Result<RangeProofBundle<C>, ScoreVotingError>
where
    C: SWCurveConfig,
    R: RngCore + CryptoRng,
{
    let instance = ZkInstanceScoreRange {
        w: set.aggregate_key,
        voter_key,
        commitment: set.commitments[candidate].clone(),
        range,
    };
    let witness = ZkWitnessScoreRange {
        private_key: *private_key,
        s: set.ss[candidate],
        score,
    };
    prove_nizk_score_range(ctx, &instance, &witness, rng)
}

fn aggregate_proof<C, R>(
    ctx: &GroupContext<C>,
    set: &CommitmentSet<C>,
    num_candidates: usize,
    rng: &mut R,
) -> Result<AggregateProof<C>, ScoreVotingError>
where
    C: SWCurveConfig,
    R: RngCore + CryptoRng,
{
    let instance = ZkInstanceRandomnessSum {
        w: set.aggregate_key,
        commitments: set.commitments.clone(),
    };
    let witness = ZkWitnessRandomnessSum { ss: set.ss.clone() };
    prove_nizk_randomness_sum(ctx, &instance, &witness, num_candidates, rng)
}

fn assemble<C: SWCurveConfig>(
    set: &CommitmentSet<C>,
    proof1: Vec<RangeProofBundle<C>>,
    proof2: AggregateProof<C>,
) -> CommitArgs<C> {
    CommitArgs {
        xis: set.xis(),
        nus: set.nus(),
        proof1,
        proof2,
        w_i: set.aggregate_key,
    }
}

/// Commitments, one range proof per candidate and the aggregate proof, in that order.
#[allow(clippy::too_many_arguments)]
#[tracing::instrument(skip_all, fields(my_index = my_index, num_candidates = num_candidates))]
pub fn build_commit_args<C, R>(
    ctx: &GroupContext<C>,
    private_key: &Scalar<C>,
    scores: &[i64],
    peer_keys: &[Point<C>],
    my_index: usize,
    num_candidates: usize,
    range: ScoreRange,
    rng: &mut R,
) -> Result<CommitArgs<C>, ScoreVotingError>
where
    C: SWCurveConfig,
    R: RngCore + CryptoRng,
{
    check_scores(scores, num_candidates, &range)?;
    let voter_key = lookup_voter_key(peer_keys, my_index)?;
    let set = build_commitments(ctx, scores, peer_keys, my_index, num_candidates, rng)?;

    let proof1 = scores
        .iter()
        .enumerate()
        .map(|(i, score)| prove_candidate(ctx, &set, voter_key, private_key, range, i, *score, rng))
        .collect::<Result<Vec<_>, _>>()?;
    let proof2 = aggregate_proof(ctx, &set, num_candidates, rng)?;
    tracing::debug!(target: LOG_TARGET, "built commit args");

    Ok(assemble(&set, proof1, proof2))
}

/// Same output shape as [`build_commit_args`], with range proofs built on the rayon pool.
///
/// Each candidate gets its own ChaCha20 stream seeded from `rng` in candidate order, so the
/// result does not depend on scheduling.
#[allow(clippy::too_many_arguments)]
#[tracing::instrument(skip_all, fields(my_index = my_index, num_candidates = num_candidates))]
pub fn build_commit_args_parallel<C, R>(
    ctx: &GroupContext<C>,
    private_key: &Scalar<C>,
    scores: &[i64],
    peer_keys: &[Point<C>],
    my_index: usize,
    num_candidates: usize,
    range: ScoreRange,
    rng: &mut R,
) -> Result<CommitArgs<C>, ScoreVotingError>
where
    C: SWCurveConfig,
    R: RngCore + CryptoRng,
{
    check_scores(scores, num_candidates, &range)?;
    let voter_key = lookup_voter_key(peer_keys, my_index)?;
    let set = build_commitments(ctx, scores, peer_keys, my_index, num_candidates, rng)?;

    let seeds: Vec<[u8; 32]> = (0..num_candidates)
        .map(|_| {
            let mut seed = [0u8; 32];
            rng.fill_bytes(&mut seed);
            seed
        })
        .collect();

    let proof1 = scores
        .par_iter()
        .zip(seeds.into_par_iter())
        .enumerate()
        .map(|(i, (score, seed))| {
            let mut candidate_rng = ChaCha20Rng::from_seed(seed);
            prove_candidate(ctx, &set, voter_key, private_key, range, i, *score, &mut candidate_rng)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let proof2 = aggregate_proof(ctx, &set, num_candidates, rng)?;
    tracing::debug!(target: LOG_TARGET, "built commit args in parallel");

    Ok(assemble(&set, proof1, proof2))
}

/// Builds a submission with the score range and proving mode taken from `config`.
#[allow(clippy::too_many_arguments)]
pub fn build_commit_args_with_config<C, R>(
    ctx: &GroupContext<C>,
    config: &ElectionConfig,
    private_key: &Scalar<C>,
    scores: &[i64],
    peer_keys: &[Point<C>],
    my_index: usize,
    num_candidates: usize,
    rng: &mut R,
) -> Result<CommitArgs<C>, ScoreVotingError>
where
    C: SWCurveConfig,
    R: RngCore + CryptoRng,
{
    let range = config.score_range()?;
    if config.parallel_proofs {
        build_commit_args_parallel(ctx, private_key, scores, peer_keys, my_index, num_candidates, range, rng)
    } else {
        build_commit_args(ctx, private_key, scores, peer_keys, my_index, num_candidates, range, rng)
    }
}

/// The ledger-side check of a submission from the voter at `my_index`.
///
/// The aggregate proof is checked up to the score-independent relations; the score total is only
/// known once the round is tallied.
#[tracing::instrument(skip_all, fields(my_index = my_index))]
pub fn verify_commit_args<C: SWCurveConfig>(
    ctx: &GroupContext<C>,
    peer_keys: &[Point<C>],
    my_index: usize,
    args: &CommitArgs<C>,
    range: ScoreRange,
) -> Result<(), ScoreVotingError> {
    range.validate()?;
    let num_candidates = args.num_candidates();
    if num_candidates == 0 || args.nus.len() != num_candidates || args.proof1.len() != num_candidates {
        return Err(ScoreVotingError::ArgumentMismatch(format!(
            "{} xis, {} nus and {} range proofs",
            args.xis.len(),
            args.nus.len(),
            args.proof1.len()
        )));
    }

    let voter_key = lookup_voter_key(peer_keys, my_index)?;
    let w = compute_aggregate_key(ctx, peer_keys, my_index)?;
    if w != args.w_i {
        tracing::debug!(target: LOG_TARGET, "submitted W_i does not match the peer keys");
        return Err(ZkProofError::InvalidInstance.into());
    }

    let commitments = args.commitments();
    for (commitment, proof) in commitments.iter().zip(&args.proof1) {
        let instance = ZkInstanceScoreRange {
            w,
            voter_key,
            commitment: commitment.clone(),
            range,
        };
        verify_nizk_score_range(ctx, &instance, proof)?;
    }

    let instance = ZkInstanceRandomnessSum { w, commitments };
    verify_nizk_randomness_knowledge(ctx, &instance, &args.proof2)?;
    Ok(())
}
