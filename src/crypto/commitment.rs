use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ec::CurveGroup;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::crypto::aggregate_key::compute_aggregate_key;
use crate::crypto::group::{sum_points, GroupContext, Point, Scalar};
use crate::error::ScoreVotingError;

const LOG_TARGET: &str = "score_voting::crypto::commitment";

/// ElGamal-style commitment to one score: `xi = g^s`, `nu = g^score * W^s`.
#[derive(Debug, PartialEq, Eq)]
pub struct Commitment<C: SWCurveConfig> {
    pub xi: Point<C>,
    pub nu: Point<C>,
}

impl<C: SWCurveConfig> Clone for Commitment<C> {
    fn clone(&self) -> Self {
        Commitment {
            xi: self.xi,
            nu: self.nu,
        }
    }
}

impl<C: SWCurveConfig> Commitment<C> {
    pub fn new(ctx: &GroupContext<C>, score: i64, s: &Scalar<C>, aggregate_key: &Point<C>) -> Self {
        let xi = ctx.mul_generator(s);
        let nu = (*aggregate_key * *s + ctx.mul_generator(&ctx.encode_score(score))).into_affine();
        Commitment { xi, nu }
    }
}

/// One voter's commitments for a round, with the randomness needed to prove them.
pub struct CommitmentSet<C: SWCurveConfig> {
    pub commitments: Vec<Commitment<C>>,
    pub ss: Vec<Scalar<C>>,
    pub aggregate_key: Point<C>,
}

impl<C: SWCurveConfig> Drop for CommitmentSet<C> {
    fn drop(&mut self) {
        self.ss.iter_mut().for_each(Zeroize::zeroize);
    }
}

impl<C: SWCurveConfig> CommitmentSet<C> {
    pub fn xis(&self) -> Vec<Point<C>> {
        self.commitments.iter().map(|c| c.xi).collect()
    }

    pub fn nus(&self) -> Vec<Point<C>> {
        self.commitments.iter().map(|c| c.nu).collect()
    }

    /// `(Σ xi, Σ nu)` over all candidates.
    pub fn sums(&self) -> (Point<C>, Point<C>) {
        sum_commitments(&self.commitments)
    }
}

pub fn sum_commitments<C: SWCurveConfig>(commitments: &[Commitment<C>]) -> (Point<C>, Point<C>) {
    let xi = sum_points(commitments.iter().map(|c| &c.xi));
    let nu = sum_points(commitments.iter().map(|c| &c.nu));
    (xi.into_affine(), nu.into_affine())
}

/// Commits to every score with a fresh `s` per candidate. `W` is computed once for the round.
#[tracing::instrument(skip_all, fields(my_index = my_index, num_candidates = num_candidates))]
pub fn build_commitments<C, R>(
    ctx: &GroupContext<C>,
    scores: &[i64],
    peer_keys: &[Point<C>],
    my_index: usize,
    num_candidates: usize,
    rng: &mut R,
) -> Result<CommitmentSet<C>, ScoreVotingError>
where
    C: SWCurveConfig,
    R: RngCore + CryptoRng,
{
    if scores.len() != num_candidates {
        return Err(ScoreVotingError::ArgumentMismatch(format!(
            "expected {} scores, got {}",
            num_candidates,
            scores.len()
        )));
    }
    if my_index >= peer_keys.len() {
        return Err(ScoreVotingError::IndexOutOfRange {
            index: my_index,
            len: peer_keys.len(),
        });
    }
    let aggregate_key = compute_aggregate_key(ctx, peer_keys, my_index)?;

    let (commitments, ss) = scores
        .iter()
        .map(|score| {
            let s = ctx.random_scalar(rng);
            (Commitment::new(ctx, *score, &s, &aggregate_key), s)
        })
        .unzip();
    tracing::debug!(target: LOG_TARGET, "committed to scores");

    Ok(CommitmentSet {
        commitments,
        ss,
        aggregate_key,
    })
}
