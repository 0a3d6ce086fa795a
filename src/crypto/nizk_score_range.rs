//! Disjunctive proof that `(xi, nu)` commits to some score in `[min_score, max_score]`,
//! together with a Schnorr proof of the voter's private key.
//!
//! Every score `k` in the range gets a branch `(a_k, b_k, d_k, e_k)` satisfying
//! `a_k = g^e_k * xi^d_k` and `b_k = W^e_k * (nu * g^-k)^d_k`. All but the true branch are
//! simulated; the true one is completed once the branch challenges `d_k` are forced to sum to
//! the Fiat-Shamir challenge `c`.

use ark_ec::short_weierstrass::{Projective, SWCurveConfig};
use ark_ec::{AffineRepr, CurveGroup};
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::config::ScoreRange;
use crate::crypto::aggregate_key::compute_aggregate_key;
use crate::crypto::commitment::Commitment;
use crate::crypto::group::{GroupContext, Point, Scalar};
use crate::crypto::transcript::Transcript;
use crate::crypto::ZkProofError;
use crate::error::ScoreVotingError;

const LOG_TARGET: &str = "score_voting::crypto::nizk_score_range";

#[derive(Debug)]
pub struct ZkInstanceScoreRange<C: SWCurveConfig> {
    /// Aggregate key of the other voters.
    pub w: Point<C>,
    pub voter_key: Point<C>,
    pub commitment: Commitment<C>,
    pub range: ScoreRange,
}

impl<C: SWCurveConfig> Clone for ZkInstanceScoreRange<C> {
    fn clone(&self) -> Self {
        ZkInstanceScoreRange {
            w: self.w,
            voter_key: self.voter_key,
            commitment: self.commitment.clone(),
            range: self.range,
        }
    }
}

pub struct ZkWitnessScoreRange<C: SWCurveConfig> {
    pub private_key: Scalar<C>,
    pub s: Scalar<C>,
    pub score: i64,
}

impl<C: SWCurveConfig> Drop for ZkWitnessScoreRange<C> {
    fn drop(&mut self) {
        self.private_key.zeroize();
        self.s.zeroize();
        self.score.zeroize();
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct RangeBranch<C: SWCurveConfig> {
    pub a: Point<C>,
    pub b: Point<C>,
    pub d: Scalar<C>,
    pub e: Scalar<C>,
}

impl<C: SWCurveConfig> Clone for RangeBranch<C> {
    fn clone(&self) -> Self {
        RangeBranch {
            a: self.a,
            b: self.b,
            d: self.d,
            e: self.e,
        }
    }
}

/// One per candidate commitment. `branches[i]` belongs to score `min_score + i`.
#[derive(Debug, PartialEq, Eq)]
pub struct RangeProofBundle<C: SWCurveConfig> {
    pub xi: Point<C>,
    pub nu: Point<C>,
    pub c: Scalar<C>,
    pub branches: Vec<RangeBranch<C>>,
    pub x_new_new: Scalar<C>,
    pub y_new: Point<C>,
}

impl<C: SWCurveConfig> Clone for RangeProofBundle<C> {
    fn clone(&self) -> Self {
        RangeProofBundle {
            xi: self.xi,
            nu: self.nu,
            c: self.c,
            branches: self.branches.clone(),
            x_new_new: self.x_new_new,
            y_new: self.y_new,
        }
    }
}

impl<C: SWCurveConfig> ZkInstanceScoreRange<C> {
    pub fn new(
        ctx: &GroupContext<C>,
        peer_keys: &[Point<C>],
        my_index: usize,
        commitment: Commitment<C>,
        range: ScoreRange,
    ) -> Result<Self, ScoreVotingError> {
        range.validate()?;
        let voter_key = *peer_keys.get(my_index).ok_or(ScoreVotingError::IndexOutOfRange {
            index: my_index,
            len: peer_keys.len(),
        })?;
        let w = compute_aggregate_key(ctx, peer_keys, my_index)?;
        let instance = ZkInstanceScoreRange {
            w,
            voter_key,
            commitment,
            range,
        };
        instance.validate(ctx)?;
        Ok(instance)
    }

    /// Range and point checks. Off-curve points surface as `InvalidPoint`.
    pub fn validate(&self, ctx: &GroupContext<C>) -> Result<(), ScoreVotingError> {
        self.range.validate()?;
        ctx.validate_point(&self.voter_key)?;
        ctx.check_on_curve(&self.w)?;
        ctx.check_on_curve(&self.commitment.xi)?;
        ctx.check_on_curve(&self.commitment.nu)
    }

    pub fn check_instance(&self, ctx: &GroupContext<C>) -> Result<(), ZkProofError> {
        self.validate(ctx).map_err(|_| ZkProofError::InvalidInstance)
    }

    /// `nu * g^-k`
    fn shifted_nu(&self, ctx: &GroupContext<C>, k: i64) -> Projective<C> {
        self.commitment.nu.into_group() - ctx.mul_generator(&ctx.encode_score(k))
    }
}

//challenge = H(Y_new, xi, nu, a_min, b_min, ..., a_max, b_max)
fn zk_score_range_proof_challenge<C: SWCurveConfig>(
    instance: &ZkInstanceScoreRange<C>,
    y_new: &Point<C>,
    branches: &[(Point<C>, Point<C>)],
) -> Scalar<C> {
    let mut transcript = Transcript::new();
    transcript
        .append_point(y_new)
        .append_point(&instance.commitment.xi)
        .append_point(&instance.commitment.nu);
    for (a, b) in branches {
        transcript.append_point(a).append_point(b);
    }
    transcript.challenge()
}

#[tracing::instrument(skip_all, fields(min_score = instance.range.min_score, max_score = instance.range.max_score))]
pub fn prove_nizk_score_range<C, R>(
    ctx: &GroupContext<C>,
    instance: &ZkInstanceScoreRange<C>,
    witness: &ZkWitnessScoreRange<C>,
    rng: &mut R,
) -> Result<RangeProofBundle<C>, ScoreVotingError>
where
    C: SWCurveConfig,
    R: RngCore + CryptoRng,
{
    instance.validate(ctx)?;
    instance.range.check_score(witness.score)?;
    if ctx.mul_generator(&witness.private_key) != instance.voter_key {
        return Err(ScoreVotingError::ArgumentMismatch(String::from(
            "private key does not match the voter's registered key",
        )));
    }

    let g = ctx.generator();
    let xi = instance.commitment.xi;
    let w = instance.w;

    let x_new = ctx.random_scalar(rng);
    let y_new = ctx.mul_generator(&x_new);
    let rho = ctx.random_scalar(rng);

    // (a_k, b_k, Some((d_k, e_k))) for simulated branches, None for the true one
    let commitments: Vec<(Point<C>, Point<C>, Option<(Scalar<C>, Scalar<C>)>)> = instance
        .range
        .scores()
        .map(|k| {
            if k == witness.score {
                (ctx.mul_generator(&rho), (w * rho).into_affine(), None)
            } else {
                let d = ctx.random_scalar(rng);
                let e = ctx.random_scalar(rng);
                let a = (g * e + xi * d).into_affine();
                let b = (w * e + instance.shifted_nu(ctx, k) * d).into_affine();
                (a, b, Some((d, e)))
            }
        })
        .collect();

    let points: Vec<_> = commitments.iter().map(|(a, b, _)| (*a, *b)).collect();
    let c = zk_score_range_proof_challenge(instance, &y_new, &points);

    let simulated_sum: Scalar<C> = commitments
        .iter()
        .filter_map(|(_, _, de)| de.map(|(d, _)| d))
        .sum();
    let d_true = c - simulated_sum;
    let e_true = rho - witness.s * d_true;

    let branches = commitments
        .into_iter()
        .map(|(a, b, de)| {
            let (d, e) = de.unwrap_or((d_true, e_true));
            RangeBranch { a, b, d, e }
        })
        .collect();

    Ok(RangeProofBundle {
        xi,
        nu: instance.commitment.nu,
        c,
        branches,
        x_new_new: x_new - c * witness.private_key,
        y_new,
    })
}

#[tracing::instrument(skip_all, fields(min_score = instance.range.min_score, max_score = instance.range.max_score))]
pub fn verify_nizk_score_range<C: SWCurveConfig>(
    ctx: &GroupContext<C>,
    instance: &ZkInstanceScoreRange<C>,
    nizk: &RangeProofBundle<C>,
) -> Result<(), ZkProofError> {
    instance.check_instance(ctx)?;
    if nizk.xi != instance.commitment.xi
        || nizk.nu != instance.commitment.nu
        || nizk.branches.len() != instance.range.len()
        || ctx.check_on_curve(&nizk.y_new).is_err()
    {
        tracing::debug!(target: LOG_TARGET, "proof does not match the instance");
        return Err(ZkProofError::InvalidInstance);
    }

    let points: Vec<_> = nizk.branches.iter().map(|br| (br.a, br.b)).collect();
    let challenge_prime = zk_score_range_proof_challenge(instance, &nizk.y_new, &points);
    if nizk.c != challenge_prime {
        tracing::debug!(target: LOG_TARGET, "challenge mismatch");
        return Err(ZkProofError::InvalidChallenge);
    }

    let d_sum: Scalar<C> = nizk.branches.iter().map(|br| br.d).sum();
    if d_sum != nizk.c {
        tracing::debug!(target: LOG_TARGET, "branch challenges do not sum to c");
        return Err(ZkProofError::InvalidChallengeSplit);
    }

    let g = ctx.generator();
    for (i, (k, br)) in instance.range.scores().zip(&nizk.branches).enumerate() {
        if ctx.check_on_curve(&br.a).is_err() || ctx.check_on_curve(&br.b).is_err() {
            return Err(ZkProofError::InvalidBranch(i));
        }
        let a_prime = g * br.e + nizk.xi * br.d;
        let b_prime = instance.w * br.e + instance.shifted_nu(ctx, k) * br.d;
        if a_prime != br.a || b_prime != br.b {
            tracing::debug!(target: LOG_TARGET, branch = i, "branch relation fails");
            return Err(ZkProofError::InvalidBranch(i));
        }
    }

    let y_prime = instance.voter_key * nizk.c + g * nizk.x_new_new;
    if y_prime != nizk.y_new {
        tracing::debug!(target: LOG_TARGET, "identity binding fails");
        return Err(ZkProofError::InvalidBinding);
    }
    Ok(())
}
