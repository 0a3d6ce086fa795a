//! The nizk proof shows knowledge of `S = Σ s_i` behind the summed commitments
//! `p_xi = Σ xi_i = g^S` and `p_nu = Σ nu_i = g^T * W^S`, without revealing any single `s_i`.

use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ec::{AffineRepr, CurveGroup};
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::crypto::aggregate_key::compute_aggregate_key;
use crate::crypto::commitment::{sum_commitments, Commitment};
use crate::crypto::group::{GroupContext, Point, Scalar};
use crate::crypto::transcript::Transcript;
use crate::crypto::ZkProofError;
use crate::error::ScoreVotingError;

const LOG_TARGET: &str = "score_voting::crypto::nizk_randomness_sum";

#[derive(Debug)]
pub struct ZkInstanceRandomnessSum<C: SWCurveConfig> {
    pub w: Point<C>,
    pub commitments: Vec<Commitment<C>>,
}

impl<C: SWCurveConfig> Clone for ZkInstanceRandomnessSum<C> {
    fn clone(&self) -> Self {
        ZkInstanceRandomnessSum {
            w: self.w,
            commitments: self.commitments.clone(),
        }
    }
}

pub struct ZkWitnessRandomnessSum<C: SWCurveConfig> {
    pub ss: Vec<Scalar<C>>,
}

impl<C: SWCurveConfig> Drop for ZkWitnessRandomnessSum<C> {
    fn drop(&mut self) {
        self.ss.iter_mut().for_each(Zeroize::zeroize);
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct AggregateProof<C: SWCurveConfig> {
    pub p_xi: Point<C>,
    pub p_xi_new: Point<C>,
    pub p_nu: Point<C>,
    pub p_nu_new: Point<C>,
    pub s_s_new: Scalar<C>,
    pub c: Scalar<C>,
}

impl<C: SWCurveConfig> Clone for AggregateProof<C> {
    fn clone(&self) -> Self {
        AggregateProof {
            p_xi: self.p_xi,
            p_xi_new: self.p_xi_new,
            p_nu: self.p_nu,
            p_nu_new: self.p_nu_new,
            s_s_new: self.s_s_new,
            c: self.c,
        }
    }
}

impl<C: SWCurveConfig> ZkInstanceRandomnessSum<C> {
    pub fn new(
        ctx: &GroupContext<C>,
        peer_keys: &[Point<C>],
        my_index: usize,
        commitments: Vec<Commitment<C>>,
    ) -> Result<Self, ScoreVotingError> {
        let w = compute_aggregate_key(ctx, peer_keys, my_index)?;
        let instance = ZkInstanceRandomnessSum { w, commitments };
        instance.validate(ctx)?;
        Ok(instance)
    }

    /// Needs at least one commitment; off-curve points surface as `InvalidPoint`.
    pub fn validate(&self, ctx: &GroupContext<C>) -> Result<(), ScoreVotingError> {
        if self.commitments.is_empty() {
            return Err(ScoreVotingError::ArgumentMismatch(String::from("no commitments")));
        }
        ctx.check_on_curve(&self.w)?;
        self.commitments.iter().try_for_each(|c| -> Result<(), ScoreVotingError> {
            ctx.check_on_curve(&c.xi)?;
            ctx.check_on_curve(&c.nu)
        })
    }

    pub fn check_instance(&self, ctx: &GroupContext<C>) -> Result<(), ZkProofError> {
        self.validate(ctx).map_err(|_| ZkProofError::InvalidInstance)
    }
}

//challenge = H(p_xi, p_xi_new, p_nu, p_nu_new)
fn zk_randomness_sum_proof_challenge<C: SWCurveConfig>(
    p_xi: &Point<C>,
    p_xi_new: &Point<C>,
    p_nu: &Point<C>,
    p_nu_new: &Point<C>,
) -> Scalar<C> {
    Transcript::new()
        .append_point(p_xi)
        .append_point(p_xi_new)
        .append_point(p_nu)
        .append_point(p_nu_new)
        .challenge()
}

#[tracing::instrument(skip_all, fields(num_candidates = num_candidates))]
pub fn prove_nizk_randomness_sum<C, R>(
    ctx: &GroupContext<C>,
    instance: &ZkInstanceRandomnessSum<C>,
    witness: &ZkWitnessRandomnessSum<C>,
    num_candidates: usize,
    rng: &mut R,
) -> Result<AggregateProof<C>, ScoreVotingError>
where
    C: SWCurveConfig,
    R: RngCore + CryptoRng,
{
    if witness.ss.len() != num_candidates || instance.commitments.len() != num_candidates {
        return Err(ScoreVotingError::ArgumentMismatch(format!(
            "expected {} randomness values and commitments, got {} and {}",
            num_candidates,
            witness.ss.len(),
            instance.commitments.len()
        )));
    }
    instance.validate(ctx)?;

    // one sample per candidate, summed
    let s_sum: Scalar<C> = (0..num_candidates).map(|_| ctx.random_scalar(rng)).sum();
    let p_xi_new = ctx.mul_generator(&s_sum);
    let p_nu_new = (instance.w * s_sum).into_affine();
    let (p_xi, p_nu) = sum_commitments(&instance.commitments);

    let c = zk_randomness_sum_proof_challenge(&p_xi, &p_xi_new, &p_nu, &p_nu_new);
    let s_total: Scalar<C> = witness.ss.iter().sum();

    Ok(AggregateProof {
        p_xi,
        p_xi_new,
        p_nu,
        p_nu_new,
        s_s_new: s_sum - c * s_total,
        c,
    })
}

/// Checks everything that does not depend on the committed scores: the sums, the challenge and
/// `p_xi_new = g^s_s_new * p_xi^c`.
pub fn verify_nizk_randomness_knowledge<C: SWCurveConfig>(
    ctx: &GroupContext<C>,
    instance: &ZkInstanceRandomnessSum<C>,
    nizk: &AggregateProof<C>,
) -> Result<(), ZkProofError> {
    instance.check_instance(ctx)?;

    let (p_xi, p_nu) = sum_commitments(&instance.commitments);
    if p_xi != nizk.p_xi || p_nu != nizk.p_nu {
        tracing::debug!(target: LOG_TARGET, "commitment sums do not match");
        return Err(ZkProofError::InvalidCommitmentSum);
    }
    if ctx.check_on_curve(&nizk.p_xi_new).is_err() || ctx.check_on_curve(&nizk.p_nu_new).is_err() {
        return Err(ZkProofError::InvalidInstance);
    }

    let challenge_prime = zk_randomness_sum_proof_challenge(&nizk.p_xi, &nizk.p_xi_new, &nizk.p_nu, &nizk.p_nu_new);
    if nizk.c != challenge_prime {
        tracing::debug!(target: LOG_TARGET, "challenge mismatch");
        return Err(ZkProofError::InvalidChallenge);
    }

    let xi_prime = ctx.generator() * nizk.s_s_new + nizk.p_xi * nizk.c;
    if xi_prime != nizk.p_xi_new {
        tracing::debug!(target: LOG_TARGET, "xi relation fails");
        return Err(ZkProofError::InvalidResponse);
    }
    Ok(())
}

/// Full check against a claimed score total `T`: additionally
/// `p_nu_new = W^s_s_new * (p_nu * g^-T)^c`.
#[tracing::instrument(skip_all, fields(num_candidates = instance.commitments.len()))]
pub fn verify_nizk_randomness_sum<C: SWCurveConfig>(
    ctx: &GroupContext<C>,
    instance: &ZkInstanceRandomnessSum<C>,
    nizk: &AggregateProof<C>,
    score_total: i64,
) -> Result<(), ZkProofError> {
    verify_nizk_randomness_knowledge(ctx, instance, nizk)?;

    let unscored = nizk.p_nu.into_group() - ctx.mul_generator(&ctx.encode_score(score_total));
    let nu_prime = instance.w * nizk.s_s_new + unscored * nizk.c;
    if nu_prime != nizk.p_nu_new {
        tracing::debug!(target: LOG_TARGET, "nu relation fails");
        return Err(ZkProofError::InvalidResponse);
    }
    Ok(())
}
