use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ec::CurveGroup;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::crypto::group::{GroupContext, Point, Scalar};
use crate::crypto::transcript::Transcript;
use crate::crypto::ZkProofError;
use crate::error::ScoreVotingError;

/// The nizk proof is used to prove that a decryption share `D = base^x * mask_base^t` was computed
/// with the voter's own private key `x` (`Y = g^x`) and tally key `t` (`T = g^t`)

/// Domain separator for the decryption share challenge
pub const DOMAIN_NIZK_DECRYPTION_SHARE_CHALLENGE: &str = "score-voting-zk-decryption-share-challenge";

#[derive(Debug)]
pub struct ZkInstanceDecryptionShare<C: SWCurveConfig> {
    pub public_key: Point<C>,
    pub tally_key: Point<C>,
    pub base: Point<C>,
    pub mask_base: Point<C>,
    pub share: Point<C>,
}

impl<C: SWCurveConfig> Clone for ZkInstanceDecryptionShare<C> {
    fn clone(&self) -> Self {
        ZkInstanceDecryptionShare {
            public_key: self.public_key,
            tally_key: self.tally_key,
            base: self.base,
            mask_base: self.mask_base,
            share: self.share,
        }
    }
}

pub struct ZkWitnessDecryptionShare<C: SWCurveConfig> {
    pub private_key: Scalar<C>,
    pub tally_secret: Scalar<C>,
}

impl<C: SWCurveConfig> Drop for ZkWitnessDecryptionShare<C> {
    fn drop(&mut self) {
        self.private_key.zeroize();
        self.tally_secret.zeroize();
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ZkProofDecryptionShare<C: SWCurveConfig> {
    pub r_key: Point<C>,
    pub r_tally: Point<C>,
    pub r_share: Point<C>,
    pub challenge: Scalar<C>,
    pub z_key: Scalar<C>,
    pub z_tally: Scalar<C>,
}

impl<C: SWCurveConfig> Clone for ZkProofDecryptionShare<C> {
    fn clone(&self) -> Self {
        ZkProofDecryptionShare {
            r_key: self.r_key,
            r_tally: self.r_tally,
            r_share: self.r_share,
            challenge: self.challenge,
            z_key: self.z_key,
            z_tally: self.z_tally,
        }
    }
}

impl<C: SWCurveConfig> ZkInstanceDecryptionShare<C> {
    pub fn validate(&self, ctx: &GroupContext<C>) -> Result<(), ScoreVotingError> {
        ctx.validate_point(&self.public_key)?;
        ctx.validate_point(&self.tally_key)?;
        ctx.check_on_curve(&self.base)?;
        ctx.check_on_curve(&self.mask_base)?;
        ctx.check_on_curve(&self.share)
    }

    pub fn check_instance(&self, ctx: &GroupContext<C>) -> Result<(), ZkProofError> {
        self.validate(ctx).map_err(|_| ZkProofError::InvalidInstance)
    }
}

//challenge = H(domain, g, Y, T, base, mask_base, share, R_key, R_tally, R_share)
fn zk_decryption_share_proof_challenge<C: SWCurveConfig>(
    ctx: &GroupContext<C>,
    instance: &ZkInstanceDecryptionShare<C>,
    r_key: &Point<C>,
    r_tally: &Point<C>,
    r_share: &Point<C>,
) -> Scalar<C> {
    Transcript::new()
        .append_domain(DOMAIN_NIZK_DECRYPTION_SHARE_CHALLENGE)
        .append_point(&ctx.generator())
        .append_point(&instance.public_key)
        .append_point(&instance.tally_key)
        .append_point(&instance.base)
        .append_point(&instance.mask_base)
        .append_point(&instance.share)
        .append_point(r_key)
        .append_point(r_tally)
        .append_point(r_share)
        .challenge()
}

pub fn prove_nizk_decryption_share<C, R>(
    ctx: &GroupContext<C>,
    instance: &ZkInstanceDecryptionShare<C>,
    witness: &ZkWitnessDecryptionShare<C>,
    rng: &mut R,
) -> Result<ZkProofDecryptionShare<C>, ScoreVotingError>
where
    C: SWCurveConfig,
    R: RngCore + CryptoRng,
{
    instance.validate(ctx)?;
    if ctx.mul_generator(&witness.private_key) != instance.public_key
        || ctx.mul_generator(&witness.tally_secret) != instance.tally_key
    {
        return Err(ScoreVotingError::ArgumentMismatch(String::from(
            "witness does not match the registered keys",
        )));
    }

    let k_key = ctx.random_scalar(rng);
    let k_tally = ctx.random_scalar(rng);
    let r_key = ctx.mul_generator(&k_key);
    let r_tally = ctx.mul_generator(&k_tally);
    let r_share = (instance.base * k_key + instance.mask_base * k_tally).into_affine();

    let challenge = zk_decryption_share_proof_challenge(ctx, instance, &r_key, &r_tally, &r_share);

    Ok(ZkProofDecryptionShare {
        r_key,
        r_tally,
        r_share,
        challenge,
        z_key: k_key + challenge * witness.private_key,
        z_tally: k_tally + challenge * witness.tally_secret,
    })
}

pub fn verify_nizk_decryption_share<C: SWCurveConfig>(
    ctx: &GroupContext<C>,
    instance: &ZkInstanceDecryptionShare<C>,
    nizk: &ZkProofDecryptionShare<C>,
) -> Result<(), ZkProofError> {
    instance.check_instance(ctx)?;
    if ctx.check_on_curve(&nizk.r_key).is_err()
        || ctx.check_on_curve(&nizk.r_tally).is_err()
        || ctx.check_on_curve(&nizk.r_share).is_err()
    {
        return Err(ZkProofError::InvalidInstance);
    }

    let challenge_prime = zk_decryption_share_proof_challenge(ctx, instance, &nizk.r_key, &nizk.r_tally, &nizk.r_share);
    if nizk.challenge != challenge_prime {
        return Err(ZkProofError::InvalidChallenge);
    }

    let g = ctx.generator();
    let key_ok = g * nizk.z_key == instance.public_key * nizk.challenge + nizk.r_key;
    let tally_ok = g * nizk.z_tally == instance.tally_key * nizk.challenge + nizk.r_tally;
    let share_ok = instance.base * nizk.z_key + instance.mask_base * nizk.z_tally
        == instance.share * nizk.challenge + nizk.r_share;
    if !(key_ok && tally_ok && share_ok) {
        return Err(ZkProofError::InvalidResponse);
    }
    Ok(())
}
