use ark_ec::short_weierstrass::SWCurveConfig;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::crypto::group::{GroupContext, Point, Scalar};
use crate::crypto::transcript::Transcript;
use crate::error::ScoreVotingError;

const LOG_TARGET: &str = "score_voting::crypto::keys";

/// Long-term voter key pair. The private half is wiped on drop and never leaves the voter.
pub struct KeyPair<C: SWCurveConfig> {
    pub private_key: Scalar<C>,
    pub public_key: Point<C>,
}

impl<C: SWCurveConfig> Clone for KeyPair<C> {
    fn clone(&self) -> Self {
        KeyPair {
            private_key: self.private_key,
            public_key: self.public_key,
        }
    }
}

impl<C: SWCurveConfig> Drop for KeyPair<C> {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

impl<C: SWCurveConfig> KeyPair<C> {
    pub fn from_private_key(ctx: &GroupContext<C>, private_key: Scalar<C>) -> Self {
        KeyPair {
            private_key,
            public_key: ctx.mul_generator(&private_key),
        }
    }
}

/// `y = g^x`, with `x` hashed from the private key, a candidate id and a fresh nonce.
#[derive(Debug, PartialEq, Eq)]
pub struct DerivedKey<C: SWCurveConfig> {
    pub x: Scalar<C>,
    pub y: Point<C>,
}

impl<C: SWCurveConfig> Clone for DerivedKey<C> {
    fn clone(&self) -> Self {
        DerivedKey { x: self.x, y: self.y }
    }
}

/// Key material posted when a voter registers. `ys` double as the voter's tally keys; `xs` stay
/// private and are wiped on drop.
#[derive(Debug)]
pub struct VoterKeys<C: SWCurveConfig> {
    pub xs: Vec<Scalar<C>>,
    pub ys: Vec<Point<C>>,
    pub rand_keys: Vec<Point<C>>,
    pub rand_vote_keys: Vec<Vec<Point<C>>>,
}

impl<C: SWCurveConfig> Clone for VoterKeys<C> {
    fn clone(&self) -> Self {
        VoterKeys {
            xs: self.xs.clone(),
            ys: self.ys.clone(),
            rand_keys: self.rand_keys.clone(),
            rand_vote_keys: self.rand_vote_keys.clone(),
        }
    }
}

impl<C: SWCurveConfig> Drop for VoterKeys<C> {
    fn drop(&mut self) {
        self.xs.iter_mut().for_each(Zeroize::zeroize);
    }
}

pub fn generate_key_pair<C, R>(ctx: &GroupContext<C>, rng: &mut R) -> KeyPair<C>
where
    C: SWCurveConfig,
    R: RngCore + CryptoRng,
{
    KeyPair::from_private_key(ctx, ctx.random_nonzero_scalar(rng))
}

/// Two calls with the same inputs give different keys: the nonce is drawn fresh each time.
pub fn derive_candidate_key<C, R>(
    ctx: &GroupContext<C>,
    private_key: &Scalar<C>,
    candidate_id: u64,
    rng: &mut R,
) -> DerivedKey<C>
where
    C: SWCurveConfig,
    R: RngCore + CryptoRng,
{
    let r = ctx.random_scalar(rng);
    let x: Scalar<C> = Transcript::new()
        .append_scalar(private_key)
        .append_u64(candidate_id)
        .append_scalar(&r)
        .challenge();
    DerivedKey {
        x,
        y: ctx.mul_generator(&x),
    }
}

/// Candidate ids are 1-based. Peers other than `my_index` get placeholder keys.
#[tracing::instrument(skip_all, fields(num_candidates = num_candidates, num_voters = num_voters, my_index = my_index))]
pub fn voter_keys<C, R>(
    ctx: &GroupContext<C>,
    key_pair: &KeyPair<C>,
    num_candidates: usize,
    num_voters: usize,
    my_index: usize,
    rng: &mut R,
) -> Result<VoterKeys<C>, ScoreVotingError>
where
    C: SWCurveConfig,
    R: RngCore + CryptoRng,
{
    if my_index >= num_voters {
        return Err(ScoreVotingError::IndexOutOfRange {
            index: my_index,
            len: num_voters,
        });
    }

    let (xs, ys): (Vec<_>, Vec<_>) = (1..=num_candidates as u64)
        .map(|id| {
            let DerivedKey { x, y } = derive_candidate_key(ctx, &key_pair.private_key, id, rng);
            (x, y)
        })
        .unzip();

    let mut rand_keys = Vec::with_capacity(num_voters);
    let mut rand_vote_keys = Vec::with_capacity(num_voters);
    for i in 0..num_voters {
        if i == my_index {
            rand_keys.push(key_pair.public_key);
            rand_vote_keys.push(ys.clone());
        } else {
            rand_keys.push(generate_key_pair(ctx, rng).public_key);
            rand_vote_keys.push(
                (1..=num_candidates as u64)
                    .map(|id| derive_candidate_key(ctx, &key_pair.private_key, id, rng).y)
                    .collect(),
            );
        }
    }
    tracing::debug!(target: LOG_TARGET, "derived registration keys");

    Ok(VoterKeys {
        xs,
        ys,
        rand_keys,
        rand_vote_keys,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::group::scalar_to_biguint;
    use crate::crypto::toy_curve::ToyConfig;
    use ark_ff::Zero;
    use ark_secp256k1::Config as Secp256k1;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn generated_key_pairs_are_valid() {
        let ctx = GroupContext::<Secp256k1>::new().unwrap();
        let mut rng = ChaCha20Rng::from_seed([1u8; 32]);
        let n = ctx.order();
        for _ in 0..8 {
            let kp = generate_key_pair(&ctx, &mut rng);
            assert!(ctx.validate_point(&kp.public_key).is_ok());
            assert!(!kp.private_key.is_zero());
            assert!(scalar_to_biguint(&kp.private_key) < n);
            assert_eq!(kp.public_key, ctx.mul_generator(&kp.private_key));
        }
    }

    #[test]
    fn toy_key_pairs_are_never_zero() {
        let ctx = GroupContext::<ToyConfig>::new().unwrap();
        let mut rng = ChaCha20Rng::from_seed([2u8; 32]);
        for _ in 0..2000 {
            let kp = generate_key_pair(&ctx, &mut rng);
            assert!(ctx.validate_point(&kp.public_key).is_ok());
        }
    }

    #[test]
    fn derived_keys_are_valid_and_fresh() {
        let ctx = GroupContext::<Secp256k1>::new().unwrap();
        let mut rng = ChaCha20Rng::from_seed([3u8; 32]);
        let kp = generate_key_pair(&ctx, &mut rng);
        let first = derive_candidate_key(&ctx, &kp.private_key, 123, &mut rng);
        let second = derive_candidate_key(&ctx, &kp.private_key, 123, &mut rng);
        assert_eq!(first.y, ctx.mul_generator(&first.x));
        assert!(ctx.validate_point(&first.y).is_ok());
        assert_ne!(first.x, second.x);
    }

    #[test]
    fn derivation_replays_with_the_same_nonce_stream() {
        let ctx = GroupContext::<Secp256k1>::new().unwrap();
        let kp = generate_key_pair(&ctx, &mut ChaCha20Rng::from_seed([4u8; 32]));
        let a = derive_candidate_key(&ctx, &kp.private_key, 2, &mut ChaCha20Rng::from_seed([5u8; 32]));
        let b = derive_candidate_key(&ctx, &kp.private_key, 2, &mut ChaCha20Rng::from_seed([5u8; 32]));
        let c = derive_candidate_key(&ctx, &kp.private_key, 3, &mut ChaCha20Rng::from_seed([5u8; 32]));
        assert_eq!(a.x, b.x);
        assert_eq!(a.y, b.y);
        assert_ne!(a.x, c.x);
    }

    #[test]
    fn voter_keys_place_own_material_at_my_index() {
        let ctx = GroupContext::<Secp256k1>::new().unwrap();
        let mut rng = ChaCha20Rng::from_seed([6u8; 32]);
        let kp = generate_key_pair(&ctx, &mut rng);
        let keys = voter_keys(&ctx, &kp, 3, 4, 1, &mut rng).unwrap();

        assert_eq!(keys.xs.len(), 3);
        assert_eq!(keys.ys.len(), 3);
        for (x, y) in keys.xs.iter().zip(&keys.ys) {
            assert_eq!(*y, ctx.mul_generator(x));
        }
        assert_eq!(keys.rand_keys.len(), 4);
        assert_eq!(keys.rand_keys[1], kp.public_key);
        assert_ne!(keys.rand_keys[0], kp.public_key);
        assert_eq!(keys.rand_vote_keys[1], keys.ys);
        assert!(keys.rand_vote_keys.iter().all(|ks| ks.len() == 3));
    }

    #[test]
    fn voter_keys_reject_bad_index() {
        let ctx = GroupContext::<ToyConfig>::new().unwrap();
        let mut rng = ChaCha20Rng::from_seed([7u8; 32]);
        let kp = generate_key_pair(&ctx, &mut rng);
        assert_eq!(
            voter_keys(&ctx, &kp, 2, 3, 3, &mut rng).unwrap_err(),
            ScoreVotingError::IndexOutOfRange { index: 3, len: 3 }
        );
    }
}
