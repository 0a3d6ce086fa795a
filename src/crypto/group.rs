//! Group context shared by every voting primitive.
//!
//! The curve is fixed at compile time through an arkworks short Weierstrass config; the context
//! only checks the generator once and then hands out the generator, the identity, fresh scalars
//! and point validation. It never changes after construction.

use std::fmt;

use ark_ec::short_weierstrass::{Affine, Projective, SWCurveConfig};
use ark_ec::{CurveConfig, CurveGroup};
use ark_ff::{Field, One, PrimeField, Zero};
use num_bigint::BigUint;
use rand_core::{CryptoRng, RngCore};

use crate::error::ScoreVotingError;

pub type Point<C> = Affine<C>;
pub type Scalar<C> = <C as CurveConfig>::ScalarField;

pub struct GroupContext<C: SWCurveConfig> {
    g: Affine<C>,
}

impl<C: SWCurveConfig> Clone for GroupContext<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: SWCurveConfig> Copy for GroupContext<C> {}

impl<C: SWCurveConfig> fmt::Debug for GroupContext<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupContext").field("g", &self.g).finish()
    }
}

impl<C: SWCurveConfig> GroupContext<C> {
    pub fn new() -> Result<Self, ScoreVotingError> {
        let g = C::GENERATOR;
        if C::BaseField::extension_degree() != 1
            || g.infinity
            || !g.is_on_curve()
            || !g.is_in_correct_subgroup_assuming_on_curve()
        {
            return Err(ScoreVotingError::GroupUninitialized);
        }
        Ok(Self { g })
    }

    pub fn generator(&self) -> Point<C> {
        self.g
    }

    pub fn identity(&self) -> Point<C> {
        Affine::identity()
    }

    /// The group order `n`.
    pub fn order(&self) -> BigUint {
        let largest: BigUint = (-Scalar::<C>::one()).into();
        largest + 1u32
    }

    /// Draws `bitLength(n)` random bits and reduces them mod `n`.
    ///
    /// The reduction is not uniform when `n` is not a power of two.
    pub fn random_scalar<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Scalar<C> {
        let bits = Scalar::<C>::MODULUS_BIT_SIZE as usize;
        let mut buf = vec![0u8; bits.div_ceil(8)];
        rng.fill_bytes(&mut buf);
        let excess = buf.len() * 8 - bits;
        buf[0] &= 0xff >> excess;
        Scalar::<C>::from_be_bytes_mod_order(&buf)
    }

    pub fn random_nonzero_scalar<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Scalar<C> {
        loop {
            let k = self.random_scalar(rng);
            if !k.is_zero() {
                return k;
            }
        }
    }

    /// Maps a signed integer into `[0, n)`. Negative inputs come back as `value + n`.
    pub fn normalize_to_positive(&self, value: i128) -> Scalar<C> {
        let magnitude = Scalar::<C>::from(value.unsigned_abs());
        if value < 0 {
            -magnitude
        } else {
            magnitude
        }
    }

    pub fn encode_score(&self, score: i64) -> Scalar<C> {
        self.normalize_to_positive(i128::from(score))
    }

    pub fn mul_generator(&self, k: &Scalar<C>) -> Point<C> {
        (self.g * *k).into_affine()
    }

    /// Accepts on-curve, correct-subgroup, non-identity points.
    pub fn validate_point(&self, point: &Point<C>) -> Result<(), ScoreVotingError> {
        if point.infinity {
            return Err(ScoreVotingError::InvalidPoint(String::from("identity element")));
        }
        self.check_on_curve(point)
    }

    /// Like [`Self::validate_point`] but lets the identity through.
    pub fn check_on_curve(&self, point: &Point<C>) -> Result<(), ScoreVotingError> {
        if point.infinity {
            return Ok(());
        }
        if !point.is_on_curve() {
            return Err(ScoreVotingError::InvalidPoint(String::from("point is not on the curve")));
        }
        if !point.is_in_correct_subgroup_assuming_on_curve() {
            return Err(ScoreVotingError::InvalidPoint(String::from("point is not in the prime-order subgroup")));
        }
        Ok(())
    }

    /// Rebuilds a point from affine coordinates; `(0, 0)` is the identity.
    pub fn point_from_coordinates(&self, x: &BigUint, y: &BigUint) -> Result<Point<C>, ScoreVotingError> {
        if x.is_zero() && y.is_zero() {
            return Ok(self.identity());
        }
        let x = biguint_to_field::<C::BaseField>(x)
            .ok_or_else(|| ScoreVotingError::EncodingError(String::from("x coordinate is not reduced")))?;
        let y = biguint_to_field::<C::BaseField>(y)
            .ok_or_else(|| ScoreVotingError::EncodingError(String::from("y coordinate is not reduced")))?;
        let point = Affine::new_unchecked(x, y);
        self.check_on_curve(&point)?;
        Ok(point)
    }
}

pub fn sum_points<'a, C, I>(points: I) -> Projective<C>
where
    C: SWCurveConfig,
    I: IntoIterator<Item = &'a Point<C>>,
{
    points
        .into_iter()
        .fold(Projective::<C>::zero(), |acc, p| acc + p)
}

/// Affine coordinates as integers, `(0, 0)` for the identity.
pub fn coordinates<C: SWCurveConfig>(point: &Point<C>) -> (BigUint, BigUint) {
    if point.infinity {
        return (BigUint::default(), BigUint::default());
    }
    (field_to_biguint(&point.x), field_to_biguint(&point.y))
}

pub fn scalar_to_biguint<F: PrimeField>(scalar: &F) -> BigUint {
    (*scalar).into()
}

/// Rejects values that are not already reduced mod `n`.
pub fn biguint_to_scalar<F: PrimeField>(value: &BigUint) -> Option<F> {
    let scalar = F::from(value.clone());
    (scalar_to_biguint(&scalar) == *value).then_some(scalar)
}

fn field_to_biguint<F: Field>(element: &F) -> BigUint {
    // prime base fields yield exactly one element
    element
        .to_base_prime_field_elements()
        .map(Into::<BigUint>::into)
        .sum()
}

fn biguint_to_field<F: Field>(value: &BigUint) -> Option<F> {
    biguint_to_scalar::<F::BasePrimeField>(value).map(F::from_base_prime_field)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::toy_curve::{ToyConfig, ToyFr};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    fn ctx() -> GroupContext<ToyConfig> {
        GroupContext::new().unwrap()
    }

    #[test]
    fn toy_group_parameters() {
        let ctx = ctx();
        assert_eq!(ctx.order(), BigUint::from(1093u32));
        assert_eq!(coordinates(&ctx.generator()), (BigUint::from(3u32), BigUint::from(385u32)));
        assert_eq!(ctx.mul_generator(&-ToyFr::from(1u64)), -ctx.generator());
    }

    #[test]
    fn secp256k1_order() {
        let ctx = GroupContext::<ark_secp256k1::Config>::new().unwrap();
        let n = BigUint::parse_bytes(
            b"FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141",
            16,
        )
        .unwrap();
        assert_eq!(ctx.order(), n);
    }

    #[test]
    fn random_scalars_stay_below_order() {
        let ctx = ctx();
        let mut rng = ChaCha20Rng::from_seed([7u8; 32]);
        let n = ctx.order();
        let mut seen_nonzero = false;
        for _ in 0..500 {
            let k = ctx.random_scalar(&mut rng);
            assert!(scalar_to_biguint(&k) < n);
            seen_nonzero |= !k.is_zero();
        }
        assert!(seen_nonzero);
    }

    #[test]
    fn normalize_to_positive_is_idempotent_and_wraps_negatives() {
        let ctx = ctx();
        assert_eq!(ctx.normalize_to_positive(-3), ToyFr::from(1090u64));
        assert_eq!(ctx.normalize_to_positive(5), ToyFr::from(5u64));
        assert_eq!(ctx.normalize_to_positive(0), ToyFr::zero());
        assert_eq!(ctx.normalize_to_positive(1093), ToyFr::zero());
        let once = scalar_to_biguint(&ctx.normalize_to_positive(-1));
        assert_eq!(once, BigUint::from(1092u32));
        let twice = ctx.normalize_to_positive(1092);
        assert_eq!(scalar_to_biguint(&twice), once);
    }

    #[test]
    fn validate_point_rejects_identity_and_off_curve() {
        let ctx = ctx();
        assert!(ctx.validate_point(&ctx.generator()).is_ok());
        assert!(matches!(ctx.validate_point(&ctx.identity()), Err(ScoreVotingError::InvalidPoint(_))));
        assert!(ctx.check_on_curve(&ctx.identity()).is_ok());
        let off_curve = ctx.point_from_coordinates(&BigUint::from(3u32), &BigUint::from(386u32));
        assert!(matches!(off_curve, Err(ScoreVotingError::InvalidPoint(_))));
    }

    #[test]
    fn point_coordinates_round_trip() {
        let ctx = ctx();
        let p = ctx.mul_generator(&ToyFr::from(11u64));
        let (x, y) = coordinates(&p);
        assert_eq!((x.clone(), y.clone()), (BigUint::from(753u32), BigUint::from(704u32)));
        assert_eq!(ctx.point_from_coordinates(&x, &y).unwrap(), p);
        let (zx, zy) = coordinates(&ctx.identity());
        assert!(ctx.point_from_coordinates(&zx, &zy).unwrap().infinity);
        let unreduced = ctx.point_from_coordinates(&BigUint::from(1054u32), &y);
        assert!(matches!(unreduced, Err(ScoreVotingError::EncodingError(_))));
    }

    #[test]
    fn sums_points_in_projective_form() {
        let ctx = ctx();
        let points: Vec<_> = [1u64, 2, 3]
            .iter()
            .map(|k| ctx.mul_generator(&ToyFr::from(*k)))
            .collect();
        assert_eq!(sum_points(&points).into_affine(), ctx.mul_generator(&ToyFr::from(6u64)));
        assert!(sum_points::<ToyConfig, _>(&[]).into_affine().infinity);
    }
}
