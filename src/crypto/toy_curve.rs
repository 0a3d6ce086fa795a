//! A deliberately tiny prime-order curve, y^2 = x^3 + 7 over F_1051, with 1093 points.
//!
//! Every group element and scalar fits in a few digits, which keeps worked examples and unit
//! fixtures checkable by hand. It offers no security whatsoever.

use ark_ec::short_weierstrass::{Affine, SWCurveConfig};
use ark_ec::CurveConfig;
use ark_ff::fields::{Fp64, MontBackend, MontConfig};
use ark_ff::MontFp;

#[derive(MontConfig)]
#[modulus = "1051"]
#[generator = "7"]
pub struct ToyFqConfig;
pub type ToyFq = Fp64<MontBackend<ToyFqConfig, 1>>;

#[derive(MontConfig)]
#[modulus = "1093"]
#[generator = "5"]
pub struct ToyFrConfig;
pub type ToyFr = Fp64<MontBackend<ToyFrConfig, 1>>;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ToyConfig;

impl CurveConfig for ToyConfig {
    type BaseField = ToyFq;
    type ScalarField = ToyFr;

    const COFACTOR: &'static [u64] = &[1];
    const COFACTOR_INV: ToyFr = MontFp!("1");
}

impl SWCurveConfig for ToyConfig {
    const COEFF_A: ToyFq = MontFp!("0");
    const COEFF_B: ToyFq = MontFp!("7");
    const GENERATOR: Affine<Self> = Affine::new_unchecked(MontFp!("3"), MontFp!("385"));
}

pub type ToyAffine = Affine<ToyConfig>;

/// The same curve with no derived traits, so generic code cannot lean on `C: Clone` and friends.
#[cfg(test)]
pub struct BareToyConfig;

#[cfg(test)]
impl CurveConfig for BareToyConfig {
    type BaseField = ToyFq;
    type ScalarField = ToyFr;

    const COFACTOR: &'static [u64] = &[1];
    const COFACTOR_INV: ToyFr = MontFp!("1");
}

#[cfg(test)]
impl SWCurveConfig for BareToyConfig {
    const COEFF_A: ToyFq = MontFp!("0");
    const COEFF_B: ToyFq = MontFp!("7");
    const GENERATOR: Affine<Self> = Affine::new_unchecked(MontFp!("3"), MontFp!("385"));
}
