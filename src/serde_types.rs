//! Flat numeric wire format consumed by the on-chain verifier.
//!
//! Scalars are base-10 strings, points are `(x, y)` pairs of base-10 strings with `(0, 0)` for the
//! identity. The word order inside every array is part of the contract.

use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ff::PrimeField;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::crypto::group::{biguint_to_scalar, coordinates, scalar_to_biguint, GroupContext, Point, Scalar};
use crate::crypto::nizk_randomness_sum::AggregateProof;
use crate::crypto::nizk_score_range::{RangeBranch, RangeProofBundle};
use crate::crypto::vote::CommitArgs;
use crate::error::ScoreVotingError;

/// Words in a serialized [`AggregateProof`]: four points and two scalars.
pub const AGGREGATE_PROOF_WORDS: usize = 10;
/// Words per range-proof branch: `a`, `b`, `d`, `e`.
pub const RANGE_BRANCH_WORDS: usize = 6;
/// Words in a range proof outside its branches: `xi`, `nu`, `c`, `X_new_new`, `Y_new`.
pub const RANGE_PROOF_FIXED_WORDS: usize = 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NumberEncoding {
    Decimal,
    /// Big-endian hex, with or without a `0x` prefix.
    Hex,
}

pub fn decode_uint(value: &str, encoding: NumberEncoding) -> Result<BigUint, ScoreVotingError> {
    let malformed = || ScoreVotingError::EncodingError(format!("malformed number: {:?}", value));
    match encoding {
        NumberEncoding::Decimal => {
            if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            BigUint::parse_bytes(value.as_bytes(), 10).ok_or_else(malformed)
        }
        NumberEncoding::Hex => {
            let digits = value.strip_prefix("0x").unwrap_or(value);
            if digits.is_empty() {
                return Err(malformed());
            }
            let padded = if digits.len() % 2 == 1 {
                format!("0{}", digits)
            } else {
                digits.to_string()
            };
            let bytes = hex::decode(padded).map_err(|_| malformed())?;
            Ok(BigUint::from_bytes_be(&bytes))
        }
    }
}

pub fn scalar_to_decimal<F: PrimeField>(scalar: &F) -> String {
    scalar_to_biguint(scalar).to_str_radix(10)
}

/// Fixed-width, 64 hex digits for 256-bit fields.
pub fn scalar_to_hex<F: PrimeField>(scalar: &F) -> String {
    let width = (F::MODULUS_BIT_SIZE as usize).div_ceil(8) * 2;
    format!("{:0>width$}", scalar_to_biguint(scalar).to_str_radix(16), width = width)
}

/// Rejects anything that is not already reduced mod `n`.
pub fn decode_scalar<F: PrimeField>(value: &str, encoding: NumberEncoding) -> Result<F, ScoreVotingError> {
    biguint_to_scalar(&decode_uint(value, encoding)?)
        .ok_or_else(|| ScoreVotingError::EncodingError(format!("scalar is not reduced: {}", value)))
}

pub fn point_to_words<C: SWCurveConfig>(point: &Point<C>) -> [String; 2] {
    let (x, y) = coordinates(point);
    [x.to_str_radix(10), y.to_str_radix(10)]
}

pub fn decode_point<C: SWCurveConfig>(
    ctx: &GroupContext<C>,
    x: &str,
    y: &str,
    encoding: NumberEncoding,
) -> Result<Point<C>, ScoreVotingError> {
    ctx.point_from_coordinates(&decode_uint(x, encoding)?, &decode_uint(y, encoding)?)
}

/// Peer keys as the ledger returns them: `[x0, y0, x1, y1, ...]`. Each must be a non-identity point.
pub fn decode_public_keys<C: SWCurveConfig>(
    ctx: &GroupContext<C>,
    flat: &[String],
    encoding: NumberEncoding,
) -> Result<Vec<Point<C>>, ScoreVotingError> {
    if flat.len() % 2 != 0 {
        return Err(ScoreVotingError::EncodingError(format!(
            "odd number of coordinates: {}",
            flat.len()
        )));
    }
    flat.chunks_exact(2)
        .map(|pair| -> Result<Point<C>, ScoreVotingError> {
            let point = decode_point(ctx, &pair[0], &pair[1], encoding)?;
            ctx.validate_point(&point)?;
            Ok(point)
        })
        .collect()
}

fn points_to_words<C: SWCurveConfig>(points: &[Point<C>]) -> Vec<String> {
    points.iter().flat_map(point_to_words).collect()
}

struct WordReader<'a, C: SWCurveConfig> {
    ctx: &'a GroupContext<C>,
    words: &'a [String],
    pos: usize,
}

impl<'a, C: SWCurveConfig> WordReader<'a, C> {
    fn new(ctx: &'a GroupContext<C>, words: &'a [String]) -> Self {
        WordReader { ctx, words, pos: 0 }
    }

    fn next_word(&mut self) -> Result<&'a str, ScoreVotingError> {
        let word = self
            .words
            .get(self.pos)
            .ok_or_else(|| ScoreVotingError::EncodingError(String::from("unexpected end of words")))?;
        self.pos += 1;
        Ok(word.as_str())
    }

    fn scalar(&mut self) -> Result<Scalar<C>, ScoreVotingError> {
        decode_scalar(self.next_word()?, NumberEncoding::Decimal)
    }

    fn point(&mut self) -> Result<Point<C>, ScoreVotingError> {
        let x = self.next_word()?;
        let y = self.next_word()?;
        decode_point(self.ctx, x, y, NumberEncoding::Decimal)
    }

    fn finish(self) -> Result<(), ScoreVotingError> {
        if self.pos != self.words.len() {
            return Err(ScoreVotingError::EncodingError(format!(
                "{} trailing words",
                self.words.len() - self.pos
            )));
        }
        Ok(())
    }
}

fn decode_points<C: SWCurveConfig>(ctx: &GroupContext<C>, words: &[String]) -> Result<Vec<Point<C>>, ScoreVotingError> {
    if words.len() % 2 != 0 {
        return Err(ScoreVotingError::EncodingError(String::from("odd number of coordinates")));
    }
    let mut reader = WordReader::new(ctx, words);
    let points = (0..words.len() / 2)
        .map(|_| reader.point())
        .collect::<Result<Vec<_>, _>>()?;
    reader.finish()?;
    Ok(points)
}

/// `[xi, nu, c, (a, b, d, e) per branch, X_new_new, Y_new]`, points as two words.
pub fn range_proof_to_words<C: SWCurveConfig>(proof: &RangeProofBundle<C>) -> Vec<String> {
    let mut words = Vec::with_capacity(RANGE_PROOF_FIXED_WORDS + RANGE_BRANCH_WORDS * proof.branches.len());
    words.extend(point_to_words(&proof.xi));
    words.extend(point_to_words(&proof.nu));
    words.push(scalar_to_decimal(&proof.c));
    for branch in &proof.branches {
        words.extend(point_to_words(&branch.a));
        words.extend(point_to_words(&branch.b));
        words.push(scalar_to_decimal(&branch.d));
        words.push(scalar_to_decimal(&branch.e));
    }
    words.push(scalar_to_decimal(&proof.x_new_new));
    words.extend(point_to_words(&proof.y_new));
    words
}

pub fn range_proof_from_words<C: SWCurveConfig>(
    ctx: &GroupContext<C>,
    words: &[String],
) -> Result<RangeProofBundle<C>, ScoreVotingError> {
    let branch_words = words.len().saturating_sub(RANGE_PROOF_FIXED_WORDS);
    if words.len() <= RANGE_PROOF_FIXED_WORDS || branch_words % RANGE_BRANCH_WORDS != 0 {
        return Err(ScoreVotingError::EncodingError(format!(
            "range proof has {} words",
            words.len()
        )));
    }
    let mut reader = WordReader::new(ctx, words);
    let xi = reader.point()?;
    let nu = reader.point()?;
    let c = reader.scalar()?;
    let branches = (0..branch_words / RANGE_BRANCH_WORDS)
        .map(|_| -> Result<RangeBranch<C>, ScoreVotingError> {
            Ok(RangeBranch {
                a: reader.point()?,
                b: reader.point()?,
                d: reader.scalar()?,
                e: reader.scalar()?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let x_new_new = reader.scalar()?;
    let y_new = reader.point()?;
    reader.finish()?;
    Ok(RangeProofBundle {
        xi,
        nu,
        c,
        branches,
        x_new_new,
        y_new,
    })
}

/// `[p_xi, p_xi_new, p_nu, p_nu_new, s_s_new, c]`.
pub fn aggregate_proof_to_words<C: SWCurveConfig>(proof: &AggregateProof<C>) -> Vec<String> {
    let mut words = points_to_words(&[proof.p_xi, proof.p_xi_new, proof.p_nu, proof.p_nu_new]);
    words.push(scalar_to_decimal(&proof.s_s_new));
    words.push(scalar_to_decimal(&proof.c));
    words
}

pub fn aggregate_proof_from_words<C: SWCurveConfig>(
    ctx: &GroupContext<C>,
    words: &[String],
) -> Result<AggregateProof<C>, ScoreVotingError> {
    if words.len() != AGGREGATE_PROOF_WORDS {
        return Err(ScoreVotingError::EncodingError(format!(
            "aggregate proof has {} words",
            words.len()
        )));
    }
    let mut reader = WordReader::new(ctx, words);
    let proof = AggregateProof {
        p_xi: reader.point()?,
        p_xi_new: reader.point()?,
        p_nu: reader.point()?,
        p_nu_new: reader.point()?,
        s_s_new: reader.scalar()?,
        c: reader.scalar()?,
    };
    reader.finish()?;
    Ok(proof)
}

/// JSON shape of [`CommitArgs`] handed to the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitArgsWire {
    pub xis: Vec<String>,
    pub nus: Vec<String>,
    pub proof1: Vec<Vec<String>>,
    pub proof2: Vec<String>,
    #[serde(rename = "W_i")]
    pub w_i: Vec<String>,
}

impl<C: SWCurveConfig> CommitArgs<C> {
    pub fn to_wire(&self) -> CommitArgsWire {
        CommitArgsWire {
            xis: points_to_words(&self.xis),
            nus: points_to_words(&self.nus),
            proof1: self.proof1.iter().map(range_proof_to_words).collect(),
            proof2: aggregate_proof_to_words(&self.proof2),
            w_i: point_to_words(&self.w_i).to_vec(),
        }
    }

    /// Parses and curve-checks every field. Proofs are not verified here.
    pub fn from_wire(ctx: &GroupContext<C>, wire: &CommitArgsWire) -> Result<Self, ScoreVotingError> {
        let xis = decode_points(ctx, &wire.xis)?;
        let nus = decode_points(ctx, &wire.nus)?;
        if xis.len() != nus.len() || xis.len() != wire.proof1.len() {
            return Err(ScoreVotingError::EncodingError(format!(
                "{} xis, {} nus and {} range proofs",
                xis.len(),
                nus.len(),
                wire.proof1.len()
            )));
        }
        let proof1 = wire
            .proof1
            .iter()
            .map(|words| range_proof_from_words(ctx, words))
            .collect::<Result<Vec<_>, _>>()?;
        let proof2 = aggregate_proof_from_words(ctx, &wire.proof2)?;
        let w_i = match decode_points(ctx, &wire.w_i)?.as_slice() {
            [w] => *w,
            _ => {
                return Err(ScoreVotingError::EncodingError(String::from(
                    "W_i must be one coordinate pair",
                )))
            }
        };
        Ok(CommitArgs {
            xis,
            nus,
            proof1,
            proof2,
            w_i,
        })
    }

    pub fn to_json(&self) -> Result<String, ScoreVotingError> {
        serde_json::to_string(&self.to_wire()).map_err(|e| ScoreVotingError::EncodingError(e.to_string()))
    }

    pub fn from_json(ctx: &GroupContext<C>, json: &str) -> Result<Self, ScoreVotingError> {
        let wire: CommitArgsWire =
            serde_json::from_str(json).map_err(|e| ScoreVotingError::EncodingError(e.to_string()))?;
        Self::from_wire(ctx, &wire)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::ScoreRange;
    use crate::crypto::keys::KeyPair;
    use crate::crypto::toy_curve::{ToyConfig, ToyFr};
    use crate::crypto::vote::{build_commit_args, verify_commit_args};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    fn words(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn scalar_encodings() {
        let scalar = ToyFr::from(1000u64);
        assert_eq!(scalar_to_decimal(&scalar), "1000");
        assert_eq!(scalar_to_hex(&scalar), "03e8");
        assert_eq!(decode_scalar::<ToyFr>("1000", NumberEncoding::Decimal).unwrap(), scalar);
        assert_eq!(decode_scalar::<ToyFr>("0x3e8", NumberEncoding::Hex).unwrap(), scalar);

        let secp = ark_secp256k1::Fr::from(255u64);
        assert_eq!(scalar_to_hex(&secp).len(), 64);
        assert!(scalar_to_hex(&secp).ends_with("00ff"));
    }

    #[test]
    fn non_canonical_scalars_are_rejected() {
        for bad in ["1093", "", "-1", "12a", " 5"] {
            assert!(matches!(
                decode_scalar::<ToyFr>(bad, NumberEncoding::Decimal),
                Err(ScoreVotingError::EncodingError(_))
            ));
        }
        assert!(matches!(
            decode_scalar::<ToyFr>("0xzz", NumberEncoding::Hex),
            Err(ScoreVotingError::EncodingError(_))
        ));
    }

    #[test]
    fn public_keys_decode_from_decimal_and_hex() {
        let ctx = GroupContext::<ToyConfig>::new().unwrap();
        let decimal = decode_public_keys(&ctx, &words(&["3", "385", "368", "565"]), NumberEncoding::Decimal).unwrap();
        assert_eq!(decimal, vec![ctx.generator(), ctx.mul_generator(&ToyFr::from(4u64))]);

        let hex = decode_public_keys(&ctx, &words(&["0x3", "0x181", "170", "235"]), NumberEncoding::Hex).unwrap();
        assert_eq!(hex, decimal);
    }

    #[test]
    fn malformed_public_keys_are_rejected() {
        let ctx = GroupContext::<ToyConfig>::new().unwrap();
        assert!(matches!(
            decode_public_keys(&ctx, &words(&["3", "385", "368"]), NumberEncoding::Decimal),
            Err(ScoreVotingError::EncodingError(_))
        ));
        assert!(matches!(
            decode_public_keys(&ctx, &words(&["3", "386"]), NumberEncoding::Decimal),
            Err(ScoreVotingError::InvalidPoint(_))
        ));
        assert!(matches!(
            decode_public_keys(&ctx, &words(&["0", "0"]), NumberEncoding::Decimal),
            Err(ScoreVotingError::InvalidPoint(_))
        ));
    }

    #[test]
    fn commit_args_survive_json() {
        let ctx = GroupContext::<ToyConfig>::new().unwrap();
        let mut rng = ChaCha20Rng::from_seed([71u8; 32]);
        let key_pairs: Vec<_> = [10u64, 20, 30]
            .iter()
            .map(|x| KeyPair::from_private_key(&ctx, ToyFr::from(*x)))
            .collect();
        let peers: Vec<_> = key_pairs.iter().map(|kp| kp.public_key).collect();
        let range = ScoreRange::default();
        let args = build_commit_args(&ctx, &key_pairs[1].private_key, &[2, 3], &peers, 1, 2, range, &mut rng).unwrap();

        let wire = args.to_wire();
        assert_eq!(wire.xis.len(), 4);
        assert!(wire.proof1.iter().all(|p| p.len() == RANGE_PROOF_FIXED_WORDS + 6 * RANGE_BRANCH_WORDS));
        assert_eq!(wire.proof2.len(), AGGREGATE_PROOF_WORDS);
        assert_eq!(wire.w_i, point_to_words(&ctx.mul_generator(&ToyFr::from(40u64))).to_vec());

        let json = args.to_json().unwrap();
        assert!(json.contains("\"W_i\""));
        let decoded = CommitArgs::from_json(&ctx, &json).unwrap();
        assert_eq!(decoded, args);
        assert_eq!(Ok(()), verify_commit_args(&ctx, &peers, 1, &decoded, range));
    }

    #[test]
    fn truncated_wire_is_rejected() {
        let ctx = GroupContext::<ToyConfig>::new().unwrap();
        let mut rng = ChaCha20Rng::from_seed([72u8; 32]);
        let key_pairs: Vec<_> = [10u64, 20]
            .iter()
            .map(|x| KeyPair::from_private_key(&ctx, ToyFr::from(*x)))
            .collect();
        let peers: Vec<_> = key_pairs.iter().map(|kp| kp.public_key).collect();
        let range = ScoreRange::new(0, 1).unwrap();
        let args = build_commit_args(&ctx, &key_pairs[0].private_key, &[1], &peers, 0, 1, range, &mut rng).unwrap();
        let wire = args.to_wire();

        let mut short = wire.clone();
        short.proof1[0].pop();
        assert!(matches!(CommitArgs::from_wire(&ctx, &short), Err(ScoreVotingError::EncodingError(_))));

        let mut short = wire.clone();
        short.proof2.pop();
        assert!(matches!(CommitArgs::from_wire(&ctx, &short), Err(ScoreVotingError::EncodingError(_))));

        let mut missing = wire.clone();
        missing.proof1.clear();
        assert!(matches!(CommitArgs::from_wire(&ctx, &missing), Err(ScoreVotingError::EncodingError(_))));

        let mut unreduced = wire;
        unreduced.proof2[8] = String::from("1093");
        assert!(matches!(CommitArgs::from_wire(&ctx, &unreduced), Err(ScoreVotingError::EncodingError(_))));
    }
}
