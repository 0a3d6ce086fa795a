use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ff::PrimeField;
use num_bigint::BigUint;
use sha3::{Digest, Keccak256};

use crate::crypto::group::{coordinates, scalar_to_biguint, Point};

/// Every transcript entry is a big-endian 32-byte word, the layout of an ABI-encoded `uint256[]`,
/// so an on-chain verifier can rebuild challenges with `keccak256(abi.encode(words))`.
pub const WORD_BYTES: usize = 32;

/// Fiat-Shamir transcript: a fixed-order run of words hashed with Keccak-256.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    words: Vec<u8>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_uint(&mut self, value: &BigUint) -> &mut Self {
        let bytes = value.to_bytes_be();
        let width = bytes.len().div_ceil(WORD_BYTES).max(1) * WORD_BYTES;
        self.words.resize(self.words.len() + width - bytes.len(), 0);
        self.words.extend_from_slice(&bytes);
        self
    }

    /// One word, `keccak256(domain)`, so a label never shifts the word layout that follows.
    pub fn append_domain(&mut self, domain: &str) -> &mut Self {
        self.words.extend_from_slice(&Keccak256::digest(domain.as_bytes()));
        self
    }

    pub fn append_u64(&mut self, value: u64) -> &mut Self {
        self.append_uint(&BigUint::from(value))
    }

    pub fn append_scalar<F: PrimeField>(&mut self, scalar: &F) -> &mut Self {
        self.append_uint(&scalar_to_biguint(scalar))
    }

    /// Two words, x then y.
    pub fn append_point<C: SWCurveConfig>(&mut self, point: &Point<C>) -> &mut Self {
        let (x, y) = coordinates(point);
        self.append_uint(&x).append_uint(&y)
    }

    pub fn word_count(&self) -> usize {
        self.words.len() / WORD_BYTES
    }

    pub fn digest(&self) -> [u8; 32] {
        Keccak256::digest(&self.words).into()
    }

    pub fn challenge<F: PrimeField>(&self) -> F {
        F::from_be_bytes_mod_order(&self.digest())
    }
}
