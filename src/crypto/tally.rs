//! Self-tallying a finished round.
//!
//! Blindings do not cancel by themselves: voter `i` blinds with `W_i^{s_i}` where `W_i` is the sum
//! of everyone else's keys. Regrouping the double sum gives
//! `Σ_i W_i^{s_i} = Σ_j (Σ_{i≠j} xi_i)^{x_j}`, so each voter `j` contributes the term
//! `(Σ_{i≠j} xi_i)^{x_j}` per candidate.
//!
//! Published bare, that term leaks: voter `k` knows `xi_k^{x_j} = Y_j^{s_k}`, strips it, and adds
//! its own `xi_i^{x_k}` to rebuild `W_i^{s_i}` for any `i` in a three-voter round. Each term is
//! therefore masked with the voter's per-candidate tally key `T_{j,c} = g^{t_{j,c}}`, registered
//! before the round:
//!
//! `D_{j,c} = (Σ_{i≠j} xi_{i,c})^{x_j} * B_{j,c}^{t_{j,c}}`, with
//! `B_{j,c} = Σ_{i<j} T_{i,c} - Σ_{i>j} T_{i,c}`.
//!
//! `Σ_j t_{j,c} B_{j,c} = Σ_{i<j} (t_i t_j - t_j t_i) = 0`, so `Σ nu - Σ D = g^{total}`. Removing a
//! mask from one share needs `g^{t_i t_j}` for an honest pair, so a coalition of all voters but two
//! learns only the sum of those two ballots, which the totals give away anyway. Masks are
//! independent per candidate; reusing one across candidates would leak score differences.

use ark_ec::short_weierstrass::{Projective, SWCurveConfig};
use ark_ec::{AffineRepr, CurveGroup};
use rand_core::{CryptoRng, RngCore};

use crate::config::ScoreRange;
use crate::crypto::group::{sum_points, GroupContext, Point, Scalar};
use crate::crypto::keys::KeyPair;
use crate::crypto::nizk_decryption_share::{
    prove_nizk_decryption_share, verify_nizk_decryption_share, ZkInstanceDecryptionShare, ZkProofDecryptionShare,
    ZkWitnessDecryptionShare,
};
use crate::crypto::vote::{verify_commit_args, CommitArgs};
use crate::error::ScoreVotingError;

const LOG_TARGET: &str = "score_voting::crypto::tally";

#[derive(Debug, PartialEq, Eq)]
pub struct CandidateShare<C: SWCurveConfig> {
    pub share: Point<C>,
    pub proof: ZkProofDecryptionShare<C>,
}

impl<C: SWCurveConfig> Clone for CandidateShare<C> {
    fn clone(&self) -> Self {
        CandidateShare {
            share: self.share,
            proof: self.proof.clone(),
        }
    }
}

/// Voter `voter_index`'s shares, one per candidate.
#[derive(Debug, PartialEq, Eq)]
pub struct DecryptionShare<C: SWCurveConfig> {
    pub voter_index: usize,
    pub candidates: Vec<CandidateShare<C>>,
}

impl<C: SWCurveConfig> Clone for DecryptionShare<C> {
    fn clone(&self) -> Self {
        DecryptionShare {
            voter_index: self.voter_index,
            candidates: self.candidates.clone(),
        }
    }
}

fn num_candidates<C: SWCurveConfig>(ballots: &[CommitArgs<C>]) -> Result<usize, ScoreVotingError> {
    let first = ballots
        .first()
        .ok_or_else(|| ScoreVotingError::ArgumentMismatch(String::from("no ballots")))?;
    let num_candidates = first.num_candidates();
    if ballots.iter().any(|b| b.num_candidates() != num_candidates) {
        return Err(ScoreVotingError::ArgumentMismatch(String::from(
            "ballots disagree on the number of candidates",
        )));
    }
    Ok(num_candidates)
}

/// `tally_keys[i][c]` is voter `i`'s key for candidate `c`.
fn check_tally_keys<C: SWCurveConfig>(
    tally_keys: &[Vec<Point<C>>],
    num_voters: usize,
    num_candidates: usize,
) -> Result<(), ScoreVotingError> {
    if tally_keys.len() != num_voters || tally_keys.iter().any(|keys| keys.len() != num_candidates) {
        return Err(ScoreVotingError::ArgumentMismatch(format!(
            "expected {} tally keys for each of {} voters",
            num_candidates, num_voters
        )));
    }
    Ok(())
}

/// `Σ_{i≠voter_index} xi_i` for one candidate.
pub fn share_base<C: SWCurveConfig>(ballots: &[CommitArgs<C>], voter_index: usize, candidate: usize) -> Point<C> {
    sum_points(
        ballots
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != voter_index)
            .filter_map(|(_, b)| b.xis.get(candidate)),
    )
    .into_affine()
}

/// `Σ_{i<voter_index} T_i - Σ_{i>voter_index} T_i` for one candidate.
pub fn mask_base<C: SWCurveConfig>(tally_keys: &[Vec<Point<C>>], voter_index: usize, candidate: usize) -> Point<C> {
    let before = sum_points(tally_keys.iter().take(voter_index).filter_map(|keys| keys.get(candidate)));
    let after = sum_points(tally_keys.iter().skip(voter_index + 1).filter_map(|keys| keys.get(candidate)));
    (before - after).into_affine()
}

/// Voter `voter_index`'s masked shares. `tally_secrets[c]` opens `tally_keys[voter_index][c]`.
#[tracing::instrument(skip_all, fields(voter_index = voter_index))]
pub fn decryption_share<C, R>(
    ctx: &GroupContext<C>,
    key_pair: &KeyPair<C>,
    tally_secrets: &[Scalar<C>],
    voter_index: usize,
    ballots: &[CommitArgs<C>],
    tally_keys: &[Vec<Point<C>>],
    rng: &mut R,
) -> Result<DecryptionShare<C>, ScoreVotingError>
where
    C: SWCurveConfig,
    R: RngCore + CryptoRng,
{
    if voter_index >= ballots.len() {
        return Err(ScoreVotingError::IndexOutOfRange {
            index: voter_index,
            len: ballots.len(),
        });
    }
    let num_candidates = num_candidates(ballots)?;
    check_tally_keys(tally_keys, ballots.len(), num_candidates)?;
    if tally_secrets.len() != num_candidates {
        return Err(ScoreVotingError::ArgumentMismatch(format!(
            "expected {} tally secrets, got {}",
            num_candidates,
            tally_secrets.len()
        )));
    }

    let candidates = tally_secrets
        .iter()
        .enumerate()
        .map(|(candidate, tally_secret)| -> Result<CandidateShare<C>, ScoreVotingError> {
            let base = share_base(ballots, voter_index, candidate);
            let mask = mask_base(tally_keys, voter_index, candidate);
            let instance = ZkInstanceDecryptionShare {
                public_key: key_pair.public_key,
                tally_key: tally_keys[voter_index][candidate],
                base,
                mask_base: mask,
                share: (base * key_pair.private_key + mask * *tally_secret).into_affine(),
            };
            let witness = ZkWitnessDecryptionShare {
                private_key: key_pair.private_key,
                tally_secret: *tally_secret,
            };
            let proof = prove_nizk_decryption_share(ctx, &instance, &witness, rng)?;
            Ok(CandidateShare {
                share: instance.share,
                proof,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(target: LOG_TARGET, "built decryption shares");

    Ok(DecryptionShare {
        voter_index,
        candidates,
    })
}

pub fn verify_decryption_share<C: SWCurveConfig>(
    ctx: &GroupContext<C>,
    public_keys: &[Point<C>],
    tally_keys: &[Vec<Point<C>>],
    ballots: &[CommitArgs<C>],
    share: &DecryptionShare<C>,
) -> Result<(), ScoreVotingError> {
    let public_key = *public_keys.get(share.voter_index).ok_or(ScoreVotingError::IndexOutOfRange {
        index: share.voter_index,
        len: public_keys.len(),
    })?;
    let num_candidates = num_candidates(ballots)?;
    check_tally_keys(tally_keys, public_keys.len(), num_candidates)?;
    if share.candidates.len() != num_candidates {
        return Err(ScoreVotingError::ArgumentMismatch(format!(
            "voter {} sent {} shares",
            share.voter_index,
            share.candidates.len()
        )));
    }
    for (candidate, cs) in share.candidates.iter().enumerate() {
        let instance = ZkInstanceDecryptionShare {
            public_key,
            tally_key: tally_keys[share.voter_index][candidate],
            base: share_base(ballots, share.voter_index, candidate),
            mask_base: mask_base(tally_keys, share.voter_index, candidate),
            share: cs.share,
        };
        verify_nizk_decryption_share(ctx, &instance, &cs.proof).inspect_err(|_| {
            tracing::debug!(target: LOG_TARGET, voter = share.voter_index, candidate, "invalid decryption share");
        })?;
    }
    Ok(())
}

/// `Σ_i nu_i - Σ_j D_j` for one candidate, i.e. `g^{total}`.
pub fn unblind<C: SWCurveConfig>(ballots: &[CommitArgs<C>], shares: &[DecryptionShare<C>], candidate: usize) -> Point<C> {
    let nus = sum_points(ballots.iter().filter_map(|b| b.nus.get(candidate)));
    let blinding = sum_points(
        shares
            .iter()
            .filter_map(|s| s.candidates.get(candidate))
            .map(|cs| &cs.share),
    );
    (nus - blinding).into_affine()
}

/// Finds `t` in `[min_total, max_total]` with `g^t == target` by walking the range.
pub fn recover_score_total<C: SWCurveConfig>(
    ctx: &GroupContext<C>,
    target: &Point<C>,
    min_total: i64,
    max_total: i64,
) -> Result<i64, ScoreVotingError> {
    let g = ctx.generator();
    let mut acc: Projective<C> = ctx.mul_generator(&ctx.encode_score(min_total)).into_group();
    for total in min_total..=max_total {
        if acc == *target {
            return Ok(total);
        }
        acc += g;
    }
    Err(ScoreVotingError::TallyOutOfBounds {
        min: min_total,
        max: max_total,
    })
}

/// Per-candidate score totals.
///
/// `ballots[i]`, `public_keys[i]` and `tally_keys[i]` belong to voter `i`; every voter must
/// contribute exactly one share set. Ballots and shares are verified before anything is summed.
#[tracing::instrument(skip_all, fields(num_voters = ballots.len()))]
pub fn tally_scores<C: SWCurveConfig>(
    ctx: &GroupContext<C>,
    public_keys: &[Point<C>],
    tally_keys: &[Vec<Point<C>>],
    ballots: &[CommitArgs<C>],
    shares: &[DecryptionShare<C>],
    range: ScoreRange,
) -> Result<Vec<i64>, ScoreVotingError> {
    if ballots.len() != public_keys.len() || shares.len() != public_keys.len() {
        return Err(ScoreVotingError::ArgumentMismatch(format!(
            "{} voters, {} ballots, {} share sets",
            public_keys.len(),
            ballots.len(),
            shares.len()
        )));
    }
    let mut seen = vec![false; public_keys.len()];
    for share in shares {
        match seen.get_mut(share.voter_index) {
            Some(slot) if !*slot => *slot = true,
            _ => {
                return Err(ScoreVotingError::ArgumentMismatch(format!(
                    "unexpected share set from voter {}",
                    share.voter_index
                )))
            }
        }
    }

    for (i, ballot) in ballots.iter().enumerate() {
        verify_commit_args(ctx, public_keys, i, ballot, range)?;
    }
    for share in shares {
        verify_decryption_share(ctx, public_keys, tally_keys, ballots, share)?;
    }

    let voters = ballots.len() as i64;
    let min_total = range.min_score.saturating_mul(voters);
    let max_total = range.max_score.saturating_mul(voters);
    let totals = (0..num_candidates(ballots)?)
        .map(|candidate| recover_score_total(ctx, &unblind(ballots, shares, candidate), min_total, max_total))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(target: LOG_TARGET, ?totals, "tallied");
    Ok(totals)
}
