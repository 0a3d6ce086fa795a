use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ec::CurveGroup;

use crate::crypto::group::{sum_points, GroupContext, Point};
use crate::error::ScoreVotingError;

/// `W_i`: the group sum of every public key except the one at `exclude_index`.
///
/// Keys before the index and keys after it are summed separately and then combined. An empty
/// list or a single key yields the identity. Every supplied key must be a valid group element.
pub fn compute_aggregate_key<C: SWCurveConfig>(
    ctx: &GroupContext<C>,
    public_keys: &[Point<C>],
    exclude_index: usize,
) -> Result<Point<C>, ScoreVotingError> {
    if public_keys.is_empty() {
        return Ok(ctx.identity());
    }
    if exclude_index >= public_keys.len() {
        return Err(ScoreVotingError::IndexOutOfRange {
            index: exclude_index,
            len: public_keys.len(),
        });
    }
    for key in public_keys {
        ctx.validate_point(key)?;
    }

    let (before, rest) = public_keys.split_at(exclude_index);
    let top = sum_points(before);
    let bottom = sum_points(&rest[1..]);
    Ok((top + bottom).into_affine())
}
