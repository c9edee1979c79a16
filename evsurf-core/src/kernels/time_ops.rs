use ndarray::{Array2, ArrayView2, Axis};
use tracing::debug;

use crate::error::Result;
use crate::events::{Field, Ordering};
use crate::kernels::flip::PolarityEncoding;

/// Time reverse: reflect timestamps over max(t), invert polarity, and reverse
/// row order.
///
/// - Compute t' = max(t) - t for each event
/// - Polarity is inverted with the same encoding rules as `flip_polarity`
///   (an OFF event played backwards is an ON event)
/// - Output order is reversed relative to input, so a non-decreasing stream
///   stays non-decreasing
/// - Auxiliary columns and x/y are unchanged
/// - Deterministic; empty input -> empty output with the same column count
pub fn time_reverse(events: ArrayView2<'_, f64>, ordering: &Ordering) -> Result<Array2<f64>> {
    ordering.check_columns(&events)?;
    let t_col = ordering.require(Field::T)?;
    let p_col = ordering.require(Field::P)?;

    if events.nrows() == 0 {
        return Ok(events.to_owned());
    }

    let t_max = events
        .column(t_col)
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let encoding = PolarityEncoding::detect(events.column(p_col).iter());
    debug!(n_events = events.nrows(), t_max, ?encoding, "time_reverse");

    let reversed: Vec<usize> = (0..events.nrows()).rev().collect();
    let mut out = events.select(Axis(0), &reversed);
    out.column_mut(t_col).mapv_inplace(|t| t_max - t);
    out.column_mut(p_col).mapv_inplace(|p| encoding.flip(p));
    Ok(out)
}
