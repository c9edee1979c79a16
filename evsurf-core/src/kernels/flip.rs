// Deterministic flip kernels: LR (left-right), UD (up-down), and polarity.
//
// All kernels take an (N, C) record array plus its ordering, rewrite the one
// column they own and copy every other column through unchanged. Row order is
// preserved.
//
// Coordinates policy:
// - x/y are truncated toward zero before flipping.
// - An event outside [0, W) / [0, H) rejects the whole call with OutOfBounds.
//
// Polarity policy:
// - Encoding is decided once per call:
//     • any p == 0 → {0, 1} encoding, p' = 1 - p for p ∈ {0, 1}, others kept;
//     • otherwise  → signed encoding, p' = -p.
use ndarray::{Array2, ArrayView2};
use tracing::debug;

use crate::error::Result;
use crate::events::{resolve_pixels, Field, Ordering, SensorSize};

/// Polarity encoding detected from a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PolarityEncoding {
    ZeroOne,
    Signed,
}

impl PolarityEncoding {
    pub(crate) fn detect<'a>(mut polarities: impl Iterator<Item = &'a f64>) -> Self {
        if polarities.any(|&p| p == 0.0) {
            PolarityEncoding::ZeroOne
        } else {
            PolarityEncoding::Signed
        }
    }

    #[inline]
    pub(crate) fn flip(self, p: f64) -> f64 {
        match self {
            PolarityEncoding::ZeroOne if p == 0.0 => 1.0,
            PolarityEncoding::ZeroOne if p == 1.0 => 0.0,
            PolarityEncoding::ZeroOne => p,
            PolarityEncoding::Signed => -p,
        }
    }
}

fn mirror_column(
    events: ArrayView2<'_, f64>,
    ordering: &Ordering,
    field: Field,
    extent: usize,
) -> Result<Array2<f64>> {
    ordering.check_columns(&events)?;
    let col = ordering.require(field)?;
    let pixels = resolve_pixels(&events, col, field, extent)?;

    let mut out = events.to_owned();
    for (value, px) in out.column_mut(col).iter_mut().zip(pixels) {
        *value = (extent - 1 - px) as f64;
    }
    Ok(out)
}

/// Mirror events horizontally: `x' = W - 1 - x`.
pub fn flip_lr(
    events: ArrayView2<'_, f64>,
    sensor: SensorSize,
    ordering: &Ordering,
) -> Result<Array2<f64>> {
    sensor.validate()?;
    debug!(n_events = events.nrows(), width = sensor.width, "flip_lr");
    mirror_column(events, ordering, Field::X, sensor.width)
}

/// Mirror events vertically: `y' = H - 1 - y`. A 1-row sensor is a no-op.
pub fn flip_ud(
    events: ArrayView2<'_, f64>,
    sensor: SensorSize,
    ordering: &Ordering,
) -> Result<Array2<f64>> {
    sensor.validate()?;
    debug!(n_events = events.nrows(), height = sensor.height, "flip_ud");
    mirror_column(events, ordering, Field::Y, sensor.height)
}

/// Invert every event's polarity.
pub fn flip_polarity(events: ArrayView2<'_, f64>, ordering: &Ordering) -> Result<Array2<f64>> {
    ordering.check_columns(&events)?;
    let p_col = ordering.require(Field::P)?;
    let encoding = PolarityEncoding::detect(events.column(p_col).iter());
    debug!(n_events = events.nrows(), ?encoding, "flip_polarity");

    let mut out = events.to_owned();
    out.column_mut(p_col).mapv_inplace(|p| encoding.flip(p));
    Ok(out)
}
