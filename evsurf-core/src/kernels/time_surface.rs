use core::str::FromStr;

use ndarray::{s, Array3, Array4, ArrayView2, ArrayView3, ArrayViewMut3, Zip};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{invalid, Result, SurfaceError};
use crate::events::{resolve_pixels, Field, FieldLayout, Ordering, SensorSize};

/// Decay applied to the time elapsed since a pixel last fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Decay {
    /// `max(elapsed / (3 * tau) + 1, 0)`
    #[default]
    Lin,
    /// `exp(elapsed / tau)`, cut to zero below `-3 * tau`
    Exp,
}

impl Decay {
    /// Evaluate the decay at `elapsed` (<= 0 for past events).
    ///
    /// Both models share the `3 * tau` horizon: anything older contributes
    /// exactly zero.
    #[inline]
    pub fn apply(self, elapsed: f64, tau: f64) -> f64 {
        match self {
            Decay::Lin => (elapsed / (3.0 * tau) + 1.0).max(0.0),
            Decay::Exp => {
                if elapsed < -3.0 * tau {
                    0.0
                } else {
                    (elapsed / tau).exp()
                }
            }
        }
    }
}

impl FromStr for Decay {
    type Err = SurfaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lin" => Ok(Decay::Lin),
            "exp" => Ok(Decay::Exp),
            other => Err(SurfaceError::UnknownDecay(other.to_string())),
        }
    }
}

/// Size of the local window extracted around each event. Both sides are
/// expected to be odd so the event sits at the center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurfaceDims {
    pub width: usize,
    pub height: usize,
}

impl SurfaceDims {
    #[inline]
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Padding radius on each axis as `(rx, ry)`.
    #[inline]
    pub fn radius(&self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }
}

/// Parameters of the time-surface kernel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeSurfaceParams {
    /// Local window; `None` uses the whole sensor as the surface.
    pub surface_dimensions: Option<SurfaceDims>,
    /// Decay time constant, in the units of the event timestamps.
    pub tau: f64,
    pub decay: Decay,
    /// Treat every event as belonging to a single polarity channel.
    pub merge_polarities: bool,
}

impl Default for TimeSurfaceParams {
    fn default() -> Self {
        Self {
            surface_dimensions: Some(SurfaceDims::new(7, 7)),
            tau: 5e3,
            decay: Decay::Lin,
            merge_polarities: false,
        }
    }
}

impl TimeSurfaceParams {
    pub fn with_surface_dimensions(mut self, dims: Option<SurfaceDims>) -> Self {
        self.surface_dimensions = dims;
        self
    }

    /// Use the whole sensor grid as the surface.
    pub fn global(self) -> Self {
        self.with_surface_dimensions(None)
    }

    pub fn with_tau(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    pub fn with_decay(mut self, decay: Decay) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_merge_polarities(mut self, merge: bool) -> Self {
        self.merge_polarities = merge;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tau.is_finite() && self.tau > 0.0) {
            return Err(invalid(format!("tau must be positive and finite, got {}", self.tau)));
        }
        if let Some(dims) = self.surface_dimensions {
            if dims.width == 0 || dims.height == 0 {
                return Err(invalid(format!(
                    "surface dimensions must be non-zero, got {}x{}",
                    dims.width, dims.height
                )));
            }
        }
        Ok(())
    }

    /// Surface shape `(height, width)` for a given sensor.
    pub fn surface_shape(&self, sensor: SensorSize) -> (usize, usize) {
        match self.surface_dimensions {
            Some(d) => (d.height, d.width),
            None => (sensor.height, sensor.width),
        }
    }
}

/// Sorted distinct polarity values; channel `c` holds the `c`-th smallest.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarityMap {
    values: Vec<f64>,
}

impl PolarityMap {
    /// Enumerate polarities and assign every event its channel.
    ///
    /// With `merge` every event lands in channel 0 (unless the stream is
    /// empty, which yields zero channels).
    pub fn enumerate<I>(polarities: I, merge: bool) -> (Self, Vec<usize>)
    where
        I: IntoIterator<Item = f64>,
    {
        let raw: Vec<f64> = polarities.into_iter().map(unsigned_zero).collect();
        if merge {
            let values = if raw.is_empty() { Vec::new() } else { vec![0.0] };
            let channels = vec![0; raw.len()];
            return (Self { values }, channels);
        }

        let mut values = raw.clone();
        values.sort_by(f64::total_cmp);
        values.dedup_by(|a, b| a.total_cmp(b).is_eq());
        let map = Self { values };
        // every value is present, the Err arm is unreachable
        let channels = raw
            .iter()
            .map(|p| map.values.binary_search_by(|v| v.total_cmp(p)).unwrap_or_else(|slot| slot))
            .collect();
        (map, channels)
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Channel of polarity `p`, if it was observed.
    pub fn channel(&self, p: f64) -> Option<usize> {
        let p = unsigned_zero(p);
        self.values.binary_search_by(|v| v.total_cmp(&p)).ok()
    }
}

// -0.0 and 0.0 are one polarity; total_cmp would split them
#[inline]
fn unsigned_zero(p: f64) -> f64 {
    p + 0.0
}

/// Last-seen timestamp per (channel, padded row, padded column).
struct TimestampMemory {
    grid: Array3<f64>,
    rx: usize,
    ry: usize,
}

impl TimestampMemory {
    // -inf keeps (sentinel - t) below the 3*tau horizon for any finite t
    const NEVER: f64 = f64::NEG_INFINITY;

    fn new(channels: usize, sensor: SensorSize, rx: usize, ry: usize) -> Self {
        let shape = (channels, sensor.height + 2 * ry, sensor.width + 2 * rx);
        Self {
            grid: Array3::from_elem(shape, Self::NEVER),
            rx,
            ry,
        }
    }

    #[inline]
    fn record(&mut self, channel: usize, x: usize, y: usize, t: f64) {
        self.grid[[channel, y + self.ry, x + self.rx]] = t;
    }

    /// Window of `(h, w)` centered on the padded location of pixel `(x, y)`.
    #[inline]
    fn window(&self, x: usize, y: usize, h: usize, w: usize) -> ArrayView3<'_, f64> {
        self.grid.slice(s![.., y..y + h, x..x + w])
    }
}

/// Builds one time surface per event (HOTS, Lagorce et al. 2016).
///
/// The builder resolves and validates its configuration up front, so
/// [`TimeSurfaceBuilder::build`] only fails on problems with the events
/// themselves.
#[derive(Debug, Clone)]
pub struct TimeSurfaceBuilder {
    sensor: SensorSize,
    ordering: Ordering,
    layout: FieldLayout,
    params: TimeSurfaceParams,
}

impl TimeSurfaceBuilder {
    pub fn new(sensor: SensorSize, ordering: Ordering, params: TimeSurfaceParams) -> Result<Self> {
        let layout = ordering.layout()?;
        sensor.validate()?;
        params.validate()?;
        Ok(Self {
            sensor,
            ordering,
            layout,
            params,
        })
    }

    pub fn params(&self) -> &TimeSurfaceParams {
        &self.params
    }

    pub fn sensor(&self) -> SensorSize {
        self.sensor
    }

    /// Compute the surfaces for `events`, an `(N, C)` record array.
    ///
    /// Returns an array of shape `(N, P, H, W)` where `P` is the number of
    /// distinct polarities (1 when merged) and `(H, W)` the window size, or
    /// the sensor size in global mode.
    ///
    /// Per event the memory is written first, then read, so the event's own
    /// cell always evaluates to 1.0.
    pub fn build(&self, events: ArrayView2<'_, f64>) -> Result<Array4<f64>> {
        self.ordering.check_columns(&events)?;
        let FieldLayout {
            x_index,
            y_index,
            t_index,
            p_index,
        } = self.layout;

        // Validate every coordinate before the fold so errors never leave
        // half-built output.
        let xs = resolve_pixels(&events, x_index, Field::X, self.sensor.width)?;
        let ys = resolve_pixels(&events, y_index, Field::Y, self.sensor.height)?;
        let times = events.column(t_index);
        if let Some((index, &value)) = times.iter().enumerate().find(|(_, t)| !t.is_finite()) {
            return Err(SurfaceError::NonFiniteTimestamp { index, value });
        }
        let (polarities, channels) =
            PolarityMap::enumerate(events.column(p_index).iter().copied(), self.params.merge_polarities);

        let n_events = events.nrows();
        let n_pol = polarities.channels();
        let (surf_h, surf_w) = self.params.surface_shape(self.sensor);
        let (rx, ry) = self
            .params
            .surface_dimensions
            .map(|d| d.radius())
            .unwrap_or((0, 0));

        debug!(
            n_events,
            n_polarities = n_pol,
            surface_h = surf_h,
            surface_w = surf_w,
            decay = ?self.params.decay,
            tau = self.params.tau,
            "building time surfaces"
        );

        let mut memory = TimestampMemory::new(n_pol, self.sensor, rx, ry);
        let mut out = Array4::<f64>::zeros((n_events, n_pol, surf_h, surf_w));
        let mut prev_t = f64::NEG_INFINITY;
        let mut warned = false;

        for (i, surface) in out.outer_iter_mut().enumerate() {
            let t = times[i];
            if t < prev_t && !warned {
                warn!(index = i, t, prev_t, "event timestamps are not monotonic");
                warned = true;
            }
            prev_t = t;
            self.step(&mut memory, surface, channels[i], xs[i], ys[i], t);
        }

        Ok(out)
    }

    /// One fold step: record the event, then decay its neighborhood into
    /// `surface`.
    #[inline]
    fn step(
        &self,
        memory: &mut TimestampMemory,
        mut surface: ArrayViewMut3<'_, f64>,
        channel: usize,
        x: usize,
        y: usize,
        t: f64,
    ) {
        memory.record(channel, x, y, t);
        let (h, w) = (surface.shape()[1], surface.shape()[2]);
        let neighborhood = if self.params.surface_dimensions.is_some() {
            memory.window(x, y, h, w)
        } else {
            memory.grid.view()
        };
        let TimeSurfaceParams { tau, decay, .. } = self.params;
        Zip::from(&mut surface)
            .and(&neighborhood)
            .for_each(|value, &last| *value = decay.apply(last - t, tau));
    }
}

/// Time surfaces for `events` laid out by `ordering`.
///
/// Shorthand for building a [`TimeSurfaceBuilder`] and calling `build`.
///
/// Edge cases:
/// - Missing `x`/`y`/`t`/`p` in `ordering`: `MissingField`, nothing processed.
/// - Coordinates are truncated toward zero; any event outside the sensor
///   rejects the whole stream with `OutOfBounds`.
/// - Empty stream: returns shape `(0, 0, H, W)`.
pub fn to_time_surface(
    events: ArrayView2<'_, f64>,
    sensor: SensorSize,
    ordering: &Ordering,
    params: &TimeSurfaceParams,
) -> Result<Array4<f64>> {
    TimeSurfaceBuilder::new(sensor, ordering.clone(), params.clone())?.build(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_parse() {
        assert_eq!("lin".parse::<Decay>(), Ok(Decay::Lin));
        assert_eq!("exp".parse::<Decay>(), Ok(Decay::Exp));
        assert_eq!(
            "gauss".parse::<Decay>(),
            Err(SurfaceError::UnknownDecay("gauss".to_string()))
        );
    }

    #[test]
    fn decay_horizon() {
        let tau = 5.0;
        assert_eq!(Decay::Lin.apply(0.0, tau), 1.0);
        assert_eq!(Decay::Exp.apply(0.0, tau), 1.0);
        assert_eq!(Decay::Lin.apply(-15.0, tau), 0.0);
        assert_eq!(Decay::Lin.apply(-100.0, tau), 0.0);
        assert!(Decay::Exp.apply(-15.0, tau) > 0.0);
        assert_eq!(Decay::Exp.apply(-15.0001, tau), 0.0);
        assert_eq!(Decay::Lin.apply(f64::NEG_INFINITY, tau), 0.0);
        assert_eq!(Decay::Exp.apply(f64::NEG_INFINITY, tau), 0.0);
    }

    #[test]
    fn polarity_map_sorted_channels() {
        let (map, ch) = PolarityMap::enumerate([1.0, -1.0, 1.0, 0.0], false);
        assert_eq!(map.values(), &[-1.0, 0.0, 1.0]);
        assert_eq!(ch, vec![2, 0, 2, 1]);
        assert_eq!(map.channel(0.0), Some(1));
        assert_eq!(map.channel(3.0), None);

        let (merged, ch) = PolarityMap::enumerate([1.0, -1.0], true);
        assert_eq!(merged.channels(), 1);
        assert_eq!(ch, vec![0, 0]);
    }

    #[test]
    fn params_validation() {
        assert!(TimeSurfaceParams::default().validate().is_ok());
        assert!(TimeSurfaceParams::default().with_tau(0.0).validate().is_err());
        assert!(TimeSurfaceParams::default().with_tau(f64::NAN).validate().is_err());
        let zero = TimeSurfaceParams::default().with_surface_dimensions(Some(SurfaceDims::new(0, 3)));
        assert!(zero.validate().is_err());
    }
}
