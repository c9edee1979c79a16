//! Event records and the ordering descriptor that names their columns.
//!
//! Kernels consume events as a 2-D `f64` array of shape `(N, C)`: one row per
//! event, one column per field. Which column holds which field is described by
//! an [`Ordering`], e.g. `"xytp"` or `"txyp"`. Kernels resolve the fields they
//! need once at entry and never look them up again per event.

use core::fmt;
use core::str::FromStr;

use ndarray::{Array2, ArrayView2};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{invalid, Result, SurfaceError};

/// A named column of an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Field {
    /// Column coordinate.
    X,
    /// Row coordinate.
    Y,
    /// Timestamp.
    T,
    /// Polarity label.
    P,
    /// Auxiliary column carried through transforms but never interpreted.
    Other(char),
}

impl Field {
    pub fn from_char(c: char) -> Self {
        match c {
            'x' => Field::X,
            'y' => Field::Y,
            't' => Field::T,
            'p' => Field::P,
            other => Field::Other(other),
        }
    }

    pub fn name(self) -> char {
        match self {
            Field::X => 'x',
            Field::Y => 'y',
            Field::T => 't',
            Field::P => 'p',
            Field::Other(c) => c,
        }
    }
}

/// Ordering descriptor: the field held by each record column, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ordering {
    fields: Vec<Field>,
}

impl Ordering {
    /// Build an ordering from explicit fields. Names must be unique.
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        for (i, f) in fields.iter().enumerate() {
            if fields[..i].contains(f) {
                return Err(SurfaceError::DuplicateField(f.name()));
            }
        }
        Ok(Self { fields })
    }

    /// Number of columns described.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Column holding `field`, if any.
    pub fn position(&self, field: Field) -> Option<usize> {
        self.fields.iter().position(|f| *f == field)
    }

    /// Column holding `field`, or `MissingField`.
    pub fn require(&self, field: Field) -> Result<usize> {
        self.position(field)
            .ok_or(SurfaceError::MissingField(field.name()))
    }

    /// Resolve all four event fields at once.
    pub fn layout(&self) -> Result<FieldLayout> {
        Ok(FieldLayout {
            x_index: self.require(Field::X)?,
            y_index: self.require(Field::Y)?,
            t_index: self.require(Field::T)?,
            p_index: self.require(Field::P)?,
        })
    }

    /// Fails unless `events` has exactly one column per described field.
    pub fn check_columns(&self, events: &ArrayView2<'_, f64>) -> Result<()> {
        let found = events.ncols();
        if found != self.len() {
            return Err(SurfaceError::ColumnMismatch {
                expected: self.len(),
                found,
            });
        }
        Ok(())
    }
}

impl Default for Ordering {
    fn default() -> Self {
        Self {
            fields: vec![Field::X, Field::Y, Field::T, Field::P],
        }
    }
}

impl FromStr for Ordering {
    type Err = SurfaceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s.chars().map(Field::from_char).collect())
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            write!(f, "{}", field.name())?;
        }
        Ok(())
    }
}

/// Column indices of the four event fields, resolved once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub x_index: usize,
    pub y_index: usize,
    pub t_index: usize,
    pub p_index: usize,
}

/// Pixel grid geometry of the sensor events are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorSize {
    pub width: usize,
    pub height: usize,
}

impl SensorSize {
    #[inline]
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Rejects degenerate (zero-sized) sensors.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid(format!(
                "sensor size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Typed view of a single event, mostly used to assemble record arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub x: f64,
    pub y: f64,
    pub t: f64,
    pub p: f64,
}

impl Event {
    #[inline]
    pub fn new(x: f64, y: f64, t: f64, p: f64) -> Self {
        Self { x, y, t, p }
    }

    /// Value of `field`; auxiliary columns read as zero.
    #[inline]
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::X => self.x,
            Field::Y => self.y,
            Field::T => self.t,
            Field::P => self.p,
            Field::Other(_) => 0.0,
        }
    }
}

/// Pack typed events into an `(N, C)` record array laid out by `ordering`.
pub fn events_to_array(events: &[Event], ordering: &Ordering) -> Array2<f64> {
    Array2::from_shape_fn((events.len(), ordering.len()), |(i, c)| {
        events[i].get(ordering.fields()[c])
    })
}

/// Truncate a coordinate toward zero and check it against `limit`.
#[inline]
pub(crate) fn pixel_index(value: f64, limit: usize) -> Option<usize> {
    let v = value.trunc();
    // NaN fails both comparisons
    if v >= 0.0 && v < limit as f64 {
        Some(v as usize)
    } else {
        None
    }
}

/// Resolve column `col` of every record into a pixel index below `limit`.
pub(crate) fn resolve_pixels(
    events: &ArrayView2<'_, f64>,
    col: usize,
    field: Field,
    limit: usize,
) -> Result<Vec<usize>> {
    events
        .column(col)
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            pixel_index(value, limit).ok_or(SurfaceError::OutOfBounds {
                index,
                field: field.name(),
                value,
                limit,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_parse_and_layout() {
        let ord: Ordering = "txyp".parse().unwrap();
        assert_eq!(ord.len(), 4);
        assert_eq!(ord.to_string(), "txyp");
        let layout = ord.layout().unwrap();
        assert_eq!(layout.t_index, 0);
        assert_eq!(layout.x_index, 1);
        assert_eq!(layout.y_index, 2);
        assert_eq!(layout.p_index, 3);
    }

    #[test]
    fn ordering_rejects_duplicates_and_missing() {
        assert_eq!(
            "xxtp".parse::<Ordering>(),
            Err(SurfaceError::DuplicateField('x'))
        );
        let ord: Ordering = "xyt".parse().unwrap();
        assert_eq!(ord.layout(), Err(SurfaceError::MissingField('p')));
    }

    #[test]
    fn pixel_index_truncates() {
        assert_eq!(pixel_index(2.9, 4), Some(2));
        assert_eq!(pixel_index(-0.5, 4), Some(0));
        assert_eq!(pixel_index(4.0, 4), None);
        assert_eq!(pixel_index(-1.0, 4), None);
        assert_eq!(pixel_index(f64::NAN, 4), None);
    }

    #[test]
    fn events_to_array_follows_ordering() {
        let ord: Ordering = "tpxy".parse().unwrap();
        let arr = events_to_array(&[Event::new(1.0, 2.0, 3.0, -1.0)], &ord);
        assert_eq!(arr.shape(), &[1, 4]);
        assert_eq!(arr.row(0).to_vec(), vec![3.0, -1.0, 1.0, 2.0]);
    }
}
