/*!
Core CPU kernels for event-camera time surfaces.

Events are `(N, C)` `f64` record arrays whose columns are named by an
[`Ordering`]. The main kernel, [`kernels::time_surface`], folds a
last-seen-timestamp memory over the stream and emits one decayed surface per
event; [`kernels::flip`] and [`kernels::time_ops`] hold the deterministic
event transforms.
*/

pub mod error;
pub mod events;
pub mod kernels;

pub use error::{Result, SurfaceError};
pub use events::{events_to_array, Event, Field, FieldLayout, Ordering, SensorSize};
