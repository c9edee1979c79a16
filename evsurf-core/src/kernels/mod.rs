pub mod time_surface;
pub mod flip;
pub mod time_ops;

pub use time_surface::{to_time_surface, Decay, SurfaceDims, TimeSurfaceBuilder, TimeSurfaceParams};
