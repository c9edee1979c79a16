//! evsurf_python: PyO3 bindings for evsurf-core kernels.
//!
//! Exposes NumPy-compatible functions:
//! - to_time_surface -> f64 array shape (N,P,H,W)
//! - flip_lr/flip_ud/flip_polarity/time_reverse -> f64 array shape (N,C)
//!
//! Inputs: events as a 2D float64 NumPy array of shape (N, C) plus an ordering
//! string naming each column (e.g. "xytp"). Event order is preserved.

use evsurf_core::kernels::{flip, time_ops, time_surface};
use evsurf_core::{Ordering, SensorSize, SurfaceError};
use numpy::{PyArray2, PyArray4, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn to_py_err(err: SurfaceError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn parse_ordering(ordering: &str) -> PyResult<Ordering> {
    ordering.parse().map_err(to_py_err)
}

#[pyfunction]
#[pyo3(name = "to_time_surface")]
#[pyo3(signature = (events, sensor_w, sensor_h, ordering, surface_dimensions=None, tau=5e3, decay="lin", merge_polarities=false))]
/// Compute one time surface per event.
/// surface_dimensions is (width, height), both odd; None uses the whole sensor.
/// Returns a NumPy f64 array with shape (N, P, H, W) in C-order.
fn to_time_surface_py<'py>(
    py: Python<'py>,
    events: PyReadonlyArray2<'py, f64>,
    sensor_w: usize,
    sensor_h: usize,
    ordering: &str,
    surface_dimensions: Option<(usize, usize)>,
    tau: f64,
    decay: &str,
    merge_polarities: bool,
) -> PyResult<Py<PyArray4<f64>>> {
    let params = time_surface::TimeSurfaceParams::default()
        .with_surface_dimensions(
            surface_dimensions.map(|(w, h)| time_surface::SurfaceDims::new(w, h)),
        )
        .with_tau(tau)
        .with_decay(decay.parse().map_err(to_py_err)?)
        .with_merge_polarities(merge_polarities);
    let surfaces = time_surface::to_time_surface(
        events.as_array(),
        SensorSize::new(sensor_w, sensor_h),
        &parse_ordering(ordering)?,
        &params,
    )
    .map_err(to_py_err)?;
    Ok(PyArray4::from_owned_array(py, surfaces).to_owned())
}

#[pyfunction(text_signature = "(events, sensor_w, sensor_h, ordering, /)")]
#[pyo3(name = "flip_lr")]
/// Mirror events horizontally: x' = W - 1 - x.
fn flip_lr_py<'py>(
    py: Python<'py>,
    events: PyReadonlyArray2<'py, f64>,
    sensor_w: usize,
    sensor_h: usize,
    ordering: &str,
) -> PyResult<Py<PyArray2<f64>>> {
    let out = flip::flip_lr(
        events.as_array(),
        SensorSize::new(sensor_w, sensor_h),
        &parse_ordering(ordering)?,
    )
    .map_err(to_py_err)?;
    Ok(PyArray2::from_owned_array(py, out).to_owned())
}

#[pyfunction(text_signature = "(events, sensor_w, sensor_h, ordering, /)")]
#[pyo3(name = "flip_ud")]
/// Mirror events vertically: y' = H - 1 - y.
fn flip_ud_py<'py>(
    py: Python<'py>,
    events: PyReadonlyArray2<'py, f64>,
    sensor_w: usize,
    sensor_h: usize,
    ordering: &str,
) -> PyResult<Py<PyArray2<f64>>> {
    let out = flip::flip_ud(
        events.as_array(),
        SensorSize::new(sensor_w, sensor_h),
        &parse_ordering(ordering)?,
    )
    .map_err(to_py_err)?;
    Ok(PyArray2::from_owned_array(py, out).to_owned())
}

#[pyfunction(text_signature = "(events, ordering, /)")]
#[pyo3(name = "flip_polarity")]
/// Invert every event's polarity ({0,1} or signed encodings).
fn flip_polarity_py<'py>(
    py: Python<'py>,
    events: PyReadonlyArray2<'py, f64>,
    ordering: &str,
) -> PyResult<Py<PyArray2<f64>>> {
    let out = flip::flip_polarity(events.as_array(), &parse_ordering(ordering)?)
        .map_err(to_py_err)?;
    Ok(PyArray2::from_owned_array(py, out).to_owned())
}

#[pyfunction(text_signature = "(events, ordering, /)")]
#[pyo3(name = "time_reverse")]
/// Reflect timestamps over max(t), invert polarity and reverse event order.
fn time_reverse_py<'py>(
    py: Python<'py>,
    events: PyReadonlyArray2<'py, f64>,
    ordering: &str,
) -> PyResult<Py<PyArray2<f64>>> {
    let out = time_ops::time_reverse(events.as_array(), &parse_ordering(ordering)?)
        .map_err(to_py_err)?;
    Ok(PyArray2::from_owned_array(py, out).to_owned())
}

#[pymodule]
fn evsurf_python(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add("__doc__", "Python bindings for evsurf core kernels.")?;
    m.add_function(wrap_pyfunction!(to_time_surface_py, m)?)?;
    m.add_function(wrap_pyfunction!(flip_lr_py, m)?)?;
    m.add_function(wrap_pyfunction!(flip_ud_py, m)?)?;
    m.add_function(wrap_pyfunction!(flip_polarity_py, m)?)?;
    m.add_function(wrap_pyfunction!(time_reverse_py, m)?)?;
    Ok(())
}
