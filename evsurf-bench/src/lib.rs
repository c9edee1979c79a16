//! Benchmark harness crate for evsurf-core; see `benches/`.
