use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use evsurf_core::kernels::time_surface::{Decay, SurfaceDims, TimeSurfaceBuilder, TimeSurfaceParams};
use evsurf_core::{events_to_array, Event, Ordering, SensorSize};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DURATION: f64 = 1_000_000.0;

fn make_events(n: usize, w: usize, h: usize, seed: u64, ordering: &Ordering) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut events = Vec::with_capacity(n);
    for i in 0..n {
        let t = if n > 1 {
            (i as f64) * DURATION / ((n - 1) as f64)
        } else {
            0.0
        };
        let x = rng.gen_range(0..w) as f64;
        let y = rng.gen_range(0..h) as f64;
        let p = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        events.push(Event::new(x, y, t, p));
    }
    events_to_array(&events, ordering)
}

pub fn time_surface_bench(c: &mut Criterion) {
    // Scenarios:
    // - Sensor sizes: (128,128), (240,180), (346,260)
    // - Event counts: 5k, 20k
    // - Windows: 5x5, 7x7 local; decay lin and exp; tau = 30_000
    let sizes = [(128usize, 128usize), (240, 180), (346, 260)];
    let counts = [5_000usize, 20_000];
    let windows = [5usize, 7];
    let decays = [Decay::Lin, Decay::Exp];
    let ordering: Ordering = "xytp".parse().expect("static ordering");

    let mut group = c.benchmark_group("time_surface");

    for &(w, h) in &sizes {
        for &n in &counts {
            // Pre-generate deterministic events
            let seed = 0xDEADBEEF ^ ((w as u64) << 32) ^ ((h as u64) << 16) ^ (n as u64);
            let events = make_events(n, w, h, seed, &ordering);

            for &win in &windows {
                for &decay in &decays {
                    let params = TimeSurfaceParams::default()
                        .with_surface_dimensions(Some(SurfaceDims::new(win, win)))
                        .with_tau(30_000.0)
                        .with_decay(decay);
                    let builder = TimeSurfaceBuilder::new(SensorSize::new(w, h), ordering.clone(), params)
                        .expect("valid config");

                    group.throughput(Throughput::Elements(n as u64));
                    let id = BenchmarkId::new(format!("{}x{}-n{}-win{}", w, h, n, win), format!("{:?}", decay));
                    group.bench_with_input(id, &events, |b, evs| {
                        b.iter(|| {
                            // End-to-end kernel call per iteration
                            let out = builder.build(black_box(evs.view())).expect("kernel ok");
                            black_box(out);
                        });
                    });
                }
            }
        }
    }

    group.finish();
}

criterion_group!(benches, time_surface_bench);
criterion_main!(benches);
