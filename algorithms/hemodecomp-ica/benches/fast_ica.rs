use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hemodecomp::traits::Fit;
use hemodecomp_ica::{FastIca, FastIcaError, GFunc};
use ndarray::{concatenate, Array, Array2, Axis};
use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
use rand_xoshiro::Xoshiro256Plus;

fn perform_ica(gfunc: GFunc, records: &Array2<f64>) {
    let ica = FastIca::params().ncomponents(10).gfunc(gfunc);

    let _ica = Fit::<_, FastIcaError>::fit(&ica, records);
}

// Forty channels of a recording at 7.8 Hz: a block task response, a cardiac-like oscillation and
// noise mixed into every channel
fn create_data(nsamples: usize) -> Array2<f64> {
    let times = Array::linspace(0., nsamples as f64 / 7.8125, nsamples);
    let task = times.mapv(|t| if (t / 15.) as usize % 2 == 1 { 1. } else { 0. });
    let cardiac = times.mapv(|t| (2. * std::f64::consts::PI * 1.1 * t).sin());

    let sources = concatenate![
        Axis(1),
        task.insert_axis(Axis(1)),
        cardiac.insert_axis(Axis(1))
    ];

    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let mixing = Array::random_using((2, 40), Uniform::new(-1.0, 1.0), &mut rng);
    let noise = Array::random_using((nsamples, 40), Uniform::new(-0.2, 0.2), &mut rng);

    sources.dot(&mixing) + noise
}

fn gfunc_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("Fast ICA");
    for size in [1_000, 5_000, 20_000].iter() {
        let records = create_data(*size);
        for (name, gfunc) in [
            ("GFunc_LogCosH", GFunc::Logcosh(1.0)),
            ("GFunc_Cube", GFunc::Cube),
            ("GFunc_Exp", GFunc::Exp),
        ]
        .iter()
        {
            group.bench_with_input(BenchmarkId::new(*name, size), &records, |b, records| {
                b.iter(|| perform_ica(*gfunc, records));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, gfunc_bench);
criterion_main!(benches);
