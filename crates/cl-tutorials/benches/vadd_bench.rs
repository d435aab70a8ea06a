// 2025 Thomas Bicanic – MIT License

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use cl_tutorials::{config::VADD_PROGRAM, vadd, ClSession, SessionConfig};

fn bench_vadd(c: &mut Criterion) {
    // no OpenCL runtime, nothing to measure
    let Ok(session) = ClSession::open(&SessionConfig::default()) else {
        eprintln!("vadd_bench: no OpenCL device, skipping");
        return;
    };

    let mut g = c.benchmark_group("vadd");
    for n in [1 << 10, 1 << 20] {
        // a, b, c up, d down
        g.throughput(Throughput::Bytes((n * 4 * 4) as u64));
        g.bench_function(format!("vadd_{n}"), |b| {
            b.iter(|| {
                let report = vadd::run(&session, VADD_PROGRAM.as_ref(), n).unwrap();
                assert!(report.is_correct());
            });
        });
    }
    g.finish();
}

fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_secs(3))
        .measurement_time(Duration::from_secs(10))
        .sample_size(30)
        .configure_from_args()
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_vadd
}
criterion_main!(benches);
