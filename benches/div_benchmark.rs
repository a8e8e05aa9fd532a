//! Division throughput across the three regimes

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mpkern::div::{div, inv_prediv, inv_size};
use mpkern::inv::invappr;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_limbs(rng: &mut StdRng, n: usize) -> Vec<u64> {
    (0..n).map(|_| rng.random()).collect()
}

fn bench_div_regimes(c: &mut Criterion) {
    let mut group = c.benchmark_group("div");
    let mut rng = StdRng::seed_from_u64(7);
    // (na, nb): schoolbook, recursive, mulinv
    for &(na, nb) in &[(64usize, 24usize), (512, 200), (1400, 700)] {
        let a = random_limbs(&mut rng, na);
        let mut d = random_limbs(&mut rng, nb);
        d[nb - 1] |= 1 << 63;
        group.throughput(Throughput::Elements(na as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{na}x{nb}")),
            &na,
            |bench, _| {
                bench.iter(|| {
                    let mut aw = a.clone();
                    let mut q = vec![0u64; na - nb];
                    div(&mut q, &mut aw, &d)
                });
            },
        );
    }
    group.finish();
}

fn bench_reciprocal(c: &mut Criterion) {
    let mut group = c.benchmark_group("invappr");
    let mut rng = StdRng::seed_from_u64(8);
    for &n in &[20usize, 100, 800] {
        let mut d = random_limbs(&mut rng, n);
        d[n - 1] |= 1 << 63;
        let mut dst = vec![0u64; n];
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bench, _| {
            bench.iter(|| invappr(&mut dst, &d, n));
        });
    }
    group.finish();
}

fn bench_prediv_inverse(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(9);
    let nb = 700usize;
    let nq = 700usize;
    let mut d = random_limbs(&mut rng, nb);
    d[nb - 1] |= 1 << 63;
    let ni = inv_size(nq, nb);
    let mut invb = vec![0u64; ni];
    c.bench_function("inv_prediv_700", |bench| {
        bench.iter(|| inv_prediv(&mut invb, &d, ni));
    });
}

criterion_group!(benches, bench_div_regimes, bench_reciprocal, bench_prediv_inverse);
criterion_main!(benches);
