use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;

use salescast_ai::{sample, AiJob, EmpiricalDistribution, SalesForecastJob, SalesWindow};
use salescast_core::ProductId;

fn history(len: usize, products: usize) -> Vec<ProductId> {
    (0..len)
        .map(|i| ProductId::new(format!("prod-{}", (i * 7 + i / 3) % products)).unwrap())
        .collect()
}

fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample");
    let training = history(1_000, 50);
    let dist = EmpiricalDistribution::from_training(&training).unwrap();

    for draws in [100u32, 1_000, 10_000] {
        group.throughput(Throughput::Elements(u64::from(draws)));
        group.bench_with_input(BenchmarkId::from_parameter(draws), &draws, |b, &draws| {
            let mut rng = StdRng::seed_from_u64(7);
            b.iter(|| sample(black_box(&dist), draws, &mut rng).unwrap());
        });
    }
    group.finish();
}

fn bench_forecast_job(c: &mut Criterion) {
    let window = SalesWindow::new(history(200, 20));
    let job = SalesForecastJob::new(window);

    c.bench_function("sales_forecast_job/extended", |b| {
        let mut rng = StdRng::seed_from_u64(11);
        b.iter(|| job.run(black_box(&mut rng)).unwrap());
    });
}

criterion_group!(benches, bench_sampling, bench_forecast_job);
criterion_main!(benches);
