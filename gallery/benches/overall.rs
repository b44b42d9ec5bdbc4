use chrono::Locale;
use criterion::{criterion_group, criterion_main, Criterion};
use gallery::{sort_newest_first, Aggregator, MonthLabeler};
use media_source::{AccessPolicy, InMemorySource, MediaRecord};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn sample(n: i64) -> Vec<MediaRecord> {
    (0..n)
        .map(|i| MediaRecord::image(i, 1_500_000_000_000 + (i * 7_919 % n) * 3_600_000, 1, 1))
        .collect()
}

fn bench_group_by_month(c: &mut Criterion) {
    let records = sort_newest_first(sample(20_000));
    let agg = Aggregator::new(
        Arc::new(InMemorySource::default()),
        AccessPolicy::All,
        MonthLabeler::utc(Locale::en_US),
    );
    c.bench_function("group_by_month", |b| {
        b.iter(|| agg.group_by_month(&records))
    });
}

fn bench_load(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let agg = Aggregator::new(
        Arc::new(InMemorySource::new(sample(20_000))),
        AccessPolicy::All,
        MonthLabeler::utc(Locale::en_US),
    );
    c.bench_function("full_load", |b| {
        b.to_async(&rt).iter(|| async { agg.load().await.unwrap() })
    });
}

criterion_group!(benches, bench_group_by_month, bench_load);
criterion_main!(benches);
