mod utils;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use utils::{download_siftsmall, get_records};
use vectorlite::collection::{Collection, Config};
use vectorlite::vector::Vector;

fn insertion_benchmark(c: &mut Criterion) {
    download_siftsmall().expect("failed to download siftsmall dataset");
    let records = get_records("data/siftsmall/siftsmall_base.fvecs")
        .expect("failed to read siftsmall vectors");

    let mut group = c.benchmark_group("insert");
    for size in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let config = Config::create_default();
                let mut collection = Collection::new(&config);
                for record in records.iter().take(size) {
                    collection.insert(record).unwrap();
                }
            });
        });
    }
    group.finish();

    jemalloc_ctl::epoch::advance().ok();
    if let Ok(allocated) = jemalloc_ctl::stats::allocated::read() {
        eprintln!("resident allocator bytes after insert group: {allocated}");
    }
}

fn search_benchmark(c: &mut Criterion) {
    download_siftsmall().expect("failed to download siftsmall dataset");
    let records = get_records("data/siftsmall/siftsmall_base.fvecs")
        .expect("failed to read siftsmall vectors");

    let config = Config::create_default();
    let mut collection = Collection::new(&config);
    for record in records.iter().take(10_000) {
        collection.insert(record).unwrap();
    }

    let query = Vector::random(collection.dimension());

    let mut group = c.benchmark_group("search");
    for k in [1usize, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            b.iter(|| collection.search(&query, k).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, insertion_benchmark, search_benchmark);
criterion_main!(benches);
