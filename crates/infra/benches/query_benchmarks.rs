use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;

use stowage_core::{AggregateRoot, EntityHandle, Key, Sequence};
use stowage_infra::{Filter, MemoryRepository, MemoryStore, MemoryUnitOfWork, OrderBy, Repository, RepositoryExt, UnitOfWork};

#[derive(Debug, Clone)]
struct Product {
    id: Key<u64>,
    sku: String,
    price: i64,
}

impl AggregateRoot for Product {
    type Key = u64;

    fn key(&self) -> &Key<u64> {
        &self.id
    }

    fn set_key(&mut self, key: Key<u64>) {
        self.id = key;
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn populated(rt: &tokio::runtime::Runtime, size: usize) -> MemoryRepository<Product> {
    let uow = MemoryUnitOfWork::arc();
    let generator = Arc::new(Sequence::new()).generator::<Product>();
    let repo = MemoryRepository::from_store(MemoryStore::with_generator(generator), Some(uow.clone() as Arc<dyn UnitOfWork>));

    for i in 0..size {
        let product = Product {
            id: Key::Unassigned,
            sku: format!("SKU-{:06}", (i * 7919) % size),
            price: ((i * 31) % 1000) as i64,
        };
        repo.add(EntityHandle::new(product)).unwrap();
    }
    rt.block_on(uow.commit()).unwrap();
    repo
}

fn bench_find_all_paging(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("find_all_paging");

    for size in [100usize, 1_000, 10_000].iter() {
        let repo = populated(&rt, *size);
        group.throughput(Throughput::Elements(20));
        group.bench_with_input(BenchmarkId::new("middle_page", size), size, |b, &size| {
            b.iter(|| {
                let page = rt
                    .block_on(repo.find_all(black_box(size / 2), 20, None))
                    .unwrap();
                black_box(page);
            });
        });
    }

    group.finish();
}

fn bench_ordered_queries(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("ordered_queries");

    for size in [100usize, 1_000, 10_000].iter() {
        let repo = populated(&rt, *size);

        group.bench_with_input(BenchmarkId::new("ascending_by_sku", size), size, |b, _| {
            b.iter(|| {
                let page = rt
                    .block_on(repo.find_all_ascending(0, 20, None, Some(OrderBy::new(|p: &Product| p.sku.clone()))))
                    .unwrap();
                black_box(page);
            });
        });

        group.bench_with_input(BenchmarkId::new("filtered_descending_by_price", size), size, |b, _| {
            b.iter(|| {
                let page = rt
                    .block_on(repo.find_all_descending(
                        0,
                        20,
                        Some(Filter::new(|p: &Product| p.price % 2 == 0)),
                        Some(OrderBy::new(|p: &Product| p.price)),
                    ))
                    .unwrap();
                black_box(page);
            });
        });

        group.bench_with_input(BenchmarkId::new("find_last", size), size, |b, _| {
            b.iter(|| black_box(rt.block_on(repo.find_last()).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_find_all_paging, bench_ordered_queries);
criterion_main!(benches);
