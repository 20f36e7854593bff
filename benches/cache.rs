//! Object cache benchmarks.
//!
//! Run with: cargo bench --bench cache

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use resource_mirror::kinds::{self, default_indexes};
use resource_mirror::query::{compile_filter, compile_order};
use resource_mirror::{Cache, QueryRequest, StoredObject, Uid};
use serde_json::json;

fn populated(spaces: usize, connections_per_space: usize) -> Cache {
  let cache = Cache::new(default_indexes()).unwrap();
  let mut batch = Vec::with_capacity(spaces * (connections_per_space + 1));
  for s in 0..spaces {
    let name = format!("as{}", s);
    batch.push(
      StoredObject::new(kinds::ADDRESS_SPACE, Uid::generate(), "ns", name.clone())
        .with_status(json!({"Connections": connections_per_space, "IsReady": s % 2 == 0})),
    );
    for c in 0..connections_per_space {
      batch.push(
        StoredObject::new(kinds::CONNECTION, Uid::generate(), "ns", format!("host:{}", c))
          .with_spec(json!({"AddressSpace": name})),
      );
    }
  }
  cache.add(batch).unwrap();
  cache
}

fn bench_expression_compile(c: &mut Criterion) {
  let mut group = c.benchmark_group("expression_compile");

  group.bench_function("filter", |b| {
    b.iter(|| {
      black_box(
        compile_filter(
          "`$.ObjectMeta.Name` LIKE 'as1%' AND (`$.Status.IsReady` = TRUE OR `$.Status.Connections` > 3)",
        )
        .unwrap(),
      );
    });
  });

  group.bench_function("order", |b| {
    b.iter(|| {
      black_box(compile_order("`$.ObjectMeta.Namespace` DESC, `$.ObjectMeta.Name`").unwrap());
    });
  });

  group.finish();
}

fn bench_add(c: &mut Criterion) {
  let mut group = c.benchmark_group("add");

  for size in [100, 1000] {
    group.throughput(Throughput::Elements(size as u64));
    group.bench_with_input(BenchmarkId::new("batch", size), &size, |b, &size| {
      b.iter_with_setup(
        || {
          let objects: Vec<_> = (0..size)
            .map(|i| {
              StoredObject::new(kinds::CONNECTION, Uid::generate(), "ns", format!("host:{}", i))
                .with_spec(json!({"AddressSpace": "as"}))
            })
            .collect();
          (Cache::new(default_indexes()).unwrap(), objects)
        },
        |(cache, objects)| {
          cache.add(objects).unwrap();
          black_box(cache)
        },
      );
    });
  }

  group.finish();
}

fn bench_query(c: &mut Criterion) {
  let mut group = c.benchmark_group("query");
  let cache = populated(1000, 2);

  group.bench_function("all", |b| {
    let request = QueryRequest::new(kinds::ADDRESS_SPACE);
    b.iter(|| black_box(cache.query(&request).unwrap()));
  });

  group.bench_function("filter", |b| {
    let request = QueryRequest::new(kinds::ADDRESS_SPACE).filter("`$.Status.IsReady` = TRUE");
    b.iter(|| black_box(cache.query(&request).unwrap()));
  });

  group.bench_function("filter_order_page", |b| {
    let request = QueryRequest::new(kinds::ADDRESS_SPACE)
      .filter("`$.ObjectMeta.Name` LIKE 'as1%'")
      .order_by("`$.ObjectMeta.Name` DESC")
      .offset(10)
      .limit(20);
    b.iter(|| black_box(cache.query(&request).unwrap()));
  });

  group.finish();
}

fn bench_descendants(c: &mut Criterion) {
  let mut group = c.benchmark_group("descendants");

  for per_space in [2, 50] {
    let cache = populated(200, per_space);
    group.bench_with_input(
      BenchmarkId::new("connections", per_space),
      &per_space,
      |b, _| {
        b.iter(|| black_box(cache.descendants("ns/as100", kinds::CONNECTION).unwrap()));
      },
    );
  }

  group.finish();
}

criterion_group!(
  benches,
  bench_expression_compile,
  bench_add,
  bench_query,
  bench_descendants
);
criterion_main!(benches);
