use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;
use std::hint::black_box;
use storefront::{
    Category, InventoryQueryService, LineRequest, OrderPlacementEngine, Price, Product,
    ProductName, ProductStockStore, StockLevel,
};
use storefront_memory::{InMemoryBillingStore, InMemoryOrderStore, InMemoryProductStore};
use tokio::runtime::Runtime;

async fn catalog(size: usize) -> InMemoryProductStore {
    let products = InMemoryProductStore::new();
    for index in 0..size {
        products
            .register(Product::new(
                ProductName::try_new(format!("product-{index}")).unwrap(),
                "benchmark product",
                Category::try_new("Bench").unwrap(),
                Price::try_new(Decimal::new(499, 2)).unwrap(),
                StockLevel::new(u32::MAX),
            ))
            .await
            .unwrap();
    }
    products
}

fn request(size: usize) -> Vec<LineRequest> {
    (0..size)
        .map(|index| LineRequest::new(format!("product-{index}"), 1))
        .collect()
}

/// Successful placements of increasing width
fn bench_place_order(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("place_order");

    for lines in [1, 5, 20] {
        let products = rt.block_on(catalog(lines));
        let engine = OrderPlacementEngine::new(
            products,
            InMemoryOrderStore::new(),
            InMemoryBillingStore::new(),
        );
        let request = request(lines);

        group.bench_with_input(BenchmarkId::from_parameter(lines), &request, |b, request| {
            b.to_async(&rt).iter(|| async {
                black_box(engine.place_order("bench-buyer", request).await.unwrap())
            });
        });
    }
    group.finish();
}

/// Refusal on the last line, so every earlier line is compensated
fn bench_compensation(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let products = rt.block_on(catalog(10));
    let engine = OrderPlacementEngine::new(
        products,
        InMemoryOrderStore::new(),
        InMemoryBillingStore::new(),
    );
    let mut request = request(10);
    request.push(LineRequest::new("missing-product", 1));

    c.bench_function("place_order_compensated", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(engine.place_order("bench-buyer", &request).await.unwrap_err())
        });
    });
}

fn bench_stats(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let products = rt.block_on(catalog(50));
    let orders = InMemoryOrderStore::new();
    let engine = OrderPlacementEngine::new(
        products.clone(),
        orders.clone(),
        InMemoryBillingStore::new(),
    );
    rt.block_on(async {
        for _ in 0..200 {
            engine.place_order("bench-buyer", &request(50)).await.unwrap();
        }
    });
    let queries = InventoryQueryService::new(products, orders);

    c.bench_function("stats_by_product", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(queries.stats_by_product().await.unwrap()) });
    });
}

fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_some() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

fn benches(c: &mut Criterion) {
    init_tracing();
    bench_place_order(c);
    bench_compensation(c);
    bench_stats(c);
}

criterion_group!(placement, benches);
criterion_main!(placement);
