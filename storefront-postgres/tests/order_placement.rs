//! The placement engine end to end over PostgreSQL.
//!
//! Needs a Docker daemon; run with `cargo test -- --ignored`.

mod common;

use std::sync::Arc;

use common::{make_store, unique};
use rust_decimal::Decimal;
use storefront::{
    BillingStore, BillingUpdate, Category, EngineConfig, ErrorKind, InventoryQueryService,
    LineRequest, OrderPlacementEngine, OrderStore, OutcomeExt, Price, Product, ProductName,
    ProductStockStore, ShippingPolicy, StockLevel, Username,
};
use storefront_postgres::PostgresStore;

async fn stock(store: &PostgresStore, prefix: &str, on_hand: u32) -> ProductName {
    let name = ProductName::try_new(unique(prefix)).expect("valid product name");
    store
        .register(Product::new(
            name.clone(),
            "postgres fixture",
            Category::try_new(unique("category")).expect("valid category"),
            Price::try_new(Decimal::new(1_250, 2)).expect("valid price"),
            StockLevel::new(on_hand),
        ))
        .await
        .expect("product registration should succeed");
    name
}

async fn on_hand(store: &PostgresStore, name: &ProductName) -> u32 {
    store.get(name).await.value().on_hand.into_inner()
}

type PostgresEngine = OrderPlacementEngine<PostgresStore, PostgresStore, PostgresStore>;

fn engine(store: &PostgresStore) -> PostgresEngine {
    OrderPlacementEngine::new(store.clone(), store.clone(), store.clone())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a docker daemon"]
async fn committed_order_is_read_back_with_captured_prices() {
    // Given
    let store = make_store();
    let lamp = stock(&store, "lamp", 5).await;
    let vase = stock(&store, "vase", 5).await;
    let buyer = unique("buyer");

    // When
    let order_id = engine(&store)
        .place_order(
            &buyer,
            &[
                LineRequest::new(lamp.to_string(), 2),
                LineRequest::new(vase.to_string(), 1),
            ],
        )
        .await
        .expect("order should be placed");

    // Then
    let orders = engine(&store).user_orders(&buyer).await.value();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, order_id);
    assert_eq!(orders[0].total, Decimal::new(3_750, 2));
    assert_eq!(on_hand(&store, &lamp).await, 3);
    assert_eq!(on_hand(&store, &vase).await, 4);

    let stats = InventoryQueryService::new(store.clone(), store.clone())
        .stats_by_product()
        .await
        .value();
    let lamp_stats = stats
        .iter()
        .find(|row| row.product == lamp)
        .expect("lamp should have statistics");
    assert_eq!(lamp_stats.units_sold, 2);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a docker daemon"]
async fn refused_line_leaves_database_untouched() {
    let store = make_store();
    let lamp = stock(&store, "lamp", 5).await;
    let vase = stock(&store, "vase", 0).await;
    let buyer = unique("buyer");

    let failure = engine(&store)
        .place_order(
            &buyer,
            &[
                LineRequest::new(lamp.to_string(), 2),
                LineRequest::new(vase.to_string(), 1),
            ],
        )
        .await
        .expect_err("vase is sold out");

    assert_eq!(failure.kind(), &ErrorKind::InsufficientStock);
    assert_eq!(failure.subject(), Some(vase.as_ref()));
    assert_eq!(on_hand(&store, &lamp).await, 5);
    assert_eq!(
        engine(&store).user_orders(&buyer).await.error_kind(),
        Some(&ErrorKind::UserHasNoOrders)
    );
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a docker daemon"]
async fn shipping_snapshot_round_trips_through_jsonb() {
    let store = make_store();
    let lamp = stock(&store, "lamp", 5).await;
    let buyer = unique("buyer");
    let user = Username::try_new(buyer.clone()).expect("valid username");
    let _ = store
        .update_billing(
            &user,
            BillingUpdate {
                address: Some("  1 Main St ".to_owned()),
                country: Some("US".to_owned()),
                ..BillingUpdate::default()
            },
        )
        .await
        .value();
    let engine = engine(&store)
        .with_config(EngineConfig::default().with_shipping(ShippingPolicy::Require));

    let _ = engine
        .place_order(&buyer, &[LineRequest::new(lamp.to_string(), 1)])
        .await
        .value();

    let orders = store.list_for_user(&user).await.value();
    let shipping = orders[0].shipping.as_ref().expect("snapshot stored");
    assert_eq!(shipping.address.as_deref(), Some("1 Main St"));
    assert_eq!(shipping.country.as_deref(), Some("US"));
    assert_eq!(shipping.city, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a docker daemon"]
async fn racing_buyers_never_oversell() {
    let store = make_store();
    let lamp = stock(&store, "lamp", 7).await;
    let engine = Arc::new(engine(&store));

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let request = vec![LineRequest::new(lamp.to_string(), 1)];
            tokio::spawn(async move { engine.place_order(&unique("buyer"), &request).await })
        })
        .collect();

    let mut placed = 0;
    for handle in handles {
        if handle.await.expect("placement task panicked").is_success() {
            placed += 1;
        }
    }

    assert_eq!(placed, 7);
    assert_eq!(on_hand(&store, &lamp).await, 0);
}
