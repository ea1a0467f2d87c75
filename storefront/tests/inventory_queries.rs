mod common;

use common::{lines, price, product_name, register, Storefront};
use rust_decimal::Decimal;
use storefront::{
    Category, ErrorKind, InventoryQueryService, OutcomeExt, Price, Product, ProductStockStore,
    StockLevel,
};
use storefront_memory::{InMemoryOrderStore, InMemoryProductStore};

fn service(shop: &Storefront) -> InventoryQueryService<InMemoryProductStore, InMemoryOrderStore> {
    InventoryQueryService::new(shop.products.clone(), shop.orders.clone())
}

fn category(raw: &str) -> Category {
    Category::try_new(raw).expect("valid category")
}

#[tokio::test]
async fn empty_store_lists_fail_but_stats_are_empty() {
    let shop = Storefront::new();
    let queries = service(&shop);

    assert_eq!(
        queries.products().await.error_kind(),
        Some(&ErrorKind::ListIsEmpty)
    );
    assert_eq!(
        queries.categories().await.error_kind(),
        Some(&ErrorKind::ListIsEmpty)
    );
    assert_eq!(
        queries.products_in(&category("Lighting")).await.error_kind(),
        Some(&ErrorKind::ListIsEmpty)
    );
    assert_eq!(queries.stats_by_product().await.value(), vec![]);
}

#[tokio::test]
async fn listings_group_by_category() {
    let shop = Storefront::new();
    register(&shop.products, "Lamp", "Lighting", 1_000, 3).await;
    register(&shop.products, "Bulb", "Lighting", 200, 30).await;
    register(&shop.products, "Chair", "Furniture", 5_000, 1).await;
    let queries = service(&shop);

    let lighting: Vec<String> = queries
        .products_in(&category("Lighting"))
        .await
        .value()
        .into_iter()
        .map(|product| product.name.to_string())
        .collect();
    let categories = queries.categories().await.value();

    assert_eq!(lighting, vec!["Bulb", "Lamp"]);
    assert_eq!(categories, vec![category("Furniture"), category("Lighting")]);
    assert_eq!(queries.products().await.value().len(), 3);
    assert_eq!(
        queries.product(&product_name("Chair")).await.value().price,
        price(5_000)
    );
    assert_eq!(
        queries.product(&product_name("Sofa")).await.error_kind(),
        Some(&ErrorKind::NotFound)
    );
}

#[tokio::test]
async fn stats_cover_unsold_products_with_zeros() {
    // Given: two products, only one of which sells
    let shop = Storefront::new();
    shop.stock("Lamp", 1_000, 10).await;
    shop.stock("Vase", 3_000, 10).await;
    let engine = shop.engine();
    let _ = engine
        .place_order("alice", &lines(&[("Lamp", 2)]))
        .await
        .value();
    let _ = engine
        .place_order("bob", &lines(&[("Lamp", 1)]))
        .await
        .value();

    // When
    let stats = service(&shop).stats_by_product().await.value();

    // Then: rows are ordered by name and the unsold product reports zeros
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].product, product_name("Lamp"));
    assert_eq!(stats[0].units_sold, 3);
    assert_eq!(stats[0].revenue, Decimal::new(3_000, 2));
    assert_eq!(stats[1].product, product_name("Vase"));
    assert_eq!(stats[1].units_sold, 0);
    assert_eq!(stats[1].revenue, Decimal::ZERO);
}

#[tokio::test]
async fn revenue_uses_price_at_order_time() {
    let shop = Storefront::new();
    shop.stock("Lamp", 1_000, 10).await;
    let engine = shop.engine();
    let _ = engine
        .place_order("alice", &lines(&[("Lamp", 1)]))
        .await
        .value();
    shop.products
        .set_price(&product_name("Lamp"), price(4_000))
        .await
        .value();
    let _ = engine
        .place_order("alice", &lines(&[("Lamp", 1)]))
        .await
        .value();

    let stats = service(&shop).stats_by_product().await.value();

    assert_eq!(stats[0].units_sold, 2);
    assert_eq!(stats[0].revenue, Decimal::new(5_000, 2));
}

#[tokio::test]
async fn deleted_products_keep_their_sales_history() {
    let shop = Storefront::new();
    shop.stock("Lamp", 1_000, 10).await;
    let engine = shop.engine();
    let _ = engine
        .place_order("alice", &lines(&[("Lamp", 4)]))
        .await
        .value();
    shop.products
        .delete(&product_name("Lamp"))
        .await
        .value();

    let queries = service(&shop);
    let stats = queries.stats_by_product().await.value();

    assert_eq!(
        queries.products().await.error_kind(),
        Some(&ErrorKind::ListIsEmpty)
    );
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].product, product_name("Lamp"));
    assert_eq!(stats[0].units_sold, 4);
}

#[tokio::test]
async fn revenue_that_overflows_is_reported_instead_of_panicking() {
    // Given: two separate orders, each at the largest representable price
    let shop = Storefront::new();
    shop.products
        .register(Product::new(
            product_name("Gold"),
            "priced at the limit of a decimal",
            category("Treasure"),
            Price::try_new(Decimal::MAX).expect("valid price"),
            StockLevel::new(2),
        ))
        .await
        .expect("product registration should succeed");
    let engine = shop.engine();
    for buyer in ["alice", "bob"] {
        let _ = engine
            .place_order(buyer, &lines(&[("Gold", 1)]))
            .await
            .value();
    }

    // When
    let failure = service(&shop)
        .stats_by_product()
        .await
        .expect_err("combined revenue cannot be represented");

    // Then
    assert_eq!(failure.kind(), &ErrorKind::DatabaseError);
    assert_eq!(failure.subject(), Some("Gold"));
}
