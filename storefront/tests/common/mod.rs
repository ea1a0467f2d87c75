//! Shared fixtures for storefront engine integration tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use rust_decimal::Decimal;
use storefront::{
    Category, LineRequest, OrderPlacementEngine, OutcomeExt, Price, Product, ProductName,
    ProductStockStore, StockLevel,
};
use storefront_memory::{InMemoryBillingStore, InMemoryOrderStore, InMemoryProductStore};

/// Engine wired to in-memory stores.
pub type MemoryEngine =
    OrderPlacementEngine<InMemoryProductStore, InMemoryOrderStore, InMemoryBillingStore>;

/// In-memory stores shared between an engine and the test inspecting them.
#[derive(Debug, Clone, Default)]
pub struct Storefront {
    pub products: InMemoryProductStore,
    pub orders: InMemoryOrderStore,
    pub billing: InMemoryBillingStore,
}

impl Storefront {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` in the "General" category.
    pub async fn stock(&self, name: &str, price_cents: i64, on_hand: u32) {
        register(&self.products, name, "General", price_cents, on_hand).await;
    }

    /// Current stock of `name`.
    pub async fn on_hand(&self, name: &str) -> u32 {
        self.products
            .get(&product_name(name))
            .await
            .value()
            .on_hand
            .into_inner()
    }

    pub fn engine(&self) -> MemoryEngine {
        OrderPlacementEngine::new(
            self.products.clone(),
            self.orders.clone(),
            self.billing.clone(),
        )
    }
}

pub async fn register<S: ProductStockStore>(
    store: &S,
    name: &str,
    category: &str,
    price_cents: i64,
    on_hand: u32,
) {
    store
        .register(Product::new(
            product_name(name),
            format!("{name} for testing"),
            Category::try_new(category).expect("valid category"),
            price(price_cents),
            StockLevel::new(on_hand),
        ))
        .await
        .expect("product registration should succeed");
}

pub fn product_name(name: &str) -> ProductName {
    ProductName::try_new(name).expect("valid product name")
}

pub fn price(cents: i64) -> Price {
    Price::try_new(Decimal::new(cents, 2)).expect("valid price")
}

pub fn lines(requested: &[(&str, i64)]) -> Vec<LineRequest> {
    requested
        .iter()
        .map(|(product, quantity)| LineRequest::new(*product, *quantity))
        .collect()
}
