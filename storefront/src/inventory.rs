//! Read-side queries over the catalog and order history.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use storefront_types::{
    Category, ErrorKind, Failure, OrderStore, Outcome, Product, ProductName, ProductStats,
    ProductStockStore,
};
use tracing::{error, instrument};

fn revenue_overflow(product: &ProductName) -> Failure {
    error!(%product, "[inventory.stats_by_product] revenue overflowed");
    Failure::new(
        ErrorKind::DatabaseError,
        format!("Revenue for product '{product}' cannot be represented."),
    )
    .with_subject(product.to_string())
}

/// Catalog listings and per-product sales statistics.
///
/// Listings report an empty result as `ListIsEmpty`; statistics report it as
/// an empty list. Callers that render both rely on the difference.
#[derive(Debug, Clone)]
pub struct InventoryQueryService<P, O> {
    products: P,
    orders: O,
}

impl<P, O> InventoryQueryService<P, O>
where
    P: ProductStockStore + Sync,
    O: OrderStore + Sync,
{
    /// Create a query service over the given stores.
    pub const fn new(products: P, orders: O) -> Self {
        Self { products, orders }
    }

    /// A single product, or `NotFound`.
    pub async fn product(&self, name: &ProductName) -> Outcome<Product> {
        self.products.get(name).await
    }

    /// The whole catalog, or `ListIsEmpty`.
    pub async fn products(&self) -> Outcome<Vec<Product>> {
        self.products.list_all().await
    }

    /// Products in `category`, or `ListIsEmpty`.
    pub async fn products_in(&self, category: &Category) -> Outcome<Vec<Product>> {
        self.products.list_by_category(category).await
    }

    /// Distinct categories, or `ListIsEmpty`.
    pub async fn categories(&self) -> Outcome<Vec<Category>> {
        self.products.categories().await
    }

    /// Units sold and revenue for every product, ordered by name.
    ///
    /// Every catalog product appears, with zeros if it never sold, as does
    /// every product that only survives in order history. Revenue uses the
    /// unit price captured on each order line.
    ///
    /// Fails with `DatabaseError` when a product's revenue does not fit in a
    /// `Decimal`.
    #[instrument(name = "inventory.stats_by_product", skip(self))]
    pub async fn stats_by_product(&self) -> Outcome<Vec<ProductStats>> {
        let lines = self.orders.order_lines().await?;
        let catalog = match self.products.list_all().await {
            Ok(products) => products,
            Err(failure) if failure.kind() == &ErrorKind::ListIsEmpty => Vec::new(),
            Err(failure) => return Err(failure),
        };

        let mut totals: BTreeMap<ProductName, (u64, Decimal)> = catalog
            .into_iter()
            .map(|product| (product.name, (0, Decimal::ZERO)))
            .collect();

        for line in lines {
            let revenue = line.line_total();
            let (units, total) = totals
                .entry(line.product.clone())
                .or_insert((0, Decimal::ZERO));
            *units = units.saturating_add(u64::from(line.quantity.into_inner()));
            *total = revenue
                .and_then(|revenue| total.checked_add(revenue))
                .ok_or_else(|| revenue_overflow(&line.product))?;
        }

        Ok(totals
            .into_iter()
            .map(|(product, (units_sold, revenue))| ProductStats {
                product,
                units_sold,
                revenue,
            })
            .collect())
    }
}
