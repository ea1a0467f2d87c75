use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use storefront_types::{
    Category, ErrorKind, Failure, ListingId, OrderQuantity, Outcome, Price, Product,
    ProductName, ProductStockStore, Reservation, StockLevel,
};
use tracing::{debug, instrument, warn};

/// A product together with its listing id and tombstone flag.
///
/// Deleting a product removes it from the index and marks the record, so a
/// caller that looked the record up before the delete still observes
/// `NotFound` once it acquires the lock.
#[derive(Debug)]
struct ProductRecord {
    listing: ListingId,
    product: Product,
    deleted: bool,
}

type SharedRecord = Arc<Mutex<ProductRecord>>;

/// Thread-safe in-memory catalog with per-product stock locks.
///
/// The index lock is held only long enough to look a record up. Every
/// read-modify-write of a product's stock happens under that product's own
/// mutex, so reservations against different products never contend.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<HashMap<ProductName, SharedRecord>>>,
    next_listing: Arc<AtomicU64>,
}

impl InMemoryProductStore {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, name: &ProductName) -> Outcome<SharedRecord> {
        self.products
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    fn snapshot(&self) -> Vec<Product> {
        let records: Vec<SharedRecord> = self.products.read().values().cloned().collect();
        let mut products: Vec<Product> = records
            .iter()
            .filter_map(|record| {
                let record = record.lock();
                (!record.deleted).then(|| record.product.clone())
            })
            .collect();
        products.sort_by(|left, right| left.name.cmp(&right.name));
        products
    }

    /// Apply `change` to a live record under its lock.
    fn modify<T>(
        &self,
        name: &ProductName,
        change: impl FnOnce(ListingId, &mut Product) -> Outcome<T>,
    ) -> Outcome<T> {
        let record = self.record(name)?;
        let mut record = record.lock();
        if record.deleted {
            return Err(not_found(name));
        }
        let listing = record.listing;
        change(listing, &mut record.product)
    }
}

fn not_found(name: &ProductName) -> Failure {
    Failure::new(ErrorKind::NotFound, format!("Product '{name}' not found."))
        .with_subject(name.to_string())
}

impl ProductStockStore for InMemoryProductStore {
    async fn register(&self, product: Product) -> Outcome<()> {
        let mut products = self.products.write();
        if products.contains_key(&product.name) {
            return Err(Failure::new(
                ErrorKind::AlreadyRegistered,
                format!("Product '{}' is already registered.", product.name),
            )
            .with_subject(product.name.to_string()));
        }

        let name = product.name.clone();
        let listing = ListingId::new(self.next_listing.fetch_add(1, Ordering::Relaxed));
        let _ = products.insert(
            name,
            Arc::new(Mutex::new(ProductRecord {
                listing,
                product,
                deleted: false,
            })),
        );
        Ok(())
    }

    async fn get(&self, name: &ProductName) -> Outcome<Product> {
        self.modify(name, |_, product| Ok(product.clone()))
    }

    async fn list_all(&self) -> Outcome<Vec<Product>> {
        let products = self.snapshot();
        if products.is_empty() {
            return Err(Failure::new(
                ErrorKind::ListIsEmpty,
                "There are no products in the catalog.",
            ));
        }
        Ok(products)
    }

    async fn list_by_category(&self, category: &Category) -> Outcome<Vec<Product>> {
        let products: Vec<Product> = self
            .snapshot()
            .into_iter()
            .filter(|product| &product.category == category)
            .collect();
        if products.is_empty() {
            return Err(Failure::new(
                ErrorKind::ListIsEmpty,
                format!("There are no products in category '{category}'."),
            )
            .with_subject(category.to_string()));
        }
        Ok(products)
    }

    async fn categories(&self) -> Outcome<Vec<Category>> {
        let categories: BTreeSet<Category> = self
            .snapshot()
            .into_iter()
            .map(|product| product.category)
            .collect();
        if categories.is_empty() {
            return Err(Failure::new(
                ErrorKind::ListIsEmpty,
                "There are no categories in the catalog.",
            ));
        }
        Ok(categories.into_iter().collect())
    }

    async fn set_price(&self, name: &ProductName, price: Price) -> Outcome<()> {
        self.modify(name, |_, product| {
            product.price = price;
            Ok(())
        })
    }

    async fn set_quantity(&self, name: &ProductName, quantity: StockLevel) -> Outcome<()> {
        self.modify(name, |_, product| {
            product.on_hand = quantity;
            Ok(())
        })
    }

    async fn delete(&self, name: &ProductName) -> Outcome<()> {
        let record = self
            .products
            .write()
            .remove(name)
            .ok_or_else(|| not_found(name))?;
        record.lock().deleted = true;
        Ok(())
    }

    #[instrument(
        name = "memory.try_reserve",
        skip(self, name, quantity),
        fields(product = %name, quantity = %quantity)
    )]
    async fn try_reserve(
        &self,
        name: &ProductName,
        quantity: OrderQuantity,
    ) -> Outcome<Reservation> {
        self.modify(name, |listing, product| match product.on_hand.try_take(quantity) {
            Some(remaining) => {
                product.on_hand = remaining;
                debug!(
                    remaining = %remaining,
                    %listing,
                    "[memory.try_reserve] stock reserved"
                );
                Ok(Reservation {
                    product: name.clone(),
                    listing,
                    quantity,
                    unit_price: product.price,
                })
            }
            None => Err(Failure::new(
                ErrorKind::InsufficientStock,
                format!(
                    "There is not enough stock of '{name}' ({} available, {quantity} requested).",
                    product.on_hand
                ),
            )
            .with_subject(name.to_string())),
        })
    }

    #[instrument(
        name = "memory.release",
        skip(self, reservation),
        fields(
            product = %reservation.product,
            listing = %reservation.listing,
            quantity = %reservation.quantity
        )
    )]
    async fn release(&self, reservation: &Reservation) -> Outcome<()> {
        let name = &reservation.product;
        self.modify(name, |listing, product| {
            // Same name, different registration: the reserved units are gone.
            if listing != reservation.listing {
                return Err(not_found(name));
            }
            product.on_hand = product.on_hand.restock(reservation.quantity);
            Ok(())
        })
        .inspect_err(|_| {
            warn!("[memory.release] product disappeared before its stock was released");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use storefront_types::OutcomeExt;

    fn name(raw: &str) -> ProductName {
        ProductName::try_new(raw).expect("valid product name")
    }

    fn quantity(value: u32) -> OrderQuantity {
        OrderQuantity::try_new(value).expect("positive quantity")
    }

    fn product(raw: &str, category: &str, stock: u32) -> Product {
        Product::new(
            name(raw),
            format!("{raw} description"),
            Category::try_new(category).expect("valid category"),
            Price::try_new(Decimal::new(250, 2)).expect("valid price"),
            StockLevel::new(stock),
        )
    }

    #[tokio::test]
    async fn register_rejects_duplicate_names() {
        let store = InMemoryProductStore::new();
        store
            .register(product("Lamp", "Home", 1))
            .await
            .expect("first registration succeeds");

        let duplicate = store.register(product("Lamp", "Garden", 9)).await;

        assert_eq!(duplicate.error_kind(), Some(&ErrorKind::AlreadyRegistered));
        assert_eq!(
            store.get(&name("Lamp")).await.value().category.as_ref(),
            "Home"
        );
    }

    #[tokio::test]
    async fn listings_report_empty_catalog() {
        let store = InMemoryProductStore::new();

        assert_eq!(
            store.list_all().await.error_kind(),
            Some(&ErrorKind::ListIsEmpty)
        );
        assert_eq!(
            store.categories().await.error_kind(),
            Some(&ErrorKind::ListIsEmpty)
        );
    }

    #[tokio::test]
    async fn categories_are_distinct_and_sorted() {
        let store = InMemoryProductStore::new();
        for item in [
            product("Lamp", "Home", 1),
            product("Rake", "Garden", 1),
            product("Rug", "Home", 1),
        ] {
            store.register(item).await.expect("registration succeeds");
        }

        let categories: Vec<String> = store
            .categories()
            .await
            .value()
            .into_iter()
            .map(|category| category.to_string())
            .collect();

        assert_eq!(categories, vec!["Garden".to_owned(), "Home".to_owned()]);
    }

    #[tokio::test]
    async fn try_reserve_rejects_overdraw_without_mutation() {
        let store = InMemoryProductStore::new();
        store
            .register(product("Lamp", "Home", 2))
            .await
            .expect("registration succeeds");

        let outcome = store.try_reserve(&name("Lamp"), quantity(3)).await;

        assert_eq!(outcome.error_kind(), Some(&ErrorKind::InsufficientStock));
        assert_eq!(
            store.get(&name("Lamp")).await.value().on_hand,
            StockLevel::new(2)
        );
    }

    #[tokio::test]
    async fn try_reserve_returns_current_price() {
        let store = InMemoryProductStore::new();
        store
            .register(product("Lamp", "Home", 2))
            .await
            .expect("registration succeeds");
        let new_price = Price::try_new(Decimal::new(999, 2)).expect("valid price");
        store
            .set_price(&name("Lamp"), new_price)
            .await
            .expect("price update succeeds");

        let reservation = store.try_reserve(&name("Lamp"), quantity(2)).await.value();

        assert_eq!(reservation.unit_price, new_price);
        assert_eq!(reservation.quantity, quantity(2));
        assert_eq!(
            store.get(&name("Lamp")).await.value().on_hand,
            StockLevel::new(0)
        );
    }

    #[tokio::test]
    async fn release_on_deleted_product_does_not_resurrect_it() {
        let store = InMemoryProductStore::new();
        store
            .register(product("Lamp", "Home", 2))
            .await
            .expect("registration succeeds");
        let reservation = store.try_reserve(&name("Lamp"), quantity(1)).await.value();
        store
            .delete(&name("Lamp"))
            .await
            .expect("delete succeeds");

        let outcome = store.release(&reservation).await;

        assert_eq!(outcome.error_kind(), Some(&ErrorKind::NotFound));
        assert_eq!(
            store.get(&name("Lamp")).await.error_kind(),
            Some(&ErrorKind::NotFound)
        );
    }

    #[tokio::test]
    async fn release_skips_a_product_registered_again_under_the_same_name() {
        let store = InMemoryProductStore::new();
        store
            .register(product("Lamp", "Home", 5))
            .await
            .expect("registration succeeds");
        let reservation = store.try_reserve(&name("Lamp"), quantity(3)).await.value();
        store
            .delete(&name("Lamp"))
            .await
            .expect("delete succeeds");
        store
            .register(product("Lamp", "Home", 1))
            .await
            .expect("name can be registered again");

        let outcome = store.release(&reservation).await;

        assert_eq!(outcome.error_kind(), Some(&ErrorKind::NotFound));
        assert_eq!(
            store.get(&name("Lamp")).await.value().on_hand,
            StockLevel::new(1)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reservations_never_oversell() {
        let store = InMemoryProductStore::new();
        store
            .register(product("Lamp", "Home", 10))
            .await
            .expect("registration succeeds");

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.try_reserve(&name("Lamp"), quantity(1)).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.expect("task completes").is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 10);
        assert_eq!(
            store.get(&name("Lamp")).await.value().on_hand,
            StockLevel::new(0)
        );
    }
}
