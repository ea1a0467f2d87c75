use crate::order::OrderQuantity;
use crate::outcome::Outcome;
use crate::validation::no_control_characters;
use nutype::nutype;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Unique business key of a product.
///
/// ProductName uses nutype for construction-time validation ensuring names are:
/// - Non-empty (trimmed strings with at least 1 character)
/// - Within reasonable length (max 255 characters)
/// - Free of control characters
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255, predicate = no_control_characters),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize,
        TryFrom
    )
)]
pub struct ProductName(String);

/// Catalog category a product is listed under.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255, predicate = no_control_characters),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize,
        TryFrom
    )
)]
pub struct Category(String);

/// Unit price of a product. Never negative.
#[nutype(
    validate(predicate = |price: &Decimal| *price >= Decimal::ZERO),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Display,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct Price(Decimal);

impl Price {
    /// Price of `quantity` units at this unit price, or `None` when the
    /// result does not fit in a `Decimal`.
    pub fn line_total(self, quantity: OrderQuantity) -> Option<Decimal> {
        self.into_inner()
            .checked_mul(Decimal::from(quantity.into_inner()))
    }
}

/// Identity of one registration of a product.
///
/// Names can be reused after a delete; the listing id cannot. Stores assign
/// a fresh id on every [`ProductStockStore::register`].
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    Into,
    Serialize,
    Deserialize
))]
pub struct ListingId(u64);

/// Quantity of a product currently on hand.
///
/// Backed by an unsigned integer, so a stock level below zero cannot be
/// represented. Decrements go through [`StockLevel::try_take`], which refuses
/// to underflow.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    Into,
    Serialize,
    Deserialize
))]
pub struct StockLevel(u32);

impl StockLevel {
    /// Remove `quantity` units, or `None` when fewer are on hand.
    pub fn try_take(self, quantity: OrderQuantity) -> Option<Self> {
        self.into_inner()
            .checked_sub(quantity.into_inner())
            .map(Self::new)
    }

    /// Put `quantity` units back on the shelf.
    #[must_use]
    pub fn restock(self, quantity: OrderQuantity) -> Self {
        Self::new(self.into_inner().saturating_add(quantity.into_inner()))
    }
}

/// A catalog entry together with its current stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Business key.
    pub name: ProductName,
    /// Free-form description shown in listings.
    pub description: String,
    /// Category used for filtered listings.
    pub category: Category,
    /// Current unit price.
    pub price: Price,
    /// Units available for reservation.
    pub on_hand: StockLevel,
}

impl Product {
    /// Assemble a product from validated parts.
    pub fn new(
        name: ProductName,
        description: impl Into<String>,
        category: Category,
        price: Price,
        on_hand: StockLevel,
    ) -> Self {
        Self {
            name,
            description: description.into(),
            category,
            price,
            on_hand,
        }
    }
}

/// Units taken from one listing by [`ProductStockStore::try_reserve`].
///
/// Handing the reservation back to [`ProductStockStore::release`] returns the
/// units to the same listing and to no other, even if the name has since been
/// registered again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    /// Product the units were taken from.
    pub product: ProductName,
    /// Registration the units were taken from.
    pub listing: ListingId,
    /// Units taken.
    pub quantity: OrderQuantity,
    /// Unit price in effect when the units were taken.
    pub unit_price: Price,
}

/// Sales figures for one product across every historical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStats {
    /// Product the figures belong to.
    pub product: ProductName,
    /// Total units sold.
    pub units_sold: u64,
    /// Sum of `quantity × unit price at order time`.
    pub revenue: Decimal,
}

/// Contract for product and stock persistence.
///
/// The store owns per-product price and quantity-on-hand. Besides plain CRUD it
/// exposes the two primitives the placement engine is built on:
///
/// 1. [`try_reserve`](Self::try_reserve): atomic check-and-decrement
/// 2. [`release`](Self::release): compensating increment used for rollback
///
/// Both must be linearizable per product: two concurrent reservations against
/// the same product never both succeed if their combined quantity exceeds the
/// stock. Operations on different products must not block each other.
///
/// Implementations include:
/// - `storefront-memory`: per-product mutexes
/// - `storefront-postgres`: conditional `UPDATE` statements
pub trait ProductStockStore {
    /// Register a new product.
    ///
    /// Returns `AlreadyRegistered` when a product with the same name exists.
    fn register(&self, product: Product) -> impl Future<Output = Outcome<()>> + Send;

    /// Snapshot of a single product, or `NotFound`.
    fn get(&self, name: &ProductName) -> impl Future<Output = Outcome<Product>> + Send;

    /// Every registered product, or `ListIsEmpty`.
    fn list_all(&self) -> impl Future<Output = Outcome<Vec<Product>>> + Send;

    /// Products in `category`, or `ListIsEmpty`.
    fn list_by_category(
        &self,
        category: &Category,
    ) -> impl Future<Output = Outcome<Vec<Product>>> + Send;

    /// Distinct categories of registered products, or `ListIsEmpty`.
    fn categories(&self) -> impl Future<Output = Outcome<Vec<Category>>> + Send;

    /// Change the unit price of an existing product.
    fn set_price(
        &self,
        name: &ProductName,
        price: Price,
    ) -> impl Future<Output = Outcome<()>> + Send;

    /// Overwrite the quantity on hand of an existing product.
    fn set_quantity(
        &self,
        name: &ProductName,
        quantity: StockLevel,
    ) -> impl Future<Output = Outcome<()>> + Send;

    /// Remove a product from the catalog.
    ///
    /// Historical order lines keep their copied product name and price.
    fn delete(&self, name: &ProductName) -> impl Future<Output = Outcome<()>> + Send;

    /// Atomically reserve `quantity` units.
    ///
    /// Re-reads the current stock; when `quantity` exceeds it, returns
    /// `InsufficientStock` without mutating anything. Otherwise decrements the
    /// stock and returns a [`Reservation`] carrying the listing the units came
    /// from and the unit price in effect at the moment of reservation.
    fn try_reserve(
        &self,
        name: &ProductName,
        quantity: OrderQuantity,
    ) -> impl Future<Output = Outcome<Reservation>> + Send;

    /// Return the units of `reservation` to the listing they came from.
    ///
    /// Returns `NotFound` if that listing was deleted in the meantime, even
    /// when a new product has since been registered under the same name. A
    /// deleted product is never resurrected by a release.
    fn release(&self, reservation: &Reservation) -> impl Future<Output = Outcome<()>> + Send;
}

/// Blanket implementation allowing ProductStockStore to work with references.
///
/// This lets the placement engine borrow stores owned elsewhere instead of
/// forcing callers to clone or move them.
impl<T: ProductStockStore + Sync> ProductStockStore for &T {
    async fn register(&self, product: Product) -> Outcome<()> {
        (*self).register(product).await
    }

    async fn get(&self, name: &ProductName) -> Outcome<Product> {
        (*self).get(name).await
    }

    async fn list_all(&self) -> Outcome<Vec<Product>> {
        (*self).list_all().await
    }

    async fn list_by_category(&self, category: &Category) -> Outcome<Vec<Product>> {
        (*self).list_by_category(category).await
    }

    async fn categories(&self) -> Outcome<Vec<Category>> {
        (*self).categories().await
    }

    async fn set_price(&self, name: &ProductName, price: Price) -> Outcome<()> {
        (*self).set_price(name, price).await
    }

    async fn set_quantity(&self, name: &ProductName, quantity: StockLevel) -> Outcome<()> {
        (*self).set_quantity(name, quantity).await
    }

    async fn delete(&self, name: &ProductName) -> Outcome<()> {
        (*self).delete(name).await
    }

    async fn try_reserve(
        &self,
        name: &ProductName,
        quantity: OrderQuantity,
    ) -> Outcome<Reservation> {
        (*self).try_reserve(name, quantity).await
    }

    async fn release(&self, reservation: &Reservation) -> Outcome<()> {
        (*self).release(reservation).await
    }
}
