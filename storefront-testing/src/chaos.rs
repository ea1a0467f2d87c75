//! Fault injection for store implementations.
//!
//! [`ChaosStore`] wraps any store and turns selected operations into
//! `DatabaseError` failures, either always (probability 1.0) or at random
//! with a reproducible seed. The wrapped store is only called when no
//! failure is injected, so an injected failure never has side effects.

use std::fmt;
use std::sync::Mutex;

use nutype::nutype;
use rand::{Rng, SeedableRng, random, rngs::StdRng};
use storefront_types::{
    BillingDetails, BillingStore, BillingUpdate, Category, ErrorKind, Failure, NewOrder, Order,
    OrderId, OrderLine, OrderQuantity, OrderStore, Outcome, Price, Product, ProductName,
    ProductStockStore, Reservation, StockLevel, Username,
};

/// Probability value for chaos engineering injection rates.
///
/// Probability represents a value in the range [0.0, 1.0] where 0.0 means
/// never inject failures and 1.0 means always inject failures.
///
/// # Examples
///
/// ```ignore
/// use storefront_testing::chaos::Probability;
///
/// let never = Probability::try_new(0.0).unwrap();
/// let always = Probability::try_new(1.0).unwrap();
///
/// // Values outside [0.0, 1.0] are rejected
/// assert!(Probability::try_new(1.5).is_err());
/// ```
#[nutype(
    validate(greater_or_equal = 0.0, less_or_equal = 1.0),
    derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, Into)
)]
pub struct Probability(f32);

impl Probability {
    fn clamped(probability: f32) -> Self {
        Self::try_new(probability.clamp(0.0, 1.0)).expect("clamped value is always valid")
    }
}

/// Store operations that chaos can target independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChaosOperation {
    /// Catalog, order and billing reads, plus catalog administration.
    Other,
    /// `ProductStockStore::try_reserve`.
    Reserve,
    /// `ProductStockStore::release`.
    Release,
    /// `OrderStore::create`.
    CreateOrder,
}

impl fmt::Display for ChaosOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Other => "store_operation",
            Self::Reserve => "try_reserve",
            Self::Release => "release",
            Self::CreateOrder => "create_order",
        })
    }
}

/// Which operations fail, and how often.
#[derive(Debug, Clone)]
pub struct ChaosConfig {
    deterministic_seed: Option<u64>,
    failure_probability: Probability,
    reserve_failure_probability: Probability,
    release_failure_probability: Probability,
    create_failure_probability: Probability,
}

impl ChaosConfig {
    /// Seeded configuration: the same sequence of calls fails the same way
    /// on every run.
    pub fn deterministic() -> Self {
        Self {
            deterministic_seed: Some(0),
            ..Self::default()
        }
    }

    /// Use `seed` for the random source.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.deterministic_seed = Some(seed);
        self
    }

    /// Failure rate for every operation without a dedicated setting.
    #[must_use]
    pub fn with_failure_probability(mut self, probability: f32) -> Self {
        self.failure_probability = Probability::clamped(probability);
        self
    }

    /// Failure rate for stock reservations.
    #[must_use]
    pub fn with_reserve_failure_probability(mut self, probability: f32) -> Self {
        self.reserve_failure_probability = Probability::clamped(probability);
        self
    }

    /// Failure rate for compensating releases.
    #[must_use]
    pub fn with_release_failure_probability(mut self, probability: f32) -> Self {
        self.release_failure_probability = Probability::clamped(probability);
        self
    }

    /// Failure rate for order commits.
    #[must_use]
    pub fn with_create_failure_probability(mut self, probability: f32) -> Self {
        self.create_failure_probability = Probability::clamped(probability);
        self
    }

    const fn probability(&self, operation: ChaosOperation) -> Probability {
        match operation {
            ChaosOperation::Other => self.failure_probability,
            ChaosOperation::Reserve => self.reserve_failure_probability,
            ChaosOperation::Release => self.release_failure_probability,
            ChaosOperation::CreateOrder => self.create_failure_probability,
        }
    }
}

impl Default for ChaosConfig {
    fn default() -> Self {
        let never = Probability::clamped(0.0);
        Self {
            deterministic_seed: None,
            failure_probability: never,
            reserve_failure_probability: never,
            release_failure_probability: never,
            create_failure_probability: never,
        }
    }
}

/// Extension trait wrapping a store in a [`ChaosStore`].
pub trait ChaosStoreExt: Sized {
    /// Wrap `self` so the operations selected by `config` fail.
    fn with_chaos(self, config: ChaosConfig) -> ChaosStore<Self>;
}

impl<S> ChaosStoreExt for S {
    fn with_chaos(self, config: ChaosConfig) -> ChaosStore<Self> {
        ChaosStore::new(self, config)
    }
}

/// A store wrapper that injects `DatabaseError` failures.
#[derive(Debug)]
pub struct ChaosStore<S> {
    store: S,
    config: ChaosConfig,
    rng: Mutex<StdRng>,
}

impl<S> ChaosStore<S> {
    /// Wrap `store`.
    pub fn new(store: S, config: ChaosConfig) -> Self {
        let rng = match config.deterministic_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(random()),
        };

        Self {
            store,
            config,
            rng: Mutex::new(rng),
        }
    }

    /// The wrapped store, for inspecting state without chaos.
    pub const fn inner(&self) -> &S {
        &self.store
    }

    fn should_inject(&self, operation: ChaosOperation) -> bool {
        let probability: f32 = self.config.probability(operation).into();

        if probability <= 0.0 {
            return false;
        }

        if probability >= 1.0 {
            return true;
        }

        let mut rng = self
            .rng
            .lock()
            .expect("chaos RNG mutex should not be poisoned");

        rng.random_bool(f64::from(probability))
    }

    fn check(&self, operation: ChaosOperation, subject: &str) -> Outcome<()> {
        if self.should_inject(operation) {
            return Err(Failure::new(
                ErrorKind::DatabaseError,
                format!("injected failure during {operation}"),
            )
            .with_subject(subject));
        }
        Ok(())
    }
}

impl<S> ProductStockStore for ChaosStore<S>
where
    S: ProductStockStore + Send + Sync,
{
    async fn register(&self, product: Product) -> Outcome<()> {
        self.check(ChaosOperation::Other, product.name.as_ref())?;
        self.store.register(product).await
    }

    async fn get(&self, name: &ProductName) -> Outcome<Product> {
        self.check(ChaosOperation::Other, name.as_ref())?;
        self.store.get(name).await
    }

    async fn list_all(&self) -> Outcome<Vec<Product>> {
        self.check(ChaosOperation::Other, "catalog")?;
        self.store.list_all().await
    }

    async fn list_by_category(&self, category: &Category) -> Outcome<Vec<Product>> {
        self.check(ChaosOperation::Other, category.as_ref())?;
        self.store.list_by_category(category).await
    }

    async fn categories(&self) -> Outcome<Vec<Category>> {
        self.check(ChaosOperation::Other, "catalog")?;
        self.store.categories().await
    }

    async fn set_price(&self, name: &ProductName, price: Price) -> Outcome<()> {
        self.check(ChaosOperation::Other, name.as_ref())?;
        self.store.set_price(name, price).await
    }

    async fn set_quantity(&self, name: &ProductName, quantity: StockLevel) -> Outcome<()> {
        self.check(ChaosOperation::Other, name.as_ref())?;
        self.store.set_quantity(name, quantity).await
    }

    async fn delete(&self, name: &ProductName) -> Outcome<()> {
        self.check(ChaosOperation::Other, name.as_ref())?;
        self.store.delete(name).await
    }

    async fn try_reserve(
        &self,
        name: &ProductName,
        quantity: OrderQuantity,
    ) -> Outcome<Reservation> {
        self.check(ChaosOperation::Reserve, name.as_ref())?;
        self.store.try_reserve(name, quantity).await
    }

    async fn release(&self, reservation: &Reservation) -> Outcome<()> {
        self.check(ChaosOperation::Release, reservation.product.as_ref())?;
        self.store.release(reservation).await
    }
}

impl<S> OrderStore for ChaosStore<S>
where
    S: OrderStore + Send + Sync,
{
    async fn create(&self, order: NewOrder) -> Outcome<OrderId> {
        self.check(ChaosOperation::CreateOrder, order.buyer.as_ref())?;
        self.store.create(order).await
    }

    async fn list_for_user(&self, buyer: &Username) -> Outcome<Vec<Order>> {
        self.check(ChaosOperation::Other, buyer.as_ref())?;
        self.store.list_for_user(buyer).await
    }

    async fn order_lines(&self) -> Outcome<Vec<OrderLine>> {
        self.check(ChaosOperation::Other, "orders")?;
        self.store.order_lines().await
    }
}

impl<S> BillingStore for ChaosStore<S>
where
    S: BillingStore + Send + Sync,
{
    async fn billing_details(&self, user: &Username) -> Outcome<BillingDetails> {
        self.check(ChaosOperation::Other, user.as_ref())?;
        self.store.billing_details(user).await
    }

    async fn update_billing(
        &self,
        user: &Username,
        update: BillingUpdate,
    ) -> Outcome<BillingDetails> {
        self.check(ChaosOperation::Other, user.as_ref())?;
        self.store.update_billing(user, update).await
    }
}
