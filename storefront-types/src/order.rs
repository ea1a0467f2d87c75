use crate::billing::ShippingSnapshot;
use crate::catalog::{Price, ProductName};
use crate::outcome::{ErrorKind, Failure, Outcome};
use crate::validation::no_control_characters;
use chrono::{DateTime, Utc};
use nutype::nutype;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::future::Future;
use uuid::Uuid;

/// Validated account name of a buyer.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 64, predicate = no_control_characters),
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
pub struct Username(String);

/// Globally unique order identifier using UUIDv7 format.
///
/// UUIDv7 gives time-ordered identifiers, so orders created in sequence sort
/// in creation order.
#[nutype(
    validate(predicate = |id: &Uuid| id.get_version() == Some(uuid::Version::SortRand)),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Generate a fresh identifier for the current instant.
    pub fn generate() -> Self {
        Self::try_new(Uuid::now_v7()).expect("Uuid::now_v7() should always return a valid v7 UUID")
    }
}

/// Number of units requested on one order line. Always at least 1.
#[nutype(
    validate(greater = 0),
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
        Deserialize,
        TryFrom
    )
)]
pub struct OrderQuantity(u32);

/// One persisted line of an order.
///
/// The unit price is copied at reservation time, so later price changes never
/// alter historical orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Product the line refers to.
    pub product: ProductName,
    /// Units ordered.
    pub quantity: OrderQuantity,
    /// Unit price captured when the stock was reserved.
    pub unit_price: Price,
}

impl OrderLine {
    /// Price of the whole line, or `None` when it overflows a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.line_total(self.quantity)
    }
}

fn sum_lines(lines: &[OrderLine]) -> Option<Decimal> {
    lines.iter().try_fold(Decimal::ZERO, |total, line| {
        total.checked_add(line.line_total()?)
    })
}

/// An order ready to be persisted by [`OrderStore::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Owning user.
    pub buyer: Username,
    /// Non-empty list of lines in the order the buyer requested them.
    pub lines: Vec<OrderLine>,
    /// Shipping details copied from the buyer's billing record, if any.
    pub shipping: Option<ShippingSnapshot>,
}

impl NewOrder {
    /// Sum of every line total, or `None` when it overflows a `Decimal`.
    pub fn total(&self) -> Option<Decimal> {
        sum_lines(&self.lines)
    }
}

/// A committed order. Orders are append-only history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Generated identifier.
    pub id: OrderId,
    /// Owning user.
    pub buyer: Username,
    /// Commit time.
    pub placed_at: DateTime<Utc>,
    /// Persisted lines, in request order.
    pub lines: Vec<OrderLine>,
    /// Shipping details captured at placement.
    pub shipping: Option<ShippingSnapshot>,
}

impl Order {
    /// Sum of every line total, or `None` when it overflows a `Decimal`.
    pub fn total(&self) -> Option<Decimal> {
        sum_lines(&self.lines)
    }
}

/// Read-side view of an order handed to presentation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    /// Order identifier.
    pub id: OrderId,
    /// Commit time.
    pub placed_at: DateTime<Utc>,
    /// Lines as persisted.
    pub lines: Vec<OrderLine>,
    /// Sum of every line total.
    pub total: Decimal,
    /// Shipping details captured at placement.
    pub shipping: Option<ShippingSnapshot>,
}

impl TryFrom<Order> for OrderSummary {
    type Error = Failure;

    /// Fails with `DatabaseError` when the stored lines add up to more than a
    /// `Decimal` can hold.
    fn try_from(order: Order) -> Outcome<Self> {
        let total = order.total().ok_or_else(|| {
            Failure::new(
                ErrorKind::DatabaseError,
                format!("The total of order {} cannot be represented.", order.id),
            )
            .with_subject(order.id.to_string())
        })?;
        Ok(Self {
            id: order.id,
            placed_at: order.placed_at,
            lines: order.lines,
            total,
            shipping: order.shipping,
        })
    }
}

/// Contract for order persistence.
///
/// Orders are written once and never updated. `create` must be all-or-nothing:
/// a header without its lines, or a subset of lines, is never observable.
pub trait OrderStore {
    /// Persist the header and every line as one durable unit.
    ///
    /// Returns the generated identifier, or `DatabaseError`.
    fn create(&self, order: NewOrder) -> impl Future<Output = Outcome<OrderId>> + Send;

    /// Orders placed by `buyer`, oldest first, or `UserHasNoOrders`.
    fn list_for_user(&self, buyer: &Username) -> impl Future<Output = Outcome<Vec<Order>>> + Send;

    /// Every persisted order line across all buyers. An empty history is `Ok`.
    fn order_lines(&self) -> impl Future<Output = Outcome<Vec<OrderLine>>> + Send;
}

/// Blanket implementation allowing OrderStore to work with references.
impl<T: OrderStore + Sync> OrderStore for &T {
    async fn create(&self, order: NewOrder) -> Outcome<OrderId> {
        (*self).create(order).await
    }

    async fn list_for_user(&self, buyer: &Username) -> Outcome<Vec<Order>> {
        (*self).list_for_user(buyer).await
    }

    async fn order_lines(&self) -> Outcome<Vec<OrderLine>> {
        (*self).order_lines().await
    }
}
