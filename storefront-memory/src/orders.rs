use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use storefront_types::{
    ErrorKind, Failure, NewOrder, Order, OrderId, OrderLine, OrderStore, Outcome, Username,
};
use tracing::{info, instrument};

/// Thread-safe append-only order history.
///
/// A single write lock covers the push of an order with all of its lines,
/// so readers observe either the whole order or none of it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<Vec<Order>>>,
}

impl InMemoryOrderStore {
    /// Create a new store with no order history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed orders across every buyer.
    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    /// True when no order was ever committed.
    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }
}

impl OrderStore for InMemoryOrderStore {
    #[instrument(
        name = "memory.create_order",
        skip(self, order),
        fields(buyer = %order.buyer, line_count = order.lines.len())
    )]
    async fn create(&self, order: NewOrder) -> Outcome<OrderId> {
        if order.lines.is_empty() {
            return Err(Failure::new(
                ErrorKind::InvalidRegisterData,
                "An order needs at least one line.",
            )
            .with_subject(order.buyer.to_string()));
        }

        let id = OrderId::generate();
        let NewOrder {
            buyer,
            lines,
            shipping,
        } = order;

        self.orders.write().push(Order {
            id,
            buyer,
            placed_at: Utc::now(),
            lines,
            shipping,
        });

        info!(order_id = %id, "[memory.create_order] order committed");
        Ok(id)
    }

    async fn list_for_user(&self, buyer: &Username) -> Outcome<Vec<Order>> {
        let orders: Vec<Order> = self
            .orders
            .read()
            .iter()
            .filter(|order| &order.buyer == buyer)
            .cloned()
            .collect();

        if orders.is_empty() {
            return Err(Failure::new(
                ErrorKind::UserHasNoOrders,
                format!("User '{buyer}' has not placed any orders."),
            )
            .with_subject(buyer.to_string()));
        }
        Ok(orders)
    }

    async fn order_lines(&self) -> Outcome<Vec<OrderLine>> {
        Ok(self
            .orders
            .read()
            .iter()
            .flat_map(|order| order.lines.iter().cloned())
            .collect())
    }
}
