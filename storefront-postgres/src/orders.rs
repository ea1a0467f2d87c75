use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, query, types::Json, Row};
use storefront_types::{
    ErrorKind, Failure, NewOrder, Order, OrderId, OrderLine, OrderQuantity, OrderStore, Outcome,
    Price, ProductName, ShippingSnapshot, Username,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{corrupt_row, map_sqlx_error, Operation, PostgresStore};

fn line_from_row(row: &PgRow) -> Outcome<OrderLine> {
    let operation = Operation::ReadOrders;
    let decode = |error: sqlx::Error| map_sqlx_error(error, operation);

    let product: String = row.try_get("product").map_err(decode)?;
    let quantity: i64 = row.try_get("quantity").map_err(decode)?;
    let unit_price: Decimal = row.try_get("unit_price").map_err(decode)?;

    let quantity = u32::try_from(quantity)
        .map_err(|error| corrupt_row(operation, "quantity", error))
        .and_then(|quantity| {
            OrderQuantity::try_new(quantity)
                .map_err(|error| corrupt_row(operation, "quantity", error))
        })?;

    Ok(OrderLine {
        product: ProductName::try_new(product)
            .map_err(|error| corrupt_row(operation, "product", error))?,
        quantity,
        unit_price: Price::try_new(unit_price)
            .map_err(|error| corrupt_row(operation, "unit_price", error))?,
    })
}

/// Order header columns of a joined history row.
fn header_from_row(row: &PgRow) -> Outcome<(OrderId, DateTime<Utc>, Option<ShippingSnapshot>)> {
    let operation = Operation::ReadOrders;
    let decode = |error: sqlx::Error| map_sqlx_error(error, operation);

    let id: Uuid = row.try_get("id").map_err(decode)?;
    let placed_at: DateTime<Utc> = row.try_get("placed_at").map_err(decode)?;
    let shipping: Option<Json<ShippingSnapshot>> = row.try_get("shipping").map_err(decode)?;

    let id = OrderId::try_new(id).map_err(|error| corrupt_row(operation, "id", error))?;
    Ok((id, placed_at, shipping.map(|Json(snapshot)| snapshot)))
}

impl OrderStore for PostgresStore {
    #[instrument(
        name = "postgres.create_order",
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
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| map_sqlx_error(error, Operation::BeginTransaction))?;

        let _ = query(
            "INSERT INTO orders (id, buyer, placed_at, shipping)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id.into_inner())
        .bind(order.buyer.as_ref())
        .bind(Utc::now())
        .bind(order.shipping.as_ref().map(Json))
        .execute(&mut *tx)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::InsertOrder))?;

        for (line_no, line) in (0_i32..).zip(&order.lines) {
            let _ = query(
                "INSERT INTO order_lines (order_id, line_no, product, quantity, unit_price)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id.into_inner())
            .bind(line_no)
            .bind(line.product.as_ref())
            .bind(i64::from(line.quantity.into_inner()))
            .bind(line.unit_price.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(|error| map_sqlx_error(error, Operation::InsertOrder))?;
        }

        tx.commit()
            .await
            .map_err(|error| map_sqlx_error(error, Operation::CommitTransaction))?;

        info!(order_id = %id, "[postgres.create_order] order committed");
        Ok(id)
    }

    #[instrument(name = "postgres.list_orders", skip(self))]
    async fn list_for_user(&self, buyer: &Username) -> Outcome<Vec<Order>> {
        let rows = query(
            "SELECT o.id, o.placed_at, o.shipping, l.product, l.quantity, l.unit_price
             FROM orders o
             JOIN order_lines l ON l.order_id = o.id
             WHERE o.buyer = $1
             ORDER BY o.placed_at, o.id, l.line_no",
        )
        .bind(buyer.as_ref())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::ReadOrders))?;

        let mut orders: Vec<Order> = Vec::new();
        for row in &rows {
            let (id, placed_at, shipping) = header_from_row(row)?;
            let line = line_from_row(row)?;
            match orders.last_mut() {
                Some(order) if order.id == id => order.lines.push(line),
                _ => orders.push(Order {
                    id,
                    buyer: buyer.clone(),
                    placed_at,
                    lines: vec![line],
                    shipping,
                }),
            }
        }

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
        let rows = query(
            "SELECT product, quantity, unit_price FROM order_lines ORDER BY order_id, line_no",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::ReadOrders))?;
        rows.iter().map(line_from_row).collect()
    }
}
