use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, query, query_scalar, Row};
use storefront_types::{
    Category, ErrorKind, Failure, ListingId, OrderQuantity, Outcome, Price, Product,
    ProductName, ProductStockStore, Reservation, StockLevel,
};
use tracing::{debug, instrument, warn};

use crate::{corrupt_row, map_sqlx_error, Operation, PostgresStore};

const PRODUCT_COLUMNS: &str = "name, description, category, price, quantity";

fn not_found(name: &ProductName) -> Failure {
    Failure::new(ErrorKind::NotFound, format!("Product '{name}' not found."))
        .with_subject(name.to_string())
}

fn found(name: &ProductName, rows_affected: u64) -> Outcome<()> {
    if rows_affected == 0 {
        return Err(not_found(name));
    }
    Ok(())
}

fn product_from_row(row: &PgRow) -> Outcome<Product> {
    let operation = Operation::ReadProducts;
    let decode = |error: sqlx::Error| map_sqlx_error(error, operation);

    let name: String = row.try_get("name").map_err(decode)?;
    let description: String = row.try_get("description").map_err(decode)?;
    let category: String = row.try_get("category").map_err(decode)?;
    let price: Decimal = row.try_get("price").map_err(decode)?;
    let quantity: i64 = row.try_get("quantity").map_err(decode)?;

    Ok(Product::new(
        ProductName::try_new(name).map_err(|error| corrupt_row(operation, "name", error))?,
        description,
        Category::try_new(category).map_err(|error| corrupt_row(operation, "category", error))?,
        Price::try_new(price).map_err(|error| corrupt_row(operation, "price", error))?,
        StockLevel::new(
            u32::try_from(quantity).map_err(|error| corrupt_row(operation, "quantity", error))?,
        ),
    ))
}

fn reservation_from_row(
    row: &PgRow,
    name: &ProductName,
    quantity: OrderQuantity,
) -> Outcome<Reservation> {
    let operation = Operation::ReserveStock;
    let decode = |error: sqlx::Error| map_sqlx_error(error, operation);

    let listing: i64 = row.try_get("listing").map_err(decode)?;
    let price: Decimal = row.try_get("price").map_err(decode)?;

    Ok(Reservation {
        product: name.clone(),
        listing: ListingId::new(
            u64::try_from(listing).map_err(|error| corrupt_row(operation, "listing", error))?,
        ),
        quantity,
        unit_price: Price::try_new(price).map_err(|error| corrupt_row(operation, "price", error))?,
    })
}

fn units(quantity: OrderQuantity) -> i64 {
    i64::from(quantity.into_inner())
}

impl PostgresStore {
    async fn fetch_products(&self, sql: &str, filter: Option<&str>) -> Outcome<Vec<Product>> {
        let statement = query(sql);
        let statement = match filter {
            Some(value) => statement.bind(value),
            None => statement,
        };
        let rows = statement
            .fetch_all(&self.pool)
            .await
            .map_err(|error| map_sqlx_error(error, Operation::ReadProducts))?;
        rows.iter().map(product_from_row).collect()
    }
}

impl ProductStockStore for PostgresStore {
    #[instrument(
        name = "postgres.register_product",
        skip(self, product),
        fields(product = %product.name)
    )]
    async fn register(&self, product: Product) -> Outcome<()> {
        let _ = query(
            "INSERT INTO products (name, description, category, price, quantity)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(product.name.as_ref())
        .bind(&product.description)
        .bind(product.category.as_ref())
        .bind(product.price.into_inner())
        .bind(i64::from(product.on_hand.into_inner()))
        .execute(&self.pool)
        .await
        .map_err(|error| match map_sqlx_error(error, Operation::RegisterProduct) {
            failure if failure.kind() == &ErrorKind::AlreadyRegistered => Failure::new(
                ErrorKind::AlreadyRegistered,
                format!("Product '{}' is already registered.", product.name),
            ),
            failure => failure,
        })
        .map_err(|failure| failure.with_subject(product.name.to_string()))?;
        Ok(())
    }

    async fn get(&self, name: &ProductName) -> Outcome<Product> {
        let row = query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE name = $1"
        ))
        .bind(name.as_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::ReadProducts))?
        .ok_or_else(|| not_found(name))?;
        product_from_row(&row)
    }

    async fn list_all(&self) -> Outcome<Vec<Product>> {
        let products = self
            .fetch_products(
                &format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name COLLATE \"C\""),
                None,
            )
            .await?;
        if products.is_empty() {
            return Err(Failure::new(
                ErrorKind::ListIsEmpty,
                "There are no products in the catalog.",
            ));
        }
        Ok(products)
    }

    async fn list_by_category(&self, category: &Category) -> Outcome<Vec<Product>> {
        let products = self
            .fetch_products(
                &format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = $1 \
                     ORDER BY name COLLATE \"C\""
                ),
                Some(category.as_ref()),
            )
            .await?;
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
        let raw: Vec<String> = query_scalar(
            "SELECT category FROM products GROUP BY category ORDER BY category COLLATE \"C\"",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, Operation::ReadProducts))?;

        if raw.is_empty() {
            return Err(Failure::new(
                ErrorKind::ListIsEmpty,
                "There are no categories in the catalog.",
            ));
        }
        raw.into_iter()
            .map(|category| {
                Category::try_new(category)
                    .map_err(|error| corrupt_row(Operation::ReadProducts, "category", error))
            })
            .collect()
    }

    async fn set_price(&self, name: &ProductName, price: Price) -> Outcome<()> {
        let result = query("UPDATE products SET price = $2 WHERE name = $1")
            .bind(name.as_ref())
            .bind(price.into_inner())
            .execute(&self.pool)
            .await
            .map_err(|error| map_sqlx_error(error, Operation::UpdateProduct))?;
        found(name, result.rows_affected())
    }

    async fn set_quantity(&self, name: &ProductName, quantity: StockLevel) -> Outcome<()> {
        let result = query("UPDATE products SET quantity = $2 WHERE name = $1")
            .bind(name.as_ref())
            .bind(i64::from(quantity.into_inner()))
            .execute(&self.pool)
            .await
            .map_err(|error| map_sqlx_error(error, Operation::UpdateProduct))?;
        found(name, result.rows_affected())
    }

    async fn delete(&self, name: &ProductName) -> Outcome<()> {
        let result = query("DELETE FROM products WHERE name = $1")
            .bind(name.as_ref())
            .execute(&self.pool)
            .await
            .map_err(|error| map_sqlx_error(error, Operation::DeleteProduct))?;
        found(name, result.rows_affected())
    }

    #[instrument(
        name = "postgres.try_reserve",
        skip(self, name, quantity),
        fields(product = %name, quantity = %quantity)
    )]
    async fn try_reserve(
        &self,
        name: &ProductName,
        quantity: OrderQuantity,
    ) -> Outcome<Reservation> {
        let reserved = query(
            "UPDATE products SET quantity = quantity - $2
             WHERE name = $1 AND quantity >= $2
             RETURNING listing, price",
        )
        .bind(name.as_ref())
        .bind(units(quantity))
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            map_sqlx_error(error, Operation::ReserveStock).with_subject(name.to_string())
        })?;

        if let Some(row) = reserved {
            debug!("[postgres.try_reserve] stock reserved");
            return reservation_from_row(&row, name, quantity);
        }

        // Nothing matched: either the product is gone or it is short.
        let available: Option<i64> = query_scalar("SELECT quantity FROM products WHERE name = $1")
            .bind(name.as_ref())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                map_sqlx_error(error, Operation::ReserveStock).with_subject(name.to_string())
            })?;

        match available {
            None => Err(not_found(name)),
            Some(available) => Err(Failure::new(
                ErrorKind::InsufficientStock,
                format!(
                    "There is not enough stock of '{name}' ({available} available, {quantity} requested)."
                ),
            )
            .with_subject(name.to_string())),
        }
    }

    #[instrument(
        name = "postgres.release",
        skip(self, reservation),
        fields(
            product = %reservation.product,
            listing = %reservation.listing,
            quantity = %reservation.quantity
        )
    )]
    async fn release(&self, reservation: &Reservation) -> Outcome<()> {
        let name = &reservation.product;
        // Ids beyond BIGINT were never issued by this database.
        let Ok(listing) = i64::try_from(reservation.listing.into_inner()) else {
            return Err(not_found(name));
        };
        let result = query(
            "UPDATE products SET quantity = LEAST(quantity + $2, 4294967295)
             WHERE listing = $1",
        )
        .bind(listing)
        .bind(units(reservation.quantity))
        .execute(&self.pool)
        .await
        .map_err(|error| {
            map_sqlx_error(error, Operation::ReleaseStock).with_subject(name.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!("[postgres.release] product disappeared before its stock was released");
            return Err(not_found(name));
        }
        Ok(())
    }
}
