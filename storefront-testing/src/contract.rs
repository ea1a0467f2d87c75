//! Behavioural contract every store backend must satisfy.
//!
//! Each `test_*` function builds a fresh store through `make_store`, runs one
//! scenario and reports the first violated expectation. Names are suffixed
//! with a UUID so scenarios can run in parallel against a shared database.
//! The `*_contract_tests!` macros expand to one `#[tokio::test]` per
//! scenario.

use std::fmt;

use rust_decimal::Decimal;
use storefront_types::{
    BillingStore, BillingUpdate, Category, ErrorKind, Failure, NewOrder, OrderLine, OrderQuantity,
    OrderStore, Price, Product, ProductName, ProductStockStore, ShippingSnapshot, StockLevel,
    Username,
};
use uuid::Uuid;

/// A violated contract expectation.
#[derive(Debug)]
pub struct ContractTestFailure {
    scenario: &'static str,
    detail: String,
}

impl ContractTestFailure {
    fn new(scenario: &'static str, detail: impl Into<String>) -> Self {
        Self {
            scenario,
            detail: detail.into(),
        }
    }

    fn store_error(scenario: &'static str, operation: &'static str, error: &Failure) -> Self {
        Self::new(
            scenario,
            format!(
                "{operation} operation returned unexpected error ({:?}): {error}",
                error.kind()
            ),
        )
    }

    fn assertion(scenario: &'static str, detail: impl Into<String>) -> Self {
        Self::new(scenario, detail)
    }
}

impl fmt::Display for ContractTestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.scenario, self.detail)
    }
}

impl std::error::Error for ContractTestFailure {}

/// Result of one contract scenario.
pub type ContractTestResult = Result<(), ContractTestFailure>;

fn unique(scenario: &'static str, label: &str) -> String {
    format!("contract-{scenario}-{label}-{}", Uuid::now_v7().simple())
}

fn contract_product_name(
    scenario: &'static str,
    label: &str,
) -> Result<ProductName, ContractTestFailure> {
    let raw = unique(scenario, label);
    ProductName::try_new(raw.clone()).map_err(|error| {
        ContractTestFailure::assertion(
            scenario,
            format!("unable to construct product name `{raw}`: {error}"),
        )
    })
}

fn contract_category(scenario: &'static str) -> Result<Category, ContractTestFailure> {
    let raw = unique(scenario, "category");
    Category::try_new(raw.clone()).map_err(|error| {
        ContractTestFailure::assertion(
            scenario,
            format!("unable to construct category `{raw}`: {error}"),
        )
    })
}

fn contract_username(scenario: &'static str) -> Result<Username, ContractTestFailure> {
    // Usernames are capped at 64 characters, so the scenario name is left out.
    let raw = format!("buyer-{}", Uuid::now_v7().simple());
    Username::try_new(raw.clone()).map_err(|error| {
        ContractTestFailure::assertion(
            scenario,
            format!("unable to construct username `{raw}`: {error}"),
        )
    })
}

fn quantity(scenario: &'static str, value: u32) -> Result<OrderQuantity, ContractTestFailure> {
    OrderQuantity::try_new(value).map_err(|error| {
        ContractTestFailure::assertion(scenario, format!("invalid quantity {value}: {error}"))
    })
}

fn price(scenario: &'static str, cents: i64) -> Result<Price, ContractTestFailure> {
    Price::try_new(Decimal::new(cents, 2)).map_err(|error| {
        ContractTestFailure::assertion(scenario, format!("invalid price {cents}: {error}"))
    })
}

async fn register_product<S: ProductStockStore>(
    scenario: &'static str,
    store: &S,
    category: &Category,
    label: &str,
    stock: u32,
) -> Result<ProductName, ContractTestFailure> {
    let name = contract_product_name(scenario, label)?;
    let product = Product::new(
        name.clone(),
        "contract product",
        category.clone(),
        price(scenario, 1_000)?,
        StockLevel::new(stock),
    );
    store
        .register(product)
        .await
        .map_err(|error| ContractTestFailure::store_error(scenario, "register", &error))?;
    Ok(name)
}

async fn stock_of<S: ProductStockStore>(
    scenario: &'static str,
    store: &S,
    name: &ProductName,
) -> Result<u32, ContractTestFailure> {
    store
        .get(name)
        .await
        .map(|product| product.on_hand.into_inner())
        .map_err(|error| ContractTestFailure::store_error(scenario, "get", &error))
}

fn expect_kind<T>(
    scenario: &'static str,
    operation: &'static str,
    outcome: Result<T, Failure>,
    expected: ErrorKind,
) -> ContractTestResult {
    match outcome {
        Err(failure) if failure.kind() == &expected => Ok(()),
        Err(failure) => Err(ContractTestFailure::store_error(
            scenario, operation, &failure,
        )),
        Ok(_) => Err(ContractTestFailure::assertion(
            scenario,
            format!("expected {operation} to fail with {expected} but it succeeded"),
        )),
    }
}

fn expect_stock(scenario: &'static str, observed: u32, expected: u32) -> ContractTestResult {
    if observed == expected {
        return Ok(());
    }
    Err(ContractTestFailure::assertion(
        scenario,
        format!("expected {expected} units on hand, observed {observed}"),
    ))
}

/// A registered product can be read back, and its name cannot be reused.
pub async fn test_register_and_get<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: ProductStockStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "register_and_get";

    let store = make_store();
    let category = contract_category(SCENARIO)?;
    let name = register_product(SCENARIO, &store, &category, "lamp", 4).await?;

    let product = store
        .get(&name)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "get", &error))?;
    if product.category != category || product.on_hand != StockLevel::new(4) {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            format!("read back a different product: {product:?}"),
        ));
    }

    let duplicate = Product::new(
        name,
        "duplicate",
        category,
        price(SCENARIO, 1)?,
        StockLevel::new(1),
    );
    expect_kind(
        SCENARIO,
        "register",
        store.register(duplicate).await,
        ErrorKind::AlreadyRegistered,
    )
}

/// Unknown products are reported as `NotFound` by every per-product operation.
pub async fn test_missing_product_reports_not_found<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: ProductStockStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "missing_product_reports_not_found";

    let store = make_store();
    let name = contract_product_name(SCENARIO, "ghost")?;
    let one = quantity(SCENARIO, 1)?;

    expect_kind(SCENARIO, "get", store.get(&name).await, ErrorKind::NotFound)?;
    expect_kind(
        SCENARIO,
        "try_reserve",
        store.try_reserve(&name, one).await,
        ErrorKind::NotFound,
    )?;
    expect_kind(
        SCENARIO,
        "set_price",
        store.set_price(&name, price(SCENARIO, 100)?).await,
        ErrorKind::NotFound,
    )?;
    expect_kind(
        SCENARIO,
        "delete",
        store.delete(&name).await,
        ErrorKind::NotFound,
    )
}

/// Category listings contain exactly the products registered under it.
pub async fn test_category_listing<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: ProductStockStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "category_listing";

    let store = make_store();
    let category = contract_category(SCENARIO)?;

    expect_kind(
        SCENARIO,
        "list_by_category",
        store.list_by_category(&category).await,
        ErrorKind::ListIsEmpty,
    )?;

    let first = register_product(SCENARIO, &store, &category, "first", 1).await?;
    let second = register_product(SCENARIO, &store, &category, "second", 1).await?;

    let listed = store
        .list_by_category(&category)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "list_by_category", &error))?;
    let names: Vec<&ProductName> = listed.iter().map(|product| &product.name).collect();
    if names.len() != 2 || !names.contains(&&first) || !names.contains(&&second) {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            format!("expected exactly the two registered products, observed {names:?}"),
        ));
    }

    let categories = store
        .categories()
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "categories", &error))?;
    if !categories.contains(&category) {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            "categories() does not include a category with registered products",
        ));
    }

    Ok(())
}

/// A reservation larger than the stock is refused and changes nothing.
pub async fn test_reserve_rejects_overdraw<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: ProductStockStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "reserve_rejects_overdraw";

    let store = make_store();
    let category = contract_category(SCENARIO)?;
    let name = register_product(SCENARIO, &store, &category, "scarce", 2).await?;

    expect_kind(
        SCENARIO,
        "try_reserve",
        store.try_reserve(&name, quantity(SCENARIO, 3)?).await,
        ErrorKind::InsufficientStock,
    )?;

    expect_stock(SCENARIO, stock_of(SCENARIO, &store, &name).await?, 2)
}

/// A reservation decrements stock and reports the price in effect; releasing
/// it puts the units back.
pub async fn test_reserve_and_release<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: ProductStockStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "reserve_and_release";

    let store = make_store();
    let category = contract_category(SCENARIO)?;
    let name = register_product(SCENARIO, &store, &category, "lamp", 5).await?;
    let new_price = price(SCENARIO, 1_999)?;
    store
        .set_price(&name, new_price)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "set_price", &error))?;

    let reservation = store
        .try_reserve(&name, quantity(SCENARIO, 3)?)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "try_reserve", &error))?;
    if reservation.unit_price != new_price {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            format!(
                "reservation reported price {}, expected {new_price}",
                reservation.unit_price
            ),
        ));
    }
    if reservation.product != name || reservation.quantity.into_inner() != 3 {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            format!("reservation does not describe the request: {reservation:?}"),
        ));
    }
    expect_stock(SCENARIO, stock_of(SCENARIO, &store, &name).await?, 2)?;

    store
        .release(&reservation)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "release", &error))?;

    expect_stock(SCENARIO, stock_of(SCENARIO, &store, &name).await?, 5)
}

/// Releasing stock of a deleted product reports `NotFound` and leaves the
/// product deleted.
pub async fn test_release_after_delete<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: ProductStockStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "release_after_delete";

    let store = make_store();
    let category = contract_category(SCENARIO)?;
    let name = register_product(SCENARIO, &store, &category, "doomed", 2).await?;
    let one = quantity(SCENARIO, 1)?;

    let reservation = store
        .try_reserve(&name, one)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "try_reserve", &error))?;
    store
        .delete(&name)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "delete", &error))?;

    expect_kind(
        SCENARIO,
        "release",
        store.release(&reservation).await,
        ErrorKind::NotFound,
    )?;
    expect_kind(SCENARIO, "get", store.get(&name).await, ErrorKind::NotFound)
}

/// A release never reaches a product registered again under the name of the
/// one the units came from.
pub async fn test_release_after_reregister<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: ProductStockStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "release_after_reregister";

    let store = make_store();
    let category = contract_category(SCENARIO)?;
    let name = register_product(SCENARIO, &store, &category, "reused", 5).await?;

    let reservation = store
        .try_reserve(&name, quantity(SCENARIO, 3)?)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "try_reserve", &error))?;
    store
        .delete(&name)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "delete", &error))?;
    store
        .register(Product::new(
            name.clone(),
            "successor",
            category.clone(),
            price(SCENARIO, 500)?,
            StockLevel::new(1),
        ))
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "register", &error))?;

    expect_kind(
        SCENARIO,
        "release",
        store.release(&reservation).await,
        ErrorKind::NotFound,
    )?;
    expect_stock(SCENARIO, stock_of(SCENARIO, &store, &name).await?, 1)
}

/// Concurrent reservations against one product never oversell it.
pub async fn test_concurrent_reservations<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: ProductStockStore + Clone + Send + Sync + 'static,
{
    const SCENARIO: &str = "concurrent_reservations";
    const STOCK: u32 = 8;
    const CONTENDERS: usize = 24;

    let store = make_store();
    let category = contract_category(SCENARIO)?;
    let name = register_product(SCENARIO, &store, &category, "hot", STOCK).await?;
    let one = quantity(SCENARIO, 1)?;

    let mut handles = Vec::with_capacity(CONTENDERS);
    for _ in 0..CONTENDERS {
        let store = store.clone();
        let name = name.clone();
        handles.push(tokio::spawn(
            async move { store.try_reserve(&name, one).await },
        ));
    }

    let mut granted = 0_u32;
    for handle in handles {
        let outcome = handle.await.map_err(|error| {
            ContractTestFailure::assertion(SCENARIO, format!("reservation task panicked: {error}"))
        })?;
        match outcome {
            Ok(_) => granted += 1,
            Err(failure) if failure.kind() == &ErrorKind::InsufficientStock => {}
            Err(failure) => {
                return Err(ContractTestFailure::store_error(
                    SCENARIO,
                    "try_reserve",
                    &failure,
                ));
            }
        }
    }

    if granted != STOCK {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            format!("expected {STOCK} granted reservations, observed {granted}"),
        ));
    }
    expect_stock(SCENARIO, stock_of(SCENARIO, &store, &name).await?, 0)
}

fn contract_order(
    scenario: &'static str,
    buyer: &Username,
    labels: &[(&str, u32)],
) -> Result<NewOrder, ContractTestFailure> {
    let lines = labels
        .iter()
        .map(|(label, units)| -> Result<OrderLine, ContractTestFailure> {
            Ok(OrderLine {
                product: contract_product_name(scenario, label)?,
                quantity: quantity(scenario, *units)?,
                unit_price: price(scenario, 250)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NewOrder {
        buyer: buyer.clone(),
        lines,
        shipping: Some(ShippingSnapshot {
            address: Some("1 Contract Way".to_owned()),
            city: Some("Testville".to_owned()),
            country: None,
            postal_code: Some("00000".to_owned()),
        }),
    })
}

/// A created order is listed for its buyer with every line and its shipping
/// snapshot intact.
pub async fn test_order_round_trip<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "order_round_trip";

    let store = make_store();
    let buyer = contract_username(SCENARIO)?;
    let order = contract_order(SCENARIO, &buyer, &[("a", 1), ("b", 2), ("c", 3)])?;

    let order_id = store
        .create(order.clone())
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "create", &error))?;

    let orders = store
        .list_for_user(&buyer)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "list_for_user", &error))?;

    match orders.as_slice() {
        [stored]
            if stored.id == order_id
                && stored.lines == order.lines
                && stored.shipping == order.shipping =>
        {
            Ok(())
        }
        other => Err(ContractTestFailure::assertion(
            SCENARIO,
            format!("expected the created order back, observed {other:?}"),
        )),
    }
}

/// A buyer without orders is reported as `UserHasNoOrders`.
pub async fn test_unknown_buyer_has_no_orders<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "unknown_buyer_has_no_orders";

    let store = make_store();
    let buyer = contract_username(SCENARIO)?;

    expect_kind(
        SCENARIO,
        "list_for_user",
        store.list_for_user(&buyer).await,
        ErrorKind::UserHasNoOrders,
    )
}

/// Orders are listed oldest first and their lines appear in `order_lines`.
pub async fn test_orders_are_listed_oldest_first<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: OrderStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "orders_are_listed_oldest_first";

    let store = make_store();
    let buyer = contract_username(SCENARIO)?;
    let first = contract_order(SCENARIO, &buyer, &[("first", 1)])?;
    let second = contract_order(SCENARIO, &buyer, &[("second", 1)])?;
    let marker = second.lines[0].product.clone();

    let first_id = store
        .create(first)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "create", &error))?;
    let second_id = store
        .create(second)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "create", &error))?;

    let ids: Vec<_> = store
        .list_for_user(&buyer)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "list_for_user", &error))?
        .into_iter()
        .map(|order| order.id)
        .collect();
    if ids != [first_id, second_id] {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            format!("expected [{first_id}, {second_id}], observed {ids:?}"),
        ));
    }

    let lines = store
        .order_lines()
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "order_lines", &error))?;
    if !lines.iter().any(|line| line.product == marker) {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            "order_lines() is missing a line of a committed order",
        ));
    }

    Ok(())
}

/// Billing updates create the record and later merge only non-blank fields.
pub async fn test_billing_updates_merge<F, S>(make_store: F) -> ContractTestResult
where
    F: Fn() -> S + Send + Sync + Clone + 'static,
    S: BillingStore + Send + Sync + 'static,
{
    const SCENARIO: &str = "billing_updates_merge";

    let store = make_store();
    let user = contract_username(SCENARIO)?;

    expect_kind(
        SCENARIO,
        "billing_details",
        store.billing_details(&user).await,
        ErrorKind::NotFound,
    )?;

    let _ = store
        .update_billing(
            &user,
            BillingUpdate {
                address: Some("1 Main St".to_owned()),
                city: Some("Springfield".to_owned()),
                ..BillingUpdate::default()
            },
        )
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "update_billing", &error))?;
    let _ = store
        .update_billing(
            &user,
            BillingUpdate {
                city: Some("  ".to_owned()),
                country: Some("US".to_owned()),
                ..BillingUpdate::default()
            },
        )
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "update_billing", &error))?;

    let details = store
        .billing_details(&user)
        .await
        .map_err(|error| ContractTestFailure::store_error(SCENARIO, "billing_details", &error))?;
    if details.address.as_deref() != Some("1 Main St")
        || details.city.as_deref() != Some("Springfield")
        || details.country.as_deref() != Some("US")
    {
        return Err(ContractTestFailure::assertion(
            SCENARIO,
            format!("billing update did not merge as expected: {details:?}"),
        ));
    }

    Ok(())
}

/// Expands to one test per `ProductStockStore` contract scenario.
///
/// Attributes written before `suite`, such as `#[ignore]`, are applied to
/// every generated test.
#[macro_export]
macro_rules! product_stock_contract_tests {
    (
        $(#[$attr:meta])*
        suite = $suite:ident,
        make_store = $make_store:expr $(,)?
    ) => {
        mod $suite {
            use $crate::contract::{
                test_category_listing, test_concurrent_reservations,
                test_missing_product_reports_not_found, test_register_and_get,
                test_release_after_delete, test_release_after_reregister,
                test_reserve_and_release, test_reserve_rejects_overdraw,
            };

            $(#[$attr])*
            #[tokio::test(flavor = "multi_thread")]
            async fn register_and_get_contract() {
                test_register_and_get($make_store)
                    .await
                    .expect("product stock contract failed");
            }

            $(#[$attr])*
            #[tokio::test(flavor = "multi_thread")]
            async fn missing_product_reports_not_found_contract() {
                test_missing_product_reports_not_found($make_store)
                    .await
                    .expect("product stock contract failed");
            }

            $(#[$attr])*
            #[tokio::test(flavor = "multi_thread")]
            async fn category_listing_contract() {
                test_category_listing($make_store)
                    .await
                    .expect("product stock contract failed");
            }

            $(#[$attr])*
            #[tokio::test(flavor = "multi_thread")]
            async fn reserve_rejects_overdraw_contract() {
                test_reserve_rejects_overdraw($make_store)
                    .await
                    .expect("product stock contract failed");
            }

            $(#[$attr])*
            #[tokio::test(flavor = "multi_thread")]
            async fn reserve_and_release_contract() {
                test_reserve_and_release($make_store)
                    .await
                    .expect("product stock contract failed");
            }

            $(#[$attr])*
            #[tokio::test(flavor = "multi_thread")]
            async fn release_after_delete_contract() {
                test_release_after_delete($make_store)
                    .await
                    .expect("product stock contract failed");
            }

            $(#[$attr])*
            #[tokio::test(flavor = "multi_thread")]
            async fn release_after_reregister_contract() {
                test_release_after_reregister($make_store)
                    .await
                    .expect("product stock contract failed");
            }

            $(#[$attr])*
            #[tokio::test(flavor = "multi_thread")]
            async fn concurrent_reservations_contract() {
                test_concurrent_reservations($make_store)
                    .await
                    .expect("product stock contract failed");
            }
        }
    };
}

pub use product_stock_contract_tests;

/// Expands to one test per `OrderStore` contract scenario.
///
/// Attributes written before `suite`, such as `#[ignore]`, are applied to
/// every generated test.
#[macro_export]
macro_rules! order_store_contract_tests {
    (
        $(#[$attr:meta])*
        suite = $suite:ident,
        make_store = $make_store:expr $(,)?
    ) => {
        mod $suite {
            use $crate::contract::{
                test_order_round_trip, test_orders_are_listed_oldest_first,
                test_unknown_buyer_has_no_orders,
            };

            $(#[$attr])*
            #[tokio::test(flavor = "multi_thread")]
            async fn order_round_trip_contract() {
                test_order_round_trip($make_store)
                    .await
                    .expect("order store contract failed");
            }

            $(#[$attr])*
            #[tokio::test(flavor = "multi_thread")]
            async fn unknown_buyer_has_no_orders_contract() {
                test_unknown_buyer_has_no_orders($make_store)
                    .await
                    .expect("order store contract failed");
            }

            $(#[$attr])*
            #[tokio::test(flavor = "multi_thread")]
            async fn orders_are_listed_oldest_first_contract() {
                test_orders_are_listed_oldest_first($make_store)
                    .await
                    .expect("order store contract failed");
            }
        }
    };
}

pub use order_store_contract_tests;

/// Expands to one test per `BillingStore` contract scenario.
///
/// Attributes written before `suite`, such as `#[ignore]`, are applied to
/// every generated test.
#[macro_export]
macro_rules! billing_store_contract_tests {
    (
        $(#[$attr:meta])*
        suite = $suite:ident,
        make_store = $make_store:expr $(,)?
    ) => {
        mod $suite {
            use $crate::contract::test_billing_updates_merge;

            $(#[$attr])*
            #[tokio::test(flavor = "multi_thread")]
            async fn billing_updates_merge_contract() {
                test_billing_updates_merge($make_store)
                    .await
                    .expect("billing store contract failed");
            }
        }
    };
}

pub use billing_store_contract_tests;
