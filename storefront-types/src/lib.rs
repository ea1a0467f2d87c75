#![forbid(
    dead_code,
    invalid_value,
    overflowing_literals,
    unconditional_recursion,
    unreachable_pub,
    unused_allocation,
    unsafe_code
)]
#![deny(
    bad_style,
    clippy::allow_attributes,
    deprecated,
    meta_variable_misuse,
    non_ascii_idents,
    non_camel_case_types,
    non_snake_case,
    non_upper_case_globals,
    rust_2018_idioms,
    rust_2021_compatibility,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_code,
    unused_assignments,
    unused_attributes,
    unused_extern_crates,
    unused_imports,
    unused_must_use,
    unused_mut,
    unused_parens,
    unused_qualifications,
    unused_results,
    unused_variables
)]

//! Shared vocabulary types and store traits for the storefront order engine.
//!
//! This crate provides the types that are shared between the `storefront`
//! engine crate and backend implementations like `storefront-memory` and
//! `storefront-postgres`. Keeping them in a separate crate lets backends
//! implement the store traits without depending on the engine.
//!
//! # Overview
//!
//! This crate contains:
//! - The result contract: `Outcome`, `Failure`, `ErrorKind`, `OutcomeExt`
//! - Store traits: `ProductStockStore`, `OrderStore`, `BillingStore`, `Authenticator`
//! - Catalog types: `Product`, `ProductName`, `Category`, `Price`, `StockLevel`, `ProductStats`,
//!   `ListingId`, `Reservation`
//! - Order types: `Order`, `NewOrder`, `OrderLine`, `OrderSummary`, `OrderId`,
//!   `OrderQuantity`, `Username`
//! - Billing types: `BillingDetails`, `BillingUpdate`, `ShippingSnapshot`

mod auth;
mod billing;
mod catalog;
mod order;
mod outcome;
mod validation;

pub use auth::{Authenticator, SessionToken, SessionTokenError};
pub use billing::{BillingDetails, BillingStore, BillingUpdate, ShippingSnapshot};
pub use catalog::{
    Category, CategoryError, ListingId, Price, PriceError, Product, ProductName,
    ProductNameError, ProductStats, ProductStockStore, Reservation, StockLevel,
};
pub use order::{
    NewOrder, Order, OrderId, OrderIdError, OrderLine, OrderQuantity, OrderQuantityError,
    OrderStore, OrderSummary, Username, UsernameError,
};
pub use outcome::{ErrorKind, Failure, Outcome, OutcomeExt};
