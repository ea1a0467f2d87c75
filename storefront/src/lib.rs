//! Storefront order placement and inventory consistency engine.
//!
//! The [`OrderPlacementEngine`] turns a buyer's list of `(product, quantity)`
//! lines into a committed order, or into exactly one precise failure with no
//! stock left held on behalf of the request. The [`InventoryQueryService`]
//! answers catalog listings and per-product sales statistics.
//!
//! Both work against any backend implementing the store traits; see
//! `storefront-memory` and `storefront-postgres`.
//!
//! Every fallible operation returns an [`Outcome`]: callers branch on the
//! failure's [`ErrorKind`] and show its message.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod anomaly;
mod config;
mod engine;
mod inventory;

pub use anomaly::{AnomalyLog, AnomalySink, CompensationAnomaly, TracingAnomalySink};
pub use config::{CompensationRetry, EngineConfig, MaxReleaseAttempts, ShippingPolicy};
pub use engine::{LineRequest, OrderPlacementEngine};
pub use inventory::InventoryQueryService;

// Re-export the shared vocabulary so callers depend on one crate.
pub use storefront_types::{
    Authenticator, BillingDetails, BillingStore, BillingUpdate, Category, ErrorKind, Failure,
    ListingId, NewOrder, Order, OrderId, OrderLine, OrderQuantity, OrderStore, OrderSummary,
    Outcome, OutcomeExt, Price, Product, ProductName, ProductStats, ProductStockStore,
    Reservation, SessionToken, ShippingSnapshot, StockLevel, Username,
};
