//! In-memory backend for the storefront order engine
//!
//! This crate provides in-memory implementations of the store traits from
//! `storefront-types`, useful for testing and development scenarios where
//! persistence is not required.
//!
//! Stock reservations lock one product record at a time, so concurrent
//! orders for different products never wait on each other.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod billing;
mod orders;
mod products;
mod sessions;

pub use billing::InMemoryBillingStore;
pub use orders::InMemoryOrderStore;
pub use products::InMemoryProductStore;
pub use sessions::InMemorySessions;
