//! Store contract suites run against the in-memory backend.
//!
//! Any backend plugs into the same scenarios by invoking the macros with its
//! own constructor. New scenarios added to a suite are picked up here
//! without changes.

use storefront_testing::contract::{
    billing_store_contract_tests, order_store_contract_tests, product_stock_contract_tests,
};

product_stock_contract_tests! {
    suite = in_memory_products,
    make_store = storefront_memory::InMemoryProductStore::new,
}

order_store_contract_tests! {
    suite = in_memory_orders,
    make_store = storefront_memory::InMemoryOrderStore::new,
}

billing_store_contract_tests! {
    suite = in_memory_billing,
    make_store = storefront_memory::InMemoryBillingStore::new,
}
