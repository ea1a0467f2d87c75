//! Property tests for placement atomicity and stock conservation.
//!
//! For any catalog and any request, a placement either commits every line
//! or leaves every product exactly as it found it.

mod common;

use common::{lines, Storefront};
use proptest::prelude::*;
use storefront::{ErrorKind, OutcomeExt};

const PRODUCTS: [&str; 4] = ["Anvil", "Bucket", "Candle", "Drum"];

fn catalog() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..20, PRODUCTS.len())
}

fn request() -> impl Strategy<Value = Vec<(usize, i64)>> {
    prop::collection::vec((0..PRODUCTS.len(), -2i64..25), 1..6)
}

async fn stock_levels(shop: &Storefront) -> Vec<u32> {
    let mut levels = Vec::with_capacity(PRODUCTS.len());
    for name in PRODUCTS {
        levels.push(shop.on_hand(name).await);
    }
    levels
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn placement_is_all_or_nothing(initial in catalog(), requested in request()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let shop = Storefront::new();
            for (name, on_hand) in PRODUCTS.iter().zip(&initial) {
                shop.stock(name, 250, *on_hand).await;
            }
            let engine = shop.engine();
            let request: Vec<(&str, i64)> = requested
                .iter()
                .map(|(index, quantity)| (PRODUCTS[*index], *quantity))
                .collect();

            let outcome = engine.place_order("prop-buyer", &lines(&request)).await;
            let after = stock_levels(&shop).await;

            if outcome.is_success() {
                let mut expected = initial.clone();
                for (index, quantity) in &requested {
                    expected[*index] -= u32::try_from(*quantity).unwrap();
                }
                prop_assert_eq!(after, expected);
                prop_assert_eq!(shop.orders.len(), 1);
            } else {
                prop_assert_eq!(after, initial.clone());
                prop_assert!(shop.orders.is_empty());
            }
            Ok(())
        })?;
    }

    #[test]
    fn success_matches_a_sequential_stock_check(initial in catalog(), requested in request()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let shop = Storefront::new();
            for (name, on_hand) in PRODUCTS.iter().zip(&initial) {
                shop.stock(name, 250, *on_hand).await;
            }
            let engine = shop.engine();
            let request: Vec<(&str, i64)> = requested
                .iter()
                .map(|(index, quantity)| (PRODUCTS[*index], *quantity))
                .collect();

            // Walk the lines the way the engine must: first invalid or
            // unsatisfiable line decides the outcome.
            let mut remaining = initial.clone();
            let mut expected_failure = None;
            if requested.iter().any(|(_, quantity)| *quantity <= 0) {
                expected_failure = Some((ErrorKind::InvalidRegisterData, None));
            } else {
                for (index, quantity) in &requested {
                    let quantity = u32::try_from(*quantity).unwrap();
                    if remaining[*index] < quantity {
                        expected_failure =
                            Some((ErrorKind::InsufficientStock, Some(PRODUCTS[*index])));
                        break;
                    }
                    remaining[*index] -= quantity;
                }
            }

            let outcome = engine.place_order("prop-buyer", &lines(&request)).await;

            match expected_failure {
                None => prop_assert!(outcome.is_success()),
                Some((kind, subject)) => {
                    let failure = outcome.unwrap_err();
                    prop_assert_eq!(failure.kind(), &kind);
                    if let Some(product) = subject {
                        prop_assert_eq!(failure.subject(), Some(product));
                    }
                }
            }
            Ok(())
        })?;
    }
}
