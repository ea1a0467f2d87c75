use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use storefront_types::{
    BillingDetails, BillingStore, BillingUpdate, ErrorKind, Failure, Outcome, Username,
};

/// Thread-safe in-memory billing records keyed by username.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBillingStore {
    records: Arc<RwLock<HashMap<Username, BillingDetails>>>,
}

impl InMemoryBillingStore {
    /// Create a store with no billing records.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BillingStore for InMemoryBillingStore {
    async fn billing_details(&self, user: &Username) -> Outcome<BillingDetails> {
        self.records.read().get(user).cloned().ok_or_else(|| {
            Failure::new(
                ErrorKind::NotFound,
                format!("No billing details for user '{user}'."),
            )
            .with_subject(user.to_string())
        })
    }

    async fn update_billing(
        &self,
        user: &Username,
        update: BillingUpdate,
    ) -> Outcome<BillingDetails> {
        let mut records = self.records.write();
        let details = records.entry(user.clone()).or_default();
        details.apply(update);
        Ok(details.clone())
    }
}
