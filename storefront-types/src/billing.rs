use crate::order::Username;
use crate::outcome::Outcome;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Per-user billing and shipping record.
///
/// Every field is optional: a freshly registered user has a record with
/// nothing filled in yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingDetails {
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Postal or ZIP code.
    pub postal_code: Option<String>,
    /// Contact telephone number.
    pub telephone: Option<String>,
}

impl BillingDetails {
    /// True when no field has been filled in.
    pub fn is_blank(&self) -> bool {
        self.address.is_none()
            && self.city.is_none()
            && self.country.is_none()
            && self.postal_code.is_none()
            && self.telephone.is_none()
    }

    /// Apply a partial update. Fields that are absent or blank in `update`
    /// keep their current value.
    pub fn apply(&mut self, update: BillingUpdate) {
        merge(&mut self.address, update.address);
        merge(&mut self.city, update.city);
        merge(&mut self.country, update.country);
        merge(&mut self.postal_code, update.postal_code);
        merge(&mut self.telephone, update.telephone);
    }
}

fn merge(field: &mut Option<String>, incoming: Option<String>) {
    if let Some(value) = incoming {
        let value = value.trim();
        if !value.is_empty() {
            *field = Some(value.to_owned());
        }
    }
}

/// Partial change to a [`BillingDetails`] record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingUpdate {
    /// New street address.
    pub address: Option<String>,
    /// New city.
    pub city: Option<String>,
    /// New country.
    pub country: Option<String>,
    /// New postal code.
    pub postal_code: Option<String>,
    /// New telephone number.
    pub telephone: Option<String>,
}

/// Shipping details copied onto an order when it is placed.
///
/// Later billing edits never rewrite the snapshot of an existing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingSnapshot {
    /// Street address at placement time.
    pub address: Option<String>,
    /// City at placement time.
    pub city: Option<String>,
    /// Country at placement time.
    pub country: Option<String>,
    /// Postal code at placement time.
    pub postal_code: Option<String>,
}

impl ShippingSnapshot {
    /// True when no address field is filled in.
    pub const fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.city.is_none()
            && self.country.is_none()
            && self.postal_code.is_none()
    }
}

impl From<&BillingDetails> for ShippingSnapshot {
    fn from(details: &BillingDetails) -> Self {
        Self {
            address: details.address.clone(),
            city: details.city.clone(),
            country: details.country.clone(),
            postal_code: details.postal_code.clone(),
        }
    }
}

/// Contract for per-user billing persistence.
pub trait BillingStore {
    /// The billing record of `user`, or `NotFound` when the user has none.
    fn billing_details(
        &self,
        user: &Username,
    ) -> impl Future<Output = Outcome<BillingDetails>> + Send;

    /// Merge `update` into the record of `user`, creating it when missing.
    fn update_billing(
        &self,
        user: &Username,
        update: BillingUpdate,
    ) -> impl Future<Output = Outcome<BillingDetails>> + Send;
}

/// Blanket implementation allowing BillingStore to work with references.
impl<T: BillingStore + Sync> BillingStore for &T {
    async fn billing_details(&self, user: &Username) -> Outcome<BillingDetails> {
        (*self).billing_details(user).await
    }

    async fn update_billing(
        &self,
        user: &Username,
        update: BillingUpdate,
    ) -> Outcome<BillingDetails> {
        (*self).update_billing(user, update).await
    }
}
