//! Reporting of compensations that could not be completed.
//!
//! When a reservation cannot be released, stock on hand is lower than the
//! committed orders account for. The request outcome does not change, but an
//! operator has to reconcile the product by hand, so every such case is
//! handed to an [`AnomalySink`].

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use storefront_types::{ErrorKind, Failure, OrderQuantity, ProductName, Username};
use tracing::error;

/// One reservation that was never returned to stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompensationAnomaly {
    /// Buyer whose request was being rolled back.
    pub buyer: Username,
    /// Product whose stock is now short.
    pub product: ProductName,
    /// Units that were reserved and not released.
    pub quantity: OrderQuantity,
    /// Release attempts made before giving up.
    pub attempts: u32,
    /// Kind of the last release failure.
    pub kind: ErrorKind,
    /// Message of the last release failure.
    pub reason: String,
}

impl CompensationAnomaly {
    pub(crate) fn new(
        buyer: &Username,
        product: &ProductName,
        quantity: OrderQuantity,
        attempts: u32,
        failure: &Failure,
    ) -> Self {
        Self {
            buyer: buyer.clone(),
            product: product.clone(),
            quantity,
            attempts,
            kind: *failure.kind(),
            reason: failure.message().to_owned(),
        }
    }
}

/// Destination for compensation anomalies.
pub trait AnomalySink: Send + Sync {
    /// Record one anomaly. Must not fail.
    fn record(&self, anomaly: CompensationAnomaly);
}

impl<T: AnomalySink + ?Sized> AnomalySink for Arc<T> {
    fn record(&self, anomaly: CompensationAnomaly) {
        (**self).record(anomaly);
    }
}

fn log_anomaly(anomaly: &CompensationAnomaly) {
    error!(
        buyer = %anomaly.buyer,
        product = %anomaly.product,
        quantity = %anomaly.quantity,
        attempts = anomaly.attempts,
        kind = %anomaly.kind,
        reason = %anomaly.reason,
        "[engine.compensate] reservation could not be released; stock needs reconciliation"
    );
}

/// Default sink: one structured `error` event per anomaly.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnomalySink;

impl AnomalySink for TracingAnomalySink {
    fn record(&self, anomaly: CompensationAnomaly) {
        log_anomaly(&anomaly);
    }
}

/// Sink that logs every anomaly and keeps it for later inspection.
///
/// Clones share the same log, so one handle can be given to the engine and
/// another kept by the operator tooling.
#[derive(Debug, Clone, Default)]
pub struct AnomalyLog {
    entries: Arc<Mutex<Vec<CompensationAnomaly>>>,
}

impl AnomalyLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every anomaly recorded so far, oldest first.
    pub fn entries(&self) -> Vec<CompensationAnomaly> {
        self.entries.lock().clone()
    }

    /// Remove and return every recorded anomaly.
    pub fn drain(&self) -> Vec<CompensationAnomaly> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// True when nothing needs reconciliation.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl AnomalySink for AnomalyLog {
    fn record(&self, anomaly: CompensationAnomaly) {
        log_anomaly(&anomaly);
        self.entries.lock().push(anomaly);
    }
}
