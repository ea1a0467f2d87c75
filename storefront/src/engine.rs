//! Order placement: reserve every line, then commit, compensating on failure.
//!
//! A placement runs through these phases:
//!
//! ```text
//! Validating -> Reserving -> Committing   -> Completed
//!                         \               \
//!                          -> Compensating -> Failed
//! ```
//!
//! Lines are reserved one at a time in the order the buyer listed them. The
//! first refused line ends the reserving phase; every line reserved so far is
//! then released in reverse order before the refusal is returned. Stock is
//! therefore only ever held by a committed order or by a placement that is
//! still running.

use std::fmt;

use storefront_types::{
    Authenticator, BillingStore, ErrorKind, Failure, NewOrder, OrderId, OrderLine,
    OrderQuantity, OrderStore, OrderSummary, Outcome, ProductName, ProductStockStore,
    Reservation, SessionToken, ShippingSnapshot, Username,
};
use tracing::{debug, info, instrument, warn};

use crate::anomaly::{AnomalySink, CompensationAnomaly, TracingAnomalySink};
use crate::config::{EngineConfig, ShippingPolicy};

/// One requested line as received from the caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRequest {
    /// Product name as typed by the buyer.
    pub product: String,
    /// Requested units. Zero and negative values are rejected.
    pub quantity: i64,
}

impl LineRequest {
    /// Build a raw line request.
    pub fn new(product: impl Into<String>, quantity: i64) -> Self {
        Self {
            product: product.into(),
            quantity,
        }
    }
}

impl<S: Into<String>> From<(S, i64)> for LineRequest {
    fn from((product, quantity): (S, i64)) -> Self {
        Self::new(product, quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Validating,
    Reserving,
    Committing,
    Compensating,
    Completed,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validating => "validating",
            Self::Reserving => "reserving",
            Self::Committing => "committing",
            Self::Compensating => "compensating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone)]
struct ValidatedLine {
    product: ProductName,
    quantity: OrderQuantity,
}

/// A request whose every field parsed into its domain type.
#[derive(Debug)]
struct PlacementRequest {
    buyer: Username,
    lines: Vec<ValidatedLine>,
}

impl PlacementRequest {
    fn parse(username: &str, lines: &[LineRequest]) -> Outcome<Self> {
        let buyer = parse_username(username)?;

        if lines.is_empty() {
            return Err(Failure::new(
                ErrorKind::InvalidRegisterData,
                "An order needs at least one line.",
            )
            .with_subject(buyer.to_string()));
        }

        let lines = lines
            .iter()
            .map(ValidatedLine::parse)
            .collect::<Outcome<Vec<_>>>()?;

        Ok(Self { buyer, lines })
    }
}

impl ValidatedLine {
    fn parse(line: &LineRequest) -> Outcome<Self> {
        let product = ProductName::try_new(line.product.as_str()).map_err(|_| {
            Failure::new(
                ErrorKind::InvalidRegisterData,
                format!("'{}' is not a valid product name.", line.product),
            )
            .with_subject(line.product.clone())
        })?;

        let quantity = u32::try_from(line.quantity)
            .ok()
            .and_then(|quantity| OrderQuantity::try_new(quantity).ok())
            .ok_or_else(|| {
                Failure::new(
                    ErrorKind::InvalidRegisterData,
                    format!(
                        "Quantity {} for product '{product}' must be a positive whole number.",
                        line.quantity
                    ),
                )
                .with_subject(product.to_string())
            })?;

        Ok(Self { product, quantity })
    }
}

fn parse_username(username: &str) -> Outcome<Username> {
    Username::try_new(username).map_err(|_| {
        Failure::new(
            ErrorKind::InvalidRegisterData,
            format!("'{username}' is not a valid username."),
        )
        .with_subject(username.to_owned())
    })
}

/// Reservations held by one placement, in the order they were taken.
#[derive(Debug, Default)]
struct ReservationLedger {
    reserved: Vec<Reservation>,
}

impl ReservationLedger {
    fn record(&mut self, reservation: Reservation) {
        self.reserved.push(reservation);
    }

    fn order_lines(&self) -> Vec<OrderLine> {
        self.reserved
            .iter()
            .map(|reservation| OrderLine {
                product: reservation.product.clone(),
                quantity: reservation.quantity,
                unit_price: reservation.unit_price,
            })
            .collect()
    }

    /// Reservations, most recent first.
    fn into_release_order(self) -> impl Iterator<Item = Reservation> {
        self.reserved.into_iter().rev()
    }
}

/// Coordinates the product, order and billing stores for one placement at a
/// time.
///
/// The engine owns no state of its own beyond configuration; any number of
/// placements may run concurrently against the same engine. Each call to
/// [`place_order`](Self::place_order) should be driven to completion: a
/// future dropped mid-placement leaves its reservations unreleased.
///
/// # Examples
///
/// ```ignore
/// use storefront::{LineRequest, OrderPlacementEngine};
/// use storefront_memory::{InMemoryBillingStore, InMemoryOrderStore, InMemoryProductStore};
///
/// let engine = OrderPlacementEngine::new(
///     InMemoryProductStore::new(),
///     InMemoryOrderStore::new(),
///     InMemoryBillingStore::new(),
/// );
/// let order_id = engine
///     .place_order("alice", &[LineRequest::new("Lamp", 2)])
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct OrderPlacementEngine<P, O, B, S = TracingAnomalySink> {
    products: P,
    orders: O,
    billing: B,
    anomalies: S,
    config: EngineConfig,
}

impl<P, O, B> OrderPlacementEngine<P, O, B> {
    /// Create an engine with default configuration that logs anomalies.
    pub fn new(products: P, orders: O, billing: B) -> Self {
        Self {
            products,
            orders,
            billing,
            anomalies: TracingAnomalySink,
            config: EngineConfig::default(),
        }
    }
}

impl<P, O, B, S> OrderPlacementEngine<P, O, B, S> {
    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Send compensation anomalies to `sink` instead.
    pub fn with_anomaly_sink<T>(self, sink: T) -> OrderPlacementEngine<P, O, B, T> {
        OrderPlacementEngine {
            products: self.products,
            orders: self.orders,
            billing: self.billing,
            anomalies: sink,
            config: self.config,
        }
    }

    /// Active configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl<P, O, B, S> OrderPlacementEngine<P, O, B, S>
where
    P: ProductStockStore + Sync,
    O: OrderStore + Sync,
    B: BillingStore + Sync,
    S: AnomalySink,
{
    /// Place an order for `username` with the given lines.
    ///
    /// Returns the new order's identifier. On failure, no stock is held on
    /// behalf of the request: either nothing was reserved, or every
    /// reservation was released (or reported as an anomaly when the release
    /// itself failed). The first refused line in request order is the one
    /// reported.
    ///
    /// # Errors
    ///
    /// - `InvalidRegisterData` when the username, a product name or a quantity
    ///   does not parse, or there are no lines
    /// - `NotFound` when a product does not exist, or when shipping details
    ///   are required and missing
    /// - `InsufficientStock` when a line asks for more than is on hand
    /// - `InvalidRegisterData` when the order total at the reserved prices
    ///   does not fit in a `Decimal`
    /// - `DatabaseError` when a store fails while reserving
    /// - `FailedToRegisterOrder` when every line was reserved but the order
    ///   could not be persisted
    #[instrument(
        name = "engine.place_order",
        skip(self, username, lines),
        fields(buyer = %username, line_count = lines.len())
    )]
    pub async fn place_order(&self, username: &str, lines: &[LineRequest]) -> Outcome<OrderId> {
        let mut phase = Phase::Validating;
        debug!(%phase, "[engine.place_order] validating request");

        let request = PlacementRequest::parse(username, lines).inspect_err(|failure| {
            warn!(
                reason = %failure,
                "[engine.place_order] request rejected"
            );
        })?;
        let shipping = self.shipping_for(&request.buyer).await?;

        phase = Phase::Reserving;
        debug!(%phase, "[engine.place_order] reserving stock");

        let mut ledger = ReservationLedger::default();
        for line in &request.lines {
            match self.products.try_reserve(&line.product, line.quantity).await {
                Ok(reservation) => ledger.record(reservation),
                Err(failure) => {
                    warn!(
                        product = %line.product,
                        quantity = %line.quantity,
                        kind = %failure.kind(),
                        "[engine.place_order] reservation refused"
                    );
                    self.compensate(&request.buyer, ledger).await;
                    return Err(failure);
                }
            }
        }

        phase = Phase::Committing;
        debug!(%phase, "[engine.place_order] committing order");

        let order = NewOrder {
            buyer: request.buyer.clone(),
            lines: ledger.order_lines(),
            shipping,
        };
        if order.total().is_none() {
            warn!("[engine.place_order] order total cannot be represented");
            self.compensate(&request.buyer, ledger).await;
            return Err(Failure::new(
                ErrorKind::InvalidRegisterData,
                format!(
                    "The total of the order for user '{}' is too large.",
                    request.buyer
                ),
            )
            .with_subject(request.buyer.to_string()));
        }
        match self.orders.create(order).await {
            Ok(order_id) => {
                phase = Phase::Completed;
                info!(
                    %phase,
                    order_id = %order_id,
                    "[engine.place_order] order placed"
                );
                Ok(order_id)
            }
            Err(failure) => {
                warn!(
                    kind = %failure.kind(),
                    reason = %failure,
                    "[engine.place_order] order could not be persisted"
                );
                self.compensate(&request.buyer, ledger).await;
                Err(failure.reclassify(
                    ErrorKind::FailedToRegisterOrder,
                    format!(
                        "The order for user '{}' could not be registered. Please try again.",
                        request.buyer
                    ),
                ))
            }
        }
    }

    /// Every order placed by `username`, oldest first, with totals.
    ///
    /// Reads only; calling it repeatedly without intervening placements
    /// yields the same result.
    #[instrument(name = "engine.user_orders", skip(self))]
    pub async fn user_orders(&self, username: &str) -> Outcome<Vec<OrderSummary>> {
        let buyer = parse_username(username)?;
        let orders = self.orders.list_for_user(&buyer).await?;
        orders.into_iter().map(OrderSummary::try_from).collect()
    }

    /// Resolve `token` through `sessions`, then place the order for its user.
    ///
    /// Returns `InvalidSession` when the token is malformed or unknown.
    pub async fn place_order_for_session<A>(
        &self,
        sessions: &A,
        token: &str,
        lines: &[LineRequest],
    ) -> Outcome<OrderId>
    where
        A: Authenticator + Sync,
    {
        let buyer = resolve_session(sessions, token).await?;
        self.place_order(buyer.as_ref(), lines).await
    }

    /// Resolve `token` through `sessions`, then list that user's orders.
    pub async fn user_orders_for_session<A>(
        &self,
        sessions: &A,
        token: &str,
    ) -> Outcome<Vec<OrderSummary>>
    where
        A: Authenticator + Sync,
    {
        let buyer = resolve_session(sessions, token).await?;
        self.user_orders(buyer.as_ref()).await
    }

    async fn shipping_for(&self, buyer: &Username) -> Outcome<Option<ShippingSnapshot>> {
        let policy = self.config.shipping;
        if policy == ShippingPolicy::Skip {
            return Ok(None);
        }

        let details = match self.billing.billing_details(buyer).await {
            Ok(details) => Some(ShippingSnapshot::from(&details)),
            Err(failure) if failure.kind() == &ErrorKind::NotFound => None,
            Err(failure) => return Err(failure),
        };

        // A telephone number alone is not somewhere to ship to.
        match (policy, details.filter(|snapshot| !snapshot.is_empty())) {
            (_, Some(snapshot)) => Ok(Some(snapshot)),
            (ShippingPolicy::Require, None) => Err(Failure::new(
                ErrorKind::NotFound,
                format!("User '{buyer}' has no shipping details on file."),
            )
            .with_subject(buyer.to_string())),
            (_, None) => Ok(None),
        }
    }

    /// Release every reservation in `ledger`, most recent first.
    ///
    /// Always attempts every line. Lines that cannot be released are handed
    /// to the anomaly sink; they never change the request's outcome.
    async fn compensate(&self, buyer: &Username, ledger: ReservationLedger) {
        let phase = Phase::Compensating;
        debug!(%phase, "[engine.compensate] releasing reservations");

        for reservation in ledger.into_release_order() {
            if let Err((attempts, failure)) = self.release_with_retry(&reservation).await {
                self.anomalies.record(CompensationAnomaly::new(
                    buyer,
                    &reservation.product,
                    reservation.quantity,
                    attempts,
                    &failure,
                ));
            }
        }

        let phase = Phase::Failed;
        debug!(%phase, "[engine.compensate] reservations released");
    }

    async fn release_with_retry(&self, reservation: &Reservation) -> Result<(), (u32, Failure)> {
        let retry = self.config.compensation;
        let max_attempts = retry.max_attempts.into_inner();
        let mut attempt = 1;

        loop {
            match self.products.release(reservation).await {
                Ok(()) => return Ok(()),
                // A deleted listing stays deleted; retrying cannot help.
                Err(failure) if failure.kind() == &ErrorKind::NotFound => {
                    return Err((attempt, failure));
                }
                Err(failure) if attempt >= max_attempts => return Err((attempt, failure)),
                Err(failure) => {
                    warn!(
                        product = %reservation.product,
                        attempt,
                        max_attempts,
                        reason = %failure,
                        "[engine.compensate] release failed, retrying"
                    );
                    if !retry.backoff.is_zero() {
                        tokio::time::sleep(retry.backoff).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

async fn resolve_session<A>(sessions: &A, token: &str) -> Outcome<Username>
where
    A: Authenticator + Sync,
{
    let token = SessionToken::try_new(token).map_err(|_| {
        Failure::new(
            ErrorKind::InvalidSession,
            "The session is invalid or has expired.",
        )
    })?;
    sessions.resolve(&token).await
}
