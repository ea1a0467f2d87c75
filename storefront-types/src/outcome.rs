//! The two-outcome result contract shared by every storefront layer.
//!
//! Stores, the placement engine and the query service never panic or raise
//! for expected conditions. They return an [`Outcome`], which is a plain
//! [`Result`] whose error side is a [`Failure`]: an [`ErrorKind`] that callers
//! branch on, plus a human-readable message that callers only display.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of expected failures.
///
/// Callers decide what to do next by matching on the kind; the accompanying
/// message is diagnostic text and is never parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The referenced product, user, order history or billing record is unknown.
    NotFound,
    /// A product with the same name is already registered.
    AlreadyRegistered,
    /// A listing produced no rows.
    ListIsEmpty,
    /// The persistence substrate failed; retrying the whole request is safe.
    DatabaseError,
    /// A line requested more units than the product currently has on hand.
    InsufficientStock,
    /// The user has never placed an order.
    UserHasNoOrders,
    /// Every line was reserved but the order could not be persisted.
    FailedToRegisterOrder,
    /// The request was malformed (empty order, non-positive quantity, bad name).
    InvalidRegisterData,
    /// The session token did not resolve to a user.
    InvalidSession,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not_found",
            Self::AlreadyRegistered => "already_registered",
            Self::ListIsEmpty => "list_is_empty",
            Self::DatabaseError => "database_error",
            Self::InsufficientStock => "insufficient_stock",
            Self::UserHasNoOrders => "user_has_no_orders",
            Self::FailedToRegisterOrder => "failed_to_register_order",
            Self::InvalidRegisterData => "invalid_register_data",
            Self::InvalidSession => "invalid_session",
        };
        f.write_str(label)
    }
}

/// The error half of an [`Outcome`].
///
/// A `Failure` always carries exactly one kind and one message. When the
/// failure concerns a specific product or user, its name is recorded as the
/// subject so callers can report it without inspecting the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Failure<K: fmt::Debug = ErrorKind> {
    kind: K,
    message: String,
    subject: Option<String>,
}

impl<K: fmt::Debug> Failure<K> {
    /// Create a failure of the given kind with a human-readable message.
    pub fn new(kind: K, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            subject: None,
        }
    }

    /// Attach the name of the product or user this failure is about.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// The failure classification callers branch on.
    pub const fn kind(&self) -> &K {
        &self.kind
    }

    /// Diagnostic text suitable for showing to a user.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Name of the offending product or user, when known.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Re-classify the failure while keeping its subject.
    pub fn reclassify<J: fmt::Debug>(self, kind: J, message: impl Into<String>) -> Failure<J> {
        Failure {
            kind,
            message: message.into(),
            subject: self.subject,
        }
    }
}

/// Uniform return type of every fallible storefront operation.
pub type Outcome<T, K = ErrorKind> = Result<T, Failure<K>>;

/// Accessors mirroring the success/failure contract on top of [`Outcome`].
///
/// Pattern matching is the normal way to consume an outcome; these helpers
/// exist for call sites that only need one side.
pub trait OutcomeExt<T, K> {
    /// True when the outcome holds a value.
    fn is_success(&self) -> bool;

    /// Extract the success value.
    ///
    /// # Panics
    ///
    /// Panics when called on a failure. Reading the value of a failed outcome
    /// is a programming error, not an expected condition.
    fn value(self) -> T;

    /// The failure kind, or `None` on success.
    fn error_kind(&self) -> Option<&K>;

    /// The failure message, or `None` on success.
    fn message(&self) -> Option<&str>;
}

impl<T, K: fmt::Debug> OutcomeExt<T, K> for Outcome<T, K> {
    fn is_success(&self) -> bool {
        self.is_ok()
    }

    fn value(self) -> T {
        match self {
            Ok(value) => value,
            Err(failure) => panic!(
                "value() called on a failed outcome ({:?}): {}",
                failure.kind, failure.message
            ),
        }
    }

    fn error_kind(&self) -> Option<&K> {
        self.as_ref().err().map(Failure::kind)
    }

    fn message(&self) -> Option<&str> {
        self.as_ref().err().map(Failure::message)
    }
}
