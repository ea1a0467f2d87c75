//! Shared validation predicates for domain types.
//!
//! This module contains validation functions used by nutype-based domain types
//! across the storefront crates.

/// Validation predicate: reject control characters.
///
/// Product names, categories and usernames are business keys that end up in
/// log lines, SQL parameters and user-facing messages, so line breaks, tabs
/// and other control characters are not accepted.
pub(crate) fn no_control_characters(s: &str) -> bool {
    !s.chars().any(char::is_control)
}
