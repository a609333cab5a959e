//! Item identifier parsing for the `ids` query parameter.

use std::cmp::Ordering;
use std::fmt;

use super::coerce::number_from_str;

/// Requested item identifier.
///
/// Always finite and strictly positive. Held as `f64` because the query is
/// coerced numerically, so `1.5` or `1e3` are accepted as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemId(f64);

impl ItemId {
    /// Accept a number as an identifier if it is finite and greater than zero.
    pub fn new(n: f64) -> Option<Self> {
        (n.is_finite() && n > 0.0).then_some(Self(n))
    }

    /// Numeric value.
    pub fn get(self) -> f64 {
        self.0
    }

    /// Key used both for the upstream lookup and the response object.
    pub fn key(self) -> String {
        self.to_string()
    }
}

impl Eq for ItemId {}

impl PartialOrd for ItemId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ItemId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shortest round-trip digits: 2.0 prints as 2, large ids keep their
        // published form instead of the exact binary expansion.
        write!(f, "{}", self.0)
    }
}

/// Parse a comma-separated id list.
///
/// Tokens are trimmed and coerced to numbers; anything that is not a finite
/// number greater than zero is dropped without error. Input order is kept.
pub fn parse_ids(raw: &str) -> Vec<ItemId> {
    raw.split(',')
        .filter_map(number_from_str)
        .filter_map(ItemId::new)
        .collect()
}
