//! Item summary module for the Rolimons bulk dataset.
//!
//! This module handles:
//! - Parsing the `ids` query into item identifiers
//! - Loose numeric coercion of upstream values
//! - Projecting positional upstream rows into summary records

pub mod coerce;
pub mod ids;
pub mod record;

pub use ids::{parse_ids, ItemId};
pub use record::{project, ItemSummaries, SummaryRecord};
