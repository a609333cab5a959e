//! Summary records projected from the Rolimons item dataset.
//!
//! Upstream shape:
//!
//! ```text
//! { "items": { "<id>": [name, rap, value, demand, trend, projected, hyped, rare, itemType, ...] } }
//! ```
//!
//! Only positions 0-2 are read. The payload is walked as a loose
//! [`serde_json::Value`] so malformed rows degrade to defaults instead of
//! failing the whole response.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use super::coerce::number_or_zero;
use super::ids::ItemId;

/// Reduced view of one upstream item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    /// Position 0, copied verbatim. Omitted when the row is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    /// Recent average price, position 1.
    #[serde(serialize_with = "serialize_number")]
    pub rap: f64,
    /// Community value, position 2.
    #[serde(serialize_with = "serialize_number")]
    pub value: f64,
    /// `value` if non-zero, else `rap`.
    #[serde(serialize_with = "serialize_number")]
    pub price: f64,
}

impl SummaryRecord {
    /// Build a record from an upstream positional row.
    pub fn from_row(row: &[Value]) -> Self {
        let rap = number_or_zero(row.get(1));
        let value = number_or_zero(row.get(2));
        let price = if value != 0.0 { value } else { rap };

        Self {
            name: row.first().cloned(),
            rap,
            value,
            price,
        }
    }
}

/// Whole numbers serialize as integers (`100`, not `100.0`).
fn serialize_number<S: Serializer>(n: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if n.fract() == 0.0 && n.abs() <= i64::MAX as f64 {
        serializer.serialize_i64(*n as i64)
    } else {
        serializer.serialize_f64(*n)
    }
}

/// Projection result, serialized as a JSON object keyed by item id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemSummaries(Vec<(ItemId, SummaryRecord)>);

impl ItemSummaries {
    /// Number of items found.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no requested item was found.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Record for a given id, if it was found upstream.
    pub fn get(&self, id: ItemId) -> Option<&SummaryRecord> {
        self.0.iter().find(|(k, _)| *k == id).map(|(_, r)| r)
    }
}

impl Serialize for ItemSummaries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, record) in &self.0 {
            map.serialize_entry(&id.key(), record)?;
        }
        map.end()
    }
}

/// Project the upstream dataset down to the requested ids.
///
/// Ids missing from the dataset, or whose entry is not an array, are skipped.
/// Duplicate ids collapse to one entry; output is ordered by id.
pub fn project(dataset: &Value, ids: &[ItemId]) -> ItemSummaries {
    let items = dataset.get("items");

    let mut wanted = ids.to_vec();
    wanted.sort();
    wanted.dedup();

    let found = wanted
        .into_iter()
        .filter_map(|id| {
            let row = items?.get(id.key())?.as_array()?;
            Some((id, SummaryRecord::from_row(row)))
        })
        .collect();

    ItemSummaries(found)
}
