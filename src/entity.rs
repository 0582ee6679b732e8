//! Tri-state entity values and the overlay `combine` primitive.
//!
//! Every leaf of the graph is an [`EntityValue`]: an explicit tagged union
//! replacing the original's overloaded `undefined`/`false`/`true`/object
//! encoding. `Absent` is a first-class, storable state — it is both the
//! implied value of a missing key and the literal clearing marker written by
//! pull reconciliation.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// One graph leaf: no opinion, known-deleted, known-present, or present with
/// an attached record.
///
/// Wire encoding: `Absent` ⇄ `null`, `Tombstone` ⇄ `false`, `Marker` ⇄
/// `true`, `Data(T)` ⇄ the record itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityValue<T> {
    /// No layer expresses an opinion (or an explicit clearing marker).
    Absent,
    /// Explicit "does not exist".
    Tombstone,
    /// Exists, no attached data.
    Marker,
    /// Exists, with an attached record.
    Data(T),
}

impl<T> Default for EntityValue<T> {
    fn default() -> Self {
        EntityValue::Absent
    }
}

impl<T> EntityValue<T> {
    /// True for `Marker` and `Data`; the "truthy" states that survive reads.
    pub fn is_present(&self) -> bool {
        matches!(self, EntityValue::Marker | EntityValue::Data(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, EntityValue::Absent)
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, EntityValue::Tombstone)
    }

    pub fn as_data(&self) -> Option<&T> {
        match self {
            EntityValue::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            EntityValue::Data(data) => Some(data),
            _ => None,
        }
    }

    /// Map the attached record, preserving the other three states.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> EntityValue<U> {
        match self {
            EntityValue::Absent => EntityValue::Absent,
            EntityValue::Tombstone => EntityValue::Tombstone,
            EntityValue::Marker => EntityValue::Marker,
            EntityValue::Data(data) => EntityValue::Data(f(data)),
        }
    }
}

/// Shallow field merge between two records of the same path.
///
/// `existing.overlay(incoming)`: incoming fields win, non-overlapping fields
/// from both sides survive. Only `Data` values are ever field-merged;
/// `Marker` and `Tombstone` carry no nested fields.
pub trait Overlay {
    fn overlay(&self, incoming: &Self) -> Self;
}

impl Overlay for serde_json::Map<String, Value> {
    fn overlay(&self, incoming: &Self) -> Self {
        let mut merged = self.clone();
        for (key, value) in incoming {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

impl Overlay for () {
    fn overlay(&self, _incoming: &Self) -> Self {}
}

/// Combine one leaf from a newer layer (`incoming`) with the accumulated
/// value from older layers (`existing`).
///
/// - a deletion from a newer layer always wins;
/// - a bare-existence marker never clobbers real data;
/// - records of the same path shallow-merge, incoming fields winning;
/// - a layer with no opinion never overrides.
pub fn combine<T: Overlay + Clone>(
    incoming: &EntityValue<T>,
    existing: &EntityValue<T>,
) -> EntityValue<T> {
    match (incoming, existing) {
        (EntityValue::Tombstone, _) => EntityValue::Tombstone,
        (EntityValue::Marker, EntityValue::Data(data)) => EntityValue::Data(data.clone()),
        (EntityValue::Marker, _) => EntityValue::Marker,
        (EntityValue::Data(inc), EntityValue::Data(exist)) => EntityValue::Data(exist.overlay(inc)),
        (EntityValue::Data(inc), _) => EntityValue::Data(inc.clone()),
        (EntityValue::Absent, existing) => existing.clone(),
    }
}

impl<T: Serialize> Serialize for EntityValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EntityValue::Absent => serializer.serialize_none(),
            EntityValue::Tombstone => serializer.serialize_bool(false),
            EntityValue::Marker => serializer.serialize_bool(true),
            EntityValue::Data(data) => data.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for EntityValue<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(EntityValue::Absent),
            Value::Bool(false) => Ok(EntityValue::Tombstone),
            Value::Bool(true) => Ok(EntityValue::Marker),
            other => serde_json::from_value(other)
                .map(EntityValue::Data)
                .map_err(serde::de::Error::custom),
        }
    }
}
