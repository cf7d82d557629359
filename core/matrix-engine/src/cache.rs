//! FILENAME: core/matrix-engine/src/cache.rs
//! Record Cache - The ingested, immutable record list.
//!
//! Records arrive as flat attribute maps. Each one is given a positional
//! index at ingestion that never changes for the lifetime of the set;
//! row and column partitions are built independently and correlated
//! through these indices.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::definition::NO_VALUE;

/// Position of a record in its `RecordSet` (0-based, assigned once).
pub type RecordIndex = usize;

// ============================================================================
// ATTRIBUTE VALUES
// ============================================================================

/// A scalar or list value stored under one attribute of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Empty,
    Boolean(bool),
    Number(f64),
    Text(String),
    List(Vec<AttrValue>),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Boolean(value)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(values: Vec<T>) -> Self {
        AttrValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl AttrValue {
    /// The string this value groups under, or None when it carries nothing.
    /// Lists group under their non-empty members joined by ", ".
    pub fn group_key(&self) -> Option<String> {
        match self {
            AttrValue::Empty => None,
            AttrValue::Boolean(b) => Some(b.to_string()),
            AttrValue::Number(n) => Some(format_number(*n)),
            AttrValue::Text(s) => {
                if s.trim().is_empty() {
                    None
                } else {
                    Some(s.clone())
                }
            }
            AttrValue::List(items) => {
                let parts: Vec<String> = items.iter().filter_map(AttrValue::group_key).collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(", "))
                }
            }
        }
    }

    /// Numeric reading of the value. Lists sum their numeric members;
    /// text counts only if it parses as a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(s) => s.trim().parse::<f64>().ok(),
            AttrValue::List(items) => {
                let mut found = false;
                let mut total = 0.0;
                for n in items.iter().filter_map(AttrValue::as_number) {
                    found = true;
                    total += n;
                }
                found.then_some(total)
            }
            AttrValue::Empty | AttrValue::Boolean(_) => None,
        }
    }

    /// Pushes every non-empty scalar label, flattening lists.
    pub fn collect_labels(&self, out: &mut Vec<String>) {
        match self {
            AttrValue::List(items) => {
                for item in items {
                    item.collect_labels(out);
                }
            }
            other => {
                if let Some(label) = other.group_key() {
                    out.push(label);
                }
            }
        }
    }
}

/// Integral values print without a trailing ".0".
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// An immutable flat record with its stable positional index.
#[derive(Debug, Clone)]
pub struct Record {
    index: RecordIndex,
    values: FxHashMap<String, AttrValue>,
}

impl Record {
    pub fn index(&self) -> RecordIndex {
        self.index
    }

    pub fn get(&self, attribute: &str) -> Option<&AttrValue> {
        self.values.get(attribute)
    }

    pub fn values(&self) -> &FxHashMap<String, AttrValue> {
        &self.values
    }

    /// Row group key: missing or empty values fall back to `NO_VALUE`.
    pub fn group_key(&self, attribute: &str) -> String {
        self.get(attribute)
            .and_then(AttrValue::group_key)
            .unwrap_or_else(|| NO_VALUE.to_string())
    }

    /// Column key: records without a value are not bucketed at all.
    pub fn column_key(&self, attribute: &str) -> Option<String> {
        self.get(attribute).and_then(AttrValue::group_key)
    }
}

/// The materialized record list the engine works on.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new() -> Self {
        RecordSet { records: Vec::new() }
    }

    /// Ingests flat attribute maps in order, assigning indices 0..n.
    pub fn from_maps<I, M, K>(maps: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: IntoIterator<Item = (K, AttrValue)>,
        K: Into<String>,
    {
        let mut set = RecordSet::new();
        for map in maps {
            set.add_record(map);
        }
        set
    }

    /// Appends one record and returns its index.
    pub fn add_record<M, K>(&mut self, values: M) -> RecordIndex
    where
        M: IntoIterator<Item = (K, AttrValue)>,
        K: Into<String>,
    {
        let index = self.records.len();
        self.records.push(Record {
            index,
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        });
        index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: RecordIndex) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Resolves a subset of indices, skipping any that are out of range.
    pub fn subset<'a>(&'a self, indices: &'a [RecordIndex]) -> impl Iterator<Item = &'a Record> + 'a {
        indices.iter().filter_map(move |&i| self.records.get(i))
    }
}
