//! FILENAME: core/matrix-engine/src/aggregate.rs
//! Aggregator - merges any record subset into a descriptive summary.
//!
//! Each included attribute is merged by its declared kind: numeric fields
//! are summed, categorical fields become the distinct non-empty values in
//! first-seen order. Used to fill the detail overlay of a block.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::cache::{format_number, RecordIndex, RecordSet};
use crate::definition::FieldKind;

/// Merged value of one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SummaryValue {
    Sum(f64),
    Values(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryField {
    pub attribute: String,
    pub value: SummaryValue,
}

impl SummaryField {
    /// Display text, listing at most `limit` values before "and N more".
    pub fn display(&self, limit: usize) -> String {
        match &self.value {
            SummaryValue::Sum(total) => format_number(*total),
            SummaryValue::Values(values) => {
                let limit = limit.max(1);
                if values.len() <= limit {
                    values.join(", ")
                } else {
                    format!("{} and {} more", values[..limit].join(", "), values.len() - limit)
                }
            }
        }
    }

    /// Number of distinct values (categorical) or 1 (numeric).
    pub fn distinct_count(&self) -> usize {
        match &self.value {
            SummaryValue::Sum(_) => 1,
            SummaryValue::Values(values) => values.len(),
        }
    }
}

/// Aggregate description of a record subset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of records aggregated.
    pub total: usize,
    pub fields: Vec<SummaryField>,
}

impl Summary {
    pub fn get(&self, attribute: &str) -> Option<&SummaryField> {
        self.fields.iter().find(|f| f.attribute == attribute)
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Aggregates `subset` over `keys`. An empty subset yields an empty summary.
pub fn aggregate(
    records: &RecordSet,
    subset: &[RecordIndex],
    keys: &[String],
    kinds: &FxHashMap<String, FieldKind>,
) -> Summary {
    if subset.is_empty() {
        return Summary::default();
    }

    let fields = keys
        .iter()
        .map(|key| {
            let kind = kinds.get(key).copied().unwrap_or_default();
            let value = match kind {
                FieldKind::Numeric => SummaryValue::Sum(
                    records
                        .subset(subset)
                        .filter_map(|r| r.get(key).and_then(|v| v.as_number()))
                        .sum(),
                ),
                FieldKind::Categorical => {
                    SummaryValue::Values(distinct_values(records, subset, key))
                }
            };
            SummaryField {
                attribute: key.clone(),
                value,
            }
        })
        .collect();

    Summary {
        total: subset.len(),
        fields,
    }
}

fn distinct_values(records: &RecordSet, subset: &[RecordIndex], key: &str) -> Vec<String> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut out = Vec::new();
    let mut labels = Vec::new();

    for record in records.subset(subset) {
        let Some(value) = record.get(key) else {
            continue;
        };
        labels.clear();
        value.collect_labels(&mut labels);
        for label in labels.drain(..) {
            if seen.insert(label.clone()) {
                out.push(label);
            }
        }
    }

    out
}
