//! FILENAME: core/matrix-engine/src/layout.rs
//! Layout / Sort Planner - decides axis ordering and band assignment.
//!
//! Row keys are ordered by band membership (or lexicographically), then
//! optionally re-sorted by a live count. Column keys never take part in
//! count sorting. Every sort here is stable.

use serde::{Deserialize, Serialize};

use crate::definition::{BandConfig, NO_VALUE};
use crate::grouping::{ColumnPartition, GroupedNode};

// ============================================================================
// SORT STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Descending,
    Ascending,
    Unordered,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Unordered
    }
}

/// Which column value row keys are count-sorted by, and in which direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortState {
    pub field: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn unordered() -> Self {
        SortState::default()
    }

    pub fn by(field: impl Into<String>, direction: SortDirection) -> Self {
        SortState {
            field: Some(field.into()),
            direction,
        }
    }

    /// The field to count-sort by, unless the state is unordered.
    pub fn active_field(&self) -> Option<&str> {
        match self.direction {
            SortDirection::Unordered => None,
            _ => self.field.as_deref(),
        }
    }

    /// Repeated activation of one field cycles desc -> asc -> unordered;
    /// a different field starts again at desc.
    pub fn activate(&mut self, field: &str) {
        if self.field.as_deref() == Some(field) {
            self.direction = match self.direction {
                SortDirection::Descending => SortDirection::Ascending,
                SortDirection::Ascending => SortDirection::Unordered,
                SortDirection::Unordered => SortDirection::Descending,
            };
        } else {
            self.field = Some(field.to_string());
            self.direction = SortDirection::Descending;
        }
    }
}

// ============================================================================
// BANDS
// ============================================================================

/// Keys that fell into one band, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandAssignment {
    pub label: String,
    pub color: Option<String>,
    pub is_catch_all: bool,
    pub keys: Vec<String>,
}

/// Splits `keys` into bands: configured bands in order, catch-all last.
/// Bands that end up with no keys are omitted.
pub fn assign_bands(keys: &[String], config: &BandConfig) -> Vec<BandAssignment> {
    let mut per_band: Vec<Vec<String>> = vec![Vec::new(); config.bands.len()];
    let mut rest: Vec<String> = Vec::new();

    for key in keys {
        match config.band_of(key) {
            Some(b) => per_band[b].push(key.clone()),
            None => rest.push(key.clone()),
        }
    }

    let mut out: Vec<BandAssignment> = config
        .bands
        .iter()
        .zip(per_band)
        .filter(|(_, keys)| !keys.is_empty())
        .map(|(band, keys)| BandAssignment {
            label: band.label.clone(),
            color: band.color.clone(),
            is_catch_all: false,
            keys,
        })
        .collect();

    if !rest.is_empty() {
        out.push(BandAssignment {
            label: config.catch_all_label.clone(),
            color: config.catch_all_color.clone(),
            is_catch_all: true,
            keys: rest,
        });
    }

    out
}

/// Default key order: by band (first-seen within a band) when bands are
/// configured, else lexicographic with the fallback key last.
pub fn default_key_order(keys: Vec<String>, bands: Option<&BandConfig>) -> Vec<String> {
    match bands {
        Some(config) => assign_bands(&keys, config)
            .into_iter()
            .flat_map(|band| band.keys)
            .collect(),
        None => {
            let mut keys = keys;
            keys.sort_by(|a, b| (a == NO_VALUE).cmp(&(b == NO_VALUE)).then_with(|| a.cmp(b)));
            keys
        }
    }
}

// ============================================================================
// AXIS ORDERING
// ============================================================================

/// Orders the child keys of `node`.
/// With an active sort, keys are stably re-sorted by how many of their
/// records carry the sort field as column value (0 if none).
pub fn order_row_keys(
    node: &GroupedNode,
    columns: &ColumnPartition,
    bands: Option<&BandConfig>,
    sort: &SortState,
) -> Vec<String> {
    let keys: Vec<String> = node.entries().iter().map(|e| e.key.clone()).collect();
    let mut ordered = default_key_order(keys, bands);

    let Some(field) = sort.active_field() else {
        return ordered;
    };

    let target = columns.position(field);
    let count_for = |key: &str| -> usize {
        let Some(target) = target else {
            return 0;
        };
        node.entry(key)
            .map(|entry| {
                entry
                    .node
                    .record_indices()
                    .into_iter()
                    .filter(|&i| columns.bucket_of(i) == Some(target))
                    .count()
            })
            .unwrap_or(0)
    };

    let mut counted: Vec<(usize, String)> = ordered.drain(..).map(|k| (count_for(&k), k)).collect();
    match sort.direction {
        SortDirection::Ascending => counted.sort_by(|a, b| a.0.cmp(&b.0)),
        SortDirection::Descending => counted.sort_by(|a, b| b.0.cmp(&a.0)),
        SortDirection::Unordered => {}
    }

    counted.into_iter().map(|(_, k)| k).collect()
}

/// Orders column keys by band, or lexicographically without bands.
pub fn order_column_keys(columns: &ColumnPartition, bands: Option<&BandConfig>) -> Vec<String> {
    let keys: Vec<String> = columns.keys().map(str::to_string).collect();
    default_key_order(keys, bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{AttrValue, RecordSet};
    use crate::definition::{Band, GroupingSpec};
    use crate::grouping::partition;

    fn rec(donor: &str, assay: &str) -> Vec<(&'static str, AttrValue)> {
        vec![("donor", AttrValue::from(donor)), ("assay", AttrValue::from(assay))]
    }

    fn fixture() -> (GroupedNode, ColumnPartition) {
        let records = RecordSet::from_maps(vec![
            rec("C", "WGS"),
            rec("A", "WGS"),
            rec("B", "WGS"),
            rec("B", "WGS"),
            rec("B", "RNA-seq"),
            rec("A", "RNA-seq"),
            rec("A", "RNA-seq"),
            rec("A", "RNA-seq"),
            rec("C", "RNA-seq"),
            rec("C", "RNA-seq"),
        ]);
        partition(&records, &GroupingSpec::new(vec!["donor"], "assay"))
    }

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sort_cycle() {
        let mut sort = SortState::unordered();
        sort.activate("WGS");
        assert_eq!(sort, SortState::by("WGS", SortDirection::Descending));
        sort.activate("WGS");
        assert_eq!(sort.direction, SortDirection::Ascending);
        sort.activate("WGS");
        assert_eq!(sort.direction, SortDirection::Unordered);
        assert_eq!(sort.active_field(), None);
        sort.activate("WGS");
        assert_eq!(sort.direction, SortDirection::Descending);

        sort.activate("WGS");
        sort.activate("RNA-seq");
        assert_eq!(sort, SortState::by("RNA-seq", SortDirection::Descending));
    }

    #[test]
    fn test_unordered_is_lexicographic() {
        let (rows, columns) = fixture();
        let keys = order_row_keys(&rows, &columns, None, &SortState::unordered());
        assert_eq!(keys, strings(&["A", "B", "C"]));
        assert_eq!(order_column_keys(&columns, None), strings(&["RNA-seq", "WGS"]));
    }

    #[test]
    fn test_count_sort_and_reversal() {
        let (rows, columns) = fixture();
        // RNA-seq counts: A=3, B=1, C=2
        let desc = order_row_keys(&rows, &columns, None, &SortState::by("RNA-seq", SortDirection::Descending));
        assert_eq!(desc, strings(&["A", "C", "B"]));

        let again = order_row_keys(&rows, &columns, None, &SortState::by("RNA-seq", SortDirection::Descending));
        assert_eq!(desc, again);

        let asc = order_row_keys(&rows, &columns, None, &SortState::by("RNA-seq", SortDirection::Ascending));
        let mut reversed = desc.clone();
        reversed.reverse();
        assert_eq!(asc, reversed);
    }

    #[test]
    fn test_count_sort_ties_keep_base_order() {
        let (rows, columns) = fixture();
        // WGS counts: A=1, B=2, C=1
        let desc = order_row_keys(&rows, &columns, None, &SortState::by("WGS", SortDirection::Descending));
        assert_eq!(desc, strings(&["B", "A", "C"]));

        // Unknown field: everything counts 0, base order survives.
        let none = order_row_keys(&rows, &columns, None, &SortState::by("ATAC", SortDirection::Ascending));
        assert_eq!(none, strings(&["A", "B", "C"]));
    }

    #[test]
    fn test_band_order_first_seen_within_band() {
        let (rows, columns) = fixture();
        let bands = BandConfig::new(vec![Band::new("Cell Lines", vec!["B", "Z"])]);

        let keys = order_row_keys(&rows, &columns, Some(&bands), &SortState::unordered());
        // B claimed first; C and A fall to N/A in first-seen order.
        assert_eq!(keys, strings(&["B", "C", "A"]));
    }

    #[test]
    fn test_bands_partition_keys() {
        let keys = strings(&["SMHT001", "HG002", "SMHT004", "COLO829", "X"]);
        let config = BandConfig::new(vec![
            Band::new("Donors", vec!["SMHT004", "SMHT001"]).with_color("#4a90d9"),
            Band::new("Cell Lines", vec!["HG002", "COLO829"]),
            Band::new("Unused", vec!["nothing"]),
        ]);
        let bands = assign_bands(&keys, &config);

        let labels: Vec<&str> = bands.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Donors", "Cell Lines", "N/A"]);
        assert_eq!(bands[0].keys, strings(&["SMHT001", "SMHT004"]));
        assert_eq!(bands[0].color.as_deref(), Some("#4a90d9"));
        assert!(bands[2].is_catch_all);

        let mut all: Vec<String> = bands.into_iter().flat_map(|b| b.keys).collect();
        all.sort();
        let mut expected = keys.clone();
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_fallback_key_sorts_last() {
        let ordered = default_key_order(strings(&[NO_VALUE, "Brain", "Adrenal"]), None);
        assert_eq!(ordered, strings(&["Adrenal", "Brain", NO_VALUE]));
    }
}
