//! FILENAME: core/matrix-engine/src/grouping.rs
//! Grouping Index - partitions a record list by the grouping spec.
//!
//! Rows become a nested tree keyed by the ordered row attributes; the
//! column attribute gets a separate flat partition built once over the
//! full set. Both keep keys in first-seen order so any later ordering
//! step has a stable baseline.

use rustc_hash::FxHashMap;

use crate::cache::{RecordIndex, RecordSet};
use crate::definition::{GroupingSpec, NO_VALUE};

// ============================================================================
// ROW TREE
// ============================================================================

/// One level of the nested row grouping.
/// Leaves hold the record indices of a group at the deepest row attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupedNode {
    Leaf(Vec<RecordIndex>),
    Branch(Vec<GroupEntry>),
}

/// A keyed child of a `Branch`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEntry {
    pub key: String,
    pub node: GroupedNode,
}

impl GroupedNode {
    /// Child entries in first-seen order. Empty for leaves.
    pub fn entries(&self) -> &[GroupEntry] {
        match self {
            GroupedNode::Leaf(_) => &[],
            GroupedNode::Branch(entries) => entries,
        }
    }

    pub fn entry(&self, key: &str) -> Option<&GroupEntry> {
        self.entries().iter().find(|e| e.key == key)
    }

    /// Follows a key path down the tree.
    pub fn find(&self, path: &[String]) -> Option<&GroupedNode> {
        let mut node = self;
        for key in path {
            node = &node.entry(key)?.node;
        }
        Some(node)
    }

    /// All record indices under this node, ascending.
    pub fn record_indices(&self) -> Vec<RecordIndex> {
        let mut out = Vec::new();
        self.collect_indices(&mut out);
        out.sort_unstable();
        out
    }

    fn collect_indices(&self, out: &mut Vec<RecordIndex>) {
        match self {
            GroupedNode::Leaf(indices) => out.extend_from_slice(indices),
            GroupedNode::Branch(entries) => {
                for entry in entries {
                    entry.node.collect_indices(out);
                }
            }
        }
    }

    pub fn record_count(&self) -> usize {
        match self {
            GroupedNode::Leaf(indices) => indices.len(),
            GroupedNode::Branch(entries) => entries.iter().map(|e| e.node.record_count()).sum(),
        }
    }

    /// Whether the group can be opened or closed. A group whose only child
    /// is the "No value" fallback has nothing to reveal.
    pub fn is_collapsible(&self) -> bool {
        match self {
            GroupedNode::Leaf(_) => false,
            GroupedNode::Branch(entries) => match entries.as_slice() {
                [] => false,
                [only] => only.key != NO_VALUE,
                _ => true,
            },
        }
    }
}

// ============================================================================
// COLUMN PARTITION
// ============================================================================

/// Records sharing one value of the column attribute.
#[derive(Debug, Clone, PartialEq)]
struct ColumnBucket {
    key: String,
    records: Vec<RecordIndex>,
}

/// Flat partition of records by the column attribute.
/// Records without a column value are absent, not bucketed.
#[derive(Debug, Clone, Default)]
pub struct ColumnPartition {
    buckets: Vec<ColumnBucket>,
    positions: FxHashMap<String, usize>,
    /// Record index -> bucket position.
    bucket_of: Vec<Option<usize>>,
}

impl ColumnPartition {
    /// Builds the partition over `indices` (a subset of `records`, or all of them).
    pub fn build(
        records: &RecordSet,
        indices: impl IntoIterator<Item = RecordIndex>,
        attribute: &str,
    ) -> Self {
        let mut partition = ColumnPartition {
            buckets: Vec::new(),
            positions: FxHashMap::default(),
            bucket_of: vec![None; records.len()],
        };

        for index in indices {
            let Some(record) = records.get(index) else {
                continue;
            };
            let Some(key) = record.column_key(attribute) else {
                continue;
            };
            let position = match partition.positions.get(&key) {
                Some(&p) => p,
                None => {
                    let p = partition.buckets.len();
                    partition.positions.insert(key.clone(), p);
                    partition.buckets.push(ColumnBucket { key, records: Vec::new() });
                    p
                }
            };
            partition.buckets[position].records.push(index);
            partition.bucket_of[index] = Some(position);
        }

        partition
    }

    /// Column keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|b| b.key.as_str())
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn get(&self, key: &str) -> Option<&[RecordIndex]> {
        self.position(key).map(|p| self.buckets[p].records.as_slice())
    }

    /// Bucket position holding `record`, if it has a column value.
    pub fn bucket_of(&self, record: RecordIndex) -> Option<usize> {
        self.bucket_of.get(record).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

// ============================================================================
// GROUPING INDEX
// ============================================================================

/// The row tree and column partition computed together from one record set.
#[derive(Debug, Clone)]
pub struct GroupingIndex {
    pub rows: GroupedNode,
    pub columns: ColumnPartition,
}

impl GroupingIndex {
    pub fn build(records: &RecordSet, spec: &GroupingSpec) -> Self {
        let (rows, columns) = partition(records, spec);
        GroupingIndex { rows, columns }
    }
}

/// Partitions `records` into the nested row tree and the column partition.
/// Every record lands in exactly one leaf. O(records x depth).
pub fn partition(records: &RecordSet, spec: &GroupingSpec) -> (GroupedNode, ColumnPartition) {
    let all: Vec<RecordIndex> = (0..records.len()).collect();
    let rows = if spec.row_attributes.is_empty() {
        GroupedNode::Leaf(all.clone())
    } else {
        build_level(records, &spec.row_attributes, 0, &all)
    };
    let columns = ColumnPartition::build(records, all, &spec.column_attribute);

    log::debug!(
        target: "MATRIX",
        "partition records={} top_groups={} columns={}",
        records.len(),
        rows.entries().len(),
        columns.len()
    );

    (rows, columns)
}

fn build_level(
    records: &RecordSet,
    attributes: &[String],
    depth: usize,
    indices: &[RecordIndex],
) -> GroupedNode {
    let attribute = &attributes[depth];
    let mut order: Vec<(String, Vec<RecordIndex>)> = Vec::new();
    let mut seen: FxHashMap<String, usize> = FxHashMap::default();

    for record in records.subset(indices) {
        let key = record.group_key(attribute);
        match seen.get(&key) {
            Some(&slot) => order[slot].1.push(record.index()),
            None => {
                seen.insert(key.clone(), order.len());
                order.push((key, vec![record.index()]));
            }
        }
    }

    let is_last = depth + 1 == attributes.len();
    let entries = order
        .into_iter()
        .map(|(key, members)| {
            let node = if is_last {
                GroupedNode::Leaf(members)
            } else {
                build_level(records, attributes, depth + 1, &members)
            };
            GroupEntry { key, node }
        })
        .collect();

    GroupedNode::Branch(entries)
}

/// Intersection of two ascending index lists.
pub fn intersect_sorted(a: &[RecordIndex], b: &[RecordIndex]) -> Vec<RecordIndex> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
