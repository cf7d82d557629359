//! FILENAME: core/matrix-engine/src/engine.rs
//! Matrix Engine - The renderer that turns grouped records into a grid.
//!
//! This module takes a MatrixDefinition (configuration), the RecordSet and
//! its GroupingIndex (data) and produces a MatrixView.
//!
//! Algorithm:
//! 1. Order the column axis (bands or lexicographic) and map buckets to slots
//! 2. Order depth-0 row keys (bands, then optional count sort) and split them
//!    into row bands
//! 3. Walk each band depth-first, emitting one row per visible group with a
//!    regular block per column and a row-summary block
//! 4. Emit column summaries per band (optional) and once for the grid
//!
//! Blocks with no records are still emitted so the grid stays rectangular.

use crate::aggregate::aggregate;
use crate::cache::{RecordIndex, RecordSet};
use crate::definition::{MatrixDefinition, NO_VALUE};
use crate::filter_link::build_scoped_filter_url;
use crate::grouping::{intersect_sorted, GroupEntry, GroupedNode, GroupingIndex};
use crate::interaction::GroupToggles;
use crate::layout::{assign_bands, order_column_keys, order_row_keys, SortState};
use crate::view::{
    BandSpan, Block, BlockKind, BlockRef, ColumnHeader, DetailOverlay, GroupPath, MatrixRow,
    MatrixView, OverlayEntry, RowSection,
};

// ============================================================================
// MATRIX CALCULATOR
// ============================================================================

/// The main rendering engine for data matrices.
pub struct MatrixCalculator<'a> {
    definition: &'a MatrixDefinition,
    records: &'a RecordSet,
    index: &'a GroupingIndex,
    sort: &'a SortState,
    toggles: &'a GroupToggles,

    /// Column keys in render order.
    column_keys: Vec<String>,

    /// Column bucket position -> render slot.
    slot_of_bucket: Vec<Option<usize>>,
}

impl<'a> MatrixCalculator<'a> {
    pub fn new(
        definition: &'a MatrixDefinition,
        records: &'a RecordSet,
        index: &'a GroupingIndex,
        sort: &'a SortState,
        toggles: &'a GroupToggles,
    ) -> Self {
        MatrixCalculator {
            definition,
            records,
            index,
            sort,
            toggles,
            column_keys: Vec::new(),
            slot_of_bucket: Vec::new(),
        }
    }

    /// Executes the full layout and returns the view.
    pub fn calculate(&mut self) -> MatrixView {
        let grouping = &self.definition.grouping;

        if self.records.is_empty() {
            return MatrixView::empty(
                grouping.row_attributes.clone(),
                grouping.column_attribute.clone(),
                self.definition.empty_label.clone(),
            );
        }

        // Step 1: Column axis
        self.column_keys = order_column_keys(&self.index.columns, self.definition.column_bands.as_ref());
        self.slot_of_bucket = vec![None; self.index.columns.len()];
        for (slot, key) in self.column_keys.iter().enumerate() {
            if let Some(position) = self.index.columns.position(key) {
                self.slot_of_bucket[position] = Some(slot);
            }
        }
        let (columns, column_bands) = self.column_headers();

        // Step 2: Depth-0 row order, split into bands
        let top_keys = order_row_keys(
            &self.index.rows,
            &self.index.columns,
            self.definition.row_bands.as_ref(),
            self.sort,
        );

        // Step 3: Sections
        let mut sections = Vec::new();
        match &self.definition.row_bands {
            Some(config) => {
                let mut start = 0;
                for band in assign_bands(&top_keys, config) {
                    let span = BandSpan {
                        label: band.label,
                        color: band.color,
                        is_catch_all: band.is_catch_all,
                        start,
                        span: band.keys.len(),
                    };
                    start += span.span;
                    sections.push(self.build_section(Some(span), band.keys));
                }
            }
            None => sections.push(self.build_section(None, top_keys)),
        }

        // Step 4: Grid-wide column summaries
        let column_summaries = self.column_summaries(None, None);

        let view = MatrixView {
            row_attributes: grouping.row_attributes.clone(),
            column_attribute: grouping.column_attribute.clone(),
            columns,
            column_bands,
            sections,
            column_summaries,
            total_count: self.records.len(),
            empty_label: None,
        };

        log::debug!(
            target: "MATRIX",
            "calculate records={} columns={} visible_rows={} sections={}",
            view.total_count,
            view.columns.len(),
            view.rows().count(),
            view.sections.len()
        );

        view
    }

    fn column_headers(&self) -> (Vec<ColumnHeader>, Vec<BandSpan>) {
        let Some(config) = &self.definition.column_bands else {
            let headers = self
                .column_keys
                .iter()
                .map(|key| ColumnHeader { key: key.clone(), band: None })
                .collect();
            return (headers, Vec::new());
        };

        let mut headers = Vec::with_capacity(self.column_keys.len());
        let mut spans = Vec::new();
        for (band_idx, band) in assign_bands(&self.column_keys, config).into_iter().enumerate() {
            spans.push(BandSpan {
                label: band.label,
                color: band.color,
                is_catch_all: band.is_catch_all,
                start: headers.len(),
                span: band.keys.len(),
            });
            headers.extend(band.keys.into_iter().map(|key| ColumnHeader {
                key,
                band: Some(band_idx),
            }));
        }
        (headers, spans)
    }

    fn build_section(&self, band: Option<BandSpan>, keys: Vec<String>) -> RowSection {
        let mut rows = Vec::new();
        for key in &keys {
            if let Some(entry) = self.index.rows.entry(key) {
                let mut path = GroupPath::new();
                path.push(key.clone());
                self.walk(entry, path, 0, &mut rows);
            }
        }

        let column_summaries = match &band {
            Some(span) if self.definition.scope_column_summaries_to_band => {
                self.column_summaries(Some(keys.as_slice()), Some(&span.label))
            }
            _ => Vec::new(),
        };

        RowSection {
            band,
            keys,
            rows,
            column_summaries,
        }
    }

    /// Emits the row for `entry`, then its visible descendants.
    fn walk(&self, entry: &GroupEntry, path: GroupPath, depth: usize, rows: &mut Vec<MatrixRow>) {
        let indices = entry.node.record_indices();
        let (cells, summary) = self.row_strip(&path, &indices);

        let is_expandable = entry.node.is_collapsible();
        let is_open = is_expandable && self.toggles.is_open(&path);

        rows.push(MatrixRow {
            path: path.clone(),
            key: entry.key.clone(),
            depth,
            is_expandable,
            is_open,
            cells,
            summary,
        });

        if is_open {
            self.walk_children(&entry.node, &path, depth + 1, rows);
        } else if !is_expandable {
            // A chain of lone "No value" children has no rows of its own;
            // the first level below the chain with a real split is shown
            // in place.
            let mut node = &entry.node;
            let mut child_path = path;
            let mut child_depth = depth;
            while let [only] = node.entries() {
                if only.key != NO_VALUE {
                    break;
                }
                child_path.push(only.key.clone());
                child_depth += 1;
                node = &only.node;
            }
            if child_depth > depth && node.is_collapsible() {
                self.walk_children(node, &child_path, child_depth + 1, rows);
            }
        }
    }

    fn walk_children(&self, node: &GroupedNode, parent: &GroupPath, depth: usize, rows: &mut Vec<MatrixRow>) {
        for key in order_row_keys(node, &self.index.columns, None, self.sort) {
            if let Some(entry) = node.entry(&key) {
                let mut path = parent.clone();
                path.push(key);
                self.walk(entry, path, depth, rows);
            }
        }
    }

    /// Regular blocks for one row plus its row summary. Each block is the
    /// intersection of the row's records with one column bucket.
    fn row_strip(&self, path: &GroupPath, indices: &[RecordIndex]) -> (Vec<Block>, Block) {
        let mut per_slot: Vec<Vec<RecordIndex>> = vec![Vec::new(); self.column_keys.len()];
        let mut in_any_column = Vec::new();

        for &record in indices {
            let slot = self
                .index
                .columns
                .bucket_of(record)
                .and_then(|bucket| self.slot_of_bucket.get(bucket).copied().flatten());
            if let Some(slot) = slot {
                per_slot[slot].push(record);
                in_any_column.push(record);
            }
        }

        let cells = per_slot
            .into_iter()
            .zip(self.column_keys.iter())
            .map(|(records, key)| Block::new(BlockRef::regular(path.iter().cloned(), key.clone()), records))
            .collect();

        let summary = Block::new(BlockRef::row_summary(path.iter().cloned()), in_any_column);
        (cells, summary)
    }

    /// One block per column: all rows, or only the depth-0 keys in `scope`.
    fn column_summaries(&self, scope: Option<&[String]>, band: Option<&str>) -> Vec<Block> {
        let scoped_records = scope.map(|keys| records_under(&self.index.rows, keys));

        self.column_keys
            .iter()
            .map(|key| {
                let bucket = self.index.columns.get(key).unwrap_or(&[]);
                let records = match &scoped_records {
                    Some(scoped) => intersect_sorted(scoped, bucket),
                    None => bucket.to_vec(),
                };
                Block::new(BlockRef::col_summary(key.clone(), band.map(str::to_string)), records)
            })
            .collect()
    }
}

/// Ascending record indices under the given depth-0 keys.
fn records_under(rows: &GroupedNode, keys: &[String]) -> Vec<RecordIndex> {
    let mut out: Vec<RecordIndex> = keys
        .iter()
        .filter_map(|key| rows.entry(key))
        .flat_map(|entry| entry.node.record_indices())
        .collect();
    out.sort_unstable();
    out
}

// ============================================================================
// BLOCK RESOLUTION & DETAIL OVERLAY
// ============================================================================

/// Records behind a block, plus the depth-0 keys of its row band if scoped.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBlock {
    pub records: Vec<RecordIndex>,
    pub band_keys: Vec<String>,
}

/// Recomputes a block's record subset straight from the index, whether or
/// not the block is currently visible. None if the block does not exist.
pub fn resolve_block(
    definition: &MatrixDefinition,
    index: &GroupingIndex,
    block: &BlockRef,
) -> Option<ResolvedBlock> {
    let columns = &index.columns;

    let records = match block.kind {
        BlockKind::Regular => {
            let position = columns.position(block.column_key.as_deref()?)?;
            index
                .rows
                .find(&block.row_path)?
                .record_indices()
                .into_iter()
                .filter(|&r| columns.bucket_of(r) == Some(position))
                .collect()
        }
        BlockKind::RowSummary => index
            .rows
            .find(&block.row_path)?
            .record_indices()
            .into_iter()
            .filter(|&r| columns.bucket_of(r).is_some())
            .collect(),
        BlockKind::ColSummary => {
            let bucket = columns.get(block.column_key.as_deref()?)?;
            match &block.band {
                None => bucket.to_vec(),
                Some(label) => {
                    let band_keys = band_members(definition, index, label)?;
                    let scoped = records_under(&index.rows, &band_keys);
                    return Some(ResolvedBlock {
                        records: intersect_sorted(&scoped, bucket),
                        band_keys,
                    });
                }
            }
        }
    };

    Some(ResolvedBlock {
        records,
        band_keys: Vec::new(),
    })
}

/// Depth-0 keys present in the data that fall into the row band `label`.
fn band_members(definition: &MatrixDefinition, index: &GroupingIndex, label: &str) -> Option<Vec<String>> {
    let config = definition.row_bands.as_ref()?;
    let keys: Vec<String> = index.rows.entries().iter().map(|e| e.key.clone()).collect();
    assign_bands(&keys, config)
        .into_iter()
        .find(|band| band.label == label)
        .map(|band| band.keys)
}

/// Human title of a block for the overlay header.
pub fn block_title(block: &BlockRef) -> String {
    let column = block.column_key.as_deref().unwrap_or_default();
    match block.kind {
        BlockKind::Regular => format!("{} \u{d7} {}", block.row_path.join(" / "), column),
        BlockKind::RowSummary => block.row_path.join(" / "),
        BlockKind::ColSummary => match &block.band {
            Some(band) => format!("{} ({})", column, band),
            None => column.to_string(),
        },
    }
}

/// Builds the overlay content for `block`: aggregated fields in the
/// configured layout and the "Browse Files" link.
pub fn detail_overlay(
    definition: &MatrixDefinition,
    records: &RecordSet,
    index: &GroupingIndex,
    block: &BlockRef,
    base_url: &str,
) -> Option<DetailOverlay> {
    let resolved = resolve_block(definition, index, block)?;
    let (primary_fields, secondary_fields) = definition.overlay_fields();

    let mut keys = primary_fields.clone();
    keys.extend(secondary_fields.iter().cloned());
    let summary = aggregate(records, &resolved.records, &keys, &definition.field_kinds);

    let limit = definition.overlay.value_limit;
    let entries = |fields: &[String]| -> Vec<OverlayEntry> {
        fields
            .iter()
            .filter_map(|attribute| summary.get(attribute))
            .map(|field| OverlayEntry {
                attribute: field.attribute.clone(),
                label: definition.overlay.label_for(&field.attribute).to_string(),
                text: field.display(limit),
            })
            .collect()
    };

    let grouping = &definition.grouping;
    let browse_url = match build_scoped_filter_url(
        base_url,
        &grouping.row_attributes,
        &grouping.column_attribute,
        block,
        &resolved.band_keys,
        &definition.facets,
    ) {
        Ok(url) => Some(url),
        Err(e) => {
            log::warn!(target: "MATRIX", "filter link for '{}' failed: {}", block_title(block), e);
            None
        }
    };

    let count = resolved.records.len();
    Some(DetailOverlay {
        block: block.clone(),
        title: block_title(block),
        count,
        primary: entries(&primary_fields),
        secondary: entries(&secondary_fields),
        browse_enabled: count > 0 && browse_url.is_some(),
        browse_url,
    })
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Lays out a matrix view. This is the main entry point for rendering.
pub fn calculate_matrix(
    definition: &MatrixDefinition,
    records: &RecordSet,
    index: &GroupingIndex,
    sort: &SortState,
    toggles: &GroupToggles,
) -> MatrixView {
    let mut calculator = MatrixCalculator::new(definition, records, index, sort, toggles);
    calculator.calculate()
}
