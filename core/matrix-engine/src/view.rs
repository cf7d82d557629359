//! FILENAME: core/matrix-engine/src/view.rs
//! Matrix View - Renderable output for the hosting page.
//!
//! This module holds the computed, read-only grid. It includes metadata for:
//! - Row hierarchy (depth, expand/collapse)
//! - Row and column bands
//! - Blocks (regular, row-summary, col-summary) with their record subsets
//! - The detail overlay shown for an open block

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cache::RecordIndex;

/// Row keys from depth 0 down to a group.
pub type GroupPath = SmallVec<[String; 4]>;

// ============================================================================
// BLOCKS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Regular,
    RowSummary,
    ColSummary,
}

impl BlockKind {
    /// Value of the `data-block-type` markup attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Regular => "regular",
            BlockKind::RowSummary => "row-summary",
            BlockKind::ColSummary => "col-summary",
        }
    }
}

/// Identity of a block, independent of its contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockRef {
    pub kind: BlockKind,

    /// Empty for col-summary blocks.
    pub row_path: GroupPath,

    /// None for row-summary blocks.
    pub column_key: Option<String>,

    /// Row band label a col-summary is scoped to.
    pub band: Option<String>,
}

impl BlockRef {
    pub fn regular<S: Into<String>>(row_path: impl IntoIterator<Item = S>, column_key: impl Into<String>) -> Self {
        BlockRef {
            kind: BlockKind::Regular,
            row_path: row_path.into_iter().map(Into::into).collect(),
            column_key: Some(column_key.into()),
            band: None,
        }
    }

    pub fn row_summary<S: Into<String>>(row_path: impl IntoIterator<Item = S>) -> Self {
        BlockRef {
            kind: BlockKind::RowSummary,
            row_path: row_path.into_iter().map(Into::into).collect(),
            column_key: None,
            band: None,
        }
    }

    pub fn col_summary(column_key: impl Into<String>, band: Option<String>) -> Self {
        BlockRef {
            kind: BlockKind::ColSummary,
            row_path: GroupPath::new(),
            column_key: Some(column_key.into()),
            band,
        }
    }

    /// Deepest row key, if the block belongs to a row.
    pub fn row_key(&self) -> Option<&str> {
        self.row_path.last().map(String::as_str)
    }
}

/// One rendered aggregate cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockRef,
    pub records: Vec<RecordIndex>,
    pub count: usize,
}

impl Block {
    pub fn new(id: BlockRef, records: Vec<RecordIndex>) -> Self {
        let count = records.len();
        Block { id, records, count }
    }
}

// ============================================================================
// ROWS, COLUMNS, BANDS
// ============================================================================

/// One visual row: a group at some depth with its strip of blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixRow {
    pub path: GroupPath,
    pub key: String,
    pub depth: usize,

    /// Whether a collapse/expand toggle is exposed.
    pub is_expandable: bool,
    pub is_open: bool,

    /// Regular blocks, one per column in column order.
    pub cells: Vec<Block>,
    pub summary: Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnHeader {
    pub key: String,

    /// Index into `MatrixView::column_bands`.
    pub band: Option<usize>,
}

/// A labeled run of consecutive columns or depth-0 rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandSpan {
    pub label: String,
    pub color: Option<String>,
    pub is_catch_all: bool,
    pub start: usize,
    pub span: usize,
}

/// Rows belonging to one row band (or all rows when no bands are configured).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowSection {
    pub band: Option<BandSpan>,

    /// Depth-0 keys of this band.
    pub keys: Vec<String>,
    pub rows: Vec<MatrixRow>,

    /// Column summaries scoped to this band; empty unless enabled.
    pub column_summaries: Vec<Block>,
}

// ============================================================================
// MATRIX VIEW
// ============================================================================

/// The complete computed grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixView {
    pub row_attributes: Vec<String>,
    pub column_attribute: String,
    pub columns: Vec<ColumnHeader>,
    pub column_bands: Vec<BandSpan>,
    pub sections: Vec<RowSection>,

    /// Grid-wide column summaries, one per column.
    pub column_summaries: Vec<Block>,
    pub total_count: usize,

    /// Set instead of a grid when there is nothing to show.
    pub empty_label: Option<String>,
}

impl MatrixView {
    pub fn empty(row_attributes: Vec<String>, column_attribute: String, label: String) -> Self {
        MatrixView {
            row_attributes,
            column_attribute,
            columns: Vec::new(),
            column_bands: Vec::new(),
            sections: Vec::new(),
            column_summaries: Vec::new(),
            total_count: 0,
            empty_label: Some(label),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty_label.is_some()
    }

    /// Visible rows across all sections, in render order.
    pub fn rows(&self) -> impl Iterator<Item = &MatrixRow> {
        self.sections.iter().flat_map(|s| s.rows.iter())
    }

    pub fn row(&self, path: &[String]) -> Option<&MatrixRow> {
        self.rows().find(|r| r.path.as_slice() == path)
    }

    pub fn column_index(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key == key)
    }

    /// Every block in the grid, row strips first.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.rows()
            .flat_map(|r| r.cells.iter().chain(std::iter::once(&r.summary)))
            .chain(self.sections.iter().flat_map(|s| s.column_summaries.iter()))
            .chain(self.column_summaries.iter())
    }
}

// ============================================================================
// DETAIL OVERLAY
// ============================================================================

/// One labeled line of the overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayEntry {
    pub attribute: String,
    pub label: String,
    pub text: String,
}

/// Content shown for the open block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailOverlay {
    pub block: BlockRef,
    pub title: String,
    pub count: usize,
    pub primary: Vec<OverlayEntry>,
    pub secondary: Vec<OverlayEntry>,

    /// Target of the "Browse Files" action.
    pub browse_url: Option<String>,
    pub browse_enabled: bool,
}
