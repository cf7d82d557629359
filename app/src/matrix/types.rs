//! FILENAME: app/src/matrix/types.rs
use std::collections::HashMap;
use std::sync::Mutex;

use matrix_engine::{BlockRef, DataMatrix, DetailOverlay, MatrixDefinition, MatrixView, SortState};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type MatrixId = u32;

/// All live matrices owned by the host.
pub struct MatrixState {
    pub matrices: Mutex<HashMap<MatrixId, DataMatrix>>,
    pub next_matrix_id: Mutex<MatrixId>,
}

impl MatrixState {
    pub fn new() -> Self {
        MatrixState {
            matrices: Mutex::new(HashMap::new()),
            next_matrix_id: Mutex::new(1),
        }
    }
}

impl Default for MatrixState {
    fn default() -> Self {
        MatrixState::new()
    }
}

/// Request to create a new matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMatrixRequest {
    pub definition: MatrixDefinition,
    /// Flat record objects; may be empty and filled later
    #[serde(default)]
    pub records: Vec<Map<String, Value>>,
}

/// Request to replace a matrix's records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceRecordsRequest {
    pub matrix_id: MatrixId,
    pub records: Vec<Map<String, Value>>,
}

/// Request to toggle a row group's expand/collapse state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleGroupRequest {
    pub matrix_id: MatrixId,
    /// Row keys from depth 0 down to the group
    pub path: Vec<String>,
    /// Apply right away instead of waiting for the debounce window
    #[serde(default)]
    pub immediate: bool,
}

/// Request to activate count sorting by a column value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortRequest {
    pub matrix_id: MatrixId,
    pub field: String,
}

/// Request to hover or open a block (None clears)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRequest {
    pub matrix_id: MatrixId,
    pub block: Option<BlockRef>,
}

/// Request for overlay content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayRequest {
    pub matrix_id: MatrixId,
    /// Defaults to the currently open block
    #[serde(default)]
    pub block: Option<BlockRef>,
    /// The currently filtered page URL the link is built on
    pub base_url: String,
}

/// Response containing the matrix view data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixViewResponse {
    pub matrix_id: MatrixId,
    pub total_count: usize,
    pub row_count: usize,
    pub column_count: usize,
    pub sort: SortState,
    pub hovered: Option<BlockRef>,
    pub open: Option<BlockRef>,
    pub view: MatrixView,
}

/// Result of a toggle command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleResponse {
    /// False when the group has no toggle
    pub accepted: bool,
    /// A debounced toggle is still waiting
    pub pending: bool,
    pub view: MatrixViewResponse,
}

/// Overlay content plus its HTML rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayResponse {
    pub overlay: DetailOverlay,
    pub html: String,
}
