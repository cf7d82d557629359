//! FILENAME: app/src/matrix/utils.rs
use matrix_engine::{BlockKind, BlockRef};

// ============================================================================
// FORMATTING UTILS
// ============================================================================

/// Renders a row path for log lines: ["A", "Skin"] -> "A/Skin", [] -> "<root>"
pub(crate) fn format_path(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join("/")
    }
}

/// Short description of a block for log lines.
pub(crate) fn describe_block(block: Option<&BlockRef>) -> String {
    let Some(block) = block else {
        return "none".to_string();
    };
    let column = block.column_key.as_deref().unwrap_or("*");
    match block.kind {
        BlockKind::Regular => format!("regular {} x {}", format_path(&block.row_path), column),
        BlockKind::RowSummary => format!("row-summary {}", format_path(&block.row_path)),
        BlockKind::ColSummary => match &block.band {
            Some(band) => format!("col-summary {} band={}", column, band),
            None => format!("col-summary {}", column),
        },
    }
}
