//! FILENAME: app/src/matrix/commands.rs
//! PURPOSE: Host commands for Data Matrix operations.
//! CONTEXT: Every command takes the shared MatrixState and returns
//! Result<_, String> so errors cross the UI bridge as plain text.

use crate::config::records_from_json;
use crate::matrix::operations::*;
use crate::matrix::types::*;
use crate::matrix::utils::*;
use crate::{log_debug, log_enter, log_exit, log_info, log_warn};
use matrix_engine::{render_matrix_html, render_overlay_html, DataMatrix};
use std::time::Instant;

// ============================================================================
// LIFECYCLE
// ============================================================================

/// Creates a new matrix from a definition and an initial record list
pub fn create_matrix(state: &MatrixState, request: CreateMatrixRequest) -> Result<MatrixViewResponse, String> {
    log_info!(
        "MATRIX",
        "create_matrix rows={:?} column={} records={}",
        request.definition.grouping.row_attributes,
        request.definition.grouping.column_attribute,
        request.records.len()
    );

    let records = records_from_json(request.records);
    let mut matrix = DataMatrix::with_records(request.definition, records).map_err(|e| {
        log_warn!("MATRIX", "create_matrix rejected definition: {}", e);
        e.to_string()
    })?;

    let matrix_id = allocate_id(state)?;
    let response = view_to_response(matrix_id, &mut matrix);

    let mut matrices = state.matrices.lock().map_err(|e| format!("Lock error: {}", e))?;
    matrices.insert(matrix_id, matrix);
    log_info!("MATRIX", "created matrix {}", matrix_id);

    Ok(response)
}

/// Replaces the record list; selection and open groups start over
pub fn replace_records(state: &MatrixState, request: ReplaceRecordsRequest) -> Result<MatrixViewResponse, String> {
    log_info!(
        "MATRIX",
        "replace_records matrix={} records={}",
        request.matrix_id,
        request.records.len()
    );

    let records = records_from_json(request.records);
    with_matrix(state, request.matrix_id, |matrix| {
        matrix.set_records(records);
        Ok(view_to_response(request.matrix_id, matrix))
    })
}

/// Removes a matrix
pub fn delete_matrix(state: &MatrixState, matrix_id: MatrixId) -> Result<(), String> {
    log_info!("MATRIX", "delete_matrix matrix={}", matrix_id);

    let mut matrices = state.matrices.lock().map_err(|e| format!("Lock error: {}", e))?;
    matrices
        .remove(&matrix_id)
        .map(|_| ())
        .ok_or_else(|| format!("Matrix {} not found", matrix_id))
}

// ============================================================================
// VIEW
// ============================================================================

/// Returns the current grid, settling any toggles whose window has passed
pub fn get_matrix_view(state: &MatrixState, matrix_id: MatrixId) -> Result<MatrixViewResponse, String> {
    log_info!("MATRIX", "get_matrix_view matrix={}", matrix_id);

    with_matrix(state, matrix_id, |matrix| {
        matrix.settle(Instant::now());
        Ok(view_to_response(matrix_id, matrix))
    })
}

/// Expands or collapses a row group. Non-immediate toggles are debounced
/// and applied by a later `settle_matrix_toggles` or `get_matrix_view`.
pub fn toggle_matrix_group(state: &MatrixState, request: ToggleGroupRequest) -> Result<ToggleResponse, String> {
    log_info!(
        "MATRIX",
        "toggle_matrix_group matrix={} path={} immediate={}",
        request.matrix_id,
        format_path(&request.path),
        request.immediate
    );

    with_matrix(state, request.matrix_id, |matrix| {
        let accepted = if request.immediate {
            matrix.toggle_now(&request.path)
        } else {
            matrix.request_toggle(&request.path, Instant::now())
        };
        if !accepted {
            log_debug!("MATRIX", "group {} has no toggle", format_path(&request.path));
        }

        Ok(ToggleResponse {
            accepted,
            pending: matrix.has_pending_toggles(),
            view: view_to_response(request.matrix_id, matrix),
        })
    })
}

/// Applies debounced toggles and activations that have been quiet long enough
pub fn settle_matrix_toggles(state: &MatrixState, matrix_id: MatrixId) -> Result<usize, String> {
    log_info!("MATRIX", "settle_matrix_toggles matrix={}", matrix_id);
    with_matrix(state, matrix_id, |matrix| Ok(matrix.settle(Instant::now())))
}

/// Activates count sorting by a column value (desc -> asc -> unordered)
pub fn sort_matrix_by(state: &MatrixState, request: SortRequest) -> Result<MatrixViewResponse, String> {
    log_info!("MATRIX", "sort_matrix_by matrix={} field={}", request.matrix_id, request.field);

    with_matrix(state, request.matrix_id, |matrix| {
        matrix.activate_sort(&request.field);
        Ok(view_to_response(request.matrix_id, matrix))
    })
}

// ============================================================================
// INTERACTION
// ============================================================================

/// Sets the hovered block. Returns false while a block is open.
pub fn hover_matrix_block(state: &MatrixState, request: BlockRequest) -> Result<bool, String> {
    log_info!(
        "MATRIX",
        "hover_matrix_block matrix={} block={}",
        request.matrix_id,
        describe_block(request.block.as_ref())
    );
    with_matrix(state, request.matrix_id, |matrix| Ok(matrix.hover(request.block)))
}

/// Opens a block (or closes it with None) and returns its overlay
pub fn activate_matrix_block(
    state: &MatrixState,
    request: BlockRequest,
    base_url: &str,
) -> Result<Option<OverlayResponse>, String> {
    log_info!(
        "MATRIX",
        "activate_matrix_block matrix={} block={}",
        request.matrix_id,
        describe_block(request.block.as_ref())
    );

    with_matrix(state, request.matrix_id, |matrix| {
        matrix.activate(request.block);
        Ok(matrix.open_overlay(base_url).map(|overlay| OverlayResponse {
            html: render_overlay_html(&overlay),
            overlay,
        }))
    })
}

/// Queues a debounced activation. Rapid requests collapse to the last one,
/// applied by a later `settle_matrix_toggles` or `get_matrix_view`.
/// Returns whether an activation is still pending.
pub fn request_matrix_activation(state: &MatrixState, request: BlockRequest) -> Result<bool, String> {
    log_info!(
        "MATRIX",
        "request_matrix_activation matrix={} block={}",
        request.matrix_id,
        describe_block(request.block.as_ref())
    );

    with_matrix(state, request.matrix_id, |matrix| {
        matrix.request_activate(request.block, Instant::now());
        Ok(matrix.has_pending_activation())
    })
}

/// Overlay content for a block, or for the open block when none is given
pub fn get_block_overlay(state: &MatrixState, request: OverlayRequest) -> Result<OverlayResponse, String> {
    log_info!(
        "MATRIX",
        "get_block_overlay matrix={} block={}",
        request.matrix_id,
        describe_block(request.block.as_ref())
    );

    with_matrix(state, request.matrix_id, |matrix| {
        let overlay = match &request.block {
            Some(block) => matrix.overlay(block, &request.base_url),
            None => matrix.open_overlay(&request.base_url),
        };
        let overlay = overlay.ok_or_else(|| "Block not found".to_string())?;
        Ok(OverlayResponse {
            html: render_overlay_html(&overlay),
            overlay,
        })
    })
}

/// Renders the current grid as HTML
pub fn render_matrix_markup(state: &MatrixState, matrix_id: MatrixId) -> Result<String, String> {
    log_enter!("MATRIX", "render_matrix_markup", "matrix={}", matrix_id);

    let html = with_matrix(state, matrix_id, |matrix| {
        let interaction = matrix.interaction().clone();
        Ok(render_matrix_html(matrix.view(), &interaction))
    })?;

    log_exit!("MATRIX", "render_matrix_markup", "bytes={}", html.len());
    Ok(html)
}
