//! FILENAME: app/src/matrix/operations.rs
use crate::log_debug;
use crate::matrix::types::*;
use matrix_engine::DataMatrix;

// ============================================================================
// STATE OPERATIONS
// ============================================================================

/// Runs `f` against the matrix with `matrix_id`, holding the state lock.
pub(crate) fn with_matrix<T, F>(state: &MatrixState, matrix_id: MatrixId, f: F) -> Result<T, String>
where
    F: FnOnce(&mut DataMatrix) -> Result<T, String>,
{
    let mut matrices = state.matrices.lock().map_err(|e| format!("Lock error: {}", e))?;
    let matrix = matrices
        .get_mut(&matrix_id)
        .ok_or_else(|| format!("Matrix {} not found", matrix_id))?;
    f(matrix)
}

/// Allocates the next matrix id.
pub(crate) fn allocate_id(state: &MatrixState) -> Result<MatrixId, String> {
    let mut next_id = state.next_matrix_id.lock().map_err(|e| format!("Lock error: {}", e))?;
    let matrix_id = *next_id;
    *next_id += 1;
    Ok(matrix_id)
}

/// Builds the response for the matrix's current (memoized) view.
pub(crate) fn view_to_response(matrix_id: MatrixId, matrix: &mut DataMatrix) -> MatrixViewResponse {
    let sort = matrix.sort_state().clone();
    let hovered = matrix.interaction().hovered().cloned();
    let open = matrix.interaction().open().cloned();
    let view = matrix.view().clone();

    log_debug!(
        "MATRIX",
        "view matrix={} rows={} columns={} total={}",
        matrix_id,
        view.rows().count(),
        view.columns.len(),
        view.total_count
    );

    MatrixViewResponse {
        matrix_id,
        total_count: view.total_count,
        row_count: view.rows().count(),
        column_count: view.columns.len(),
        sort,
        hovered,
        open,
        view,
    }
}
