//! FILENAME: app/src/lib.rs
// PURPOSE: Host library for Data Matrix grids.
// CONTEXT: Owns the live matrices, exposes the command layer and routes
// engine logging into the unified log stream.

pub mod logging;
pub mod config;
pub mod matrix;

pub use logging::{get_log_path, init_logging, sort_log_file, write_log};
pub use matrix::{MatrixId, MatrixState};

/// Shared host state handed to every command.
pub struct AppState {
    pub matrices: MatrixState,
}

pub fn create_app_state() -> AppState {
    log_info!("SYS", "Creating AppState");
    AppState {
        matrices: MatrixState::new(),
    }
}
