//! FILENAME: app/src/matrix/mod.rs
pub mod types;
pub mod utils;
pub mod operations;
pub mod commands;

// Re-export commands so they are easy to access from main.rs
pub use commands::*;
pub use types::*;
