//! FILENAME: app/src/main.rs
// PURPOSE: Command-line entry point: renders a matrix from JSON files as HTML.
// USAGE: matrix-app <definition.json> <records.json> [log-file]

use std::path::PathBuf;
use std::process::ExitCode;

use matrix_app::config::{load_definition, load_records};
use matrix_app::{init_logging, log_error, log_info};
use matrix_engine::{render_matrix_html, DataMatrix};

fn run(args: &[String]) -> Result<String, String> {
    let (definition_path, records_path) = match args {
        [definition, records, ..] => (PathBuf::from(definition), PathBuf::from(records)),
        _ => return Err("usage: matrix-app <definition.json> <records.json> [log-file]".to_string()),
    };

    let definition = load_definition(&definition_path)?;
    let records = load_records(&records_path)?;
    let mut matrix = DataMatrix::with_records(definition, records).map_err(|e| e.to_string())?;

    let interaction = matrix.interaction().clone();
    Ok(render_matrix_html(matrix.view(), &interaction))
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if let Err(e) = init_logging(args.get(2).map(PathBuf::from)) {
        eprintln!("[LOG_INIT] FAILED: {}", e);
        eprintln!("[LOG_INIT] Continuing with console-only logging");
    }
    log_info!("SYS", "matrix-app starting");

    match run(&args) {
        Ok(html) => {
            println!("{}", html);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_error!("SYS", "{}", e);
            ExitCode::FAILURE
        }
    }
}
