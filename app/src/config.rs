//! FILENAME: app/src/config.rs
// PURPOSE: Loading matrix definitions and record lists from JSON.

use std::path::Path;

use matrix_engine::{AttrValue, MatrixDefinition, RecordSet};
use serde_json::{Map, Value};

use crate::log_info;

/// Reads and validates a matrix definition from a JSON file.
pub fn load_definition(path: &Path) -> Result<MatrixDefinition, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read definition {:?}: {}", path, e))?;
    let definition = parse_definition(&text)
        .map_err(|e| format!("Invalid definition {:?}: {}", path, e))?;
    log_info!(
        "CONFIG",
        "loaded definition rows={:?} column={}",
        definition.grouping.row_attributes,
        definition.grouping.column_attribute
    );
    Ok(definition)
}

/// Parses and validates a matrix definition from JSON text.
pub fn parse_definition(json: &str) -> Result<MatrixDefinition, String> {
    let definition: MatrixDefinition = serde_json::from_str(json).map_err(|e| e.to_string())?;
    definition.validate().map_err(|e| e.to_string())?;
    Ok(definition)
}

/// Reads a JSON array of flat objects into a record set.
pub fn parse_records(json: &str) -> Result<RecordSet, String> {
    let rows: Vec<Map<String, Value>> =
        serde_json::from_str(json).map_err(|e| format!("Invalid records: {}", e))?;
    Ok(records_from_json(rows))
}

pub fn load_records(path: &Path) -> Result<RecordSet, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read records {:?}: {}", path, e))?;
    let records = parse_records(&text)?;
    log_info!("CONFIG", "loaded {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Converts already-parsed JSON objects into a record set.
pub fn records_from_json(rows: Vec<Map<String, Value>>) -> RecordSet {
    RecordSet::from_maps(
        rows.into_iter()
            .map(|row| row.into_iter().map(|(k, v)| (k, attr_from_json(v))).collect::<Vec<_>>()),
    )
}

/// Nested objects carry no groupable value and map to `Empty`.
pub fn attr_from_json(value: Value) -> AttrValue {
    match value {
        Value::Null | Value::Object(_) => AttrValue::Empty,
        Value::Bool(b) => AttrValue::Boolean(b),
        Value::Number(n) => n.as_f64().map(AttrValue::Number).unwrap_or(AttrValue::Empty),
        Value::String(s) => AttrValue::Text(s),
        Value::Array(items) => AttrValue::List(items.into_iter().map(attr_from_json).collect()),
    }
}
