//! FILENAME: tests/test_config.rs
//! Integration tests for definition/record loading and the log bridge.

mod common;

use std::io::Write;

use common::DonorFixture;
use matrix_app::config::{load_definition, load_records, parse_records};
use matrix_app::{get_log_path, init_logging, sort_log_file};
use matrix_engine::{AttrValue, DataMatrix, FieldKind};
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_definition_from_file() {
    let file = write_temp(&DonorFixture::definition().to_string());
    let definition = load_definition(file.path()).unwrap();

    assert_eq!(definition.grouping.row_attributes, vec!["donor", "tissue"]);
    assert_eq!(definition.field_kind("size"), FieldKind::Numeric);
    assert_eq!(definition.field_kind("tissue"), FieldKind::Categorical);
    let bands = definition.row_bands.as_ref().unwrap();
    assert_eq!(bands.catch_all_label, "N/A");
    assert_eq!(bands.bands[0].color.as_deref(), Some("#1f77b4"));
    assert_eq!(definition.overlay.value_limit, 3);
}

#[test]
fn test_load_definition_rejects_overlapping_bands() {
    let file = write_temp(
        r#"{
            "row_attributes": ["donor"],
            "column_attribute": "assay",
            "row_bands": { "bands": [
                { "label": "One", "members": ["A"] },
                { "label": "Two", "members": ["A"] }
            ] }
        }"#,
    );
    let err = load_definition(file.path()).unwrap_err();
    assert!(err.contains("'A'"));
}

#[test]
fn test_missing_definition_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_definition(&dir.path().join("missing.json")).is_err());
}

#[test]
fn test_load_records_from_file() {
    let records = serde_json::to_string(&DonorFixture::records()).unwrap();
    let file = write_temp(&records);
    let set = load_records(file.path()).unwrap();

    assert_eq!(set.len(), 9);
    let first = set.get(0).unwrap();
    assert_eq!(first.group_key("donor"), "SMHT001");
    assert_eq!(first.get("size"), Some(&AttrValue::Number(10.0)));
    assert_eq!(set.get(5).unwrap().group_key("tissue"), "No value");
}

#[test]
fn test_list_values_group_joined() {
    let set = parse_records(r#"[{"donor": "A", "tissue": ["Skin", "Lung"], "assay": "WGS"}]"#).unwrap();
    assert_eq!(set.get(0).unwrap().group_key("tissue"), "Skin, Lung");
}

#[test]
fn test_engine_logs_reach_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("logs").join("matrix.log");
    init_logging(Some(log_path.clone())).unwrap();
    // A second call only reopens the file.
    init_logging(Some(log_path.clone())).unwrap();
    assert_eq!(get_log_path(), Some(log_path.clone()));

    let definition = load_definition(write_temp(&DonorFixture::definition().to_string()).path()).unwrap();
    let records = parse_records(&serde_json::to_string(&DonorFixture::records()).unwrap()).unwrap();
    let mut matrix = DataMatrix::with_records(definition, records).unwrap();
    matrix.view();

    sort_log_file().unwrap();
    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert!(contents.lines().any(|l| l.contains("|D|MATRIX|calculate records=9")));
    assert!(contents.lines().all(|l| l.split('|').count() >= 4));
}
