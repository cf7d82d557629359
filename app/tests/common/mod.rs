//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for Data Matrix host integration tests.

#![allow(dead_code)]

use matrix_app::config::parse_definition;
use matrix_app::matrix::{create_matrix, CreateMatrixRequest, MatrixViewResponse};
use matrix_app::{create_app_state, AppState, MatrixId, MatrixState};
use serde_json::{json, Map, Value};

/// Test harness for creating and managing test state.
pub struct TestHarness {
    pub state: AppState,
}

impl TestHarness {
    /// Create a new test harness with no matrices.
    pub fn new() -> Self {
        TestHarness {
            state: create_app_state(),
        }
    }

    pub fn matrices(&self) -> &MatrixState {
        &self.state.matrices
    }

    /// Create a harness holding one matrix over the donor fixture.
    pub fn with_donor_matrix() -> (Self, MatrixId) {
        let harness = Self::new();
        let response = harness
            .create(DonorFixture::definition(), DonorFixture::records())
            .expect("fixture matrix");
        let id = response.matrix_id;
        (harness, id)
    }

    pub fn create(&self, definition: Value, records: Vec<Map<String, Value>>) -> Result<MatrixViewResponse, String> {
        let definition = parse_definition(&definition.to_string())?;
        create_matrix(self.matrices(), CreateMatrixRequest { definition, records })
    }
}

/// Donor x assay files, with one donor lacking tissues and one file lacking an assay.
pub struct DonorFixture;

impl DonorFixture {
    pub fn definition() -> Value {
        json!({
            "row_attributes": ["donor", "tissue"],
            "column_attribute": "assay",
            "field_kinds": { "size": "numeric" },
            "row_bands": {
                "bands": [
                    { "label": "Donors", "color": "#1f77b4", "members": ["SMHT001", "SMHT004"] },
                    { "label": "Cell Lines", "members": ["HG002", "COLO829"] }
                ]
            },
            "facets": {
                "facets": {
                    "donor": { "facet_field": "donors.display_title" },
                    "assay": { "facet_field": "file_sets.libraries.assay.display_title" }
                }
            },
            "overlay": {
                "primary_fields": ["donor", "tissue"],
                "secondary_fields": ["size"],
                "field_labels": { "donor": "Donors", "tissue": "Tissues", "size": "Size" }
            }
        })
    }

    pub fn rows() -> Vec<(&'static str, Option<&'static str>, Option<&'static str>, f64)> {
        vec![
            ("SMHT001", Some("Skin"), Some("WGS"), 10.0),
            ("SMHT001", Some("Skin"), Some("WGS"), 5.0),
            ("SMHT001", Some("Liver"), Some("RNA-seq"), 2.0),
            ("SMHT004", Some("Brain"), Some("WGS"), 8.0),
            ("SMHT004", Some("Brain"), Some("ATAC-seq"), 1.0),
            ("HG002", None, Some("WGS"), 30.0),
            ("HG002", None, Some("Fiber-seq"), 12.0),
            ("COLO829", Some("Skin"), Some("WGS"), 4.0),
            ("COLO829", Some("Skin"), None, 3.0),
        ]
    }

    pub fn records() -> Vec<Map<String, Value>> {
        Self::rows()
            .into_iter()
            .map(|(donor, tissue, assay, size)| {
                let mut map = Map::new();
                map.insert("donor".to_string(), json!(donor));
                if let Some(tissue) = tissue {
                    map.insert("tissue".to_string(), json!(tissue));
                }
                if let Some(assay) = assay {
                    map.insert("assay".to_string(), json!(assay));
                }
                map.insert("size".to_string(), json!(size));
                map
            })
            .collect()
    }
}

pub fn path(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|s| s.to_string()).collect()
}
