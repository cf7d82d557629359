//! FILENAME: core/matrix-engine/src/definition.rs
//! Matrix Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a data matrix.
//! These structures are designed to be:
//! - Serializable (loaded from static JSON configuration)
//! - Validated once, up front, before anything is rendered
//! - Immutable snapshots of how records are grouped, banded and linked

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{MatrixError, Result};

/// Group key used when a record has no value for a row attribute.
pub const NO_VALUE: &str = "No value";

/// Label of the catch-all band receiving keys no explicit band claims.
pub const CATCH_ALL_LABEL: &str = "N/A";

// ============================================================================
// GROUPING
// ============================================================================

/// Which attributes build the left axis (nested, in order) and the top axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupingSpec {
    /// Row attributes; index = nesting depth.
    pub row_attributes: Vec<String>,

    /// The attribute whose distinct values become columns.
    pub column_attribute: String,
}

impl GroupingSpec {
    pub fn new<S: Into<String>>(row_attributes: Vec<S>, column_attribute: impl Into<String>) -> Self {
        GroupingSpec {
            row_attributes: row_attributes.into_iter().map(Into::into).collect(),
            column_attribute: column_attribute.into(),
        }
    }

    /// Number of row nesting levels.
    pub fn depth(&self) -> usize {
        self.row_attributes.len()
    }

    /// Rejects specs the renderer cannot honour. Called at configuration time.
    pub fn validate(&self) -> Result<()> {
        if self.row_attributes.is_empty() {
            return Err(MatrixError::EmptyRowAttributes);
        }

        for (i, attr) in self.row_attributes.iter().enumerate() {
            if self.row_attributes[..i].contains(attr) {
                return Err(MatrixError::DuplicateRowAttribute(attr.clone()));
            }
        }

        if self.row_attributes.contains(&self.column_attribute) {
            return Err(MatrixError::ColumnDuplicatesRow(self.column_attribute.clone()));
        }

        Ok(())
    }
}

// ============================================================================
// FIELD KINDS
// ============================================================================

/// How the aggregator merges an attribute across records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Values are summed.
    Numeric,
    /// Distinct values are listed in first-seen order.
    Categorical,
}

impl Default for FieldKind {
    fn default() -> Self {
        FieldKind::Categorical
    }
}

// ============================================================================
// SUPER-GROUP BANDS
// ============================================================================

/// A labeled band bucketing several row or column keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Band {
    pub label: String,

    /// Display color hint (CSS color string).
    #[serde(default)]
    pub color: Option<String>,

    /// Keys claimed by this band.
    pub members: Vec<String>,
}

impl Band {
    pub fn new<S: Into<String>>(label: impl Into<String>, members: Vec<S>) -> Self {
        Band {
            label: label.into(),
            color: None,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Ordered bands plus the catch-all that receives unclaimed keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BandConfig {
    pub bands: Vec<Band>,

    #[serde(default = "default_catch_all_label")]
    pub catch_all_label: String,

    #[serde(default)]
    pub catch_all_color: Option<String>,
}

fn default_catch_all_label() -> String {
    CATCH_ALL_LABEL.to_string()
}

impl BandConfig {
    pub fn new(bands: Vec<Band>) -> Self {
        BandConfig {
            bands,
            catch_all_label: default_catch_all_label(),
            catch_all_color: None,
        }
    }

    /// A key may belong to at most one explicit band.
    pub fn validate(&self) -> Result<()> {
        let mut owner: FxHashMap<&str, &str> = FxHashMap::default();
        for band in &self.bands {
            for member in &band.members {
                if let Some(first) = owner.insert(member.as_str(), band.label.as_str()) {
                    if first != band.label {
                        return Err(MatrixError::DuplicateBandMember {
                            key: member.clone(),
                            first: first.to_string(),
                            second: band.label.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Index of the explicit band claiming `key`, or None for the catch-all.
    pub fn band_of(&self, key: &str) -> Option<usize> {
        self.bands
            .iter()
            .position(|band| band.members.iter().any(|m| m == key))
    }
}

// ============================================================================
// FILTER LINKS
// ============================================================================

/// Splits a composite value ("WGS - Illumina") into two facet assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeSplit {
    pub separator: String,

    /// Facet receiving the part after the separator.
    pub second_facet_field: String,
}

/// How one record attribute maps onto a search facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetRule {
    pub facet_field: String,

    /// Group key -> facet term replacements.
    #[serde(default)]
    pub value_renames: FxHashMap<String, String>,

    #[serde(default)]
    pub split: Option<CompositeSplit>,
}

impl FacetRule {
    pub fn new(facet_field: impl Into<String>) -> Self {
        FacetRule {
            facet_field: facet_field.into(),
            value_renames: FxHashMap::default(),
            split: None,
        }
    }
}

/// Rename tables used to turn a block into a search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterLinkConfig {
    /// Attribute name -> facet rule. Attributes without a rule use their own name.
    #[serde(default)]
    pub facets: FxHashMap<String, FacetRule>,

    /// Path every generated link points at.
    #[serde(default = "default_search_path")]
    pub search_path: String,
}

fn default_search_path() -> String {
    "/search/".to_string()
}

impl Default for FilterLinkConfig {
    fn default() -> Self {
        FilterLinkConfig {
            facets: FxHashMap::default(),
            search_path: default_search_path(),
        }
    }
}

impl FilterLinkConfig {
    pub fn with_facet(mut self, attribute: impl Into<String>, rule: FacetRule) -> Self {
        self.facets.insert(attribute.into(), rule);
        self
    }
}

// ============================================================================
// DETAIL OVERLAY
// ============================================================================

/// Which aggregated fields the detail overlay shows, and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayLayout {
    #[serde(default)]
    pub primary_fields: Vec<String>,

    #[serde(default)]
    pub secondary_fields: Vec<String>,

    /// Distinct values listed verbatim before collapsing to "and N more".
    #[serde(default = "default_value_limit")]
    pub value_limit: usize,

    /// Attribute -> human label.
    #[serde(default)]
    pub field_labels: FxHashMap<String, String>,
}

fn default_value_limit() -> usize {
    3
}

impl Default for OverlayLayout {
    fn default() -> Self {
        OverlayLayout {
            primary_fields: Vec::new(),
            secondary_fields: Vec::new(),
            value_limit: default_value_limit(),
            field_labels: FxHashMap::default(),
        }
    }
}

impl OverlayLayout {
    pub fn label_for<'a>(&'a self, attribute: &'a str) -> &'a str {
        self.field_labels
            .get(attribute)
            .map(String::as_str)
            .unwrap_or(attribute)
    }
}

// ============================================================================
// MATRIX DEFINITION
// ============================================================================

/// Complete static configuration of one data matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixDefinition {
    #[serde(flatten)]
    pub grouping: GroupingSpec,

    /// Attributes not listed here are categorical.
    #[serde(default)]
    pub field_kinds: FxHashMap<String, FieldKind>,

    #[serde(default)]
    pub row_bands: Option<BandConfig>,

    #[serde(default)]
    pub column_bands: Option<BandConfig>,

    #[serde(default)]
    pub facets: FilterLinkConfig,

    #[serde(default)]
    pub overlay: OverlayLayout,

    /// Row depths whose groups start open.
    #[serde(default)]
    pub open_depths: Vec<usize>,

    /// Emit per-band column summaries under each row band.
    #[serde(default)]
    pub scope_column_summaries_to_band: bool,

    /// Window for coalescing repeated group toggles.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Shown instead of the grid when there are no records.
    #[serde(default = "default_empty_label")]
    pub empty_label: String,
}

fn default_debounce_ms() -> u64 {
    150
}

fn default_empty_label() -> String {
    "No data available".to_string()
}

impl MatrixDefinition {
    pub fn new(grouping: GroupingSpec) -> Self {
        MatrixDefinition {
            grouping,
            field_kinds: FxHashMap::default(),
            row_bands: None,
            column_bands: None,
            facets: FilterLinkConfig::default(),
            overlay: OverlayLayout::default(),
            open_depths: Vec::new(),
            scope_column_summaries_to_band: false,
            debounce_ms: default_debounce_ms(),
            empty_label: default_empty_label(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.grouping.validate()?;
        if let Some(bands) = &self.row_bands {
            bands.validate()?;
        }
        if let Some(bands) = &self.column_bands {
            bands.validate()?;
        }
        Ok(())
    }

    pub fn field_kind(&self, attribute: &str) -> FieldKind {
        self.field_kinds.get(attribute).copied().unwrap_or_default()
    }

    /// Fields aggregated for the detail overlay, primary first.
    /// Falls back to the grouping attributes when no layout is configured.
    pub fn overlay_fields(&self) -> (Vec<String>, Vec<String>) {
        if self.overlay.primary_fields.is_empty() && self.overlay.secondary_fields.is_empty() {
            let mut primary = self.grouping.row_attributes.clone();
            primary.push(self.grouping.column_attribute.clone());
            return (primary, Vec::new());
        }
        (
            self.overlay.primary_fields.clone(),
            self.overlay.secondary_fields.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping_validation() {
        assert!(GroupingSpec::new(vec!["donor", "tissue"], "assay").validate().is_ok());

        let empty = GroupingSpec::new(Vec::<String>::new(), "assay");
        assert!(matches!(empty.validate(), Err(MatrixError::EmptyRowAttributes)));

        let dup_col = GroupingSpec::new(vec!["donor", "assay"], "assay");
        assert!(matches!(dup_col.validate(), Err(MatrixError::ColumnDuplicatesRow(ref a)) if a == "assay"));

        let dup_row = GroupingSpec::new(vec!["donor", "donor"], "assay");
        assert!(matches!(dup_row.validate(), Err(MatrixError::DuplicateRowAttribute(_))));
    }

    #[test]
    fn test_band_membership_must_be_exclusive() {
        let ok = BandConfig::new(vec![
            Band::new("Donors", vec!["SMHT001", "SMHT004"]),
            Band::new("Cell Lines", vec!["HG002"]),
        ]);
        assert!(ok.validate().is_ok());
        assert_eq!(ok.band_of("HG002"), Some(1));
        assert_eq!(ok.band_of("unknown"), None);

        let clash = BandConfig::new(vec![
            Band::new("Donors", vec!["SMHT001"]),
            Band::new("Cell Lines", vec!["SMHT001"]),
        ]);
        assert!(matches!(clash.validate(), Err(MatrixError::DuplicateBandMember { .. })));
    }

    #[test]
    fn test_definition_from_json_uses_defaults() {
        let json = r#"{
            "row_attributes": ["donor", "tissue"],
            "column_attribute": "assay",
            "field_kinds": { "size": "numeric" },
            "row_bands": { "bands": [ { "label": "Donors", "members": ["SMHT004"] } ] }
        }"#;
        let def: MatrixDefinition = serde_json::from_str(json).unwrap();

        assert_eq!(def.grouping.depth(), 2);
        assert_eq!(def.field_kind("size"), FieldKind::Numeric);
        assert_eq!(def.field_kind("donor"), FieldKind::Categorical);
        assert_eq!(def.row_bands.as_ref().unwrap().catch_all_label, "N/A");
        assert_eq!(def.facets.search_path, "/search/");
        assert_eq!(def.overlay.value_limit, 3);
        assert_eq!(def.debounce_ms, 150);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_overlay_fields_fallback() {
        let def = MatrixDefinition::new(GroupingSpec::new(vec!["donor"], "assay"));
        let (primary, secondary) = def.overlay_fields();
        assert_eq!(primary, vec!["donor".to_string(), "assay".to_string()]);
        assert!(secondary.is_empty());
    }
}
