//! FILENAME: core/matrix-engine/src/filter_link.rs
//! Filter-Link Builder - turns a block into a search URL reproducing its filter.
//!
//! The base URL is the currently filtered view. Its unrelated parameters
//! are kept; parameters for the facets the block sets are dropped first
//! (both `field=` and the exclusion form `field!=`) so nothing is filtered
//! twice. No network access, only string building.

use url::Url;

use crate::definition::FilterLinkConfig;
use crate::error::{MatrixError, Result};
use crate::view::BlockRef;

/// Origin used to resolve relative base URLs; never part of the output.
const PLACEHOLDER_ORIGIN: &str = "http://matrix.invalid";

/// Facet assignments for a block: row path up to the block's depth,
/// then the column attribute. Composite values yield two assignments.
pub fn facet_pairs(
    row_attributes: &[String],
    column_attribute: &str,
    block: &BlockRef,
    config: &FilterLinkConfig,
) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for (attribute, value) in row_attributes.iter().zip(block.row_path.iter()) {
        push_assignment(&mut pairs, attribute, value, config);
    }

    if let Some(column_key) = &block.column_key {
        push_assignment(&mut pairs, column_attribute, column_key, config);
    }

    pairs
}

fn push_assignment(
    pairs: &mut Vec<(String, String)>,
    attribute: &str,
    value: &str,
    config: &FilterLinkConfig,
) {
    let Some(rule) = config.facets.get(attribute) else {
        pairs.push((attribute.to_string(), value.to_string()));
        return;
    };

    let value = rule
        .value_renames
        .get(value)
        .map(String::as_str)
        .unwrap_or(value);

    if let Some(split) = &rule.split {
        if let Some((first, second)) = value.split_once(split.separator.as_str()) {
            pairs.push((rule.facet_field.clone(), first.trim().to_string()));
            pairs.push((split.second_facet_field.clone(), second.trim().to_string()));
            return;
        }
    }

    pairs.push((rule.facet_field.clone(), value.to_string()));
}

/// Builds the filter URL for `block` on top of `base_url`.
pub fn build_filter_url(
    base_url: &str,
    row_attributes: &[String],
    column_attribute: &str,
    block: &BlockRef,
    config: &FilterLinkConfig,
) -> Result<String> {
    build_scoped_filter_url(base_url, row_attributes, column_attribute, block, &[], config)
}

/// Like `build_filter_url`, additionally restricting the first row attribute
/// to `band_keys` (used for band-scoped column summaries).
pub fn build_scoped_filter_url(
    base_url: &str,
    row_attributes: &[String],
    column_attribute: &str,
    block: &BlockRef,
    band_keys: &[String],
    config: &FilterLinkConfig,
) -> Result<String> {
    let mut pairs = Vec::new();
    if block.row_path.is_empty() {
        if let Some(first) = row_attributes.first() {
            for key in band_keys {
                push_assignment(&mut pairs, first, key, config);
            }
        }
    }
    pairs.extend(facet_pairs(row_attributes, column_attribute, block, config));

    merge_into_url(base_url, &pairs, &config.search_path)
}

/// Replaces the facets named in `pairs` in `base_url`'s query, keeps the
/// rest, and points the path at `search_path`.
pub fn merge_into_url(base_url: &str, pairs: &[(String, String)], search_path: &str) -> Result<String> {
    let (mut url, relative) = match Url::parse(base_url) {
        Ok(url) => (url, false),
        Err(url::ParseError::RelativeUrlWithoutBase) => (Url::parse(PLACEHOLDER_ORIGIN)?.join(base_url)?, true),
        Err(e) => return Err(MatrixError::InvalidBaseUrl(e)),
    };

    let overridden = |key: &str| {
        let field = key.strip_suffix('!').unwrap_or(key);
        pairs.iter().any(|(facet, _)| facet == field)
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .filter(|(key, _)| !overridden(key))
        .collect();

    url.set_path(search_path);
    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs.iter())
        .extend_pairs(kept.iter());

    if !relative {
        return Ok(url.to_string());
    }

    Ok(match url.query() {
        Some(query) if !query.is_empty() => format!("{}?{}", url.path(), query),
        _ => url.path().to_string(),
    })
}
