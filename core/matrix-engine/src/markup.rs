//! FILENAME: core/matrix-engine/src/markup.rs
//! HTML rendering of a computed view and of the detail overlay.
//!
//! Every block element carries the data attributes the hosting page hooks
//! into: `data-block-type`, `data-group-key`, `data-column-key`,
//! `data-count` and, when selected, `data-active`.

use crate::interaction::InteractionState;
use crate::view::{BandSpan, Block, DetailOverlay, MatrixRow, MatrixView, OverlayEntry};

/// Renders the whole grid (or the empty indicator) as one `<div>`.
pub fn render_matrix_html(view: &MatrixView, interaction: &InteractionState) -> String {
    let mut html = String::new();

    if let Some(label) = &view.empty_label {
        html.push_str(&format!(
            r#"<div class="data-matrix data-matrix-empty"><div class="no-data-indicator">{}</div></div>"#,
            escape_html(label)
        ));
        return html;
    }

    html.push_str(&format!(
        r#"<div class="data-matrix" data-total-count="{}">"#,
        view.total_count
    ));

    // Header: optional column band strip, then the column keys.
    html.push_str(r#"<div class="matrix-header">"#);
    if !view.column_bands.is_empty() {
        html.push_str(r#"<div class="matrix-column-bands">"#);
        for band in &view.column_bands {
            push_band(&mut html, "column-band", band);
        }
        html.push_str("</div>");
    }
    html.push_str(&format!(
        r#"<div class="matrix-header-row"><div class="matrix-corner">{}</div>"#,
        escape_html(&view.row_attributes.join(" / "))
    ));
    for column in &view.columns {
        html.push_str(&format!(
            r#"<button type="button" class="matrix-column-header" data-column-key="{}">{}</button>"#,
            escape_html(&column.key),
            escape_html(&column.key)
        ));
    }
    html.push_str(r#"<div class="matrix-column-header matrix-total-header">Total</div>"#);
    html.push_str("</div></div>");

    html.push_str(r#"<div class="matrix-body">"#);
    for section in &view.sections {
        html.push_str(r#"<div class="matrix-section">"#);
        if let Some(band) = &section.band {
            push_band(&mut html, "row-band", band);
        }
        for row in &section.rows {
            push_row(&mut html, row, interaction);
        }
        if !section.column_summaries.is_empty() {
            html.push_str(r#"<div class="matrix-row matrix-band-summary">"#);
            for block in &section.column_summaries {
                push_block(&mut html, block, interaction);
            }
            html.push_str("</div>");
        }
        html.push_str("</div>");
    }
    html.push_str("</div>");

    html.push_str(r#"<div class="matrix-row matrix-column-summaries"><div class="matrix-row-label">Total</div>"#);
    for block in &view.column_summaries {
        push_block(&mut html, block, interaction);
    }
    html.push_str(&format!(
        r#"<div class="matrix-grand-total">{}</div>"#,
        view.total_count
    ));
    html.push_str("</div>");

    html.push_str("</div>");
    html
}

fn push_band(html: &mut String, class: &str, band: &BandSpan) {
    let style = band
        .color
        .as_deref()
        .map(|c| format!(r#" style="background-color: {};""#, escape_html(c)))
        .unwrap_or_default();
    html.push_str(&format!(
        r#"<div class="{}{}" data-band="{}" data-span="{}"{}>{}</div>"#,
        class,
        if band.is_catch_all { " catch-all" } else { "" },
        escape_html(&band.label),
        band.span,
        style,
        escape_html(&band.label)
    ));
}

fn push_row(html: &mut String, row: &MatrixRow, interaction: &InteractionState) {
    html.push_str(&format!(
        r#"<div class="matrix-row" data-depth="{}" data-group-key="{}">"#,
        row.depth,
        escape_html(&row.key)
    ));

    html.push_str(r#"<div class="matrix-row-label">"#);
    if row.is_expandable {
        html.push_str(&format!(
            r#"<button type="button" class="group-toggle" aria-expanded="{}">{}</button>"#,
            row.is_open,
            if row.is_open { "-" } else { "+" }
        ));
    }
    html.push_str(&format!("<span>{}</span></div>", escape_html(&row.key)));

    for block in &row.cells {
        push_block(html, block, interaction);
    }
    push_block(html, &row.summary, interaction);
    html.push_str("</div>");
}

fn push_block(html: &mut String, block: &Block, interaction: &InteractionState) {
    let id = &block.id;
    let mut attrs = format!(r#" data-block-type="{}""#, id.kind.as_str());
    if let Some(key) = id.row_key() {
        attrs.push_str(&format!(r#" data-group-key="{}""#, escape_html(key)));
    }
    if let Some(key) = &id.column_key {
        attrs.push_str(&format!(r#" data-column-key="{}""#, escape_html(key)));
    }
    if let Some(band) = &id.band {
        attrs.push_str(&format!(r#" data-band="{}""#, escape_html(band)));
    }
    attrs.push_str(&format!(r#" data-count="{}""#, block.count));
    if let Some(highlight) = interaction.highlight_of(id) {
        attrs.push_str(&format!(r#" data-active="{}""#, highlight.as_str()));
    }

    let class = if block.count == 0 { "matrix-block empty" } else { "matrix-block" };
    html.push_str(&format!(r#"<div class="{}"{}>{}</div>"#, class, attrs, block.count));
}

/// Renders the overlay for an open block.
pub fn render_overlay_html(overlay: &DetailOverlay) -> String {
    let mut html = String::new();

    html.push_str(&format!(
        r#"<div class="matrix-overlay" data-block-type="{}" data-count="{}">"#,
        overlay.block.kind.as_str(),
        overlay.count
    ));
    html.push_str(&format!(
        r#"<div class="overlay-title"><strong>{}</strong><span class="overlay-count">{} {}</span></div>"#,
        escape_html(&overlay.title),
        overlay.count,
        if overlay.count == 1 { "File" } else { "Files" }
    ));

    push_entries(&mut html, "overlay-primary", &overlay.primary);
    push_entries(&mut html, "overlay-secondary", &overlay.secondary);

    match (&overlay.browse_url, overlay.browse_enabled) {
        (Some(url), true) => html.push_str(&format!(
            r#"<a class="overlay-browse" href="{}">Browse Files</a>"#,
            escape_html(url)
        )),
        _ => html.push_str(r#"<a class="overlay-browse disabled" aria-disabled="true">Browse Files</a>"#),
    }

    html.push_str("</div>");
    html
}

fn push_entries(html: &mut String, class: &str, entries: &[OverlayEntry]) {
    if entries.is_empty() {
        return;
    }
    html.push_str(&format!(r#"<div class="{}">"#, class));
    for entry in entries {
        html.push_str(&format!(
            r#"<div class="overlay-row" data-attribute="{}"><span class="overlay-label">{}</span><span class="overlay-value">{}</span></div>"#,
            escape_html(&entry.attribute),
            escape_html(&entry.label),
            escape_html(&entry.text)
        ));
    }
    html.push_str("</div>");
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{AttrValue, RecordSet};
    use crate::definition::{GroupingSpec, MatrixDefinition};
    use crate::matrix::DataMatrix;
    use crate::view::BlockRef;

    fn rec(donor: &str, tissue: &str, assay: &str) -> Vec<(&'static str, AttrValue)> {
        vec![
            ("donor", AttrValue::from(donor)),
            ("tissue", AttrValue::from(tissue)),
            ("assay", AttrValue::from(assay)),
        ]
    }

    fn matrix() -> DataMatrix {
        let def = MatrixDefinition::new(GroupingSpec::new(vec!["donor", "tissue"], "assay"));
        let records = RecordSet::from_maps(vec![
            rec("A", "Skin", "WGS"),
            rec("A", "Liver", "RNA-seq"),
            rec("B", "", "WGS"),
        ]);
        DataMatrix::with_records(def, records).unwrap()
    }

    #[test]
    fn test_blocks_carry_data_attributes() {
        let mut m = matrix();
        m.activate(Some(BlockRef::regular(["A"], "WGS")));
        let interaction = m.interaction().clone();
        let html = render_matrix_html(m.view(), &interaction);

        assert!(html.contains(
            r#"data-block-type="regular" data-group-key="A" data-column-key="WGS" data-count="1" data-active="open""#
        ));
        assert!(html.contains(r#"data-block-type="row-summary" data-group-key="A" data-count="2""#));
        assert!(html.contains(r#"data-block-type="col-summary" data-column-key="WGS" data-count="2""#));
        assert!(html.contains(r#"data-block-type="regular" data-group-key="B" data-column-key="RNA-seq" data-count="0""#));
    }

    #[test]
    fn test_toggle_only_on_expandable_rows() {
        let mut m = matrix();
        let html = render_matrix_html(m.view(), &InteractionState::new());
        assert_eq!(html.matches("group-toggle").count(), 1);
        assert!(html.contains(r#"data-depth="0" data-group-key="A""#));
    }

    #[test]
    fn test_empty_grid_renders_indicator() {
        let def = MatrixDefinition::new(GroupingSpec::new(vec!["donor"], "assay"));
        let mut m = DataMatrix::new(def).unwrap();
        let html = render_matrix_html(m.view(), &InteractionState::new());
        assert!(html.contains("no-data-indicator"));
        assert!(html.contains("No data available"));
        assert!(!html.contains("data-block-type"));
    }

    #[test]
    fn test_overlay_browse_link() {
        let mut m = matrix();
        let overlay = m
            .overlay(&BlockRef::regular(["A"], "WGS"), "/browse/?type=File")
            .unwrap();
        let html = render_overlay_html(&overlay);
        assert!(html.contains(r#"href="/search/?donor=A&amp;assay=WGS&amp;type=File""#));

        let empty = m
            .overlay(&BlockRef::regular(["B"], "RNA-seq"), "/browse/?type=File")
            .unwrap();
        let html = render_overlay_html(&empty);
        assert!(html.contains(r#"aria-disabled="true""#));
        assert!(!html.contains("href="));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }
}
