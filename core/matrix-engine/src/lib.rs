//! FILENAME: core/matrix-engine/src/lib.rs
//! Data Matrix subsystem.
//!
//! A hierarchical cross-tabulation of flat records: row groups nested by
//! several attributes against one column attribute, with per-cell record
//! counts, row and column summaries, optional bands, count sorting,
//! expand/collapse, a hover/open selection with a detail overlay, and
//! filter links that reproduce a block as a search URL.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the matrix IS)
//! - `cache`: Records and attribute values (the input data)
//! - `grouping`: Row tree and column partition (HOW records are bucketed)
//! - `aggregate`: Per-block summaries for the overlay
//! - `layout`: Key ordering, bands and sort state
//! - `view`: Renderable output for the hosting page (WHAT we display)
//! - `engine`: Grid rendering and block resolution (HOW we calculate)
//! - `interaction`: Hover/open state and debounced group toggles
//! - `filter_link`: Search URL construction
//! - `memo`: Single-slot memoization
//! - `matrix`: `DataMatrix`, one stateful grid instance
//! - `markup`: HTML rendering of views and overlays

pub mod error;
pub mod definition;
pub mod cache;
pub mod grouping;
pub mod aggregate;
pub mod layout;
pub mod view;
pub mod engine;
pub mod interaction;
pub mod filter_link;
pub mod memo;
pub mod matrix;
pub mod markup;

pub use error::{MatrixError, Result};
pub use definition::*;
pub use cache::*;
pub use view::*;
pub use grouping::{partition, ColumnPartition, GroupEntry, GroupedNode, GroupingIndex};
pub use aggregate::{aggregate, Summary, SummaryField, SummaryValue};
pub use layout::{order_column_keys, order_row_keys, SortDirection, SortState};
pub use engine::{block_title, calculate_matrix, detail_overlay, resolve_block, ResolvedBlock};
pub use interaction::{GroupToggles, Highlight, InteractionState, PendingActivation};
pub use filter_link::{build_filter_url, build_scoped_filter_url, facet_pairs};
pub use matrix::DataMatrix;
pub use markup::{render_matrix_html, render_overlay_html};
