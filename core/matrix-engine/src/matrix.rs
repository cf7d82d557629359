//! FILENAME: core/matrix-engine/src/matrix.rs
//! DataMatrix - one live grid instance.
//!
//! Owns the record list, the validated definition, the sort state, the
//! open/closed groups and the interaction state. The grouping index and
//! the view are memoized on hashes of exactly the inputs they read, so
//! repeated calls with unchanged inputs return the same snapshot.

use std::time::{Duration, Instant};

use crate::cache::RecordSet;
use crate::definition::MatrixDefinition;
use crate::engine::{calculate_matrix, detail_overlay, resolve_block};
use crate::error::Result;
use crate::filter_link::build_scoped_filter_url;
use crate::grouping::GroupingIndex;
use crate::interaction::{GroupToggles, InteractionState, PendingActivation};
use crate::layout::SortState;
use crate::memo::{memo_key, Memo};
use crate::view::{BlockRef, DetailOverlay, MatrixView};

pub struct DataMatrix {
    definition: MatrixDefinition,
    records: RecordSet,

    /// Bumped whenever `records` is replaced.
    generation: u64,

    sort: SortState,
    toggles: GroupToggles,
    interaction: InteractionState,
    activation: PendingActivation,

    index_memo: Memo<GroupingIndex>,
    view_memo: Memo<MatrixView>,
}

impl DataMatrix {
    /// Creates an empty matrix. Fails if the definition is malformed.
    pub fn new(definition: MatrixDefinition) -> Result<Self> {
        definition.validate()?;
        let toggles = toggles_for(&definition);
        let activation = PendingActivation::new(debounce_window(&definition));
        Ok(DataMatrix {
            definition,
            records: RecordSet::new(),
            generation: 0,
            sort: SortState::unordered(),
            toggles,
            interaction: InteractionState::new(),
            activation,
            index_memo: Memo::new(),
            view_memo: Memo::new(),
        })
    }

    pub fn with_records(definition: MatrixDefinition, records: RecordSet) -> Result<Self> {
        let mut matrix = DataMatrix::new(definition)?;
        matrix.set_records(records);
        Ok(matrix)
    }

    pub fn definition(&self) -> &MatrixDefinition {
        &self.definition
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    /// Replaces the record list. Selection and open groups start over.
    pub fn set_records(&mut self, records: RecordSet) {
        log::debug!(target: "MATRIX", "set_records count={} generation={}", records.len(), self.generation + 1);
        self.records = records;
        self.generation += 1;
        self.interaction.reset();
        self.activation.clear();
        self.toggles.reset();
        self.index_memo.invalidate();
        self.view_memo.invalidate();
    }

    // ========================================================================
    // SORTING
    // ========================================================================

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    /// Activates count sorting by the column value `field` (cycling direction).
    pub fn activate_sort(&mut self, field: &str) -> &SortState {
        self.sort.activate(field);
        log::debug!(target: "MATRIX", "sort field={} direction={:?}", field, self.sort.direction);
        &self.sort
    }

    // ========================================================================
    // GROUP TOGGLES
    // ========================================================================

    /// Whether the group at `path` exposes a toggle.
    pub fn is_collapsible(&mut self, path: &[String]) -> bool {
        self.index()
            .rows
            .find(path)
            .map(|node| !path.is_empty() && node.is_collapsible())
            .unwrap_or(false)
    }

    pub fn is_open(&self, path: &[String]) -> bool {
        self.toggles.is_open(path)
    }

    /// Flips a group right away. Non-collapsible groups ignore toggles.
    pub fn toggle_now(&mut self, path: &[String]) -> bool {
        if !self.is_collapsible(path) {
            log::debug!(target: "MATRIX", "toggle ignored path={:?}", path);
            return false;
        }
        self.toggles.toggle_now(path);
        true
    }

    /// Queues a debounced toggle; applied by `settle`.
    pub fn request_toggle(&mut self, path: &[String], now: Instant) -> bool {
        if !self.is_collapsible(path) {
            log::debug!(target: "MATRIX", "toggle ignored path={:?}", path);
            return false;
        }
        self.toggles.request_toggle(path, now);
        true
    }

    /// Applies toggles and the activation that have been quiet for the
    /// debounce window. Returns how many of them changed state.
    pub fn settle(&mut self, now: Instant) -> usize {
        let mut changed = self.toggles.settle(now);
        if let Some(block) = self.activation.take_due(now) {
            if self.interaction.open() != block.as_ref() {
                self.interaction.activate(block);
                changed += 1;
            }
        }
        if changed > 0 {
            log::debug!(target: "MATRIX", "settled changed={}", changed);
        }
        changed
    }

    pub fn has_pending_toggles(&self) -> bool {
        self.toggles.has_pending()
    }

    // ========================================================================
    // INTERACTION
    // ========================================================================

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn hover(&mut self, block: Option<BlockRef>) -> bool {
        self.interaction.hover(block)
    }

    /// Opens `block` right away, dropping any queued activation.
    pub fn activate(&mut self, block: Option<BlockRef>) {
        self.activation.clear();
        self.interaction.activate(block);
    }

    /// Queues an activation; the last one requested is applied by `settle`.
    pub fn request_activate(&mut self, block: Option<BlockRef>, now: Instant) {
        self.activation.request(block, now);
    }

    pub fn has_pending_activation(&self) -> bool {
        self.activation.has_pending()
    }

    // ========================================================================
    // OUTPUT
    // ========================================================================

    fn index_key(&self) -> u64 {
        memo_key(&(self.generation, &self.definition.grouping))
    }

    fn view_key(&self) -> u64 {
        memo_key(&(
            self.generation,
            &self.definition.grouping,
            &self.definition.row_bands,
            &self.definition.column_bands,
            &self.definition.open_depths,
            self.definition.scope_column_summaries_to_band,
            &self.definition.empty_label,
            &self.sort,
            self.toggles.revision(),
        ))
    }

    /// The grouping index for the current records.
    pub fn index(&mut self) -> &GroupingIndex {
        let key = self.index_key();
        let Self {
            index_memo,
            records,
            definition,
            ..
        } = self;
        index_memo.get_or_compute(key, || GroupingIndex::build(records, &definition.grouping))
    }

    /// The current grid snapshot.
    pub fn view(&mut self) -> &MatrixView {
        let index_key = self.index_key();
        let view_key = self.view_key();
        let Self {
            definition,
            records,
            sort,
            toggles,
            index_memo,
            view_memo,
            ..
        } = self;

        view_memo.get_or_compute(view_key, || {
            let index = index_memo.get_or_compute(index_key, || GroupingIndex::build(records, &definition.grouping));
            calculate_matrix(definition, records, index, sort, toggles)
        })
    }

    /// Number of times the view was served without recomputation.
    pub fn view_cache_hits(&self) -> u64 {
        self.view_memo.hits()
    }

    /// Overlay content for `block`, or None if no such block exists.
    pub fn overlay(&mut self, block: &BlockRef, base_url: &str) -> Option<DetailOverlay> {
        self.index();
        let index = self.index_memo.peek()?;
        detail_overlay(&self.definition, &self.records, index, block, base_url)
    }

    /// Overlay for the open block, if any.
    pub fn open_overlay(&mut self, base_url: &str) -> Option<DetailOverlay> {
        let block = self.interaction.open()?.clone();
        self.overlay(&block, base_url)
    }

    /// Click-through URL for `block`.
    pub fn filter_url(&mut self, block: &BlockRef, base_url: &str) -> Result<String> {
        self.index();
        let band_keys = self
            .index_memo
            .peek()
            .and_then(|index| resolve_block(&self.definition, index, block))
            .map(|resolved| resolved.band_keys)
            .unwrap_or_default();
        let grouping = &self.definition.grouping;
        build_scoped_filter_url(
            base_url,
            &grouping.row_attributes,
            &grouping.column_attribute,
            block,
            &band_keys,
            &self.definition.facets,
        )
    }
}

fn debounce_window(definition: &MatrixDefinition) -> Duration {
    Duration::from_millis(definition.debounce_ms)
}

fn toggles_for(definition: &MatrixDefinition) -> GroupToggles {
    GroupToggles::new(&definition.open_depths, debounce_window(definition))
}
