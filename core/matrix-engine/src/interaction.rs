//! FILENAME: core/matrix-engine/src/interaction.rs
//! Interaction State - hovered/open block and open/closed row groups.
//!
//! One `InteractionState` exists per grid. It is only changed through
//! `hover` and `activate`, which keep the two slots exclusive: while a
//! block is open no hover is accepted. Activations and group toggles can
//! also be queued and applied once the UI has been quiet for a short window.

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::view::{BlockRef, GroupPath};

// ============================================================================
// BLOCK SELECTION
// ============================================================================

/// Visual state a block can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Highlight {
    Hovered,
    Open,
}

impl Highlight {
    pub fn as_str(&self) -> &'static str {
        match self {
            Highlight::Hovered => "hover",
            Highlight::Open => "open",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionState {
    hovered: Option<BlockRef>,
    open: Option<BlockRef>,
}

impl InteractionState {
    pub fn new() -> Self {
        InteractionState::default()
    }

    /// Sets the hovered block. Ignored while a block is open.
    /// Returns whether the state changed.
    pub fn hover(&mut self, block: Option<BlockRef>) -> bool {
        if self.open.is_some() || self.hovered == block {
            return false;
        }
        self.hovered = block;
        true
    }

    /// Opens `block` (closing any other) and clears the hover.
    /// `None` closes the open block.
    pub fn activate(&mut self, block: Option<BlockRef>) {
        self.hovered = None;
        self.open = block;
    }

    pub fn hovered(&self) -> Option<&BlockRef> {
        self.hovered.as_ref()
    }

    pub fn open(&self) -> Option<&BlockRef> {
        self.open.as_ref()
    }

    pub fn highlight_of(&self, block: &BlockRef) -> Option<Highlight> {
        if self.open.as_ref() == Some(block) {
            Some(Highlight::Open)
        } else if self.hovered.as_ref() == Some(block) {
            Some(Highlight::Hovered)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.hovered = None;
        self.open = None;
    }
}

/// Coalesces rapid activations. Only the last requested block is applied,
/// once no further request arrived for the debounce window.
#[derive(Debug, Clone)]
pub struct PendingActivation {
    pending: Option<(Option<BlockRef>, Instant)>,
    window: Duration,
}

impl PendingActivation {
    pub fn new(window: Duration) -> Self {
        PendingActivation { pending: None, window }
    }

    /// Replaces any earlier request and restarts the window.
    pub fn request(&mut self, block: Option<BlockRef>, now: Instant) {
        self.pending = Some((block, now));
    }

    /// Takes the request if it has been quiet for the window.
    pub fn take_due(&mut self, now: Instant) -> Option<Option<BlockRef>> {
        let due = matches!(
            &self.pending,
            Some((_, requested_at)) if now.saturating_duration_since(*requested_at) >= self.window
        );
        if !due {
            return None;
        }
        self.pending.take().map(|(block, _)| block)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

// ============================================================================
// GROUP TOGGLES
// ============================================================================

#[derive(Debug, Clone)]
struct PendingToggle {
    open: bool,
    requested_at: Instant,
}

/// Open/closed state of row groups.
///
/// Groups start closed unless their depth is pre-opened. Explicit toggles
/// override the depth default. Requests made through `request_toggle`
/// are coalesced: only the last requested state of a group is applied,
/// once the group has been quiet for the debounce window.
#[derive(Debug, Clone)]
pub struct GroupToggles {
    open_depths: Vec<usize>,
    overrides: FxHashMap<GroupPath, bool>,
    pending: FxHashMap<GroupPath, PendingToggle>,
    window: Duration,
    revision: u64,
}

impl GroupToggles {
    pub fn new(open_depths: &[usize], window: Duration) -> Self {
        GroupToggles {
            open_depths: open_depths.to_vec(),
            overrides: FxHashMap::default(),
            pending: FxHashMap::default(),
            window,
            revision: 0,
        }
    }

    /// Applied state of the group at `path` (depth = path length - 1).
    pub fn is_open(&self, path: &[String]) -> bool {
        if let Some(&open) = self.overrides.get(path) {
            return open;
        }
        let depth = path.len().saturating_sub(1);
        self.open_depths.contains(&depth)
    }

    /// Flips a group immediately, dropping any pending request for it.
    pub fn toggle_now(&mut self, path: &[String]) -> bool {
        self.pending.remove(path);
        let open = !self.is_open(path);
        self.overrides.insert(path.iter().cloned().collect(), open);
        self.revision += 1;
        open
    }

    /// Queues a flip relative to the latest requested state.
    pub fn request_toggle(&mut self, path: &[String], now: Instant) {
        let current = match self.pending.get(path) {
            Some(pending) => pending.open,
            None => self.is_open(path),
        };
        self.pending.insert(
            path.iter().cloned().collect(),
            PendingToggle {
                open: !current,
                requested_at: now,
            },
        );
    }

    /// Applies requests quiet for at least the window. Returns how many
    /// groups actually changed state.
    pub fn settle(&mut self, now: Instant) -> usize {
        let window = self.window;
        let due: Vec<GroupPath> = self
            .pending
            .iter()
            .filter(|(_, p)| now.saturating_duration_since(p.requested_at) >= window)
            .map(|(path, _)| path.clone())
            .collect();

        let mut changed = 0;
        for path in due {
            let Some(pending) = self.pending.remove(&path) else {
                continue;
            };
            if self.is_open(&path) != pending.open {
                self.overrides.insert(path, pending.open);
                changed += 1;
            }
        }

        if changed > 0 {
            self.revision += 1;
        }
        changed
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Bumped on every applied change; part of the view memo key.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn open_depths(&self) -> &[usize] {
        &self.open_depths
    }

    pub fn reset(&mut self) {
        self.overrides.clear();
        self.pending.clear();
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_activate_is_exclusive() {
        let a = BlockRef::regular(["A", "Skin"], "WGS");
        let b = BlockRef::row_summary(["B"]);

        let mut state = InteractionState::new();
        state.activate(Some(a.clone()));
        state.activate(Some(b.clone()));

        assert_eq!(state.open(), Some(&b));
        assert_eq!(state.highlight_of(&a), None);
        assert_eq!(state.highlight_of(&b), Some(Highlight::Open));
    }

    #[test]
    fn test_hover_blocked_while_open() {
        let a = BlockRef::regular(["A"], "WGS");
        let b = BlockRef::regular(["B"], "WGS");

        let mut state = InteractionState::new();
        assert!(state.hover(Some(a.clone())));
        assert_eq!(state.hovered(), Some(&a));

        state.activate(Some(b.clone()));
        assert_eq!(state.hovered(), None);
        assert!(!state.hover(Some(a.clone())));
        assert!(!state.hover(None));
        assert_eq!(state.hovered(), None);

        state.activate(None);
        assert_eq!(state.open(), None);
        assert!(state.hover(Some(a)));
    }

    #[test]
    fn test_rapid_activations_keep_last_block() {
        let window = Duration::from_millis(150);
        let mut activation = PendingActivation::new(window);
        let start = Instant::now();
        let a = BlockRef::regular(["A"], "WGS");
        let b = BlockRef::row_summary(["B"]);

        activation.request(Some(a), start);
        activation.request(Some(b.clone()), start + Duration::from_millis(50));

        assert_eq!(activation.take_due(start + Duration::from_millis(160)), None);
        assert!(activation.has_pending());
        assert_eq!(activation.take_due(start + Duration::from_millis(200)), Some(Some(b)));
        assert!(!activation.has_pending());
        assert_eq!(activation.take_due(start + Duration::from_millis(900)), None);
    }

    #[test]
    fn test_groups_start_closed_unless_depth_preopened() {
        let toggles = GroupToggles::new(&[1], Duration::from_millis(150));
        assert!(!toggles.is_open(&path(&["A"])));
        assert!(toggles.is_open(&path(&["A", "Skin"])));
    }

    #[test]
    fn test_toggle_now_flips_and_bumps_revision() {
        let mut toggles = GroupToggles::new(&[], Duration::from_millis(150));
        let before = toggles.revision();
        assert!(toggles.toggle_now(&path(&["A"])));
        assert!(toggles.is_open(&path(&["A"])));
        assert!(!toggles.toggle_now(&path(&["A"])));
        assert!(toggles.revision() > before);
    }

    #[test]
    fn test_rapid_requests_collapse_to_last_state() {
        let window = Duration::from_millis(150);
        let mut toggles = GroupToggles::new(&[], window);
        let start = Instant::now();
        let a = path(&["A"]);

        toggles.request_toggle(&a, start);
        toggles.request_toggle(&a, start + Duration::from_millis(20));
        toggles.request_toggle(&a, start + Duration::from_millis(40));

        // Still inside the window of the last request.
        assert_eq!(toggles.settle(start + Duration::from_millis(100)), 0);
        assert!(toggles.has_pending());

        // Three flips from closed end up open.
        assert_eq!(toggles.settle(start + Duration::from_millis(200)), 1);
        assert!(toggles.is_open(&a));
        assert!(!toggles.has_pending());
    }

    #[test]
    fn test_even_requests_settle_without_change() {
        let window = Duration::from_millis(150);
        let mut toggles = GroupToggles::new(&[], window);
        let start = Instant::now();
        let a = path(&["A"]);

        toggles.request_toggle(&a, start);
        toggles.request_toggle(&a, start + Duration::from_millis(10));
        let revision = toggles.revision();

        assert_eq!(toggles.settle(start + Duration::from_millis(500)), 0);
        assert!(!toggles.is_open(&a));
        assert_eq!(toggles.revision(), revision);
    }
}
