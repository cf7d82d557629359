//! FILENAME: core/matrix-engine/src/memo.rs
//! Single-slot memoization keyed by a hash of the exact inputs.
//!
//! A computation is re-run only when its key changes. Callers build the key
//! from every input the computation reads, including a generation counter
//! for the record list.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

/// Hashes any input tuple into a memo key.
pub fn memo_key<T: Hash + ?Sized>(inputs: &T) -> u64 {
    let mut hasher = FxHasher::default();
    inputs.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone)]
pub struct Memo<V> {
    key: Option<u64>,
    value: Option<V>,
    hits: u64,
    misses: u64,
}

impl<V> Default for Memo<V> {
    fn default() -> Self {
        Memo {
            key: None,
            value: None,
            hits: 0,
            misses: 0,
        }
    }
}

impl<V> Memo<V> {
    pub fn new() -> Self {
        Memo::default()
    }

    /// Returns the cached value for `key`, computing it on a miss.
    pub fn get_or_compute<F: FnOnce() -> V>(&mut self, key: u64, compute: F) -> &V {
        if self.key == Some(key) && self.value.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
            self.key = Some(key);
            self.value = None;
        }
        self.value.get_or_insert_with(compute)
    }

    /// The cached value, whatever key it was computed for.
    pub fn peek(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn invalidate(&mut self) {
        self.key = None;
        self.value = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recomputes_only_on_key_change() {
        let mut memo: Memo<String> = Memo::new();
        let mut runs = 0;

        let key = memo_key(&("donor", 1u64));
        memo.get_or_compute(key, || {
            runs += 1;
            "first".to_string()
        });
        let value = memo.get_or_compute(key, || {
            runs += 1;
            "second".to_string()
        });
        assert_eq!(value, "first");

        let other = memo_key(&("donor", 2u64));
        let value = memo.get_or_compute(other, || {
            runs += 1;
            "third".to_string()
        });
        assert_eq!(value, "third");
        assert_eq!(runs, 2);
        assert_eq!(memo.hits(), 1);
        assert_eq!(memo.misses(), 2);
    }

    #[test]
    fn test_invalidate_forces_recompute() {
        let mut memo: Memo<u32> = Memo::new();
        memo.get_or_compute(7, || 1);
        memo.invalidate();
        assert!(memo.peek().is_none());
        assert_eq!(*memo.get_or_compute(7, || 2), 2);
    }
}
