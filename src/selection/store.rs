use std::collections::BTreeSet;

use super::range::{RangeError, parse_range};

/// The set of selected rows, bound to the length of the dataset it indexes.
///
/// Indices are always below [`SelectionStore::dataset_len`]; [`SelectionStore::reseed`]
/// is the only way to change that length, and it throws the old selection away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStore {
    selected: BTreeSet<usize>,
    dataset_len: usize,
}

impl SelectionStore {
    /// An empty selection over a dataset of `dataset_len` rows.
    pub fn new(dataset_len: usize) -> Self {
        Self {
            selected: BTreeSet::new(),
            dataset_len,
        }
    }

    pub fn select_all(&mut self) {
        self.selected = (0..self.dataset_len).collect();
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    /// Flip membership of row `index`. Returns whether the row is now selected.
    ///
    /// Out-of-range indices leave the selection untouched and return `false`.
    pub fn toggle(&mut self, index: usize) -> bool {
        if index >= self.dataset_len {
            tracing::debug!(index, len = self.dataset_len, "Ignoring out-of-range toggle");
            return false;
        }
        if self.selected.remove(&index) {
            false
        } else {
            self.selected.insert(index);
            true
        }
    }

    /// Replace the selection with the rows named by `expr`.
    ///
    /// # Errors
    ///
    /// Returns the parse error and keeps the current selection when `expr` is invalid.
    pub fn apply_range(&mut self, expr: &str) -> Result<(), RangeError> {
        self.selected = parse_range(expr, self.dataset_len)?;
        Ok(())
    }

    /// Bind the selection to a new dataset, dropping every previous index.
    pub fn reseed(&mut self, dataset_len: usize, select_all: bool) {
        self.dataset_len = dataset_len;
        if select_all {
            self.select_all();
        } else {
            self.deselect_all();
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Number of selected rows.
    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn dataset_len(&self) -> usize {
        self.dataset_len
    }

    /// Selected indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }

    /// Human-readable count, e.g. `Selected: 31 / 100 rows`.
    pub fn summary(&self) -> String {
        format!("Selected: {} / {} rows", self.count(), self.dataset_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_all_is_idempotent() {
        let mut store = SelectionStore::new(4);
        store.select_all();
        let once = store.clone();
        store.select_all();
        assert_eq!(store, once);
        assert_eq!(store.indices().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_toggle_flips_membership() {
        let mut store = SelectionStore::new(3);
        assert!(store.toggle(1));
        assert!(store.contains(1));
        assert!(!store.toggle(1));
        assert!(store.is_empty());
    }

    #[test]
    fn test_toggle_out_of_range_is_noop() {
        let mut store = SelectionStore::new(3);
        store.select_all();
        assert!(!store.toggle(3));
        assert_eq!(store.count(), 3);
    }

    #[test]
    fn test_apply_range_replaces_selection() {
        let mut store = SelectionStore::new(10);
        store.toggle(0);
        store.toggle(9);
        store.apply_range("3-4").expect("valid range");
        assert_eq!(store.indices().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_failed_range_keeps_selection() {
        let mut store = SelectionStore::new(10);
        store.apply_range("2-5").expect("valid range");
        let before = store.clone();

        assert_eq!(store.apply_range(""), Err(RangeError::EmptyExpression));
        assert_eq!(store.apply_range("abc"), Err(RangeError::InvalidRow));
        assert_eq!(store, before);
    }

    #[test]
    fn test_reseed_discards_stale_indices() {
        let mut store = SelectionStore::new(100);
        store.apply_range("90-100").expect("valid range");

        store.reseed(5, true);
        assert_eq!(store.indices().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);

        store.reseed(50, false);
        assert!(store.is_empty());
        assert_eq!(store.dataset_len(), 50);
    }

    #[test]
    fn test_open_range_past_end_empties_selection() {
        let mut store = SelectionStore::new(50);
        store.select_all();
        store.apply_range("60-").expect("open range past end is not an error");
        assert!(store.is_empty());
    }

    #[test]
    fn test_summary() {
        let mut store = SelectionStore::new(100);
        store.apply_range("20-50").expect("valid range");
        assert_eq!(store.summary(), "Selected: 31 / 100 rows");
    }
}
