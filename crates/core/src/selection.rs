//! Ordered multi-selection used by the split and merge pickers.
//!
//! The order in which entries are toggled on is significant: it becomes the
//! order of pages (split) or documents (merge) in the output. Each selected
//! entry shows its 1-based rank.

use crate::error::{EditorError, EditorResult};

/// Events a picker widget feeds into a [`RankedSelection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent<T> {
    Toggle(T),
    Clear,
}

/// Selection whose insertion order is its rank order.
///
/// Entries are unique. Toggling an entry that is present removes it and
/// shifts the ranks of everything selected after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedSelection<T> {
    entries: Vec<T>,
}

impl<T> Default for RankedSelection<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: PartialEq> RankedSelection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles `item`, returning `true` if it is selected afterwards.
    pub fn toggle(&mut self, item: T) -> bool {
        match self.entries.iter().position(|entry| *entry == item) {
            Some(position) => {
                self.entries.remove(position);
                false
            }
            None => {
                self.entries.push(item);
                true
            }
        }
    }

    /// Value-style variant of [`RankedSelection::toggle`].
    pub fn toggled(mut self, item: T) -> Self {
        self.toggle(item);
        self
    }

    pub fn apply(&mut self, event: SelectionEvent<T>) {
        match event {
            SelectionEvent::Toggle(item) => {
                self.toggle(item);
            }
            SelectionEvent::Clear => self.entries.clear(),
        }
    }

    /// 1-based rank of `item`, or `None` when unselected.
    pub fn rank_of(&self, item: &T) -> Option<usize> {
        self.entries.iter().position(|entry| entry == item).map(|position| position + 1)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.entries.contains(item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<T> {
        self.entries
    }
}

/// Minimum selection sizes enforced before an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    Merge,
    Split,
}

impl SelectionPolicy {
    pub fn minimum(self) -> usize {
        match self {
            SelectionPolicy::Merge => 2,
            SelectionPolicy::Split => 1,
        }
    }

    pub fn requirement(self) -> &'static str {
        match self {
            SelectionPolicy::Merge => "two PDFs",
            SelectionPolicy::Split => "one page",
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            SelectionPolicy::Merge => "merge",
            SelectionPolicy::Split => "split",
        }
    }

    pub fn check(self, selected: usize) -> EditorResult<()> {
        if selected < self.minimum() {
            return Err(EditorError::InsufficientSelection { policy: self, selected });
        }
        Ok(())
    }
}

/// Candidate list plus ranked selection, as shown by a picker dialog.
///
/// Candidates are addressed by their position in the grid.
#[derive(Debug, Clone)]
pub struct PagePicker<T> {
    candidates: Vec<T>,
    selection: RankedSelection<usize>,
}

impl<T: Clone> PagePicker<T> {
    pub fn new(candidates: Vec<T>) -> Self {
        Self { candidates, selection: RankedSelection::new() }
    }

    pub fn candidates(&self) -> &[T] {
        &self.candidates
    }

    /// Toggles the candidate at `index`; out-of-range clicks are ignored.
    pub fn toggle(&mut self, index: usize) {
        if index < self.candidates.len() {
            self.selection.toggle(index);
        }
    }

    pub fn rank_of(&self, index: usize) -> Option<usize> {
        self.selection.rank_of(&index)
    }

    /// Rank label for the candidate at `index`, empty when unselected.
    pub fn rank_label(&self, index: usize) -> String {
        self.rank_of(index).map(|rank| rank.to_string()).unwrap_or_default()
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    /// Selected candidates in selection order.
    pub fn accept(self) -> Vec<T> {
        self.selection.as_slice().iter().map(|&index| self.candidates[index].clone()).collect()
    }
}

impl PagePicker<u32> {
    /// One candidate per page of a document.
    pub fn for_pages(page_count: u32) -> Self {
        Self::new((0..page_count).collect())
    }
}
