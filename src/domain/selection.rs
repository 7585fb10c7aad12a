// src/domain/selection.rs

use std::collections::BTreeSet;

/// Lead ids picked for a bulk action, scoped to the visible result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn select(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    pub fn deselect(&mut self, id: &str) {
        self.ids.remove(id);
    }

    /// Flips membership of a single id.
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// If every id on the page is already selected, deselects them all;
    /// otherwise adds the missing ones.
    pub fn select_all_on_page<S: AsRef<str>>(&mut self, page_ids: &[S]) {
        if page_ids.is_empty() {
            return;
        }

        let all_selected = page_ids.iter().all(|id| self.contains(id.as_ref()));
        for id in page_ids {
            if all_selected {
                self.deselect(id.as_ref());
            } else {
                self.select(id.as_ref());
            }
        }
    }

    /// Drops ids that are no longer in the visible result set.
    pub fn retain_visible<S: AsRef<str>>(&mut self, visible_ids: &[S]) {
        let visible: BTreeSet<&str> = visible_ids.iter().map(AsRef::as_ref).collect();
        self.ids.retain(|id| visible.contains(id.as_str()));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Sorted snapshot of the selected ids.
    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}
