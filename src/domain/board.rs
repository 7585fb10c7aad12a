// src/domain/board.rs
//
// Per-viewer controller state over the query pipeline. Owns the caller-side
// contracts of the paginator and the selection set: any change to what is
// shown resets the page to 1 and clears the selection.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use crate::domain::lead::Lead;
use crate::domain::pagination::{clamp_page, page_size_or_default, paginate, total_pages, Page};
use crate::domain::query::{query, LeadFilter, SortOption, StatusFilter};
use crate::domain::selection::SelectionSet;

#[derive(Debug, Clone, PartialEq)]
pub struct LeadBoard {
    filter: LeadFilter,
    sort: SortOption,
    page: usize,
    page_size: NonZeroUsize,
    selection: SelectionSet,
}

impl Default for LeadBoard {
    fn default() -> Self {
        Self {
            filter: LeadFilter::default(),
            sort: SortOption::default(),
            page: 1,
            page_size: page_size_or_default(None),
            selection: SelectionSet::new(),
        }
    }
}

impl LeadBoard {
    pub fn new(filter: LeadFilter, sort: SortOption, page_size: NonZeroUsize) -> Self {
        Self {
            filter,
            sort,
            page_size,
            ..Self::default()
        }
    }

    pub fn filter(&self) -> &LeadFilter {
        &self.filter
    }

    pub fn sort(&self) -> SortOption {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }

    pub fn set_status(&mut self, status: StatusFilter) {
        if self.filter.status != status {
            self.filter.status = status;
            self.invalidate();
        }
    }

    pub fn set_sources(&mut self, sources: BTreeSet<String>) {
        if self.filter.sources != sources {
            self.filter.sources = sources;
            self.invalidate();
        }
    }

    pub fn set_tags(&mut self, tags: BTreeSet<String>) {
        if self.filter.tags != tags {
            self.filter.tags = tags;
            self.invalidate();
        }
    }

    pub fn set_search_term(&mut self, term: &str) {
        if self.filter.search_term != term {
            self.filter.search_term = term.to_string();
            self.invalidate();
        }
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        if self.sort != sort {
            self.sort = sort;
            self.invalidate();
        }
    }

    pub fn set_page_size(&mut self, page_size: NonZeroUsize) {
        if self.page_size != page_size {
            self.page_size = page_size;
            self.invalidate();
        }
    }

    /// Page navigation keeps the selection.
    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Runs the pipeline over a snapshot. The stored page is re-clamped
    /// into range first, and selected ids that fell out of the result are dropped.
    pub fn view(&mut self, leads: &[Lead]) -> Page<Lead> {
        let ordered = query(leads, &self.filter, self.sort);

        let pages = total_pages(ordered.len(), self.page_size);
        self.page = clamp_page(self.page, pages);

        let visible: Vec<&str> = ordered.iter().map(|l| l.id.as_str()).collect();
        self.selection.retain_visible(&visible);

        paginate(&ordered, self.page, self.page_size)
    }

    fn invalidate(&mut self) {
        self.page = 1;
        self.selection.clear();
    }
}
