// src/domain/layout.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::lead::LeadStatus;
use crate::domain::query::StatusFilter;

/// Lead table columns. `Select` is the checkbox column: it never moves but
/// may be hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnId {
    Select,
    Name,
    Contact,
    Status,
    Temperature,
    Source,
    Tags,
    Budget,
    Property,
    Created,
}

impl ColumnId {
    /// Canonical order.
    pub const ALL: [ColumnId; 10] = [
        ColumnId::Select,
        ColumnId::Name,
        ColumnId::Contact,
        ColumnId::Status,
        ColumnId::Temperature,
        ColumnId::Source,
        ColumnId::Tags,
        ColumnId::Budget,
        ColumnId::Property,
        ColumnId::Created,
    ];
}

pub fn default_column_order() -> Vec<ColumnId> {
    ColumnId::ALL.to_vec()
}

/// `ALL` first, then statuses in declaration order.
pub fn default_tab_order() -> Vec<StatusFilter> {
    std::iter::once(StatusFilter::All)
        .chain(LeadStatus::ALL.into_iter().map(StatusFilter::Only))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutPreferences {
    pub column_order: Vec<ColumnId>,
    pub status_tab_order: Vec<StatusFilter>,
    #[serde(default)]
    pub hidden_columns: BTreeSet<ColumnId>,
}

impl Default for LayoutPreferences {
    fn default() -> Self {
        Self {
            column_order: default_column_order(),
            status_tab_order: default_tab_order(),
            hidden_columns: BTreeSet::new(),
        }
    }
}

impl LayoutPreferences {
    pub fn reset_to_default(&mut self) {
        *self = Self::default();
    }

    pub fn move_column(&mut self, from: usize, to: usize) {
        self.column_order = move_column(&self.column_order, from, to);
    }

    pub fn move_tab(&mut self, from: usize, to: usize) {
        self.status_tab_order = move_tab(&self.status_tab_order, from, to);
    }

    pub fn hide_column(&mut self, column: ColumnId) {
        self.hidden_columns.insert(column);
    }

    pub fn show_column(&mut self, column: ColumnId) {
        self.hidden_columns.remove(&column);
    }

    /// Column order minus hidden columns.
    pub fn visible_columns(&self) -> Vec<ColumnId> {
        self.column_order
            .iter()
            .copied()
            .filter(|c| !self.hidden_columns.contains(c))
            .collect()
    }

    /// Both orders are permutations of their symbol sets and the select
    /// column leads.
    pub fn is_valid(&self) -> bool {
        is_valid_column_order(&self.column_order)
            && is_permutation(&self.status_tab_order, &default_tab_order())
    }

    /// Replaces any invalid order with its default.
    /// Used when loading stored preferences written by an older layout.
    pub fn normalized(mut self) -> Self {
        if !is_valid_column_order(&self.column_order) {
            self.column_order = default_column_order();
        }
        if !is_permutation(&self.status_tab_order, &default_tab_order()) {
            self.status_tab_order = default_tab_order();
        }
        self
    }
}

/// Splice the element at `from` out and reinsert it at `to`. Every other
/// element keeps its relative order. Out-of-range indices are a no-op.
pub fn move_item<T: Clone>(order: &[T], from: usize, to: usize) -> Vec<T> {
    let mut out = order.to_vec();
    if from >= out.len() || to >= out.len() || from == to {
        return out;
    }
    let item = out.remove(from);
    out.insert(to, item);
    out
}

/// Like [`move_item`], except the select column stays where it is.
pub fn move_column(order: &[ColumnId], from: usize, to: usize) -> Vec<ColumnId> {
    let pinned = order.iter().position(|c| *c == ColumnId::Select);
    let moved = move_item(order, from, to);

    match pinned {
        Some(idx) if moved.get(idx) != Some(&ColumnId::Select) => order.to_vec(),
        _ => moved,
    }
}

pub fn move_tab(order: &[StatusFilter], from: usize, to: usize) -> Vec<StatusFilter> {
    move_item(order, from, to)
}

fn is_valid_column_order(order: &[ColumnId]) -> bool {
    order.first() == Some(&ColumnId::Select) && is_permutation(order, &default_column_order())
}

fn is_permutation<T: Ord + Clone>(candidate: &[T], canonical: &[T]) -> bool {
    if candidate.len() != canonical.len() {
        return false;
    }
    let mut a = candidate.to_vec();
    let mut b = canonical.to_vec();
    a.sort();
    b.sort();
    a == b
}
