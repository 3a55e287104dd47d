use crate::domain::rsvp::{Rsvp, RsvpId};
use std::collections::HashSet;

/// Ids currently checked for bulk operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: HashSet<RsvpId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership; returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, id: &RsvpId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    /// Replaces the selection with exactly `ids`.
    pub fn select_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a RsvpId>) {
        self.ids = ids.into_iter().cloned().collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drops a deleted record's id so no selection dangles.
    pub fn deselect_removed(&mut self, id: &RsvpId) {
        self.ids.remove(id);
    }

    /// Keeps only ids still present in `visible`.
    pub fn retain_visible(&mut self, visible: &[&Rsvp]) {
        let visible: HashSet<&RsvpId> = visible.iter().map(|r| &r.id).collect();
        self.ids.retain(|id| visible.contains(id));
    }

    pub fn contains(&self, id: &RsvpId) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn selected_count(&self) -> usize {
        self.ids.len()
    }

    /// True when the filtered view is non-empty and every one of its ids, and
    /// nothing else, is selected.
    pub fn is_all_selected(&self, filtered: &[&Rsvp]) -> bool {
        !filtered.is_empty()
            && self.ids.len() == filtered.len()
            && filtered.iter().all(|r| self.ids.contains(&r.id))
    }

    /// Selected records in filtered-view order.
    pub fn selected_in<'a>(&self, filtered: &[&'a Rsvp]) -> Vec<&'a Rsvp> {
        filtered
            .iter()
            .copied()
            .filter(|r| self.ids.contains(&r.id))
            .collect()
    }

    pub fn selected_emails(&self, filtered: &[&Rsvp]) -> Vec<String> {
        self.selected_in(filtered)
            .into_iter()
            .map(|r| r.email.clone())
            .collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &RsvpId> {
        self.ids.iter()
    }
}
