use crate::domain::rsvp::{Rsvp, RsvpId, RsvpPatch};
use crate::services::error_handling::{DashboardError, LogHelper};
use std::collections::HashSet;
use tracing::warn;

/// In-memory mirror of the record store, in store order.
///
/// Only confirmed mutations reach this type: callers apply an update or a
/// delete after the store has acknowledged it.
#[derive(Debug, Clone, Default)]
pub struct RsvpCache {
    records: Vec<Rsvp>,
}

impl RsvpCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents with a fresh listing. Later duplicates of an id
    /// are dropped so the cache stays keyed by id.
    pub fn seed(&mut self, records: Vec<Rsvp>) {
        let mut seen = HashSet::with_capacity(records.len());
        self.records = records
            .into_iter()
            .filter(|record| {
                let fresh = seen.insert(record.id.clone());
                if !fresh {
                    warn!(rsvp_id = %record.id, "Dropping duplicate RSVP from listing");
                }
                fresh
            })
            .collect();
    }

    pub fn records(&self) -> &[Rsvp] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &RsvpId) -> Option<&Rsvp> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn contains(&self, id: &RsvpId) -> bool {
        self.get(id).is_some()
    }

    /// Merges the fields the store confirmed onto the cached record.
    pub fn apply_update(&mut self, id: &RsvpId, patch: &RsvpPatch) -> Result<&Rsvp, DashboardError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| DashboardError::RecordNotFound { id: id.clone() })?;
        record.apply_patch(patch);
        LogHelper::log_reconciled(id, patch_field_count(patch));
        Ok(record)
    }

    /// Removes a confirmed deletion. Returns whether the id was cached.
    pub fn apply_delete(&mut self, id: &RsvpId) -> bool {
        let before = self.records.len();
        self.records.retain(|r| &r.id != id);
        self.records.len() != before
    }

    /// Ids in cache order, restricted to `ids`.
    pub fn ordered_subset(&self, ids: &HashSet<RsvpId>) -> Vec<RsvpId> {
        self.records
            .iter()
            .filter(|r| ids.contains(&r.id))
            .map(|r| r.id.clone())
            .collect()
    }
}

fn patch_field_count(patch: &RsvpPatch) -> usize {
    match serde_json::to_value(patch) {
        Ok(serde_json::Value::Object(fields)) => fields.len(),
        _ => 0,
    }
}
