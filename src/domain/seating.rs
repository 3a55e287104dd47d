use crate::domain::rsvp::{Rsvp, RsvpId};
use std::collections::BTreeMap;
use thiserror::Error;

pub const DEFAULT_TABLE_CAPACITY: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeatingError {
    #[error("Table {table} is full (capacity {capacity})")]
    TableFull { table: u32, capacity: usize },

    #[error("Guest {id} is not seated")]
    NotSeated { id: RsvpId },

    #[error("Table numbers start at 1")]
    InvalidTable,
}

/// Attending guests split across numbered tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatingPlan {
    capacity: usize,
    tables: BTreeMap<u32, Vec<RsvpId>>,
}

impl SeatingPlan {
    pub fn empty(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            tables: BTreeMap::new(),
        }
    }

    /// Seats attending guests only. Guests already carrying an
    /// `assigned_table` keep it while it has room; everyone else fills the
    /// lowest-numbered table with a free seat, in record order.
    pub fn from_records(records: &[Rsvp], capacity: usize) -> Self {
        let mut plan = Self::empty(capacity);
        let attending: Vec<&Rsvp> = records.iter().filter(|r| r.is_attending()).collect();

        let mut unseated = Vec::new();
        for rsvp in &attending {
            match rsvp.assigned_table {
                Some(table) if table > 0 && plan.has_room(table) => {
                    plan.tables.entry(table).or_default().push(rsvp.id.clone());
                }
                _ => unseated.push(rsvp.id.clone()),
            }
        }

        for id in unseated {
            let table = plan.first_table_with_room();
            plan.tables.entry(table).or_default().push(id);
        }
        plan
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn tables(&self) -> &BTreeMap<u32, Vec<RsvpId>> {
        &self.tables
    }

    pub fn table_of(&self, id: &RsvpId) -> Option<u32> {
        self.tables
            .iter()
            .find(|(_, guests)| guests.contains(id))
            .map(|(table, _)| *table)
    }

    pub fn seated_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    fn has_room(&self, table: u32) -> bool {
        self.tables
            .get(&table)
            .is_none_or(|guests| guests.len() < self.capacity)
    }

    fn first_table_with_room(&self) -> u32 {
        (1..).find(|table| self.has_room(*table)).unwrap_or(1)
    }

    /// Moves a seated guest. A full target leaves the guest where they were.
    pub fn move_to_table(&mut self, id: &RsvpId, target: u32) -> Result<(), SeatingError> {
        if target == 0 {
            return Err(SeatingError::InvalidTable);
        }
        let current = self
            .table_of(id)
            .ok_or_else(|| SeatingError::NotSeated { id: id.clone() })?;
        if current == target {
            return Ok(());
        }
        if !self.has_room(target) {
            return Err(SeatingError::TableFull {
                table: target,
                capacity: self.capacity,
            });
        }

        if let Some(guests) = self.tables.get_mut(&current) {
            guests.retain(|g| g != id);
            if guests.is_empty() {
                self.tables.remove(&current);
            }
        }
        self.tables.entry(target).or_default().push(id.clone());
        Ok(())
    }

    /// `(id, table)` pairs in table order, as they are persisted.
    pub fn assignments(&self) -> Vec<(RsvpId, u32)> {
        self.tables
            .iter()
            .flat_map(|(table, guests)| guests.iter().map(move |id| (id.clone(), *table)))
            .collect()
    }
}
