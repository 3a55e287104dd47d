use super::*;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use uuid::Uuid;

/// Which store call a failure is injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Update,
    Delete,
}

impl StoreOperation {
    fn name(self) -> &'static str {
        match self {
            StoreOperation::Update => "updateRSVP",
            StoreOperation::Delete => "deleteRSVP",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    List {
        limit: Option<usize>,
        next_token: Option<String>,
    },
    Update {
        id: RsvpId,
        patch: RsvpPatch,
    },
    Delete {
        id: RsvpId,
    },
    Create {
        email: String,
    },
}

/// In-process record store for tests, fixtures and offline demos.
///
/// Page tokens are stringified offsets. Failures can be injected per id and
/// per operation, or for listing as a whole.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<Mutex<Vec<Rsvp>>>,
    failing: Arc<Mutex<HashMap<StoreOperation, HashSet<RsvpId>>>>,
    fail_listing: Arc<Mutex<bool>>,
    call_history: Arc<Mutex<Vec<StoreCall>>>,
    delay_ms: Arc<Mutex<u64>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Rsvp>) -> Self {
        let store = Self::new();
        *store.records.lock() = records;
        store
    }

    pub fn with_delay(self, delay_ms: u64) -> Self {
        self.set_delay(delay_ms);
        self
    }

    /// Latency added to every call. Shared by all clones.
    pub fn set_delay(&self, delay_ms: u64) {
        *self.delay_ms.lock() = delay_ms;
    }

    pub fn fail_on(&self, operation: StoreOperation, id: impl Into<RsvpId>) {
        self.failing
            .lock()
            .entry(operation)
            .or_default()
            .insert(id.into());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().clear();
        *self.fail_listing.lock() = false;
    }

    pub fn fail_listing(&self, fail: bool) {
        *self.fail_listing.lock() = fail;
    }

    pub fn records(&self) -> Vec<Rsvp> {
        self.records.lock().clone()
    }

    pub fn get_call_history(&self) -> Vec<StoreCall> {
        self.call_history.lock().clone()
    }

    pub fn clear_history(&self) {
        self.call_history.lock().clear();
    }

    fn record_call(&self, call: StoreCall) {
        self.call_history.lock().push(call);
    }

    fn check_failure(&self, operation: StoreOperation, id: &RsvpId) -> Result<(), RecordStoreError> {
        let failing = self
            .failing
            .lock()
            .get(&operation)
            .is_some_and(|ids| ids.contains(id));
        if failing {
            return Err(RecordStoreError::Injected {
                operation: operation.name().to_string(),
                id: id.clone(),
            });
        }
        Ok(())
    }

    async fn simulate_latency(&self) {
        let delay = *self.delay_ms.lock();
        if delay > 0 {
            sleep(Duration::from_millis(delay)).await;
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list_page(
        &self,
        limit: Option<usize>,
        next_token: Option<String>,
    ) -> Result<ListPage, RecordStoreError> {
        self.record_call(StoreCall::List {
            limit,
            next_token: next_token.clone(),
        });
        self.simulate_latency().await;

        if *self.fail_listing.lock() {
            return Err(RecordStoreError::transport("simulated listing failure"));
        }

        let offset = match next_token.as_deref() {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| RecordStoreError::decode(format!("invalid nextToken '{token}'")))?,
            None => 0,
        };

        let records = self.records.lock();
        let end = match limit {
            Some(limit) => (offset + limit.max(1)).min(records.len()),
            None => records.len(),
        };
        let items = records.get(offset..end).map(<[_]>::to_vec).unwrap_or_default();
        let next_token = (end < records.len()).then(|| end.to_string());
        Ok(ListPage { items, next_token })
    }

    async fn update(&self, id: &RsvpId, patch: &RsvpPatch) -> Result<Rsvp, RecordStoreError> {
        self.record_call(StoreCall::Update {
            id: id.clone(),
            patch: patch.clone(),
        });
        self.simulate_latency().await;
        self.check_failure(StoreOperation::Update, id)?;

        let mut records = self.records.lock();
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| RecordStoreError::NotFound(id.clone()))?;
        record.apply_patch(patch);
        record.updated_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn delete(&self, id: &RsvpId) -> Result<RsvpId, RecordStoreError> {
        self.record_call(StoreCall::Delete { id: id.clone() });
        self.simulate_latency().await;
        self.check_failure(StoreOperation::Delete, id)?;

        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            return Err(RecordStoreError::NotFound(id.clone()));
        }
        Ok(id.clone())
    }

    async fn create(&self, rsvp: &NewRsvp) -> Result<Rsvp, RecordStoreError> {
        self.record_call(StoreCall::Create {
            email: rsvp.email.clone(),
        });
        self.simulate_latency().await;

        let now = Utc::now();
        let mut record = Rsvp::new(
            Uuid::new_v4().to_string().as_str(),
            &rsvp.first_name,
            &rsvp.last_name,
            &rsvp.email,
        );
        record.attending = rsvp.attending;
        record.bringing_guest = rsvp.bringing_guest;
        record.guest_first_name = rsvp.guest_first_name.clone();
        record.guest_last_name = rsvp.guest_last_name.clone();
        record.food_restrictions = rsvp.food_restrictions.clone();
        record.needs_hotel_room = rsvp.needs_hotel_room;
        record.number_of_rooms = rsvp.number_of_rooms.clone();
        record.timestamp = Some(rsvp.timestamp);
        record.created_at = Some(now);
        record.updated_at = Some(now);

        self.records.lock().push(record.clone());
        Ok(record)
    }
}
