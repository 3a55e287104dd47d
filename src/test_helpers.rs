// Test helpers for integration testing

use crate::domain::rsvp::{Answer, Rsvp};
use crate::repository::group_names::MemoryGroupNameStore;
use crate::repository::mock::InMemoryRecordStore;
use crate::services::dashboard::{DashboardOptions, RsvpDashboard};
use std::sync::Arc;

pub struct TestContext {
    pub store: InMemoryRecordStore,
    pub groups: MemoryGroupNameStore,
    pub dashboard: RsvpDashboard,
}

impl TestContext {
    pub fn new_for_test(records: Vec<Rsvp>) -> Self {
        Self::with_options(records, DashboardOptions::default())
    }

    pub fn with_options(records: Vec<Rsvp>, options: DashboardOptions) -> Self {
        let store = InMemoryRecordStore::with_records(records);
        let groups = MemoryGroupNameStore::new();
        let dashboard =
            RsvpDashboard::new(Arc::new(store.clone()), Arc::new(groups.clone()), options);
        Self {
            store,
            groups,
            dashboard,
        }
    }

    /// Context whose dashboard has already loaded `records`.
    pub async fn loaded(records: Vec<Rsvp>) -> Self {
        let ctx = Self::new_for_test(records);
        ctx.dashboard
            .load()
            .await
            .expect("in-memory store always lists");
        ctx
    }
}

/// Builder-style fixture record.
pub fn rsvp(id: &str, first: &str, last: &str) -> Rsvp {
    let email = format!(
        "{}.{}@example.com",
        first.to_lowercase(),
        last.to_lowercase()
    );
    Rsvp::new(id, first, last, &email)
}

pub fn attending(mut rsvp: Rsvp, answer: Answer) -> Rsvp {
    rsvp.attending = Some(answer);
    rsvp
}

/// A, B and C: two attending Family members (A vegan) and one decline.
pub fn family_scenario() -> Vec<Rsvp> {
    let mut a = attending(rsvp("A", "Ada", "Lovelace"), Answer::Yes);
    a.group = "Family".to_string();
    a.food_restrictions = "Vegan".to_string();

    let b = attending(rsvp("B", "Brian", "Kernighan"), Answer::No);

    let mut c = attending(rsvp("C", "Carol", "Shaw"), Answer::Yes);
    c.group = "Family".to_string();
    vec![a, b, c]
}

const FIRST_NAMES: [&str; 12] = [
    "Ada", "Brian", "Carol", "Dennis", "Edsger", "Frances", "Grace", "Hedy", "Ivan", "Joan",
    "Ken", "Linus",
];
const LAST_NAMES: [&str; 8] = [
    "Lovelace", "Kernighan", "Shaw", "Ritchie", "Dijkstra", "Allen", "Hopper", "Lamarr",
];
const GROUPS: [&str; 5] = ["", "Family", "Friends", "Work", "College"];
const FOODS: [&str; 5] = ["", "", "Vegan", "Gluten free", "No nuts"];

/// Deterministic guest list of `n` records, varied across every field the
/// filters and analytics look at.
pub fn generated_guest_list(n: usize) -> Vec<Rsvp> {
    (0..n)
        .map(|i| {
            let first = FIRST_NAMES[i % FIRST_NAMES.len()];
            let last = LAST_NAMES[(i / FIRST_NAMES.len()) % LAST_NAMES.len()];
            let mut r = rsvp(&format!("guest-{i:05}"), first, last);
            r.attending = Some(if i % 4 == 3 { Answer::No } else { Answer::Yes });
            if r.is_attending() && i % 3 == 0 {
                r.bringing_guest = Some(Answer::Yes);
                r.guest_first_name = FIRST_NAMES[(i + 5) % FIRST_NAMES.len()].to_string();
                r.guest_last_name = last.to_string();
            } else {
                r.bringing_guest = Some(Answer::No);
            }
            r.group = GROUPS[i % GROUPS.len()].to_string();
            r.food_restrictions = FOODS[(i / 2) % FOODS.len()].to_string();
            r
        })
        .collect()
}
