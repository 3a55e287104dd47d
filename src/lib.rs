pub mod config;
pub mod domain;
pub mod repository;
pub mod services;

// Make test_helpers available for integration tests and benches
pub mod test_helpers;

pub use domain::filter::FilterCriteria;
pub use domain::rsvp::{Answer, Rsvp, RsvpId, RsvpPatch};
pub use repository::{RecordStore, RecordStoreError};
pub use services::RsvpDashboard;
