pub mod bulk;
pub mod cache;
pub mod dashboard;
pub mod error_handling;
pub mod export_service;
pub mod submission;
pub mod validation;

pub use dashboard::{DashboardOptions, RsvpDashboard, TablePage};
pub use error_handling::{DashboardError, Notification, NotificationLevel};
pub use export_service::CsvLayout;
pub use submission::{RsvpSubmission, SubmissionService};
