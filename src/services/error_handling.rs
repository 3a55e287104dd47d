use crate::domain::rsvp::RsvpId;
use crate::repository::RecordStoreError;
use anyhow::{Context, Result};
use std::fmt;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("RSVP not found in cache: {id}")]
    RecordNotFound { id: RsvpId },

    #[error(transparent)]
    Store(#[from] RecordStoreError),

    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Could not remember group name: {0}")]
    GroupStore(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Table {table} is full (capacity {capacity})")]
    TableFull { table: u32, capacity: usize },
}

impl DashboardError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// Transient message for the admin, the toast of the web dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Info => "info",
            NotificationLevel::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

/// Error context wrapper for better debugging
pub struct ErrorContext {
    operation: String,
    details: Vec<(String, String)>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            details: Vec::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.details.push((key.into(), value.to_string()));
        self
    }

    pub fn wrap<T>(self, result: Result<T>) -> Result<T> {
        result.with_context(|| {
            let mut msg = format!("Operation '{}' failed", self.operation);
            for (key, value) in self.details {
                msg.push_str(&format!("\n  {key}: {value}"));
            }
            msg
        })
    }
}

/// Structured logging helpers
pub struct LogHelper;

impl LogHelper {
    #[instrument(skip(id))]
    pub fn log_record_operation(operation: &str, id: &RsvpId, success: bool) {
        if success {
            info!(rsvp_id = %id, operation = %operation, "Record operation confirmed by store");
        } else {
            error!(rsvp_id = %id, operation = %operation, "Record operation failed");
        }
    }

    pub fn log_bulk_outcome(operation: &str, success_count: usize, error_count: usize) {
        if error_count == 0 {
            info!(operation = %operation, success_count, "Bulk operation completed");
        } else {
            warn!(
                operation = %operation,
                success_count,
                error_count,
                "Bulk operation completed with failures"
            );
        }
    }

    pub fn log_load_failure(error: &DashboardError) {
        error!(error = %error, "Failed to load RSVPs; dashboard starts empty");
    }

    #[instrument(skip(error))]
    pub fn log_error_with_context(context: &str, error: &anyhow::Error) {
        error!(
            context = %context,
            error = %error,
            error_chain = ?error.chain().map(ToString::to_string).collect::<Vec<_>>(),
            "Error occurred"
        );
    }

    pub fn log_validation_failure(field: &str, value: &str, reason: &str) {
        warn!(field = %field, value = %value, reason = %reason, "Validation failed");
    }

    pub fn log_reconciled(id: &RsvpId, fields: usize) {
        debug!(rsvp_id = %id, fields, "Merged confirmed update into cache");
    }
}

/// User-friendly error messages
pub struct UserErrorFormatter;

impl UserErrorFormatter {
    pub fn format_for_ui(error: &anyhow::Error) -> String {
        if let Some(dashboard_error) = error.downcast_ref::<DashboardError>() {
            return Self::format_dashboard_error(dashboard_error);
        }
        if let Some(store_error) = error.downcast_ref::<RecordStoreError>() {
            return Self::format_store_error(store_error);
        }

        let error_str = error.to_string().to_lowercase();

        if error_str.contains("database") || error_str.contains("sqlite") {
            return "A local database error occurred. Please try again.".to_string();
        }
        if error_str.contains("permission denied") {
            return "The file could not be written: permission denied.".to_string();
        }

        error.to_string()
    }

    pub fn format_dashboard_error(error: &DashboardError) -> String {
        match error {
            DashboardError::RecordNotFound { .. } => {
                "That RSVP is no longer in the list. Reload and try again.".to_string()
            }
            DashboardError::Store(store_error) => Self::format_store_error(store_error),
            DashboardError::Validation { field, reason } => format!("Invalid {field}: {reason}"),
            DashboardError::GroupStore(_) => {
                "The group was assigned, but the name could not be saved for later.".to_string()
            }
            DashboardError::Export(message) => format!("Export failed: {message}"),
            DashboardError::TableFull { table, capacity } => {
                format!("Table {table} already seats {capacity} guests.")
            }
        }
    }

    pub fn format_store_error(error: &RecordStoreError) -> String {
        match error {
            RecordStoreError::Transport(message) if message.contains("timed out") => {
                "The RSVP service timed out. Please try again.".to_string()
            }
            RecordStoreError::Transport(_) => {
                "Could not reach the RSVP service. Check your connection and try again.".to_string()
            }
            RecordStoreError::Status { status: 401 | 403, .. } => {
                "The RSVP service rejected the API key.".to_string()
            }
            RecordStoreError::Status { status, .. } => {
                format!("The RSVP service returned an error (HTTP {status}).")
            }
            RecordStoreError::GraphQl { messages, .. } => {
                format!("The RSVP service rejected the request: {}", messages.join("; "))
            }
            RecordStoreError::Decode(_) | RecordStoreError::MissingData(_) => {
                "The RSVP service returned data the dashboard could not read.".to_string()
            }
            RecordStoreError::NotFound(_) => "That RSVP no longer exists.".to_string(),
            RecordStoreError::Injected { .. } => error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_error_context() {
        let result: Result<()> = Err(anyhow::anyhow!("disk full"));

        let wrapped = ErrorContext::new("export_csv")
            .with_detail("path", "/tmp/rsvps.csv")
            .wrap(result);

        let error_msg = wrapped.unwrap_err().to_string();
        assert!(error_msg.contains("export_csv"));
        assert!(error_msg.contains("path"));
    }

    #[rstest]
    #[case(RecordStoreError::transport("request timed out: deadline"), "timed out")]
    #[case(RecordStoreError::transport("dns failure"), "Could not reach")]
    #[case(RecordStoreError::Status { status: 401, body: String::new() }, "API key")]
    #[case(RecordStoreError::Status { status: 500, body: String::new() }, "HTTP 500")]
    #[case(RecordStoreError::MissingData("listRSVPS".into()), "could not read")]
    fn test_store_error_formatting(#[case] error: RecordStoreError, #[case] expected: &str) {
        let formatted = UserErrorFormatter::format_for_ui(&anyhow::Error::new(error));
        assert!(formatted.contains(expected), "{formatted}");
    }

    #[test]
    fn test_dashboard_error_is_unwrapped_from_anyhow() {
        let error = anyhow::Error::new(DashboardError::validation("numberOfRooms", "must be a whole number"));
        assert_eq!(
            UserErrorFormatter::format_for_ui(&error),
            "Invalid numberOfRooms: must be a whole number"
        );
    }

    #[test]
    fn test_other_errors_keep_their_top_level_message() {
        let error = anyhow::anyhow!("unknown field 'seat'").context("Cannot edit 'seat'");
        assert_eq!(UserErrorFormatter::format_for_ui(&error), "Cannot edit 'seat'");

        let error = anyhow::anyhow!("unable to open database file");
        assert!(UserErrorFormatter::format_for_ui(&error).contains("local database"));
    }

    #[test]
    fn test_store_error_converts_into_dashboard_error() {
        let error: DashboardError = RecordStoreError::NotFound(RsvpId::new("x")).into();
        assert!(matches!(error, DashboardError::Store(_)));
        assert_eq!(error.to_string(), "Record x not found");
    }

    #[test]
    fn test_notification_display() {
        assert_eq!(Notification::success("Saved").to_string(), "[ok] Saved");
        assert_eq!(Notification::info("Nothing to do").to_string(), "[info] Nothing to do");
        assert!(Notification::error("nope").is_error());
    }
}
