use crate::domain::rsvp::{answer_text, Rsvp};
use crate::services::error_handling::{ErrorContext, LogHelper};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::{QuoteStyle, WriterBuilder};
use std::path::{Path, PathBuf};
use tracing::info;

/// Column set of an export. Each call site uses one layout, so its header
/// never changes between exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvLayout {
    /// Name, Email, Attending, Bringing Guest, Guest Name, Food
    /// Restrictions, Group, Note.
    #[default]
    Dashboard,
    /// Name, Email.
    ContactList,
}

impl CsvLayout {
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            CsvLayout::Dashboard => &[
                "Name",
                "Email",
                "Attending",
                "Bringing Guest",
                "Guest Name",
                "Food Restrictions",
                "Group",
                "Note",
            ],
            CsvLayout::ContactList => &["Name", "Email"],
        }
    }

    fn row(self, rsvp: &Rsvp) -> Vec<String> {
        match self {
            CsvLayout::Dashboard => vec![
                rsvp.full_name(),
                rsvp.email.clone(),
                answer_text(rsvp.attending).to_string(),
                answer_text(rsvp.bringing_guest).to_string(),
                rsvp.guest_name(),
                rsvp.food_restrictions.clone(),
                rsvp.group.clone(),
                rsvp.admin_note.clone(),
            ],
            CsvLayout::ContactList => vec![rsvp.full_name(), rsvp.email.clone()],
        }
    }
}

/// Serialises `rows` in the order given. Every field is quoted and the
/// header row is written even when there are no rows.
pub fn export_csv(rows: &[&Rsvp], layout: CsvLayout) -> Result<String> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(vec![]);

    wtr.write_record(layout.headers())?;
    for rsvp in rows {
        wtr.write_record(layout.row(rsvp))?;
    }

    let data = wtr.into_inner().context("Failed to flush CSV writer")?;
    Ok(String::from_utf8(data)?)
}

/// Emails joined for pasting into a mail client's recipient field.
pub fn clipboard_text(emails: &[String]) -> String {
    emails.join(", ")
}

pub fn default_file_name(date: NaiveDate) -> String {
    format!("rsvps-{}.csv", date.format("%Y-%m-%d"))
}

/// Writes the export to `path`, creating parent directories. Returns the
/// number of data rows written.
pub async fn export_to_file(rows: &[&Rsvp], layout: CsvLayout, path: &Path) -> Result<usize> {
    let written = async {
        let content = export_csv(rows, layout)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(path, content.as_bytes())
            .await
            .with_context(|| format!("Failed to write export to {}", path.display()))?;
        Ok::<_, anyhow::Error>(rows.len())
    }
    .await;

    let written = ErrorContext::new("export_csv")
        .with_detail("path", path.display())
        .with_detail("rows", rows.len())
        .wrap(written);
    match &written {
        Ok(count) => info!(path = %path.display(), rows = *count, "Exported RSVPs"),
        Err(error) => LogHelper::log_error_with_context("export_csv", error),
    }
    written
}

/// `dir/rsvps-<date>.csv`.
pub fn default_export_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(default_file_name(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rsvp::Answer;

    fn sample() -> Vec<Rsvp> {
        let mut ada = Rsvp::new("1", "Ada", "Lovelace", "ada@example.com");
        ada.attending = Some(Answer::Yes);
        ada.bringing_guest = Some(Answer::Yes);
        ada.guest_first_name = "Charles".to_string();
        ada.food_restrictions = "Vegan, no nuts".to_string();
        ada.group = "Family".to_string();
        ada.admin_note = "Said \"hi\"".to_string();

        let mut bo = Rsvp::new("2", "Bo", "Diddley", "bo@example.com");
        bo.attending = Some(Answer::No);
        vec![ada, bo]
    }

    #[test]
    fn test_dashboard_layout() {
        let records = sample();
        let rows: Vec<&Rsvp> = records.iter().collect();
        let csv = export_csv(&rows, CsvLayout::Dashboard).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            r#""Name","Email","Attending","Bringing Guest","Guest Name","Food Restrictions","Group","Note""#
        );
        assert_eq!(
            lines[1],
            r#""Ada Lovelace","ada@example.com","yes","yes","Charles","Vegan, no nuts","Family","Said ""hi""""#
        );
        assert_eq!(lines[2], r#""Bo Diddley","bo@example.com","no","","","","","""#);
    }

    #[test]
    fn test_contact_list_layout() {
        let records = sample();
        let rows: Vec<&Rsvp> = records.iter().rev().collect();
        let csv = export_csv(&rows, CsvLayout::ContactList).unwrap();
        assert_eq!(
            csv,
            "\"Name\",\"Email\"\n\"Bo Diddley\",\"bo@example.com\"\n\"Ada Lovelace\",\"ada@example.com\"\n"
        );
    }

    #[test]
    fn test_header_present_without_rows() {
        let csv = export_csv(&[], CsvLayout::ContactList).unwrap();
        assert_eq!(csv, "\"Name\",\"Email\"\n");
    }

    #[test]
    fn test_file_name_and_clipboard() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        assert_eq!(default_file_name(date), "rsvps-2025-06-14.csv");
        assert_eq!(
            clipboard_text(&["a@x.com".to_string(), "b@x.com".to_string()]),
            "a@x.com, b@x.com"
        );
        assert_eq!(clipboard_text(&[]), "");
    }

    #[tokio::test]
    async fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("guests.csv");
        let records = sample();
        let rows: Vec<&Rsvp> = records.iter().collect();

        let written = export_to_file(&rows, CsvLayout::Dashboard, &path).await.unwrap();
        assert_eq!(written, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_export_failure_names_the_operation_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, "not a directory").unwrap();
        let path = blocker.join("guests.csv");
        let records = sample();
        let rows: Vec<&Rsvp> = records.iter().collect();

        let error = export_to_file(&rows, CsvLayout::Dashboard, &path)
            .await
            .unwrap_err();

        let message = error.to_string();
        assert!(message.contains("export_csv"), "{message}");
        assert!(message.contains("guests.csv"), "{message}");
        assert!(message.contains("rows: 2"), "{message}");
    }
}
