use crate::domain::rsvp::RsvpPatch;
use crate::services::error_handling::{DashboardError, LogHelper};
use anyhow::{bail, Result};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Input validation for admin edits and guest submissions
pub struct InputValidator;

impl InputValidator {
    /// Room counts are stored as text but must read as a non-negative
    /// integer. Blank means "not given".
    pub fn validate_room_count(value: &str) -> Result<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(String::new());
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            bail!("must be a non-negative whole number");
        }
        let rooms: u32 = trimmed.parse()?;
        if rooms as usize > SizeLimits::MAX_ROOMS {
            bail!("cannot exceed {} rooms", SizeLimits::MAX_ROOMS);
        }
        Ok(rooms.to_string())
    }

    pub fn validate_name(value: &str) -> Result<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            bail!("cannot be empty");
        }
        if trimmed.chars().count() > SizeLimits::MAX_NAME_LENGTH {
            bail!("cannot exceed {} characters", SizeLimits::MAX_NAME_LENGTH);
        }
        Ok(strip_control(trimmed))
    }

    /// Same rule as [`Self::validate_name`], except that blank is allowed.
    pub fn validate_optional_name(value: &str) -> Result<String> {
        if value.trim().is_empty() {
            return Ok(String::new());
        }
        Self::validate_name(value)
    }

    pub fn validate_email(value: &str) -> Result<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            bail!("cannot be empty");
        }
        if !EMAIL_PATTERN.is_match(trimmed) {
            bail!("'{trimmed}' is not a valid email address");
        }
        Ok(trimmed.to_string())
    }

    /// Group names are free-form; blank clears the group.
    pub fn validate_group_name(value: &str) -> Result<String> {
        let trimmed = value.trim();
        if trimmed.chars().count() > SizeLimits::MAX_GROUP_NAME_LENGTH {
            bail!("cannot exceed {} characters", SizeLimits::MAX_GROUP_NAME_LENGTH);
        }
        Ok(strip_control(trimmed))
    }

    /// Notes and food restrictions are kept exactly as typed.
    pub fn validate_free_text(value: &str) -> Result<String> {
        if value.chars().count() > SizeLimits::MAX_FREE_TEXT_LENGTH {
            bail!("cannot exceed {} characters", SizeLimits::MAX_FREE_TEXT_LENGTH);
        }
        Ok(value.to_string())
    }

    /// Checks and normalises every present field of an inline edit. Nothing
    /// is sent to the store when this fails.
    pub fn validate_patch(patch: &RsvpPatch) -> Result<RsvpPatch, DashboardError> {
        if patch.is_empty() {
            return Err(DashboardError::validation("update", "no fields to change"));
        }

        let mut checked = patch.clone();
        check_field(&mut checked.first_name, "firstName", Self::validate_name)?;
        check_field(&mut checked.last_name, "lastName", Self::validate_name)?;
        check_field(&mut checked.email, "email", Self::validate_email)?;
        check_field(&mut checked.guest_first_name, "guestFirstName", Self::validate_optional_name)?;
        check_field(&mut checked.guest_last_name, "guestLastName", Self::validate_optional_name)?;
        check_field(&mut checked.food_restrictions, "foodRestrictions", Self::validate_free_text)?;
        check_field(&mut checked.number_of_rooms, "numberOfRooms", Self::validate_room_count)?;
        check_field(&mut checked.group, "group", Self::validate_group_name)?;
        check_field(&mut checked.admin_note, "adminNote", Self::validate_free_text)?;
        if checked.assigned_table == Some(0) {
            return Err(DashboardError::validation("assignedTable", "table numbers start at 1"));
        }
        Ok(checked)
    }
}

fn check_field(
    value: &mut Option<String>,
    field: &str,
    validate: fn(&str) -> Result<String>,
) -> Result<(), DashboardError> {
    if let Some(raw) = value.as_deref() {
        match validate(raw) {
            Ok(clean) => *value = Some(clean),
            Err(error) => {
                let reason = error.to_string();
                LogHelper::log_validation_failure(field, raw, &reason);
                return Err(DashboardError::validation(field, reason));
            }
        }
    }
    Ok(())
}

fn strip_control(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control() || *c == ' ')
        .collect()
}

/// Size limits for admin input
pub struct SizeLimits;

impl SizeLimits {
    pub const MAX_NAME_LENGTH: usize = 100;
    pub const MAX_GROUP_NAME_LENGTH: usize = 60;
    pub const MAX_FREE_TEXT_LENGTH: usize = 2000;
    pub const MAX_ROOMS: usize = 50;
}
