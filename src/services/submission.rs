use crate::domain::rsvp::{Answer, NewRsvp, Rsvp};
use crate::repository::RecordStore;
use crate::services::error_handling::DashboardError;
use crate::services::validation::InputValidator;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// What a guest fills in on the public RSVP form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RsvpSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub attending: Option<Answer>,
    pub bringing_guest: Option<Answer>,
    pub guest_first_name: String,
    pub guest_last_name: String,
    pub food_restrictions: String,
    pub needs_hotel_room: Option<Answer>,
    pub number_of_rooms: String,
}

impl RsvpSubmission {
    /// Checks required fields and drops answers that no longer apply: a
    /// declined invitation carries no guest, food or hotel details.
    pub fn validate(&self, submitted_at: DateTime<Utc>) -> Result<NewRsvp, DashboardError> {
        let first_name = field("firstName", InputValidator::validate_name(&self.first_name))?;
        let last_name = field("lastName", InputValidator::validate_name(&self.last_name))?;
        let email = field("email", InputValidator::validate_email(&self.email))?;
        let attending = self
            .attending
            .ok_or_else(|| DashboardError::validation("attending", "please answer yes or no"))?;

        let mut rsvp = NewRsvp {
            first_name,
            last_name,
            email,
            attending: Some(attending),
            bringing_guest: None,
            guest_first_name: String::new(),
            guest_last_name: String::new(),
            food_restrictions: String::new(),
            needs_hotel_room: None,
            number_of_rooms: String::new(),
            timestamp: submitted_at,
        };

        if attending == Answer::No {
            return Ok(rsvp);
        }

        rsvp.bringing_guest = self.bringing_guest;
        if self.bringing_guest == Some(Answer::Yes) {
            rsvp.guest_first_name = field(
                "guestFirstName",
                InputValidator::validate_optional_name(&self.guest_first_name),
            )?;
            rsvp.guest_last_name = field(
                "guestLastName",
                InputValidator::validate_optional_name(&self.guest_last_name),
            )?;
        }
        rsvp.food_restrictions = field(
            "foodRestrictions",
            InputValidator::validate_free_text(&self.food_restrictions),
        )?;
        rsvp.needs_hotel_room = self.needs_hotel_room;
        if self.needs_hotel_room == Some(Answer::Yes) {
            rsvp.number_of_rooms = field(
                "numberOfRooms",
                InputValidator::validate_room_count(&self.number_of_rooms),
            )?;
        }
        Ok(rsvp)
    }
}

fn field(name: &str, result: anyhow::Result<String>) -> Result<String, DashboardError> {
    result.map_err(|error| DashboardError::validation(name, error.to_string()))
}

/// Creates records on behalf of the public form.
pub struct SubmissionService {
    store: Arc<dyn RecordStore>,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, submission), fields(email = %submission.email))]
    pub async fn submit(&self, submission: &RsvpSubmission) -> Result<Rsvp, DashboardError> {
        let new_rsvp = submission.validate(Utc::now())?;
        match self.store.create(&new_rsvp).await {
            Ok(created) => {
                info!(rsvp_id = %created.id, "RSVP submitted");
                Ok(created)
            }
            Err(error) => {
                warn!(error = %error, "RSVP submission failed");
                Err(error.into())
            }
        }
    }
}
