use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::warn;

/// Label shown for records whose `group` is empty.
pub const UNASSIGNED_GROUP: &str = "Unassigned";

/// Opaque identifier assigned by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RsvpId(String);

impl RsvpId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RsvpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RsvpId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RsvpId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A yes/no answer as stored on the wire (`"yes"` / `"no"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub fn as_str(self) -> &'static str {
        match self {
            Answer::Yes => "yes",
            Answer::No => "no",
        }
    }

    /// Parses `yes`/`no` case-insensitively. Blank input is `Ok(None)`.
    pub fn parse_optional(value: &str) -> Result<Option<Self>, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "yes" | "y" | "true" => Ok(Some(Answer::Yes)),
            "no" | "n" | "false" => Ok(Some(Answer::No)),
            other => Err(format!("expected yes or no, got '{other}'")),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Answer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Answer::parse_optional(s)?.ok_or_else(|| "expected yes or no".to_string())
    }
}

/// Renders an optional answer the way the wire and the CSV export do.
pub fn answer_text(answer: Option<Answer>) -> &'static str {
    answer.map(Answer::as_str).unwrap_or("")
}

/// The single entity the dashboard manages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rsvp {
    pub id: RsvpId,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub first_name: String,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub last_name: String,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub email: String,
    #[serde(
        default,
        serialize_with = "optional_answer::serialize",
        deserialize_with = "optional_answer::attending"
    )]
    pub attending: Option<Answer>,
    #[serde(
        default,
        serialize_with = "optional_answer::serialize",
        deserialize_with = "optional_answer::bringing_guest"
    )]
    pub bringing_guest: Option<Answer>,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub guest_first_name: String,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub guest_last_name: String,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub food_restrictions: String,
    /// `None` is "unspecified".
    #[serde(
        default,
        serialize_with = "optional_answer::serialize",
        deserialize_with = "optional_answer::needs_hotel_room"
    )]
    pub needs_hotel_room: Option<Answer>,
    /// Kept as text; only validated when edited through the dashboard.
    #[serde(default, deserialize_with = "text::deserialize")]
    pub number_of_rooms: String,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub group: String,
    #[serde(default, deserialize_with = "text::deserialize")]
    pub admin_note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_table: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Rsvp {
    /// A blank record with only the identity filled in. Mostly useful for tests
    /// and fixtures; real records come from the store.
    pub fn new(id: impl Into<RsvpId>, first_name: &str, last_name: &str, email: &str) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            attending: None,
            bringing_guest: None,
            guest_first_name: String::new(),
            guest_last_name: String::new(),
            food_restrictions: String::new(),
            needs_hotel_room: None,
            number_of_rooms: String::new(),
            group: String::new(),
            admin_note: String::new(),
            assigned_table: None,
            timestamp: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Guest first and last name joined and trimmed; empty when absent.
    pub fn guest_name(&self) -> String {
        format!("{} {}", self.guest_first_name, self.guest_last_name)
            .trim()
            .to_string()
    }

    pub fn group_label(&self) -> &str {
        group_label(&self.group)
    }

    pub fn is_attending(&self) -> bool {
        self.attending == Some(Answer::Yes)
    }

    pub fn is_bringing_guest(&self) -> bool {
        self.bringing_guest == Some(Answer::Yes)
    }

    /// Merges the fields present in `patch`, leaving every other field untouched.
    pub fn apply_patch(&mut self, patch: &RsvpPatch) {
        if let Some(v) = &patch.first_name {
            self.first_name = v.clone();
        }
        if let Some(v) = &patch.last_name {
            self.last_name = v.clone();
        }
        if let Some(v) = &patch.email {
            self.email = v.clone();
        }
        if let Some(v) = patch.attending {
            self.attending = Some(v);
        }
        if let Some(v) = patch.bringing_guest {
            self.bringing_guest = Some(v);
        }
        if let Some(v) = &patch.guest_first_name {
            self.guest_first_name = v.clone();
        }
        if let Some(v) = &patch.guest_last_name {
            self.guest_last_name = v.clone();
        }
        if let Some(v) = &patch.food_restrictions {
            self.food_restrictions = v.clone();
        }
        if let Some(v) = patch.needs_hotel_room {
            self.needs_hotel_room = v;
        }
        if let Some(v) = &patch.number_of_rooms {
            self.number_of_rooms = v.clone();
        }
        if let Some(v) = &patch.group {
            self.group = v.clone();
        }
        if let Some(v) = &patch.admin_note {
            self.admin_note = v.clone();
        }
        if let Some(v) = patch.assigned_table {
            self.assigned_table = Some(v);
        }
    }
}

pub fn group_label(group: &str) -> &str {
    if group.is_empty() {
        UNASSIGNED_GROUP
    } else {
        group
    }
}

/// Partial update. Only `Some` fields are sent to the store and merged locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_answer_text")]
    pub attending: Option<Answer>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_answer_text")]
    pub bringing_guest: Option<Answer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_restrictions: Option<String>,
    /// `Some(None)` resets the answer to unspecified.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_answer_update")]
    pub needs_hotel_room: Option<Option<Answer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_rooms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_table: Option<u32>,
}

impl RsvpPatch {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            group: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn admin_note(note: impl Into<String>) -> Self {
        Self {
            admin_note: Some(note.into()),
            ..Default::default()
        }
    }

    pub fn attending(answer: Answer) -> Self {
        Self {
            attending: Some(answer),
            ..Default::default()
        }
    }

    pub fn assigned_table(table: u32) -> Self {
        Self {
            assigned_table: Some(table),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Builds a single-field patch from a column name and raw text, as typed
    /// into an inline editor.
    pub fn from_field(field: &str, value: &str) -> Result<Self, String> {
        let mut patch = Self::default();
        match field {
            "firstName" | "first_name" => patch.first_name = Some(value.to_string()),
            "lastName" | "last_name" => patch.last_name = Some(value.to_string()),
            "email" => patch.email = Some(value.to_string()),
            "attending" => patch.attending = Some(value.parse()?),
            "bringingGuest" | "bringing_guest" => patch.bringing_guest = Some(value.parse()?),
            "guestFirstName" | "guest_first_name" => {
                patch.guest_first_name = Some(value.to_string())
            }
            "guestLastName" | "guest_last_name" => patch.guest_last_name = Some(value.to_string()),
            "foodRestrictions" | "food_restrictions" | "food" => {
                patch.food_restrictions = Some(value.to_string())
            }
            "needsHotelRoom" | "needs_hotel_room" => {
                patch.needs_hotel_room = Some(Answer::parse_optional(value)?)
            }
            "numberOfRooms" | "number_of_rooms" => patch.number_of_rooms = Some(value.to_string()),
            "group" => patch.group = Some(value.to_string()),
            "adminNote" | "admin_note" | "note" => patch.admin_note = Some(value.to_string()),
            "assignedTable" | "assigned_table" | "table" => {
                let table = value
                    .trim()
                    .parse::<u32>()
                    .map_err(|e| format!("invalid table number '{value}': {e}"))?;
                patch.assigned_table = Some(table);
            }
            other => return Err(format!("unknown or read-only field '{other}'")),
        }
        Ok(patch)
    }
}

/// Fields sent by the public RSVP form when creating a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRsvp {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(serialize_with = "serialize_answer_text")]
    pub attending: Option<Answer>,
    #[serde(serialize_with = "serialize_answer_text")]
    pub bringing_guest: Option<Answer>,
    pub guest_first_name: String,
    pub guest_last_name: String,
    pub food_restrictions: String,
    #[serde(serialize_with = "serialize_answer_text")]
    pub needs_hotel_room: Option<Answer>,
    pub number_of_rooms: String,
    pub timestamp: DateTime<Utc>,
}

fn serialize_answer_text<S: Serializer>(
    answer: &Option<Answer>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(answer_text(*answer))
}

fn serialize_answer_update<S: Serializer>(
    update: &Option<Option<Answer>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(answer_text((*update).flatten()))
}

/// `"yes"` / `"no"` on the wire; empty string or `null` mean unspecified.
/// Any other stored value also reads as unspecified so one odd record cannot
/// fail a whole listing.
mod optional_answer {
    use super::{warn, Answer};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(answer: &Option<Answer>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(super::answer_text(*answer))
    }

    pub fn attending<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Answer>, D::Error> {
        lenient(d, "attending")
    }

    pub fn bringing_guest<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Answer>, D::Error> {
        lenient(d, "bringingGuest")
    }

    pub fn needs_hotel_room<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Answer>, D::Error> {
        lenient(d, "needsHotelRoom")
    }

    fn lenient<'de, D: Deserializer<'de>>(
        d: D,
        field: &'static str,
    ) -> Result<Option<Answer>, D::Error> {
        let Some(value) = Option::<String>::deserialize(d)? else {
            return Ok(None);
        };
        match Answer::parse_optional(&value) {
            Ok(answer) => Ok(answer),
            Err(reason) => {
                warn!(field, value = %value, %reason, "Unrecognised answer read as unspecified");
                Ok(None)
            }
        }
    }
}

/// Text fields arrive as `null` when never set.
mod text {
    use super::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_store_record_with_nulls() {
        let json = r#"{
            "id": "abc",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "attending": "yes",
            "bringingGuest": "",
            "guestFirstName": null,
            "foodRestrictions": "Vegan",
            "group": null,
            "timestamp": "2025-05-01T12:00:00.000Z",
            "__typename": "RSVP"
        }"#;

        let rsvp: Rsvp = serde_json::from_str(json).unwrap();
        assert_eq!(rsvp.id, RsvpId::new("abc"));
        assert_eq!(rsvp.attending, Some(Answer::Yes));
        assert_eq!(rsvp.bringing_guest, None);
        assert_eq!(rsvp.guest_first_name, "");
        assert_eq!(rsvp.group, "");
        assert_eq!(rsvp.needs_hotel_room, None);
        assert!(rsvp.timestamp.is_some());
    }

    #[test]
    fn test_unknown_answer_reads_as_unspecified() {
        let json = r#"{"id": "x", "firstName": "Kit", "attending": "maybe", "needsHotelRoom": "pending", "bringingGuest": "no"}"#;
        let rsvp: Rsvp = serde_json::from_str(json).unwrap();
        assert_eq!(rsvp.attending, None);
        assert_eq!(rsvp.needs_hotel_room, None);
        assert_eq!(rsvp.bringing_guest, Some(Answer::No));
        assert_eq!(rsvp.first_name, "Kit");
    }

    #[test]
    fn test_answer_serde_is_lowercase() {
        assert_eq!(serde_json::to_value(Answer::Yes).unwrap(), serde_json::json!("yes"));
        let answer: Answer = serde_json::from_str(r#""no""#).unwrap();
        assert_eq!(answer, Answer::No);
    }

    #[test]
    fn test_display_helpers() {
        let mut rsvp = Rsvp::new("1", "Grace", "Hopper", "grace@example.com");
        assert_eq!(rsvp.full_name(), "Grace Hopper");
        assert_eq!(rsvp.guest_name(), "");
        assert_eq!(rsvp.group_label(), UNASSIGNED_GROUP);

        rsvp.guest_first_name = "Alan".to_string();
        assert_eq!(rsvp.guest_name(), "Alan");

        rsvp.group = "Family".to_string();
        assert_eq!(rsvp.group_label(), "Family");
    }

    #[test]
    fn test_apply_patch_only_touches_present_fields() {
        let mut rsvp = Rsvp::new("1", "Grace", "Hopper", "grace@example.com");
        rsvp.food_restrictions = "None".to_string();
        let before = rsvp.clone();

        rsvp.apply_patch(&RsvpPatch::admin_note("VIP"));

        assert_eq!(rsvp.admin_note, "VIP");
        assert_eq!(rsvp.food_restrictions, before.food_restrictions);
        assert_eq!(rsvp.first_name, before.first_name);
        assert_eq!(rsvp.attending, before.attending);
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let patch = RsvpPatch {
            attending: Some(Answer::No),
            group: Some("Friends".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"attending": "no", "group": "Friends"})
        );
    }

    #[test]
    fn test_patch_from_field() {
        let patch = RsvpPatch::from_field("attending", "Yes").unwrap();
        assert_eq!(patch.attending, Some(Answer::Yes));

        let patch = RsvpPatch::from_field("note", "table near the door").unwrap();
        assert_eq!(patch.admin_note.as_deref(), Some("table near the door"));

        assert!(RsvpPatch::from_field("id", "other").is_err());
        assert!(RsvpPatch::from_field("attending", "perhaps").is_err());
    }

    #[test]
    fn test_hotel_room_can_be_reset_to_unspecified() {
        let mut rsvp = Rsvp::new("1", "Grace", "Hopper", "grace@example.com");
        rsvp.needs_hotel_room = Some(Answer::Yes);

        let patch = RsvpPatch::from_field("needsHotelRoom", "").unwrap();
        assert_eq!(patch.needs_hotel_room, Some(None));
        assert!(!patch.is_empty());
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({"needsHotelRoom": ""})
        );

        rsvp.apply_patch(&patch);
        assert_eq!(rsvp.needs_hotel_room, None);

        let patch = RsvpPatch::from_field("needsHotelRoom", "no").unwrap();
        assert_eq!(patch.needs_hotel_room, Some(Some(Answer::No)));
    }
}
