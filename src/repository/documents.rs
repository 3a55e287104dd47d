//! GraphQL documents sent to the hosted RSVP API.

const RSVP_FIELDS: &str = "id firstName lastName email attending bringingGuest \
guestFirstName guestLastName foodRestrictions needsHotelRoom numberOfRooms group \
adminNote assignedTable timestamp createdAt updatedAt";

pub struct Document {
    /// Operation name, also the key of the payload under `data`.
    pub operation: &'static str,
    pub query: String,
}

pub fn list_rsvps() -> Document {
    Document {
        operation: "listRSVPS",
        query: format!(
            "query ListRSVPS($filter: ModelRSVPFilterInput, $limit: Int, $nextToken: String) {{ \
             listRSVPS(filter: $filter, limit: $limit, nextToken: $nextToken) {{ \
             items {{ {RSVP_FIELDS} }} nextToken }} }}"
        ),
    }
}

pub fn update_rsvp() -> Document {
    Document {
        operation: "updateRSVP",
        query: format!(
            "mutation UpdateRSVP($input: UpdateRSVPInput!) {{ \
             updateRSVP(input: $input) {{ {RSVP_FIELDS} }} }}"
        ),
    }
}

pub fn delete_rsvp() -> Document {
    Document {
        operation: "deleteRSVP",
        query: "mutation DeleteRSVP($input: DeleteRSVPInput!) { deleteRSVP(input: $input) { id } }"
            .to_string(),
    }
}

pub fn create_rsvp() -> Document {
    Document {
        operation: "createRSVP",
        query: format!(
            "mutation CreateRSVP($input: CreateRSVPInput!) {{ \
             createRSVP(input: $input) {{ {RSVP_FIELDS} }} }}"
        ),
    }
}
