//! Reqwest-backed adapter for the hosted GraphQL RSVP API.
//!
//! Owns transport details only: request envelopes, API-key header, timeout
//! and HTTP error mapping, and decoding of the `{data, errors}` envelope.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use super::documents::{self, Document};
use super::{ListPage, RecordStore, RecordStoreError};
use crate::domain::rsvp::{NewRsvp, Rsvp, RsvpId, RsvpPatch};

const API_KEY_HEADER: &str = "x-api-key";

pub struct GraphQlRecordStore {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl GraphQlRecordStore {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        document: Document,
        variables: Value,
    ) -> Result<T, RecordStoreError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&json!({ "query": document.query, "variables": variables }));
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key.as_str());
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        debug!(operation = document.operation, bytes = body.len(), "GraphQL response");
        decode_payload(document.operation, body.as_ref())
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Map<String, Value>>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPayload {
    items: Option<Vec<Option<Rsvp>>>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeletedPayload {
    id: RsvpId,
}

/// Pulls `data.<operation>` out of a GraphQL response. Any entry in `errors`
/// fails the call, even alongside partial data.
fn decode_payload<T: DeserializeOwned>(operation: &str, body: &[u8]) -> Result<T, RecordStoreError> {
    let envelope: Envelope = serde_json::from_slice(body).map_err(|error| {
        RecordStoreError::decode(format!("invalid GraphQL envelope: {error}"))
    })?;

    if !envelope.errors.is_empty() {
        return Err(RecordStoreError::GraphQl {
            operation: operation.to_string(),
            messages: envelope.errors.into_iter().map(|e| e.message).collect(),
        });
    }

    let payload = envelope
        .data
        .and_then(|mut data| data.remove(operation))
        .filter(|value| !value.is_null())
        .ok_or_else(|| RecordStoreError::MissingData(operation.to_string()))?;

    serde_json::from_value(payload)
        .map_err(|error| RecordStoreError::decode(format!("invalid {operation} payload: {error}")))
}

fn list_page_from_payload(payload: ListPayload) -> Result<ListPage, RecordStoreError> {
    let items = payload
        .items
        .ok_or_else(|| RecordStoreError::MissingData("listRSVPS.items".to_string()))?;
    Ok(ListPage {
        items: items.into_iter().flatten().collect(),
        next_token: payload.next_token,
    })
}

fn update_input(id: &RsvpId, patch: &RsvpPatch) -> Result<Value, RecordStoreError> {
    let mut input = match serde_json::to_value(patch) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => Map::new(),
        Err(error) => return Err(RecordStoreError::decode(error.to_string())),
    };
    input.insert("id".to_string(), Value::String(id.as_str().to_string()));
    Ok(Value::Object(input))
}

#[async_trait]
impl RecordStore for GraphQlRecordStore {
    #[instrument(skip(self))]
    async fn list_page(
        &self,
        limit: Option<usize>,
        next_token: Option<String>,
    ) -> Result<ListPage, RecordStoreError> {
        let payload: ListPayload = self
            .execute(
                documents::list_rsvps(),
                json!({ "limit": limit, "nextToken": next_token }),
            )
            .await?;
        list_page_from_payload(payload)
    }

    #[instrument(skip(self, patch), fields(id = %id))]
    async fn update(&self, id: &RsvpId, patch: &RsvpPatch) -> Result<Rsvp, RecordStoreError> {
        let input = update_input(id, patch)?;
        self.execute(documents::update_rsvp(), json!({ "input": input }))
            .await
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &RsvpId) -> Result<RsvpId, RecordStoreError> {
        let deleted: DeletedPayload = self
            .execute(
                documents::delete_rsvp(),
                json!({ "input": { "id": id.as_str() } }),
            )
            .await?;
        Ok(deleted.id)
    }

    #[instrument(skip(self, rsvp), fields(email = %rsvp.email))]
    async fn create(&self, rsvp: &NewRsvp) -> Result<Rsvp, RecordStoreError> {
        let input = serde_json::to_value(rsvp)
            .map_err(|error| RecordStoreError::decode(error.to_string()))?;
        self.execute(documents::create_rsvp(), json!({ "input": input }))
            .await
    }
}

fn map_transport_error(error: reqwest::Error) -> RecordStoreError {
    if error.is_timeout() {
        RecordStoreError::transport(format!("request timed out: {error}"))
    } else {
        RecordStoreError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RecordStoreError {
    RecordStoreError::Status {
        status: status.as_u16(),
        body: body_preview(body),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rsvp::Answer;

    #[test]
    fn test_decode_list_page() {
        let body = br#"{"data":{"listRSVPS":{"items":[
            {"id":"1","firstName":"Ada","lastName":"L","email":"a@x","attending":"yes"},
            null,
            {"id":"2","firstName":"Bo","lastName":"M","email":"b@x","attending":"no"}
        ],"nextToken":"abc"}}}"#;

        let payload: ListPayload = decode_payload("listRSVPS", body).unwrap();
        let page = list_page_from_payload(payload).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].attending, Some(Answer::No));
        assert_eq!(page.next_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_unrecognised_answer_does_not_fail_the_listing() {
        let body = br#"{"data":{"listRSVPS":{"items":[
            {"id":"1","firstName":"Ada","lastName":"L","email":"a@x","attending":"yes"},
            {"id":"2","firstName":"Bo","lastName":"M","email":"b@x","attending":"maybe","needsHotelRoom":"pending"}
        ],"nextToken":null}}}"#;

        let payload: ListPayload = decode_payload("listRSVPS", body).unwrap();
        let page = list_page_from_payload(payload).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].attending, Some(Answer::Yes));
        assert_eq!(page.items[1].first_name, "Bo");
        assert_eq!(page.items[1].attending, None);
        assert_eq!(page.items[1].needs_hotel_room, None);
    }

    #[test]
    fn test_empty_list_is_valid() {
        let body = br#"{"data":{"listRSVPS":{"items":[],"nextToken":null}}}"#;
        let payload: ListPayload = decode_payload("listRSVPS", body).unwrap();
        let page = list_page_from_payload(payload).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_null_items_is_missing_data() {
        let body = br#"{"data":{"listRSVPS":{"items":null}}}"#;
        let payload: ListPayload = decode_payload("listRSVPS", body).unwrap();
        assert!(matches!(
            list_page_from_payload(payload),
            Err(RecordStoreError::MissingData(_))
        ));
    }

    #[test]
    fn test_null_payload_is_missing_data() {
        let body = br#"{"data":{"updateRSVP":null}}"#;
        let err = decode_payload::<Rsvp>("updateRSVP", body).unwrap_err();
        assert_eq!(err, RecordStoreError::MissingData("updateRSVP".to_string()));
    }

    #[test]
    fn test_graphql_errors_fail_the_call() {
        let body = br#"{"data":{"deleteRSVP":null},"errors":[{"message":"Unauthorized"},{"message":"Try again"}]}"#;
        let err = decode_payload::<DeletedPayload>("deleteRSVP", body).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Record store rejected deleteRSVP: Unauthorized; Try again"
        );
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        let err = decode_payload::<Rsvp>("updateRSVP", b"<html>").unwrap_err();
        assert!(matches!(err, RecordStoreError::Decode(_)));
    }

    #[test]
    fn test_update_input_carries_id_and_changes_only() {
        let input = update_input(&RsvpId::new("42"), &RsvpPatch::group("Family")).unwrap();
        assert_eq!(input, json!({ "id": "42", "group": "Family" }));
    }

    #[test]
    fn test_status_error_preview_is_compacted() {
        let err = map_status_error(StatusCode::UNAUTHORIZED, b"  bad\n   key  ");
        assert_eq!(
            err,
            RecordStoreError::Status {
                status: 401,
                body: "bad key".to_string()
            }
        );
    }

    #[test]
    fn test_body_preview_truncates() {
        let long = "x".repeat(200);
        let preview = body_preview(long.as_bytes());
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
    }
}
