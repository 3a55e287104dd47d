pub mod database;
pub mod documents;
pub mod graphql;
pub mod group_names;
pub mod mock;

use crate::domain::rsvp::{NewRsvp, Rsvp, RsvpId, RsvpPatch};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Failures talking to the hosted record store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordStoreError {
    #[error("Record store unreachable: {0}")]
    Transport(String),

    #[error("Record store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Record store rejected {operation}: {}", messages.join("; "))]
    GraphQl {
        operation: String,
        messages: Vec<String>,
    },

    #[error("Could not decode record store response: {0}")]
    Decode(String),

    #[error("Record store returned no data for {0}")]
    MissingData(String),

    #[error("Record {0} not found")]
    NotFound(RsvpId),

    #[error("Simulated failure for {operation} on {id}")]
    Injected { operation: String, id: RsvpId },
}

impl RecordStoreError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}

/// One page of `listRSVPs`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub items: Vec<Rsvp>,
    pub next_token: Option<String>,
}

/// The hosted RSVP store. Every call is a suspension point; nothing here
/// touches local state.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_page(
        &self,
        limit: Option<usize>,
        next_token: Option<String>,
    ) -> Result<ListPage, RecordStoreError>;

    async fn update(&self, id: &RsvpId, patch: &RsvpPatch) -> Result<Rsvp, RecordStoreError>;

    async fn delete(&self, id: &RsvpId) -> Result<RsvpId, RecordStoreError>;

    async fn create(&self, rsvp: &NewRsvp) -> Result<Rsvp, RecordStoreError>;

    /// Full, unpaginated collection. Follows `nextToken` until the store
    /// reports no further pages.
    async fn list_all(&self, page_size: Option<usize>) -> Result<Vec<Rsvp>, RecordStoreError> {
        let mut items = Vec::new();
        let mut next_token = None;
        let mut pages = 0usize;
        loop {
            let page = self.list_page(page_size, next_token).await?;
            pages += 1;
            items.extend(page.items);
            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }
        debug!(pages, records = items.len(), "Fetched RSVP collection");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use mockall::{mock, Sequence};

    // Only the required methods are mocked so `list_all` keeps its provided body.
    mock! {
        Store {}

        #[async_trait]
        impl RecordStore for Store {
            async fn list_page(
                &self,
                limit: Option<usize>,
                next_token: Option<String>,
            ) -> Result<ListPage, RecordStoreError>;
            async fn update(&self, id: &RsvpId, patch: &RsvpPatch) -> Result<Rsvp, RecordStoreError>;
            async fn delete(&self, id: &RsvpId) -> Result<RsvpId, RecordStoreError>;
            async fn create(&self, rsvp: &NewRsvp) -> Result<Rsvp, RecordStoreError>;
        }
    }

    #[tokio::test]
    async fn test_list_all_follows_next_token() {
        let mut store = MockStore::new();
        let mut seq = Sequence::new();

        store
            .expect_list_page()
            .with(eq(Some(2)), eq(None::<String>))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(ListPage {
                    items: vec![Rsvp::new("a", "A", "A", "a@x"), Rsvp::new("b", "B", "B", "b@x")],
                    next_token: Some("page-2".to_string()),
                })
            });
        store
            .expect_list_page()
            .with(eq(Some(2)), eq(Some("page-2".to_string())))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(ListPage {
                    items: vec![Rsvp::new("c", "C", "C", "c@x")],
                    next_token: None,
                })
            });

        let all = store.list_all(Some(2)).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_list_all_propagates_page_failure() {
        let mut store = MockStore::new();
        let mut seq = Sequence::new();
        store
            .expect_list_page()
            .with(eq(None), eq(None::<String>))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(ListPage {
                    items: vec![Rsvp::new("a", "A", "A", "a@x")],
                    next_token: Some("page-2".to_string()),
                })
            });
        store
            .expect_list_page()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(RecordStoreError::transport("connection refused")));

        let err = store.list_all(None).await.unwrap_err();
        assert_eq!(err, RecordStoreError::Transport("connection refused".to_string()));
    }

    #[tokio::test]
    async fn test_list_all_stops_on_empty_token() {
        let mut store = MockStore::new();
        store.expect_list_page().times(1).returning(|_, _| {
            Ok(ListPage {
                items: Vec::new(),
                next_token: Some(String::new()),
            })
        });

        assert!(store.list_all(Some(10)).await.unwrap().is_empty());
    }
}
