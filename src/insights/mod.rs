//! Analytics collaborator
//!
//! Click, view and conversion signals tied to hits. Sending is
//! fire-and-forget: callers never wait on or observe delivery.

use crate::backend::{Hit, HttpClient};
use crate::config::{BackendSettings, InsightsSettings};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Label of the conversion sent from a results panel
pub const PRODUCT_ORDERED: &str = "Product Ordered";
/// Label of the click sent when an autocomplete product is chosen
pub const ITEM_SELECTED: &str = "Item Selected";
/// Label of the view sent when autocomplete products are shown
pub const ITEMS_VIEWED: &str = "Items Viewed";

/// Kind of analytics event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Click,
    Conversion,
    View,
}

/// An analytics event about one or more hits of an index
#[derive(Debug, Clone, PartialEq)]
pub struct InsightsEvent {
    pub kind: EventKind,
    pub name: String,
    pub index: String,
    pub object_ids: Vec<String>,
    /// 1-based positions, parallel to `object_ids`
    pub positions: Vec<u32>,
    pub query_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl InsightsEvent {
    pub fn new(kind: EventKind, name: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            index: index.into(),
            object_ids: vec![],
            positions: vec![],
            query_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Add a hit shown at `position` (1-based)
    pub fn with_hit(mut self, hit: &Hit, position: u32) -> Self {
        self.object_ids.push(hit.object_id.clone());
        self.positions.push(position);
        self
    }

    /// Add a hit whose position is unknown.
    ///
    /// Positions are then left out of the event.
    pub fn with_unplaced_hit(mut self, hit: &Hit) -> Self {
        self.object_ids.push(hit.object_id.clone());
        self.positions.clear();
        self
    }

    pub fn with_query_id(mut self, query_id: Option<String>) -> Self {
        self.query_id = query_id;
        self
    }
}

/// Analytics sink
pub trait InsightsClient: Send + Sync {
    /// Token identifying the current user
    fn user_token(&self) -> &str;

    /// Send an event without waiting for delivery
    fn send_event(&self, event: InsightsEvent);
}

/// Token for users without an explicit one
pub fn anonymous_user_token() -> String {
    format!("anonymous-{}", Uuid::new_v4())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent<'a> {
    event_type: EventKind,
    event_name: &'a str,
    index: &'a str,
    user_token: &'a str,
    #[serde(rename = "objectIDs")]
    object_ids: &'a [String],
    #[serde(skip_serializing_if = "<[u32]>::is_empty")]
    positions: &'a [u32],
    #[serde(rename = "queryID", skip_serializing_if = "Option::is_none")]
    query_id: Option<&'a str>,
    timestamp: i64,
}

impl<'a> WireEvent<'a> {
    fn new(event: &'a InsightsEvent, user_token: &'a str) -> Self {
        Self {
            event_type: event.kind,
            event_name: &event.name,
            index: &event.index,
            user_token,
            object_ids: &event.object_ids,
            positions: if event.query_id.is_some() {
                event.positions.as_slice()
            } else {
                &[]
            },
            query_id: event.query_id.as_deref(),
            timestamp: event.timestamp.timestamp_millis(),
        }
    }
}

/// Insights client posting events to the hosted events endpoint
#[derive(Clone)]
pub struct HttpInsights {
    client: HttpClient,
    endpoint: String,
    user_token: String,
}

impl HttpInsights {
    pub fn new(
        client: HttpClient,
        endpoint: impl Into<String>,
        user_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            user_token: user_token.into(),
        }
    }

    /// Build a client from settings
    pub fn with_settings(
        backend: &BackendSettings,
        insights: &InsightsSettings,
        user_token: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self::new(
            HttpClient::with_settings(backend)?,
            insights.endpoint.clone(),
            user_token,
        ))
    }

    /// Post `events` and wait for the answer
    pub async fn deliver(&self, events: &[InsightsEvent]) -> Result<()> {
        let wire: Vec<WireEvent<'_>> = events
            .iter()
            .map(|e| WireEvent::new(e, &self.user_token))
            .collect();
        let body = serde_json::json!({ "events": wire });

        let response = self.client.post_json(&self.endpoint, &body).await?;
        if !response.is_success() {
            return Err(Error::Backend {
                index: events.first().map(|e| e.index.clone()).unwrap_or_default(),
                status: response.status,
                message: response.message(),
            });
        }

        debug!("Delivered {} insights events", events.len());
        Ok(())
    }
}

impl InsightsClient for HttpInsights {
    fn user_token(&self) -> &str {
        &self.user_token
    }

    fn send_event(&self, event: InsightsEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, dropping insights event '{}'", event.name);
            return;
        };

        let client = self.clone();
        runtime.spawn(async move {
            if let Err(e) = client.deliver(std::slice::from_ref(&event)).await {
                warn!("Failed to send insights event '{}': {}", event.name, e);
            }
        });
    }
}

/// Insights client that only logs events
#[derive(Debug, Clone)]
pub struct LogInsights {
    user_token: String,
}

impl LogInsights {
    pub fn new(user_token: impl Into<String>) -> Self {
        Self {
            user_token: user_token.into(),
        }
    }
}

impl InsightsClient for LogInsights {
    fn user_token(&self) -> &str {
        &self.user_token
    }

    fn send_event(&self, event: InsightsEvent) {
        info!(
            "Insights {:?} '{}' on {} for {:?} (query id {:?})",
            event.kind, event.name, event.index, event.object_ids, event.query_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HttpInsights {
        HttpInsights::new(
            HttpClient::new().unwrap(),
            format!("{}/1/events", server.uri()),
            "ma-user-999",
        )
    }

    async fn mock_events(server: &MockServer, status: u16) {
        Mock::given(method("POST"))
            .and(path("/1/events"))
            .respond_with(ResponseTemplate::new(status))
            .mount(server)
            .await;
    }

    async fn received_bodies(server: &MockServer) -> Vec<serde_json::Value> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    #[test]
    fn test_anonymous_token() {
        let a = anonymous_user_token();
        assert!(a.starts_with("anonymous-"));
        assert_ne!(a, anonymous_user_token());
    }

    #[tokio::test]
    async fn test_deliver_conversion_payload() {
        let server = MockServer::start().await;
        mock_events(&server, 200).await;

        let hit = Hit::new("5477500", "Fire TV Stick");
        let event = InsightsEvent::new(EventKind::Conversion, PRODUCT_ORDERED, "instant_search")
            .with_hit(&hit, 3)
            .with_query_id(Some("qid-1".to_string()));

        client(&server).deliver(&[event]).await.unwrap();

        let bodies = received_bodies(&server).await;
        let sent = &bodies[0]["events"][0];
        assert_eq!(sent["eventType"], "conversion");
        assert_eq!(sent["eventName"], "Product Ordered");
        assert_eq!(sent["index"], "instant_search");
        assert_eq!(sent["userToken"], "ma-user-999");
        assert_eq!(sent["objectIDs"], serde_json::json!(["5477500"]));
        assert_eq!(sent["positions"], serde_json::json!([3]));
        assert_eq!(sent["queryID"], "qid-1");
        assert!(sent["timestamp"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_positions_omitted_without_query_id() {
        let server = MockServer::start().await;
        mock_events(&server, 200).await;

        let event = InsightsEvent::new(EventKind::View, ITEMS_VIEWED, "instant_search")
            .with_hit(&Hit::new("1", "a"), 1);
        client(&server).deliver(&[event]).await.unwrap();

        let bodies = received_bodies(&server).await;
        let sent = &bodies[0]["events"][0];
        assert!(sent.get("positions").is_none());
        assert!(sent.get("queryID").is_none());
    }

    #[tokio::test]
    async fn test_deliver_error_status() {
        let server = MockServer::start().await;
        mock_events(&server, 422).await;

        let event = InsightsEvent::new(EventKind::Click, ITEM_SELECTED, "instant_search");
        let result = client(&server).deliver(&[event]).await;
        assert!(matches!(result, Err(Error::Backend { status: 422, .. })));
    }

    #[tokio::test]
    async fn test_send_event_is_fire_and_forget() {
        let server = MockServer::start().await;
        mock_events(&server, 200).await;

        let event = InsightsEvent::new(EventKind::Click, ITEM_SELECTED, "instant_search")
            .with_hit(&Hit::new("42", "Phone"), 1);
        client(&server).send_event(event);

        let mut bodies = Vec::new();
        for _ in 0..50 {
            bodies = received_bodies(&server).await;
            if !bodies.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["events"][0]["objectIDs"], serde_json::json!(["42"]));
    }

    #[test]
    fn test_send_without_runtime_is_dropped() {
        let insights = HttpInsights::new(
            HttpClient::new().unwrap(),
            "http://127.0.0.1:9/1/events",
            "user",
        );
        insights.send_event(InsightsEvent::new(EventKind::View, ITEMS_VIEWED, "x"));
    }
}
