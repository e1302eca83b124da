//! Azure Service Bus sender
//!
//! Enqueues messages through the namespace's HTTP send API. One sender is
//! bound to one queue and holds a pooled HTTP client, so it is built once at
//! startup and shared by every request.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use relayq_types::{Error, Message, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::connection::{ConnectionString, SharedAccessKey};
use crate::traits::MessageSender;

const BROKER_PROPERTIES: &str = "BrokerProperties";

/// Tunables for the Service Bus sender
#[derive(Debug, Clone)]
pub struct SenderOptions {
    /// Lifetime of each generated shared access signature
    pub token_ttl: Duration,
    /// Upper bound on a single send round-trip
    pub timeout: Duration,
}

impl Default for SenderOptions {
    fn default() -> Self {
        Self {
            token_ttl: Duration::from_secs(3600),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Sender bound to one Service Bus queue
pub struct ServiceBusSender {
    http: reqwest::Client,
    queue_name: String,
    /// `<endpoint>/<queue>`, the audience of the signature
    resource_uri: String,
    /// `<endpoint>/<queue>/messages?timeout=<secs>`
    send_url: Url,
    credential: SharedAccessKey,
    options: SenderOptions,
}

impl ServiceBusSender {
    /// Create a sender for `queue_name`, falling back to the connection
    /// string's `EntityPath` when no queue is given
    pub fn new(
        connection: &ConnectionString,
        queue_name: Option<&str>,
        options: SenderOptions,
    ) -> Result<Self> {
        let queue_name = queue_name
            .filter(|q| !q.is_empty())
            .or(connection.entity_path())
            .ok_or_else(|| {
                Error::Configuration(
                    "no queue name configured and the connection string has no EntityPath"
                        .to_string(),
                )
            })?
            .to_string();

        let mut queue_url = connection.endpoint().clone();
        queue_url
            .path_segments_mut()
            .map_err(|_| Error::Configuration("endpoint cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(&queue_name);

        let mut send_url = queue_url.clone();
        send_url
            .path_segments_mut()
            .map_err(|_| Error::Configuration("endpoint cannot carry a path".to_string()))?
            .push("messages");
        send_url
            .query_pairs_mut()
            .append_pair("timeout", &options.timeout.as_secs().to_string());

        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to create HTTP client: {}", e)))?;

        info!(
            queue = %queue_name,
            endpoint = %connection.endpoint(),
            key_name = %connection.credential().name(),
            "Initializing Service Bus sender"
        );

        Ok(Self {
            http,
            queue_name,
            resource_uri: queue_url.to_string(),
            send_url,
            credential: connection.credential().clone(),
            options,
        })
    }

    /// Parse a connection string and create a sender from it
    pub fn from_connection_string(
        connection_string: &str,
        queue_name: Option<&str>,
        options: SenderOptions,
    ) -> Result<Self> {
        let connection: ConnectionString = connection_string.parse()?;
        Self::new(&connection, queue_name, options)
    }

    fn authorization(&self) -> Result<String> {
        let ttl = i64::try_from(self.options.token_ttl.as_secs()).unwrap_or(i64::MAX / 2);
        self.credential
            .token(&self.resource_uri, Utc::now().timestamp().saturating_add(ttl))
    }
}

#[async_trait]
impl MessageSender for ServiceBusSender {
    async fn send(&self, message: &Message) -> Result<()> {
        let mut request = self
            .http
            .post(self.send_url.clone())
            .header(AUTHORIZATION, self.authorization()?)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(message.body().to_owned());

        if let Some(properties) = BrokerProperties::from_message(message) {
            request = request.header(BROKER_PROPERTIES, serde_json::to_string(&properties)?);
        }

        let response = request.send().await.map_err(|e| {
            warn!(queue = %self.queue_name, error = %e, "Broker request failed");
            if e.is_timeout() {
                Error::Connection(format!("timed out after {:?}", self.options.timeout))
            } else {
                Error::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(
                queue = %self.queue_name,
                status = status.as_u16(),
                "Broker accepted message"
            );
            return Ok(());
        }

        let detail = match response.text().await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => status.canonical_reason().unwrap_or("no detail").to_string(),
        };
        warn!(
            queue = %self.queue_name,
            status = status.as_u16(),
            detail = %detail,
            "Broker refused message"
        );

        Err(match status {
            StatusCode::UNAUTHORIZED => Error::Authentication(detail),
            _ => Error::Rejected {
                status: status.as_u16(),
                detail,
            },
        })
    }

    fn queue_name(&self) -> &str {
        &self.queue_name
    }
}

/// Per-message properties carried in the `BrokerProperties` header
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BrokerProperties<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    scheduled_enqueue_time_utc: Option<String>,
}

impl<'a> BrokerProperties<'a> {
    /// `None` when the message needs no broker properties at all
    fn from_message(message: &'a Message) -> Option<Self> {
        if message.session_id().is_none() && !message.is_scheduled() {
            return None;
        }

        Some(Self {
            session_id: message.session_id(),
            scheduled_enqueue_time_utc: message.scheduled_enqueue_time().map(http_date),
        })
    }
}

/// RFC 1123 date, as the broker expects for scheduled enqueue times
///
/// The format has whole-second precision, so fractional instants round up:
/// the broker must never release a message before the requested time.
fn http_date(at: DateTime<Utc>) -> String {
    let at = match at.with_nanosecond(0) {
        Some(whole) if whole != at => whole + chrono::Duration::seconds(1),
        _ => at,
    };
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
