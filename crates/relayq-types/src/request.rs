//! Inbound request types for RelayQ
//!
//! The JSON shape accepted by the send endpoint.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;

/// Message description submitted by a caller
///
/// `body` must be present in the payload but may be `null`. Field names are
/// accepted in camelCase and PascalCase.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    /// Message body text, carried verbatim
    #[serde(alias = "Body", deserialize_with = "present_or_null")]
    pub body: Option<String>,

    /// Session used by the broker to group related messages
    #[serde(default, alias = "SessionId")]
    pub session_id: Option<String>,

    /// Instant before which the broker withholds the message (UTC)
    ///
    /// A timestamp without an offset is read as UTC.
    #[serde(
        default,
        alias = "ScheduledEnqueueTimeUtc",
        deserialize_with = "utc_timestamp"
    )]
    pub scheduled_enqueue_time_utc: Option<DateTime<Utc>>,
}

// Using deserialize_with disables serde's implicit `None` for a missing
// Option field, so an absent `body` key is reported as a missing field.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

fn utc_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    raw.parse::<DateTime<FixedOffset>>()
        .map(|at| at.with_timezone(&Utc))
        .or_else(|_| raw.parse::<NaiveDateTime>().map(|at| at.and_utc()))
        .map(Some)
        .map_err(|_| D::Error::custom(format!("invalid timestamp '{}'", raw)))
}

impl SendRequest {
    /// Create a request with the given body and no options
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            session_id: None,
            scheduled_enqueue_time_utc: None,
        }
    }

    /// Set session ID
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Set scheduled enqueue time
    pub fn with_scheduled_enqueue_time(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_enqueue_time_utc = Some(at);
        self
    }

    /// Body text as echoed back to the caller (`null` renders as empty)
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}
