//! Pub/Sub push delivery envelope

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Body of a Pub/Sub push request
#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelope {
    /// The delivered message
    pub message: PubsubMessage,
    /// Full subscription name
    #[serde(default)]
    pub subscription: Option<String>,
}

/// A single Pub/Sub message
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubsubMessage {
    /// Base64 encoded payload
    #[serde(default)]
    pub data: Option<String>,
    /// Message attributes
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    /// Server assigned id
    #[serde(default, alias = "message_id")]
    pub message_id: Option<String>,
    /// Server publish time
    #[serde(default, alias = "publish_time")]
    pub publish_time: Option<DateTime<Utc>>,
}

impl PubsubMessage {
    /// Decode the base64 payload as JSON; an empty payload decodes to `{}`
    pub fn json(&self) -> Result<Value> {
        let Some(data) = self.data.as_deref().filter(|data| !data.is_empty()) else {
            return Ok(Value::Object(serde_json::Map::new()));
        };

        let bytes = STANDARD
            .decode(data)
            .map_err(|e| Error::validation(format!("message data is not valid base64: {e}")))?;

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// A decoded inbound delivery
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Pub/Sub message id, when the body was a push envelope
    pub message_id: Option<String>,
    /// The budget alert JSON
    pub payload: Value,
}

impl Delivery {
    /// Decode an HTTP request body
    ///
    /// A push envelope has a `message` object; any other JSON body is taken as
    /// the budget alert itself.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)?;

        if value.get("message").is_some_and(Value::is_object) {
            let envelope = PushEnvelope::deserialize(&value)?;
            let payload = envelope.message.json()?;
            return Ok(Self {
                message_id: envelope.message.message_id,
                payload,
            });
        }

        Ok(Self {
            message_id: None,
            payload: value,
        })
    }
}
