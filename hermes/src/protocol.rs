//! Wire format between relay and client: one JSON object per WebSocket text frame.
//! Outbound: stream list, error, channel list, sample batch. Inbound: a single `{"stream_name": ...}` selection.

use crate::source::{SampleBatch, StreamDescriptor};
use serde::{Deserialize, Serialize};

/// Every message the relay sends. Variants are distinguished by their field names, not a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    Streams {
        streams: Vec<StreamDescriptor>,
    },
    Error {
        error: String,
    },
    Channels {
        channels: Vec<String>,
    },
    Samples {
        timestamps: Vec<f64>,
        data: Vec<Vec<f64>>,
        selected_channels: Vec<String>,
    },
}

impl OutboundMessage {
    pub fn streams(streams: Vec<StreamDescriptor>) -> Self {
        Self::Streams { streams }
    }

    pub fn error(message: &str) -> Self {
        Self::Error {
            error: message.to_string(),
        }
    }

    pub fn channels(channels: &[String]) -> Self {
        Self::Channels {
            channels: channels.to_vec(),
        }
    }

    /// Wraps a validated batch together with the channel list its columns follow.
    pub fn samples(batch: SampleBatch, channels: &[String]) -> Self {
        Self::Samples {
            timestamps: batch.timestamps,
            data: batch.data,
            selected_channels: channels.to_vec(),
        }
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Client's stream choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSelection {
    pub stream_name: String,
}

impl StreamSelection {
    pub fn new(stream_name: &str) -> Self {
        Self {
            stream_name: stream_name.to_string(),
        }
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Extracts a usable stream name from an inbound message.
    /// `None` for non-JSON text, non-object JSON, a missing or non-string `stream_name`, or a blank name.
    /// A non-blank name is kept verbatim, edge whitespace included.
    pub fn parse(text: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(text).ok()?;
        let name = value.get("stream_name")?.as_str()?;
        if name.trim().is_empty() {
            return None;
        }
        Some(Self::new(name))
    }
}
