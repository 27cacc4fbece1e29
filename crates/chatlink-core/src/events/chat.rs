use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DataEvent;
use crate::error::EventError;

/// Chat payloads pushed to the web client.
///
/// Serialized with a `type` tag; the same tag is used as the SSE event name
/// so browser code can register one listener per kind:
///
/// ```json
/// { "type": "new_message", "sender": "Ayla", "content": "hi", "timestamp": "..." }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A chat line was received or sent.
    NewMessage {
        /// Display name of the author.
        sender: String,
        /// Message body.
        content: String,
        /// Channel the message was posted to, if known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel: Option<String>,
        /// When the message was observed.
        timestamp: DateTime<Utc>,
    },

    /// The active input channel changed.
    ChannelSwitched {
        /// Name of the new channel.
        channel: String,
    },

    /// Informational text from the host application.
    Notice {
        /// Notice body.
        text: String,
    },
}

impl ChatEvent {
    pub fn new_message(
        sender: impl Into<String>,
        content: impl Into<String>,
        channel: Option<String>,
    ) -> Self {
        Self::NewMessage {
            sender: sender.into(),
            content: content.into(),
            channel,
            timestamp: Utc::now(),
        }
    }

    pub fn channel_switched(channel: impl Into<String>) -> Self {
        Self::ChannelSwitched {
            channel: channel.into(),
        }
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self::Notice { text: text.into() }
    }

    /// SSE event name, identical to the serialized `type` tag.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::NewMessage { .. } => "new_message",
            Self::ChannelSwitched { .. } => "channel_switched",
            Self::Notice { .. } => "notice",
        }
    }

    /// Render into a named data event with a JSON body.
    pub fn to_frame(&self) -> Result<DataEvent, EventError> {
        DataEvent::json(self.event_name(), self)
    }
}
