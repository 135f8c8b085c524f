//! Push events delivered by a transport outside of request/response calls.

use crate::media::MediaStatusSnapshot;
use crate::status::StatusSnapshot;

/// Payload of an unsolicited message from the device.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Receiver status changed (application or volume)
    Status(StatusSnapshot),
    /// Media session status changed
    MediaStatus(MediaStatusSnapshot),
    /// Anything the transport does not decode; carries the raw message text
    Other(String),
}

/// An unsolicited message pushed by the device.
#[derive(Debug, Clone, PartialEq)]
pub struct SpontaneousEvent {
    /// Channel namespace or message type the payload arrived on
    pub source: String,
    pub payload: EventPayload,
}

impl SpontaneousEvent {
    pub fn status(status: StatusSnapshot) -> Self {
        Self {
            source: "receiver".to_string(),
            payload: EventPayload::Status(status),
        }
    }

    pub fn media_status(status: MediaStatusSnapshot) -> Self {
        Self {
            source: "media".to_string(),
            payload: EventPayload::MediaStatus(status),
        }
    }

    pub fn other(source: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            payload: EventPayload::Other(raw.into()),
        }
    }
}

/// Receives push events for one device.
pub trait EventListener: Send + Sync {
    fn spontaneous_event_received(&self, event: SpontaneousEvent);
}

/// Receives connection up/down notifications for one device.
pub trait ConnectionListener: Send + Sync {
    fn connection_event_received(&self, connected: bool);
}
