use async_trait::async_trait;

use crate::common::types::RoomId;

/// Opaque failure reported by the voice-session layer.
///
/// The transport's own error taxonomy is not part of this crate's contract;
/// the orchestrator only ever inspects the message text through a
/// [`crate::player::classifier::ErrorClassifier`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Adapter over the group voice-session layer.
///
/// The underlying session handle is single-owner per room: only the
/// orchestrator (directly or via its reconnect supervisor) issues `start`
/// and `leave` calls for a room, never concurrently.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// Begin streaming `stream_url` into the room's live voice session.
    async fn start(&self, room: RoomId, stream_url: &str) -> Result<(), TransportError>;

    /// Leave the room's voice session. Best-effort; callers log failures.
    async fn leave(&self, room: RoomId) -> Result<(), TransportError>;
}

/// Adapter for user-facing notifications (chat messages).
///
/// Delivery failures are logged and never block a playback state
/// transition.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, room: RoomId, text: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);
